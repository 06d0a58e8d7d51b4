/// Why a row's date cell could not be fully parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFault {
    /// Input was not exactly 10 characters.
    WrongLength,
    /// One of the day/month/year fields was not an integer.
    BadField,
}

/// Result of reversing a `DD-MM-YYYY` date cell. On fault, fields that did
/// parse keep their values; the rest stay zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParsedDate {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub fault: Option<DateFault>,
}

/// Parse a normalized `DD-MM-YYYY` string into its parts.
///
/// The server's fixed-width format is load-bearing: day lives at 0..2,
/// month at 3..5, year at 6..10. Extraction is best-effort, not atomic:
/// a bad month still leaves a parsed year in place, with the fault flagged.
pub fn reverse(date: &str) -> ParsedDate {
    if date.chars().count() != 10 {
        return ParsedDate {
            fault: Some(DateFault::WrongLength),
            ..ParsedDate::default()
        };
    }

    let mut fault = None;
    let mut extract = |range: std::ops::Range<usize>| {
        // Length was checked in chars; byte-range extraction can still miss
        // if a stray non-ASCII glyph survived normalization.
        match date.get(range).and_then(|s| s.parse::<i32>().ok()) {
            Some(v) => v,
            None => {
                fault = Some(DateFault::BadField);
                0
            }
        }
    };
    let year = extract(6..10);
    let month = extract(3..5);
    let day = extract(0..2);
    ParsedDate {
        year,
        month,
        day,
        fault,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_date() {
        let d = reverse("18-08-2020");
        assert_eq!((d.year, d.month, d.day), (2020, 8, 18));
        assert_eq!(d.fault, None);
    }

    #[test]
    fn wrong_length_yields_zeroes() {
        for s in ["", "1-01-2018", "18-08-20201", "২০১৮"] {
            let d = reverse(s);
            assert_eq!(d.fault, Some(DateFault::WrongLength));
            assert_eq!((d.year, d.month, d.day), (0, 0, 0));
        }
    }

    #[test]
    fn bad_middle_field_keeps_parsed_year() {
        let d = reverse("18-xx-2020");
        assert_eq!(d.fault, Some(DateFault::BadField));
        assert_eq!(d.year, 2020);
        assert_eq!(d.day, 18);
        assert_eq!(d.month, 0);
    }
}
