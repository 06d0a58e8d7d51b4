/// Bengali digit glyphs in value order, ০ (0) through ৯ (9).
const BENGALI_DIGITS: [char; 10] = ['০', '১', '২', '৩', '৪', '৫', '৬', '৭', '৮', '৯'];

/// Replace every Bengali digit with its ASCII counterpart, leaving all other
/// characters untouched. Pure substitution: output char count always equals
/// input char count, and already-normalized text passes through unchanged.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| match BENGALI_DIGITS.iter().position(|&d| d == c) {
            Some(value) => char::from(b'0' + value as u8),
            None => c,
        })
        .collect()
}
