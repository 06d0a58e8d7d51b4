use std::io;
use std::path::Path;

use anyhow::Result;
use clap::ValueEnum;
use rusqlite::Connection;

pub const DB_PATH: &str = "db.sqlite";

/// One parsed observation from the generation report.
///
/// Measurement fields stay as normalized-digit text, never numeric columns:
/// the report's own formatting and precision are preserved verbatim.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GenerationRecord {
    pub year: i32,
    pub month: i32,
    pub day: i32,
    pub time: String,
    pub produced: String,
    pub load: String,
    pub loss: String,
    pub load_shed: String,
    pub gas: String,
    pub liquid: String,
    pub coal: String,
    pub hydro: String,
    pub solar: String,
    pub veramara: String,
    pub tripura: String,
    pub comment: String,
}

/// Year/month sort direction for the export query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDir {
    Asc,
    Desc,
}

impl SortDir {
    fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// Inclusive year and month bounds for the export query.
pub struct ExportFilter {
    pub min_year: i32,
    pub max_year: i32,
    pub min_month: i32,
    pub max_month: i32,
}

pub fn store_exists() -> bool {
    Path::new(DB_PATH).exists()
}

/// Delete the store file (and WAL sidecars) ahead of a forced re-fetch.
pub fn remove_store() -> Result<()> {
    for path in [DB_PATH, "db.sqlite-wal", "db.sqlite-shm"] {
        match std::fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

pub fn connect() -> Result<Connection> {
    let conn = Connection::open(DB_PATH)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

/// Idempotent schema creation; safe on an existing store.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS generation (
            id         INTEGER PRIMARY KEY,
            year       INTEGER NOT NULL,
            month      INTEGER NOT NULL,
            day        INTEGER NOT NULL,
            time       TEXT NOT NULL,
            produced   TEXT NOT NULL,
            load       TEXT NOT NULL,
            loss       TEXT NOT NULL,
            load_shed  TEXT NOT NULL,
            gas        TEXT NOT NULL,
            liquid     TEXT NOT NULL,
            coal       TEXT NOT NULL,
            hydro      TEXT NOT NULL,
            solar      TEXT NOT NULL,
            veramara   TEXT NOT NULL,
            tripura    TEXT NOT NULL,
            comment    TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_generation_ym ON generation(year, month);
        ",
    )?;
    Ok(())
}

/// Append one record, letting the store assign the id.
pub fn insert_record(conn: &Connection, r: &GenerationRecord) -> Result<()> {
    let mut stmt = conn.prepare_cached(
        "INSERT INTO generation
         (year, month, day, time, produced, load, loss, load_shed,
          gas, liquid, coal, hydro, solar, veramara, tripura, comment)
         VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)",
    )?;
    stmt.execute(rusqlite::params![
        r.year, r.month, r.day, r.time, r.produced, r.load, r.loss, r.load_shed,
        r.gas, r.liquid, r.coal, r.hydro, r.solar, r.veramara, r.tripura, r.comment,
    ])?;
    Ok(())
}

pub fn count_records(conn: &Connection) -> Result<usize> {
    let n: usize = conn.query_row("SELECT COUNT(*) FROM generation", [], |r| r.get(0))?;
    Ok(n)
}

/// Fetch records matching the export filter, sorted for the report.
///
/// Year and month are two independent range predicates, not a combined
/// chronological range: (2017, month=12) passes a [2017..2020] x [1..12]
/// filter even though the chronological range might start later in 2017.
/// Day and time always sort ascending regardless of `sort`. Both quirks
/// are part of the report's contract.
pub fn query_range(
    conn: &Connection,
    filter: &ExportFilter,
    sort: SortDir,
) -> Result<Vec<GenerationRecord>> {
    let sql = format!(
        "SELECT year, month, day, time, produced, load, loss, load_shed,
                gas, liquid, coal, hydro, solar, veramara, tripura, comment
         FROM generation
         WHERE (year >= ?1 AND year <= ?2) AND (month >= ?3 AND month <= ?4)
         ORDER BY year {dir}, month {dir}, day ASC, time ASC",
        dir = sort.as_sql()
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(
            rusqlite::params![
                filter.min_year,
                filter.max_year,
                filter.min_month,
                filter.max_month
            ],
            |row| {
                Ok(GenerationRecord {
                    year: row.get(0)?,
                    month: row.get(1)?,
                    day: row.get(2)?,
                    time: row.get(3)?,
                    produced: row.get(4)?,
                    load: row.get(5)?,
                    loss: row.get(6)?,
                    load_shed: row.get(7)?,
                    gas: row.get(8)?,
                    liquid: row.get(9)?,
                    coal: row.get(10)?,
                    hydro: row.get(11)?,
                    solar: row.get(12)?,
                    veramara: row.get(13)?,
                    tripura: row.get(14)?,
                    comment: row.get(15)?,
                })
            },
        )?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        conn
    }

    pub(crate) fn record(year: i32, month: i32, day: i32, time: &str, load: &str) -> GenerationRecord {
        GenerationRecord {
            year,
            month,
            day,
            time: time.to_string(),
            load: load.to_string(),
            ..GenerationRecord::default()
        }
    }

    fn full_filter(min_year: i32, max_year: i32) -> ExportFilter {
        ExportFilter {
            min_year,
            max_year,
            min_month: 1,
            max_month: 12,
        }
    }

    #[test]
    fn insert_and_count() {
        let conn = test_conn();
        assert_eq!(count_records(&conn).unwrap(), 0);
        insert_record(&conn, &record(2018, 1, 1, "00:00:00", "9000")).unwrap();
        insert_record(&conn, &record(2018, 1, 1, "01:00:00", "9100")).unwrap();
        assert_eq!(count_records(&conn).unwrap(), 2);
    }

    #[test]
    fn schema_creation_is_idempotent() {
        let conn = test_conn();
        init_schema(&conn).unwrap();
        insert_record(&conn, &record(2018, 1, 1, "00:00:00", "9000")).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(count_records(&conn).unwrap(), 1);
    }

    #[test]
    fn year_filter_is_inclusive_on_both_ends() {
        let conn = test_conn();
        for year in 2016..=2021 {
            insert_record(&conn, &record(year, 6, 15, "12:00:00", "8000")).unwrap();
        }
        let rows = query_range(&conn, &full_filter(2017, 2020), SortDir::Asc).unwrap();
        let years: Vec<i32> = rows.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2017, 2018, 2019, 2020]);
    }

    #[test]
    fn month_filter_is_independent_of_year() {
        let conn = test_conn();
        insert_record(&conn, &record(2017, 1, 1, "00:00:00", "1")).unwrap();
        insert_record(&conn, &record(2020, 12, 31, "00:00:00", "2")).unwrap();
        insert_record(&conn, &record(2018, 7, 1, "00:00:00", "3")).unwrap();
        let filter = ExportFilter {
            min_year: 2017,
            max_year: 2020,
            min_month: 2,
            max_month: 11,
        };
        // January 2017 and December 2020 fall out on month alone, even
        // though both sit inside the year bounds.
        let rows = query_range(&conn, &filter, SortDir::Asc).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!((rows[0].year, rows[0].month), (2018, 7));
    }

    #[test]
    fn day_and_time_sort_ascending_even_under_desc() {
        let conn = test_conn();
        insert_record(&conn, &record(2019, 5, 2, "01:00:00", "a")).unwrap();
        insert_record(&conn, &record(2019, 5, 1, "02:00:00", "b")).unwrap();
        insert_record(&conn, &record(2019, 5, 1, "01:00:00", "c")).unwrap();
        insert_record(&conn, &record(2018, 5, 9, "01:00:00", "d")).unwrap();
        let rows = query_range(&conn, &full_filter(2018, 2019), SortDir::Desc).unwrap();
        let keys: Vec<(i32, i32, &str)> = rows
            .iter()
            .map(|r| (r.year, r.day, r.time.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (2019, 1, "01:00:00"),
                (2019, 1, "02:00:00"),
                (2019, 2, "01:00:00"),
                (2018, 9, "01:00:00"),
            ]
        );
    }
}
