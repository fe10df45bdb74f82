use chrono::{Datelike, NaiveDate, NaiveDateTime};

/// Year from a cell holding a bare year, e.g. `2013` or `2013.0`.
pub fn parse_year(s: &str) -> Option<i32> {
    let s = s.trim();
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f.abs() < 100_000.0 {
        Some(f as i32)
    } else {
        None
    }
}

/// Year of a date cell in `format` (chrono syntax). Falls back to a
/// date-time parse for formats that carry a time part.
pub fn parse_date_year(s: &str, format: &str) -> Option<i32> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, format)
        .map(|d| d.year())
        .or_else(|_| NaiveDateTime::parse_from_str(s, format).map(|dt| dt.year()))
        .ok()
}
