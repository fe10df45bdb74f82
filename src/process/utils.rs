// src/process/utils.rs

/// Raw values that stand for "no data" in every dataset.
pub const DEFAULT_SENTINELS: &[&str] = &["", "nan", "#"];

/// Currency signs that show up glued to amounts, e.g. `£23,440`.
const CURRENCY_SYMBOLS: &[char] = &['£', '$', '€', '¥'];

/// True if the trimmed cell is one of the built-in sentinels or one of the
/// dataset's `extra` ones.
pub fn is_sentinel(raw: &str, extra: &[String]) -> bool {
    let v = raw.trim();
    DEFAULT_SENTINELS.contains(&v) || extra.iter().any(|s| s == v)
}

/// Strip currency signs, whitespace and thousands separators and turn a
/// decimal comma into a point. Returns `None` when nothing is left.
pub fn normalize_numeric(raw: &str, decimal: char) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if CURRENCY_SYMBOLS.contains(&c) || c.is_whitespace() {
            continue;
        }
        match (c, decimal) {
            (',', ',') => out.push('.'),
            (',', _) => {}
            ('.', ',') => {}
            _ => out.push(c),
        }
    }
    if out.is_empty() {
        None
    } else {
        Some(out)
    }
}

/// Parse a finite float after normalization. `nan`/`inf` spellings are
/// rejected.
pub fn parse_number(raw: &str, decimal: char) -> Option<f64> {
    normalize_numeric(raw, decimal)?
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse an integer, accepting integral float spellings such as `2013.0`.
pub fn parse_integer(raw: &str, decimal: char) -> Option<i64> {
    let s = normalize_numeric(raw, decimal)?;
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    let f = s.parse::<f64>().ok().filter(|v| v.is_finite())?;
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Trim a header name and drop a leading byte-order mark.
pub fn clean_header(raw: &str) -> String {
    raw.trim_start_matches('\u{feff}').trim().to_string()
}
