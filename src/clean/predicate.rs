// src/clean/predicate.rs

use regex::Regex;

use crate::config::PredicateEntry;

/// A compiled validity check on one cell.
#[derive(Debug, Clone)]
pub enum Predicate {
    /// Inclusive bounds, either side optional.
    Range { min: Option<f64>, max: Option<f64> },
    Positive,
    OneOf(Vec<String>),
    Pattern(Regex),
}

impl Predicate {
    pub fn compile(entry: &PredicateEntry) -> Result<Self, regex::Error> {
        Ok(match entry {
            PredicateEntry::Range { min, max } => Predicate::Range {
                min: *min,
                max: *max,
            },
            PredicateEntry::Positive => Predicate::Positive,
            PredicateEntry::OneOf { values } => Predicate::OneOf(values.clone()),
            PredicateEntry::Pattern { regex } => Predicate::Pattern(Regex::new(regex)?),
        })
    }

    pub fn range(min: f64, max: f64) -> Self {
        Predicate::Range {
            min: Some(min),
            max: Some(max),
        }
    }

    pub fn one_of<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Predicate::OneOf(values.into_iter().map(Into::into).collect())
    }

    pub fn pattern(re: &str) -> Result<Self, regex::Error> {
        Ok(Predicate::Pattern(Regex::new(re)?))
    }

    /// Whether this check needs the cell's numeric value.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Predicate::Range { .. } | Predicate::Positive)
    }

    /// Evaluate against a present cell. `text` is the trimmed raw value,
    /// `number` its numeric reading (if it has one).
    pub fn holds(&self, text: &str, number: Option<f64>) -> bool {
        match self {
            Predicate::Range { min, max } => match number {
                Some(v) => {
                    min.map_or(true, |lo| v >= lo) && max.map_or(true, |hi| v <= hi)
                }
                None => false,
            },
            Predicate::Positive => number.is_some_and(|v| v > 0.0),
            Predicate::OneOf(values) => values.iter().any(|v| v == text),
            Predicate::Pattern(re) => re.is_match(text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const IFOPT: &str = r"^[A-Za-z]{2}:\d+:\d+(:\d+)?$";

    #[test]
    fn range_is_inclusive_and_needs_a_number() {
        let p = Predicate::range(-90.0, 90.0);
        assert!(p.holds("90", Some(90.0)));
        assert!(p.holds("-90", Some(-90.0)));
        assert!(!p.holds("90.1", Some(90.1)));
        assert!(!p.holds("north", None));

        let open = Predicate::Range {
            min: Some(0.0),
            max: None,
        };
        assert!(open.holds("1e9", Some(1e9)));
        assert!(!open.holds("-1", Some(-1.0)));
    }

    #[test]
    fn positive_excludes_zero() {
        assert!(Predicate::Positive.holds("3", Some(3.0)));
        assert!(!Predicate::Positive.holds("0", Some(0.0)));
        assert!(!Predicate::Positive.holds("-2", Some(-2.0)));
    }

    #[test]
    fn enum_membership_is_exact() {
        let p = Predicate::one_of(["FV", "RV", "nur DPN"]);
        assert!(p.holds("nur DPN", None));
        assert!(!p.holds("fv", None));
        assert!(!p.holds("S", None));
    }

    #[test]
    fn ifopt_pattern() {
        let p = Predicate::pattern(IFOPT).unwrap();
        assert!(p.holds("de:08111:6115", None));
        assert!(p.holds("de:08111:6115:1", None));
        assert!(!p.holds("de:08111", None));
        assert!(!p.holds("xde:1:2", None));
        assert!(!p.is_numeric());
    }
}
