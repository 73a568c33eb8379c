use anyhow::{bail, Result};
use std::fmt;

/// Day-count range expression used by the band tables.
///
/// Format: "<N", "<=N", ">N", ">=N", "N-M" (inclusive) or "N".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeOp {
    LessThan(u64),
    LessEqual(u64),
    GreaterThan(u64),
    GreaterEqual(u64),
    Equal(u64),
    Between(u64, u64),
}

impl RangeOp {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(val) = s.strip_prefix(">=") {
            Ok(RangeOp::GreaterEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix("<=") {
            Ok(RangeOp::LessEqual(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('>') {
            Ok(RangeOp::GreaterThan(val.trim().parse()?))
        } else if let Some(val) = s.strip_prefix('<') {
            Ok(RangeOp::LessThan(val.trim().parse()?))
        } else if s.contains('-') && !s.starts_with('-') {
            let parts: Vec<&str> = s.split('-').collect();
            if parts.len() != 2 {
                bail!("Invalid range format: {}", s);
            }
            let low: u64 = parts[0].trim().parse()?;
            let high: u64 = parts[1].trim().parse()?;
            if low > high {
                bail!("Range start exceeds end: {}", s);
            }
            Ok(RangeOp::Between(low, high))
        } else {
            Ok(RangeOp::Equal(s.parse()?))
        }
    }

    pub fn matches(&self, value: u64) -> bool {
        match self {
            RangeOp::LessThan(n) => value < *n,
            RangeOp::LessEqual(n) => value <= *n,
            RangeOp::GreaterThan(n) => value > *n,
            RangeOp::GreaterEqual(n) => value >= *n,
            RangeOp::Equal(n) => value == *n,
            RangeOp::Between(low, high) => value >= *low && value <= *high,
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeOp::LessThan(n) => write!(f, "<{}", n),
            RangeOp::LessEqual(n) => write!(f, "<={}", n),
            RangeOp::GreaterThan(n) => write!(f, ">{}", n),
            RangeOp::GreaterEqual(n) => write!(f, ">={}", n),
            RangeOp::Equal(n) => write!(f, "{}", n),
            RangeOp::Between(low, high) => write!(f, "{}-{}", low, high),
        }
    }
}

/// Return the value of the first band whose range matches, if any.
pub fn first_match<T>(bands: &[(RangeOp, T)], value: u64) -> Option<&T> {
    bands
        .iter()
        .find(|(range, _)| range.matches(value))
        .map(|(_, v)| v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range_less_than() {
        let range = RangeOp::parse("<100").unwrap();
        assert!(range.matches(50));
        assert!(!range.matches(100));
        assert!(!range.matches(150));
    }

    #[test]
    fn test_parse_range_less_equal() {
        let range = RangeOp::parse("<=7").unwrap();
        assert!(range.matches(0));
        assert!(range.matches(7));
        assert!(!range.matches(8));
    }

    #[test]
    fn test_parse_range_greater_than() {
        let range = RangeOp::parse(">90").unwrap();
        assert!(!range.matches(90));
        assert!(range.matches(91));
    }

    #[test]
    fn test_parse_range_greater_equal() {
        let range = RangeOp::parse(">= 3").unwrap();
        assert!(!range.matches(2));
        assert!(range.matches(3));
        assert!(range.matches(30));
    }

    #[test]
    fn test_parse_range_equal() {
        let range = RangeOp::parse("0").unwrap();
        assert!(range.matches(0));
        assert!(!range.matches(1));
    }

    #[test]
    fn test_parse_range_between() {
        let range = RangeOp::parse("8-30").unwrap();
        assert!(!range.matches(7));
        assert!(range.matches(8));
        assert!(range.matches(30));
        assert!(!range.matches(31));
    }

    #[test]
    fn test_parse_range_rejects_garbage() {
        assert!(RangeOp::parse("soon").is_err());
        assert!(RangeOp::parse("30-8").is_err());
        assert!(RangeOp::parse("1-2-3").is_err());
        assert!(RangeOp::parse("-5").is_err());
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        for s in ["<1", "<=7", ">90", ">=3", "0", "31-90"] {
            let range = RangeOp::parse(s).unwrap();
            assert_eq!(range.to_string(), s);
        }
    }

    #[test]
    fn test_first_match_wins() {
        let bands = vec![
            (RangeOp::parse(">=7").unwrap(), "high"),
            (RangeOp::parse(">=3").unwrap(), "medium"),
            (RangeOp::parse(">=0").unwrap(), "low"),
        ];
        assert_eq!(first_match(&bands, 10), Some(&"high"));
        assert_eq!(first_match(&bands, 3), Some(&"medium"));
        assert_eq!(first_match(&bands, 0), Some(&"low"));
        assert_eq!(first_match::<&str>(&[], 5), None);
    }
}
