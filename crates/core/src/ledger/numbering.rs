//! Voucher numbers: `JV-YYYYMM-NNNNNN`, sequential within a calendar month.

use chrono::{Datelike, NaiveDate};
use std::fmt;

const PREFIX: &str = "JV";

/// A voucher number split into its period and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoucherNumber {
    /// Period key, `YYYYMM`.
    pub period: String,
    /// 1-based sequence within the period.
    pub sequence: i64,
}

impl VoucherNumber {
    /// Period key for an accounting date.
    #[must_use]
    pub fn period_key(date: NaiveDate) -> String {
        format!("{:04}{:02}", date.year(), date.month())
    }

    /// Number for the `sequence`th voucher dated in `date`'s period.
    #[must_use]
    pub fn new(date: NaiveDate, sequence: i64) -> Self {
        Self {
            period: Self::period_key(date),
            sequence,
        }
    }

    /// Parses `JV-YYYYMM-NNNNNN`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.split('-');
        if parts.next()? != PREFIX {
            return None;
        }
        let period = parts.next()?;
        let sequence = parts.next()?;
        if parts.next().is_some()
            || period.len() != 6
            || !period.bytes().all(|b| b.is_ascii_digit())
            || sequence.is_empty()
            || !sequence.bytes().all(|b| b.is_ascii_digit())
        {
            return None;
        }
        Some(Self {
            period: period.to_string(),
            sequence: sequence.parse().ok()?,
        })
    }
}

impl fmt::Display for VoucherNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{PREFIX}-{}-{:06}", self.period, self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_format() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();
        assert_eq!(VoucherNumber::new(date, 1).to_string(), "JV-202603-000001");
        assert_eq!(VoucherNumber::new(date, 1_234_567).to_string(), "JV-202603-1234567");
    }

    #[test]
    fn test_parse() {
        let parsed = VoucherNumber::parse("JV-202612-000042").unwrap();
        assert_eq!(parsed.period, "202612");
        assert_eq!(parsed.sequence, 42);
    }

    #[rstest]
    #[case("")]
    #[case("JV-2026-000001")]
    #[case("XX-202603-000001")]
    #[case("JV-202603-")]
    #[case("JV-202603-00a001")]
    #[case("JV-202603-000001-1")]
    fn test_parse_rejects(#[case] input: &str) {
        assert_eq!(VoucherNumber::parse(input), None);
    }
}
