//! HDFC Bank statement format
//!
//! Row layout: Date | Narration | Withdrawal | Deposit | Balance, with
//! DD/MM/YY or DD/MM/YYYY dates anchoring each transaction line.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{clean_text, extract_period_with, split_row, StatementFormat};
use crate::models::{Bank, RawLine, StatementPeriod};

const MARKERS: [&str; 4] = ["HDFC BANK", "HDFC Bank", "hdfc bank", "www.hdfcbank.com"];

fn date_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{2}/\d{2}/\d{2,4}").unwrap())
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)statement\s+from\s+(\d{2}/\d{2}/\d{4})\s+to\s+(\d{2}/\d{2}/\d{4})")
            .unwrap()
    })
}

pub struct HdfcFormat;

impl StatementFormat for HdfcFormat {
    fn bank(&self) -> Bank {
        Bank::Hdfc
    }

    fn detect(&self, text: &str) -> bool {
        MARKERS.iter().any(|marker| text.contains(marker))
    }

    fn parse(&self, text: &str) -> Vec<RawLine> {
        let cleaned = clean_text(text);
        let mut rows = Vec::new();

        for line in cleaned.lines() {
            let line = line.trim();
            if !date_anchor().is_match(line) {
                continue;
            }
            if let Some(row) = split_row(line) {
                rows.push(row);
            }
        }

        debug!("Parsed {} HDFC rows", rows.len());
        rows
    }

    fn extract_period(&self, text: &str) -> StatementPeriod {
        extract_period_with(period_re(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_detect() {
        assert!(HdfcFormat.detect("Welcome to HDFC BANK netbanking"));
        assert!(HdfcFormat.detect("visit www.hdfcbank.com"));
        assert!(!HdfcFormat.detect("STATE BANK OF INDIA"));
    }

    #[test]
    fn test_parse_skips_headers_and_footers() {
        let text = "HDFC BANK\n\
            Date  Narration  Withdrawal  Deposit  Balance\n\
            01/11/2024  UPI-SWIGGY-987  450.00  0.00  5200.00\n\
            Closing balance as on 30/11\n\
            Page 1 of 2";

        let rows = HdfcFormat.parse(text);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].description_text, "UPI-SWIGGY-987");
    }

    #[test]
    fn test_parse_two_digit_year_anchor() {
        let rows = HdfcFormat.parse("01/11/24  ATM WDL  2000.00  15000.00");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].date_text, "01/11/24");
    }

    #[test]
    fn test_extract_period() {
        let period =
            HdfcFormat.extract_period("Statement From 01/11/2024 To 30/11/2024 for account");
        assert_eq!(period.from, NaiveDate::from_ymd_opt(2024, 11, 1));
        assert_eq!(period.to, NaiveDate::from_ymd_opt(2024, 11, 30));
    }

    #[test]
    fn test_extract_period_absent() {
        let period = HdfcFormat.extract_period("no period phrasing here");
        assert_eq!(period.from, None);
        assert_eq!(period.to, None);
    }
}
