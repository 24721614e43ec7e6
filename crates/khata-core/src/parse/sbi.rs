//! State Bank of India statement format
//!
//! Row layout: Date | Description | Debit | Credit | Balance, with
//! DD MMM YYYY or DD-MM-YYYY dates anchoring each transaction line.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{clean_text, extract_period_with, split_row, StatementFormat};
use crate::models::{Bank, RawLine, StatementPeriod};

const MARKERS: [&str; 5] = [
    "STATE BANK OF INDIA",
    "State Bank of India",
    "SBI",
    "www.sbi.co.in",
    "onlinesbi.com",
];

fn date_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{2}\s+\w{3}\s+\d{4}|\d{2}-\d{2}-\d{4})").unwrap())
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)from\s+(\d{2}\s+\w{3}\s+\d{4})\s+to\s+(\d{2}\s+\w{3}\s+\d{4})").unwrap()
    })
}

pub struct SbiFormat;

impl StatementFormat for SbiFormat {
    fn bank(&self) -> Bank {
        Bank::Sbi
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

        debug!("Parsed {} SBI rows", rows.len());
        rows
    }

    fn extract_period(&self, text: &str) -> StatementPeriod {
        extract_period_with(period_re(), text)
    }
}
