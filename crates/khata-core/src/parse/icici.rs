//! ICICI Bank statement format
//!
//! Row layout: S.No | Date | Description | Withdrawal | Deposit | Balance.
//! Lines are anchored by a serial number followed by a DD/MM/YYYY or
//! DD-MMM-YYYY date; the serial is stripped before field splitting.

use std::sync::OnceLock;

use regex::Regex;
use tracing::debug;

use super::{clean_text, extract_period_with, split_row, StatementFormat};
use crate::models::{Bank, RawLine, StatementPeriod};

const MARKERS: [&str; 4] = ["ICICI BANK", "ICICI Bank", "icici bank", "www.icicibank.com"];

fn date_anchor() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s+(\d{2}/\d{2}/\d{4}|\d{2}-\w{3}-\d{4})").unwrap())
}

fn serial_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+\s+").unwrap())
}

fn period_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(\d{2}/\d{2}/\d{4})\s+to\s+(\d{2}/\d{2}/\d{4})").unwrap())
}

pub struct IciciFormat;

impl StatementFormat for IciciFormat {
    fn bank(&self) -> Bank {
        Bank::Icici
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
            let without_serial = serial_prefix().replace(line, "");
            if let Some(row) = split_row(&without_serial) {
                rows.push(row);
            }
        }

        debug!("Parsed {} ICICI rows", rows.len());
        rows
    }

    fn extract_period(&self, text: &str) -> StatementPeriod {
        extract_period_with(period_re(), text)
    }
}
