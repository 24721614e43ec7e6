//! Bank statement text parsers
//!
//! Input is the plain text extracted from a statement PDF (the extraction
//! itself happens upstream). Each supported bank implements the
//! [`StatementFormat`] capability; the detector walks a fixed priority list
//! and the first format whose markers match wins.
//!
//! Parsing is a line-oriented scan: lines that match the bank's date anchor
//! are split on runs of 2+ whitespace into fields, everything else (headers,
//! footers, carried-over balances) is skipped. Malformed rows are dropped
//! silently; a bad line never aborts the statement.

use std::sync::OnceLock;

use regex::Regex;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Bank, ParsedStatement, RawLine, StatementPeriod};
use crate::normalize::{normalize_line, parse_date};

mod hdfc;
mod icici;
mod sbi;

pub use hdfc::HdfcFormat;
pub use icici::IciciFormat;
pub use sbi::SbiFormat;

/// A bank statement format: recognition, row extraction, period extraction
pub trait StatementFormat: Send + Sync {
    fn bank(&self) -> Bank;

    /// Whether this format's markers appear in the statement text
    fn detect(&self, text: &str) -> bool;

    /// Extract raw transaction rows from the statement text
    fn parse(&self, text: &str) -> Vec<RawLine>;

    /// Best-effort extraction of the period the statement covers
    fn extract_period(&self, text: &str) -> StatementPeriod;
}

/// All supported formats in fixed priority order
pub fn formats() -> &'static [&'static dyn StatementFormat] {
    static FORMATS: [&'static dyn StatementFormat; 3] = [&HdfcFormat, &IciciFormat, &SbiFormat];
    &FORMATS
}

/// Detect which bank produced the statement; first match in priority order
pub fn detect_format(text: &str) -> Option<&'static dyn StatementFormat> {
    formats().iter().copied().find(|f| f.detect(text))
}

/// Names of all supported banks
pub fn supported_banks() -> Vec<&'static str> {
    formats().iter().map(|f| f.bank().as_str()).collect()
}

/// Parse full statement text into normalized transactions
///
/// Fails with `UnsupportedBank` when no format matches and `EmptyStatement`
/// when the text is blank or yields zero transaction rows. Both are fatal
/// for this statement; nothing is partially parsed.
pub fn parse_statement(text: &str) -> Result<ParsedStatement> {
    if text.trim().is_empty() {
        return Err(Error::EmptyStatement(
            "statement text is empty; the PDF may be scanned or could not be read".to_string(),
        ));
    }

    let format = detect_format(text).ok_or_else(|| {
        Error::UnsupportedBank(format!(
            "could not detect bank. Supported banks: {}. \
             Please ensure this is a digital bank statement (not scanned).",
            supported_banks().join(", ")
        ))
    })?;

    let rows = format.parse(text);
    let transactions: Vec<_> = rows.iter().map(normalize_line).collect();

    if transactions.is_empty() {
        return Err(Error::EmptyStatement(format!(
            "No transactions found in {} statement. \
             Please ensure this is a valid bank statement with transaction history.",
            format.bank()
        )));
    }

    let period = format.extract_period(text);
    info!(
        bank = %format.bank(),
        count = transactions.len(),
        "Statement parsed"
    );

    Ok(ParsedStatement {
        bank: format.bank(),
        transactions,
        period,
    })
}

/// Normalize line endings and trim the statement text
pub(crate) fn clean_text(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n").trim().to_string()
}

fn field_splitter() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s{2,}").unwrap())
}

fn amount_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\d,]+\.?\d*$").unwrap())
}

/// Whether a field looks like an amount column value
pub(crate) fn looks_like_amount(s: &str) -> bool {
    let stripped: String = s.chars().filter(|c| !matches!(c, '₹' | '$')).collect();
    amount_shape().is_match(stripped.trim())
}

/// Split a date-anchored line into a raw transaction row
///
/// Field 0 is the date. Description fields run until the first amount-shaped
/// field; from there on everything belongs to the amount region. The last
/// three region fields map to (withdrawal, deposit, balance); with only two,
/// the statement printed a single amount column plus balance, so they map to
/// (withdrawal, balance). Lines with fewer than 3 fields or no amount region
/// yield no row: statement footers and continuations can spuriously match
/// the date anchor, so this is leniency, not an error path.
pub(crate) fn split_row(line: &str) -> Option<RawLine> {
    let fields: Vec<&str> = field_splitter()
        .split(line.trim())
        .filter(|f| !f.is_empty())
        .collect();

    if fields.len() < 3 {
        return None;
    }

    let date_text = fields[0].to_string();

    let mut description_parts: Vec<&str> = Vec::new();
    let mut region_start = fields.len();
    for (i, &field) in fields.iter().enumerate().skip(1) {
        if looks_like_amount(field) {
            region_start = i;
            break;
        }
        description_parts.push(field);
    }

    let region = &fields[region_start..];
    if region.is_empty() {
        return None;
    }

    // Anything between the first amount-shaped field and the final triplet
    // still belongs to the description (merged columns)
    if region.len() > 3 {
        description_parts.extend(&region[..region.len() - 3]);
    }
    let amounts = &region[region.len().saturating_sub(3)..];

    let (withdrawal_text, deposit_text, balance_text) = match amounts {
        [w] => (Some(w.to_string()), None, None),
        [w, b] => (Some(w.to_string()), None, Some(b.to_string())),
        [w, d, b] => (
            Some(w.to_string()),
            Some(d.to_string()),
            Some(b.to_string()),
        ),
        _ => return None,
    };

    Some(RawLine {
        date_text,
        description_text: description_parts.join(" ").trim().to_string(),
        withdrawal_text,
        deposit_text,
        balance_text,
    })
}

/// Run a "from DATE to DATE" regex over the text and parse both captures
pub(crate) fn extract_period_with(re: &Regex, text: &str) -> StatementPeriod {
    match re.captures(text) {
        Some(caps) => StatementPeriod {
            from: caps.get(1).and_then(|m| parse_date(m.as_str())),
            to: caps.get(2).and_then(|m| parse_date(m.as_str())),
        },
        None => StatementPeriod::default(),
    }
}
