//! JSON parsing helpers for AI backend responses
//!
//! Model output often wraps the JSON payload in prose. These helpers extract
//! the first balanced object/array and deserialize it, capping confidence at
//! 0.95.

use crate::error::{Error, Result};

use super::types::AiCategorization;

/// Ceiling applied to every AI-reported confidence
const CONFIDENCE_CAP: f64 = 0.95;

/// Fallback when a batch item omits its confidence
const DEFAULT_BATCH_CONFIDENCE: f64 = 0.8;

/// Find the first balanced `open`..`close` span in a response
fn balanced_span(response: &str, open: char, close: char) -> Option<&str> {
    let start = response.find(open)?;
    let mut depth = 0i32;

    for (i, c) in response[start..].char_indices() {
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(&response[start..start + i + close.len_utf8()]);
            }
        }
    }

    None
}

fn truncate_for_error(s: &str) -> String {
    if s.len() > 200 {
        format!("{}...", &s[..200])
    } else {
        s.to_string()
    }
}

/// Parse a single classification from an AI response
pub fn parse_categorization(response: &str) -> Result<AiCategorization> {
    let response = response.trim();
    let json_str = balanced_span(response, '{', '}').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON found in AI response | Raw: {}",
            truncate_for_error(response)
        ))
    })?;

    let mut parsed: AiCategorization = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI: {} | Raw: {}",
            e,
            truncate_for_error(json_str)
        ))
    })?;

    if parsed.category.trim().is_empty() {
        return Err(Error::InvalidData("AI returned an empty category".into()));
    }
    parsed.category = parsed.category.trim().to_uppercase();
    parsed.confidence = parsed.confidence.min(CONFIDENCE_CAP);

    Ok(parsed)
}

/// One item of a batch classification response
#[derive(Debug, serde::Deserialize)]
struct BatchItem {
    /// 1-based position within the submitted batch
    index: usize,
    category: Option<String>,
    confidence: Option<f64>,
}

/// Parse a batch classification from an AI response
///
/// Returns one slot per submitted transaction; items the model skipped,
/// returned out of range, or left without a category stay None.
pub fn parse_batch_categorization(
    response: &str,
    expected: usize,
) -> Result<Vec<Option<AiCategorization>>> {
    let response = response.trim();
    let json_str = balanced_span(response, '[', ']').ok_or_else(|| {
        Error::InvalidData(format!(
            "No JSON array found in AI batch response | Raw: {}",
            truncate_for_error(response)
        ))
    })?;

    let items: Vec<BatchItem> = serde_json::from_str(json_str).map_err(|e| {
        Error::InvalidData(format!(
            "Invalid JSON from AI batch: {} | Raw: {}",
            e,
            truncate_for_error(json_str)
        ))
    })?;

    let mut results = vec![None; expected];
    for item in items {
        if item.index == 0 || item.index > expected {
            continue;
        }
        let category = match item.category {
            Some(c) if !c.trim().is_empty() => c.trim().to_uppercase(),
            _ => continue,
        };
        results[item.index - 1] = Some(AiCategorization {
            category,
            confidence: item
                .confidence
                .unwrap_or(DEFAULT_BATCH_CONFIDENCE)
                .min(CONFIDENCE_CAP),
        });
    }

    Ok(results)
}
