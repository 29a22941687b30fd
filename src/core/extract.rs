//! Candidate identifier extraction from free-text log fields
//!
//! Pulls tokens that look like canonical identifiers (`PREFIX-NNN` or
//! `PREFIX-X.Y`) out of the unstructured fields of a log entry. An empty
//! result is expected for entries that simply don't mention any work item.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::entities::LogEntry;

/// Token that looks like a canonical identifier. The prefix is at least
/// two characters so single letters followed by a dash ("e-mail"-style
/// fragments) don't match.
static ID_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][A-Z0-9]{1,11}-\d+(?:\.\d+)?\b").expect("valid pattern"));

/// Extract the distinct candidate identifiers mentioned in a log entry.
///
/// Fields are scanned in a fixed order (`related_phase`, `related_step`,
/// `summary`) and matches are collected in first-seen order with
/// duplicates removed. For `related_step` the token truncated before its
/// first `.` is also scanned, because step tokens often embed their
/// parent phase or project id as a prefix (`WT-3.1-4` -> `WT-3`).
pub fn extract_candidates(entry: &LogEntry) -> Vec<String> {
    let mut candidates = Vec::new();

    if let Some(phase) = &entry.related_phase {
        scan(phase, &mut candidates);
    }
    if let Some(step) = &entry.related_step {
        scan(step, &mut candidates);
        if let Some(dot) = step.find('.') {
            scan(&step[..dot], &mut candidates);
        }
    }
    scan(&entry.summary, &mut candidates);

    candidates
}

fn scan(text: &str, candidates: &mut Vec<String>) {
    for m in ID_PATTERN.find_iter(text) {
        let token = m.as_str();
        if !candidates.iter().any(|c| c == token) {
            candidates.push(token.to_string());
        }
    }
}
