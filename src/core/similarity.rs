//! Name similarity for duplicate detection and fuzzy resolution
//!
//! Normalized edit distance over characters: `(max_len - distance) /
//! max_len`. Case-sensitive by contract - callers that want
//! case-insensitive matching normalize before calling.

/// Similarity between two strings in `[0.0, 1.0]`, where 1.0 means
/// identical. Two empty strings are defined as identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    let distance = strsim::levenshtein(a, b);
    (max_len - distance) as f64 / max_len as f64
}
