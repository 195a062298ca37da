//! Label sanitization for filesystem-safe names
//!
//! Two deliberately different sanitizers live here:
//! - [`sanitize_label`] turns an AI-suggested base name into a bounded
//!   `[A-Za-z0-9_-]` fragment, folding rejected characters into `_`.
//! - [`sanitize_category`] cleans a category folder name by dropping
//!   rejected characters outright, with no folding and no length bound.
//!
//! Keep them separate: a category like `"My Finance!!"` must become
//! `MyFinance`, not `My_Finance`.

/// Fallback base name when a label sanitizes to nothing.
pub const UNTITLED: &str = "Untitled";

/// Fallback category when a label sanitizes to nothing, and the value the
/// gateway degrades to when categorization fails.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Longest base name `sanitize_label` will produce.
pub const MAX_LABEL_LEN: usize = 60;

/// Sanitize an AI-suggested base name into a safe filename fragment.
///
/// Every character outside ASCII alphanumerics, `-` and `_` becomes `_`,
/// runs of `_` collapse to one, leading/trailing `_` are stripped, and the
/// result is truncated to [`MAX_LABEL_LEN`] characters. An input that
/// sanitizes to nothing yields [`UNTITLED`]. Total: always returns a
/// usable name.
pub fn sanitize_label(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len().min(MAX_LABEL_LEN));
    let mut last_was_underscore = false;

    for ch in text.chars() {
        let mapped = if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' {
            ch
        } else {
            '_'
        };
        if mapped == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        cleaned.push(mapped);
    }

    let trimmed = cleaned.trim_matches('_');
    let bounded: String = trimmed.chars().take(MAX_LABEL_LEN).collect();

    if bounded.is_empty() {
        UNTITLED.to_string()
    } else {
        bounded
    }
}

/// Sanitize a category label into a folder name.
///
/// Keeps ASCII alphanumerics, `-` and `_`; drops everything else. No
/// folding, no truncation. An input that sanitizes to nothing yields
/// [`UNCATEGORIZED`].
pub fn sanitize_category(text: &str) -> String {
    let kept: String = text
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect();

    if kept.is_empty() {
        UNCATEGORIZED.to_string()
    } else {
        kept
    }
}
