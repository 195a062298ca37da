//! Prompt text sent to the classification model
//!
//! The sentinel spellings `Unknown_Document` and `Uncategorized` are load
//! bearing: callers match on them verbatim.

/// Prompt attached to an uploaded document when asking for a name.
pub const FILENAME_PROMPT: &str = "Analyze this document. Output ONLY a short, descriptive \
filename using snake_case (like: Data_Engineering_SQL_Basics). Do not include the file \
extension. Do not use spaces. If you cannot determine a name, return 'Unknown_Document'.";

/// Build the text-only prompt asking for a category for one filename.
pub fn build_category_prompt(filename: &str) -> String {
    format!(
        "Categorize this file based on its name: '{}'. Return ONLY a single, short category \
name (e.g., 'SQL', 'Python', 'Finance', 'Personal'). Do not use special characters or \
spaces. If unclear, return 'Uncategorized'.",
        filename
    )
}
