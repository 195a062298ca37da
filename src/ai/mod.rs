//! Classification gateway
//!
//! The batch loop only ever talks to the [`Classifier`] trait: one call to
//! name a file from its content, one call to pick a category folder from a
//! filename. [`GeminiClient`] is the shipped implementation; tests drive the
//! loop with in-memory fakes.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ClassifyError;

pub mod gemini;
pub mod prompts;

pub use gemini::{GeminiClient, GeminiConfig};

/// Label the model answers with when it cannot name a document. A valid
/// reply, but callers must treat it like a failed classification and leave
/// the file alone.
pub const UNKNOWN_DOCUMENT: &str = "Unknown_Document";

/// Boundary to the external classification service.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Suggest a descriptive base name (no extension) for a file from its
    /// content. May return [`UNKNOWN_DOCUMENT`]; see its docs.
    async fn suggest_filename(&self, path: &Path) -> Result<String, ClassifyError>;

    /// Suggest a category folder name for a filename. Never fails: any
    /// internal error degrades to `"Uncategorized"`.
    async fn categorize(&self, filename: &str) -> String;
}
