//! AI-assisted file renaming and organizing
//!
//! Points an AI classifier at a folder and turns its suggestions into safe
//! filesystem mutations:
//!
//! - **Rename**: upload each file's content, get a descriptive snake_case
//!   name back, rename in place without clobbering anything.
//! - **Organize**: derive a category from each filename and move the file
//!   into a matching subfolder.
//!
//! ```text
//! BatchOrganizer ──> Classifier (Gemini) ──> label
//!        │                                     │
//!        └──> sanitize ──> collision-safe rename/move ──> ItemOutcome
//! ```
//!
//! The batch loop is sequential and failure-isolated: one bad file is
//! reported and skipped, never fatal. See [`batch::BatchOrganizer`].

pub mod ai;
pub mod batch;
pub mod error;
pub mod naming;
pub mod ops;

pub use ai::{Classifier, GeminiClient, GeminiConfig, UNKNOWN_DOCUMENT};
pub use batch::{BatchEvent, BatchOrganizer, BatchProgress, BatchReport, ItemOutcome};
pub use error::{BatchError, ClassifyError, MutationError};
