//! Error types, one enum per failure category
//!
//! - [`BatchError`]: precondition failures that abort a batch before any
//!   item is processed
//! - [`ClassifyError`]: the classification gateway could not produce a label
//!   for one file
//! - [`MutationError`]: a filesystem rename/move failed for one file
//!
//! Only `BatchError` is ever fatal; the other two are caught per item and
//! turned into reported outcomes.

use std::io;

use thiserror::Error;

/// Errors that abort a whole batch before any file is touched
#[derive(Debug, Error)]
pub enum BatchError {
    /// The target folder does not exist
    #[error("Folder not found: {path}")]
    FolderNotFound { path: String },

    /// The target path exists but is not a directory
    #[error("Not a folder: {path}")]
    NotAFolder { path: String },

    /// The target folder could not be listed
    #[error("Failed to read folder {path}: {source}")]
    ReadFolder {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Errors from the classification gateway
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// The HTTP request itself failed (connect, timeout, body)
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The file to classify could not be read
    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The upload endpoint did not return a session URL
    #[error("Upload did not return an upload URL")]
    MissingUploadUrl,

    /// An uploaded file ended in a state it cannot be used from
    #[error("Uploaded file ended in state {state}")]
    UploadFailed { state: String },

    /// The uploaded file never left the PROCESSING state
    #[error("Uploaded file still processing after {attempts} polls")]
    ProcessingTimeout { attempts: u32 },

    /// The model returned no usable text
    #[error("Empty reply from model")]
    EmptyReply,
}

/// Errors from filesystem mutations (rename/move/mkdir)
#[derive(Debug, Error)]
pub enum MutationError {
    /// The source path has no parent directory to work in
    #[error("No parent directory for {path}")]
    NoParent { path: String },

    /// The source path has no usable file name
    #[error("No file name in {path}")]
    NoFileName { path: String },

    /// The rename call failed
    #[error("Failed to rename {from} to {to}: {source}")]
    Rename {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },

    /// The category folder could not be created
    #[error("Failed to create folder {path}: {source}")]
    CreateFolder {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A same-named file already occupies the destination
    #[error("Destination already exists: {path}")]
    DestinationOccupied { path: String },

    /// The move failed (rename and copy fallback both failed)
    #[error("Failed to move {from} to {to}: {source}")]
    Move {
        from: String,
        to: String,
        #[source]
        source: io::Error,
    },
}
