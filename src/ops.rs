//! Collision-safe filesystem mutations
//!
//! Turns sanitized labels into actual renames and moves. Both operations
//! check the destination immediately before acting and never overwrite an
//! existing file: renames probe for a free `_1`, `_2`, ... slot, moves
//! refuse an occupied destination.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::MutationError;
use crate::naming::{sanitize_category, sanitize_label};

/// Extension of a file name, from the last `.` onward including the dot.
/// Empty if there is none; a leading dot does not start an extension.
fn file_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) if idx > 0 => &name[idx..],
        _ => "",
    }
}

/// Rename `source` to a sanitized version of `desired_base`, keeping the
/// original extension.
///
/// If the preferred name is taken, probes `base_1`, `base_2`, ... until a
/// free slot is found, then performs a single `fs::rename`. Returns the
/// final file name.
pub fn rename_with_label(source: &Path, desired_base: &str) -> Result<String, MutationError> {
    let folder = source.parent().ok_or_else(|| MutationError::NoParent {
        path: source.display().to_string(),
    })?;
    let source_name = source
        .file_name()
        .ok_or_else(|| MutationError::NoFileName {
            path: source.display().to_string(),
        })?
        .to_string_lossy()
        .into_owned();

    let extension = file_extension(&source_name);
    let base = sanitize_label(desired_base);

    let mut final_name = format!("{}{}", base, extension);
    let mut target = folder.join(&final_name);
    let mut counter = 1u32;
    while target.exists() {
        final_name = format!("{}_{}{}", base, counter, extension);
        target = folder.join(&final_name);
        counter += 1;
    }

    debug!(
        from = %source.display(),
        to = %target.display(),
        "Renaming file"
    );

    fs::rename(source, &target).map_err(|e| MutationError::Rename {
        from: source_name,
        to: final_name.clone(),
        source: e,
    })?;

    Ok(final_name)
}

/// Move `source` into a category subfolder next to it, keeping its name.
///
/// The category is cleaned with [`sanitize_category`] and the folder is
/// created if missing. A same-named file already in the category folder
/// fails the move; the source stays where it is. Returns
/// `"{category}/{filename}"`.
pub fn move_to_category(source: &Path, raw_category: &str) -> Result<String, MutationError> {
    let folder = source.parent().ok_or_else(|| MutationError::NoParent {
        path: source.display().to_string(),
    })?;
    let file_name = source
        .file_name()
        .ok_or_else(|| MutationError::NoFileName {
            path: source.display().to_string(),
        })?
        .to_os_string();

    let category = sanitize_category(raw_category);
    let category_dir = folder.join(&category);
    if !category_dir.exists() {
        fs::create_dir_all(&category_dir).map_err(|e| MutationError::CreateFolder {
            path: category_dir.display().to_string(),
            source: e,
        })?;
    }

    let destination = category_dir.join(&file_name);
    if destination.exists() {
        return Err(MutationError::DestinationOccupied {
            path: destination.display().to_string(),
        });
    }

    debug!(
        from = %source.display(),
        to = %destination.display(),
        "Moving file"
    );

    // Try rename first (same filesystem), fall back to copy+delete.
    if fs::rename(source, &destination).is_err() {
        fs::copy(source, &destination)
            .and_then(|_| fs::remove_file(source))
            .map_err(|e| MutationError::Move {
                from: source.display().to_string(),
                to: destination.display().to_string(),
                source: e,
            })?;
    }

    Ok(format!(
        "{}/{}",
        category,
        file_name.to_string_lossy()
    ))
}
