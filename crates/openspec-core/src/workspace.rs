//! Discovery and reading of specs and changes under `openspec/`.
//!
//! This is the only place that knows the on-disk layout beyond `paths`.
//! Everything returned here is plain data handed to the pure parsers.

use crate::error::{Result, SpecError};
use crate::paths;
use crate::requirement_blocks::DeltaFile;
use std::path::Path;
use tracing::warn;

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// Directory names under `dir`, sorted, excluding hidden entries.
fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}

/// Active change ids, sorted. The `archive` directory is not a change.
pub fn list_change_ids(root: &Path) -> Result<Vec<String>> {
    let mut ids = list_subdirs(&paths::changes_dir(root))?;
    ids.retain(|id| id != paths::ARCHIVE_DIR_NAME);
    Ok(ids)
}

/// Archived change directory names (`YYYY-MM-DD-<id>`), sorted.
pub fn list_archived_ids(root: &Path) -> Result<Vec<String>> {
    list_subdirs(&paths::archive_dir(root))
}

/// Capability ids that have a `spec.md`, sorted.
pub fn list_spec_ids(root: &Path) -> Result<Vec<String>> {
    let mut ids = list_subdirs(&paths::specs_dir(root))?;
    ids.retain(|id| paths::spec_path(root, id).is_file());
    Ok(ids)
}

pub fn spec_exists(root: &Path, id: &str) -> bool {
    paths::validate_item_id(id).is_ok() && paths::spec_path(root, id).is_file()
}

pub fn change_exists(root: &Path, id: &str) -> bool {
    id != paths::ARCHIVE_DIR_NAME
        && paths::validate_item_id(id).is_ok()
        && paths::change_dir(root, id).is_dir()
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

pub fn read_spec(root: &Path, id: &str) -> Result<String> {
    paths::validate_item_id(id)?;
    if !spec_exists(root, id) {
        return Err(SpecError::SpecNotFound(id.to_string()));
    }
    Ok(std::fs::read_to_string(paths::spec_path(root, id))?)
}

pub fn read_proposal(root: &Path, id: &str) -> Result<String> {
    paths::validate_item_id(id)?;
    if !change_exists(root, id) {
        return Err(SpecError::ChangeNotFound(id.to_string()));
    }
    Ok(crate::io::read_optional(&paths::proposal_path(root, id))?.unwrap_or_default())
}

/// One [`DeltaFile`] per `specs/<capability>/spec.md` inside `change_dir`,
/// sorted by capability. A change without `specs/` has no delta files.
pub fn read_delta_files(change_dir: &Path) -> Result<Vec<DeltaFile>> {
    let specs_dir = change_dir.join(paths::CHANGE_SPECS_DIR);
    let mut files = Vec::new();
    for capability in list_subdirs(&specs_dir)? {
        let path = specs_dir.join(&capability).join(paths::SPEC_FILE);
        match crate::io::read_optional(&path)? {
            Some(content) => files.push(DeltaFile::new(capability, content)),
            None => warn!(capability = %capability, "delta directory has no spec.md, skipping"),
        }
    }
    Ok(files)
}
