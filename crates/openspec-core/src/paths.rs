use crate::error::{Result, SpecError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const OPENSPEC_DIR: &str = "openspec";
pub const SPECS_DIR: &str = "openspec/specs";
pub const CHANGES_DIR: &str = "openspec/changes";
pub const ARCHIVE_DIR: &str = "openspec/changes/archive";

pub const CONFIG_FILE: &str = "openspec/config.yaml";

pub const SPEC_FILE: &str = "spec.md";
pub const PROPOSAL_FILE: &str = "proposal.md";
pub const TASKS_FILE: &str = "tasks.md";
/// Directory inside a change that holds per-capability delta files.
pub const CHANGE_SPECS_DIR: &str = "specs";

/// Name of the archive directory under `changes/`, excluded from listings.
pub const ARCHIVE_DIR_NAME: &str = "archive";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn openspec_dir(root: &Path) -> PathBuf {
    root.join(OPENSPEC_DIR)
}

pub fn specs_dir(root: &Path) -> PathBuf {
    root.join(SPECS_DIR)
}

pub fn changes_dir(root: &Path) -> PathBuf {
    root.join(CHANGES_DIR)
}

pub fn archive_dir(root: &Path) -> PathBuf {
    root.join(ARCHIVE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn spec_path(root: &Path, capability: &str) -> PathBuf {
    specs_dir(root).join(capability).join(SPEC_FILE)
}

pub fn change_dir(root: &Path, id: &str) -> PathBuf {
    changes_dir(root).join(id)
}

pub fn proposal_path(root: &Path, id: &str) -> PathBuf {
    change_dir(root, id).join(PROPOSAL_FILE)
}

pub fn tasks_path(root: &Path, id: &str) -> PathBuf {
    change_dir(root, id).join(TASKS_FILE)
}

pub fn change_specs_dir(root: &Path, id: &str) -> PathBuf {
    change_dir(root, id).join(CHANGE_SPECS_DIR)
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ITEM_ID_RE: OnceLock<Regex> = OnceLock::new();

fn item_id_re() -> &'static Regex {
    ITEM_ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap())
}

/// Spec and change ids are used as directory names; reject anything that is
/// not a single, non-hidden path component.
pub fn validate_item_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 128 || !item_id_re().is_match(id) || id.contains("..") {
        return Err(SpecError::InvalidId(id.to_string()));
    }
    Ok(())
}
