//! Archive a completed change: merge its deltas into the living specs, then
//! move the change directory under `changes/archive/`.
//!
//! Two phases. PREPARE rebuilds (and optionally validates) every affected
//! spec in memory; WRITE persists them. Any failure during PREPARE leaves the
//! filesystem untouched.

use crate::error::{Result, SpecError};
use crate::merge::{build_updated_spec, MergeCounts};
use crate::requirement_blocks::{parse_delta_spec, DeltaFile};
use crate::tasks::count_tasks;
use crate::types::ValidationLevel;
use crate::validator::{ValidateOptions, Validator};
use crate::{io, paths, workspace};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Move the change without applying its deltas.
    pub skip_specs: bool,
    /// Validate each rebuilt spec before anything is written.
    pub validate: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            skip_specs: false,
            validate: true,
        }
    }
}

/// A rebuilt spec held in memory between PREPARE and WRITE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedUpdate {
    pub capability: String,
    /// True when the capability had no spec before this change.
    pub created: bool,
    pub rebuilt: String,
    pub counts: MergeCounts,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpecUpdate {
    pub capability: String,
    pub created: bool,
    pub counts: MergeCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveOutcome {
    pub change_id: String,
    pub archive_name: String,
    pub incomplete_tasks: usize,
    pub updates: Vec<SpecUpdate>,
    pub totals: MergeCounts,
}

pub fn archive_name(change_id: &str, date: NaiveDate) -> String {
    format!("{}-{change_id}", date.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// PREPARE
// ---------------------------------------------------------------------------

/// Rebuild every spec touched by `delta_files`. `targets` maps capability to
/// current spec text; capabilities absent from it are new.
pub fn prepare_spec_updates(
    delta_files: &[DeltaFile],
    targets: &HashMap<String, String>,
    validate: bool,
) -> Result<Vec<PreparedUpdate>> {
    let validator = Validator::new(ValidateOptions { strict: false });
    let mut prepared = Vec::new();

    for file in delta_files {
        let plan = parse_delta_spec(&file.content);
        if plan.is_empty() {
            warn!(capability = %file.capability, "delta file has no operations, skipping");
            continue;
        }
        let target = targets.get(&file.capability).map(String::as_str);
        let result = build_updated_spec(&file.capability, target, &plan)?;

        if validate {
            let report = validator.validate_spec(&file.capability, &result.rebuilt);
            if !report.valid {
                let details = report
                    .issues_at(ValidationLevel::Error)
                    .map(|i| format!("{}: {}", i.path, i.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                return Err(SpecError::RebuiltSpecInvalid {
                    capability: file.capability.clone(),
                    details,
                });
            }
        }

        prepared.push(PreparedUpdate {
            capability: file.capability.clone(),
            created: target.is_none(),
            rebuilt: result.rebuilt,
            counts: result.counts,
        });
    }
    Ok(prepared)
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

pub fn archive_change(
    root: &Path,
    change_id: &str,
    options: ArchiveOptions,
    today: NaiveDate,
) -> Result<ArchiveOutcome> {
    paths::validate_item_id(change_id)?;
    if !workspace::change_exists(root, change_id) {
        return Err(SpecError::ChangeNotFound(change_id.to_string()));
    }
    let name = archive_name(change_id, today);
    let destination = paths::archive_dir(root).join(&name);
    if destination.exists() {
        return Err(SpecError::ArchiveExists(name));
    }

    let change_dir = paths::change_dir(root, change_id);
    let progress = io::read_optional(&paths::tasks_path(root, change_id))?
        .map(|content| count_tasks(&content))
        .unwrap_or_default();
    if progress.incomplete() > 0 {
        warn!(
            change = change_id,
            incomplete = progress.incomplete(),
            "archiving with incomplete tasks"
        );
    }

    let mut updates = Vec::new();
    if options.skip_specs {
        info!(change = change_id, "skipping spec updates");
    } else {
        let delta_files = workspace::read_delta_files(&change_dir)?;
        let mut targets = HashMap::new();
        for file in &delta_files {
            paths::validate_item_id(&file.capability)?;
            if let Some(text) = io::read_optional(&paths::spec_path(root, &file.capability))? {
                targets.insert(file.capability.clone(), text);
            }
        }

        let prepared = prepare_spec_updates(&delta_files, &targets, options.validate)?;

        for update in &prepared {
            let path = paths::spec_path(root, &update.capability);
            io::atomic_write(&path, update.rebuilt.as_bytes())?;
            info!(
                capability = %update.capability,
                created = update.created,
                operations = update.counts.total(),
                "wrote spec"
            );
        }
        updates = prepared
            .into_iter()
            .map(|u| SpecUpdate {
                capability: u.capability,
                created: u.created,
                counts: u.counts,
            })
            .collect();
    }

    io::ensure_dir(&paths::archive_dir(root))?;
    std::fs::rename(&change_dir, &destination)?;
    info!(change = change_id, archive = %name, "archived change");

    let mut totals = MergeCounts::default();
    for update in &updates {
        totals.accumulate(&update.counts);
    }
    Ok(ArchiveOutcome {
        change_id: change_id.to_string(),
        archive_name: name,
        incomplete_tasks: progress.incomplete(),
        updates,
        totals,
    })
}
