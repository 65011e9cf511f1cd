//! Apply a [`DeltaPlan`] to a capability spec and produce the rebuilt text.
//!
//! Operations apply in a fixed order: RENAMED, REMOVED, MODIFIED, ADDED.
//! Blocks keep their original position; only ADDED blocks are appended.
//! The function is pure; writing the result is the caller's business.

use crate::error::{Result, SpecError};
use crate::requirement_blocks::{
    extract_requirements_section, normalize_requirement_name, DeltaPlan, RequirementBlock,
    RequirementsSectionParts,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use tracing::debug;

static EXCESS_BLANK_LINES_RE: OnceLock<Regex> = OnceLock::new();
static HEADER_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn excess_blank_lines_re() -> &'static Regex {
    EXCESS_BLANK_LINES_RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn header_line_re() -> &'static Regex {
    HEADER_LINE_RE.get_or_init(|| Regex::new(r"^###\s*Requirement:\s*(.+?)\s*$").unwrap())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeCounts {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub renamed: usize,
}

impl MergeCounts {
    pub fn total(&self) -> usize {
        self.added + self.modified + self.removed + self.renamed
    }

    pub fn accumulate(&mut self, other: &MergeCounts) {
        self.added += other.added;
        self.modified += other.modified;
        self.removed += other.removed;
        self.renamed += other.renamed;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeResult {
    pub rebuilt: String,
    pub counts: MergeCounts,
}

/// Document used when a change introduces a brand-new capability.
pub fn skeleton_spec(capability: &str) -> String {
    format!(
        "# {capability} Specification\n\n## Purpose\nTBD - created by archiving a change. Update Purpose after archive.\n\n## Requirements\n"
    )
}

// ---------------------------------------------------------------------------
// Ordered block map
// ---------------------------------------------------------------------------

/// Requirement blocks in document order, addressable by normalized name.
struct OrderedBlocks {
    slots: Vec<Option<RequirementBlock>>,
    index: HashMap<String, usize>,
}

impl OrderedBlocks {
    fn new(blocks: Vec<RequirementBlock>) -> Self {
        let mut index = HashMap::new();
        let slots = blocks
            .into_iter()
            .enumerate()
            .map(|(i, block)| {
                index.insert(block.key(), i);
                Some(block)
            })
            .collect();
        Self { slots, index }
    }

    fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    fn get(&self, key: &str) -> Option<&RequirementBlock> {
        self.index.get(key).and_then(|&i| self.slots[i].as_ref())
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.index.remove(key) {
            Some(i) => {
                self.slots[i] = None;
                true
            }
            None => false,
        }
    }

    /// Put `block` in the slot currently held by `key`, re-keying the slot.
    fn replace(&mut self, key: &str, block: RequirementBlock) {
        if let Some(i) = self.index.remove(key) {
            self.index.insert(block.key(), i);
            self.slots[i] = Some(block);
        }
    }

    fn push(&mut self, block: RequirementBlock) {
        self.index.insert(block.key(), self.slots.len());
        self.slots.push(Some(block));
    }

    fn into_blocks(self) -> Vec<RequirementBlock> {
        self.slots.into_iter().flatten().collect()
    }
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// Apply `plan` to `target` (the current spec text, or `None` when the
/// capability does not exist yet).
pub fn build_updated_spec(
    capability: &str,
    target: Option<&str>,
    plan: &DeltaPlan,
) -> Result<MergeResult> {
    let invalid = |reason: String| SpecError::InvalidDeltaPlan {
        capability: capability.to_string(),
        reason,
    };

    let conflicts = plan.conflicts();
    if !conflicts.is_empty() {
        return Err(invalid(conflicts.join("; ")));
    }
    if !plan.unpaired_renames.is_empty() {
        return Err(invalid(format!(
            "unpaired RENAMED entries: {}",
            plan.unpaired_renames.join(", ")
        )));
    }

    let target = match target {
        Some(text) => text.to_string(),
        None if plan.has_only_additions() => skeleton_spec(capability),
        None => {
            return Err(SpecError::NewSpecRequiresAdded {
                capability: capability.to_string(),
            })
        }
    };

    let parts = extract_requirements_section(&target);
    let mut blocks = OrderedBlocks::new(parts.body_blocks.clone());
    let mut counts = MergeCounts::default();

    for pair in &plan.renamed {
        let from = normalize_requirement_name(&pair.from);
        let to = normalize_requirement_name(&pair.to);
        let Some(existing) = blocks.get(&from) else {
            return Err(SpecError::RenameSourceNotFound {
                capability: capability.to_string(),
                from: pair.from.clone(),
            });
        };
        if from != to && blocks.contains(&to) {
            return Err(SpecError::RenameTargetExists {
                capability: capability.to_string(),
                to: pair.to.clone(),
            });
        }
        let renamed = existing.renamed(&pair.to);
        blocks.replace(&from, renamed);
        counts.renamed += 1;
    }

    for name in &plan.removed {
        if !blocks.remove(&normalize_requirement_name(name)) {
            return Err(SpecError::RequirementNotFound {
                capability: capability.to_string(),
                operation: "REMOVED",
                name: name.clone(),
            });
        }
        counts.removed += 1;
    }

    for block in &plan.modified {
        let key = block.key();
        if !blocks.contains(&key) {
            return Err(SpecError::RequirementNotFound {
                capability: capability.to_string(),
                operation: "MODIFIED",
                name: block.name.clone(),
            });
        }
        if raw_header_key(block).as_deref() != Some(key.as_str()) {
            return Err(SpecError::HeaderMismatch {
                capability: capability.to_string(),
                name: block.name.clone(),
            });
        }
        blocks.replace(&key, block.clone());
        counts.modified += 1;
    }

    for block in &plan.added {
        if blocks.contains(&block.key()) {
            return Err(SpecError::RequirementExists {
                capability: capability.to_string(),
                name: block.name.clone(),
            });
        }
        blocks.push(block.clone());
        counts.added += 1;
    }

    let merged = blocks.into_blocks();
    let distinct: HashSet<String> = merged.iter().map(RequirementBlock::key).collect();
    if distinct.len() != merged.len() {
        return Err(SpecError::DuplicateHeaders {
            capability: capability.to_string(),
        });
    }

    debug!(
        capability,
        added = counts.added,
        modified = counts.modified,
        removed = counts.removed,
        renamed = counts.renamed,
        "merged delta plan"
    );

    Ok(MergeResult {
        rebuilt: recompose(&parts, &merged),
        counts,
    })
}

/// Normalized name taken from the first line of the block's raw text.
fn raw_header_key(block: &RequirementBlock) -> Option<String> {
    let first = block.raw.lines().next()?;
    header_line_re()
        .captures(first)
        .map(|caps| normalize_requirement_name(&caps[1]))
}

fn recompose(parts: &RequirementsSectionParts, blocks: &[RequirementBlock]) -> String {
    let mut body: Vec<&str> = Vec::new();
    if !parts.preamble.trim().is_empty() {
        body.push(&parts.preamble);
    }
    body.extend(blocks.iter().map(|b| b.raw.trim_end()));

    let mut out = String::new();
    out.push_str(&parts.before);
    out.push_str(&parts.header_line);
    out.push('\n');
    if !body.is_empty() {
        out.push('\n');
        out.push_str(&body.join("\n\n"));
        out.push('\n');
    }
    if !parts.after.trim().is_empty() {
        out.push('\n');
        out.push_str(&parts.after);
    }

    let collapsed = excess_blank_lines_re().replace_all(&out, "\n\n");
    format!("{}\n", collapsed.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement_blocks::parse_delta_spec;

    const TARGET: &str = "# Auth Specification\n\n## Purpose\nAuthentication for the console.\n\n## Requirements\n\n### Requirement: Login\nThe system SHALL log users in.\n\n#### Scenario: ok\n- **WHEN** valid credentials\n- **THEN** a session starts\n\n### Requirement: Session Timeout\nThe system SHALL expire sessions.\n\n#### Scenario: idle\n- **WHEN** idle for 30 minutes\n- **THEN** the session ends\n\n### Requirement: Remember Me\nThe system SHALL remember devices.\n\n#### Scenario: remembered\n- **WHEN** the box is ticked\n- **THEN** the device is remembered\n\n## Notes\nKeep this.\n";

    fn merge(target: Option<&str>, delta: &str) -> Result<MergeResult> {
        build_updated_spec("auth", target, &parse_delta_spec(delta))
    }

    fn headers(text: &str) -> Vec<&str> {
        text.lines()
            .filter(|l| l.starts_with("### Requirement:"))
            .collect()
    }

    #[test]
    fn empty_plan_is_identity() {
        let result = merge(Some(TARGET), "").unwrap();
        assert_eq!(result.rebuilt, TARGET);
        assert_eq!(result.counts.total(), 0);
    }

    #[test]
    fn added_appends_at_end_of_section() {
        let result = merge(
            Some(TARGET),
            "## ADDED Requirements\n### Requirement: Logout\nThe system SHALL log out.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b\n",
        )
        .unwrap();
        assert_eq!(
            headers(&result.rebuilt),
            vec![
                "### Requirement: Login",
                "### Requirement: Session Timeout",
                "### Requirement: Remember Me",
                "### Requirement: Logout",
            ]
        );
        assert!(result.rebuilt.ends_with("## Notes\nKeep this.\n"));
        assert_eq!(result.counts.added, 1);
    }

    #[test]
    fn rename_keeps_position_and_body() {
        let result = merge(
            Some(TARGET),
            "## RENAMED Requirements\n- FROM: `### Requirement: Session Timeout`\n- TO: `### Requirement: Idle Timeout`\n",
        )
        .unwrap();
        assert_eq!(
            headers(&result.rebuilt),
            vec![
                "### Requirement: Login",
                "### Requirement: Idle Timeout",
                "### Requirement: Remember Me",
            ]
        );
        assert!(result
            .rebuilt
            .contains("### Requirement: Idle Timeout\nThe system SHALL expire sessions."));
        assert_eq!(result.counts.renamed, 1);
    }

    #[test]
    fn modify_after_rename_uses_new_name() {
        let result = merge(
            Some(TARGET),
            "## RENAMED Requirements\n- FROM: Session Timeout\n- TO: Idle Timeout\n\n## MODIFIED Requirements\n### Requirement: Idle Timeout\nThe system SHALL expire sessions after 15 minutes.\n\n#### Scenario: idle\n- **WHEN** idle for 15 minutes\n- **THEN** the session ends\n",
        )
        .unwrap();
        assert!(result.rebuilt.contains("after 15 minutes"));
        assert!(!result.rebuilt.contains("Session Timeout"));
        assert_eq!(headers(&result.rebuilt)[1], "### Requirement: Idle Timeout");
    }

    #[test]
    fn remove_then_modify_others() {
        let result = merge(
            Some(TARGET),
            "## REMOVED Requirements\n### Requirement: Remember Me\n\n## MODIFIED Requirements\n### Requirement: login\nThe system SHALL log users in with MFA.\n\n#### Scenario: ok\n- **WHEN** valid credentials and code\n- **THEN** a session starts\n",
        )
        .unwrap();
        assert_eq!(
            headers(&result.rebuilt),
            vec!["### Requirement: login", "### Requirement: Session Timeout"]
        );
        assert!(!result.rebuilt.contains("remember devices"));
        assert_eq!(result.counts.removed, 1);
        assert_eq!(result.counts.modified, 1);
    }

    #[test]
    fn added_collision_fails() {
        let err = merge(
            Some(TARGET),
            "## ADDED Requirements\n### Requirement: login\nThe system SHALL x.\n",
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::RequirementExists { ref name, .. } if name == "login"));
    }

    #[test]
    fn missing_targets_fail() {
        let err = merge(Some(TARGET), "## REMOVED Requirements\n### Requirement: Ghost\n")
            .unwrap_err();
        assert!(matches!(err, SpecError::RequirementNotFound { operation: "REMOVED", .. }));

        let err = merge(
            Some(TARGET),
            "## MODIFIED Requirements\n### Requirement: Ghost\nThe system SHALL x.\n",
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::RequirementNotFound { operation: "MODIFIED", .. }));

        let err = merge(Some(TARGET), "## RENAMED Requirements\nFROM: Ghost\nTO: Spirit\n")
            .unwrap_err();
        assert!(matches!(err, SpecError::RenameSourceNotFound { .. }));
    }

    #[test]
    fn rename_onto_existing_fails() {
        let err = merge(Some(TARGET), "## RENAMED Requirements\nFROM: Login\nTO: Remember Me\n")
            .unwrap_err();
        assert!(matches!(err, SpecError::RenameTargetExists { .. }));
    }

    #[test]
    fn conflicting_plan_is_rejected_before_apply() {
        let err = merge(
            Some(TARGET),
            "## MODIFIED Requirements\n### Requirement: Login\nThe system SHALL x.\n## REMOVED Requirements\n### Requirement: Login\n",
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidDeltaPlan { .. }));
        assert!(err.to_string().contains("MODIFIED and REMOVED"));
    }

    #[test]
    fn unnamed_header_is_rejected_before_apply() {
        let err = merge(
            Some(TARGET),
            "## ADDED Requirements\n### Requirement: \nThe system SHALL x.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b\n",
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::InvalidDeltaPlan { .. }));
        assert!(err.to_string().contains("has no name"));
    }

    #[test]
    fn new_spec_from_additions() {
        let result = merge(
            None,
            "## ADDED Requirements\n### Requirement: Export\nThe system SHALL export CSV.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b\n",
        )
        .unwrap();
        assert!(result.rebuilt.starts_with("# auth Specification\n\n## Purpose\nTBD"));
        assert!(result
            .rebuilt
            .ends_with("## Requirements\n\n### Requirement: Export\nThe system SHALL export CSV.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b\n"));
    }

    #[test]
    fn new_spec_rejects_other_operations() {
        let err = merge(None, "## REMOVED Requirements\n### Requirement: X\n").unwrap_err();
        assert!(matches!(err, SpecError::NewSpecRequiresAdded { .. }));
    }

    #[test]
    fn header_mismatch_in_modified_block() {
        let plan = DeltaPlan {
            modified: vec![RequirementBlock {
                header_line: "### Requirement: Login".to_string(),
                name: "Login".to_string(),
                raw: "### Requirement: Logout\nThe system SHALL x.".to_string(),
            }],
            ..DeltaPlan::default()
        };
        let err = build_updated_spec("auth", Some(TARGET), &plan).unwrap_err();
        assert!(matches!(err, SpecError::HeaderMismatch { .. }));
    }

    #[test]
    fn duplicate_headers_in_target_are_detected() {
        let target = "## Requirements\n\n### Requirement: A\nx SHALL y\n\n### Requirement: a\nx SHALL z\n";
        let err = build_updated_spec("auth", Some(target), &DeltaPlan::default()).unwrap_err();
        assert!(matches!(err, SpecError::DuplicateHeaders { .. }));
    }

    #[test]
    fn target_without_requirements_section_gains_one() {
        let result = merge(
            Some("# Auth\n\n## Purpose\nText\n"),
            "## ADDED Requirements\n### Requirement: A\nThe system SHALL a.\n",
        )
        .unwrap();
        assert_eq!(
            result.rebuilt,
            "# Auth\n\n## Purpose\nText\n\n## Requirements\n\n### Requirement: A\nThe system SHALL a.\n"
        );
    }

    #[test]
    fn counts_accumulate() {
        let mut total = MergeCounts::default();
        total.accumulate(&MergeCounts {
            added: 1,
            modified: 2,
            removed: 0,
            renamed: 1,
        });
        total.accumulate(&MergeCounts {
            added: 1,
            ..MergeCounts::default()
        });
        assert_eq!(total.added, 2);
        assert_eq!(total.total(), 5);
    }
}
