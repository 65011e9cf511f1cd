//! Declarative shape checks over parsed documents.
//!
//! Every failure is an ERROR, except the stylistic upper bound on deltas per
//! change, which is reported as a WARNING.

use crate::document::{Change, Delta, Requirement, Spec};
use crate::report::ValidationIssue;

pub const MIN_WHY_LENGTH: usize = 50;
pub const MAX_WHY_LENGTH: usize = 1000;
pub const MAX_DELTAS_PER_CHANGE: usize = 10;

pub const SCENARIO_EMPTY: &str = "Scenario text cannot be empty";
pub const REQUIREMENT_EMPTY: &str = "Requirement text cannot be empty";
pub const REQUIREMENT_NO_SHALL: &str = "Requirement must contain SHALL or MUST keyword";
pub const REQUIREMENT_NO_SCENARIOS: &str = "Requirement must have at least one scenario";
pub const SPEC_NAME_EMPTY: &str = "Spec name cannot be empty";
pub const SPEC_PURPOSE_EMPTY: &str = "Purpose section cannot be empty";
pub const SPEC_NO_REQUIREMENTS: &str = "Spec must have at least one requirement";
pub const CHANGE_NAME_EMPTY: &str = "Change name cannot be empty";
pub const CHANGE_WHAT_EMPTY: &str = "What Changes section cannot be empty";
pub const CHANGE_NO_DELTAS: &str = "Change must have at least one delta";
pub const DELTA_DESCRIPTION_EMPTY: &str = "Delta description cannot be empty";

/// True when `text` contains the normative keyword `SHALL` or `MUST`
/// (case-sensitive).
pub fn has_normative_keyword(text: &str) -> bool {
    text.contains("SHALL") || text.contains("MUST")
}

pub fn validate_spec(spec: &Spec) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if spec.name.trim().is_empty() {
        issues.push(ValidationIssue::error("name", SPEC_NAME_EMPTY));
    }
    if spec.overview.trim().is_empty() {
        issues.push(ValidationIssue::error("overview", SPEC_PURPOSE_EMPTY));
    }
    if spec.requirements.is_empty() {
        issues.push(ValidationIssue::error("requirements", SPEC_NO_REQUIREMENTS));
    }
    for (i, req) in spec.requirements.iter().enumerate() {
        validate_requirement(req, &format!("requirements[{i}]"), &mut issues);
    }
    issues
}

fn validate_requirement(req: &Requirement, path: &str, issues: &mut Vec<ValidationIssue>) {
    if req.text.trim().is_empty() {
        issues.push(ValidationIssue::error(format!("{path}.text"), REQUIREMENT_EMPTY));
    } else if !has_normative_keyword(&req.text) {
        issues.push(ValidationIssue::error(
            format!("{path}.text"),
            REQUIREMENT_NO_SHALL,
        ));
    }
    if req.scenarios.is_empty() {
        issues.push(ValidationIssue::error(
            format!("{path}.scenarios"),
            REQUIREMENT_NO_SCENARIOS,
        ));
    }
    for (j, scenario) in req.scenarios.iter().enumerate() {
        if scenario.raw_text.trim().is_empty() {
            issues.push(ValidationIssue::error(
                format!("{path}.scenarios[{j}].rawText"),
                SCENARIO_EMPTY,
            ));
        }
    }
}

pub fn validate_change(change: &Change) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if change.name.trim().is_empty() {
        issues.push(ValidationIssue::error("name", CHANGE_NAME_EMPTY));
    }

    let why_len = change.why.chars().count();
    if why_len < MIN_WHY_LENGTH {
        issues.push(ValidationIssue::error(
            "why",
            format!("Why section must be at least {MIN_WHY_LENGTH} characters"),
        ));
    } else if why_len > MAX_WHY_LENGTH {
        issues.push(ValidationIssue::error(
            "why",
            format!("Why section should not exceed {MAX_WHY_LENGTH} characters"),
        ));
    }

    if change.what_changes.trim().is_empty() {
        issues.push(ValidationIssue::error("whatChanges", CHANGE_WHAT_EMPTY));
    }

    if change.deltas.is_empty() {
        issues.push(ValidationIssue::error("deltas", CHANGE_NO_DELTAS));
    } else if change.deltas.len() > MAX_DELTAS_PER_CHANGE {
        issues.push(ValidationIssue::warning(
            "deltas",
            format!("Consider splitting changes with more than {MAX_DELTAS_PER_CHANGE} deltas"),
        ));
    }

    for (i, delta) in change.deltas.iter().enumerate() {
        validate_delta(delta, &format!("deltas[{i}]"), &mut issues);
    }
    issues
}

fn validate_delta(delta: &Delta, path: &str, issues: &mut Vec<ValidationIssue>) {
    if delta.spec.trim().is_empty() {
        issues.push(ValidationIssue::error(format!("{path}.spec"), SPEC_NAME_EMPTY));
    }
    if delta.description.trim().is_empty() {
        issues.push(ValidationIssue::error(
            format!("{path}.description"),
            DELTA_DESCRIPTION_EMPTY,
        ));
    }
    if let Some(reqs) = &delta.requirements {
        for (j, req) in reqs.iter().enumerate() {
            validate_requirement(req, &format!("{path}.requirements[{j}]"), issues);
        }
    }
}
