use crate::document::{Change, Spec};
use crate::report::ValidationIssue;
use crate::types::DeltaOperation;

pub const MIN_PURPOSE_LENGTH: usize = 50;
pub const MAX_REQUIREMENT_TEXT_LENGTH: usize = 500;
pub const MIN_DELTA_DESCRIPTION_LENGTH: usize = 10;

pub const PURPOSE_TOO_BRIEF: &str = "Purpose section is too brief (less than 50 characters)";
pub const REQUIREMENT_TOO_LONG: &str =
    "Requirement text is very long (>500 characters). Consider breaking it down.";
pub const REQUIREMENT_NEEDS_SCENARIOS: &str = "Requirement must have at least one scenario";
pub const DELTA_DESCRIPTION_TOO_BRIEF: &str = "Delta description is too brief";
pub const SCENARIO_NOT_STRUCTURED: &str = "Scenario does not follow Given/When/Then structure";

const GUIDE_SCENARIO_FORMAT: &str = "Scenarios must use level-4 headers. Convert bullet lists into:\n#### Scenario: Short name\n- **WHEN** ...\n- **THEN** ...\n- **AND** ...";

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A named content check producing WARNING or INFO findings.
///
/// Rules never emit ERRORs; structural failures belong to the schema layer.
pub struct Rule<T> {
    pub id: &'static str,
    pub check: fn(&T) -> Vec<ValidationIssue>,
}

pub fn apply<T>(rules: &[Rule<T>], doc: &T) -> Vec<ValidationIssue> {
    rules.iter().flat_map(|rule| (rule.check)(doc)).collect()
}

// ---------------------------------------------------------------------------
// Spec rules
// ---------------------------------------------------------------------------

pub fn spec_rules() -> Vec<Rule<Spec>> {
    vec![
        Rule {
            id: "purpose_too_brief",
            check: |spec| {
                if spec.overview.chars().count() < MIN_PURPOSE_LENGTH {
                    vec![ValidationIssue::warning("overview", PURPOSE_TOO_BRIEF)]
                } else {
                    vec![]
                }
            },
        },
        Rule {
            id: "requirement_too_long",
            check: |spec| {
                spec.requirements
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.text.chars().count() > MAX_REQUIREMENT_TEXT_LENGTH)
                    .map(|(i, _)| {
                        ValidationIssue::info(format!("requirements[{i}]"), REQUIREMENT_TOO_LONG)
                    })
                    .collect()
            },
        },
        Rule {
            id: "requirement_without_scenarios",
            check: |spec| {
                spec.requirements
                    .iter()
                    .enumerate()
                    .filter(|(_, r)| r.scenarios.is_empty())
                    .map(|(i, _)| {
                        ValidationIssue::warning(
                            format!("requirements[{i}].scenarios"),
                            format!("{REQUIREMENT_NEEDS_SCENARIOS}. {GUIDE_SCENARIO_FORMAT}"),
                        )
                    })
                    .collect()
            },
        },
        Rule {
            id: "scenario_structure",
            check: |spec| {
                let mut out = Vec::new();
                for (i, req) in spec.requirements.iter().enumerate() {
                    for (j, scenario) in req.scenarios.iter().enumerate() {
                        if !scenario.raw_text.trim().is_empty()
                            && !scenario.follows_given_when_then()
                        {
                            out.push(ValidationIssue::info(
                                format!("requirements[{i}].scenarios[{j}]"),
                                SCENARIO_NOT_STRUCTURED,
                            ));
                        }
                    }
                }
                out
            },
        },
    ]
}

// ---------------------------------------------------------------------------
// Change rules
// ---------------------------------------------------------------------------

pub fn change_rules() -> Vec<Rule<Change>> {
    vec![
        Rule {
            id: "delta_description_too_brief",
            check: |change| {
                change
                    .deltas
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        let len = d.description.trim().chars().count();
                        len > 0 && len < MIN_DELTA_DESCRIPTION_LENGTH
                    })
                    .map(|(i, _)| {
                        ValidationIssue::warning(
                            format!("deltas[{i}].description"),
                            DELTA_DESCRIPTION_TOO_BRIEF,
                        )
                    })
                    .collect()
            },
        },
        Rule {
            id: "delta_missing_requirements",
            check: |change| {
                change
                    .deltas
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        matches!(d.operation, DeltaOperation::Added | DeltaOperation::Modified)
                            && d.requirements.as_deref().unwrap_or_default().is_empty()
                    })
                    .map(|(i, d)| {
                        ValidationIssue::warning(
                            format!("deltas[{i}].requirements"),
                            format!("{} delta should include requirements", d.operation),
                        )
                    })
                    .collect()
            },
        },
    ]
}
