//! Validation façade: parse, run schema checks, then content rules.
//!
//! Parsing failures never escape as errors; they become a single ERROR issue
//! at path `file`, enriched with guidance on the expected layout.

use crate::document::{Change, Spec};
use crate::error::SpecError;
use crate::markdown::{
    self, CHANGE_MISSING_WHAT, CHANGE_MISSING_WHY, SPEC_MISSING_PURPOSE,
    SPEC_MISSING_REQUIREMENTS,
};
use crate::report::{ValidationIssue, ValidationReport};
use crate::requirement_blocks::{parse_delta_spec, DeltaFile};
use crate::rules;
use crate::schema::{self, has_normative_keyword, CHANGE_NO_DELTAS};
use tracing::debug;

const GUIDE_MISSING_SPEC_SECTIONS: &str = "Missing required sections. Expected headers: \"## Purpose\" and \"## Requirements\". Example:\n## Purpose\n[brief purpose]\n\n## Requirements\n### Requirement: Clear requirement statement\nUsers SHALL ...\n\n#### Scenario: Descriptive name\n- **WHEN** ...\n- **THEN** ...";

const GUIDE_MISSING_CHANGE_SECTIONS: &str = "Missing required sections. Expected headers: \"## Why\" and \"## What Changes\". Ensure deltas are documented in specs/ using delta headers.";

const GUIDE_NO_DELTAS: &str = "No deltas found. Ensure your change has a specs/ directory with capability folders (e.g. specs/http-server/spec.md) containing .md files that use delta headers (## ADDED/MODIFIED/REMOVED/RENAMED Requirements) and that each requirement includes at least one \"#### Scenario:\" block.";

/// File-level locator used for parse failures and whole-change findings.
pub const FILE_PATH: &str = "file";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidateOptions {
    /// Treat warnings as failures.
    pub strict: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    pub fn new(options: ValidateOptions) -> Self {
        Self {
            strict: options.strict,
        }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse and validate spec markdown.
    pub fn validate_spec(&self, name: &str, content: &str) -> ValidationReport {
        match markdown::parse_spec(name, content) {
            Ok(spec) => self.validate_spec_document(&spec),
            Err(e) => self.parse_failure(name, e),
        }
    }

    pub fn validate_spec_document(&self, spec: &Spec) -> ValidationReport {
        let mut issues = schema::validate_spec(spec);
        issues.extend(rules::apply(&rules::spec_rules(), spec));
        self.finish(&spec.name, issues)
    }

    /// Parse and validate a change proposal. When the change carries delta
    /// files, its deltas come from them and the delta-plan checks run too.
    pub fn validate_change(
        &self,
        name: &str,
        proposal: &str,
        delta_files: &[DeltaFile],
    ) -> ValidationReport {
        let change = match markdown::parse_change_with_deltas(name, proposal, delta_files) {
            Ok(change) => change,
            Err(e) => return self.parse_failure(name, e),
        };
        let mut issues = self.change_document_issues(&change);
        if !delta_files.is_empty() {
            // Requirement blocks from delta files are checked by the delta-plan pass.
            issues.retain(|i| !i.path.contains(".requirements["));
            issues.extend(delta_plan_issues(delta_files));
        }
        self.finish(name, issues)
    }

    pub fn validate_change_document(&self, change: &Change) -> ValidationReport {
        let issues = self.change_document_issues(change);
        self.finish(&change.name, issues)
    }

    /// Validate only the per-capability delta files of a change.
    pub fn validate_change_delta_specs(&self, delta_files: &[DeltaFile]) -> ValidationReport {
        self.finish("delta specs", delta_plan_issues(delta_files))
    }

    fn change_document_issues(&self, change: &Change) -> Vec<ValidationIssue> {
        let mut issues = schema::validate_change(change);
        issues.extend(rules::apply(&rules::change_rules(), change));
        issues
    }

    fn parse_failure(&self, name: &str, err: SpecError) -> ValidationReport {
        debug!(item = name, error = %err, "parse failed");
        let issue = ValidationIssue::error(FILE_PATH, enrich_parse_error(&err));
        ValidationReport::from_issues(vec![issue], self.strict)
    }

    fn finish(&self, name: &str, issues: Vec<ValidationIssue>) -> ValidationReport {
        let report = ValidationReport::from_issues(issues, self.strict);
        debug!(
            item = name,
            valid = report.valid,
            errors = report.summary.errors,
            warnings = report.summary.warnings,
            "validated"
        );
        report
    }
}

fn enrich_parse_error(err: &SpecError) -> String {
    match err {
        SpecError::MissingSection(msg)
            if *msg == SPEC_MISSING_PURPOSE || *msg == SPEC_MISSING_REQUIREMENTS =>
        {
            format!("{msg}. {GUIDE_MISSING_SPEC_SECTIONS}")
        }
        SpecError::MissingSection(msg)
            if *msg == CHANGE_MISSING_WHY || *msg == CHANGE_MISSING_WHAT =>
        {
            format!("{msg}. {GUIDE_MISSING_CHANGE_SECTIONS}")
        }
        other => other.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Delta-plan checks
// ---------------------------------------------------------------------------

/// Structural checks over a change's delta files. All findings are ERRORs,
/// located at `specs/<capability>/spec.md`.
pub fn delta_plan_issues(delta_files: &[DeltaFile]) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    let mut total_operations = 0;

    for file in delta_files {
        let plan = parse_delta_spec(&file.content);
        total_operations += plan.operation_count();
        let path = file.display_path();

        for conflict in plan.conflicts() {
            issues.push(ValidationIssue::error(&path, conflict));
        }
        for (label, blocks) in [("ADDED", &plan.added), ("MODIFIED", &plan.modified)] {
            for block in blocks {
                if !has_normative_keyword(&block.requirement_text()) {
                    issues.push(ValidationIssue::error(
                        &path,
                        format!("{label} \"{}\" must contain SHALL or MUST", block.name),
                    ));
                }
                if block.scenario_count() == 0 {
                    issues.push(ValidationIssue::error(
                        &path,
                        format!(
                            "{label} \"{}\" must include at least one scenario",
                            block.name
                        ),
                    ));
                }
            }
        }
        for entry in &plan.unpaired_renames {
            issues.push(ValidationIssue::error(
                &path,
                format!("RENAMED entry is missing its pair: {entry}"),
            ));
        }
    }

    if total_operations == 0 {
        issues.push(ValidationIssue::error(
            FILE_PATH,
            format!("{CHANGE_NO_DELTAS}. {GUIDE_NO_DELTAS}"),
        ));
    }
    issues
}
