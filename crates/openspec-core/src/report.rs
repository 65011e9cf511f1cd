use crate::types::{ItemType, ValidationLevel};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// ValidationIssue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub level: ValidationLevel,
    /// Dotted/bracketed locator, e.g. `requirements[2].scenarios`.
    pub path: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(level: ValidationLevel, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Error, path, message)
    }

    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Warning, path, message)
    }

    pub fn info(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ValidationLevel::Info, path, message)
    }
}

// ---------------------------------------------------------------------------
// ValidationReport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub errors: usize,
    pub warnings: usize,
    pub info: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
    pub summary: Summary,
}

impl ValidationReport {
    /// Tally `issues` and decide validity: no errors, and in strict mode no
    /// warnings either.
    pub fn from_issues(issues: Vec<ValidationIssue>, strict: bool) -> Self {
        let mut summary = Summary::default();
        for issue in &issues {
            match issue.level {
                ValidationLevel::Error => summary.errors += 1,
                ValidationLevel::Warning => summary.warnings += 1,
                ValidationLevel::Info => summary.info += 1,
            }
        }
        let valid = if strict {
            summary.errors == 0 && summary.warnings == 0
        } else {
            summary.errors == 0
        };
        Self {
            valid,
            issues,
            summary,
        }
    }

    pub fn issues_at(&self, level: ValidationLevel) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |i| i.level == level)
    }
}

// ---------------------------------------------------------------------------
// BulkReport
// ---------------------------------------------------------------------------

pub const BULK_REPORT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkItem {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub valid: bool,
    pub issues: Vec<ValidationIssue>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub items: usize,
    pub passed: usize,
    pub failed: usize,
}

impl Totals {
    fn record(&mut self, valid: bool) {
        self.items += 1;
        if valid {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub totals: Totals,
    pub by_type: BTreeMap<String, Totals>,
}

/// Result of validating many specs and changes in one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkReport {
    pub version: String,
    pub items: Vec<BulkItem>,
    pub summary: BulkSummary,
}

impl Default for BulkReport {
    fn default() -> Self {
        Self {
            version: BULK_REPORT_VERSION.to_string(),
            items: Vec::new(),
            summary: BulkSummary::default(),
        }
    }
}

impl BulkReport {
    pub fn push(&mut self, id: impl Into<String>, item_type: ItemType, report: ValidationReport) {
        self.summary.totals.record(report.valid);
        self.summary
            .by_type
            .entry(item_type.as_str().to_string())
            .or_default()
            .record(report.valid);
        self.items.push(BulkItem {
            id: id.into(),
            item_type,
            valid: report.valid,
            issues: report.issues,
        });
    }

    pub fn all_valid(&self) -> bool {
        self.summary.totals.failed == 0
    }
}
