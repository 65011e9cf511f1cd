//! Typed document model produced by the markdown parser.
//!
//! All values are immutable snapshots built fresh per parse. Field names
//! serialize in camelCase to match the JSON shape consumed by `--json`.

use crate::types::DeltaOperation;
use serde::{Deserialize, Serialize};

pub const SPEC_FORMAT: &str = "openspec";
pub const CHANGE_FORMAT: &str = "openspec-change";
pub const DOCUMENT_VERSION: &str = "1.0.0";

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub version: String,
    pub format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_path: Option<String>,
}

impl Metadata {
    pub fn spec() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            format: SPEC_FORMAT.to_string(),
            source_path: None,
        }
    }

    pub fn change() -> Self {
        Self {
            version: DOCUMENT_VERSION.to_string(),
            format: CHANGE_FORMAT.to_string(),
            source_path: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Scenario
// ---------------------------------------------------------------------------

/// One example illustrating a requirement.
///
/// `raw_text` is kept verbatim so merges stay faithful to author formatting;
/// `given`/`when`/`then` are a best-effort structured view of the same text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub raw_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub then: Option<String>,
}

#[derive(Clone, Copy)]
enum Clause {
    Given,
    When,
    Then,
}

impl Scenario {
    pub fn from_raw(name: Option<String>, raw_text: impl Into<String>) -> Self {
        let raw_text = raw_text.into();
        let mut scenario = Self {
            name,
            raw_text,
            given: None,
            when: None,
            then: None,
        };
        scenario.parse_clauses();
        scenario
    }

    /// True when the scenario has at least a WHEN and a THEN clause.
    pub fn follows_given_when_then(&self) -> bool {
        self.when.is_some() && self.then.is_some()
    }

    fn parse_clauses(&mut self) {
        let raw = std::mem::take(&mut self.raw_text);
        let mut last: Option<Clause> = None;
        for line in raw.lines() {
            let Some((keyword, rest)) = split_keyword(line) else {
                continue;
            };
            let clause = match keyword.as_str() {
                "GIVEN" => Clause::Given,
                "WHEN" => Clause::When,
                "THEN" => Clause::Then,
                "AND" => match last {
                    Some(c) => {
                        self.append(c, rest);
                        continue;
                    }
                    None => continue,
                },
                _ => continue,
            };
            self.append(clause, rest);
            last = Some(clause);
        }
        self.raw_text = raw;
    }

    fn append(&mut self, clause: Clause, text: &str) {
        let slot = match clause {
            Clause::Given => &mut self.given,
            Clause::When => &mut self.when,
            Clause::Then => &mut self.then,
        };
        match slot {
            Some(existing) => {
                existing.push_str(" and ");
                existing.push_str(text);
            }
            None => *slot = Some(text.to_string()),
        }
    }
}

/// Split `- **WHEN** the user logs in` into `("WHEN", "the user logs in")`.
fn split_keyword(line: &str) -> Option<(String, &str)> {
    let stripped = line.trim().trim_start_matches(['-', '*', ' ']);
    let end = stripped
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(stripped.len());
    if end == 0 {
        return None;
    }
    let keyword = stripped[..end].to_ascii_uppercase();
    if !matches!(keyword.as_str(), "GIVEN" | "WHEN" | "THEN" | "AND") {
        return None;
    }
    let rest = stripped[end..].trim_start_matches(['*', ':', ' ']).trim();
    if rest.is_empty() {
        return None;
    }
    Some((keyword, rest))
}

// ---------------------------------------------------------------------------
// Requirement / Spec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    /// Name from a `### Requirement: <name>` heading, if that dialect is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub text: String,
    pub scenarios: Vec<Scenario>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Spec {
    pub name: String,
    pub overview: String,
    pub requirements: Vec<Requirement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

// ---------------------------------------------------------------------------
// Change / Delta
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delta {
    pub spec: String,
    pub operation: DeltaOperation,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<Requirement>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Change {
    pub name: String,
    pub why: String,
    pub what_changes: String,
    pub deltas: Vec<Delta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}
