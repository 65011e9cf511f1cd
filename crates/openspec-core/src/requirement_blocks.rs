//! Requirement-block parser for the delta dialect.
//!
//! A change carries one delta file per capability under
//! `specs/<capability>/spec.md`. Each file holds any subset of:
//!
//! ```text
//! ## ADDED Requirements      ### Requirement: <name> blocks with #### Scenario: children
//! ## MODIFIED Requirements   same shape, replaces the existing block wholesale
//! ## REMOVED Requirements    ### Requirement: <name> headers (or bullets quoting one)
//! ## RENAMED Requirements    - FROM: `### Requirement: <old>`
//!                            - TO: `### Requirement: <new>`
//! ```
//!
//! The parser is lenient: anything that does not match is skipped. Structural
//! problems are reported by the validator, not here.

use crate::document::{Requirement, Scenario};
use crate::markdown::{first_paragraph, heading_prefix_re, parse_sections};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

pub const REQUIREMENT_HEADER_PREFIX: &str = "### Requirement:";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Raw contents of one capability delta file, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeltaFile {
    pub capability: String,
    pub content: String,
}

impl DeltaFile {
    pub fn new(capability: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            capability: capability.into(),
            content: content.into(),
        }
    }

    /// Locator used in validation issues, relative to the change directory.
    pub fn display_path(&self) -> String {
        format!("specs/{}/spec.md", self.capability)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequirementBlock {
    pub header_line: String,
    pub name: String,
    /// Verbatim block text including the header and nested scenarios.
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenamePair {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeltaPlan {
    pub added: Vec<RequirementBlock>,
    pub modified: Vec<RequirementBlock>,
    pub removed: Vec<String>,
    pub renamed: Vec<RenamePair>,
    /// `FROM:`/`TO:` lines that could not be paired. Dropped from `renamed`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unpaired_renames: Vec<String>,
}

/// An existing spec split around its `## Requirements` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequirementsSectionParts {
    /// Everything before the requirements header, newline-terminated.
    pub before: String,
    pub header_line: String,
    /// Text between the header and the first requirement block.
    pub preamble: String,
    pub body_blocks: Vec<RequirementBlock>,
    /// Everything from the next `##`-or-shallower heading to the end.
    pub after: String,
}

// ---------------------------------------------------------------------------
// Regexes
// ---------------------------------------------------------------------------

static DELTA_SECTION_RE: OnceLock<Regex> = OnceLock::new();
static SHALLOW_HEADING_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_END_RE: OnceLock<Regex> = OnceLock::new();
static REQUIREMENT_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static REMOVED_LINE_RE: OnceLock<Regex> = OnceLock::new();
static RENAME_LINE_RE: OnceLock<Regex> = OnceLock::new();
static REQUIREMENTS_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static SCENARIO_HEADER_RE: OnceLock<Regex> = OnceLock::new();

fn delta_section_re() -> &'static Regex {
    DELTA_SECTION_RE.get_or_init(|| {
        Regex::new(r"(?i)^##\s+(ADDED|MODIFIED|REMOVED|RENAMED)\s+Requirements\s*$").unwrap()
    })
}

fn shallow_heading_re() -> &'static Regex {
    SHALLOW_HEADING_RE.get_or_init(|| Regex::new(r"^#{1,2}\s").unwrap())
}

fn block_end_re() -> &'static Regex {
    BLOCK_END_RE.get_or_init(|| Regex::new(r"^#{1,3}\s").unwrap())
}

fn requirement_header_re() -> &'static Regex {
    REQUIREMENT_HEADER_RE
        .get_or_init(|| Regex::new(r"^###\s*Requirement:\s*(.+?)\s*$").unwrap())
}

fn removed_line_re() -> &'static Regex {
    REMOVED_LINE_RE.get_or_init(|| {
        Regex::new(r"^\s*(?:[-*]\s+)?`?###\s*Requirement:\s*(.+?)`?\s*$").unwrap()
    })
}

fn rename_line_re() -> &'static Regex {
    RENAME_LINE_RE
        .get_or_init(|| Regex::new(r"(?i)^\s*(?:[-*]\s+)?(FROM|TO):\s*(.+?)\s*$").unwrap())
}

fn requirements_header_re() -> &'static Regex {
    REQUIREMENTS_HEADER_RE.get_or_init(|| Regex::new(r"(?i)^##\s+Requirements\s*$").unwrap())
}

fn scenario_header_re() -> &'static Regex {
    SCENARIO_HEADER_RE.get_or_init(|| Regex::new(r"^####\s+").unwrap())
}

fn split_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

// ---------------------------------------------------------------------------
// Name normalization
// ---------------------------------------------------------------------------

/// Canonical identity for requirement names: lower-cased, whitespace collapsed.
pub fn normalize_requirement_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

// ---------------------------------------------------------------------------
// RequirementBlock
// ---------------------------------------------------------------------------

impl RequirementBlock {
    pub fn new(name: &str, body: &str) -> Self {
        let header_line = format!("{REQUIREMENT_HEADER_PREFIX} {}", name.trim());
        let body = body.trim_end();
        let raw = if body.is_empty() {
            header_line.clone()
        } else {
            format!("{header_line}\n{body}")
        };
        Self {
            header_line,
            name: name.trim().to_string(),
            raw,
        }
    }

    pub fn key(&self) -> String {
        normalize_requirement_name(&self.name)
    }

    /// Copy of this block with its header rewritten to `new_name`.
    pub fn renamed(&self, new_name: &str) -> Self {
        let header_line = format!("{REQUIREMENT_HEADER_PREFIX} {}", new_name.trim());
        let rest = self.raw.split_once('\n').map(|(_, rest)| rest);
        let raw = match rest {
            Some(rest) => format!("{header_line}\n{rest}"),
            None => header_line.clone(),
        };
        Self {
            header_line,
            name: new_name.trim().to_string(),
            raw,
        }
    }

    fn body_lines(&self) -> impl Iterator<Item = &str> {
        self.raw.lines().skip(1)
    }

    /// Statement text: the first paragraph before any nested heading,
    /// falling back to the requirement name.
    pub fn requirement_text(&self) -> String {
        let lead: Vec<&str> = self
            .body_lines()
            .take_while(|l| !heading_prefix_re().is_match(l.trim_start()))
            .collect();
        first_paragraph(&lead.join("\n")).unwrap_or_else(|| self.name.clone())
    }

    /// Number of `####` sub-headings (scenarios) nested in the block.
    pub fn scenario_count(&self) -> usize {
        self.body_lines()
            .filter(|l| scenario_header_re().is_match(l))
            .count()
    }

    /// Typed view of the block for the document model.
    pub fn to_requirement(&self) -> Requirement {
        let sections = parse_sections(&self.raw);
        let scenarios = sections
            .first()
            .map(|s| {
                s.children
                    .iter()
                    .filter(|c| !c.content.trim().is_empty())
                    .map(|c| {
                        let name = c
                            .title
                            .strip_prefix("Scenario:")
                            .unwrap_or(&c.title)
                            .trim()
                            .to_string();
                        Scenario::from_raw(Some(name), c.content.clone())
                    })
                    .collect()
            })
            .unwrap_or_default();
        Requirement {
            name: Some(self.name.clone()),
            text: self.requirement_text(),
            scenarios,
        }
    }
}

// ---------------------------------------------------------------------------
// DeltaPlan
// ---------------------------------------------------------------------------

impl DeltaPlan {
    pub fn operation_count(&self) -> usize {
        self.added.len() + self.modified.len() + self.removed.len() + self.renamed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operation_count() == 0
    }

    pub fn has_only_additions(&self) -> bool {
        self.modified.is_empty() && self.removed.is_empty() && self.renamed.is_empty()
    }

    /// Unnamed headers, duplicates and cross-section conflicts, one message
    /// per offending name.
    pub fn conflicts(&self) -> Vec<String> {
        let mut out = Vec::new();

        let named = [
            ("ADDED", self.added.iter().map(|b| b.name.as_str()).collect::<Vec<_>>()),
            ("MODIFIED", self.modified.iter().map(|b| b.name.as_str()).collect()),
            ("REMOVED", self.removed.iter().map(String::as_str).collect()),
            ("RENAMED FROM", self.renamed.iter().map(|p| p.from.as_str()).collect()),
            ("RENAMED TO", self.renamed.iter().map(|p| p.to.as_str()).collect()),
        ];
        for (section, names) in &named {
            let empty = names.iter().filter(|n| n.trim().is_empty()).count();
            if empty > 0 {
                out.push(format!(
                    "Requirement header in {section} has no name ({empty} occurrence(s))"
                ));
            }
        }

        let added = duplicates(
            self.added.iter().map(|b| b.name.as_str()),
            "ADDED",
            &mut out,
        );
        duplicates(
            self.modified.iter().map(|b| b.name.as_str()),
            "MODIFIED",
            &mut out,
        );
        let removed = duplicates(self.removed.iter().map(String::as_str), "REMOVED", &mut out);
        let renamed_from = duplicates(
            self.renamed.iter().map(|p| p.from.as_str()),
            "RENAMED FROM",
            &mut out,
        );
        let renamed_to = duplicates(
            self.renamed.iter().map(|p| p.to.as_str()),
            "RENAMED TO",
            &mut out,
        );

        for block in &self.modified {
            let key = block.key();
            if removed.contains(&key) {
                out.push(format!(
                    "Requirement present in both MODIFIED and REMOVED: \"{}\"",
                    block.name
                ));
            }
            if added.contains(&key) {
                out.push(format!(
                    "Requirement present in both MODIFIED and ADDED: \"{}\"",
                    block.name
                ));
            }
            if renamed_from.contains(&key) {
                out.push(format!(
                    "MODIFIED references old name from RENAMED; use the new header instead of \"{}\"",
                    block.name
                ));
            }
        }
        for block in &self.added {
            let key = block.key();
            if removed.contains(&key) {
                out.push(format!(
                    "Requirement present in both ADDED and REMOVED: \"{}\"",
                    block.name
                ));
            }
            if renamed_to.contains(&key) {
                out.push(format!(
                    "RENAMED TO collides with ADDED for \"{}\"",
                    block.name
                ));
            }
        }
        out
    }
}

/// Record duplicate names in `out`; return the set of normalized names.
fn duplicates<'a>(
    names: impl Iterator<Item = &'a str>,
    section: &str,
    out: &mut Vec<String>,
) -> HashSet<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for name in names {
        let key = normalize_requirement_name(name);
        if !seen.insert(key.clone()) && reported.insert(key) {
            out.push(format!("Duplicate requirement in {section}: \"{name}\""));
        }
    }
    seen
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DeltaSection {
    Added,
    Modified,
    Removed,
    Renamed,
}

/// Parse a capability delta file into a [`DeltaPlan`].
pub fn parse_delta_spec(content: &str) -> DeltaPlan {
    let lines = split_lines(content);
    let mut plan = DeltaPlan::default();
    let mut current: Option<DeltaSection> = None;
    let mut buffer: Vec<&str> = Vec::new();

    for line in lines {
        if shallow_heading_re().is_match(line) {
            if let Some(section) = current.take() {
                apply_section(&mut plan, section, &buffer);
            }
            buffer.clear();
            current = delta_section_re().captures(line.trim_end()).map(|caps| {
                match caps[1].to_ascii_uppercase().as_str() {
                    "ADDED" => DeltaSection::Added,
                    "MODIFIED" => DeltaSection::Modified,
                    "REMOVED" => DeltaSection::Removed,
                    _ => DeltaSection::Renamed,
                }
            });
            continue;
        }
        if current.is_some() {
            buffer.push(line);
        }
    }
    if let Some(section) = current {
        apply_section(&mut plan, section, &buffer);
    }
    plan
}

fn apply_section(plan: &mut DeltaPlan, section: DeltaSection, lines: &[&str]) {
    match section {
        DeltaSection::Added => plan.added.extend(split_blocks(lines, false).1),
        DeltaSection::Modified => plan.modified.extend(split_blocks(lines, false).1),
        DeltaSection::Removed => plan.removed.extend(
            lines
                .iter()
                .filter_map(|l| removed_line_re().captures(l))
                .map(|caps| caps[1].trim().to_string()),
        ),
        DeltaSection::Renamed => parse_renames(plan, lines),
    }
}

/// Split section lines into a preamble and requirement blocks.
///
/// A block runs until the next `###`-or-shallower heading. With
/// `keep_orphans`, text after a non-requirement `###` heading stays attached
/// to the preceding block (or the preamble) so no content is lost when a
/// target document is recomposed; otherwise it is skipped.
fn split_blocks(lines: &[&str], keep_orphans: bool) -> (Vec<String>, Vec<RequirementBlock>) {
    let mut preamble: Vec<String> = Vec::new();
    let mut blocks: Vec<RequirementBlock> = Vec::new();
    let mut current: Option<PendingBlock<'_>> = None;
    let mut orphaned = false;

    for &line in lines {
        if let Some(caps) = requirement_header_re().captures(line) {
            finish_block(&mut current, &mut blocks);
            orphaned = false;
            current = Some(PendingBlock {
                header_line: line.trim_end().to_string(),
                name: caps[1].trim().to_string(),
                lines: vec![line],
            });
            continue;
        }
        if block_end_re().is_match(line) && !keep_orphans {
            finish_block(&mut current, &mut blocks);
            orphaned = true;
            continue;
        }
        match current.as_mut() {
            Some(pending) => pending.lines.push(line),
            None if !orphaned => preamble.push(line.to_string()),
            None => {}
        }
    }
    finish_block(&mut current, &mut blocks);
    (preamble, blocks)
}

struct PendingBlock<'a> {
    header_line: String,
    name: String,
    lines: Vec<&'a str>,
}

fn finish_block(current: &mut Option<PendingBlock<'_>>, blocks: &mut Vec<RequirementBlock>) {
    if let Some(pending) = current.take() {
        blocks.push(RequirementBlock {
            header_line: pending.header_line,
            name: pending.name,
            raw: pending.lines.join("\n").trim_end().to_string(),
        });
    }
}

fn parse_renames(plan: &mut DeltaPlan, lines: &[&str]) {
    let mut pending: Option<String> = None;
    for line in lines {
        let Some(caps) = rename_line_re().captures(line) else {
            continue;
        };
        let name = rename_target_name(&caps[2]);
        if caps[1].eq_ignore_ascii_case("FROM") {
            if let Some(dangling) = pending.replace(name) {
                plan.unpaired_renames.push(format!("FROM: {dangling}"));
            }
        } else {
            match pending.take() {
                Some(from) => plan.renamed.push(RenamePair { from, to: name }),
                None => plan.unpaired_renames.push(format!("TO: {name}")),
            }
        }
    }
    if let Some(dangling) = pending {
        plan.unpaired_renames.push(format!("FROM: {dangling}"));
    }
}

/// Accept `` `### Requirement: Name` ``, `### Requirement: Name` or a bare name.
fn rename_target_name(value: &str) -> String {
    let unquoted = value.trim().trim_matches('`').trim();
    match requirement_header_re().captures(unquoted) {
        Some(caps) => caps[1].trim().to_string(),
        None => unquoted.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Target document decomposition
// ---------------------------------------------------------------------------

/// Split an existing spec into the parts around its `## Requirements`
/// section. A document without one gets an empty section appended.
pub fn extract_requirements_section(content: &str) -> RequirementsSectionParts {
    let lines = split_lines(content);
    let Some(header_idx) = lines
        .iter()
        .position(|l| requirements_header_re().is_match(l.trim_end()))
    else {
        let trimmed = content.trim_end();
        return RequirementsSectionParts {
            before: if trimmed.is_empty() {
                String::new()
            } else {
                format!("{trimmed}\n\n")
            },
            header_line: "## Requirements".to_string(),
            preamble: String::new(),
            body_blocks: Vec::new(),
            after: String::new(),
        };
    };

    let end = lines[header_idx + 1..]
        .iter()
        .position(|l| shallow_heading_re().is_match(l))
        .map(|offset| header_idx + 1 + offset)
        .unwrap_or(lines.len());

    let (preamble, body_blocks) = split_blocks(&lines[header_idx + 1..end], true);
    let before = if header_idx == 0 {
        String::new()
    } else {
        format!("{}\n", lines[..header_idx].join("\n"))
    };

    RequirementsSectionParts {
        before,
        header_line: lines[header_idx].trim_end().to_string(),
        preamble: trim_blank_lines(&preamble.join("\n")),
        body_blocks,
        after: lines[end..].join("\n"),
    }
}

fn trim_blank_lines(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.iter().position(|l| !l.trim().is_empty());
    let end = lines.iter().rposition(|l| !l.trim().is_empty());
    match (start, end) {
        (Some(s), Some(e)) => lines[s..=e].join("\n"),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELTA: &str = "# Delta for auth\n\n## ADDED Requirements\n\n### Requirement: Logout\nThe system SHALL end the session on logout.\n\n#### Scenario: Click logout\n- **WHEN** the user clicks logout\n- **THEN** the session ends\n\n### Requirement: Audit Log\nThe system MUST record logins.\n\n## MODIFIED Requirements\n\n### Requirement: Login\nThe system SHALL lock accounts after 5 failures.\n\n#### Scenario: Lockout\n- **WHEN** 5 failures occur\n- **THEN** the account locks\n\n## REMOVED Requirements\n\n### Requirement: Remember Me\n**Reason**: unused\n\n- `### Requirement: Legacy SSO`\n\n## RENAMED Requirements\n\n- FROM: `### Requirement: Session Timeout`\n- TO: `### Requirement: Idle Timeout`\n";

    #[test]
    fn normalize_collapses_case_and_whitespace() {
        assert_eq!(normalize_requirement_name("  User   Login "), "user login");
        assert_eq!(
            normalize_requirement_name("user login"),
            normalize_requirement_name("USER\tLOGIN")
        );
    }

    #[test]
    fn parses_all_four_sections() {
        let plan = parse_delta_spec(DELTA);
        assert_eq!(plan.added.len(), 2);
        assert_eq!(plan.added[0].name, "Logout");
        assert_eq!(plan.added[0].header_line, "### Requirement: Logout");
        assert!(plan.added[0].raw.contains("#### Scenario: Click logout"));
        assert!(plan.added[0].raw.ends_with("the session ends"));
        assert_eq!(plan.added[1].name, "Audit Log");

        assert_eq!(plan.modified.len(), 1);
        assert_eq!(plan.modified[0].name, "Login");

        assert_eq!(plan.removed, vec!["Remember Me", "Legacy SSO"]);

        assert_eq!(
            plan.renamed,
            vec![RenamePair {
                from: "Session Timeout".to_string(),
                to: "Idle Timeout".to_string(),
            }]
        );
        assert!(plan.unpaired_renames.is_empty());
        assert_eq!(plan.operation_count(), 6);
    }

    #[test]
    fn section_headers_are_case_insensitive() {
        let plan = parse_delta_spec("## added requirements\n### Requirement: A\nx SHALL y\n");
        assert_eq!(plan.added.len(), 1);
    }

    #[test]
    fn block_stops_at_non_requirement_heading() {
        let plan = parse_delta_spec(
            "## ADDED Requirements\n### Requirement: A\nbody\n### Notes\nstray text\n### Requirement: B\nbody b\n",
        );
        assert_eq!(plan.added.len(), 2);
        assert_eq!(plan.added[0].raw, "### Requirement: A\nbody");
        assert!(!plan.added[1].raw.contains("stray"));
    }

    #[test]
    fn text_outside_delta_sections_is_ignored() {
        let plan = parse_delta_spec(
            "## Purpose\n### Requirement: Not a delta\n## ADDED Requirements\n### Requirement: A\n",
        );
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].name, "A");
    }

    #[test]
    fn bare_rename_names_and_dangling_from() {
        let plan = parse_delta_spec(
            "## RENAMED Requirements\nFROM: Old Name\nTO: New Name\n- FROM: `### Requirement: Orphan`\n",
        );
        assert_eq!(plan.renamed.len(), 1);
        assert_eq!(plan.renamed[0].from, "Old Name");
        assert_eq!(plan.renamed[0].to, "New Name");
        assert_eq!(plan.unpaired_renames, vec!["FROM: Orphan"]);
    }

    #[test]
    fn block_helpers() {
        let plan = parse_delta_spec(DELTA);
        let logout = &plan.added[0];
        assert_eq!(
            logout.requirement_text(),
            "The system SHALL end the session on logout."
        );
        assert_eq!(logout.scenario_count(), 1);
        assert_eq!(plan.added[1].scenario_count(), 0);

        let req = logout.to_requirement();
        assert_eq!(req.name.as_deref(), Some("Logout"));
        assert_eq!(req.scenarios.len(), 1);
        assert_eq!(req.scenarios[0].name.as_deref(), Some("Click logout"));
        assert!(req.scenarios[0].follows_given_when_then());
    }

    #[test]
    fn renamed_block_rewrites_header_only() {
        let block = RequirementBlock::new("Old", "Text SHALL hold.\n\n#### Scenario: s\nok");
        let renamed = block.renamed("New");
        assert_eq!(renamed.header_line, "### Requirement: New");
        assert_eq!(renamed.name, "New");
        assert_eq!(
            renamed.raw,
            "### Requirement: New\nText SHALL hold.\n\n#### Scenario: s\nok"
        );
    }

    #[test]
    fn conflicts_report_cross_section_overlap() {
        let plan = parse_delta_spec(
            "## MODIFIED Requirements\n### Requirement: Foo\nx SHALL y\n## REMOVED Requirements\n### Requirement: foo\n",
        );
        let conflicts = plan.conflicts();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].contains("MODIFIED and REMOVED"));
        assert!(conflicts[0].contains("Foo"));
    }

    #[test]
    fn conflicts_report_duplicates_once() {
        let plan = parse_delta_spec(
            "## ADDED Requirements\n### Requirement: A\n### Requirement: a\n### Requirement:  A \n",
        );
        assert_eq!(plan.conflicts(), vec!["Duplicate requirement in ADDED: \"a\""]);
    }

    #[test]
    fn conflicts_for_renames() {
        let plan = parse_delta_spec(
            "## ADDED Requirements\n### Requirement: New\n## MODIFIED Requirements\n### Requirement: Old\n## RENAMED Requirements\n- FROM: Old\n- TO: New\n",
        );
        let conflicts = plan.conflicts();
        assert_eq!(conflicts.len(), 2);
        assert!(conflicts.iter().any(|c| c.contains("old name from RENAMED")));
        assert!(conflicts.iter().any(|c| c.contains("RENAMED TO collides with ADDED")));
    }

    #[test]
    fn extract_splits_target_document() {
        let spec = "# Auth Specification\n\n## Purpose\nAuth.\n\n## Requirements\nIntro text.\n\n### Requirement: Login\nThe system SHALL log in.\n\n#### Scenario: ok\n- **WHEN** a\n- **THEN** b\n\n### Requirement: Logout\nThe system SHALL log out.\n\n## Notes\nTrailing.\n";
        let parts = extract_requirements_section(spec);
        assert_eq!(parts.before, "# Auth Specification\n\n## Purpose\nAuth.\n\n");
        assert_eq!(parts.header_line, "## Requirements");
        assert_eq!(parts.preamble, "Intro text.");
        assert_eq!(parts.body_blocks.len(), 2);
        assert_eq!(parts.body_blocks[0].name, "Login");
        assert!(parts.body_blocks[0].raw.ends_with("- **THEN** b"));
        assert_eq!(parts.body_blocks[1].raw, "### Requirement: Logout\nThe system SHALL log out.");
        assert_eq!(parts.after, "## Notes\nTrailing.\n");
    }

    #[test]
    fn extract_keeps_non_requirement_subheadings() {
        let spec = "## Requirements\n### Requirement: A\nbody\n### Design notes\nkeep me\n";
        let parts = extract_requirements_section(spec);
        assert_eq!(parts.body_blocks.len(), 1);
        assert!(parts.body_blocks[0].raw.contains("keep me"));
    }

    #[test]
    fn extract_without_requirements_section() {
        let parts = extract_requirements_section("# Title\n\n## Purpose\nText\n");
        assert_eq!(parts.before, "# Title\n\n## Purpose\nText\n\n");
        assert_eq!(parts.header_line, "## Requirements");
        assert!(parts.body_blocks.is_empty());
        assert!(parts.after.is_empty());
    }

    #[test]
    fn unnamed_header_is_a_conflict() {
        let plan = parse_delta_spec(
            "## ADDED Requirements\n### Requirement: \nThe system SHALL x.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b\n",
        );
        assert_eq!(plan.added.len(), 1);
        assert_eq!(plan.added[0].name, "");
        assert_eq!(
            plan.conflicts(),
            vec!["Requirement header in ADDED has no name (1 occurrence(s))"]
        );
    }

    #[test]
    fn requirement_text_keeps_hash_prefixed_lines() {
        let block = RequirementBlock::new(
            "Tickets",
            "#123 tracks this.\nThe system SHALL link tickets.\n\n#### Scenario: s\n- **WHEN** a\n- **THEN** b",
        );
        assert_eq!(
            block.requirement_text(),
            "#123 tracks this.\nThe system SHALL link tickets."
        );
        assert_eq!(block.scenario_count(), 1);
    }
}
