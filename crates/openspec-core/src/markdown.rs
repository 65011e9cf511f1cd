//! Markdown structural parser.
//!
//! Builds a heading tree from raw markdown and specializes it into a
//! [`Spec`] or a legacy whole-document [`Change`].

use crate::document::{Change, Delta, Metadata, Requirement, Scenario, Spec};
use crate::error::{Result, SpecError};
use crate::requirement_blocks::{self, DeltaFile, RequirementBlock};
use crate::types::DeltaOperation;
use regex::Regex;
use std::sync::OnceLock;

pub const SPEC_MISSING_PURPOSE: &str = "Spec must have a Purpose or Overview section";
pub const SPEC_MISSING_REQUIREMENTS: &str = "Spec must have a Requirements section";
pub const CHANGE_MISSING_WHY: &str = "Change must have a Why section";
pub const CHANGE_MISSING_WHAT: &str = "Change must have a What Changes section";

// ---------------------------------------------------------------------------
// Section tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub level: usize,
    pub title: String,
    /// Trimmed body up to the next heading of equal or lesser level,
    /// including the text of any nested headings.
    pub content: String,
    pub children: Vec<Section>,
}

impl Section {
    /// Body text before the first nested heading.
    pub fn lead(&self) -> &str {
        let mut end = self.content.len();
        let mut offset = 0;
        for line in self.content.split_inclusive('\n') {
            if heading_prefix_re().is_match(line.trim_end()) {
                end = offset;
                break;
            }
            offset += line.len();
        }
        self.content[..end].trim()
    }
}

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_PREFIX_RE: OnceLock<Regex> = OnceLock::new();
static DELTA_BULLET_RE: OnceLock<Regex> = OnceLock::new();
static REQUIREMENT_TITLE_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap())
}

pub(crate) fn heading_prefix_re() -> &'static Regex {
    HEADING_PREFIX_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+").unwrap())
}

fn delta_bullet_re() -> &'static Regex {
    DELTA_BULLET_RE.get_or_init(|| Regex::new(r"^\s*-\s*\*\*([^:]+):\*\*\s*(.+)$").unwrap())
}

fn requirement_title_re() -> &'static Regex {
    REQUIREMENT_TITLE_RE.get_or_init(|| Regex::new(r"(?i)^requirement:\s*(.+)$").unwrap())
}

fn split_lines(content: &str) -> Vec<&str> {
    content
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect()
}

/// Parse markdown into a forest of sections keyed by heading level.
pub fn parse_sections(content: &str) -> Vec<Section> {
    let lines = split_lines(content);
    let mut roots: Vec<Section> = Vec::new();
    // Path of indices from the roots to the currently open section.
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(caps) = heading_re().captures(line) else {
            continue;
        };
        let level = caps[1].len();
        let section = Section {
            level,
            title: caps[2].trim().to_string(),
            content: content_until_next_heading(&lines, i + 1, level),
            children: Vec::new(),
        };

        while stack.last().is_some_and(|(lvl, _)| *lvl >= level) {
            stack.pop();
        }

        let siblings = if stack.is_empty() {
            &mut roots
        } else {
            let mut node = &mut roots[stack[0].1];
            for (_, idx) in &stack[1..] {
                node = &mut node.children[*idx];
            }
            &mut node.children
        };
        siblings.push(section);
        stack.push((level, siblings.len() - 1));
    }

    roots
}

fn content_until_next_heading(lines: &[&str], start: usize, level: usize) -> String {
    let mut out: Vec<&str> = Vec::new();
    for &line in &lines[start.min(lines.len())..] {
        if let Some(caps) = heading_prefix_re().captures(line) {
            if caps[1].len() <= level {
                break;
            }
        }
        out.push(line);
    }
    out.join("\n").trim().to_string()
}

/// Depth-first, case-insensitive search for a section by title.
pub fn find_section<'a>(sections: &'a [Section], title: &str) -> Option<&'a Section> {
    for section in sections {
        if section.title.eq_ignore_ascii_case(title) {
            return Some(section);
        }
        if let Some(found) = find_section(&section.children, title) {
            return Some(found);
        }
    }
    None
}

// ---------------------------------------------------------------------------
// Spec
// ---------------------------------------------------------------------------

pub fn parse_spec(name: &str, content: &str) -> Result<Spec> {
    let sections = parse_sections(content);
    let overview = ["Purpose", "Overview"]
        .iter()
        .filter_map(|t| find_section(&sections, t))
        .map(|s| s.content.as_str())
        .find(|c| !c.is_empty())
        .ok_or(SpecError::MissingSection(SPEC_MISSING_PURPOSE))?;
    let requirements_section = find_section(&sections, "Requirements")
        .ok_or(SpecError::MissingSection(SPEC_MISSING_REQUIREMENTS))?;

    Ok(Spec {
        name: name.to_string(),
        overview: overview.trim().to_string(),
        requirements: parse_requirements(requirements_section),
        metadata: Some(Metadata::spec()),
    })
}

fn parse_requirements(section: &Section) -> Vec<Requirement> {
    section.children.iter().map(parse_requirement).collect()
}

fn parse_requirement(section: &Section) -> Requirement {
    let scenarios = section
        .children
        .iter()
        .filter(|s| !s.content.trim().is_empty())
        .map(|s| Scenario::from_raw(Some(scenario_name(&s.title)), s.content.clone()))
        .collect();

    match requirement_title_re().captures(&section.title) {
        Some(caps) => {
            let name = caps[1].trim().to_string();
            let text = first_paragraph(section.lead()).unwrap_or_else(|| name.clone());
            Requirement {
                name: Some(name),
                text,
                scenarios,
            }
        }
        None => Requirement {
            name: None,
            text: section.title.clone(),
            scenarios,
        },
    }
}

fn scenario_name(title: &str) -> String {
    let trimmed = title.trim();
    match trimmed.get(..9) {
        Some(prefix) if prefix.eq_ignore_ascii_case("scenario:") => trimmed[9..].trim().to_string(),
        _ => trimmed.to_string(),
    }
}

/// First blank-line-delimited paragraph of `text`, if any.
pub(crate) fn first_paragraph(text: &str) -> Option<String> {
    let mut para: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !para.is_empty() {
                break;
            }
            continue;
        }
        para.push(line.trim());
    }
    if para.is_empty() {
        None
    } else {
        Some(para.join("\n"))
    }
}

// ---------------------------------------------------------------------------
// Change
// ---------------------------------------------------------------------------

pub fn parse_change(name: &str, content: &str) -> Result<Change> {
    let sections = parse_sections(content);
    let why = find_section(&sections, "Why")
        .map(|s| s.content.as_str())
        .filter(|c| !c.is_empty())
        .ok_or(SpecError::MissingSection(CHANGE_MISSING_WHY))?;
    let what_changes = find_section(&sections, "What Changes")
        .map(|s| s.content.as_str())
        .filter(|c| !c.is_empty())
        .ok_or(SpecError::MissingSection(CHANGE_MISSING_WHAT))?;

    Ok(Change {
        name: name.to_string(),
        why: why.trim().to_string(),
        what_changes: what_changes.trim().to_string(),
        deltas: parse_bullet_deltas(what_changes),
        metadata: Some(Metadata::change()),
    })
}

fn parse_bullet_deltas(what_changes: &str) -> Vec<Delta> {
    what_changes
        .lines()
        .filter_map(|line| delta_bullet_re().captures(line))
        .map(|caps| {
            let description = caps[2].trim().to_string();
            Delta {
                spec: caps[1].trim().to_string(),
                operation: DeltaOperation::infer(&description),
                description,
                requirements: None,
            }
        })
        .collect()
}

/// Parse a change proposal, preferring deltas derived from the change's
/// per-capability delta files over the bullets in `What Changes`.
pub fn parse_change_with_deltas(
    name: &str,
    content: &str,
    delta_files: &[DeltaFile],
) -> Result<Change> {
    let mut change = parse_change(name, content)?;
    let mut deltas = Vec::new();
    for file in delta_files {
        let plan = requirement_blocks::parse_delta_spec(&file.content);
        for block in &plan.added {
            deltas.push(block_delta(&file.capability, DeltaOperation::Added, "Add", block));
        }
        for block in &plan.modified {
            deltas.push(block_delta(&file.capability, DeltaOperation::Modified, "Modify", block));
        }
        for removed in &plan.removed {
            deltas.push(Delta {
                spec: file.capability.clone(),
                operation: DeltaOperation::Removed,
                description: format!("Remove requirement: {removed}"),
                requirements: None,
            });
        }
        for pair in &plan.renamed {
            deltas.push(Delta {
                spec: file.capability.clone(),
                operation: DeltaOperation::Modified,
                description: format!("Rename requirement '{}' to '{}'", pair.from, pair.to),
                requirements: None,
            });
        }
    }
    if !deltas.is_empty() {
        change.deltas = deltas;
    }
    Ok(change)
}

fn block_delta(
    capability: &str,
    operation: DeltaOperation,
    verb: &str,
    block: &RequirementBlock,
) -> Delta {
    Delta {
        spec: capability.to_string(),
        operation,
        description: format!("{verb} requirement: {}", block.name),
        requirements: Some(vec![block.to_requirement()]),
    }
}
