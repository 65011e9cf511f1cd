use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use openspec_core::document::{Requirement, Spec};
use openspec_core::{markdown, workspace};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SpecSubcommand {
    /// List specs with their requirement counts
    List,

    /// Show a spec (raw markdown, or the parsed document with --json)
    Show {
        id: String,

        /// Only show requirements
        #[arg(long)]
        requirements: bool,

        /// Omit scenarios from requirements
        #[arg(long)]
        no_scenarios: bool,

        /// Show a single requirement by 1-based index
        #[arg(short = 'r', long = "requirement", value_name = "N")]
        requirement: Option<usize>,
    },
}

pub fn run(root: &Path, subcmd: SpecSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SpecSubcommand::List => list(root, json),
        SpecSubcommand::Show {
            id,
            requirements,
            no_scenarios,
            requirement,
        } => show(
            root,
            &id,
            ShowFilter {
                requirements_only: requirements,
                no_scenarios,
                requirement,
            },
            json,
        ),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpecListEntry {
    id: String,
    /// `None` when the spec does not parse.
    requirement_count: Option<usize>,
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut entries = Vec::new();
    for id in workspace::list_spec_ids(root).context("failed to list specs")? {
        let content = workspace::read_spec(root, &id)
            .with_context(|| format!("failed to read spec '{id}'"))?;
        let requirement_count = markdown::parse_spec(&id, &content)
            .ok()
            .map(|s| s.requirements.len());
        entries.push(SpecListEntry {
            id,
            requirement_count,
        });
    }

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No specs found.");
        return Ok(());
    }
    let rows = entries
        .into_iter()
        .map(|e| {
            let count = e
                .requirement_count
                .map(|n| n.to_string())
                .unwrap_or_else(|| "unparsable".to_string());
            vec![e.id, count]
        })
        .collect();
    print_table(&["SPEC", "REQUIREMENTS"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

struct ShowFilter {
    requirements_only: bool,
    no_scenarios: bool,
    requirement: Option<usize>,
}

impl ShowFilter {
    fn is_raw(&self) -> bool {
        !self.requirements_only && !self.no_scenarios && self.requirement.is_none()
    }
}

fn show(root: &Path, id: &str, filter: ShowFilter, json: bool) -> anyhow::Result<()> {
    let content =
        workspace::read_spec(root, id).with_context(|| format!("failed to read spec '{id}'"))?;
    if !json && filter.is_raw() {
        print!("{content}");
        return Ok(());
    }

    let mut spec = markdown::parse_spec(id, &content)
        .with_context(|| format!("failed to parse spec '{id}'"))?;
    if filter.no_scenarios {
        for req in &mut spec.requirements {
            req.scenarios.clear();
        }
    }
    if let Some(n) = filter.requirement {
        let req = n
            .checked_sub(1)
            .and_then(|i| spec.requirements.get(i))
            .cloned()
            .with_context(|| {
                format!(
                    "requirement {n} not found in '{id}' ({} requirements)",
                    spec.requirements.len()
                )
            })?;
        spec.requirements = vec![req];
    }

    if json {
        if filter.requirements_only || filter.requirement.is_some() {
            let value = serde_json::json!({
                "id": id,
                "requirementCount": spec.requirements.len(),
                "requirements": spec.requirements,
            });
            return print_json(&value);
        }
        return print_json(&spec);
    }

    print_spec(&spec, filter.requirements_only);
    Ok(())
}

fn print_spec(spec: &Spec, requirements_only: bool) {
    if !requirements_only {
        println!("Spec: {}", spec.name);
        println!();
        println!("{}", spec.overview);
        println!();
    }
    for (i, req) in spec.requirements.iter().enumerate() {
        print_requirement(i + 1, req);
    }
}

fn print_requirement(n: usize, req: &Requirement) {
    match &req.name {
        Some(name) => println!("{n}. {name}: {}", req.text),
        None => println!("{n}. {}", req.text),
    }
    for scenario in &req.scenarios {
        let label = scenario.name.as_deref().unwrap_or("Scenario");
        println!("   - {label}");
        for line in scenario.raw_text.lines().filter(|l| !l.trim().is_empty()) {
            println!("       {}", line.trim());
        }
    }
}
