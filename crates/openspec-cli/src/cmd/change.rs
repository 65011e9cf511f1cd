use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use openspec_core::requirement_blocks::parse_delta_spec;
use openspec_core::tasks::{count_tasks, TaskProgress};
use openspec_core::{io, markdown, paths, workspace};
use serde::Serialize;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ChangeSubcommand {
    /// List active changes with task progress
    List,

    /// Show a change (raw proposal, or the parsed document with --json)
    Show {
        id: String,

        /// Only show the deltas
        #[arg(long)]
        deltas_only: bool,
    },
}

pub fn run(root: &Path, subcmd: ChangeSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ChangeSubcommand::List => list(root, json),
        ChangeSubcommand::Show { id, deltas_only } => show(root, &id, deltas_only, json),
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangeListEntry {
    id: String,
    tasks: TaskProgress,
    delta_count: usize,
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let mut entries = Vec::new();
    for id in workspace::list_change_ids(root).context("failed to list changes")? {
        let tasks = io::read_optional(&paths::tasks_path(root, &id))
            .with_context(|| format!("failed to read tasks for '{id}'"))?
            .map(|content| count_tasks(&content))
            .unwrap_or_default();
        let delta_count = workspace::read_delta_files(&paths::change_dir(root, &id))
            .with_context(|| format!("failed to read delta specs for '{id}'"))?
            .iter()
            .map(|f| parse_delta_spec(&f.content).operation_count())
            .sum();
        entries.push(ChangeListEntry {
            id,
            tasks,
            delta_count,
        });
    }

    if json {
        return print_json(&entries);
    }
    if entries.is_empty() {
        println!("No active changes found.");
        return Ok(());
    }
    let rows = entries
        .into_iter()
        .map(|e| vec![e.id, e.tasks.to_string(), e.delta_count.to_string()])
        .collect();
    print_table(&["CHANGE", "TASKS", "DELTAS"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, deltas_only: bool, json: bool) -> anyhow::Result<()> {
    let proposal = workspace::read_proposal(root, id)
        .with_context(|| format!("failed to read change '{id}'"))?;
    if !json && !deltas_only {
        print!("{proposal}");
        return Ok(());
    }

    let delta_files = workspace::read_delta_files(&paths::change_dir(root, id))
        .with_context(|| format!("failed to read delta specs for '{id}'"))?;
    let change = markdown::parse_change_with_deltas(id, &proposal, &delta_files)
        .with_context(|| format!("failed to parse change '{id}'"))?;

    if json {
        if deltas_only {
            let value = serde_json::json!({
                "id": id,
                "deltaCount": change.deltas.len(),
                "deltas": change.deltas,
            });
            return print_json(&value);
        }
        return print_json(&change);
    }

    for delta in &change.deltas {
        println!("[{}] {}: {}", delta.operation, delta.spec, delta.description);
    }
    Ok(())
}
