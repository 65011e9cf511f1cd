use crate::output::print_json;
use anyhow::Context;
use openspec_core::archive::{archive_change, ArchiveOptions};
use openspec_core::config::Config;
use std::path::Path;

pub struct ArchiveFlags {
    pub skip_specs: bool,
    pub no_validate: bool,
}

pub fn run(root: &Path, id: &str, flags: ArchiveFlags, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let options = ArchiveOptions {
        skip_specs: flags.skip_specs || config.archive.skip_specs,
        validate: !flags.no_validate && config.archive.validate,
    };
    let today = chrono::Local::now().date_naive();

    let outcome = archive_change(root, id, options, today)
        .with_context(|| format!("failed to archive change '{id}'"))?;

    if json {
        return print_json(&outcome);
    }

    if outcome.incomplete_tasks > 0 {
        println!(
            "Warning: {} incomplete task(s) found.",
            outcome.incomplete_tasks
        );
    }
    if options.skip_specs {
        println!("Skipping spec updates.");
    } else if !outcome.updates.is_empty() {
        println!("Specs updated:");
        for update in &outcome.updates {
            let status = if update.created { "create" } else { "update" };
            let c = &update.counts;
            println!(
                "  {}: {status} (+{} ~{} -{} renamed {})",
                update.capability, c.added, c.modified, c.removed, c.renamed
            );
        }
        let t = &outcome.totals;
        println!(
            "Totals: +{} ~{} -{} renamed {}",
            t.added, t.modified, t.removed, t.renamed
        );
    }
    println!("Change '{id}' archived as '{}'.", outcome.archive_name);
    Ok(())
}
