use crate::output::{print_issues, print_json};
use anyhow::Context;
use clap::Args;
use openspec_core::config::Config;
use openspec_core::report::{BulkReport, ValidationReport};
use openspec_core::types::ItemType;
use openspec_core::validator::{ValidateOptions, Validator};
use openspec_core::{paths, workspace};
use std::path::Path;

const NOTHING_TO_VALIDATE: &str = "Nothing to validate. Try one of:
  openspec validate --all
  openspec validate --changes
  openspec validate --specs
  openspec validate <item-name>";

#[derive(Args)]
pub struct ValidateArgs {
    /// Spec or change id to validate
    pub item: Option<String>,

    /// Validate every spec and change
    #[arg(long, conflicts_with = "item")]
    pub all: bool,

    /// Validate every spec
    #[arg(long, conflicts_with = "item")]
    pub specs: bool,

    /// Validate every active change
    #[arg(long, conflicts_with = "item")]
    pub changes: bool,

    /// Disambiguate ITEM when it names both a spec and a change
    #[arg(long = "type", value_name = "TYPE")]
    pub item_type: Option<ItemType>,

    /// Treat warnings as failures
    #[arg(long)]
    pub strict: bool,
}

pub fn run(root: &Path, args: ValidateArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let validator = Validator::new(ValidateOptions {
        strict: args.strict || config.validation.strict,
    });

    if let Some(item) = args.item.as_deref() {
        let item_type = resolve_item_type(root, item, args.item_type)?;
        let report = validate_item(root, &validator, item, item_type)?;
        let valid = report.valid;
        if json {
            let mut bulk = BulkReport::default();
            bulk.push(item, item_type, report);
            print_json(&bulk)?;
        } else {
            print_single(item, item_type, &report);
        }
        if !valid {
            anyhow::bail!("{item_type} '{item}' has validation errors");
        }
        return Ok(());
    }

    let (specs, changes) = match (args.all, args.specs, args.changes) {
        (true, _, _) => (true, true),
        (false, false, false) => anyhow::bail!(NOTHING_TO_VALIDATE),
        (false, s, c) => (s, c),
    };

    let mut bulk = BulkReport::default();
    if specs {
        for id in workspace::list_spec_ids(root).context("failed to list specs")? {
            let report = validate_item(root, &validator, &id, ItemType::Spec)?;
            bulk.push(id, ItemType::Spec, report);
        }
    }
    if changes {
        for id in workspace::list_change_ids(root).context("failed to list changes")? {
            let report = validate_item(root, &validator, &id, ItemType::Change)?;
            bulk.push(id, ItemType::Change, report);
        }
    }

    if json {
        print_json(&bulk)?;
    } else {
        print_bulk(&bulk);
    }
    if !bulk.all_valid() {
        anyhow::bail!(
            "{} of {} item(s) failed validation",
            bulk.summary.totals.failed,
            bulk.summary.totals.items
        );
    }
    Ok(())
}

fn resolve_item_type(
    root: &Path,
    item: &str,
    explicit: Option<ItemType>,
) -> anyhow::Result<ItemType> {
    paths::validate_item_id(item)?;
    let is_spec = workspace::spec_exists(root, item);
    let is_change = workspace::change_exists(root, item);
    match explicit {
        Some(ItemType::Spec) if is_spec => Ok(ItemType::Spec),
        Some(ItemType::Change) if is_change => Ok(ItemType::Change),
        Some(t) => anyhow::bail!("Unknown {t} '{item}'"),
        None => match (is_spec, is_change) {
            (true, true) => anyhow::bail!(
                "Ambiguous item '{item}' matches both a change and a spec.\nPass --type spec or --type change to disambiguate."
            ),
            (true, false) => Ok(ItemType::Spec),
            (false, true) => Ok(ItemType::Change),
            (false, false) => anyhow::bail!(
                "Unknown item '{item}'. Use 'openspec spec list' or 'openspec change list' to see available items."
            ),
        },
    }
}

fn validate_item(
    root: &Path,
    validator: &Validator,
    id: &str,
    item_type: ItemType,
) -> anyhow::Result<ValidationReport> {
    match item_type {
        ItemType::Spec => {
            let content = workspace::read_spec(root, id)
                .with_context(|| format!("failed to read spec '{id}'"))?;
            Ok(validator.validate_spec(id, &content))
        }
        ItemType::Change => {
            let proposal = workspace::read_proposal(root, id)
                .with_context(|| format!("failed to read change '{id}'"))?;
            let delta_files = workspace::read_delta_files(&paths::change_dir(root, id))
                .with_context(|| format!("failed to read delta specs for '{id}'"))?;
            Ok(validator.validate_change(id, &proposal, &delta_files))
        }
    }
}

fn print_single(id: &str, item_type: ItemType, report: &ValidationReport) {
    if report.valid {
        println!("{item_type} '{id}' is valid");
    } else {
        println!("{item_type} '{id}' has issues");
    }
    print_issues(&report.issues);
}

fn print_bulk(bulk: &BulkReport) {
    for item in &bulk.items {
        let mark = if item.valid { "ok  " } else { "FAIL" };
        println!("{mark} {}/{}", item.item_type, item.id);
        print_issues(&item.issues);
    }
    let totals = &bulk.summary.totals;
    println!(
        "Totals: {} passed, {} failed ({} items)",
        totals.passed, totals.failed, totals.items
    );
}
