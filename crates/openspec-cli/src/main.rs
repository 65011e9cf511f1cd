mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    archive::ArchiveFlags, change::ChangeSubcommand, config::ConfigSubcommand,
    spec::SpecSubcommand, validate::ValidateArgs,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "openspec",
    about = "Spec-driven development: validate change proposals and merge them into the living specs",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from openspec/ or .git/)
    #[arg(long, global = true, env = "OPENSPEC_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate specs and changes
    Validate(ValidateArgs),

    /// Inspect specs
    Spec {
        #[command(subcommand)]
        subcommand: SpecSubcommand,
    },

    /// Inspect changes
    Change {
        #[command(subcommand)]
        subcommand: ChangeSubcommand,
    },

    /// Merge a change's deltas into the specs and move it to the archive
    Archive {
        /// Change id
        id: String,

        /// Archive without updating specs
        #[arg(long)]
        skip_specs: bool,

        /// Skip validation of rebuilt specs
        #[arg(long)]
        no_validate: bool,
    },

    /// Inspect and validate openspec/config.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Validate(args) => cmd::validate::run(&root, args, cli.json),
        Commands::Spec { subcommand } => cmd::spec::run(&root, subcommand, cli.json),
        Commands::Change { subcommand } => cmd::change::run(&root, subcommand, cli.json),
        Commands::Archive {
            id,
            skip_specs,
            no_validate,
        } => cmd::archive::run(
            &root,
            &id,
            ArchiveFlags {
                skip_specs,
                no_validate,
            },
            cli.json,
        ),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
