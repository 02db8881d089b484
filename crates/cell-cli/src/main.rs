use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{Target, Workload};

#[derive(Parser)]
#[command(
    name = "cellctl",
    about = "CellGrid — realm/space/stack/cell lifecycle controller",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to cellgrid.toml. Defaults apply when the file is absent.
    #[arg(short, long, global = true, default_value = "cellgrid.toml")]
    config: PathBuf,

    /// Override the state store path from the config file.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a cellgrid.toml scaffold
    Init {
        /// Directory to write cellgrid.toml into
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
        /// Directory for the state store
        #[arg(long, default_value = "/var/lib/cellgrid")]
        data_dir: PathBuf,
    },
    /// Show a resource and the existence of its infra
    Get {
        #[command(subcommand)]
        target: Target,
    },
    /// List the children of a parent resource
    List {
        #[command(subcommand)]
        target: commands::ListTarget,
    },
    /// Create a resource, or converge an existing one
    Create {
        #[command(subcommand)]
        target: Target,
    },
    /// Delete a resource.
    ///
    /// Realms, spaces and stacks refuse to go while they have children,
    /// unless --cascade (delete the children first) or --force (skip the
    /// check) is given.
    Delete {
        /// Delete children first
        #[arg(long)]
        cascade: bool,
        /// Skip dependency validation
        #[arg(long)]
        force: bool,
        #[command(subcommand)]
        target: Target,
    },
    /// Delete a resource, then deep-clean anything left behind
    Purge {
        #[arg(long)]
        cascade: bool,
        #[arg(long)]
        force: bool,
        #[command(subcommand)]
        target: Target,
    },
    /// Start a cell or one of its containers
    Start {
        #[command(subcommand)]
        target: Workload,
    },
    /// Stop a cell or one of its containers
    Kill {
        #[command(subcommand)]
        target: Workload,
    },
    /// Create or converge every document in a manifest, parents first
    Apply {
        /// Manifest file (JSON array or single document)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Delete every document in a manifest, children first
    DeleteDocs {
        #[arg(short, long)]
        file: PathBuf,
        #[arg(long)]
        cascade: bool,
        #[arg(long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,cellgrid=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Init { path, data_dir } = &cli.command {
        return commands::init::init(path, data_dir);
    }

    let config = commands::load_config(&cli.config, cli.store.as_deref())?;
    let ctl = commands::open_controller(&config)?;
    let defaults = &config.controller;

    match cli.command {
        Commands::Init { .. } => Ok(()),
        Commands::Get { target } => commands::resource::get(&ctl, target),
        Commands::List { target } => commands::resource::list(&ctl, target),
        Commands::Create { target } => commands::resource::create(&ctl, target),
        Commands::Delete { cascade, force, target } => commands::resource::delete(
            &ctl,
            target,
            force || defaults.default_force,
            cascade || defaults.default_cascade,
        ),
        Commands::Purge { cascade, force, target } => commands::resource::purge(
            &ctl,
            target,
            force || defaults.default_force,
            cascade || defaults.default_cascade,
        ),
        Commands::Start { target } => commands::resource::start(&ctl, target),
        Commands::Kill { target } => commands::resource::kill(&ctl, target),
        Commands::Apply { file } => commands::manifest::apply(&ctl, &file),
        Commands::DeleteDocs { file, cascade, force } => commands::manifest::delete_docs(
            &ctl,
            &file,
            cascade || defaults.default_cascade,
            force || defaults.default_force,
        ),
    }
}
