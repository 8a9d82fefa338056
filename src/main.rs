use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use zdev::commands::{self, config::ConfigArgs, patch::PatchArgs, start::StartOptions};
use zdev::ZdevHome;

#[derive(Parser)]
#[command(name = "zdev")]
#[command(about = "Multi-agent worktree development environment", long_about = None)]
#[command(version)]
struct Cli {
    /// Show debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize zdev for a project
    Init {
        /// Path to the main checkout
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Export Convex data as the project's seed
        #[arg(short, long)]
        seed: bool,
    },

    /// Start working on a feature (creates worktree, starts servers)
    Start {
        /// Feature name
        feature: String,

        /// Project path
        #[arg(short, long, default_value = ".")]
        project: PathBuf,

        /// Frontend port (auto-allocated if not specified)
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Skip public URL setup via Traefik
        #[arg(long)]
        local: bool,

        /// Import seed data into the new worktree
        #[arg(short, long)]
        seed: bool,

        /// Base branch to create the feature from
        #[arg(short, long, default_value = "origin/main")]
        base_branch: String,

        /// Subdirectory containing package.json (auto-detected if not specified)
        #[arg(short, long)]
        web_dir: Option<String>,
    },

    /// Stop servers for a feature
    Stop {
        /// Feature name
        feature: String,

        /// Project path (to disambiguate features with the same name)
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Keep the worktree and say so
        #[arg(long)]
        keep: bool,
    },

    /// List active features and their status
    List {
        /// Print the raw config as JSON
        #[arg(long)]
        json: bool,
    },

    /// Alias for list
    Status,

    /// Remove a feature's worktree (use after its PR is merged)
    Clean {
        /// Feature name
        feature: String,

        /// Project path
        #[arg(short, long)]
        project: Option<PathBuf>,

        /// Remove the directory even if git refuses
        #[arg(short, long)]
        force: bool,
    },

    /// Manage Convex seed data
    Seed {
        #[command(subcommand)]
        command: SeedCommands,
    },

    /// View and edit zdev configuration
    Config {
        /// Add a file pattern copied into new worktrees
        #[arg(short, long)]
        add: Option<String>,

        /// Remove a copy pattern
        #[arg(short, long)]
        remove: Option<String>,

        /// Set a config value (devDomain, dockerHostIp, traefikConfigDir)
        #[arg(short, long, value_name = "KEY=VALUE")]
        set: Option<String>,

        /// Show current configuration
        #[arg(short, long)]
        list: bool,
    },

    /// Patch a vite config (allowedHosts, server.port, devtools port)
    PatchVite {
        /// Vite config file, or a directory containing one
        #[arg(default_value = ".")]
        file: PathBuf,

        /// Dev domain for allowedHosts (defaults to the configured devDomain)
        #[arg(short, long)]
        domain: Option<String>,

        /// server.port to set
        #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
        port: Option<u16>,

        /// Port for the devtools event bus
        #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
        devtools_port: Option<u16>,

        /// Show what would change without writing
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Show unified diff of changes
        #[arg(long)]
        diff: bool,
    },
}

#[derive(Subcommand)]
enum SeedCommands {
    /// Export Convex data from a main checkout
    Export {
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Import the project's seed into a checkout (replaces data)
    Import {
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let home = ZdevHome::resolve().context("failed to resolve zdev home")?;
    tracing::debug!(home = %home.root().display(), "resolved zdev home");

    match cli.command {
        Commands::Init { path, seed } => commands::init::run(&home, &path, seed),

        Commands::Start {
            feature,
            project,
            port,
            local,
            seed,
            base_branch,
            web_dir,
        } => {
            let options = StartOptions {
                project,
                port,
                local,
                seed,
                base_branch,
                web_dir,
            };
            commands::start::run(&home, &feature, &options)
        }

        Commands::Stop {
            feature,
            project,
            keep,
        } => commands::stop::run(&home, &feature, project.as_deref(), keep),

        Commands::List { json } => commands::list::run(&home, json),

        Commands::Status => commands::list::run(&home, false),

        Commands::Clean {
            feature,
            project,
            force,
        } => commands::clean::run(&home, &feature, project.as_deref(), force),

        Commands::Seed { command } => match command {
            SeedCommands::Export { path } => commands::seed::export(&home, &path),
            SeedCommands::Import { path } => commands::seed::import(&home, &path),
        },

        Commands::Config {
            add,
            remove,
            set,
            list,
        } => {
            let args = ConfigArgs {
                add,
                remove,
                set,
                list,
            };
            commands::config::run(&home, &args)
        }

        Commands::PatchVite {
            file,
            domain,
            port,
            devtools_port,
            dry_run,
            diff,
        } => {
            let args = PatchArgs {
                domain,
                port,
                devtools_port,
                dry_run,
                diff,
            };
            commands::patch::run(&home, &file, &args)
        }
    }
}
