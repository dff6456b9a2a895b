use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use allot_core::ResourceKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "allot",
    about = "allot — stable identifiers and bucket placements, kept in a local state file",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Log output format: text or json
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a scaffold allot.toml
    Init {
        /// Directory to write into (default: current directory)
        #[arg(short, long, default_value = ".")]
        path: PathBuf,
    },
    /// Show what apply would change, without writing state
    Plan {
        #[command(flatten)]
        target: Target,
    },
    /// Reconcile every declared resource and commit the result.
    ///
    /// Exits non-zero if any resource could not be allocated; the
    /// previous state of that resource is kept.
    Apply {
        #[command(flatten)]
        target: Target,
    },
    /// Print stored state, or one resource if KIND and NAME are given
    Show {
        /// Resource kind: counter or buckets
        #[arg(requires = "name")]
        kind: Option<ResourceKind>,
        /// Resource name
        name: Option<String>,
        /// State file
        #[arg(short, long, default_value = "allot.redb")]
        state: PathBuf,
        /// Output format: text or json
        #[arg(long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },
    /// Remove a resource from state
    Delete {
        /// Resource kind: counter or buckets
        kind: ResourceKind,
        /// Resource name
        name: String,
        /// State file
        #[arg(short, long, default_value = "allot.redb")]
        state: PathBuf,
    },
}

#[derive(clap::Args)]
struct Target {
    /// Configuration file
    #[arg(short, long, default_value = "allot.toml")]
    file: PathBuf,
    /// State file
    #[arg(short, long, default_value = "allot.redb")]
    state: PathBuf,
    /// Output format: text or json
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("allot=info"))?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => subscriber.init(),
        LogFormat::Json => subscriber.json().init(),
    }

    match cli.command {
        Commands::Init { path } => commands::init::init(&path),
        Commands::Plan { target } => {
            commands::reconcile::plan(&target.file, &target.state, target.format)
        }
        Commands::Apply { target } => {
            commands::reconcile::apply(&target.file, &target.state, target.format)
        }
        Commands::Show {
            kind,
            name,
            state,
            format,
        } => match (kind, name) {
            (Some(kind), Some(name)) => commands::state::show_one(&state, kind, &name, format),
            _ => commands::state::show(&state, format),
        },
        Commands::Delete { kind, name, state } => commands::state::delete(&state, kind, &name),
    }
}
