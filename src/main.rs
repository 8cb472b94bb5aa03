// src/main.rs
//
// RenameHub CLI
//
// Query and maintain persisted plans, and submit rename plans with the
// terminal acting as the confirmation consumer.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use renamehub::application::commands;
use renamehub::application::dto::{EpisodeRenamePreviewDto, SubmitRenamePlanDto};
use renamehub::{
    AppState, CatalogSeason, ConfirmationChannel, EngineConfig, EpisodeCatalog, FsRenameExecutor,
    InProcessTransport, OutgoingConfirmation, RecoveryPolicy,
};

#[derive(Parser, Debug)]
#[command(name = "renamehub")]
#[command(about = "Plan, confirm and apply media file renames")]
#[command(version)]
struct Cli {
    /// Config file; overrides RENAMEHUB_CONFIG and the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List plans of both kinds
    List {
        /// Only plans in this status (pending, completed, rejected)
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one plan
    Show { plan_id: String },
    /// Plan counts per kind and status
    Stats,
    /// Reject a pending plan
    Reject { plan_id: String },
    /// Mark a pending plan completed without touching files
    Complete { plan_id: String },
    /// Handle plans left pending by a previous run
    Recover {
        /// Overrides the configured policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
    },
    /// Propose canonical names for the episodes found in a folder
    Preview(EpisodeArgs),
    /// Propose canonical names and submit them as a rename plan
    Apply {
        #[command(flatten)]
        episodes: EpisodeArgs,
        /// Confirm without prompting
        #[arg(short, long)]
        yes: bool,
    },
    /// Submit a rename plan read from a JSON file
    Submit {
        plan_file: PathBuf,
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(clap::Args, Debug)]
struct EpisodeArgs {
    /// Media folder to scan
    folder: String,
    /// Show name used in destination file names
    #[arg(long)]
    show: String,
    /// Catalog JSON file ({"seasons": [...]})
    #[arg(long, conflicts_with = "episodes")]
    catalog: Option<PathBuf>,
    /// Single-season catalog with this many episodes
    #[arg(long)]
    episodes: Option<u32>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Expire,
    ReOffer,
}

impl From<PolicyArg> for RecoveryPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Expire => RecoveryPolicy::Expire,
            PolicyArg::ReOffer => RecoveryPolicy::ReOffer,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load()?,
    };

    let (transport, confirmations) = InProcessTransport::new();
    let state = AppState::open(config, Arc::new(transport), Arc::new(FsRenameExecutor))?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, aborting pending confirmations");
                cancel.cancel();
            }
        });
    }

    run(cli.command, &state, confirmations, &cancel).await
}

async fn run(
    command: Command,
    state: &AppState,
    confirmations: mpsc::Receiver<OutgoingConfirmation>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Command::List { status } => print_json(&commands::list_plans(state, status.as_deref())?),
        Command::Show { plan_id } => print_json(&commands::get_plan(state, &plan_id)?),
        Command::Stats => print_json(&commands::database_stats(state)?),
        Command::Reject { plan_id } => print_json(&commands::reject_plan(state, &plan_id)?),
        Command::Complete { plan_id } => print_json(&commands::complete_plan(state, &plan_id)?),
        Command::Recover { policy } => {
            spawn_terminal_consumer(Arc::clone(&state.confirmations), confirmations, false);
            let report =
                commands::recover_pending_plans(state, policy.map(Into::into), cancel).await?;
            print_json(&report)
        }
        Command::Preview(args) => {
            let preview = commands::preview_episode_renames(state, &args.into_dto()?).await?;
            print_json(&preview)
        }
        Command::Apply { episodes, yes } => {
            spawn_terminal_consumer(Arc::clone(&state.confirmations), confirmations, yes);
            let outcome =
                commands::apply_episode_renames(state, &episodes.into_dto()?, None, cancel).await?;
            print_json(&outcome)
        }
        Command::Submit { plan_file, yes } => {
            let dto: SubmitRenamePlanDto = read_json(&plan_file)?;
            spawn_terminal_consumer(Arc::clone(&state.confirmations), confirmations, yes);
            let outcome = commands::submit_rename_plan(state, dto, cancel).await?;
            print_json(&outcome)
        }
    }
}

impl EpisodeArgs {
    fn into_dto(self) -> anyhow::Result<EpisodeRenamePreviewDto> {
        let catalog = match (self.catalog, self.episodes) {
            (Some(path), _) => read_json(&path)?,
            (None, Some(count)) => EpisodeCatalog::new(vec![CatalogSeason::numbered(1, count)]),
            (None, None) => anyhow::bail!("either --catalog or --episodes is required"),
        };
        Ok(EpisodeRenamePreviewDto {
            media_folder_path: self.folder,
            show_name: self.show,
            catalog,
        })
    }
}

/// Answer confirmations from stdin (`y`/`yes` confirms, anything else declines)
fn spawn_terminal_consumer(
    channel: Arc<ConfirmationChannel>,
    mut requests: mpsc::Receiver<OutgoingConfirmation>,
    assume_yes: bool,
) {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        while let Some(request) = requests.recv().await {
            println!("{}", serde_json::to_string_pretty(&request.data).unwrap_or_default());

            let confirmed = if assume_yes {
                true
            } else {
                println!("{}: apply? [y/N]", request.event);
                match lines.next_line().await {
                    Ok(Some(line)) => matches!(line.trim().to_lowercase().as_str(), "y" | "yes"),
                    _ => false,
                }
            };

            if !channel.dispatch(request.correlation_id, serde_json::json!({ "confirmed": confirmed })) {
                log::warn!("Answer for {} arrived too late", request.correlation_id);
            }
        }
    });
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
