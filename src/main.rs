//! Sanctions Graph: command-line entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (`-f` path, `config/default.toml`, or built-in defaults)
//!   3. Init logger at the configured level, or the `-v` level if given
//!   4. Open the graph store and ensure its constraints
//!   5. Run the subcommand
//!
//! Exit status: 0 on success, 2 when any record failed or was skipped,
//! 1 when the run could not start.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use sanctions_graph::bootstrap::logger;
use sanctions_graph::config::{self, Config, IngestConfig};
use sanctions_graph::error::AppError;
use sanctions_graph::ingest::{Ingestor, RunReport};
use sanctions_graph::mapper::RecordMapper;
use sanctions_graph::records::{self, PartyKind};
use sanctions_graph::store::{GraphStore, SqliteGraphStore};
use sanctions_graph::writer::GraphWriter;

#[derive(Parser)]
#[command(name = "sanctions-graph")]
#[command(version)]
#[command(about = "Load extracted sanctions-list records into a deduplicated graph")]
struct Cli {
    /// Config file (defaults to config/default.toml when present).
    #[arg(short = 'f', long = "config", global = true)]
    config: Option<String>,

    /// Increase log verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest individuals then organisations.
    Ingest {
        /// Individuals JSON (overrides [ingest] individuals).
        #[arg(long)]
        individuals: Option<PathBuf>,

        /// Organisations JSON (overrides [ingest] entities).
        #[arg(long)]
        entities: Option<PathBuf>,

        /// Clear sanctions data before ingesting.
        #[arg(long)]
        clear: bool,

        /// Records processed concurrently (overrides [ingest] workers).
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Print node and relationship counts.
    Stats,
    /// Remove parties, aliases, addresses and referenced organisations.
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run() -> Result<ExitCode, AppError> {
    // Optional file.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = config::load(cli.config.as_deref())?;

    let forced = logger::level_for_verbosity(cli.verbose);
    logger::init(
        forced.unwrap_or(&config.log_level),
        forced.is_some(),
        config.log_file.as_deref(),
    )?;

    info!(
        store = %config.store.path.display(),
        regime = %config.regime.id,
        list = %config.list.id,
        "config loaded"
    );

    let store = Arc::new(SqliteGraphStore::open(&config.store.path, config.store.tx_timeout_ms)?);
    store.ensure_constraints()?;

    match cli.command {
        Commands::Ingest {
            individuals,
            entities,
            clear,
            workers,
        } => {
            let (individuals, entities) = select_inputs(individuals, entities, &config.ingest);
            if individuals.is_none() && entities.is_none() {
                return Err(AppError::Input(
                    "nothing to ingest: pass --individuals/--entities or set them under [ingest]".into(),
                ));
            }
            if clear {
                let summary = store.clear_sanctions_data()?;
                info!(
                    nodes = summary.nodes_deleted,
                    relationships = summary.relationships_deleted,
                    "sanctions data cleared"
                );
            }
            let outcome = ingest(&config, store.clone(), individuals, entities, workers).await;
            if let Some(report) = &outcome.report {
                println!("{report}");
            }
            for failure in &outcome.load_failures {
                println!("✗ {failure}");
            }
            print!("{}", store.stats()?);
            if outcome.succeeded() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(2))
            }
        }
        Commands::Stats => {
            print!("{}", store.stats()?);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Clear => {
            let summary = store.clear_sanctions_data()?;
            println!(
                "✓ Cleared {} nodes and {} relationships",
                summary.nodes_deleted, summary.relationships_deleted
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Batch files for this run. Paths given on the command line replace the
/// configured pair as a whole, so `--entities` alone never picks up the
/// configured individuals file.
fn select_inputs(
    individuals: Option<PathBuf>,
    entities: Option<PathBuf>,
    configured: &IngestConfig,
) -> (Option<PathBuf>, Option<PathBuf>) {
    if individuals.is_some() || entities.is_some() {
        (individuals, entities)
    } else {
        (configured.individuals.clone(), configured.entities.clone())
    }
}

struct IngestOutcome {
    report: Option<RunReport>,
    load_failures: Vec<String>,
}

impl IngestOutcome {
    fn succeeded(&self) -> bool {
        self.load_failures.is_empty()
            && self.report.as_ref().is_some_and(RunReport::all_mandatory_applied)
    }
}

/// Each batch loads and runs on its own: an unreadable file is reported
/// and the other batch still ingests.
async fn ingest(
    config: &Config,
    store: Arc<SqliteGraphStore>,
    individuals: Option<PathBuf>,
    entities: Option<PathBuf>,
    workers: Option<usize>,
) -> IngestOutcome {
    let writer = Arc::new(GraphWriter::from_config(store, &config.store));
    let mapper = Arc::new(RecordMapper::new(config.regime.clone(), config.list.clone()));
    let ingestor = Ingestor::new(writer, mapper, workers.unwrap_or(config.ingest.workers));

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, finishing in-flight records");
                cancel.cancel();
            }
        });
    }

    let mut outcome = IngestOutcome {
        report: None,
        load_failures: Vec::new(),
    };
    let inputs = [(individuals, PartyKind::Person), (entities, PartyKind::Organisation)];
    for (path, kind) in inputs {
        let Some(path) = path else { continue };
        let batch = match records::load_batch(&path, kind) {
            Ok(batch) => batch,
            Err(e) => {
                error!(path = %path.display(), kind = %kind, error = %e, "batch not loaded");
                outcome.load_failures.push(e.to_string());
                continue;
            }
        };
        let next = ingestor.run(batch, cancel.clone()).await;
        match outcome.report.as_mut() {
            Some(r) => r.merge(next),
            None => outcome.report = Some(next),
        }
    }
    outcome
}
