use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use switchyard_core::config::AppConfig;
use switchyard_core::traits::RecordStore;
use switchyard_core::types::Table;
use switchyard_flow::{
    AuditLogger, ChannelAuditSink, Collaborators, DemoWeatherProvider, Orchestrator,
    StaticGeocoder, TracingAuditSink,
};
use switchyard_gateway::GatewayServer;
use switchyard_store::SqliteStore;

#[derive(Parser)]
#[command(
    name = "switchyard",
    version,
    about = "Workflow graph orchestrator for payment and weather requests"
)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "switchyard.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single request and print the response
    Run {
        /// The request text (read from stdin when empty)
        #[arg(trailing_var_arg = true)]
        request: Vec<String>,
        /// Print the visited node path and timings
        #[arg(long)]
        trace: bool,
    },
    /// Start the HTTP operation gateway
    Serve,
    /// Show current configuration
    Config,
    /// Bulk insert records from a JSON file keyed by table name
    Import {
        /// JSON file of the form {"transactions": [ {...}, ... ], ...}
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("switchyard=info,warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        AppConfig::load(&cli.config)?
    } else {
        let home_config = switchyard_core::config::dirs_home()
            .map(|h| h.join(".switchyard").join("config.toml"));
        match home_config {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading config from home directory");
                AppConfig::load(&path)?
            }
            _ => {
                info!("No config file found, using defaults");
                AppConfig::default()
            }
        }
    };

    match cli.command {
        Commands::Config => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        Commands::Import { file } => {
            let store = SqliteStore::open(&config.storage_path())?;
            let count = import_records(&store, &file).await?;
            println!("Imported {} record(s) into {}", count, config.storage_path().display());
        }
        Commands::Run { request, trace } => {
            let text = if request.is_empty() {
                io::stdin()
                    .lock()
                    .lines()
                    .map_while(|l| l.ok())
                    .collect::<Vec<_>>()
                    .join("\n")
            } else {
                request.join(" ")
            };

            let cancel = CancellationToken::new();
            let (orchestrator, audit_task) = build_orchestrator(&config, cancel.clone())?;

            let ctrl_c = cancel.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                ctrl_c.cancel();
            });

            let result = orchestrator.run(&text, &cancel).await;
            // Dropping the orchestrator closes the audit channel so the writer drains.
            drop(orchestrator);
            if let Some(task) = audit_task {
                if let Ok(Some(path)) = task.await {
                    info!(path = %path.display(), "Audit trail written");
                }
            }

            let outcome = result?;
            println!("{}", outcome.response);
            if trace {
                eprintln!("\nrun {} ({} ms)", outcome.run_id, outcome.total_elapsed_ms);
                for timing in &outcome.timings {
                    eprintln!("  {:<24} {} ms", timing.node.as_str(), timing.elapsed_ms);
                }
            }
        }
        Commands::Serve => {
            let cancel = CancellationToken::new();
            let (orchestrator, audit_task) = build_orchestrator(&config, cancel.clone())?;

            info!(bind = %config.gateway.bind, "Starting operation gateway");
            let server = GatewayServer::new(config.gateway.clone(), Arc::new(orchestrator));

            // Graceful shutdown on Ctrl-C
            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await.ok();
                info!("Shutting down gateway...");
                cancel_clone.cancel();
            });

            server.run(cancel).await?;
            if let Some(task) = audit_task {
                task.await.ok();
            }
        }
    }

    Ok(())
}

/// Wire the orchestrator to the configured store and audit sinks. Returns the
/// JSONL audit writer task when an audit directory is configured.
fn build_orchestrator(
    config: &AppConfig,
    cancel: CancellationToken,
) -> anyhow::Result<(Orchestrator, Option<JoinHandle<Option<PathBuf>>>)> {
    let db_path = config.storage_path();
    let store = Arc::new(
        SqliteStore::open(&db_path)
            .with_context(|| format!("opening store at {}", db_path.display()))?,
    );

    let mut collaborators = Collaborators::new(
        store,
        Arc::new(StaticGeocoder),
        Arc::new(DemoWeatherProvider),
    );

    let mut audit_task = None;
    if config.audit.enabled {
        collaborators = collaborators.with_audit_sink(Arc::new(TracingAuditSink));
        if let Some(dir) = config.audit_dir() {
            let (sink, rx) = ChannelAuditSink::new();
            collaborators = collaborators.with_audit_sink(Arc::new(sink));
            audit_task = Some(tokio::spawn(AuditLogger::new(dir).run(rx, cancel)));
        }
    }

    let orchestrator = Orchestrator::new(config, collaborators)?;
    Ok((orchestrator, audit_task))
}

/// Insert every record of a `{table: [records]}` JSON document.
async fn import_records(store: &SqliteStore, file: &Path) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let doc: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)?;

    let mut count = 0;
    for (name, rows) in doc {
        let table: Table = match name.parse() {
            Ok(t) => t,
            Err(e) => {
                warn!(table = %name, error = %e, "Skipping unknown table");
                continue;
            }
        };
        let serde_json::Value::Array(rows) = rows else {
            anyhow::bail!("table {} must be a JSON array", name);
        };
        for row in rows {
            let serde_json::Value::Object(record) = row else {
                anyhow::bail!("records in {} must be JSON objects", name);
            };
            store.insert(table, record).await?;
            count += 1;
        }
    }
    Ok(count)
}
