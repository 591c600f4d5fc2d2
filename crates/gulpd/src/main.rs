//! gulpd — the gulp node daemon.
//!
//! # Usage
//!
//! ```text
//! gulpd init --id ASM001 --account-id info@megam.io > gulpd.toml
//! gulpd start --config gulpd.toml --data-dir /var/lib/gulpd
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use gulp_core::GulpConfig;
use gulp_queue::LocalBroker;
use gulp_state::StateStore;
use gulpd::{Server, ServerError};

#[derive(Parser)]
#[command(name = "gulpd", about = "gulp node daemon")]
struct Cli {
    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon.
    Start {
        /// Path to gulpd.toml.
        #[arg(long)]
        config: PathBuf,

        /// Override the record store directory.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Print a starter gulpd.toml.
    Init {
        /// Assembly id this node runs for.
        #[arg(long)]
        id: String,

        #[arg(long)]
        account_id: String,
    },
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,gulpd=debug,gulp=debug"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    match cli.command {
        Command::Start { config, data_dir } => run_start(config, data_dir).await,
        Command::Init { id, account_id } => {
            let config = GulpConfig::scaffold(&id, &account_id);
            print!("{}", config.to_toml_string()?);
            Ok(())
        }
    }
}

async fn run_start(config_path: PathBuf, data_dir: Option<PathBuf>) -> anyhow::Result<()> {
    let mut config = GulpConfig::from_file(&config_path)?.with_env_overrides();
    if let Some(dir) = data_dir {
        config.store.data_dir = dir;
    }
    config.validate()?;
    info!(id = %config.meta.id, name = %config.meta.name, "gulpd starting");

    std::fs::create_dir_all(&config.store.data_dir)
        .with_context(|| format!("creating {}", config.store.data_dir.display()))?;
    let db_path = config.store.data_dir.join("gulpd.redb");
    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "record store opened");

    let broker = Arc::new(LocalBroker::new(config.broker.url.clone()));
    let server = Server::new(Arc::new(config), store, broker);

    match server.run(termination_signal()).await {
        Ok(report) => {
            info!(
                registered = report.registration.registered,
                queues = report.queues.len(),
                "gulpd exited cleanly"
            );
            Ok(())
        }
        Err(ServerError::Check(e)) => {
            eprintln!("{}", e.report());
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
async fn termination_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
