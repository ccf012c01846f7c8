//! tollgate-daemon: serves random quotes behind a proof-of-work gate.
//!
//! Single OS process on a Tokio runtime. Flags:
//!
//!   --config <path>     TOML configuration file (optional)
//!   --listen <addr>     override the listen address
//!   --data-dir <path>   override the quote data folder

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;

use tollgate_admission::Gate;
use tollgate_daemon::config::DaemonConfig;
use tollgate_daemon::server::{serve, ServerState};
use tollgate_quote::QuoteStore;

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    listen: Option<String>,
    data_dir: Option<String>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);
    while let Some(flag) = iter.next() {
        match flag.as_str() {
            "--config" => {
                args.config = Some(iter.next().context("--config needs a path")?.into());
            }
            "--listen" => {
                args.listen = Some(iter.next().context("--listen needs an address")?);
            }
            "--data-dir" => {
                args.data_dir = Some(iter.next().context("--data-dir needs a path")?);
            }
            other => anyhow::bail!("unknown flag {other:?}"),
        }
    }
    Ok(args)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args()?;
    let mut config = DaemonConfig::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen_addr = listen;
    }
    if let Some(data_dir) = args.data_dir {
        config.server.data_dir = data_dir;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("tollgate={}", config.server.log_level).parse()?),
        )
        .init();

    info!("tollgate daemon starting");

    let mut quotes = QuoteStore::new();
    quotes
        .load_from_dir(Path::new(&config.server.data_dir))
        .context("loading the quote folder")?;
    info!(quotes = quotes.len(), "quote store ready");

    let gate = Gate::new(config.admission.to_gate_config());
    let state = Arc::new(ServerState { gate, quotes });

    let listener = TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.server.listen_addr))?;
    info!(addr = %config.server.listen_addr, "listening");

    tokio::select! {
        result = serve(listener, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }

    info!("daemon stopped");
    Ok(())
}
