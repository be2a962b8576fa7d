//! Operator shell for the graduation check-in kiosk.
//!
//! Runs the coordinator against the kiosk server (or an in-memory server
//! with `--demo`) and reads operator commands from standard input. Type
//! `help` for the command list.

mod shell;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use gradcheck_coordinator::{CoordinatorConfig, spawn_coordinator};
use gradcheck_core::{CaptureMode, Identity, QueueEntry, StationId};
use gradcheck_services::mock::{MockBackend, MockBackendHandle};
use gradcheck_services::{AnyBackend, HttpBackend, HttpBackendConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use shell::{HELP, Operator};

/// Graduation check-in kiosk.
#[derive(Debug, Parser)]
#[command(name = "gradcheck")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Kiosk server URL; overrides the configuration.
    #[arg(long)]
    server: Option<String>,

    /// Station to show after startup.
    #[arg(long, default_value = "1")]
    station: StationId,

    /// Use an in-memory server with a few scripted graduates.
    #[arg(long)]
    demo: bool,

    /// Print the view whenever it changes.
    #[arg(long)]
    watch: bool,
}

impl Cli {
    fn load_config(&self) -> Result<CoordinatorConfig> {
        let config = match &self.config {
            Some(path) => CoordinatorConfig::from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => CoordinatorConfig::default(),
        };
        let mut config = config.apply_env()?;
        if let Some(server) = &self.server {
            config.server_url.clone_from(server);
        }
        config.validate()?;
        Ok(config)
    }
}

/// In-memory server with two graduates waiting and one at the camera.
fn demo_backend() -> (MockBackend, MockBackendHandle) {
    let (backend, server) = MockBackend::new();
    server.seed_queue(vec![
        QueueEntry::new(Identity::new("1001", "Grace Hopper"), true),
        QueueEntry::new(Identity::new("1002", "Alan Turing"), false),
    ]);
    server.set_reading(
        StationId::CheckIn,
        CaptureMode::Face,
        Identity::new("2201", "Ada Lovelace"),
    );
    (backend, server)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let (backend, demo) = if cli.demo {
        let (backend, server) = demo_backend();
        (AnyBackend::Mock(backend), Some(server))
    } else {
        let backend = HttpBackend::new(HttpBackendConfig {
            base_url: config.server_url.clone(),
            timeout: config.request_timeout(),
        })?;
        (AnyBackend::Http(backend), None)
    };
    info!(backend = backend.kind(), "starting kiosk");

    let (kiosk, task) = spawn_coordinator(backend, config)?;
    if cli.station != StationId::CheckIn {
        kiosk
            .activate_station(cli.station, shell::default_mode(cli.station))
            .await?;
    }

    if cli.watch {
        let mut updates = kiosk.subscribe();
        tokio::spawn(async move {
            while updates.changed().await.is_ok() {
                let view = updates.borrow_and_update().clone();
                print!("{view}");
            }
        });
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = match line.parse::<Operator>() {
            Ok(operator) => shell::execute(operator, &kiosk, demo.as_ref()).await,
            Err(error) => Err(error),
        };
        match result {
            Ok(true) if !cli.watch => print!("{}", kiosk.view()),
            Ok(true) => {}
            Ok(false) => break,
            Err(error) => eprintln!("error: {error}"),
        }
    }

    kiosk.shutdown();
    task.await?;
    Ok(())
}
