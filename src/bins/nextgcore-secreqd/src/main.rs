//! NextGCore Security Mode Command stage
//!
//! Receives security context records from the MME over IPC, builds the
//! integrity protected NAS Security Mode Command, wraps it in an S1AP
//! Downlink NAS Transport and sends it to the eNB.

use std::path::PathBuf;

use anyhow::Result;
use bytes::Bytes;
use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub mod backoff;
pub mod config;
pub mod context;
pub mod ipc_path;
pub mod s1ap_path;
pub mod secreq;


use config::SecReqConfig;
use ipc_path::IpcReader;
use s1ap_path::{EnbConnectionTable, S1apListener};
use secreq::{SecReqSettings, SecReqStage, SecReqStats};

/// Inbound queue depth between the IPC reader and the stage
const SECREQ_QUEUE_SIZE: usize = 1024;

/// NextGCore Security Mode Command stage
#[derive(Parser, Debug)]
#[command(name = "nextgcore-secreqd")]
#[command(author = "NextGCore")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "MME Security Mode Command stage")]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/nextgcore/secreq.yaml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Disable color output
    #[arg(long)]
    no_color: bool,

    /// Run in daemon mode
    #[arg(short, long)]
    daemon: bool,
}

/// Security Mode Command application
pub struct SecReqApp {
    config: SecReqConfig,
    enb_table: EnbConnectionTable,
    listener_task: Option<JoinHandle<()>>,
    ipc_task: Option<JoinHandle<()>>,
    stage_task: Option<JoinHandle<SecReqStats>>,
}

impl SecReqApp {
    pub fn new(config: SecReqConfig) -> Self {
        Self {
            config,
            enb_table: EnbConnectionTable::new(),
            listener_task: None,
            ipc_task: None,
            stage_task: None,
        }
    }

    /// Open the eNB listener and the IPC socket and start the stage
    pub async fn init(&mut self) -> Result<()> {
        log::info!("Initializing Security Mode Command stage...");

        let listener = S1apListener::bind(self.config.s1ap.addr, self.enb_table.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind S1AP listener on {}: {}", self.config.s1ap.addr, e))?;
        self.listener_task = Some(tokio::spawn(listener.run()));

        let reader = IpcReader::bind(&self.config.ipc.path).map_err(|e| {
            anyhow::anyhow!("Failed to bind IPC socket {}: {}", self.config.ipc.path.display(), e)
        })?;

        let (tx, rx) = mpsc::channel::<Bytes>(SECREQ_QUEUE_SIZE);
        let settings = SecReqSettings::from(&self.config);
        log::info!(
            "NAS security: algorithms 0x{:02x}, KSI {}, S1AP length layout {:?}",
            settings.algorithms.octet(),
            settings.nas_security_param,
            settings.length_layout
        );
        let stage = SecReqStage::new(settings, self.enb_table.clone());
        self.stage_task = Some(tokio::spawn(stage.run(rx)));
        self.ipc_task = Some(tokio::spawn(reader.run(tx)));

        log::info!("Security Mode Command stage initialized successfully");
        Ok(())
    }

    /// Close the inbound channel, drain the stage and stop the listener
    pub async fn shutdown(&mut self) -> Option<SecReqStats> {
        log::info!("Shutting down Security Mode Command stage...");

        // Dropping the IPC reader drops the sender and ends the stage loop
        if let Some(ipc) = self.ipc_task.take() {
            ipc.abort();
            let _ = ipc.await;
        }

        let stats = match self.stage_task.take() {
            Some(stage) => match stage.await {
                Ok(stats) => Some(stats),
                Err(e) => {
                    log::error!("Stage task failed: {e}");
                    None
                }
            },
            None => None,
        };

        if let Some(listener) = self.listener_task.take() {
            listener.abort();
        }

        log::info!("Security Mode Command stage shutdown complete");
        stats
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => log::LevelFilter::Trace,
        "debug" => log::LevelFilter::Debug,
        "info" => log::LevelFilter::Info,
        "warn" => log::LevelFilter::Warn,
        "error" => log::LevelFilter::Error,
        _ => log::LevelFilter::Info,
    };

    let write_style = if args.no_color {
        env_logger::WriteStyle::Never
    } else {
        env_logger::WriteStyle::Auto
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .write_style(write_style)
        .format_timestamp_millis()
        .init();

    log::info!("NextGCore SECREQ v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Configuration: {}", args.config.display());
    if args.daemon {
        log::debug!("Daemon mode requested, staying in the foreground");
    }

    let config = SecReqConfig::load(&args.config)?;

    let mut app = SecReqApp::new(config);
    if let Err(e) = app.init().await {
        log::error!("{e}");
        return Err(e);
    }

    tokio::signal::ctrl_c().await?;
    log::info!("Received shutdown signal");

    app.shutdown().await;

    log::info!("NextGCore SECREQ terminated");
    Ok(())
}
