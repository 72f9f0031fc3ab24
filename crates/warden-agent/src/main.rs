//! logwarden: records session logon/logoff events to one file per user.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_agent::lifecycle::{AutostartRegistrar, PidFileGuard};
use warden_agent::Config;
use warden_source::JournalEventSource;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let executable = std::env::current_exe().unwrap_or_else(|_| PathBuf::from("logwarden"));
    let executable_name = executable
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "logwarden".to_string());
    warden_agent::prepare_host(
        &PidFileGuard::new(&config.pid_file, executable_name),
        &AutostartRegistrar::new(&config.autostart_dir, "logwarden"),
        &executable,
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
                cancel.cancel();
            }
        });
    }

    let source = JournalEventSource::new(&config.journal_dir);
    if let Err(e) = warden_agent::run(&config, &source, cancel).await {
        tracing::error!(error = %e, "cannot start monitoring");
        return Err(e.into());
    }
    Ok(())
}
