//! Wiring: host preparation, monitor construction and the run entry point.

use crate::config::Config;
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use warden_monitor::{MonitorError, SessionMonitor};
use warden_store::FileRecordStore;
use warden_types::{EventSource, InstanceGuard, StartupRegistrar};

/// Single-instance check and startup registration. Failures are logged and never stop the agent.
pub fn prepare_host(
    guard: &dyn InstanceGuard,
    registrar: &dyn StartupRegistrar,
    executable: &Path,
) {
    match guard.ensure_single_instance() {
        Ok(report) if report.terminated.is_empty() => tracing::info!("single instance ensured"),
        Ok(report) => tracing::info!(
            terminated = ?report.terminated,
            "single instance ensured"
        ),
        Err(e) => tracing::warn!(error = %e, "single-instance check failed; continuing"),
    }
    match registrar.register(executable) {
        Ok(outcome) => tracing::info!(?outcome, "startup registration"),
        Err(e) => tracing::warn!(error = %e, "startup registration failed; continuing"),
    }
}

/// Monitor writing into `config.log_directory` with the configured policies.
pub fn build_monitor(config: &Config) -> SessionMonitor {
    SessionMonitor::new(
        config.monitor_config(),
        Arc::new(config.classifier()),
        Arc::new(config.identity_policy.clone()),
        Arc::new(FileRecordStore::new(&config.log_directory)),
    )
}

/// Monitor `source` until `cancel` fires. Errors only if the source cannot be opened.
pub async fn run(
    config: &Config,
    source: &dyn EventSource,
    cancel: CancellationToken,
) -> Result<(), MonitorError> {
    let monitor = build_monitor(config);
    tracing::info!(
        log_directory = %config.log_directory.display(),
        identity_policy = ?config.identity_policy,
        "session monitor initialized"
    );
    monitor.run(source, cancel).await
}
