//! Poll loop: open the source once, then read, dedup, classify, extract and append until cancelled.

use crate::DedupWindow;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use warden_types::{
    EventClassifier, EventHandle, EventSource, EventSourceError, IdentityExtractor, LogRecord,
    RawEvent, ReadDirection, RecordStore, SessionAction,
};

/// Tunables for [`SessionMonitor`].
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Name passed to [`EventSource::open`].
    pub source_name: String,
    /// Sleep after every completed poll, empty or not.
    pub poll_interval: Duration,
    /// Sleep after a failed or timed out read.
    pub backoff: Duration,
    /// Upper bound on a single read.
    pub read_timeout: Duration,
    pub read_direction: ReadDirection,
    /// `None` keeps every processed id for the process lifetime.
    pub dedup_trailing_window: Option<u64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            source_name: "Security".to_string(),
            poll_interval: Duration::from_secs(10),
            backoff: Duration::from_secs(15),
            read_timeout: Duration::from_secs(30),
            read_direction: ReadDirection::Backwards,
            dedup_trailing_window: None,
        }
    }
}

/// Counts for one poll.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollOutcome {
    pub read: usize,
    pub duplicates: usize,
    pub ignored: usize,
    pub written: usize,
    pub failed: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("startup failure: {0}")]
    Startup(#[source] EventSourceError),
}

/// Drives one event source into one record store.
pub struct SessionMonitor {
    config: MonitorConfig,
    classifier: Arc<dyn EventClassifier>,
    extractor: Arc<dyn IdentityExtractor>,
    store: Arc<dyn RecordStore>,
}

impl SessionMonitor {
    pub fn new(
        config: MonitorConfig,
        classifier: Arc<dyn EventClassifier>,
        extractor: Arc<dyn IdentityExtractor>,
        store: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            config,
            classifier,
            extractor,
            store,
        }
    }

    /// Fresh dedup window per the configured bound.
    pub fn new_window(&self) -> DedupWindow {
        match self.config.dedup_trailing_window {
            Some(trailing) => DedupWindow::bounded(trailing),
            None => DedupWindow::unbounded(),
        }
    }

    /// Run until `cancel` fires.
    ///
    /// Only a failure to open the source is returned. Read failures back off and retry forever;
    /// write failures drop the affected record.
    pub async fn run(
        &self,
        source: &dyn EventSource,
        cancel: CancellationToken,
    ) -> Result<(), MonitorError> {
        let mut handle = source
            .open(&self.config.source_name)
            .await
            .map_err(MonitorError::Startup)?;
        tracing::info!(source = %self.config.source_name, "event source opened");

        let mut dedup = self.new_window();
        tracing::info!(
            "monitoring session events every {:?} (backoff {:?})",
            self.config.poll_interval,
            self.config.backoff
        );

        while !cancel.is_cancelled() {
            let pause = match self.poll_once(handle.as_mut(), &mut dedup).await {
                Ok(outcome) => {
                    if outcome.read > 0 {
                        tracing::debug!(?outcome, watermark = ?dedup.watermark(), "poll complete");
                    }
                    self.config.poll_interval
                }
                Err(e) => {
                    tracing::warn!(error = %e, "event source read failed; retrying in {:?}", self.config.backoff);
                    self.config.backoff
                }
            };
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        tracing::info!("session monitor stopped");
        Ok(())
    }

    /// Read one batch and process it in source order.
    pub async fn poll_once(
        &self,
        handle: &mut dyn EventHandle,
        dedup: &mut DedupWindow,
    ) -> Result<PollOutcome, EventSourceError> {
        let timeout = self.config.read_timeout;
        let events = tokio::time::timeout(timeout, handle.read(self.config.read_direction))
            .await
            .map_err(|_| EventSourceError::Timeout(timeout))??;

        let mut outcome = PollOutcome {
            read: events.len(),
            ..PollOutcome::default()
        };
        for event in &events {
            self.process(event, dedup, &mut outcome).await;
        }
        dedup.commit();
        Ok(outcome)
    }

    async fn process(&self, event: &RawEvent, dedup: &mut DedupWindow, outcome: &mut PollOutcome) {
        if !dedup.insert(event.record_id) {
            outcome.duplicates += 1;
            return;
        }
        let action = self.classifier.classify(event.event_code);
        if action == SessionAction::Ignored {
            outcome.ignored += 1;
            return;
        }
        let principal = self.extractor.extract(&event.string_fields);
        let record = LogRecord::new(principal, action, Local::now());
        match self.store.append(&record).await {
            Ok(()) => {
                tracing::debug!(record_id = event.record_id, principal = %record.principal, "{}", action);
                outcome.written += 1;
            }
            Err(e) => {
                tracing::warn!(
                    record_id = event.record_id,
                    principal = %record.principal,
                    error = %e,
                    "dropping session record"
                );
                outcome.failed += 1;
            }
        }
    }
}
