//! Scripted event source for tests: replays batches and failures, records when each read happened.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::time::Instant;
use warden_types::{EventHandle, EventSource, EventSourceError, RawEvent, ReadDirection};

enum Step {
    Batch(Vec<RawEvent>),
    Fail(String),
    Stall,
}

#[derive(Default)]
struct Shared {
    script: VecDeque<Step>,
    reads: Vec<Instant>,
    open_error: Option<String>,
}

/// Source whose reads follow a script. Once the script runs out every read returns an empty batch.
///
/// Clones share the same script and read log.
#[derive(Clone, Default)]
pub struct ScriptedEventSource {
    shared: Arc<Mutex<Shared>>,
}

impl ScriptedEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Make `open` fail with the given reason.
    pub fn failing_open(self, reason: impl Into<String>) -> Self {
        self.lock().open_error = Some(reason.into());
        self
    }

    pub fn push_batch(&self, events: Vec<RawEvent>) -> &Self {
        self.lock().script.push_back(Step::Batch(events));
        self
    }

    pub fn push_failure(&self, reason: impl Into<String>) -> &Self {
        self.lock().script.push_back(Step::Fail(reason.into()));
        self
    }

    /// Next read never completes.
    pub fn push_stall(&self) -> &Self {
        self.lock().script.push_back(Step::Stall);
        self
    }

    /// Instants at which reads started.
    pub fn read_instants(&self) -> Vec<Instant> {
        self.lock().reads.clone()
    }

    pub fn read_count(&self) -> usize {
        self.lock().reads.len()
    }
}

#[async_trait]
impl EventSource for ScriptedEventSource {
    async fn open(&self, source_name: &str) -> Result<Box<dyn EventHandle>, EventSourceError> {
        if let Some(reason) = self.lock().open_error.clone() {
            return Err(EventSourceError::Open {
                name: source_name.to_string(),
                reason,
            });
        }
        Ok(Box::new(self.clone()))
    }
}

#[async_trait]
impl EventHandle for ScriptedEventSource {
    async fn read(&mut self, _direction: ReadDirection) -> Result<Vec<RawEvent>, EventSourceError> {
        let step = {
            let mut shared = self.lock();
            shared.reads.push(Instant::now());
            shared.script.pop_front()
        };
        match step {
            Some(Step::Batch(events)) => Ok(events),
            Some(Step::Fail(reason)) => Err(EventSourceError::Read(reason)),
            Some(Step::Stall) => std::future::pending().await,
            None => Ok(Vec::new()),
        }
    }
}
