use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub(crate) const STEP_INGESTION: u8 = 1;
pub(crate) const STEP_ESTABLISHMENTS: u8 = 2;
pub(crate) const STEP_CLASSIFICATION: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
    Error,
}

/// Status update emitted while a computation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub step: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percent: Option<u8>,
    pub status: ProgressStatus,
}

impl ProgressEvent {
    pub fn in_progress(step: u8, message: impl Into<String>, percent: u8) -> Self {
        Self {
            step,
            message: message.into(),
            percent: Some(percent.min(100)),
            status: ProgressStatus::InProgress,
        }
    }

    pub fn completed(step: u8, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            percent: Some(100),
            status: ProgressStatus::Completed,
        }
    }

    pub fn error(step: u8, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
            percent: None,
            status: ProgressStatus::Error,
        }
    }
}

/// Listener for one computation's progress. Each computation gets its own sink.
pub trait ProgressSink: Send + Sync {
    fn publish(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn publish(&self, _event: ProgressEvent) {}
}

/// Records events in order and mirrors them to the tracing subscriber.
#[derive(Debug, Default)]
pub struct ProgressLog {
    events: Mutex<Vec<ProgressEvent>>,
}

impl ProgressLog {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn into_events(self) -> Vec<ProgressEvent> {
        self.events
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl ProgressSink for ProgressLog {
    fn publish(&self, event: ProgressEvent) {
        match event.status {
            ProgressStatus::Error => warn!(step = event.step, "{}", event.message),
            _ => info!(step = event.step, percent = ?event.percent, "{}", event.message),
        }

        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}
