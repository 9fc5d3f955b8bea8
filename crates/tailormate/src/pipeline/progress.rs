use std::sync::Mutex;

use super::run::RunStep;
use crate::reconcile::ReconcileReport;

/// Events emitted while a run moves through its steps.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    Step { step: RunStep },
    Uploaded { documents: usize },
    Extracted { results: usize },
    Saved { report: ReconcileReport },
    Failed { error: String },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

/// Keeps every event, for callers that poll instead of subscribing.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl ProgressReporter for RecordingProgress {
    fn report(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
