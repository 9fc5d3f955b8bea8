//! One intake run: the batch, the extraction results under review and the
//! step the run is in.
//!
//! ```text
//! Upload ──process──▶ Processing ──ok──▶ Review ──save──▶ Saving ──ok──▶ Done
//!   ▲                     │                ▲                  │
//!   └──────failure────────┘                └─────failure──────┘
//! ```
//!
//! `reset` returns to an empty `Upload` from any step.

use std::fmt;

use serde::Serialize;
use tracing::{info_span, warn, Instrument};
use uuid::Uuid;

use super::error::PipelineError;
use super::progress::{ProgressEvent, ProgressReporter};
use super::runner::Pipeline;
use crate::extraction::ExtractionResult;
use crate::intake::{IntakeBatch, SelectedFile};
use crate::reconcile::{IntakeKind, ReconcileReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStep {
    Upload,
    Processing,
    Review,
    Saving,
    Done,
}

impl RunStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStep::Upload => "upload",
            RunStep::Processing => "processing",
            RunStep::Review => "review",
            RunStep::Saving => "saving",
            RunStep::Done => "done",
        }
    }
}

impl fmt::Display for RunStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct IntakeRun {
    kind: IntakeKind,
    step: RunStep,
    batch: IntakeBatch,
    results: Vec<ExtractionResult>,
    error: Option<String>,
    report: Option<ReconcileReport>,
}

impl IntakeRun {
    pub fn new(kind: IntakeKind, preview_max_edge: u32) -> Self {
        Self {
            kind,
            step: RunStep::Upload,
            batch: IntakeBatch::new(preview_max_edge),
            results: Vec::new(),
            error: None,
            report: None,
        }
    }

    /// A run using the pipeline's preview settings.
    pub fn for_pipeline(kind: IntakeKind, pipeline: &Pipeline) -> Self {
        Self::new(kind, pipeline.config().preview_max_edge)
    }

    pub fn kind(&self) -> IntakeKind {
        self.kind
    }

    pub fn step(&self) -> RunStep {
        self.step
    }

    pub fn batch(&self) -> &IntakeBatch {
        &self.batch
    }

    /// Message of the last failure, cleared when the next step starts.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn results(&self) -> &[ExtractionResult] {
        &self.results
    }

    /// Results open for correction before saving.
    pub fn results_mut(&mut self) -> Result<&mut Vec<ExtractionResult>, PipelineError> {
        self.expect_step(RunStep::Review, "edit results")?;
        Ok(&mut self.results)
    }

    pub fn report(&self) -> Option<&ReconcileReport> {
        self.report.as_ref()
    }

    pub fn add_files<I>(&mut self, selection: I) -> Result<Vec<Uuid>, PipelineError>
    where
        I: IntoIterator<Item = SelectedFile>,
    {
        self.expect_step(RunStep::Upload, "add files")?;
        Ok(self.batch.add_files(selection))
    }

    pub fn remove_file(&mut self, id: Uuid) -> Result<bool, PipelineError> {
        self.expect_step(RunStep::Upload, "remove files")?;
        Ok(self.batch.remove(id))
    }

    /// Uploads the batch and extracts it. On success the run is in
    /// `Review`; on failure it is back in `Upload` with no storage paths.
    pub async fn process(
        &mut self,
        pipeline: &Pipeline,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        self.expect_step(RunStep::Upload, "process documents")?;
        self.error = None;
        self.enter(RunStep::Processing, progress);

        let span = info_span!(
            "intake_run",
            kind = self.kind.as_str(),
            documents = self.batch.len()
        );
        let outcome = self
            .upload_and_extract(pipeline, progress)
            .instrument(span)
            .await;

        match outcome {
            Ok(results) => {
                progress.report(ProgressEvent::Extracted {
                    results: results.len(),
                });
                self.results = results;
                self.enter(RunStep::Review, progress);
                Ok(())
            }
            Err(e) => {
                self.batch.clear_storage_paths();
                self.fail(&e, RunStep::Upload, progress);
                Err(e)
            }
        }
    }

    async fn upload_and_extract(
        &mut self,
        pipeline: &Pipeline,
        progress: &dyn ProgressReporter,
    ) -> Result<Vec<ExtractionResult>, PipelineError> {
        if self.batch.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }
        let session = pipeline.session().await?;

        pipeline.upload(&session, self.kind, &mut self.batch).await?;
        progress.report(ProgressEvent::Uploaded {
            documents: self.batch.len(),
        });

        pipeline.extract(&session, &self.batch).await
    }

    /// Saves the reviewed results. On success the run is `Done`; on failure
    /// it is back in `Review` and rows written before the failure remain.
    pub async fn save(
        &mut self,
        pipeline: &Pipeline,
        progress: &dyn ProgressReporter,
    ) -> Result<ReconcileReport, PipelineError> {
        self.expect_step(RunStep::Review, "save results")?;
        self.error = None;
        self.enter(RunStep::Saving, progress);

        let span = info_span!(
            "intake_save",
            kind = self.kind.as_str(),
            results = self.results.len()
        );
        let outcome = async {
            let actor = pipeline.actor().await?;
            pipeline
                .reconcile(&actor, self.kind, &self.results, self.batch.documents())
                .await
        }
        .instrument(span)
        .await;

        match outcome {
            Ok(report) => {
                progress.report(ProgressEvent::Saved {
                    report: report.clone(),
                });
                self.report = Some(report.clone());
                self.enter(RunStep::Done, progress);
                Ok(report)
            }
            Err(e) => {
                self.fail(&e, RunStep::Review, progress);
                Err(e)
            }
        }
    }

    /// Drops the batch, results and error and starts over.
    pub fn reset(&mut self) {
        self.batch.clear();
        self.results.clear();
        self.error = None;
        self.report = None;
        self.step = RunStep::Upload;
    }

    fn expect_step(&self, expected: RunStep, action: &'static str) -> Result<(), PipelineError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(PipelineError::InvalidStep {
                action,
                step: self.step,
            })
        }
    }

    fn enter(&mut self, step: RunStep, progress: &dyn ProgressReporter) {
        self.step = step;
        progress.report(ProgressEvent::Step { step });
    }

    fn fail(&mut self, error: &PipelineError, back_to: RunStep, progress: &dyn ProgressReporter) {
        let message = error.to_string();
        warn!(step = %self.step, error = %message, "Intake run failed");
        progress.report(ProgressEvent::Failed {
            error: message.clone(),
        });
        self.error = Some(message);
        self.enter(back_to, progress);
    }
}
