pub mod config;
pub mod error;
pub mod progress;
pub mod run;
pub mod runner;
pub mod upload;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter, RecordingProgress};
pub use run::{IntakeRun, RunStep};
pub use runner::Pipeline;
