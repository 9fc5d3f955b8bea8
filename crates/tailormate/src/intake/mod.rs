//! Intake collection: the documents of one run and their previews.

pub mod collector;
pub mod preview;

pub use collector::{IntakeBatch, SelectedFile, UploadedDocument};
pub use preview::{build_preview, Preview};
