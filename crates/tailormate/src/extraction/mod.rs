pub mod client;
pub mod types;

pub use client::{build_http_client, ExtractionClient, Extractor};
pub use types::{
    coerce_measurement, ExtractionResult, LeafValue, MeasurementSection, Measurements,
    OrderItemDraft, StructuredFields,
};
