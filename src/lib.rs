// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod api;
pub mod batch;
pub mod config;
pub mod decision;
pub mod metrics;
pub mod model;
pub mod report;
pub mod schema;
pub mod threshold;

// ---- Re-exports for stable public API ----
pub use crate::api::{router, AppState};
pub use crate::batch::RecordBatch;
pub use crate::decision::{decide, DecisionCounts, Label, Verdict};
pub use crate::model::{ModelArtifact, ModelGateway};
pub use crate::report::{Report, ReportBuilder, ViewMode};
pub use crate::schema::{ManualRecord, ModelSchema};
pub use crate::threshold::{resolve, ThresholdResolution, ThresholdSource};
