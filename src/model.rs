// src/model.rs
//! Pre-trained classifier artifact and the scoring gateway around it.
//!
//! The artifact is a JSON file holding the ordered feature schema and a
//! serialized GBDT ensemble with a binary-logistic objective, so predictions
//! are class-1 probabilities. It is loaded once at startup and immutable for
//! the lifetime of the process; a gateway cannot exist without one.
//!
//! The gbdt crate works in `f32` internally; probabilities cross the crate
//! boundary as `f64`.

use std::path::Path;

use anyhow::{Context, Result};
use gbdt::decision_tree::Data;
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};

use crate::schema::ModelSchema;

/// On-disk artifact: feature schema + serialized model.
#[derive(Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: ModelSchema,
    pub model: GBDT,
}

impl std::fmt::Debug for ModelArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelArtifact")
            .field("schema", &self.schema)
            .field("model", &"<GBDT>")
            .finish()
    }
}

impl ModelArtifact {
    /// Load the artifact from disk. Any failure here is fatal for the
    /// process: scoring must never run against an absent model.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading model artifact at {}", path.display()))?;
        Self::from_json(&raw)
            .with_context(|| format!("parsing model artifact at {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let artifact: ModelArtifact =
            serde_json::from_str(raw).context("model artifact is not valid JSON")?;
        Ok(artifact)
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("serializing model artifact")
    }
}

/// Scoring gateway over the loaded artifact.
///
/// Deterministic: a fixed artifact and fixed input always produce the same
/// probabilities, positionally aligned with the input rows.
pub struct ModelGateway {
    schema: ModelSchema,
    model: GBDT,
}

impl ModelGateway {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self {
            schema: artifact.schema,
            model: artifact.model,
        }
    }

    pub fn schema(&self) -> &ModelSchema {
        &self.schema
    }

    /// Class-1 probability per input row, in input order.
    pub fn score_batch(&self, rows: &[Vec<f32>]) -> Vec<f64> {
        if rows.is_empty() {
            return Vec::new();
        }
        let data: Vec<Data> = rows
            .iter()
            .map(|r| Data::new_test_data(r.clone(), None))
            .collect();
        self.model
            .predict(&data)
            .into_iter()
            .map(|p| (p as f64).clamp(0.0, 1.0))
            .collect()
    }

    /// Probability for a single assembled feature row.
    pub fn score_one(&self, row: &[f32]) -> f64 {
        self.score_batch(&[row.to_vec()]).first().copied().unwrap_or(0.0)
    }
}
