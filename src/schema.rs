// src/schema.rs
//! Feature schema owned by the model artifact, and the fixed manual-entry
//! record used by the online form.

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Ordered list of the feature columns the classifier consumes.
///
/// The order is the training order and must match the artifact; batch and
/// manual inputs are both assembled into rows following this order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSchema {
    pub features: Vec<String>,
}

impl ModelSchema {
    pub fn new<I, S>(features: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            features: features.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(String::as_str)
    }
}

/// One manually entered customer record.
///
/// The field set is fixed by the online form; serde names follow the model's
/// original column names so a serialized record matches an uploaded CSV row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualRecord {
    #[serde(rename = "Income")]
    pub income: f64,
    #[serde(rename = "Recency")]
    pub recency: i64,
    #[serde(rename = "Kidhome")]
    pub kidhome: i64,
    #[serde(rename = "Teenhome")]
    pub teenhome: i64,
    #[serde(rename = "MntWines")]
    pub mnt_wines: i64,
    #[serde(rename = "MntFruits")]
    pub mnt_fruits: i64,
    #[serde(rename = "MntGoldProds")]
    pub mnt_gold_prods: i64,
}

impl ManualRecord {
    /// Boundary validation mirroring the form controls: Income non-negative,
    /// Recency 0..=100, Kidhome/Teenhome 0..=2, spend fields 0..=1000.
    pub fn validate(&self) -> Result<()> {
        if !self.income.is_finite() || self.income < 0.0 {
            bail!("Income must be a non-negative number, got {}", self.income);
        }
        if !(0..=100).contains(&self.recency) {
            bail!("Recency must be in 0..=100, got {}", self.recency);
        }
        for (name, v) in [("Kidhome", self.kidhome), ("Teenhome", self.teenhome)] {
            if !(0..=2).contains(&v) {
                bail!("{name} must be 0, 1 or 2, got {v}");
            }
        }
        for (name, v) in [
            ("MntWines", self.mnt_wines),
            ("MntFruits", self.mnt_fruits),
            ("MntGoldProds", self.mnt_gold_prods),
        ] {
            if !(0..=1000).contains(&v) {
                bail!("{name} must be in 0..=1000, got {v}");
            }
        }
        Ok(())
    }

    /// Value for a named feature, if the form carries it.
    pub fn feature(&self, name: &str) -> Option<f64> {
        let v = match name {
            "Income" => self.income,
            "Recency" => self.recency as f64,
            "Kidhome" => self.kidhome as f64,
            "Teenhome" => self.teenhome as f64,
            "MntWines" => self.mnt_wines as f64,
            "MntFruits" => self.mnt_fruits as f64,
            "MntGoldProds" => self.mnt_gold_prods as f64,
            _ => return None,
        };
        Some(v)
    }

    /// Assemble the record into a model feature row following the schema
    /// order. Fails if the artifact expects a feature the form does not
    /// provide (an artifact/form mismatch, not a user error).
    pub fn to_feature_row(&self, schema: &ModelSchema) -> Result<Vec<f32>> {
        let mut row = Vec::with_capacity(schema.len());
        for name in schema.names() {
            match self.feature(name) {
                Some(v) => row.push(v as f32),
                None => bail!("model expects feature `{name}` which the manual form does not provide"),
            }
        }
        Ok(row)
    }
}
