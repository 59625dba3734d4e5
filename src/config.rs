// src/config.rs
//! Application configuration: TOML file with env overrides.
//!
//! Load order: `SIMULATOR_CONFIG_PATH` if set, else `config/simulator.toml`;
//! a missing file falls back to built-in defaults, a malformed file is an
//! error. `SIMULATOR_THRESHOLD` overrides the default threshold (clamped to
//! [0, 1]) after the file is read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::report::DEFAULT_HISTOGRAM_BINS;
use crate::threshold::{parse_threshold_env, DEFAULT_THRESHOLD, ENV_THRESHOLD};

pub const DEFAULT_CONFIG_PATH: &str = "config/simulator.toml";
pub const ENV_CONFIG_PATH: &str = "SIMULATOR_CONFIG_PATH";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub scoring: ScoringConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub default_threshold: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub histogram_bins: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("models/conversion_model.json"),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            default_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            scoring: ScoringConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load using the env path override, the default path, or defaults when
    /// no file exists, then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = std::env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_path(&path)?
        } else {
            Self::default()
        };

        if let Some(t) = parse_threshold_env(std::env::var(ENV_THRESHOLD).ok()) {
            cfg.scoring.default_threshold = t;
        } else if !cfg.scoring.default_threshold.is_finite() {
            cfg.scoring.default_threshold = DEFAULT_THRESHOLD;
        }
        cfg.scoring.default_threshold = cfg.scoring.default_threshold.clamp(0.0, 1.0);
        cfg.report.histogram_bins = cfg.report.histogram_bins.max(1);

        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config at {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing config at {}", path.display()))
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(raw)?;
        Ok(cfg)
    }
}
