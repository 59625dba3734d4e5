// src/threshold.rs
//! Threshold resolution: reconciles the UI slider value with an optional
//! natural-language override ("usar 70%") into one effective cutoff.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 0.5;
pub const ENV_THRESHOLD: &str = "SIMULATOR_THRESHOLD";

/// First contiguous run of decimal digits anywhere in the text.
static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)").expect("digit-run regex"));

/// Which input won the resolution. Surfaced to the caller so the UI can show
/// "threshold adjusted via text" the way the slider/text split expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    Slider,
    FreeText,
}

/// Effective threshold plus the source that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResolution {
    pub value: f64,
    pub source: ThresholdSource,
}

impl ThresholdResolution {
    fn slider(value: f64) -> Self {
        Self {
            value,
            source: ThresholdSource::Slider,
        }
    }

    fn free_text(value: f64) -> Self {
        Self {
            value,
            source: ThresholdSource::FreeText,
        }
    }
}

/// Resolve the effective threshold.
///
/// The free text overrides the slider iff it contains a digit run that maps
/// to a percentage inside [0, 100]. Anything else (no digits, out of range)
/// silently keeps the slider value; ambiguity is not an error. Only the
/// first digit run is considered, so unrelated numbers in the text ("call me
/// in 2024") are indistinguishable from an intended value.
pub fn resolve(slider: f64, free_text: Option<&str>) -> ThresholdResolution {
    let text = match free_text {
        Some(t) if !t.trim().is_empty() => t,
        _ => return ThresholdResolution::slider(slider),
    };

    let digits = match DIGIT_RUN.find(text) {
        Some(m) => m.as_str(),
        None => return ThresholdResolution::slider(slider),
    };

    // A run too long for u64 is necessarily > 100, i.e. out of range.
    match digits.parse::<u64>() {
        Ok(d) if d <= 100 => ThresholdResolution::free_text(d as f64 / 100.0),
        _ => ThresholdResolution::slider(slider),
    }
}

/// Parse an optional float from the environment and clamp it to [0, 1].
/// Used for the `SIMULATOR_THRESHOLD` default override.
pub fn parse_threshold_env(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
        .map(|v| v.clamp(0.0, 1.0))
}
