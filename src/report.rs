// src/report.rs
//! Batch report assembly: summary counts, the row-level projection, and the
//! per-feature distributional comparison split by decision class.
//!
//! Pure aggregation over already-scored data. The page renders these
//! numbers; nothing here touches I/O or the model, so the whole report is a
//! deterministic function of (batch, probabilities, decisions, threshold).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::batch::RecordBatch;
use crate::decision::{DecisionCounts, Label};
use crate::threshold::ThresholdResolution;

pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Row projection selector: the full original feature set plus the scoring
/// columns, or the scoring columns alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Full,
    PredictionsOnly,
}

/// One scored row as shown in the table. `values` flattens into the object,
/// so the predictions-only view serializes just probability and decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportRow {
    #[serde(flatten)]
    pub values: Map<String, Value>,
    pub probability: f64,
    pub decision: Label,
}

/// Five-number summary with 1.5·IQR whiskers, quartiles by linear
/// interpolation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub lower_whisker: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

impl BoxStats {
    /// None for an empty value set (the corresponding plot stays empty).
    /// Non-finite values must already be filtered out by the caller.
    fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("finite values"));

        let q1 = quantile(&sorted, 0.25);
        let median = quantile(&sorted, 0.5);
        let q3 = quantile(&sorted, 0.75);
        let iqr = q3 - q1;
        let lo_fence = q1 - 1.5 * iqr;
        let hi_fence = q3 + 1.5 * iqr;

        // Whiskers sit on the extreme data points inside the fences.
        let lower_whisker = sorted
            .iter()
            .copied()
            .find(|v| *v >= lo_fence)
            .unwrap_or(sorted[0]);
        let upper_whisker = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= hi_fence)
            .unwrap_or(sorted[sorted.len() - 1]);
        let outliers = sorted
            .iter()
            .copied()
            .filter(|v| *v < lower_whisker || *v > upper_whisker)
            .collect();

        Some(Self {
            min: sorted[0],
            q1,
            median,
            q3,
            max: sorted[sorted.len() - 1],
            lower_whisker,
            upper_whisker,
            outliers,
        })
    }
}

/// Distribution of one feature within one decision class.
///
/// `density` is a histogram over the comparison's shared bin edges,
/// normalized as count/(n·bin_width), so the two class curves are on the
/// same density scale regardless of group sizes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupDistribution {
    pub count: usize,
    #[serde(rename = "box")]
    pub box_stats: Option<BoxStats>,
    pub density: Vec<f64>,
}

impl GroupDistribution {
    fn empty(bins: usize) -> Self {
        Self {
            count: 0,
            box_stats: None,
            density: vec![0.0; bins],
        }
    }
}

/// Two-class comparison for one numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureComparison {
    pub feature: String,
    /// Shared bin edges, length = bins + 1. Empty when the feature carries
    /// no usable values (the plots degenerate to empty).
    pub bin_edges: Vec<f64>,
    pub negative: GroupDistribution,
    pub positive: GroupDistribution,
}

/// Everything the page needs to render one scored batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub threshold: ThresholdResolution,
    pub view: ViewMode,
    pub counts: DecisionCounts,
    pub rows: Vec<ReportRow>,
    pub features: Vec<FeatureComparison>,
}

/// Report assembly, configured once (bin count) and reused per request.
#[derive(Debug, Clone, Copy)]
pub struct ReportBuilder {
    pub histogram_bins: usize,
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self {
            histogram_bins: DEFAULT_HISTOGRAM_BINS,
        }
    }
}

impl ReportBuilder {
    pub fn new(histogram_bins: usize) -> Self {
        Self {
            histogram_bins: histogram_bins.max(1),
        }
    }

    /// Assemble the report. `probabilities` and `decisions` are positionally
    /// aligned with the batch rows; an empty batch degenerates to zero
    /// counts, no rows and no feature comparisons.
    pub fn build(
        &self,
        batch: &RecordBatch,
        probabilities: &[f64],
        decisions: &[Label],
        threshold: ThresholdResolution,
        view: ViewMode,
    ) -> Report {
        debug_assert_eq!(batch.len(), probabilities.len());
        debug_assert_eq!(batch.len(), decisions.len());

        let counts = DecisionCounts::from_decisions(decisions);

        let rows = (0..batch.len())
            .map(|i| ReportRow {
                values: match view {
                    ViewMode::Full => batch.row_values(i),
                    ViewMode::PredictionsOnly => Map::new(),
                },
                probability: probabilities[i],
                decision: decisions[i],
            })
            .collect();

        let features = batch
            .numeric_columns()
            .map(|(name, values)| self.compare_feature(name, values, decisions))
            .collect();

        Report {
            threshold,
            view,
            counts,
            rows,
            features,
        }
    }

    fn compare_feature(
        &self,
        name: &str,
        values: &[f64],
        decisions: &[Label],
    ) -> FeatureComparison {
        let mut neg = Vec::new();
        let mut pos = Vec::new();
        for (v, d) in values.iter().zip(decisions) {
            if !v.is_finite() {
                continue;
            }
            match d {
                Label::Negative => neg.push(*v),
                Label::Positive => pos.push(*v),
            }
        }

        let combined_min = neg.iter().chain(&pos).copied().fold(f64::INFINITY, f64::min);
        let combined_max = neg
            .iter()
            .chain(&pos)
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);

        if neg.is_empty() && pos.is_empty() {
            // Nothing usable in this column: empty plots, not an error.
            return FeatureComparison {
                feature: name.to_string(),
                bin_edges: Vec::new(),
                negative: GroupDistribution::empty(0),
                positive: GroupDistribution::empty(0),
            };
        }

        let bin_edges = bin_edges(combined_min, combined_max, self.histogram_bins);
        FeatureComparison {
            feature: name.to_string(),
            negative: group_distribution(&neg, &bin_edges),
            positive: group_distribution(&pos, &bin_edges),
            bin_edges,
        }
    }
}

/// Equal-width edges over [min, max]; a degenerate range (all values equal)
/// gets one unit-width bin centred on the value so densities stay finite.
fn bin_edges(min: f64, max: f64, bins: usize) -> Vec<f64> {
    if max <= min {
        return vec![min - 0.5, min + 0.5];
    }
    let width = (max - min) / bins as f64;
    (0..=bins).map(|i| min + width * i as f64).collect()
}

fn group_distribution(values: &[f64], edges: &[f64]) -> GroupDistribution {
    let bins = edges.len().saturating_sub(1);
    if values.is_empty() {
        return GroupDistribution::empty(bins);
    }

    let min = edges[0];
    let max = edges[bins];
    let width = (max - min) / bins as f64;

    let mut hist = vec![0usize; bins];
    for &v in values {
        // Rightmost edge is inclusive, matching the usual histogram rule.
        let idx = (((v - min) / width) as usize).min(bins - 1);
        hist[idx] += 1;
    }

    let n = values.len() as f64;
    let density = hist.iter().map(|&c| c as f64 / (n * width)).collect();

    GroupDistribution {
        count: values.len(),
        box_stats: BoxStats::from_values(values),
        density,
    }
}

/// Quantile with linear interpolation between order statistics.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
