// src/decision.rs
//! Binary decision types and the elementwise threshold compare.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Binary class decision. On the wire this is the integer 0 or 1, matching
/// the tabular output consumed by the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    /// `Positive` iff `probability >= threshold`.
    pub fn from_probability(probability: f64, threshold: f64) -> Self {
        if probability >= threshold {
            Label::Positive
        } else {
            Label::Negative
        }
    }

    pub fn as_bit(self) -> u8 {
        match self {
            Label::Negative => 0,
            Label::Positive => 1,
        }
    }

    pub fn is_positive(self) -> bool {
        matches!(self, Label::Positive)
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.as_bit())
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(Label::Negative),
            1 => Ok(Label::Positive),
            other => Err(D::Error::custom(format!("decision must be 0 or 1, got {other}"))),
        }
    }
}

/// Apply one threshold to a probability sequence, elementwise.
///
/// Pure; output is positionally aligned with the input and has the same
/// length. Elements are independent of each other.
pub fn decide(probabilities: &[f64], threshold: f64) -> Vec<Label> {
    probabilities
        .iter()
        .map(|&p| Label::from_probability(p, threshold))
        .collect()
}

/// How many records landed on each side of the cutoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCounts {
    pub positive: usize,
    pub negative: usize,
    pub total: usize,
}

impl DecisionCounts {
    pub fn from_decisions(decisions: &[Label]) -> Self {
        let positive = decisions.iter().filter(|d| d.is_positive()).count();
        Self {
            positive,
            negative: decisions.len() - positive,
            total: decisions.len(),
        }
    }
}

/// Outcome of scoring one manually entered record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub probability: f64,
    pub decision: Label,
}

impl Verdict {
    pub fn new(probability: f64, threshold: f64) -> Self {
        Self {
            probability,
            decision: Label::from_probability(probability, threshold),
        }
    }
}
