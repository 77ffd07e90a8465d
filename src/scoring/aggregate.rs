//! Evidence aggregation: per-source stance judgments → four signals → one score.
//!
//! score = w_sr*SR + w_sm*SM + w_cc*CC + w_eq*EQ, clamped to [0,1].
//!
//! EQ is currently the same quantity as SR (mean per-item reliability) and stays a
//! separate response field.

use std::collections::HashSet;

use super::reliability::SourceReliability;
use crate::verdict::{clamp01, EvidenceItem, Signals};

/// Score reported when there is no evidence at all.
pub const EMPTY_SCORE: f64 = 0.35;

/// Number of distinct support/refute domains that saturates CC.
pub const CORROBORATION_SATURATION: f64 = 3.0;

/// Linear weights for the overall score.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SignalWeights {
    pub sr: f64,
    pub sm: f64,
    pub cc: f64,
    pub eq: f64,
}

impl SignalWeights {
    pub const DEFAULT: SignalWeights = SignalWeights {
        sr: 0.30,
        sm: 0.30,
        cc: 0.20,
        eq: 0.20,
    };

    /// Weighted sum, clamped to [0,1].
    pub fn combine(&self, s: &Signals) -> f64 {
        clamp01(s.sr * self.sr + s.sm * self.sm + s.cc * self.cc + s.eq * self.eq)
    }
}

impl Default for SignalWeights {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Aggregated signals (unrounded) and the overall score (unrounded).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aggregation {
    pub signals: Signals,
    pub score: f64,
}

impl Aggregation {
    pub fn empty() -> Self {
        Self {
            signals: Signals {
                sr: 0.0,
                cc: 0.0,
                sm: 0.5,
                eq: 0.0,
            },
            score: EMPTY_SCORE,
        }
    }
}

/// Aggregate with the default weights.
pub fn aggregate(items: &[EvidenceItem], reliability: &SourceReliability) -> Aggregation {
    aggregate_with_weights(items, reliability, &SignalWeights::DEFAULT)
}

/// Pure aggregation. Never fails; out-of-range or non-finite confidences are sanitized.
pub fn aggregate_with_weights(
    items: &[EvidenceItem],
    reliability: &SourceReliability,
    weights: &SignalWeights,
) -> Aggregation {
    if items.is_empty() {
        return Aggregation::empty();
    }
    let n = items.len() as f64;

    // SR: mean per-item reliability
    let sr = clamp01(items.iter().map(|e| reliability.score(&e.domain)).sum::<f64>() / n);

    // CC: distinct domains that take a side
    let relevant: HashSet<String> = items
        .iter()
        .filter(|e| e.stance.is_relevant())
        .map(|e| e.domain.trim().to_ascii_lowercase())
        .collect();
    let cc = (relevant.len() as f64 / CORROBORATION_SATURATION).min(1.0);

    // SM: signed confidence averaged over all items, rescaled from [-1,1] to [0,1]
    let raw = items
        .iter()
        .map(|e| e.stance.sign() * clamp01(e.confidence()))
        .sum::<f64>()
        / n;
    let sm = clamp01(0.5 + raw / 2.0);

    // EQ: same as SR for now
    let eq = sr;

    let signals = Signals { sr, cc, sm, eq };
    Aggregation {
        signals,
        score: weights.combine(&signals),
    }
}
