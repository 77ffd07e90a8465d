// src/scoring/mod.rs
//! Evidence scoring: source reliability, signal aggregation and education tips.

pub mod aggregate;
pub mod education;
pub mod reliability;

// Re-export convenient types.
pub use crate::scoring::aggregate::{aggregate, aggregate_with_weights, Aggregation, SignalWeights};
pub use crate::scoring::reliability::SourceReliability;
