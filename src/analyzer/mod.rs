//! Analyzer module - anomaly detection engine

pub mod detectors;
pub mod engine;
pub mod severity;
pub mod stats;

pub use engine::{AggregateStats, AnalysisEngine};
pub use severity::classify;
