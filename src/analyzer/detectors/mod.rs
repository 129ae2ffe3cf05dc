//! Anomaly detectors

pub mod inter_student;
pub mod intra_student;
pub mod missing_value;

pub use inter_student::InterStudentDetector;
pub use intra_student::IntraStudentDetector;
pub use missing_value::MissingValueDetector;

use crate::{AnomalyRecord, Dataset};

/// Trait for anomaly detectors. Detectors read the dataset and never mutate
/// it, so any set of them can run in any order.
pub trait Detector {
    /// Name of the detector
    fn name(&self) -> &'static str;

    /// Scan `columns` of `dataset` and return the anomalies found, in order
    fn detect(&self, dataset: &Dataset, columns: &[&str]) -> Vec<AnomalyRecord>;
}
