//! Missing values: score cells with nothing usable in them.

use super::Detector;
use crate::{AnomalyKind, AnomalyRecord, AnomalyValue, Dataset, Severity};

/// Flags every empty or non-numeric cell of the target columns. Missing data
/// is always reported at High severity.
#[derive(Default)]
pub struct MissingValueDetector;

impl MissingValueDetector {
    pub fn new() -> Self {
        Self
    }
}

impl Detector for MissingValueDetector {
    fn name(&self) -> &'static str {
        "missing-value"
    }

    fn detect(&self, dataset: &Dataset, columns: &[&str]) -> Vec<AnomalyRecord> {
        let mut anomalies = Vec::new();
        for &column in columns {
            for record in dataset.records() {
                if record.score(column).is_some() {
                    continue;
                }
                anomalies.push(AnomalyRecord {
                    student_id: record.student_id.clone(),
                    class_id: record.class_id.clone(),
                    column: column.to_string(),
                    value: AnomalyValue::Missing,
                    kind: AnomalyKind::MissingValue,
                    severity: Severity::High,
                    explanation: format!("This student has no recorded score in column '{column}'."),
                });
            }
        }
        anomalies
    }
}
