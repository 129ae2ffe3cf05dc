//! Intra-student deviations: one subject far from the student's own average.

use super::Detector;
use crate::analyzer::severity::classify;
use crate::analyzer::stats::SampleStats;
use crate::{AnomalyKind, AnomalyRecord, AnomalyValue, Dataset, Threshold};

/// Minimum number of scored subjects for a personal baseline
const MIN_SUBJECTS: usize = 3;

/// Flags subjects whose score stands out against the same student's other
/// subjects. Only meaningful when the columns share one scale (subject averages).
pub struct IntraStudentDetector {
    threshold: Threshold,
}

impl IntraStudentDetector {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }
}

impl Default for IntraStudentDetector {
    fn default() -> Self {
        Self::new(Threshold::default())
    }
}

impl Detector for IntraStudentDetector {
    fn name(&self) -> &'static str {
        "intra-student"
    }

    fn detect(&self, dataset: &Dataset, columns: &[&str]) -> Vec<AnomalyRecord> {
        let t = self.threshold.value();
        let mut anomalies = Vec::new();

        for record in dataset.records() {
            let scored: Vec<(&str, f64)> = columns
                .iter()
                .filter_map(|&col| record.score(col).map(|v| (col, v)))
                .collect();
            if scored.len() < MIN_SUBJECTS {
                continue;
            }

            let values: Vec<f64> = scored.iter().map(|(_, v)| *v).collect();
            let Some(stats) = SampleStats::from_values(&values) else { continue };
            if !stats.has_spread() {
                log::debug!("{}: uniform subject scores, skipping", record.student_id);
                continue;
            }

            for (subject, value) in scored {
                let Some(z) = stats.z_score(value) else { continue };
                if z.abs() <= t {
                    continue;
                }

                let direction = if z > 0.0 { "above" } else { "below" };
                anomalies.push(AnomalyRecord {
                    student_id: record.student_id.clone(),
                    class_id: record.class_id.clone(),
                    column: subject.to_string(),
                    value: AnomalyValue::Score(value),
                    kind: AnomalyKind::vs_self(z),
                    severity: classify(z, t),
                    explanation: format!(
                        "Subject '{subject}' score ({value}) is well {direction} this student's overall level (subject mean: {:.2}).",
                        stats.mean
                    ),
                });
            }
        }

        anomalies
    }
}
