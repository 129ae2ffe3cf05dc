//! Inter-student outliers: scores far from their column's population.

use super::Detector;
use crate::analyzer::severity::classify;
use crate::analyzer::stats::SampleStats;
use crate::{AnomalyKind, AnomalyRecord, AnomalyValue, Dataset, Threshold};

/// Flags scores whose column Z-score exceeds the threshold. Each column is
/// standardized on its own; marks of different subjects are not comparable.
pub struct InterStudentDetector {
    threshold: Threshold,
}

impl InterStudentDetector {
    pub fn new(threshold: Threshold) -> Self {
        Self { threshold }
    }
}

impl Default for InterStudentDetector {
    fn default() -> Self {
        Self::new(Threshold::default())
    }
}

impl Detector for InterStudentDetector {
    fn name(&self) -> &'static str {
        "inter-student"
    }

    fn detect(&self, dataset: &Dataset, columns: &[&str]) -> Vec<AnomalyRecord> {
        let t = self.threshold.value();
        let mut anomalies = Vec::new();

        for &column in columns {
            let scores = dataset.column_scores(column);
            let valid: Vec<f64> = scores.iter().flatten().copied().collect();

            let Some(stats) = SampleStats::from_values(&valid) else {
                log::debug!("{column}: {} valid values, skipping", valid.len());
                continue;
            };
            if !stats.has_spread() {
                log::debug!("{column}: all values equal, skipping");
                continue;
            }

            for (record, score) in dataset.records().iter().zip(&scores) {
                let Some(value) = *score else { continue };
                let Some(z) = stats.z_score(value) else { continue };
                if z.abs() <= t {
                    continue;
                }

                let direction = if z > 0.0 { "above" } else { "below" };
                anomalies.push(AnomalyRecord {
                    student_id: record.student_id.clone(),
                    class_id: record.class_id.clone(),
                    column: column.to_string(),
                    value: AnomalyValue::Score(value),
                    kind: AnomalyKind::vs_class(z),
                    severity: classify(z, t),
                    explanation: format!(
                        "Score {value} in column '{column}' is well {direction} the class mean ({:.2}).",
                        stats.mean
                    ),
                });
            }
        }

        anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::detectors::test_support::single_column;
    use crate::Severity;

    fn detect(values: &[Option<f64>], threshold: f64) -> Vec<AnomalyRecord> {
        let ds = single_column("GK", values);
        InterStudentDetector::new(Threshold::new(threshold).unwrap()).detect(&ds, &["GK"])
    }

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_small_dip_below_threshold_not_flagged() {
        // mean 4.02, sample std ~2.25, z(0.0) ~ -1.79
        let found = detect(&some(&[5.0, 5.2, 4.8, 5.1, 0.0]), 2.5);
        assert!(found.is_empty());
    }

    #[test]
    fn test_lowering_threshold_flags_low_outlier() {
        let values = some(&[8.0, 8.0, 8.0, 8.0, 1.0]);
        assert!(detect(&values, 2.0).is_empty());

        let found = detect(&values, 1.5);
        assert_eq!(found.len(), 1);
        let a = &found[0];
        assert_eq!(a.student_id, "HS05");
        assert_eq!(a.column, "GK");
        assert_eq!(a.value, AnomalyValue::Score(1.0));
        assert_eq!(a.kind, AnomalyKind::LowVsClass);
        // |z| ~ 1.79 is within (1.5, 2.0]
        assert_eq!(a.severity, Severity::Low);
        assert!(a.explanation.contains("below the class mean (6.60)"));
    }

    #[test]
    fn test_high_outlier_explanation_and_severity() {
        let mut values = vec![5.0; 20];
        values.push(10.0);
        let found = detect(&some(&values), 2.5);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].kind, AnomalyKind::HighVsClass);
        assert_eq!(found[0].severity, Severity::High);
        assert!(found[0].explanation.starts_with("Score 10 in column 'GK' is well above"));
    }

    #[test]
    fn test_zero_spread_column_skipped() {
        assert!(detect(&some(&[7.0, 7.0, 7.0, 7.0]), 0.1).is_empty());
    }

    #[test]
    fn test_single_valid_value_skipped() {
        assert!(detect(&[Some(3.0), None, None], 0.1).is_empty());
    }

    #[test]
    fn test_missing_cells_excluded_from_statistics() {
        let found = detect(&[Some(8.0), Some(8.0), Some(8.0), Some(8.0), Some(1.0), None], 1.5);
        assert_eq!(found.len(), 1);
        assert!(found[0].explanation.contains("(6.60)"));
    }

    #[test]
    fn test_absent_column_produces_nothing() {
        let ds = single_column("GK", &some(&[1.0, 9.0]));
        let found = InterStudentDetector::default().detect(&ds, &["CK"]);
        assert!(found.is_empty());
    }
}
