//! Severity bands above the detection threshold

use crate::Severity;

/// Band width above the threshold that promotes Low to Medium
const MEDIUM_MARGIN: f64 = 0.5;
/// Band width above the threshold that promotes to High
const HIGH_MARGIN: f64 = 1.0;

/// Map a Z-score to a severity. Callers only pass scores already beyond
/// `threshold`, so everything at or under `threshold + 0.5` is Low.
pub fn classify(deviation: f64, threshold: f64) -> Severity {
    let magnitude = deviation.abs();
    if magnitude > threshold + HIGH_MARGIN {
        Severity::High
    } else if magnitude > threshold + MEDIUM_MARGIN {
        Severity::Medium
    } else {
        Severity::Low
    }
}
