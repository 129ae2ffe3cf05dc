//! Analysis engine - orchestrates the detectors for one analysis mode

use crate::dataset::{column_distribution, load_file};
use crate::error::AnalysisError;
use crate::{AnalysisMode, AnalysisResult, AnomalyKind, AnomalyReport, Dataset, Severity, Threshold};
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use super::detectors::{Detector, InterStudentDetector, IntraStudentDetector, MissingValueDetector};

/// Main analysis engine that runs the detectors of a mode and merges their output
#[derive(Debug, Clone, Default)]
pub struct AnalysisEngine {
    /// Z-score threshold for both statistical detectors
    threshold: Threshold,
    /// Kinds dropped from every report
    ignored_kinds: BTreeSet<AnomalyKind>,
}

impl AnalysisEngine {
    /// Create an engine with the default threshold
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_threshold(mut self, threshold: Threshold) -> Self {
        self.threshold = threshold;
        self
    }

    /// Drop these kinds from every report
    pub fn with_ignored_kinds(mut self, kinds: impl IntoIterator<Item = AnomalyKind>) -> Self {
        self.ignored_kinds = kinds.into_iter().collect();
        self
    }

    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Detectors of `mode`, in report order
    fn detectors(&self, mode: AnalysisMode) -> Vec<Box<dyn Detector>> {
        let mut detectors: Vec<Box<dyn Detector>> =
            vec![Box::new(InterStudentDetector::new(self.threshold))];
        if mode.compares_subjects() {
            detectors.push(Box::new(IntraStudentDetector::new(self.threshold)));
        }
        detectors.push(Box::new(MissingValueDetector::new()));
        detectors
    }

    /// Run the pipeline of `mode` over an in-memory dataset.
    ///
    /// Output order is inter-student, then intra-student (summary mode), then
    /// missing values. A dataset without id columns, without rows or without
    /// any family column yields an empty report.
    pub fn analyze(&self, dataset: &Dataset, mode: AnalysisMode) -> Result<AnomalyReport, AnalysisError> {
        let threshold = self.threshold;
        if dataset.is_empty() {
            log::warn!("dataset has no rows; nothing to analyze");
            return Ok(AnomalyReport::new());
        }
        if !dataset.has_identity_columns() {
            log::warn!("dataset lacks the student id or class id column; nothing to analyze");
            return Ok(AnomalyReport::new());
        }

        let columns = dataset.present_columns(mode.columns());
        log::info!(
            "{mode} analysis over {} rows, columns {:?}, threshold {threshold}",
            dataset.len(),
            columns
        );

        let mut report = AnomalyReport::new();
        if columns.is_empty() {
            return Ok(report);
        }
        for detector in self.detectors(mode) {
            let found = detector.detect(dataset, &columns);
            log::debug!("{}: {} anomalies", detector.name(), found.len());
            report.extend(found);
        }

        Ok(report.without_kinds(&self.ignored_kinds))
    }

    /// Load a data file and analyze it
    pub fn analyze_file(&self, path: &Path, mode: AnalysisMode) -> Result<AnalysisResult> {
        let dataset = load_file(path)?;
        self.analyze_dataset(&dataset, mode, Some(path.to_path_buf()))
            .with_context(|| format!("Failed to analyze {}", path.display()))
    }

    /// Analyze an already loaded dataset and wrap the report with run details
    pub fn analyze_dataset(
        &self,
        dataset: &Dataset,
        mode: AnalysisMode,
        file_path: Option<PathBuf>,
    ) -> Result<AnalysisResult> {
        let report = self.analyze(dataset, mode)?;
        let columns = dataset.present_columns(mode.columns());
        Ok(AnalysisResult {
            file_path,
            mode,
            threshold: self.threshold.value(),
            columns_analyzed: columns.iter().map(|c| c.to_string()).collect(),
            students: dataset.len(),
            distributions: columns
                .iter()
                .filter_map(|c| column_distribution(dataset, c))
                .collect(),
            report,
        })
    }

    /// Analyze multiple data files sequentially
    pub fn analyze_many(&self, paths: &[PathBuf], mode: AnalysisMode) -> Vec<Result<AnalysisResult>> {
        paths.iter().map(|p| self.analyze_file(p, mode)).collect()
    }

    /// Analyze multiple data files in parallel using rayon
    pub fn analyze_parallel(&self, paths: &[PathBuf], mode: AnalysisMode) -> Vec<Result<AnalysisResult>> {
        use rayon::prelude::*;

        paths.par_iter().map(|p| self.analyze_file(p, mode)).collect()
    }

    /// Get aggregate stats from multiple results
    pub fn aggregate_stats(results: &[AnalysisResult]) -> AggregateStats {
        AggregateStats {
            files_analyzed: results.len(),
            total_students: results.iter().map(|r| r.students).sum(),
            total_anomalies: results.iter().map(|r| r.report.len()).sum(),
            high_severity: results
                .iter()
                .flat_map(|r| r.report.iter())
                .filter(|a| a.severity == Severity::High)
                .count(),
        }
    }
}

/// Aggregate statistics from multiple file analyses
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AggregateStats {
    /// Number of files analyzed
    pub files_analyzed: usize,
    /// Student rows across all files
    pub total_students: usize,
    /// Anomalies across all files
    pub total_anomalies: usize,
    /// Anomalies at High severity
    pub high_severity: usize,
}
