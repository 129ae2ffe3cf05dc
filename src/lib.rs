//! Gradelens: statistical anomaly detection for student score sheets
//!
//! This library flags scores that stand out against the rest of a class
//! (inter-student), against the student's own subject average (intra-student),
//! and cells that carry no usable score at all.

pub mod analyzer;
pub mod config;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod reporter;

pub use dataset::{Cell, Dataset, StudentRecord};
pub use error::AnalysisError;

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::str::FromStr;

/// Component score columns (formative, midterm and final marks of one subject)
pub const COMPONENT_COLUMNS: &[&str] = &["TX1", "TX2", "TX3", "GK", "CK"];

/// Per-subject average columns
pub const SUMMARY_COLUMNS: &[&str] = &[
    "Toan", "Van", "Ly", "Hoa", "Ngoaingu", "Su", "Tin", "Sinh", "Dia",
];

/// Default Z-score threshold
pub const DEFAULT_THRESHOLD: f64 = 2.5;

/// The two fixed analysis pipelines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Component marks of one subject: inter-student + missing values
    #[default]
    Component,
    /// Subject averages: inter-student + intra-student + missing values
    Summary,
}

impl AnalysisMode {
    /// Column family this mode analyzes
    pub fn columns(self) -> &'static [&'static str] {
        match self {
            AnalysisMode::Component => COMPONENT_COLUMNS,
            AnalysisMode::Summary => SUMMARY_COLUMNS,
        }
    }

    /// Whether the intra-student detector applies (columns share one scale)
    pub fn compares_subjects(self) -> bool {
        matches!(self, AnalysisMode::Summary)
    }
}

impl FromStr for AnalysisMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "component" => Ok(AnalysisMode::Component),
            "summary" => Ok(AnalysisMode::Summary),
            _ => Err(AnalysisError::UnknownMode(s.to_string())),
        }
    }
}

impl std::fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisMode::Component => write!(f, "component"),
            AnalysisMode::Summary => write!(f, "summary"),
        }
    }
}

/// Detection threshold in Z-score units. Always finite and strictly positive.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Threshold(f64);

impl Threshold {
    pub fn new(value: f64) -> Result<Self, AnalysisError> {
        if value.is_finite() && value > 0.0 {
            Ok(Self(value))
        } else {
            Err(AnalysisError::InvalidThreshold(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLD)
    }
}

impl std::fmt::Display for Threshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity of an anomaly, ordered Low < Medium < High
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            other => Err(format!("unknown severity '{other}' (expected low, medium or high)")),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

/// What a detector found
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnomalyKind {
    /// Score well above the column (class) mean
    #[serde(rename = "high-outlier-vs-class")]
    HighVsClass,
    /// Score well below the column (class) mean
    #[serde(rename = "low-outlier-vs-class")]
    LowVsClass,
    /// Subject well above the student's own subject average
    #[serde(rename = "high-outlier-vs-self")]
    HighVsSelf,
    /// Subject well below the student's own subject average
    #[serde(rename = "low-outlier-vs-self")]
    LowVsSelf,
    /// No usable score recorded
    MissingValue,
}

impl AnomalyKind {
    pub const ALL: [AnomalyKind; 5] = [
        AnomalyKind::HighVsClass,
        AnomalyKind::LowVsClass,
        AnomalyKind::HighVsSelf,
        AnomalyKind::LowVsSelf,
        AnomalyKind::MissingValue,
    ];

    /// Kind for a class comparison, by the sign of the Z-score
    pub fn vs_class(z: f64) -> Self {
        if z > 0.0 {
            AnomalyKind::HighVsClass
        } else {
            AnomalyKind::LowVsClass
        }
    }

    /// Kind for a self comparison, by the sign of the Z-score
    pub fn vs_self(z: f64) -> Self {
        if z > 0.0 {
            AnomalyKind::HighVsSelf
        } else {
            AnomalyKind::LowVsSelf
        }
    }
}

impl FromStr for AnomalyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        AnomalyKind::ALL
            .into_iter()
            .find(|k| k.to_string() == wanted)
            .ok_or_else(|| format!("unknown anomaly kind '{}'", s.trim()))
    }
}

impl std::fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyKind::HighVsClass => write!(f, "high-outlier-vs-class"),
            AnomalyKind::LowVsClass => write!(f, "low-outlier-vs-class"),
            AnomalyKind::HighVsSelf => write!(f, "high-outlier-vs-self"),
            AnomalyKind::LowVsSelf => write!(f, "low-outlier-vs-self"),
            AnomalyKind::MissingValue => write!(f, "missing-value"),
        }
    }
}

/// Literal written in place of a score when a cell is empty
pub const MISSING_SENTINEL: &str = "missing";

/// The flagged value: a score, or the missing sentinel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "ValueRepr", try_from = "ValueRepr")]
pub enum AnomalyValue {
    Score(f64),
    Missing,
}

impl AnomalyValue {
    pub fn as_score(&self) -> Option<f64> {
        match self {
            AnomalyValue::Score(v) => Some(*v),
            AnomalyValue::Missing => None,
        }
    }
}

impl std::fmt::Display for AnomalyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnomalyValue::Score(v) => write!(f, "{}", v),
            AnomalyValue::Missing => write!(f, "{}", MISSING_SENTINEL),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum ValueRepr {
    Number(f64),
    Text(String),
}

impl From<AnomalyValue> for ValueRepr {
    fn from(value: AnomalyValue) -> Self {
        match value {
            AnomalyValue::Score(v) => ValueRepr::Number(v),
            AnomalyValue::Missing => ValueRepr::Text(MISSING_SENTINEL.to_string()),
        }
    }
}

impl TryFrom<ValueRepr> for AnomalyValue {
    type Error = String;

    fn try_from(repr: ValueRepr) -> Result<Self, Self::Error> {
        match repr {
            ValueRepr::Number(v) => Ok(AnomalyValue::Score(v)),
            ValueRepr::Text(s) if s == MISSING_SENTINEL => Ok(AnomalyValue::Missing),
            ValueRepr::Text(s) => Err(format!("expected a number or \"{MISSING_SENTINEL}\", got \"{s}\"")),
        }
    }
}

/// One finding for one (student, column, detector)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnomalyRecord {
    /// Student identifier (`MaHS`)
    pub student_id: String,
    /// Class identifier (`lop`)
    pub class_id: String,
    /// Score column the finding is about
    pub column: String,
    /// The flagged value
    pub value: AnomalyValue,
    pub kind: AnomalyKind,
    pub severity: Severity,
    /// Human-readable explanation
    pub explanation: String,
}

/// Ordered anomaly records of one analysis run. Never deduplicated: the same
/// cell may be reported by several detectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnomalyReport {
    records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[AnomalyRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<AnomalyRecord> {
        self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, AnomalyRecord> {
        self.records.iter()
    }

    /// Append one detector's output, keeping order
    pub fn extend(&mut self, records: Vec<AnomalyRecord>) {
        self.records.extend(records);
    }

    /// Drop every record of the given kinds
    pub fn without_kinds(mut self, kinds: &BTreeSet<AnomalyKind>) -> Self {
        if !kinds.is_empty() {
            self.records.retain(|r| !kinds.contains(&r.kind));
        }
        self
    }

    /// Whether any record is at or above `level`
    pub fn has_severity_at_least(&self, level: Severity) -> bool {
        self.records.iter().any(|r| r.severity >= level)
    }

    /// Sorted distinct class ids
    pub fn distinct_classes(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self.records.iter().map(|r| r.class_id.as_str()).collect();
        set.into_iter().map(str::to_string).collect()
    }

    /// Sorted distinct kinds
    pub fn distinct_kinds(&self) -> Vec<AnomalyKind> {
        let set: BTreeSet<AnomalyKind> = self.records.iter().map(|r| r.kind).collect();
        set.into_iter().collect()
    }

    /// Distinct severities, Low first
    pub fn distinct_severities(&self) -> Vec<Severity> {
        let set: BTreeSet<Severity> = self.records.iter().map(|r| r.severity).collect();
        set.into_iter().collect()
    }

    /// Headline numbers and per-class / per-kind breakdowns
    pub fn summary(&self) -> ReportSummary {
        let students: BTreeSet<&str> = self.records.iter().map(|r| r.student_id.as_str()).collect();

        let mut by_severity = SeverityCounts::default();
        let mut by_kind: BTreeMap<AnomalyKind, usize> = BTreeMap::new();
        let mut per_class: BTreeMap<&str, usize> = BTreeMap::new();
        for record in &self.records {
            by_severity.add(record.severity);
            *by_kind.entry(record.kind).or_insert(0) += 1;
            *per_class.entry(record.class_id.as_str()).or_insert(0) += 1;
        }

        let mut by_class: Vec<ClassCount> = per_class
            .into_iter()
            .map(|(class_id, count)| ClassCount {
                class_id: class_id.to_string(),
                count,
            })
            .collect();
        // Busiest classes first; BTreeMap order keeps ties stable by class id
        by_class.sort_by(|a, b| b.count.cmp(&a.count));

        ReportSummary {
            total_anomalies: self.records.len(),
            students_affected: students.len(),
            classes_affected: by_class.len(),
            by_severity,
            by_kind,
            by_class,
        }
    }
}

impl From<Vec<AnomalyRecord>> for AnomalyReport {
    fn from(records: Vec<AnomalyRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a AnomalyReport {
    type Item = &'a AnomalyRecord;
    type IntoIter = std::slice::Iter<'a, AnomalyRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// Overview of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub total_anomalies: usize,
    /// Distinct student ids with at least one anomaly
    pub students_affected: usize,
    /// Distinct class ids with at least one anomaly
    pub classes_affected: usize,
    pub by_severity: SeverityCounts,
    pub by_kind: BTreeMap<AnomalyKind, usize>,
    /// Anomaly count per class, largest first
    pub by_class: Vec<ClassCount>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

impl SeverityCounts {
    fn add(&mut self, severity: Severity) {
        match severity {
            Severity::Low => self.low += 1,
            Severity::Medium => self.medium += 1,
            Severity::High => self.high += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassCount {
    pub class_id: String,
    pub count: usize,
}

/// Result of analyzing one dataset file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    /// Source file (None for in-memory or stdin input)
    pub file_path: Option<PathBuf>,
    pub mode: AnalysisMode,
    pub threshold: f64,
    /// Family columns present in the dataset, in family order
    pub columns_analyzed: Vec<String>,
    /// Number of student rows read
    pub students: usize,
    /// Distribution of each analyzed column
    #[serde(default)]
    pub distributions: Vec<dataset::ColumnStats>,
    pub report: AnomalyReport,
}

/// Analyze component marks (`TX1`..`CK`): inter-student and missing-value detectors.
pub fn analyze_component(dataset: &Dataset, threshold: f64) -> Result<AnomalyReport, AnalysisError> {
    analyzer::AnalysisEngine::new()
        .with_threshold(Threshold::new(threshold)?)
        .analyze(dataset, AnalysisMode::Component)
}

/// Analyze subject averages: inter-student, intra-student and missing-value detectors.
pub fn analyze_summary(dataset: &Dataset, threshold: f64) -> Result<AnomalyReport, AnalysisError> {
    analyzer::AnalysisEngine::new()
        .with_threshold(Threshold::new(threshold)?)
        .analyze(dataset, AnalysisMode::Summary)
}
