//! JSON reporter for machine-readable output

use crate::analyzer::engine::AggregateStats;
use crate::{AnalysisResult, ReportSummary};
use serde::Serialize;

/// Reporter for JSON output
pub struct JsonReporter {
    /// Whether to pretty-print JSON
    pretty: bool,
}

impl JsonReporter {
    /// Create a new JSON reporter
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Enable pretty-printing
    pub fn pretty(mut self) -> Self {
        self.pretty = true;
        self
    }

    /// Report a single analysis result as JSON, with its report summary
    pub fn report(&self, result: &AnalysisResult) -> String {
        self.encode(&JsonResult::from(result), "{}")
    }

    /// Report multiple results as JSON array
    pub fn report_many(&self, results: &[AnalysisResult]) -> String {
        let wrapped: Vec<JsonResult<'_>> = results.iter().map(JsonResult::from).collect();
        self.encode(&wrapped, "[]")
    }

    /// Report with summary
    pub fn report_with_summary(&self, results: &[AnalysisResult], stats: &AggregateStats) -> String {
        let output = JsonOutput {
            results: results.iter().map(JsonResult::from).collect(),
            summary: JsonSummary {
                files_analyzed: stats.files_analyzed,
                total_students: stats.total_students,
                total_anomalies: stats.total_anomalies,
                high_severity: stats.high_severity,
            },
        };
        self.encode(&output, "{}")
    }

    fn encode<T: Serialize>(&self, value: &T, fallback: &str) -> String {
        let encoded = if self.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        encoded.unwrap_or_else(|e| {
            log::error!("failed to encode JSON output: {e}");
            fallback.to_string()
        })
    }
}

impl Default for JsonReporter {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonResult<'a> {
    #[serde(flatten)]
    result: &'a AnalysisResult,
    summary: ReportSummary,
}

impl<'a> From<&'a AnalysisResult> for JsonResult<'a> {
    fn from(result: &'a AnalysisResult) -> Self {
        Self {
            result,
            summary: result.report.summary(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonOutput<'a> {
    results: Vec<JsonResult<'a>>,
    summary: JsonSummary,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonSummary {
    files_analyzed: usize,
    total_students: usize,
    total_anomalies: usize,
    high_severity: usize,
}
