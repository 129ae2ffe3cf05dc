//! CSV export of anomaly records

use crate::AnomalyReport;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Export header, in column order
pub const CSV_HEADERS: [&str; 7] = [
    "student_id",
    "class_id",
    "column",
    "value",
    "kind",
    "severity",
    "explanation",
];

/// Writes one row per anomaly record, in report order
#[derive(Debug, Default)]
pub struct CsvReporter;

impl CsvReporter {
    pub fn new() -> Self {
        Self
    }

    /// Write the report to any writer
    pub fn write<W: Write>(&self, report: &AnomalyReport, out: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(out);
        writer.write_record(CSV_HEADERS)?;
        for record in report {
            let value = record.value.to_string();
            let kind = record.kind.to_string();
            let severity = record.severity.to_string();
            writer.write_record([
                record.student_id.as_str(),
                record.class_id.as_str(),
                record.column.as_str(),
                value.as_str(),
                kind.as_str(),
                severity.as_str(),
                record.explanation.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the report to a file, replacing it if present
    pub fn write_to_path(&self, report: &AnomalyReport, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create CSV export: {}", path.display()))?;
        self.write(report, file)
            .with_context(|| format!("Failed to write CSV export: {}", path.display()))?;
        log::info!("exported {} anomalies to {}", report.len(), path.display());
        Ok(())
    }

    /// Render the report as CSV text
    pub fn report(&self, report: &AnomalyReport) -> Result<String> {
        let mut buf = Vec::new();
        self.write(report, &mut buf)?;
        String::from_utf8(buf).context("CSV output was not valid UTF-8")
    }
}
