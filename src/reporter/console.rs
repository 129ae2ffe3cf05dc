//! Console reporter with colored output

use crate::analyzer::engine::AggregateStats;
use crate::{AnalysisResult, AnomalyRecord, AnomalyReport, Severity};
use colored::Colorize;

/// `println!` into a render buffer
macro_rules! outln {
    ($out:expr) => {
        $out.push('\n')
    };
    ($out:expr, $($arg:tt)*) => {{
        $out.push_str(&format!($($arg)*));
        $out.push('\n');
    }};
}

/// Records listed per file before the rest is collapsed (unless verbose)
const MAX_LISTED: usize = 50;

/// Reporter for terminal output
pub struct ConsoleReporter {
    /// Whether to use colors
    use_colors: bool,
    /// Whether to show verbose output
    verbose: bool,
}

impl ConsoleReporter {
    /// Create a new console reporter
    pub fn new() -> Self {
        Self {
            use_colors: true,
            verbose: false,
        }
    }

    /// Disable colors
    pub fn without_colors(mut self) -> Self {
        self.use_colors = false;
        self
    }

    /// Enable verbose output
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    /// Report a single analysis result. `report` is what gets listed (it may
    /// be a filtered view of `result.report`).
    pub fn report(&self, result: &AnalysisResult, report: &AnomalyReport) {
        print!("{}", self.render(result, report));
    }

    /// Report multiple results with summary
    pub fn report_many(&self, results: &[(AnalysisResult, AnomalyReport)], stats: &AggregateStats) {
        for (result, report) in results {
            self.report(result, report);
            println!("{}", "─".repeat(60));
        }
        print!("{}", self.render_summary(stats));
    }

    /// Report in quiet mode (one line per file)
    pub fn report_quiet(&self, result: &AnalysisResult, report: &AnomalyReport) {
        println!("{}", self.render_quiet(result, report));
    }

    pub fn render_quiet(&self, result: &AnalysisResult, report: &AnomalyReport) -> String {
        let counts = report.summary().by_severity;
        format!(
            "{}: {} anomalies ({} high, {} medium, {} low)",
            source_name(result),
            report.len(),
            counts.high,
            counts.medium,
            counts.low
        )
    }

    /// Render a full result as text
    pub fn render(&self, result: &AnalysisResult, report: &AnomalyReport) -> String {
        let mut out = String::new();
        self.write_header(&mut out, result);
        if self.verbose {
            self.write_distributions(&mut out, result);
        }

        if report.is_empty() {
            outln!(
                out,
                "   {}",
                self.paint_green("No anomalies found with the selected parameters.")
            );
            outln!(out);
            return out;
        }

        self.write_overview(&mut out, report, result.report.len());
        self.write_records(&mut out, report);
        out
    }

    pub fn render_summary(&self, stats: &AggregateStats) -> String {
        let mut out = String::new();
        outln!(out);
        outln!(out, "{}", "═".repeat(60));
        outln!(out, "{}", self.bold("Summary"));
        outln!(out, "{}", "═".repeat(60));
        outln!(out, "   Files analyzed:  {}", stats.files_analyzed);
        outln!(out, "   Students:        {}", stats.total_students);
        outln!(out, "   Anomalies:       {}", stats.total_anomalies);
        outln!(out, "   High severity:   {}", stats.high_severity);
        outln!(out);
        out
    }

    fn write_header(&self, out: &mut String, result: &AnalysisResult) {
        outln!(out);
        outln!(
            out,
            "{}",
            self.bold(&format!("Score Anomaly Analysis: {}", source_name(result)))
        );
        let columns = if result.columns_analyzed.is_empty() {
            "none".to_string()
        } else {
            result.columns_analyzed.join(", ")
        };
        outln!(
            out,
            "   Mode: {} | Students: {} | Columns: {} | Threshold: {}",
            result.mode, result.students, columns, result.threshold
        );
        outln!(out);
    }

    fn write_distributions(&self, out: &mut String, result: &AnalysisResult) {
        if result.distributions.is_empty() {
            return;
        }
        outln!(out, "   {}", self.bold("Column Distribution:"));
        outln!(
            out,
            "   {:<10} {:>6} {:>7} {:>7} {:>6} {:>6}",
            "column", "count", "mean", "std", "min", "max"
        );
        for d in &result.distributions {
            let std = d
                .std_dev
                .map(|s| format!("{s:.2}"))
                .unwrap_or_else(|| "-".to_string());
            outln!(
                out,
                "   {:<10} {:>6} {:>7.2} {:>7} {:>6.2} {:>6.2}",
                d.column, d.count, d.mean, std, d.min, d.max
            );
        }
        outln!(out);
    }

    fn write_overview(&self, out: &mut String, report: &AnomalyReport, unfiltered: usize) {
        let summary = report.summary();
        let shown = if summary.total_anomalies == unfiltered {
            summary.total_anomalies.to_string()
        } else {
            format!("{} of {}", summary.total_anomalies, unfiltered)
        };
        outln!(
            out,
            "   Anomalies: {}   Students affected: {}   Classes affected: {}",
            self.bold(&shown),
            summary.students_affected,
            summary.classes_affected
        );
        outln!(
            out,
            "   {} {}  {} {}  {} {}",
            self.severity_label(Severity::High),
            summary.by_severity.high,
            self.severity_label(Severity::Medium),
            summary.by_severity.medium,
            self.severity_label(Severity::Low),
            summary.by_severity.low
        );
        outln!(out);

        outln!(out, "   {}", self.bold("By class:"));
        let widest = summary.by_class.first().map(|c| c.count).unwrap_or(1);
        for entry in &summary.by_class {
            outln!(
                out,
                "   {:<10} {} {}",
                entry.class_id,
                mini_bar(entry.count, widest),
                entry.count
            );
        }
        outln!(out);

        outln!(out, "   {}", self.bold("By kind:"));
        for (kind, count) in &summary.by_kind {
            outln!(out, "   {:<24} {}", kind.to_string(), count);
        }
        outln!(out);
    }

    fn write_records(&self, out: &mut String, report: &AnomalyReport) {
        outln!(out, "   {}", self.bold("Anomalies:"));
        let limit = if self.verbose { usize::MAX } else { MAX_LISTED };
        for record in report.iter().take(limit) {
            self.write_record(out, record);
        }
        if report.len() > limit {
            outln!(
                out,
                "   {} more (use --verbose or --csv to see all)",
                report.len() - limit
            );
        }
        outln!(out);
    }

    fn write_record(&self, out: &mut String, record: &AnomalyRecord) {
        let icon = match record.severity {
            Severity::High => "✗",
            Severity::Medium => "⚠",
            Severity::Low => "ℹ",
        };
        outln!(
            out,
            "   {} {:<8} {} ({}) {} = {} [{}]",
            self.paint_severity(icon, record.severity),
            self.severity_label(record.severity),
            record.student_id,
            record.class_id,
            record.column,
            record.value,
            self.dimmed(&record.kind.to_string())
        );
        outln!(out, "       {} {}", self.dimmed("→"), record.explanation);
    }

    fn severity_label(&self, severity: Severity) -> String {
        self.paint_severity(&severity.to_string(), severity)
    }

    fn paint_severity(&self, text: &str, severity: Severity) -> String {
        if !self.use_colors {
            return text.to_string();
        }
        match severity {
            Severity::High => text.red().bold().to_string(),
            Severity::Medium => text.yellow().to_string(),
            Severity::Low => text.blue().to_string(),
        }
    }

    fn paint_green(&self, text: &str) -> String {
        if self.use_colors {
            text.green().to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn dimmed(&self, text: &str) -> String {
        if self.use_colors {
            text.dimmed().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

fn source_name(result: &AnalysisResult) -> String {
    result
        .file_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string())
}

fn mini_bar(count: usize, max: usize) -> String {
    let filled = (count * 20).div_ceil(max.max(1)).min(20);
    format!("{}{}", "▓".repeat(filled), "░".repeat(20 - filled))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalysisMode, AnomalyKind, AnomalyValue};
    use std::path::PathBuf;

    fn record(student: &str, class: &str, severity: Severity) -> AnomalyRecord {
        AnomalyRecord {
            student_id: student.to_string(),
            class_id: class.to_string(),
            column: "CK".to_string(),
            value: AnomalyValue::Missing,
            kind: AnomalyKind::MissingValue,
            severity,
            explanation: "This student has no recorded score in column 'CK'.".to_string(),
        }
    }

    fn result(records: Vec<AnomalyRecord>) -> AnalysisResult {
        AnalysisResult {
            file_path: Some(PathBuf::from("diem.csv")),
            mode: AnalysisMode::Component,
            threshold: 2.5,
            columns_analyzed: vec!["GK".to_string(), "CK".to_string()],
            students: 30,
            distributions: vec![],
            report: records.into(),
        }
    }

    #[test]
    fn test_render_lists_records() {
        let r = result(vec![record("HS01", "10A1", Severity::High)]);
        let text = ConsoleReporter::new().without_colors().render(&r, &r.report);
        assert!(text.contains("Score Anomaly Analysis: diem.csv"));
        assert!(text.contains("Columns: GK, CK"));
        assert!(text.contains("HS01 (10A1) CK = missing [missing-value]"));
        assert!(text.contains("Students affected: 1"));
    }

    #[test]
    fn test_render_empty_report() {
        let r = result(vec![]);
        let text = ConsoleReporter::new().without_colors().render(&r, &r.report);
        assert!(text.contains("No anomalies found"));
    }

    #[test]
    fn test_render_filtered_shows_fraction() {
        let r = result(vec![
            record("HS01", "10A1", Severity::High),
            record("HS02", "10A2", Severity::High),
        ]);
        let filtered: AnomalyReport = vec![r.report.records()[0].clone()].into();
        let text = ConsoleReporter::new().without_colors().render(&r, &filtered);
        assert!(text.contains("Anomalies: 1 of 2"));
        assert!(!text.contains("HS02"));
    }

    #[test]
    fn test_quiet_line() {
        let r = result(vec![record("HS01", "10A1", Severity::High)]);
        let line = ConsoleReporter::new().without_colors().render_quiet(&r, &r.report);
        assert_eq!(line, "diem.csv: 1 anomalies (1 high, 0 medium, 0 low)");
    }

    #[test]
    fn test_render_summary_lines() {
        let stats = AggregateStats {
            files_analyzed: 2,
            total_students: 9,
            total_anomalies: 3,
            high_severity: 3,
        };
        let text = ConsoleReporter::new().without_colors().render_summary(&stats);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "");
        assert_eq!(lines[2], "Summary");
        assert_eq!(lines[4], "   Files analyzed:  2");
        assert_eq!(lines[7], "   High severity:   3");
        assert_eq!(lines.len(), 10);
        assert!(text.ends_with("\n\n"));
    }

    #[test]
    fn test_render_record_two_lines() {
        let r = result(vec![record("HS01", "10A1", Severity::High)]);
        let text = ConsoleReporter::new().without_colors().render(&r, &r.report);
        let lines: Vec<&str> = text.lines().collect();
        let at = lines
            .iter()
            .position(|l| l.contains("HS01 (10A1)"))
            .unwrap();
        assert_eq!(lines[at], "   ✗ High     HS01 (10A1) CK = missing [missing-value]");
        assert_eq!(
            lines[at + 1],
            "       → This student has no recorded score in column 'CK'."
        );
    }

    #[test]
    fn test_mini_bar_scales() {
        assert_eq!(mini_bar(5, 5).chars().filter(|c| *c == '▓').count(), 20);
        assert_eq!(mini_bar(1, 4).chars().filter(|c| *c == '▓').count(), 5);
    }
}
