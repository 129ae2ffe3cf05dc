use std::collections::BTreeSet;

use crate::{AnomalyKind, AnomalyRecord, AnomalyReport, Severity};

/// Per-field selection over an anomaly report.
///
/// A field left as `None` does not constrain anything. A field set to an empty
/// set matches nothing, the same as a multiselect with every option cleared.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportFilter {
    pub classes: Option<BTreeSet<String>>,
    pub kinds: Option<BTreeSet<AnomalyKind>>,
    pub severities: Option<BTreeSet<Severity>>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes = Some(classes.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = AnomalyKind>) -> Self {
        self.kinds = Some(kinds.into_iter().collect());
        self
    }

    pub fn with_severities(mut self, severities: impl IntoIterator<Item = Severity>) -> Self {
        self.severities = Some(severities.into_iter().collect());
        self
    }

    /// True when no field constrains anything
    pub fn is_unrestricted(&self) -> bool {
        self.classes.is_none() && self.kinds.is_none() && self.severities.is_none()
    }

    pub fn matches(&self, record: &AnomalyRecord) -> bool {
        fn allowed<T: Ord>(selected: &Option<BTreeSet<T>>, value: &T) -> bool {
            selected.as_ref().map_or(true, |set| set.contains(value))
        }
        allowed(&self.classes, &record.class_id)
            && allowed(&self.kinds, &record.kind)
            && allowed(&self.severities, &record.severity)
    }

    /// Records passing every active field, in report order
    pub fn apply(&self, report: &AnomalyReport) -> AnomalyReport {
        if self.is_unrestricted() {
            return report.clone();
        }
        report
            .iter()
            .filter(|r| self.matches(r))
            .cloned()
            .collect::<Vec<_>>()
            .into()
    }
}
