//! Config schema and deserialization

use serde::Deserialize;
use std::path::PathBuf;

use crate::{AnalysisMode, AnomalyKind, Severity};

/// Root config structure for .gradelensrc.json
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Extend another config file (path relative to this config)
    #[serde(default)]
    pub extends: Option<String>,

    /// Z-score threshold. Default: 2.5
    #[serde(default)]
    pub threshold: Option<f64>,

    /// Analysis mode. Default: component
    #[serde(default)]
    pub mode: Option<AnalysisMode>,

    /// Exit 1 when an anomaly at or above this severity is reported
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Anomaly kinds left out of every report
    #[serde(default)]
    pub ignore_kinds: Vec<AnomalyKind>,

    /// Glob patterns for data files to skip when scanning a directory
    #[serde(default)]
    pub ignore: Vec<String>,

    /// Base config files pulled in through `extends`, canonicalized
    #[serde(skip)]
    pub extended_files: Vec<PathBuf>,
}

impl Config {
    /// Merge CLI overrides into config. CLI values take precedence.
    pub fn merge_with_cli(
        mut self,
        cli_threshold: Option<f64>,
        cli_mode: Option<AnalysisMode>,
        cli_fail_on: Option<Severity>,
    ) -> Self {
        if cli_threshold.is_some() {
            self.threshold = cli_threshold;
        }
        if cli_mode.is_some() {
            self.mode = cli_mode;
        }
        if cli_fail_on.is_some() {
            self.fail_on = cli_fail_on;
        }
        self
    }

    /// Merge another config into this one (for extends)
    pub fn merge_from(&mut self, base: Config) {
        // Base values are overridden by this config's values
        if self.threshold.is_none() {
            self.threshold = base.threshold;
        }
        if self.mode.is_none() {
            self.mode = base.mode;
        }
        if self.fail_on.is_none() {
            self.fail_on = base.fail_on;
        }
        if self.extends.is_none() {
            self.extends = base.extends;
        }

        for kind in base.ignore_kinds {
            if !self.ignore_kinds.contains(&kind) {
                self.ignore_kinds.push(kind);
            }
        }

        let mut all_ignores = base.ignore;
        all_ignores.append(&mut self.ignore);
        self.ignore = all_ignores;

        self.extended_files.extend(base.extended_files);
    }

    pub fn effective_threshold(&self) -> f64 {
        self.threshold.unwrap_or(crate::DEFAULT_THRESHOLD)
    }

    pub fn effective_mode(&self) -> AnalysisMode {
        self.mode.unwrap_or_default()
    }
}
