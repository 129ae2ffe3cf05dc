//! Configuration loading for Gradelens

mod schema;

pub use schema::Config;

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::AnalysisEngine;
use crate::Threshold;

pub const CONFIG_FILENAME: &str = ".gradelensrc.json";

/// Find and load config file with extends resolution. Searches current directory then parents.
pub fn load_config(work_dir: &Path, custom_path: Option<&Path>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        let path = if p.is_absolute() {
            p.to_path_buf()
        } else {
            work_dir.join(p)
        };
        if path.exists() {
            Some(path)
        } else {
            anyhow::bail!("Config file not found: {}", path.display());
        }
    } else {
        find_config_in_parents(work_dir)
    };

    match path {
        Some(path) => {
            log::debug!("using config {}", path.display());
            load_config_with_extends(&path, &mut HashSet::new())
        }
        None => Ok(Config::default()),
    }
}

/// Load a config file and resolve extends chain
fn load_config_with_extends(config_path: &Path, visited: &mut HashSet<PathBuf>) -> Result<Config> {
    // Prevent circular extends
    let canonical = config_path
        .canonicalize()
        .unwrap_or_else(|_| config_path.to_path_buf());
    if !visited.insert(canonical) {
        anyhow::bail!(
            "Circular extends detected in config: {}",
            config_path.display()
        );
    }

    let content = fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config: {}", config_path.display()))?;
    let mut config: Config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid config: {}", config_path.display()))?;

    if let Some(extends) = config.extends.take() {
        let config_dir = config_path.parent().unwrap_or(Path::new("."));
        let mut base_path = config_dir.join(&extends);
        if base_path.extension().is_none() {
            base_path.set_extension("json");
        }
        if !base_path.exists() {
            anyhow::bail!(
                "Extended config not found: {} (referenced from {})",
                base_path.display(),
                config_path.display()
            );
        }
        let base_config = load_config_with_extends(&base_path, visited)?;
        config
            .extended_files
            .push(base_path.canonicalize().unwrap_or(base_path));
        config.merge_from(base_config);
    }

    Ok(config)
}

/// Search for the config file in directory and its parents
fn find_config_in_parents(mut dir: &Path) -> Option<PathBuf> {
    loop {
        let candidate = dir.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        dir = dir.parent()?;
    }
}

/// Build a GlobSet from ignore patterns for path matching
pub fn build_ignore_set(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob =
            Glob::new(pattern).with_context(|| format!("Invalid ignore pattern: {}", pattern))?;
        builder.add(glob);
    }
    builder.build().map_err(|e| anyhow::anyhow!("{}", e))
}

/// Check if a path should be ignored based on config glob patterns
pub fn is_ignored(path: &Path, ignore_set: &GlobSet) -> bool {
    ignore_set.is_match(path)
}

/// Build an engine from the effective config. Fails on an invalid threshold.
pub fn engine_from_config(config: &Config) -> Result<AnalysisEngine> {
    let threshold = Threshold::new(config.effective_threshold())?;
    Ok(AnalysisEngine::new()
        .with_threshold(threshold)
        .with_ignored_kinds(config.ignore_kinds.iter().copied()))
}
