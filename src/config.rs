//! Engine configuration
//!
//! The fuzzy bounds are process-wide: every fuzzy-producing operator clamps
//! into them and FuzzyXOr uses the lower bound directly. They are injected
//! here rather than hard-coded so a host engine can supply its own.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bounds of the fuzzy value range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FuzzyRange {
    pub min: f64,
    pub max: f64,
}

impl FuzzyRange {
    pub fn new(min: f64, max: f64) -> Result<Self> {
        if !(min < max) {
            bail!("Fuzzy range minimum {} must be below maximum {}", min, max);
        }
        Ok(Self { min, max })
    }

    /// Midpoint of the range (0.0 for the conventional -1..+1)
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Reflection about the midpoint; plain negation on -1..+1
    pub fn complement(&self, value: f64) -> f64 {
        self.min + self.max - value
    }
}

impl Default for FuzzyRange {
    fn default() -> Self {
        Self { min: -1.0, max: 1.0 }
    }
}

/// Engine settings loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub fuzzy: FuzzyRange,

    /// Evaluate independent nodes of one dependency level on the rayon pool
    #[serde(default)]
    pub parallel: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fuzzy: FuzzyRange::default(),
            parallel: false,
        }
    }
}

impl EngineConfig {
    /// Load config from JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read engine config: {:?}", path))?;

        let config: EngineConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse engine config JSON")?;

        // Re-check the bounds; serde bypasses FuzzyRange::new
        FuzzyRange::new(config.fuzzy.min, config.fuzzy.max)
            .with_context(|| format!("Invalid fuzzy range in {:?}", path))?;

        Ok(config)
    }

    /// Load from `path` when given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_range() {
        let range = FuzzyRange::default();
        assert_eq!(range.min, -1.0);
        assert_eq!(range.max, 1.0);
        assert_eq!(range.midpoint(), 0.0);
    }

    #[test]
    fn test_rejects_inverted_range() {
        assert!(FuzzyRange::new(1.0, -1.0).is_err());
        assert!(FuzzyRange::new(0.0, 0.0).is_err());
        assert!(FuzzyRange::new(0.0, 1.0).is_ok());
    }

    #[test]
    fn test_complement_reflects_about_midpoint() {
        assert_eq!(FuzzyRange::default().complement(0.25), -0.25);
        let range = FuzzyRange::new(0.0, 4.0).unwrap();
        assert_eq!(range.complement(1.0), 3.0);
        assert_eq!(range.complement(range.complement(3.0)), 3.0);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fuzzy": {{ "min": 0.0, "max": 1.0 }}, "parallel": true }}"#).unwrap();

        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.fuzzy, FuzzyRange { min: 0.0, max: 1.0 });
        assert!(config.parallel);
    }

    #[test]
    fn test_load_rejects_bad_range() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "fuzzy": {{ "min": 2.0, "max": 1.0 }} }}"#).unwrap();
        assert!(EngineConfig::load(file.path()).is_err());
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: EngineConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.fuzzy, FuzzyRange::default());
        assert!(!config.parallel);
    }
}
