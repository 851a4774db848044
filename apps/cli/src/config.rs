//! Planner configuration read from YAML.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use trip_budget::ScenarioNights;
use trip_core::validate_layover_extra_nights;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "planner.yaml";

/// Presentation-layer settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlannerConfig {
    /// JSON key-value file holding persisted records.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// Extra Bali nights in the extend-stay scenario.
    #[serde(default = "default_extend_stay_nights")]
    pub extend_stay_nights: u32,
    /// Extra Bali nights in the layover scenario (0, 1 or 2).
    #[serde(default = "default_layover_extra_nights")]
    pub layover_extra_nights: u32,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./saves/planner.json")
}

fn default_extend_stay_nights() -> u32 {
    3
}

fn default_layover_extra_nights() -> u32 {
    1
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            extend_stay_nights: default_extend_stay_nights(),
            layover_extra_nights: default_layover_extra_nights(),
        }
    }
}

impl PlannerConfig {
    /// Parse YAML text; an empty document yields defaults.
    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        let cfg: Self = serde_yaml::from_str(text).context("invalid planner config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load `path`, or [`DEFAULT_CONFIG_FILE`] if present, or defaults.
    /// An explicitly named file must exist.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };
        match std::fs::read_to_string(&path) {
            Ok(text) => Self::from_yaml(&text).with_context(|| format!("in {}", path.display())),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_layover_extra_nights(self.layover_extra_nights)?;
        Ok(())
    }

    pub fn scenario_nights(&self) -> ScenarioNights {
        ScenarioNights {
            extend_stay: self.extend_stay_nights,
            layover: self.layover_extra_nights,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_yaml_is_default() {
        assert_eq!(PlannerConfig::from_yaml("").unwrap(), PlannerConfig::default());
        assert_eq!(
            PlannerConfig::default().scenario_nights(),
            ScenarioNights::default()
        );
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let cfg = PlannerConfig::from_yaml("extend_stay_nights: 5\n").unwrap();
        assert_eq!(cfg.extend_stay_nights, 5);
        assert_eq!(cfg.layover_extra_nights, 1);
        assert_eq!(cfg.store_path, default_store_path());
    }

    #[test]
    fn layover_nights_outside_contract_rejected() {
        assert!(PlannerConfig::from_yaml("layover_extra_nights: 3\n").is_err());
        assert!(PlannerConfig::from_yaml("layover_extra_nights: 2\n").is_ok());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(PlannerConfig::from_yaml("theme: dark\n").is_err());
    }

    #[test]
    fn named_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.yaml");
        assert!(PlannerConfig::load(Some(&missing)).is_err());

        let path = dir.path().join("planner.yaml");
        std::fs::write(&path, "store_path: /tmp/x.json\nlayover_extra_nights: 0\n").unwrap();
        let cfg = PlannerConfig::load(Some(&path)).unwrap();
        assert_eq!(cfg.store_path, PathBuf::from("/tmp/x.json"));
        assert_eq!(cfg.layover_extra_nights, 0);
    }
}
