use crate::error::Result;
use crate::io::atomic_write;
use crate::log::DEFAULT_LOG_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// AutomationConfig
// ---------------------------------------------------------------------------

/// Host-tunable engine knobs, loaded from a yaml file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationConfig {
    /// Execution-log cap; the oldest entries are evicted past it.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
    /// Master switch for the reconciler; manual operations stay available.
    #[serde(default = "default_enabled")]
    pub automation_enabled: bool,
    /// Phases whose automation is forced off regardless of their definition.
    #[serde(default)]
    pub disabled_phases: Vec<String>,
}

fn default_log_capacity() -> usize {
    DEFAULT_LOG_CAPACITY
}

fn default_enabled() -> bool {
    true
}

impl Default for AutomationConfig {
    fn default() -> Self {
        Self {
            log_capacity: default_log_capacity(),
            automation_enabled: default_enabled(),
            disabled_phases: Vec::new(),
        }
    }
}

impl AutomationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: AutomationConfig = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispo.yaml");

        let mut config = AutomationConfig::default();
        config.log_capacity = 50;
        config.disabled_phases.push("ad_hoc".to_string());
        config.save(&path).unwrap();

        let loaded = AutomationConfig::load(&path).unwrap();
        assert_eq!(loaded.log_capacity, 50);
        assert_eq!(loaded.disabled_phases, vec!["ad_hoc"]);
        assert!(loaded.automation_enabled);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dispo.yaml");
        std::fs::write(&path, "automation_enabled: false\n").unwrap();

        let loaded = AutomationConfig::load(&path).unwrap();
        assert!(!loaded.automation_enabled);
        assert_eq!(loaded.log_capacity, DEFAULT_LOG_CAPACITY);
        assert!(loaded.disabled_phases.is_empty());
    }

    #[test]
    fn load_or_default_on_missing_file() {
        let dir = TempDir::new().unwrap();
        let config = AutomationConfig::load_or_default(&dir.path().join("missing.yaml")).unwrap();
        assert!(config.automation_enabled);
    }
}
