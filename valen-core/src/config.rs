use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::engine::SnapshotFormat;
use crate::model::DEFAULT_REFRESH_INTERVAL;

/// Runtime configuration for a Valen front-end
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValenConfig {
    /// Snapshot written by the monitor
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,

    /// Free-text site notice (downtime announcements)
    #[serde(default = "default_notice_file")]
    pub notice_file: PathBuf,

    /// Refresh interval in seconds when the snapshot does not set one
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// Snapshot format (json, legacy)
    #[serde(default)]
    pub format: SnapshotFormat,

    /// Also list facilities the snapshot marks as hidden
    #[serde(default)]
    pub show_hidden: bool,
}

fn default_report_file() -> PathBuf {
    PathBuf::from("/var/lib/valen/report.json")
}
fn default_notice_file() -> PathBuf {
    PathBuf::from("/var/lib/valen/notice.html")
}
fn default_refresh_interval() -> u64 {
    DEFAULT_REFRESH_INTERVAL
}

impl Default for ValenConfig {
    fn default() -> Self {
        Self {
            report_file: default_report_file(),
            notice_file: default_notice_file(),
            refresh_interval: default_refresh_interval(),
            format: SnapshotFormat::default(),
            show_hidden: false,
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("refresh_interval must be a positive number of seconds")]
    InvalidRefreshInterval,
    #[error("no config file found, searched: {searched:?}")]
    NotFound { searched: Vec<PathBuf> },
}

impl ValenConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a string (useful for testing)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        // An empty file is a valid, all-defaults config.
        let config: ValenConfig = if content.trim().is_empty() {
            ValenConfig::default()
        } else {
            serde_yaml::from_str(content)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Search for a config file in standard locations
    pub fn discover(start_dir: &Path) -> Result<(PathBuf, Self), ConfigError> {
        let names = ["valen.yaml", "valen.yml", ".valen.yaml", ".valen.yml"];
        let mut searched = Vec::new();

        // Check environment variable first
        if let Ok(env_path) = std::env::var("VALEN_CONFIG") {
            let path = PathBuf::from(&env_path);
            if path.exists() {
                return Ok((path.clone(), Self::load(&path)?));
            }
            searched.push(path);
        }

        Self::discover_in(start_dir, &names, searched)
    }

    fn discover_in(
        start_dir: &Path,
        names: &[&str],
        mut searched: Vec<PathBuf>,
    ) -> Result<(PathBuf, Self), ConfigError> {
        // Search the start directory and its parents
        let mut dir = Some(start_dir);
        while let Some(current) = dir {
            for name in names {
                let path = current.join(name);
                if path.exists() {
                    return Ok((path.clone(), Self::load(&path)?));
                }
                searched.push(path);
            }
            dir = current.parent();
        }

        Err(ConfigError::NotFound { searched })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval == 0 {
            return Err(ConfigError::InvalidRefreshInterval);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
report_file: /srv/valen/report.json
notice_file: /srv/valen/notice.txt
refresh_interval: 300
format: legacy
show_hidden: true
"#;
        let config = ValenConfig::from_str(yaml).unwrap();
        assert_eq!(config.report_file, PathBuf::from("/srv/valen/report.json"));
        assert_eq!(config.notice_file, PathBuf::from("/srv/valen/notice.txt"));
        assert_eq!(config.refresh_interval, 300);
        assert_eq!(config.format, SnapshotFormat::Legacy);
        assert!(config.show_hidden);
    }

    #[test]
    fn test_defaults() {
        let config = ValenConfig::from_str("refresh_interval: 60\n").unwrap();
        assert_eq!(config.report_file, default_report_file());
        assert_eq!(config.format, SnapshotFormat::Json);
        assert!(!config.show_hidden);

        assert_eq!(ValenConfig::from_str("").unwrap(), ValenConfig::default());
    }

    #[test]
    fn test_zero_refresh_interval_rejected() {
        let result = ValenConfig::from_str("refresh_interval: 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidRefreshInterval)));
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result = ValenConfig::from_str("format: xml\n");
        assert!(matches!(result, Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_discover_walks_parents() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join("valen.yml"), "refresh_interval: 42\n").unwrap();

        let (path, config) =
            ValenConfig::discover_in(&nested, &["valen.yaml", "valen.yml"], Vec::new()).unwrap();
        assert_eq!(path, root.path().join("valen.yml"));
        assert_eq!(config.refresh_interval, 42);
    }

    #[test]
    fn test_discover_not_found() {
        let root = tempfile::tempdir().unwrap();
        let result = ValenConfig::discover_in(root.path(), &["valen-missing.yaml"], Vec::new());
        match result {
            Err(ConfigError::NotFound { searched }) => {
                assert_eq!(searched[0], root.path().join("valen-missing.yaml"));
            }
            other => panic!("expected NotFound, got {:?}", other.map(|(p, _)| p)),
        }
    }
}
