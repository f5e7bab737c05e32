//! Configuration file and well-known paths

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::pager::PagerConfig;

pub const DEFAULT_MIRROR_URL: &str = "https://mainnet-public.mirrornode.hedera.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub mirror_url: String,
    pub page_size: usize,
    pub max_limit: usize,
    pub presumed_row_count: usize,
    pub update_period_ms: u64,
    /// 0 keeps auto-refresh running forever
    pub max_auto_update_count: u32,
    pub request_timeout_ms: u64,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        let pager = PagerConfig::default();
        Self {
            mirror_url: DEFAULT_MIRROR_URL.to_string(),
            page_size: pager.page_size,
            max_limit: pager.max_limit,
            presumed_row_count: pager.presumed_row_count,
            update_period_ms: pager.update_period.as_millis() as u64,
            max_auto_update_count: pager.max_auto_update_count,
            request_timeout_ms: 10_000,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Parse a TOML document and validate it
    pub fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config = toml::from_str::<Config>(content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("page_size", self.page_size as u64),
            ("max_limit", self.max_limit as u64),
            ("presumed_row_count", self.presumed_row_count as u64),
            ("update_period_ms", self.update_period_ms),
            ("request_timeout_ms", self.request_timeout_ms),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be greater than zero".to_string(),
                });
            }
        }

        let url = Url::parse(&self.mirror_url).map_err(|err| ConfigError::Invalid {
            field: "mirror_url",
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Invalid {
                field: "mirror_url",
                reason: format!("unsupported scheme {:?}", url.scheme()),
            });
        }
        Ok(())
    }

    pub fn to_pager_config(&self) -> PagerConfig {
        PagerConfig {
            page_size: self.page_size,
            max_limit: self.max_limit,
            presumed_row_count: self.presumed_row_count,
            update_period: Duration::from_millis(self.update_period_ms),
            max_auto_update_count: self.max_auto_update_count,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Load the config file; a missing file yields the defaults
pub fn load() -> Result<Config, ConfigError> {
    let Some(path) = config_path() else {
        return Ok(Config::default());
    };
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(source) => {
            return Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    Config::parse(&content, path)
}

pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("LEDGERSCOPE_CONFIG").map(PathBuf::from) {
        return Some(path);
    }
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        return Some(xdg.join("ledgerscope").join("config.toml"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".config").join("ledgerscope").join("config.toml"));
    }

    directories::ProjectDirs::from("io", "ledgerscope", "ledgerscope")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

pub fn data_dir() -> Option<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").map(PathBuf::from) {
        return Some(xdg.join("ledgerscope"));
    }
    if let Some(home) = std::env::var_os("HOME").map(PathBuf::from) {
        return Some(home.join(".local").join("share").join("ledgerscope"));
    }
    directories::ProjectDirs::from("io", "ledgerscope", "ledgerscope")
        .map(|dirs| dirs.data_dir().to_path_buf())
}

pub fn log_path() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("ledgerscope.log"))
}

pub fn export_dir() -> Option<PathBuf> {
    data_dir().map(|dir| dir.join("exports"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> Result<Config, ConfigError> {
        Config::parse(content, Path::new("config.toml"))
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.to_pager_config(), PagerConfig::default());
    }

    #[test]
    fn test_values_override_defaults() {
        let config = parse(
            r#"
mirror_url = "https://testnet.mirrornode.hedera.com"
page_size = 25
update_period_ms = 2000
max_auto_update_count = 0
"#,
        )
        .unwrap();
        assert_eq!(config.page_size, 25);
        assert_eq!(config.max_limit, 100);
        let pager = config.to_pager_config();
        assert_eq!(pager.update_period, Duration::from_secs(2));
        assert_eq!(pager.max_auto_update_count, 0);
    }

    #[test]
    fn test_zero_sizes_are_rejected() {
        let err = parse("page_size = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "page_size", .. }));

        let err = parse("update_period_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "update_period_ms", .. }));
    }

    #[test]
    fn test_bad_documents_are_rejected() {
        assert!(matches!(parse("page_size = \"ten\""), Err(ConfigError::Parse { .. })));
        assert!(matches!(parse("colour = 1"), Err(ConfigError::Parse { .. })));
        assert!(matches!(
            parse("mirror_url = \"ftp://mirror\""),
            Err(ConfigError::Invalid { field: "mirror_url", .. })
        ));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max_limit = 50\nlog_level = \"debug\"\n").unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.max_limit, 50);
        assert_eq!(config.log_level, "debug");
    }
}
