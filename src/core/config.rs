//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{CoreshedError, Result};
use crate::core::paths::normalize_base_path;

/// Full coreshed configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub share: ShareConfig,
    pub scan: ScanConfig,
    pub cache: CacheConfig,
    pub paths: PathsConfig,
}

/// Share endpoint and credentials.
///
/// When `mount_path` is set the share is assumed to be mounted into the
/// local filesystem at that path and the network fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ShareConfig {
    pub server: String,
    pub share: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    pub mount_path: Option<PathBuf>,
}

/// Scanner behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScanConfig {
    /// Subtree root within the share from which recursive scanning begins.
    pub base_path: String,
    /// Case-insensitive file extension filter.
    pub extensions: Vec<String>,
    /// Maximum directory depth below the base path; `None` is unbounded.
    pub max_depth: Option<usize>,
}

/// Scan-result cache tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheConfig {
    pub ttl_secs: u64,
}

/// Filesystem paths used by coreshed itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: PathBuf,
    pub jsonl_log: PathBuf,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            server: String::new(),
            share: String::new(),
            username: String::new(),
            password: String::new(),
            domain: "WORKGROUP".to_string(),
            mount_path: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_path: "/incoming/Orexplore".to_string(),
            extensions: vec!["jpg".to_string()],
            max_depth: None,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 30 }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        let home_dir = env::var_os("HOME").map_or_else(
            || {
                eprintln!(
                    "[CSH-CONFIG] WARNING: HOME not set, falling back to /tmp for data paths"
                );
                PathBuf::from("/tmp")
            },
            PathBuf::from,
        );
        let cfg = home_dir
            .join(".config")
            .join("coreshed")
            .join("config.toml");
        let data = home_dir.join(".local").join("share").join("coreshed");
        Self {
            config_file: cfg,
            jsonl_log: data.join("activity.jsonl"),
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        PathsConfig::default().config_file
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| CoreshedError::Io {
                path: path_buf.display().to_string(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(CoreshedError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.paths.config_file = path_buf;
        cfg.apply_env_overrides_from(|key| env::var(key).ok())?;
        cfg.normalize();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `CORESHED_*` overrides through an injectable lookup so tests
    /// never touch the process environment.
    pub fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        if let Some(raw) = lookup("CORESHED_SHARE_SERVER") {
            self.share.server = raw;
        }
        if let Some(raw) = lookup("CORESHED_SHARE_NAME") {
            self.share.share = raw;
        }
        if let Some(raw) = lookup("CORESHED_SHARE_USERNAME") {
            self.share.username = raw;
        }
        if let Some(raw) = lookup("CORESHED_SHARE_PASSWORD") {
            self.share.password = raw;
        }
        if let Some(raw) = lookup("CORESHED_SHARE_DOMAIN") {
            self.share.domain = raw;
        }
        if let Some(raw) = lookup("CORESHED_SHARE_MOUNT_PATH") {
            self.share.mount_path = if raw.is_empty() {
                None
            } else {
                Some(PathBuf::from(raw))
            };
        }

        if let Some(raw) = lookup("CORESHED_SCAN_BASE_PATH") {
            self.scan.base_path = raw;
        }
        if let Some(raw) = lookup("CORESHED_SCAN_EXTENSIONS") {
            self.scan.extensions = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(raw) = lookup("CORESHED_SCAN_MAX_DEPTH") {
            self.scan.max_depth = if raw.is_empty() {
                None
            } else {
                Some(parse_env_usize("CORESHED_SCAN_MAX_DEPTH", &raw)?)
            };
        }

        if let Some(raw) = lookup("CORESHED_CACHE_TTL_SECS") {
            self.cache.ttl_secs = parse_env_u64("CORESHED_CACHE_TTL_SECS", &raw)?;
        }

        if let Some(raw) = lookup("CORESHED_JSONL_LOG") {
            self.paths.jsonl_log = PathBuf::from(raw);
        }

        Ok(())
    }

    /// Normalize values for consistent comparison.
    pub fn normalize(&mut self) {
        self.scan.base_path = normalize_base_path(&self.scan.base_path);
        for ext in &mut self.scan.extensions {
            // Stored lowercase without a leading dot; matching stays
            // case-insensitive either way.
            *ext = ext.trim_start_matches('.').to_ascii_lowercase();
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            return Err(CoreshedError::InvalidConfig {
                details: "cache.ttl_secs must be >= 1".to_string(),
            });
        }
        if self.scan.extensions.iter().any(String::is_empty) {
            return Err(CoreshedError::InvalidConfig {
                details: "scan.extensions must not contain empty entries".to_string(),
            });
        }
        if self.scan.max_depth == Some(0) {
            return Err(CoreshedError::InvalidConfig {
                details: "scan.max_depth must be >= 1 when set".to_string(),
            });
        }
        Ok(())
    }
}

fn parse_env_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| CoreshedError::InvalidConfig {
            details: format!("{key} must be an unsigned integer, got {raw:?}"),
        })
}

fn parse_env_usize(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| CoreshedError::InvalidConfig {
            details: format!("{key} must be an unsigned integer, got {raw:?}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(map: &HashMap<&str, &str>) -> impl FnMut(&str) -> Option<String> + '_ {
        move |key| map.get(key).map(|v| (*v).to_string())
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.cache.ttl_secs, 30);
        assert_eq!(cfg.scan.extensions, vec!["jpg".to_string()]);
        assert_eq!(cfg.scan.base_path, "/incoming/Orexplore");
        assert_eq!(cfg.share.domain, "WORKGROUP");
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let raw = r#"
            [share]
            server = "172.16.11.107"
            share = "pond"
            username = "scanner"

            [cache]
            ttl_secs = 60
        "#;
        let cfg: Config = toml::from_str(raw).unwrap();
        assert_eq!(cfg.share.server, "172.16.11.107");
        assert_eq!(cfg.cache.ttl_secs, 60);
        // Untouched sections keep defaults.
        assert_eq!(cfg.scan.base_path, "/incoming/Orexplore");
        assert_eq!(cfg.share.domain, "WORKGROUP");
    }

    #[test]
    fn env_overrides_take_effect() {
        let mut cfg = Config::default();
        let vars = HashMap::from([
            ("CORESHED_SHARE_SERVER", "10.0.0.9"),
            ("CORESHED_SCAN_BASE_PATH", "incoming/scans/"),
            ("CORESHED_SCAN_EXTENSIONS", "jpg, PNG , tiff"),
            ("CORESHED_CACHE_TTL_SECS", "120"),
        ]);
        cfg.apply_env_overrides_from(lookup_from(&vars)).unwrap();
        cfg.normalize();

        assert_eq!(cfg.share.server, "10.0.0.9");
        assert_eq!(cfg.scan.base_path, "/incoming/scans");
        assert_eq!(
            cfg.scan.extensions,
            vec!["jpg".to_string(), "png".to_string(), "tiff".to_string()]
        );
        assert_eq!(cfg.cache.ttl_secs, 120);
    }

    #[test]
    fn malformed_numeric_override_is_rejected() {
        let mut cfg = Config::default();
        let vars = HashMap::from([("CORESHED_CACHE_TTL_SECS", "soon")]);
        let err = cfg
            .apply_env_overrides_from(lookup_from(&vars))
            .unwrap_err();
        assert_eq!(err.code(), "CSH-1001");
    }

    #[test]
    fn zero_ttl_fails_validation() {
        let mut cfg = Config::default();
        cfg.cache.ttl_secs = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("ttl_secs"));
    }

    #[test]
    fn zero_max_depth_fails_validation() {
        let mut cfg = Config::default();
        cfg.scan.max_depth = Some(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn normalize_lowercases_extensions_and_strips_dots() {
        let mut cfg = Config::default();
        cfg.scan.extensions = vec![".JPG".to_string(), "Png".to_string()];
        cfg.normalize();
        assert_eq!(
            cfg.scan.extensions,
            vec!["jpg".to_string(), "png".to_string()]
        );
    }

    #[test]
    fn explicit_missing_config_path_is_an_error() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert_eq!(err.code(), "CSH-1002");
    }

    #[test]
    fn load_reads_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[scan]\nbase_path = \"incoming/Orexplore\"\n[cache]\nttl_secs = 15\n",
        )
        .unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.scan.base_path, "/incoming/Orexplore");
        assert_eq!(cfg.cache.ttl_secs, 15);
        assert_eq!(cfg.paths.config_file, path);
    }
}
