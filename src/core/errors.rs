//! CSH-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, CoreshedError>;

/// Top-level error type for coreshed.
#[derive(Debug, Error)]
pub enum CoreshedError {
    #[error("[CSH-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[CSH-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[CSH-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[CSH-2001] cannot reach share on {server}: {details}")]
    Connection { server: String, details: String },

    #[error("[CSH-2002] authentication rejected by {server}: {details}")]
    Auth { server: String, details: String },

    #[error("[CSH-2101] share path not found: {path}")]
    NotFound { path: String },

    #[error("[CSH-2102] access denied on share path: {path}")]
    AccessDenied { path: String },

    #[error("[CSH-2301] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[CSH-3001] IO failure at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[CSH-3900] runtime failure: {details}")]
    Runtime { details: String },
}

impl CoreshedError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "CSH-1001",
            Self::MissingConfig { .. } => "CSH-1002",
            Self::ConfigParse { .. } => "CSH-1003",
            Self::Connection { .. } => "CSH-2001",
            Self::Auth { .. } => "CSH-2002",
            Self::NotFound { .. } => "CSH-2101",
            Self::AccessDenied { .. } => "CSH-2102",
            Self::Serialization { .. } => "CSH-2301",
            Self::Io { .. } => "CSH-3001",
            Self::Runtime { .. } => "CSH-3900",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Io { .. } | Self::Runtime { .. }
        )
    }

    /// Whether this failure must abort a whole scan rather than being
    /// recorded against one directory and skipped.
    ///
    /// Connection and authentication failures mean the share itself is
    /// unusable; `NotFound`/`AccessDenied`/`Io` only condemn one subtree.
    #[must_use]
    pub const fn is_fatal_for_scan(&self) -> bool {
        matches!(self, Self::Connection { .. } | Self::Auth { .. })
    }

    /// Convenience constructor for IO errors with a known share path.
    #[must_use]
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<serde_json::Error> for CoreshedError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for CoreshedError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<CoreshedError> {
        vec![
            CoreshedError::InvalidConfig {
                details: String::new(),
            },
            CoreshedError::MissingConfig {
                path: PathBuf::new(),
            },
            CoreshedError::ConfigParse {
                context: "",
                details: String::new(),
            },
            CoreshedError::Connection {
                server: String::new(),
                details: String::new(),
            },
            CoreshedError::Auth {
                server: String::new(),
                details: String::new(),
            },
            CoreshedError::NotFound {
                path: String::new(),
            },
            CoreshedError::AccessDenied {
                path: String::new(),
            },
            CoreshedError::Serialization {
                context: "",
                details: String::new(),
            },
            CoreshedError::Io {
                path: String::new(),
                source: std::io::Error::other("test"),
            },
            CoreshedError::Runtime {
                details: String::new(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_csh_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("CSH-"),
                "code {} must start with CSH-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = CoreshedError::Auth {
            server: "pond-srv".to_string(),
            details: "logon failure".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("CSH-2002"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("pond-srv"),
            "display should contain server: {msg}"
        );
    }

    #[test]
    fn only_connection_and_auth_are_fatal_for_scan() {
        for err in &all_variants() {
            let expect_fatal = matches!(
                err,
                CoreshedError::Connection { .. } | CoreshedError::Auth { .. }
            );
            assert_eq!(err.is_fatal_for_scan(), expect_fatal, "variant {err}");
        }
    }

    #[test]
    fn auth_errors_are_not_retryable() {
        assert!(
            !CoreshedError::Auth {
                server: String::new(),
                details: String::new(),
            }
            .is_retryable()
        );
        assert!(
            CoreshedError::Connection {
                server: String::new(),
                details: String::new(),
            }
            .is_retryable()
        );
    }

    #[test]
    fn io_convenience_constructor() {
        let err = CoreshedError::io(
            "/incoming/Orexplore",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.code(), "CSH-3001");
        assert!(err.to_string().contains("/incoming/Orexplore"));
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: CoreshedError = toml_err.into();
        assert_eq!(err.code(), "CSH-1003");
    }
}
