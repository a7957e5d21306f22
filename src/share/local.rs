//! Local-mount backend: serves a share subtree already mounted into the
//! local filesystem (mount.cifs and friends).

use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::core::errors::{CoreshedError, Result};
use crate::share::session::{ShareConnector, ShareEntry, ShareSession};

/// Connector for a locally mounted share.
#[derive(Debug, Clone)]
pub struct LocalConnector {
    root: PathBuf,
}

impl LocalConnector {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }
}

impl ShareConnector for LocalConnector {
    fn connect(&self) -> Result<Box<dyn ShareSession>> {
        if !self.root.is_dir() {
            return Err(CoreshedError::Connection {
                server: self.describe(),
                details: "mount path is not a directory".to_string(),
            });
        }
        Ok(Box::new(LocalShare {
            root: self.root.clone(),
        }))
    }

    fn describe(&self) -> String {
        format!("mount:{}", self.root.display())
    }
}

/// Session over a locally mounted share subtree.
pub struct LocalShare {
    root: PathBuf,
}

impl LocalShare {
    /// Map a share path onto the mount, rejecting parent-directory escapes.
    fn resolve(&self, share_path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        for segment in share_path.split('/').filter(|s| !s.is_empty()) {
            let component = Path::new(segment);
            if component
                .components()
                .any(|c| matches!(c, Component::ParentDir | Component::RootDir))
            {
                return Err(CoreshedError::AccessDenied {
                    path: share_path.to_string(),
                });
            }
            resolved.push(segment);
        }
        Ok(resolved)
    }
}

impl ShareSession for LocalShare {
    fn list_dir(&self, path: &str) -> Result<Vec<ShareEntry>> {
        let dir = self.resolve(path)?;
        let reader = fs::read_dir(&dir).map_err(|e| classify_io(path, e))?;

        let mut entries = Vec::new();
        for entry in reader {
            let entry = entry.map_err(|e| classify_io(path, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let meta = entry.metadata().map_err(|e| classify_io(path, e))?;
            entries.push(ShareEntry {
                name,
                is_directory: meta.is_dir(),
                size_bytes: if meta.is_dir() { 0 } else { meta.len() },
            });
        }
        // read_dir order is filesystem-dependent; the session contract
        // promises a stable listing order.
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let file = self.resolve(path)?;
        fs::read(&file).map_err(|e| classify_io(path, e))
    }
}

fn classify_io(share_path: &str, err: std::io::Error) -> CoreshedError {
    match err.kind() {
        ErrorKind::NotFound => CoreshedError::NotFound {
            path: share_path.to_string(),
        },
        ErrorKind::PermissionDenied => CoreshedError::AccessDenied {
            path: share_path.to_string(),
        },
        _ => CoreshedError::io(share_path, err),
    }
}
