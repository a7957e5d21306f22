//! SMB backend over libsmbclient via the `pavao` bindings.
//!
//! Compiled behind the `smb` feature because it links against the system
//! libsmbclient. Deployments that mount the share instead use
//! [`crate::share::local`].

use std::io::{ErrorKind, Read};

use pavao::{SmbClient, SmbCredentials, SmbDirentType, SmbError, SmbOpenOptions, SmbOptions};

use crate::core::config::ShareConfig;
use crate::core::errors::{CoreshedError, Result};
use crate::core::paths::join_share_path;
use crate::share::session::{ShareConnector, ShareEntry, ShareSession};

/// Connector that opens a fresh SMB client per session.
pub struct SmbConnector {
    config: ShareConfig,
}

impl SmbConnector {
    #[must_use]
    pub fn new(config: ShareConfig) -> Self {
        Self { config }
    }

    fn server_url(&self) -> String {
        format!("smb://{}", self.config.server)
    }

    fn share_root(&self) -> String {
        if self.config.share.starts_with('/') {
            self.config.share.clone()
        } else {
            format!("/{}", self.config.share)
        }
    }
}

impl ShareConnector for SmbConnector {
    fn connect(&self) -> Result<Box<dyn ShareSession>> {
        let server = self.describe();
        let client = SmbClient::new(
            SmbCredentials::default()
                .server(self.server_url())
                .share(self.share_root())
                .username(self.config.username.clone())
                .password(self.config.password.clone())
                .workgroup(self.config.domain.clone()),
            SmbOptions::default()
                .case_sensitive(false)
                .one_share_per_server(true),
        )
        .map_err(|e| map_connect_error(&server, e))?;

        let session = SmbShare { server, client };
        // libsmbclient connects lazily; probe the share root so connection
        // and authentication failures classify here instead of mid-scan.
        session.probe_root()?;
        Ok(Box::new(session))
    }

    fn describe(&self) -> String {
        format!("{}{}", self.server_url(), self.share_root())
    }
}

/// Session over one SMB client handle.
pub struct SmbShare {
    server: String,
    client: SmbClient,
}

impl SmbShare {
    fn probe_root(&self) -> Result<()> {
        self.client
            .stat("/")
            .map_err(|e| map_connect_error(&self.server, e))?;
        Ok(())
    }
}

impl ShareSession for SmbShare {
    fn list_dir(&self, path: &str) -> Result<Vec<ShareEntry>> {
        let dirents = self
            .client
            .list_dir(path)
            .map_err(|e| map_path_error(&self.server, path, e))?;

        let mut entries = Vec::new();
        for dirent in dirents {
            let name = dirent.name().to_string();
            if name.is_empty() || name == "." || name == ".." {
                continue;
            }
            let is_directory = match dirent.get_type() {
                SmbDirentType::Dir => true,
                SmbDirentType::File => false,
                // Workgroup/server/printer/IPC listings never appear below a
                // share root we scan.
                _ => continue,
            };
            let size_bytes = if is_directory {
                0
            } else {
                let full = join_share_path(path, &name);
                self.client.stat(&full).map(|s| s.size).unwrap_or(0)
            };
            entries.push(ShareEntry {
                name,
                is_directory,
                size_bytes,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let mut file = self
            .client
            .open_with(path, SmbOpenOptions::default().read(true))
            .map_err(|e| map_path_error(&self.server, path, e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)
            .map_err(|e| CoreshedError::io(path, e))?;
        Ok(buf)
    }
}

/// Classify a failure while establishing or probing the connection.
/// Credentials problems must surface distinctly from network ones.
fn map_connect_error(server: &str, err: SmbError) -> CoreshedError {
    match err {
        SmbError::Io(io) if io.kind() == ErrorKind::PermissionDenied => CoreshedError::Auth {
            server: server.to_string(),
            details: io.to_string(),
        },
        other => CoreshedError::Connection {
            server: server.to_string(),
            details: other.to_string(),
        },
    }
}

/// Classify a failure against one share path during an established session.
fn map_path_error(server: &str, path: &str, err: SmbError) -> CoreshedError {
    match err {
        SmbError::Io(io) => classify_io(server, path, io),
        other => CoreshedError::Connection {
            server: server.to_string(),
            details: other.to_string(),
        },
    }
}

fn classify_io(server: &str, path: &str, io: std::io::Error) -> CoreshedError {
    match io.kind() {
        ErrorKind::NotFound => CoreshedError::NotFound {
            path: path.to_string(),
        },
        ErrorKind::PermissionDenied => CoreshedError::AccessDenied {
            path: path.to_string(),
        },
        ErrorKind::ConnectionRefused
        | ErrorKind::ConnectionReset
        | ErrorKind::ConnectionAborted
        | ErrorKind::NotConnected
        | ErrorKind::TimedOut
        | ErrorKind::HostUnreachable
        | ErrorKind::NetworkUnreachable
        | ErrorKind::NetworkDown => CoreshedError::Connection {
            server: server.to_string(),
            details: io.to_string(),
        },
        _ => CoreshedError::io(path, io),
    }
}
