//! Adapter traits for talking to the scan share.
//!
//! The scanner and portal only ever see these traits; the concrete backend
//! (SMB client, local mount, in-memory fake) is chosen at the composition
//! root. No retry logic lives here — failures surface as the typed errors
//! in [`crate::core::errors`] for the caller to classify.

use crate::core::errors::Result;

/// One directory listing record as the share reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareEntry {
    pub name: String,
    pub is_directory: bool,
    pub size_bytes: u64,
}

/// An established session against the share.
///
/// Sessions are used by a single thread at a time; share them by handing
/// out fresh sessions from a [`ShareConnector`] instead.
///
/// Implementations must return listings in a stable order (sorted by name)
/// so repeated traversals of an unchanged share are deterministic.
pub trait ShareSession {
    /// List one directory. Paths are `/`-separated and rooted at the share.
    fn list_dir(&self, path: &str) -> Result<Vec<ShareEntry>>;

    /// Read a whole file.
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
}

/// Hands out connected sessions. Shared freely across request threads.
pub trait ShareConnector: Send + Sync {
    /// Establish a fresh session, authenticating where the backend needs it.
    fn connect(&self) -> Result<Box<dyn ShareSession>>;

    /// Human-readable endpoint label for logs and diagnostics.
    fn describe(&self) -> String;
}
