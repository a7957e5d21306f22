//! Session adapter for the scan share: traits, local-mount backend, SMB backend.

pub mod local;
pub mod session;
#[cfg(feature = "smb")]
pub mod smb;

use std::sync::Arc;

use crate::core::config::ShareConfig;
use crate::core::errors::Result;
use self::session::ShareConnector;

/// Build a connector from configuration.
///
/// A configured `mount_path` wins (the share is already mounted locally);
/// otherwise the SMB backend is used when compiled in.
pub fn connector_from_config(config: &ShareConfig) -> Result<Arc<dyn ShareConnector>> {
    if let Some(mount) = &config.mount_path {
        return Ok(Arc::new(local::LocalConnector::new(mount.clone())));
    }

    #[cfg(feature = "smb")]
    {
        Ok(Arc::new(smb::SmbConnector::new(config.clone())))
    }

    #[cfg(not(feature = "smb"))]
    {
        Err(crate::core::errors::CoreshedError::InvalidConfig {
            details: "no share.mount_path configured and SMB support is not compiled in \
                      (enable the `smb` feature)"
                .to_string(),
        })
    }
}
