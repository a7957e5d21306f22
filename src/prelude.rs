//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use coreshed::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{CoreshedError, Result};

// Share
pub use crate::share::connector_from_config;
pub use crate::share::local::LocalConnector;
pub use crate::share::session::{ShareConnector, ShareEntry, ShareSession};

// Scanner
pub use crate::scanner::batches::{BatchScanner, DiscoveryResult, ShareBatch};
pub use crate::scanner::walker::{ScanEntry, ScanOptions, ScanResult, ShareWalker};

// Cache
pub use crate::cache::{CacheStats, Clock, SystemClock, TtlCache};

// Validation
pub use crate::validate::{
    BatchRecord, BatchValidator, Discrepancy, ValidationResult, VerificationResult,
    verify_data_exists,
};

// Portal
pub use crate::portal::SharePortal;
