//! Portal facade: the surface the web layer talks to.
//!
//! Owns the caches, the validator, and an optional activity log, and opens
//! a fresh share session per operation through the injected connector. One
//! instance is constructed at application startup and shared across request
//! threads.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::cache::{CacheStats, TtlCache};
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::core::paths::normalize_base_path;
use crate::logger::jsonl::{EventType, JsonlWriter, LogEntry, Severity};
use crate::scanner::batches::{BatchScanner, DiscoveryResult, ShareBatch};
use crate::scanner::walker::{ScanOptions, ScanResult, ShareWalker};
use crate::share::session::{ShareConnector, ShareSession};
use crate::validate::{BatchRecord, BatchValidator, ValidationResult};

/// Facade over the share for the image viewer and operations portal.
pub struct SharePortal {
    connector: Arc<dyn ShareConnector>,
    base_path: String,
    scan_options: ScanOptions,
    scan_cache: TtlCache<Arc<ScanResult>>,
    discovery_cache: TtlCache<Arc<DiscoveryResult>>,
    validator: BatchValidator,
    logger: Option<Mutex<JsonlWriter>>,
}

impl SharePortal {
    /// Build a portal from configuration and an explicit connector.
    #[must_use]
    pub fn new(config: &Config, connector: Arc<dyn ShareConnector>) -> Self {
        let ttl = Duration::from_secs(config.cache.ttl_secs);
        Self {
            connector,
            base_path: normalize_base_path(&config.scan.base_path),
            scan_options: ScanOptions::from_config(&config.scan),
            scan_cache: TtlCache::with_system_clock(ttl),
            discovery_cache: TtlCache::with_system_clock(ttl),
            validator: BatchValidator::new(),
            logger: None,
        }
    }

    /// Build a portal choosing the connector from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let connector = crate::share::connector_from_config(&config.share)?;
        Ok(Self::new(config, connector))
    }

    /// Attach an activity log.
    #[must_use]
    pub fn with_logger(mut self, writer: JsonlWriter) -> Self {
        self.logger = Some(Mutex::new(writer));
        self
    }

    /// Cached scan of the configured base path with the image filter.
    pub fn get_images(&self) -> Result<Arc<ScanResult>> {
        self.scan_path(&self.base_path)
    }

    /// Cached scan of an explicit subtree with the configured filter.
    pub fn scan_path(&self, base_path: &str) -> Result<Arc<ScanResult>> {
        let base = normalize_base_path(base_path);
        let key = self.scan_key(&base);
        self.scan_cache
            .get_or_compute(&key, || self.scan_now(&base))
    }

    /// Force a rescan of the configured base path, bypassing the cache.
    pub fn refresh(&self) -> Result<Arc<ScanResult>> {
        self.refresh_path(&self.base_path)
    }

    /// Force a rescan of an explicit subtree.
    pub fn refresh_path(&self, base_path: &str) -> Result<Arc<ScanResult>> {
        let base = normalize_base_path(base_path);
        let key = self.scan_key(&base);
        self.scan_cache.invalidate(&key);
        self.log({
            let mut entry = LogEntry::new(EventType::CacheRefresh, Severity::Info);
            entry.path = Some(base.clone());
            entry
        });
        self.scan_cache
            .get_or_compute(&key, || self.scan_now(&base))
    }

    /// Counters for the scan-result cache.
    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.scan_cache.stats()
    }

    /// Counters for the batch-discovery cache.
    #[must_use]
    pub fn discovery_cache_stats(&self) -> CacheStats {
        self.discovery_cache.stats()
    }

    /// Cached discovery of every batch under the base path.
    pub fn discover_batches(&self) -> Result<Arc<DiscoveryResult>> {
        let key = format!("batches:{}", self.base_path);
        self.discovery_cache
            .get_or_compute(&key, || self.discover_now(None))
    }

    /// Cached discovery restricted to one hole.
    pub fn batches_for_hole(&self, hole_id: &str) -> Result<Vec<ShareBatch>> {
        let key = format!("hole:{}:{hole_id}", self.base_path);
        let result = self
            .discovery_cache
            .get_or_compute(&key, || self.discover_now(Some(hole_id)))?;
        Ok(result.batches.clone())
    }

    /// Validate an operator-entered record against the share.
    pub fn validate_batch(&self, batch: &BatchRecord) -> Result<ValidationResult> {
        let discovered = self.batches_for_hole(&batch.hole_id)?;
        let result = self.validator.validate_batch(batch, &discovered);

        self.log({
            let mut entry = LogEntry::new(
                EventType::ValidationComplete,
                if result.has_discrepancies {
                    Severity::Warning
                } else {
                    Severity::Info
                },
            );
            entry.hole_id = Some(batch.hole_id.clone());
            entry.ok = Some(!result.has_discrepancies);
            entry.details = Some(result.message.clone());
            entry
        });
        Ok(result)
    }

    /// Connect and list the base path, proving the share is usable.
    pub fn check_connection(&self) -> Result<()> {
        let session = self.connect()?;
        session.list_dir(&self.base_path)?;
        Ok(())
    }

    /// Endpoint label for diagnostics.
    #[must_use]
    pub fn describe_share(&self) -> String {
        self.connector.describe()
    }

    /// Flush buffered activity-log lines. Callers that terminate the
    /// process without unwinding should flush first.
    pub fn flush_logs(&self) {
        if let Some(logger) = &self.logger {
            logger.lock().flush();
        }
    }

    // ──────────────────────── internals ────────────────────────

    fn scan_key(&self, base: &str) -> String {
        format!("scan:{base}|{}", self.scan_options.extensions.join(","))
    }

    fn connect(&self) -> Result<Box<dyn ShareSession>> {
        self.connector.connect().inspect_err(|e| {
            self.log({
                let mut entry = LogEntry::new(EventType::ShareError, Severity::Critical);
                entry.error_code = Some(e.code().to_string());
                entry.error_message = Some(e.to_string());
                entry.details = Some(self.connector.describe());
                entry
            });
        })
    }

    fn scan_now(&self, base: &str) -> Result<Arc<ScanResult>> {
        let started = Instant::now();
        let walker = ShareWalker::new(self.scan_options.clone());
        let outcome = self
            .connect()
            .and_then(|session| walker.scan(session.as_ref(), base));

        match outcome {
            Ok(result) => {
                self.log({
                    let mut entry = LogEntry::new(
                        EventType::ScanComplete,
                        if result.is_clean() {
                            Severity::Info
                        } else {
                            Severity::Warning
                        },
                    );
                    entry.path = Some(base.to_string());
                    entry.entry_count = Some(result.entries.len());
                    entry.error_count = Some(result.errors.len());
                    entry.duration_ms = Some(elapsed_ms(started));
                    entry.ok = Some(true);
                    entry
                });
                Ok(Arc::new(result))
            }
            Err(e) => {
                self.log({
                    let mut entry = LogEntry::new(EventType::ScanFailed, Severity::Critical);
                    entry.path = Some(base.to_string());
                    entry.duration_ms = Some(elapsed_ms(started));
                    entry.ok = Some(false);
                    entry.error_code = Some(e.code().to_string());
                    entry.error_message = Some(e.to_string());
                    entry
                });
                Err(e)
            }
        }
    }

    fn discover_now(&self, hole_id: Option<&str>) -> Result<Arc<DiscoveryResult>> {
        let started = Instant::now();
        let session = self.connect()?;
        let scanner = BatchScanner::new(&self.base_path);
        let result = match hole_id {
            Some(hole) => scanner.for_hole(session.as_ref(), hole),
            None => scanner.discover(session.as_ref()),
        }?;

        self.log({
            let mut entry = LogEntry::new(EventType::DiscoveryComplete, Severity::Info);
            entry.path = Some(self.base_path.clone());
            entry.hole_id = hole_id.map(str::to_string);
            entry.batch_count = Some(result.batches.len());
            entry.error_count = Some(result.errors.len());
            entry.duration_ms = Some(elapsed_ms(started));
            entry.ok = Some(true);
            entry
        });
        Ok(Arc::new(result))
    }

    fn log(&self, entry: LogEntry) {
        if let Some(logger) = &self.logger {
            logger.lock().write_entry(&entry);
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
