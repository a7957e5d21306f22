#![forbid(unsafe_code)]

//! coreshed — share-scanning helper for drill-core scan imagery.
//!
//! Sits in front of an SMB file share holding drill-core scan images and
//! per-batch metadata, and gives the web layer three things:
//! 1. **Recursive scanner** — walks the share collecting image files while
//!    tolerating unreadable subtrees
//! 2. **TTL cache** — memoizes scan results so request threads don't hammer
//!    the share
//! 3. **Discrepancy validator** — diffs operator-entered batch records
//!    against what the share actually holds
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use coreshed::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use coreshed::core::config::Config;
//! use coreshed::scanner::walker::{ScanOptions, ShareWalker};
//! ```

pub mod prelude;

pub mod cache;
pub mod core;
pub mod logger;
pub mod portal;
pub mod scanner;
pub mod share;
pub mod validate;
