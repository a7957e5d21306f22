#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use coreshed::core::errors::Result;
use coreshed::share::local::LocalConnector;
use coreshed::share::session::{ShareConnector, ShareSession};

/// Lay out the canonical share fixture under `root`:
///
/// ```text
/// incoming/Orexplore/
///   DDH-001/batch-100.5/{depth.txt, scan_001.jpg, scan_002.JPG}
///   DDH-001/batch-200.8/{depth.txt, scan_003.jpg}
///   DDH-002/batch-50/depth.txt
/// ```
pub fn build_share_fixture(root: &Path) {
    let base = root.join("incoming").join("Orexplore");

    let b1 = base.join("DDH-001").join("batch-100.5");
    fs::create_dir_all(&b1).expect("create batch-100.5");
    fs::write(
        b1.join("depth.txt"),
        "from_depth: 50.0\n\
         to_depth: 100.5\n\
         scan_date: 2026-01-14T10:30:00Z\n\
         quality: good\n\
         machine: OREX-01\n",
    )
    .expect("write depth.txt");
    fs::write(b1.join("scan_001.jpg"), b"jpeg-1").expect("write scan_001");
    fs::write(b1.join("scan_002.JPG"), b"jpeg-2").expect("write scan_002");

    let b2 = base.join("DDH-001").join("batch-200.8");
    fs::create_dir_all(&b2).expect("create batch-200.8");
    fs::write(
        b2.join("depth.txt"),
        "from_depth: 100.5\nto_depth: 200.8\nquality: fair\nmachine: OREX-01\n",
    )
    .expect("write depth.txt");
    fs::write(b2.join("scan_003.jpg"), b"jpeg-3").expect("write scan_003");

    let b3 = base.join("DDH-002").join("batch-50");
    fs::create_dir_all(&b3).expect("create batch-50");
    fs::write(b3.join("depth.txt"), "to_depth: 50\n").expect("write depth.txt");
}

/// Connector wrapper that counts how many sessions were opened — the
/// observable for "the cache did not rescan".
pub struct CountingConnector {
    inner: LocalConnector,
    connects: AtomicUsize,
}

impl CountingConnector {
    pub fn new(root: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            inner: LocalConnector::new(root),
            connects: AtomicUsize::new(0),
        })
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl ShareConnector for CountingConnector {
    fn connect(&self) -> Result<Box<dyn ShareSession>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        self.inner.connect()
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

pub struct CmdResult {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

fn resolve_bin_path() -> PathBuf {
    if let Ok(path) = std::env::var("CARGO_BIN_EXE_coreshed") {
        return PathBuf::from(path);
    }

    let exe_name = if cfg!(windows) {
        "coreshed.exe"
    } else {
        "coreshed"
    };
    let fallback = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(PathBuf::from))
        .and_then(|deps| deps.parent().map(PathBuf::from))
        .map(|debug_dir| debug_dir.join(exe_name));

    match fallback {
        Some(path) if path.exists() => path,
        _ => panic!("unable to resolve coreshed binary path for integration test"),
    }
}

/// Run the CLI with the activity log redirected into `log_dir` so test runs
/// never touch the invoking user's data directory.
pub fn run_cli(args: &[&str], log_dir: &Path) -> CmdResult {
    let output = Command::new(resolve_bin_path())
        .args(args)
        .env(
            "CORESHED_JSONL_LOG",
            log_dir.join("activity.jsonl").as_os_str(),
        )
        .env("RUST_BACKTRACE", "1")
        .output()
        .expect("execute coreshed command");

    CmdResult {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    }
}
