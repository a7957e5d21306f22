//! End-to-end portal behavior over a locally mounted share fixture.

mod common;

use std::fs;
use std::sync::Arc;

use coreshed::core::config::Config;
use coreshed::logger::jsonl::{JsonlConfig, JsonlWriter};
use coreshed::portal::SharePortal;
use coreshed::validate::BatchRecord;

use common::{CountingConnector, build_share_fixture};

fn fixture_config(ttl_secs: u64) -> Config {
    let mut config = Config::default();
    config.cache.ttl_secs = ttl_secs;
    config.scan.base_path = "/incoming/Orexplore".to_string();
    config
}

fn fixture_portal() -> (SharePortal, Arc<CountingConnector>, tempfile::TempDir) {
    let tmp = tempfile::tempdir().expect("tempdir");
    build_share_fixture(tmp.path());
    let connector = CountingConnector::new(tmp.path().to_path_buf());
    let portal = SharePortal::new(&fixture_config(300), connector.clone());
    (portal, connector, tmp)
}

#[test]
fn get_images_collects_jpgs_case_insensitively() {
    let (portal, _connector, _tmp) = fixture_portal();
    let result = portal.get_images().expect("scan succeeds");

    assert!(result.is_clean());
    assert_eq!(result.entries.len(), 3);
    let paths: Vec<&str> = result
        .entries
        .iter()
        .map(|e| e.relative_path.as_str())
        .collect();
    assert_eq!(
        paths,
        vec![
            "DDH-001/batch-100.5/scan_001.jpg",
            "DDH-001/batch-100.5/scan_002.JPG",
            "DDH-001/batch-200.8/scan_003.jpg",
        ]
    );
    // Two directory levels below the base.
    assert!(result.entries.iter().all(|e| e.depth == 2));
}

#[test]
fn cached_reads_share_one_instance_and_one_session() {
    let (portal, connector, _tmp) = fixture_portal();

    let first = portal.get_images().expect("first scan");
    let second = portal.get_images().expect("second scan");

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(connector.connect_count(), 1);

    let stats = portal.cache_stats();
    assert_eq!(stats.miss_count, 1);
    assert_eq!(stats.hit_count, 1);
    assert_eq!(stats.entry_count, 1);
}

#[test]
fn refresh_bypasses_the_cache() {
    let (portal, connector, tmp) = fixture_portal();

    let first = portal.get_images().expect("first scan");
    // New image lands on the share; the cached result can't see it yet.
    fs::write(
        tmp.path()
            .join("incoming/Orexplore/DDH-002/batch-50/scan_004.jpg"),
        b"jpeg-4",
    )
    .expect("write new image");
    assert_eq!(portal.get_images().expect("cached scan").entries.len(), 3);

    let refreshed = portal.refresh().expect("refresh");
    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert_eq!(refreshed.entries.len(), 4);
    assert_eq!(connector.connect_count(), 2);
}

#[test]
fn discovery_finds_batches_with_sidecar_data() {
    let (portal, _connector, _tmp) = fixture_portal();
    let discovery = portal.discover_batches().expect("discover");

    assert!(discovery.errors.is_empty());
    assert_eq!(discovery.batches.len(), 3);

    let first = &discovery.batches[0];
    assert_eq!(first.hole_id, "DDH-001");
    assert_eq!(first.batch_to, 100.5);
    assert_eq!(first.depth_from, 50.0);
    assert_eq!(first.machine_id, "OREX-01");

    // The sparse DDH-002 sidecar falls back to machine defaults.
    let sparse = &discovery.batches[2];
    assert_eq!(sparse.hole_id, "DDH-002");
    assert_eq!(sparse.machine_id, "unknown");
    assert_eq!(sparse.quality, "good");
}

#[test]
fn batches_for_hole_restricts_and_caches() {
    let (portal, connector, _tmp) = fixture_portal();

    let batches = portal.batches_for_hole("DDH-001").expect("for hole");
    assert_eq!(batches.len(), 2);
    assert!(batches.iter().all(|b| b.hole_id == "DDH-001"));

    portal.batches_for_hole("DDH-001").expect("cached");
    assert_eq!(connector.connect_count(), 1);
    assert_eq!(portal.discovery_cache_stats().hit_count, 1);
}

#[test]
fn validate_batch_consistent_record_is_clean() {
    let (portal, _connector, _tmp) = fixture_portal();
    let record = BatchRecord {
        hole_id: "DDH-001".to_string(),
        machine_id: "OREX-01".to_string(),
        depth_from: 50.0,
        depth_to: 200.8,
    };

    let result = portal.validate_batch(&record).expect("validate");
    assert!(!result.has_discrepancies, "{:?}", result.discrepancies);
}

#[test]
fn validate_batch_flags_depth_drift() {
    let (portal, _connector, _tmp) = fixture_portal();
    let record = BatchRecord {
        hole_id: "DDH-001".to_string(),
        machine_id: "OREX-01".to_string(),
        depth_from: 50.0,
        depth_to: 201.5,
    };

    let result = portal.validate_batch(&record).expect("validate");
    assert!(result.has_discrepancies);
    assert_eq!(result.discrepancies.len(), 1);
    assert_eq!(result.discrepancies[0].field, "depth_to");
}

#[test]
fn validate_batch_for_absent_hole_reports_once() {
    let (portal, _connector, _tmp) = fixture_portal();
    let record = BatchRecord {
        hole_id: "DDH-999".to_string(),
        machine_id: "OREX-01".to_string(),
        depth_from: 0.0,
        depth_to: 10.0,
    };

    let result = portal.validate_batch(&record).expect("validate");
    assert!(result.has_discrepancies);
    assert_eq!(result.discrepancies.len(), 1);
    assert_eq!(result.discrepancies[0].field, "hole_id");
}

#[test]
fn check_connection_distinguishes_unreachable_share() {
    let (portal, _connector, _tmp) = fixture_portal();
    portal.check_connection().expect("fixture share reachable");

    let dead = CountingConnector::new(std::path::PathBuf::from("/definitely/not/mounted"));
    let portal = SharePortal::new(&fixture_config(30), dead);
    let err = portal.check_connection().expect_err("dead share");
    assert_eq!(err.code(), "CSH-2001");
    assert!(err.is_fatal_for_scan());
}

#[test]
fn activity_log_records_scans_and_validations() {
    let tmp = tempfile::tempdir().expect("tempdir");
    build_share_fixture(tmp.path());
    let log_path = tmp.path().join("activity.jsonl");

    let connector = CountingConnector::new(tmp.path().to_path_buf());
    let portal = SharePortal::new(&fixture_config(300), connector)
        .with_logger(JsonlWriter::open(JsonlConfig::at(log_path.clone())));

    portal.get_images().expect("scan");
    portal
        .validate_batch(&BatchRecord {
            hole_id: "DDH-002".to_string(),
            machine_id: "OREX-01".to_string(),
            depth_from: 0.0,
            depth_to: 50.0,
        })
        .expect("validate");
    drop(portal);

    let contents = fs::read_to_string(&log_path).expect("log written");
    let events: Vec<serde_json::Value> = contents
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid JSONL"))
        .collect();
    assert!(events.iter().any(|e| e["event"] == "scan_complete"));
    assert!(events.iter().any(|e| e["event"] == "discovery_complete"));
    assert!(events.iter().any(|e| e["event"] == "validation_complete"));
}
