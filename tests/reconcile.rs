//! Placeholder Reconciliation Integration Tests
//!
//! Tests that creation plus cleanup converges the library to exactly the
//! desired placeholder set, and that cleanup stays inside library folders.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use comingsoon::core::paths::placeholder_folder_name;
use comingsoon::core::reconciler::RemovalReason;
use comingsoon::core::{
    classify, ClassifyOptions, PathMapper, PayloadAsset, PlaceholderReconciler, PLACEHOLDER_MARKER,
};
use comingsoon::CatalogEntry;
use tempfile::TempDir;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
}

fn entry(title: &str, id: u64, year: i32) -> CatalogEntry {
    CatalogEntry::new(title)
        .with_tmdb_id(id)
        .with_year(year)
        .with_path(format!("/data/movies/{} ({})", title, year))
}

/// Placeholder folder names currently under `dir`
fn placeholders_in(dir: &Path) -> BTreeSet<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .filter(|name| name.contains(PLACEHOLDER_MARKER))
        .collect()
}

struct Fixture {
    _temp: TempDir,
    library: PathBuf,
    mapper: PathMapper,
    payload: PayloadAsset,
}

fn fixture() -> Fixture {
    let temp = TempDir::new().unwrap();
    let library = temp.path().join("library");
    std::fs::create_dir_all(&library).unwrap();

    let video = temp.path().join("video");
    std::fs::create_dir_all(&video).unwrap();
    std::fs::write(video.join("coming-soon.mp4"), vec![0u8; 2048]).unwrap();

    let mapper = PathMapper::new([("/data/movies", library.to_string_lossy().to_string())]);
    let payload = PayloadAsset::locate(&video, "coming-soon").unwrap();

    Fixture {
        _temp: temp,
        library,
        mapper,
        payload,
    }
}

fn stale_placeholder(library: &Path, name: &str) -> PathBuf {
    let folder = library.join(name);
    std::fs::create_dir_all(&folder).unwrap();
    std::fs::write(folder.join("old.mp4"), vec![0u8; 100]).unwrap();
    folder
}

#[test]
fn test_reconcile_converges_to_desired_set() {
    let fx = fixture();

    let catalog = vec![
        entry("Upcoming", 1, 2025)
            .with_flags(true, false)
            .with_digital_release(date(2025, 3, 10)),
        entry("Released", 2, 2024)
            .with_flags(true, false)
            .with_digital_release(date(2025, 2, 1)),
        entry("Downloaded", 3, 2024)
            .with_flags(true, true)
            .with_digital_release(date(2025, 2, 1)),
        entry("Dropped", 4, 2024)
            .with_flags(false, false)
            .with_digital_release(date(2025, 2, 1)),
    ];

    // Leftovers from earlier runs
    stale_placeholder(&fx.library, &placeholder_folder_name("Downloaded", Some(2024)));
    stale_placeholder(&fx.library, &placeholder_folder_name("Dropped", Some(2024)));
    stale_placeholder(&fx.library, &placeholder_folder_name("Deleted", Some(2019)));
    std::fs::create_dir_all(fx.library.join("Downloaded (2024)")).unwrap();

    let classification = classify(&catalog, &ClassifyOptions::default(), now());
    let desired: Vec<_> = classification.all().cloned().collect();
    assert_eq!(desired.len(), 2);

    let reconciler = PlaceholderReconciler::new(&fx.mapper, &fx.payload);
    for movie in &desired {
        reconciler.ensure_placeholder(movie).unwrap();
    }
    let report = reconciler.reconcile_all(&catalog, &desired);

    assert!(report.failures.is_empty());
    assert_eq!(report.checked, 5);
    assert_eq!(report.kept, 2);
    assert_eq!(report.removed.len(), 3);
    assert_eq!(report.bytes_reclaimed(), 300);

    let reasons: BTreeSet<String> = report
        .removed
        .iter()
        .map(|r| format!("{}: {}", r.title, r.reason))
        .collect();
    assert!(reasons.contains(&format!("Downloaded: {}", RemovalReason::Downloaded)));
    assert!(reasons.contains(&format!("Dropped: {}", RemovalReason::NoLongerMeetsCriteria)));
    assert!(reasons.contains(&format!("Deleted (2019): {}", RemovalReason::NotInCatalog)));

    let expected: BTreeSet<String> = desired
        .iter()
        .map(|m| placeholder_folder_name(&m.title, m.year))
        .collect();
    assert_eq!(placeholders_in(&fx.library), expected);

    // The real movie folder is never touched
    assert!(fx.library.join("Downloaded (2024)").is_dir());
}

#[test]
fn test_second_pass_is_noop() {
    let fx = fixture();
    let catalog = vec![entry("Upcoming", 1, 2025)
        .with_flags(true, false)
        .with_digital_release(date(2025, 3, 10))];

    let classification = classify(&catalog, &ClassifyOptions::default(), now());
    let desired: Vec<_> = classification.all().cloned().collect();
    let reconciler = PlaceholderReconciler::new(&fx.mapper, &fx.payload);

    for _ in 0..2 {
        for movie in &desired {
            reconciler.ensure_placeholder(movie).unwrap();
        }
        let report = reconciler.reconcile_all(&catalog, &desired);
        assert!(report.removed.is_empty());
        assert_eq!(report.kept, 1);
    }

    let folder = fx.library.join(placeholder_folder_name("Upcoming", Some(2025)));
    assert_eq!(std::fs::read_dir(&folder).unwrap().count(), 1);
}

#[test]
fn test_cleanup_ignores_unrelated_directories() {
    let fx = fixture();

    // Not a direct child of any catalog library directory
    let nested = fx.library.join("Some Movie (2020)").join("Extras {edition-Coming Soon}");
    std::fs::create_dir_all(&nested).unwrap();
    let elsewhere = fx.library.parent().unwrap().join("other");
    let outside = stale_placeholder(&elsewhere, "Stray (2020) {edition-Coming Soon}");

    let catalog = vec![entry("Anything", 9, 2020).with_flags(true, true)];
    let reconciler = PlaceholderReconciler::new(&fx.mapper, &fx.payload);
    let report = reconciler.reconcile_all(&catalog, &[]);

    assert_eq!(report.scanned_dirs, 1);
    assert_eq!(report.checked, 0);
    assert!(nested.is_dir());
    assert!(outside.is_dir());
}
