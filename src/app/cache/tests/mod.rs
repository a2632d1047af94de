//! Merge behaviour of the cache store against real files

use std::fs;

use tempfile::TempDir;

use crate::app::cache::{CacheConfig, CacheKey, CacheStore, DateMatch, SaveOutcome};
use crate::app::dates::{parse_date, DateRange};
use crate::app::models::{table_with_header, ReportTable, Source};
use crate::errors::CacheError;

fn store_in(dir: &TempDir) -> CacheStore {
    CacheStore::new(CacheConfig::with_folder(dir.path().join("data"))).unwrap()
}

fn table(columns: &[&str], rows: &[&[&str]]) -> ReportTable {
    let mut table = table_with_header(columns);
    for row in rows {
        table.push_row(row.iter().map(|c| c.to_string()).collect());
    }
    table
}

fn days(raw: &[&str]) -> DateRange {
    DateRange::from_days(raw.iter().map(|d| parse_date(d).unwrap()).collect())
}

fn key() -> CacheKey {
    CacheKey::new("eapteka", Source::Direct)
}

#[test]
fn test_first_run_creates_file_with_header() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let new = table(
        &["Date", "CampaignName", "Cost"],
        &[&["2024-01-02", "msk-search", "1.2"]],
    );

    let outcome = store.save(&key(), new, &days(&["2024-01-02"])).unwrap();
    assert_eq!(outcome, SaveOutcome::Created { rows: 1 });

    let written = fs::read_to_string(store.path_for(&key())).unwrap();
    assert_eq!(written, "Date;CampaignName;Cost\n2024-01-02;msk-search;1.2\n");
}

#[test]
fn test_replaces_dates_and_keeps_history_order() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let columns = ["Date", "CampaignName", "Clicks"];

    let history = table(
        &columns,
        &[
            &["2024-01-03", "a-x", "1"],
            &["2024-01-02", "a-x", "2"],
            &["2023-12-31", "b-y", "3"],
            &["2024-01-01", "c-z", "4"],
        ],
    );
    store
        .save(&key(), history, &days(&["2023-12-31", "2024-01-01", "2024-01-02", "2024-01-03"]))
        .unwrap();

    let fresh = table(
        &columns,
        &[&["2024-01-03", "a-x", "10"], &["2024-01-02", "a-x", "20"]],
    );
    let outcome = store
        .save(&key(), fresh, &days(&["2024-01-02", "2024-01-03"]))
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Updated {
            new_rows: 2,
            kept_rows: 2
        }
    );

    let merged = store.load(&key()).unwrap().unwrap();
    assert_eq!(
        merged.column_values("Clicks"),
        vec!["10", "20", "3", "4"]
    );
}

#[test]
fn test_save_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let columns = ["Date", "CampaignName", "Cost"];

    store
        .save(
            &key(),
            table(&columns, &[&["2023-12-01", "old-campaign", "5.0"]]),
            &days(&["2023-12-01"]),
        )
        .unwrap();

    let fresh = table(&columns, &[&["2024-01-01", "кампания-поиск", "1.2"]]);
    let range = days(&["2024-01-01"]);

    store.save(&key(), fresh.clone(), &range).unwrap();
    let first = fs::read(store.path_for(&key())).unwrap();
    store.save(&key(), fresh, &range).unwrap();
    let second = fs::read(store.path_for(&key())).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_empty_save_is_noop() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let columns = ["Date", "Cost"];

    store
        .save(&key(), table(&columns, &[&["2024-01-01", "1.0"]]), &days(&["2024-01-01"]))
        .unwrap();
    let before = fs::read(store.path_for(&key())).unwrap();

    let outcome = store
        .save(&key(), table(&columns, &[]), &days(&["2024-01-01"]))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::NoNewRows);
    assert_eq!(fs::read(store.path_for(&key())).unwrap(), before);

    let other = CacheKey::new("nobody", Source::Metrica);
    let outcome = store
        .save(&other, ReportTable::default(), &days(&["2024-01-01"]))
        .unwrap();
    assert_eq!(outcome, SaveOutcome::NoNewRows);
    assert!(!store.path_for(&other).exists());
}

#[test]
fn test_header_aligned_by_name() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    store
        .save(
            &key(),
            table(&["Date", "Legacy", "Cost"], &[&["2023-01-01", "x", "9.0"]]),
            &days(&["2023-01-01"]),
        )
        .unwrap();
    store
        .save(
            &key(),
            table(&["Cost", "Date"], &[&["1.0", "2024-01-01"]]),
            &days(&["2024-01-01"]),
        )
        .unwrap();

    let written = fs::read_to_string(store.path_for(&key())).unwrap();
    assert_eq!(
        written,
        "Cost;Date;Legacy\n1.0;2024-01-01;\n9.0;2023-01-01;x\n"
    );
}

#[test]
fn test_cyrillic_round_trips_through_cp1251() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let new = table(&["Date", "CampaignName"], &[&["2024-01-01", "мск-поиск"]]);
    store.save(&key(), new, &days(&["2024-01-01"])).unwrap();

    let raw = fs::read(store.path_for(&key())).unwrap();
    assert!(std::str::from_utf8(&raw).is_err());

    let loaded = store.load(&key()).unwrap().unwrap();
    assert_eq!(loaded.column_values("CampaignName"), vec!["мск-поиск"]);
}

#[test]
fn test_unencodable_content_rejected() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let new = table(&["Date", "CampaignName"], &[&["2024-01-01", "北京-search"]]);
    assert!(matches!(
        store.save(&key(), new, &days(&["2024-01-01"])),
        Err(CacheError::Unencodable { .. })
    ));
    assert!(!store.path_for(&key()).exists());
}

#[test]
fn test_undecodable_history_is_not_rewritten() {
    let dir = TempDir::new().unwrap();
    let config = CacheConfig::with_folder(dir.path().join("data")).with_encoding("utf-8");
    let store = CacheStore::new(config).unwrap();
    fs::create_dir_all(store.folder()).unwrap();

    let original: &[u8] = b"Date;Note\n2023-01-01;\xff\xfe\n";
    fs::write(store.path_for(&key()), original).unwrap();

    let new = table(&["Date", "Note"], &[&["2024-01-01", "ok"]]);
    assert!(matches!(
        store.save(&key(), new, &days(&["2024-01-01"])),
        Err(CacheError::Undecodable { .. })
    ));
    assert_eq!(fs::read(store.path_for(&key())).unwrap(), original);
}

#[test]
fn test_history_without_date_column_fails() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.folder()).unwrap();
    fs::write(store.path_for(&key()), "Day;Cost\n2024-01-01;1.0\n").unwrap();

    let new = table(&["Date", "Cost"], &[&["2024-01-02", "2.0"]]);
    assert!(matches!(
        store.save(&key(), new, &days(&["2024-01-02"])),
        Err(CacheError::MissingColumn { .. })
    ));
}

#[test]
fn test_empty_file_treated_as_first_run() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    fs::create_dir_all(store.folder()).unwrap();
    fs::write(store.path_for(&key()), "").unwrap();

    assert!(store.load(&key()).unwrap().is_none());
    let outcome = store
        .save(
            &key(),
            table(&["Date"], &[&["2024-01-01"]]),
            &days(&["2024-01-01"]),
        )
        .unwrap();
    assert_eq!(outcome, SaveOutcome::Created { rows: 1 });
}

#[test]
fn test_substring_mode_matches_timestamps() {
    let dir = TempDir::new().unwrap();
    let store = CacheStore::new(
        CacheConfig::with_folder(dir.path().to_path_buf()).with_date_match(DateMatch::Substring),
    )
    .unwrap();
    fs::write(
        store.path_for(&key()),
        "Date;Cost\n2024-01-01 00:00:00;1.0\n2023-12-31 00:00:00;2.0\n",
    )
    .unwrap();

    let outcome = store
        .save(
            &key(),
            table(&["Date", "Cost"], &[&["2024-01-01", "3.0"]]),
            &days(&["2024-01-01"]),
        )
        .unwrap();
    assert_eq!(
        outcome,
        SaveOutcome::Updated {
            new_rows: 1,
            kept_rows: 1
        }
    );
}

#[test]
fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store
        .save(&key(), table(&["Date"], &[&["2024-01-01"]]), &days(&["2024-01-01"]))
        .unwrap();

    let names: Vec<String> = fs::read_dir(store.folder())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["eapteka_direct.csv"]);
}
