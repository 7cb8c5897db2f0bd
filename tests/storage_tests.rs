use gp_preprocessor::storage::queries::{unix_now, REMOVE_CHUNK_SIZE, SECONDS_PER_DAY};
use gp_preprocessor::storage::Database;
use tempfile::tempdir;

fn paths(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_add_and_query_processed_files() {
    let db = Database::open_in_memory().unwrap();
    let count = db
        .add_processed(&paths(&["2024/IMG_0001.HEIC", "2024/IMG_0001.MOV"]))
        .unwrap();
    assert_eq!(count, 2);

    assert!(db.is_processed("2024/IMG_0001.HEIC").unwrap());
    assert!(db.is_processed("2024/IMG_0001.MOV").unwrap());
    assert!(!db.is_processed("2024/IMG_0002.HEIC").unwrap());
    // Paths are stored verbatim, no case folding.
    assert!(!db.is_processed("2024/img_0001.heic").unwrap());
    assert_eq!(db.count().unwrap(), 2);
}

#[test]
fn test_re_adding_refreshes_timestamp() {
    let db = Database::open_in_memory().unwrap();
    let old = unix_now() - 40.0 * SECONDS_PER_DAY;
    db.add_processed_at(&paths(&["a.jpg"]), old).unwrap();
    let aged = db.get_old_records(30).unwrap();
    assert_eq!(aged.len(), 1);
    assert!((aged[0].processed_at - old).abs() < 1e-6);

    db.add_processed(&paths(&["a.jpg"])).unwrap();

    assert_eq!(db.count().unwrap(), 1);
    assert!(db.get_old_records(30).unwrap().is_empty());
    let stats = db.stats().unwrap();
    assert!(stats.oldest.unwrap() > old);
}

#[test]
fn test_get_old_records_window() {
    let db = Database::open_in_memory().unwrap();
    let now = unix_now();
    db.add_processed_at(&paths(&["ancient.jpg"]), now - 90.0 * SECONDS_PER_DAY)
        .unwrap();
    db.add_processed_at(&paths(&["old.jpg"]), now - 31.0 * SECONDS_PER_DAY)
        .unwrap();
    db.add_processed_at(&paths(&["recent.jpg"]), now - 2.0 * SECONDS_PER_DAY)
        .unwrap();

    let old: Vec<String> = db
        .get_old_records(30)
        .unwrap()
        .into_iter()
        .map(|r| r.relative_path)
        .collect();
    assert_eq!(old, vec!["ancient.jpg".to_string(), "old.jpg".to_string()]);
}

#[test]
fn test_get_old_records_non_positive_window_is_empty() {
    let db = Database::open_in_memory().unwrap();
    db.add_processed_at(&paths(&["a.jpg"]), unix_now() - 365.0 * SECONDS_PER_DAY)
        .unwrap();

    assert!(db.get_old_records(0).unwrap().is_empty());
    assert!(db.get_old_records(-5).unwrap().is_empty());
}

#[test]
fn test_remove_records_empty_input() {
    let db = Database::open_in_memory().unwrap();
    db.add_processed(&paths(&["keep.jpg"])).unwrap();
    assert_eq!(db.remove_records(&[]).unwrap(), 0);
    assert_eq!(db.count().unwrap(), 1);
}

#[test]
fn test_remove_records_beyond_parameter_limit() {
    let db = Database::open_in_memory().unwrap();
    let total = REMOVE_CHUNK_SIZE * 2 + 200;
    let all: Vec<String> = (0..total).map(|i| format!("bulk/IMG_{:05}.jpg", i)).collect();
    db.add_processed(&all).unwrap();
    db.add_processed(&paths(&["survivor.jpg"])).unwrap();

    let mut doomed = all.clone();
    doomed.push("never-tracked.jpg".to_string());
    let removed = db.remove_records(&doomed).unwrap();

    assert_eq!(removed, total);
    assert_eq!(db.count().unwrap(), 1);
    assert!(db.is_processed("survivor.jpg").unwrap());
}

#[test]
fn test_stats() {
    let db = Database::open_in_memory().unwrap();
    let empty = db.stats().unwrap();
    assert_eq!(empty.total, 0);
    assert!(empty.oldest.is_none());
    assert!(empty.newest.is_none());

    db.add_processed_at(&paths(&["a.jpg"]), 1_000.0).unwrap();
    db.add_processed_at(&paths(&["b.jpg"]), 2_000.0).unwrap();
    let stats = db.stats().unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.oldest, Some(1_000.0));
    assert_eq!(stats.newest, Some(2_000.0));
}

#[test]
fn test_store_persists_across_reopen() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("progress.db");

    {
        let db = Database::open(&db_path).unwrap();
        db.add_processed(&paths(&["persisted.jpg"])).unwrap();
    }

    let db = Database::open(&db_path).unwrap();
    assert!(db.is_processed("persisted.jpg").unwrap());
    assert_eq!(db.count().unwrap(), 1);
}
