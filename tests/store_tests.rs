//! File-backed configuration store and installation log tests

use pipvr::config::paths::PathsConfig;
use pipvr::models::{InstallationStatus, ServiceSelection, StackConfig};
use pipvr::services::store::StoreError;
use pipvr::services::{ConfigStore, InstallLog, RunId, RunJournal};

fn file_store() -> (tempfile::TempDir, PathsConfig, ConfigStore) {
    let dir = tempfile::tempdir().unwrap();
    let paths = PathsConfig::rooted_at(dir.path());
    let store = ConfigStore::file(&paths);
    (dir, paths, store)
}

// ============================================================================
// ConfigStore
// ============================================================================

#[test]
fn test_seed_writes_both_documents() {
    let (_dir, paths, store) = file_store();

    store.seed_defaults().unwrap();

    let config: StackConfig =
        serde_json::from_str(&std::fs::read_to_string(paths.config_file()).unwrap()).unwrap();
    let services: ServiceSelection =
        serde_json::from_str(&std::fs::read_to_string(paths.services_file()).unwrap()).unwrap();
    assert_eq!(config, StackConfig::default());
    assert_eq!(services, ServiceSelection::default());
}

#[test]
fn test_seed_keeps_existing_documents() {
    let (_dir, _paths, store) = file_store();
    store.seed_defaults().unwrap();
    store
        .replace_config(StackConfig {
            timezone: "Asia/Tokyo".to_string(),
            ..StackConfig::default()
        })
        .unwrap();

    store.seed_defaults().unwrap();

    assert_eq!(store.load_config().unwrap().timezone, "Asia/Tokyo");
}

#[test]
fn test_documents_survive_a_new_store() {
    let (_dir, paths, store) = file_store();
    store.seed_defaults().unwrap();
    store.set_status(InstallationStatus::Completed).unwrap();

    let reopened = ConfigStore::file(&paths);

    assert_eq!(
        reopened.load_config().unwrap().installation_status,
        InstallationStatus::Completed
    );
}

#[test]
fn test_write_leaves_no_temp_file() {
    let (_dir, paths, store) = file_store();

    store.save_services(&ServiceSelection::default()).unwrap();

    let leftovers: Vec<_> = std::fs::read_dir(&paths.config_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[test]
fn test_corrupt_document_is_a_parse_error() {
    let (_dir, paths, store) = file_store();
    std::fs::create_dir_all(&paths.config_dir).unwrap();
    std::fs::write(paths.services_file(), "[1, 2").unwrap();

    let err = store.load_services().unwrap_err();

    assert!(matches!(err, StoreError::Parse { .. }));
}

#[test]
fn test_concurrent_begin_install_admits_one() {
    let (_dir, _paths, store) = file_store();
    store.seed_defaults().unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            std::thread::spawn(move || store.begin_install().is_ok())
        })
        .collect();
    let admitted = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(admitted, 1);
}

// ============================================================================
// InstallLog
// ============================================================================

#[test]
fn test_log_is_append_only_across_runs() {
    let (_dir, paths, _store) = file_store();
    let log = InstallLog::new(paths.installation_log());
    let first = RunId::new();
    let second = RunId::new();

    RunJournal::new(log.clone(), first).log("Starting installation");
    RunJournal::new(log.clone(), second).log("Starting installation");

    let contents = log.read_all().unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains(&format!("[run {}]", first.short())));
    assert!(lines[1].contains(&format!("[run {}]", second.short())));
}

#[test]
fn test_log_survives_reopen() {
    let (_dir, paths, _store) = file_store();
    let run = RunId::new();
    InstallLog::new(paths.installation_log())
        .append(run, "Docker is already installed")
        .unwrap();

    let contents = InstallLog::new(paths.installation_log()).read_all().unwrap();

    assert!(contents.ends_with("Docker is already installed\n"));
}
