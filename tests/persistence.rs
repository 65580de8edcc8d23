use name_match::config::AppConfig;
use name_match::core::types::{FeedbackOutcome, NewRecord, SearchFilters};
use name_match::MatchEngine;
use std::fs;

fn app_config(dir: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.storage.data_dir = dir.join("data").to_string_lossy().into_owned();
    config
}

#[test]
fn records_survive_a_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());

    {
        let engine = MatchEngine::from_app_config(&config).unwrap();
        assert!(engine.is_empty());
        engine.add_record(NewRecord::new("Suresh Kumar").with_location("Indore").with_age(34)).unwrap();
        engine.add_record(NewRecord::new("सुनील शर्मा").with_location("Bhopal")).unwrap();
        engine.record_no_match("vikas", &SearchFilters::default()).unwrap();
    }

    let engine = MatchEngine::from_app_config(&config).unwrap();
    assert_eq!(engine.len(), 2);
    let results = engine.search("sursh kumar", &SearchFilters::default()).unwrap();
    assert_eq!(results[0].record.age, Some(34));
    assert_eq!(results[0].record.processed.phonetic, "SRS KMR");

    // ids continue after the highest stored one
    let third = engine.add_record(NewRecord::new("Vikas Yadav")).unwrap();
    assert_eq!(third.id, 3);

    let events = engine.feedback_events().unwrap();
    assert_eq!(events.len(), 4);
    assert!(events.iter().any(|e| e.outcome == FeedbackOutcome::NoMatch && e.query == "vikas"));
}

#[test]
fn seed_is_imported_once() {
    let dir = tempfile::tempdir().unwrap();
    let seed = dir.path().join("seed.csv");
    fs::write(
        &seed,
        "First Name (Roman),Middle Name (Roman),Last Name (Roman),Alternative Roman Spellings,\
First Name (Devanagari),Middle Name (Devanagari),Last Name (Devanagari),Gender,age,caseType,caseFIR,location\n\
Suresh,,Kumar,,सुरेश,,कुमार,1,34,Witness,FIR-12,Indore\n\
Ramesh,,Gupta,,,,,1,41,Accused,FIR-19,Bhopal\n",
    )
    .unwrap();
    let mut config = app_config(dir.path());
    config.storage.seed_file = Some(seed.to_string_lossy().into_owned());

    let engine = MatchEngine::from_app_config(&config).unwrap();
    assert_eq!(engine.len(), 2);
    let results = engine.search("सुरेश कुमार", &SearchFilters::location("Indore")).unwrap();
    assert_eq!(results[0].record.fir, "FIR-12");
    drop(engine);

    // the snapshot now exists, so the seed is not read again
    let engine = MatchEngine::from_app_config(&config).unwrap();
    assert_eq!(engine.len(), 2);
}

#[test]
fn failed_snapshot_keeps_the_record_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let config = app_config(dir.path());
    let engine = MatchEngine::from_app_config(&config).unwrap();

    // the data directory turns into a plain file, so the snapshot cannot be written
    fs::write(dir.path().join("data"), b"x").unwrap();
    let err = engine.add_record(NewRecord::new("Suresh Kumar")).unwrap_err();
    assert!(matches!(err, name_match::MatchError::StorageUnavailable { .. }));

    let results = engine.search("suresh kumar", &SearchFilters::default()).unwrap();
    assert_eq!(results.len(), 1);
}
