mod common;

use chrono::{TimeZone, Utc};
use common::{ada, course, offering, selection};
use polar_database::Database;
use polar_domain::ErrorKind;
use polar_domain::config::DatabaseConfig;
use polar_registration::enrollment::{EnrollmentManager, FailureCause};
use polar_registration::model::{ClassSnapshot, DateField, FieldUpdate, StudentRecord, TimesheetEntry};
use polar_registration::rules::Grade;
use polar_registration::search::{ClassSearch, SearchTerm};
use polar_registration::store::{CatalogStore, StudentStore, SurrealStore};
use std::sync::Arc;

async fn store() -> Arc<SurrealStore> {
    let db = Database::builder()
        .config(&DatabaseConfig::default())
        .migrations(polar_registration::migrations())
        .init()
        .await
        .expect("in-memory database");
    let store = SurrealStore::new(db);

    let ds = course("CSE", "214", "Data Structures", &["tech"]);
    store.insert_offering(&offering(ds.clone(), "01", 1)).await.expect("seed 214-01");
    store.insert_offering(&offering(ds, "02", 0)).await.expect("seed 214-02");
    let bio = course("BIO", "101", "Foundations of Biology", &["SNW"]);
    store.insert_offering(&offering(bio, "01", 40)).await.expect("seed bio");
    store.insert_student(&ada()).await.expect("seed student");
    Arc::new(store)
}

#[tokio::test]
async fn student_round_trips_through_typed_rows() {
    let store = store().await;

    let loaded = store.find_by_id("S100").await.unwrap();
    assert_eq!(loaded, ada());
    assert_eq!(loaded.grades.get("CSE 114"), Some(&Grade::BPlus));

    let err = store.find_by_id("S999").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn decrement_stops_at_zero() {
    let store = store().await;
    let wanted = selection("CSE 214-01");

    assert!(store.try_decrement_capacity(&wanted).await.unwrap());
    assert!(!store.try_decrement_capacity(&wanted).await.unwrap());
    assert_eq!(store.find_offering(&wanted).await.unwrap().capacity_remaining, 0);

    store.release_capacity(&wanted).await.unwrap();
    assert_eq!(store.find_offering(&wanted).await.unwrap().capacity_remaining, 1);

    assert!(!store.try_decrement_capacity(&selection("MAT 999-01")).await.unwrap());
}

#[tokio::test]
async fn append_requires_the_current_cart_version() {
    let store = store().await;
    let snapshot = ClassSnapshot::from(&store.find_offering(&selection("BIO 101-01")).await.unwrap());

    let version = store.reset_selections("S100").await.unwrap();
    assert!(store.append_selection("S100", version, &snapshot).await.unwrap());

    let newer = store.reset_selections("S100").await.unwrap();
    assert!(newer > version);
    assert!(!store.append_selection("S100", version, &snapshot).await.unwrap());
    assert!(store.find_by_id("S100").await.unwrap().active_selections.is_empty());

    let err = store.append_selection("S999", newer, &snapshot).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn commit_against_surreal_reports_partial_failure() {
    let store = store().await;
    let manager = EnrollmentManager::new(store.clone(), store.clone(), true);

    let report = manager
        .commit("S100", &[selection("CSE 214-01"), selection("CSE 214-02")])
        .await
        .unwrap();

    assert_eq!(report.committed, vec![selection("CSE 214-01")]);
    assert_eq!(report.failed[0].cause, FailureCause::NoSeats);
    let cart = store.find_by_id("S100").await.unwrap().active_selections;
    assert_eq!(cart.len(), 1);
    assert_eq!(cart[0].selection(), selection("CSE 214-01"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_commits_over_surreal_leave_one_winner() {
    for round in 0..5 {
        let store = store().await;
        for n in 0..8 {
            store
                .insert_student(&StudentRecord::new(format!("R{n}"), "Racer"))
                .await
                .expect("seed racer");
        }
        let manager = Arc::new(EnrollmentManager::new(store.clone(), store.clone(), true));
        let wanted = selection("CSE 214-01");

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let manager = Arc::clone(&manager);
                let wanted = wanted.clone();
                tokio::spawn(async move { manager.commit(&format!("R{n}"), &[wanted]).await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            let report = handle
                .await
                .expect("task")
                .unwrap_or_else(|e| panic!("round {round}: commit failed: {e}"));
            if report.is_complete() {
                winners += 1;
            } else {
                assert_eq!(report.failed[0].cause, FailureCause::NoSeats, "round {round}");
                assert!(!report.failed[0].seat_released);
            }
        }

        assert_eq!(winners, 1, "round {round}");
        assert_eq!(store.find_offering(&wanted).await.unwrap().capacity_remaining, 0);
    }
}

#[tokio::test]
async fn field_updates_are_persisted() {
    let store = store().await;
    let at = Utc.with_ymd_and_hms(2026, 8, 24, 9, 0, 0).unwrap();
    let entry = TimesheetEntry {
        status: "worked".to_owned(),
        time_in: at,
        time_out: Utc.with_ymd_and_hms(2026, 8, 24, 13, 0, 0).unwrap(),
    };

    store.update_field("S100", FieldUpdate::date(DateField::Housing, at)).await.unwrap();
    store.update_field("S100", FieldUpdate::Timesheet(vec![entry.clone()])).await.unwrap();

    let student: StudentRecord = store.find_by_id("S100").await.unwrap();
    assert_eq!(student.date(DateField::Housing), Some(at));
    assert_eq!(student.date(DateField::Enrollment), None);
    assert_eq!(student.timesheet, vec![entry]);

    let err =
        store.update_field("S999", FieldUpdate::date(DateField::Housing, at)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn search_matches_tags_and_text() {
    let store = store().await;

    let tagged = store.search(&SearchTerm::Tag("TECH".to_owned())).await.unwrap();
    assert_eq!(tagged.len(), 2);
    assert_eq!(tagged[0].selection(), selection("CSE 214-01"));

    let search = ClassSearch::new(store);
    let hits = search.search("biology cse [TECH]").await.unwrap();
    let found: Vec<String> = hits.iter().map(|o| o.selection().to_string()).collect();
    assert_eq!(found, vec!["BIO 101-01", "CSE 214-01", "CSE 214-02"]);
}
