#![allow(dead_code)]

use polar_registration::model::{ClassOffering, CourseMeta, Selection, StudentRecord};
use polar_registration::rules::Grade;
use polar_registration::store::MemoryStore;
use std::sync::Arc;

pub(crate) fn course(subject: &str, code: &str, title: &str, sbc: &[&str]) -> CourseMeta {
    CourseMeta {
        subject: subject.to_owned(),
        code: code.to_owned(),
        title: title.to_owned(),
        description: format!("{title}, lecture and recitation"),
        credits: 3.0,
        prerequisites: String::new(),
        sbc: sbc.iter().map(|tag| (*tag).to_owned()).collect(),
    }
}

pub(crate) fn offering(course: CourseMeta, section: &str, seats: u32) -> ClassOffering {
    ClassOffering {
        course,
        section_id: section.to_owned(),
        capacity_remaining: seats,
        days: "TUTH".to_owned(),
        time_start: "11:30".to_owned(),
        time_end: "12:50".to_owned(),
        instructor: "Staff".to_owned(),
        room: "Javits 100".to_owned(),
    }
}

pub(crate) fn selection(raw: &str) -> Selection {
    raw.parse().expect("valid selection")
}

/// A junior CSE major with a B+ in CSE 114.
pub(crate) fn ada() -> StudentRecord {
    StudentRecord::new("S100", "Ada")
        .with_majors(["CSE"])
        .with_credits(60.0)
        .with_gpa(3.4)
        .with_grade("CSE 114", Grade::BPlus)
}

/// Catalog with CSE 214-01 (one seat), CSE 214-02 (full), BIO 101-01 (plenty).
pub(crate) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    let ds = course("CSE", "214", "Data Structures", &["TECH"]);
    store.insert_offering(offering(ds.clone(), "01", 1));
    store.insert_offering(offering(ds, "02", 0));
    store.insert_offering(offering(course("BIO", "101", "Foundations of Biology", &["SNW"]), "01", 40));
    store.insert_student(ada());
    store
}
