use polar_domain::ErrorKind;
use polar_domain::constants::{MIGRATION, OFFERING, REGISTRATION, STUDENT};

#[test]
fn constants_match_table_names() {
    assert_eq!(STUDENT, "student");
    assert_eq!(OFFERING, "offering");
    assert_eq!(MIGRATION, "migration");
    assert_eq!(REGISTRATION, "registration");
}

#[test]
fn error_kinds_serialize_in_snake_case() {
    let raw = serde_json::to_value(ErrorKind::NotFound).expect("serialize kind");
    assert_eq!(raw, "not_found");
    assert_eq!(ErrorKind::Unavailable.to_string(), "unavailable");
}
