mod common;

use polar_domain::ErrorKind;
use polar_registration::model::StudentRecord;
use polar_registration::rules::{
    ClauseKind, Eligibility, Grade, PrerequisiteEngine, RequirementClause, StandingThresholds,
    parse_clause, parse_expression,
};
use polar_registration::store::{MemoryStore, StoreOperation};
use proptest::prelude::*;
use std::sync::Arc;

const PROGRAMS: [&str; 5] = ["CSE", "AMS", "BIO", "MAT", "PHY"];

fn programs() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(PROGRAMS.to_vec(), 0..=PROGRAMS.len())
}

fn grade() -> impl Strategy<Value = Grade> {
    proptest::sample::select(Grade::ALL.to_vec())
}

fn engine(store: Arc<MemoryStore>) -> PrerequisiteEngine {
    PrerequisiteEngine::new(store, StandingThresholds::default())
}

proptest! {
    #[test]
    fn major_clause_holds_iff_sets_intersect(
        held in programs(),
        accepted in programs().prop_filter("non-empty", |a| !a.is_empty()),
    ) {
        let student = StudentRecord::new("S1", "Ada").with_majors(held.iter().copied());
        let clause = parse_clause(&format!("major {}", accepted.join("/"))).unwrap();

        let intersects = held.iter().any(|major| accepted.contains(major));
        prop_assert_eq!(clause.is_satisfied_by(&student, &StandingThresholds::default()), intersects);
    }

    #[test]
    fn standing_clause_is_strict(credits in 0.0f64..150.0, tier in 1u8..=3) {
        let thresholds = StandingThresholds::default();
        let clause = parse_clause(&format!("standing U{tier}")).unwrap();
        let RequirementClause::Standing(parsed) = &clause else { panic!("standing clause expected") };
        let student = StudentRecord::new("S1", "Ada").with_credits(credits);

        prop_assert_eq!(
            clause.is_satisfied_by(&student, &thresholds),
            credits > thresholds.credits_for(*parsed)
        );
    }

    #[test]
    fn min_grade_follows_the_ordinal_scale(held in grade(), threshold in grade()) {
        let clause = parse_clause(&format!(">{} CSE,214", threshold.as_str())).unwrap();
        let student = StudentRecord::new("S1", "Ada").with_grade("CSE 214", held);

        prop_assert_eq!(
            clause.is_satisfied_by(&student, &StandingThresholds::default()),
            held.ordinal() <= threshold.ordinal()
        );
    }

    #[test]
    fn blank_expressions_have_no_clauses(expression in "[ ;]{0,12}") {
        prop_assert!(parse_expression(&expression).unwrap().is_empty());
    }
}

#[test]
fn major_examples() {
    let clause = parse_clause("major CSE/AMS").unwrap();
    let thresholds = StandingThresholds::default();

    assert!(clause.is_satisfied_by(&StudentRecord::new("S1", "Ada").with_majors(["CSE"]), &thresholds));
    assert!(!clause.is_satisfied_by(&StudentRecord::new("S2", "Bo").with_majors(["BIO"]), &thresholds));
}

#[test]
fn sixty_credits_is_u2_but_not_u3() {
    let student = StudentRecord::new("S1", "Ada").with_credits(60.0);
    let thresholds = StandingThresholds::default();

    assert!(parse_clause("standing U2").unwrap().is_satisfied_by(&student, &thresholds));
    assert!(!parse_clause("standing U3").unwrap().is_satisfied_by(&student, &thresholds));
}

#[test]
fn min_grade_b_examples() {
    let clause = parse_clause(">B CSE,214").unwrap();
    let thresholds = StandingThresholds::default();

    let a_minus = StudentRecord::new("S1", "Ada").with_grade("CSE 214", Grade::AMinus);
    let c_plus = StudentRecord::new("S2", "Bo").with_grade("CSE 214", Grade::CPlus);
    let missing = StudentRecord::new("S3", "Cy").with_grade("CSE 114", Grade::A);

    assert!(clause.is_satisfied_by(&a_minus, &thresholds));
    assert!(!clause.is_satisfied_by(&c_plus, &thresholds));
    assert!(!clause.is_satisfied_by(&missing, &thresholds));
}

#[tokio::test]
async fn failing_major_short_circuits_standing() {
    let store = Arc::new(MemoryStore::new());
    store.insert_student(StudentRecord::new("S1", "Bo").with_majors(["BIO"]).with_credits(10.0));

    let outcome = engine(store).check("S1", "major CSE;standing U3").await.unwrap();

    let Eligibility::Ineligible(conflict) = outcome else { panic!("expected a conflict") };
    assert_eq!(conflict.reason, ClauseKind::Major);
    assert_eq!(conflict.clause_index, 0);
    assert_eq!(conflict.message, "You do not fit the major prerequisite of this class");
}

#[tokio::test]
async fn every_failure_family_has_its_own_reason() {
    let store = common::seeded_store();
    let engine = engine(store);

    let cases = [
        ("standing U3", ClauseKind::Standing),
        (">A CSE,114", ClauseKind::MinGrade),
        ("CSE,214/CSE,219", ClauseKind::Completion),
    ];
    for (expression, reason) in cases {
        match engine.check("S100", expression).await.unwrap() {
            Eligibility::Ineligible(conflict) => assert_eq!(conflict.reason, reason, "{expression}"),
            Eligibility::Eligible => panic!("{expression} should fail"),
        }
    }

    let all = "major CSE/AMS; standing U2; >B CSE,114; CSE,114";
    assert!(engine.check("S100", all).await.unwrap().is_eligible());
}

#[tokio::test]
async fn empty_expression_never_touches_the_store() {
    let store = Arc::new(MemoryStore::new());
    store.fail_next(StoreOperation::FindStudent, 1);

    let outcome = engine(store).check("nobody", " ; ").await.unwrap();
    assert_eq!(outcome, Eligibility::Eligible);
}

#[tokio::test]
async fn lookup_and_parse_failures_are_errors() {
    let store = common::seeded_store();
    store.fail_next(StoreOperation::FindStudent, 1);
    let engine = engine(store);

    let unavailable = engine.check("S100", "standing U1").await.unwrap_err();
    assert_eq!(unavailable.kind(), ErrorKind::Unavailable);

    let missing = engine.check("S999", "standing U1").await.unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::NotFound);

    let malformed = engine.check("S100", "standing U9").await.unwrap_err();
    assert_eq!(malformed.kind(), ErrorKind::Malformed);
}
