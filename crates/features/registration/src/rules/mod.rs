//! Prerequisite rule language.
//!
//! A requirement expression is a `;`-separated conjunction of clauses:
//!
//! | Clause            | Example               | Holds when                                   |
//! |-------------------|-----------------------|----------------------------------------------|
//! | major             | `major CSE/AMS`       | the student has any listed major             |
//! | standing          | `standing U2`         | earned credits exceed the tier threshold     |
//! | minimum grade     | `>B CSE,214/CSE,219`  | any listed course has a grade of B or better |
//! | prior completion  | `CSE,114`             | any listed course has a passing grade        |
//!
//! Commas in course keys stand for the space of the transcript key (`CSE 214`).

mod clause;
mod engine;
mod grade;

pub use clause::{
    ClauseKind, RequirementClause, StandingThresholds, StandingTier, parse_clause,
    parse_expression,
};
pub use engine::{Eligibility, PrerequisiteConflict, PrerequisiteEngine, first_failure};
pub use grade::Grade;
