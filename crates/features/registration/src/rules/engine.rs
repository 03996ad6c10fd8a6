use super::clause::{ClauseKind, RequirementClause, StandingThresholds, parse_expression};
use crate::error::{RegistrationError, RegistrationErrorExt};
use crate::model::StudentRecord;
use crate::store::StudentStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

/// Why a requirement expression was not met.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrerequisiteConflict {
    pub reason: ClauseKind,
    pub message: String,
    /// Zero-based position of the failing clause among the parsed clauses.
    pub clause_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    Eligible,
    Ineligible(PrerequisiteConflict),
}

impl Eligibility {
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// Turns an ineligible outcome into a [`RegistrationError::Conflict`].
    ///
    /// # Errors
    /// When the student is not eligible.
    pub fn into_result(self) -> Result<(), RegistrationError> {
        match self {
            Self::Eligible => Ok(()),
            Self::Ineligible(conflict) => Err(RegistrationError::Conflict {
                message: conflict.message.into(),
                context: Some(conflict.reason.to_string().into()),
            }),
        }
    }
}

/// Returns the first clause for which `holds` is false, with its index.
///
/// Clauses after the first failure are never passed to `holds`.
pub fn first_failure<'a, F>(
    clauses: &'a [RequirementClause],
    mut holds: F,
) -> Option<(usize, &'a RequirementClause)>
where
    F: FnMut(&RequirementClause) -> bool,
{
    clauses.iter().enumerate().find(|(_, clause)| !holds(clause))
}

/// Evaluates requirement expressions against student records loaded from the store.
#[derive(Debug, Clone)]
pub struct PrerequisiteEngine {
    students: Arc<dyn StudentStore>,
    thresholds: StandingThresholds,
}

impl PrerequisiteEngine {
    pub fn new(students: Arc<dyn StudentStore>, thresholds: StandingThresholds) -> Self {
        Self { students, thresholds }
    }

    #[must_use]
    pub const fn thresholds(&self) -> &StandingThresholds {
        &self.thresholds
    }

    /// Checks whether `student_id` satisfies every clause of `expression`.
    ///
    /// The expression is parsed before the student is loaded; an expression
    /// without clauses passes without touching the store.
    ///
    /// # Errors
    /// * [`RegistrationError::Malformed`] for an unreadable expression.
    /// * [`RegistrationError::NotFound`] for an unknown student.
    /// * An unavailable-kind error when the store cannot be reached.
    #[instrument(skip(self), fields(student = %student_id))]
    pub async fn check(
        &self,
        student_id: &str,
        expression: &str,
    ) -> Result<Eligibility, RegistrationError> {
        let clauses = parse_expression(expression).context("Parsing requirement expression")?;
        if clauses.is_empty() {
            return Ok(Eligibility::Eligible);
        }

        let student = self.students.find_by_id(student_id).await?;
        Ok(self.evaluate(&clauses, &student))
    }

    /// Conjunction over `clauses`, stopping at the first failure.
    #[must_use]
    pub fn evaluate(&self, clauses: &[RequirementClause], student: &StudentRecord) -> Eligibility {
        let failure =
            first_failure(clauses, |clause| clause.is_satisfied_by(student, &self.thresholds));

        match failure {
            None => Eligibility::Eligible,
            Some((clause_index, clause)) => {
                let reason = clause.kind();
                debug!(student = %student.id, clause_index, %reason, "Prerequisite clause failed");
                Eligibility::Ineligible(PrerequisiteConflict {
                    reason,
                    message: reason.conflict_message().to_owned(),
                    clause_index,
                })
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::clause::parse_clause;

    #[test]
    fn stops_at_first_failing_clause() {
        let clauses =
            vec![parse_clause("major CSE").unwrap(), parse_clause("standing U3").unwrap()];
        let mut evaluated = Vec::new();

        let failure = first_failure(&clauses, |clause| {
            evaluated.push(clause.kind());
            false
        });

        assert_eq!(failure.map(|(index, _)| index), Some(0));
        assert_eq!(evaluated, vec![ClauseKind::Major]);
    }

    #[test]
    fn evaluates_every_clause_when_all_hold() {
        let clauses = vec![
            parse_clause("major CSE").unwrap(),
            parse_clause("standing 1").unwrap(),
            parse_clause("CSE,114").unwrap(),
        ];
        let mut count = 0;

        assert!(first_failure(&clauses, |_| {
            count += 1;
            true
        })
        .is_none());
        assert_eq!(count, 3);
    }

    #[test]
    fn ineligible_converts_to_conflict_error() {
        let outcome = Eligibility::Ineligible(PrerequisiteConflict {
            reason: ClauseKind::Standing,
            message: ClauseKind::Standing.conflict_message().to_owned(),
            clause_index: 1,
        });

        let err = outcome.into_result().unwrap_err();
        assert_eq!(err.kind(), polar_domain::ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            "Conflict (standing): You do not fit the standing prerequisite of this class"
        );
    }
}
