use super::grade::Grade;
use crate::error::RegistrationError;
use crate::model::StudentRecord;
use polar_domain::config::RegistrationConfig;
use serde::Serialize;
use std::fmt;
use utoipa::ToSchema;

const CLAUSE_SEPARATOR: char = ';';
const ALTERNATIVE_SEPARATOR: char = '/';

/// Minimum class rank, tiers 1 through 3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StandingTier(u8);

impl StandingTier {
    /// Accepts `U1`..`U3` or the bare ordinal `1`..`3`.
    ///
    /// # Errors
    /// [`RegistrationError::Malformed`] for any other code.
    pub fn parse(raw: &str) -> Result<Self, RegistrationError> {
        let raw = raw.trim();
        let digits = raw.strip_prefix(['U', 'u']).unwrap_or(raw);
        match digits {
            "1" => Ok(Self(1)),
            "2" => Ok(Self(2)),
            "3" => Ok(Self(3)),
            _ => Err(RegistrationError::malformed(format!("unknown standing tier '{raw}'"))),
        }
    }

    #[must_use]
    pub const fn ordinal(self) -> u8 {
        self.0
    }
}

/// Credit thresholds a student must strictly exceed for each standing tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StandingThresholds([f64; 3]);

impl StandingThresholds {
    /// # Errors
    /// [`RegistrationError::Malformed`] unless the thresholds are finite,
    /// non-negative and ascending.
    pub fn new(credits: [f64; 3]) -> Result<Self, RegistrationError> {
        let valid = credits.iter().all(|c| c.is_finite() && *c >= 0.0)
            && credits.windows(2).all(|pair| pair[0] <= pair[1]);
        if !valid {
            return Err(RegistrationError::malformed(format!(
                "standing thresholds {credits:?} must be non-negative and ascending"
            )));
        }
        Ok(Self(credits))
    }

    /// # Errors
    /// See [`StandingThresholds::new`].
    pub fn from_config(config: &RegistrationConfig) -> Result<Self, RegistrationError> {
        Self::new(config.standing_thresholds)
    }

    #[must_use]
    pub const fn credits_for(&self, tier: StandingTier) -> f64 {
        self.0[(tier.0 - 1) as usize]
    }
}

impl Default for StandingThresholds {
    fn default() -> Self {
        Self([23.0, 56.0, 84.0])
    }
}

/// The family a clause belongs to; reported when a clause fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ClauseKind {
    Major,
    Standing,
    MinGrade,
    Completion,
}

impl ClauseKind {
    /// Student-facing explanation of a failed clause.
    #[must_use]
    pub const fn conflict_message(self) -> &'static str {
        match self {
            Self::Major => "You do not fit the major prerequisite of this class",
            Self::Standing => "You do not fit the standing prerequisite of this class",
            Self::MinGrade => "You do not fit the minimum grade prerequisite of this class",
            Self::Completion => "You do not fit the class prerequisite of this class",
        }
    }
}

impl fmt::Display for ClauseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Major => "major",
            Self::Standing => "standing",
            Self::MinGrade => "min-grade",
            Self::Completion => "completion",
        })
    }
}

/// One condition of a requirement expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequirementClause {
    /// Any of these program codes.
    Major(Vec<String>),
    Standing(StandingTier),
    /// At least `threshold` in any of `courses`.
    MinGrade { threshold: Grade, courses: Vec<String> },
    /// A passing grade in any of these courses.
    Completion(Vec<String>),
}

impl RequirementClause {
    #[must_use]
    pub const fn kind(&self) -> ClauseKind {
        match self {
            Self::Major(_) => ClauseKind::Major,
            Self::Standing(_) => ClauseKind::Standing,
            Self::MinGrade { .. } => ClauseKind::MinGrade,
            Self::Completion(_) => ClauseKind::Completion,
        }
    }

    /// Evaluates the clause against a loaded record. Missing grades simply fail.
    #[must_use]
    pub fn is_satisfied_by(&self, student: &StudentRecord, thresholds: &StandingThresholds) -> bool {
        match self {
            Self::Major(accepted) => student.majors.iter().any(|major| accepted.contains(major)),
            Self::Standing(tier) => student.credits_earned > thresholds.credits_for(*tier),
            Self::MinGrade { threshold, courses } => any_meets(student, courses, *threshold),
            Self::Completion(courses) => any_meets(student, courses, Grade::LOWEST_PASSING),
        }
    }
}

fn any_meets(student: &StudentRecord, courses: &[String], threshold: Grade) -> bool {
    courses
        .iter()
        .filter_map(|course| student.grades.get(course))
        .any(|grade| grade.meets(threshold))
}

/// Splits a requirement expression into clauses, in listed order.
///
/// Blank clauses are skipped, so an empty expression yields no clauses.
///
/// # Errors
/// [`RegistrationError::Malformed`] naming the first clause that cannot be read.
pub fn parse_expression(expression: &str) -> Result<Vec<RequirementClause>, RegistrationError> {
    expression
        .split(CLAUSE_SEPARATOR)
        .map(str::trim)
        .filter(|clause| !clause.is_empty())
        .map(parse_clause)
        .collect()
}

/// Classifies one clause by its prefix.
///
/// # Errors
/// [`RegistrationError::Malformed`] when the clause is missing its operand or
/// names an unknown tier or grade.
pub fn parse_clause(clause: &str) -> Result<RequirementClause, RegistrationError> {
    let clause = clause.trim();

    if clause.starts_with("major") {
        let codes = alternatives(operand(clause)?, false);
        return non_empty(codes, clause).map(RequirementClause::Major);
    }
    if clause.starts_with("standing") {
        return StandingTier::parse(operand(clause)?).map(RequirementClause::Standing);
    }
    if let Some(rest) = clause.strip_prefix('>') {
        let (threshold, courses) = rest.split_once(char::is_whitespace).ok_or_else(|| {
            RegistrationError::malformed(format!("'{clause}' has no course list"))
        })?;
        let threshold = threshold.parse::<Grade>()?;
        let courses = non_empty(alternatives(courses, true), clause)?;
        return Ok(RequirementClause::MinGrade { threshold, courses });
    }

    non_empty(alternatives(clause, true), clause).map(RequirementClause::Completion)
}

/// Text after the keyword, e.g. `CSE/AMS` in `major CSE/AMS`.
fn operand(clause: &str) -> Result<&str, RegistrationError> {
    clause
        .split_once(char::is_whitespace)
        .map(|(_, rest)| rest.trim())
        .filter(|rest| !rest.is_empty())
        .ok_or_else(|| RegistrationError::malformed(format!("'{clause}' has no operand")))
}

/// `/`-separated alternatives. Course keys store `,` where the grade map has a space.
fn alternatives(raw: &str, course_keys: bool) -> Vec<String> {
    raw.split(ALTERNATIVE_SEPARATOR)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| if course_keys { item.replace(',', " ") } else { item.to_owned() })
        .collect()
}

fn non_empty(items: Vec<String>, clause: &str) -> Result<Vec<String>, RegistrationError> {
    if items.is_empty() {
        return Err(RegistrationError::malformed(format!("'{clause}' lists nothing")));
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn courses(keys: &[&str]) -> Vec<String> {
        keys.iter().map(|k| (*k).to_owned()).collect()
    }

    #[test]
    fn classifies_by_prefix() {
        let clauses =
            parse_expression("major CSE/AMS; standing U2;>B CSE,214/CSE,219;CSE,114").unwrap();

        assert_eq!(
            clauses,
            vec![
                RequirementClause::Major(courses(&["CSE", "AMS"])),
                RequirementClause::Standing(StandingTier(2)),
                RequirementClause::MinGrade {
                    threshold: Grade::B,
                    courses: courses(&["CSE 214", "CSE 219"])
                },
                RequirementClause::Completion(courses(&["CSE 114"])),
            ]
        );
    }

    #[test]
    fn blank_expressions_have_no_clauses() {
        assert!(parse_expression("").unwrap().is_empty());
        assert!(parse_expression(" ; ;").unwrap().is_empty());
    }

    #[test]
    fn standing_accepts_bare_ordinals() {
        assert_eq!(parse_clause("standing 3").unwrap(), RequirementClause::Standing(StandingTier(3)));
        assert!(parse_clause("standing U4").is_err());
        assert!(parse_clause("standing senior").is_err());
    }

    #[test]
    fn malformed_clauses_are_rejected() {
        assert!(parse_clause("major").is_err());
        assert!(parse_clause(">B").is_err());
        assert!(parse_clause(">Q CSE,214").is_err());
        assert!(parse_clause("standing").is_err());
        assert!(parse_clause("///").is_err());
    }

    #[test]
    fn thresholds_must_ascend() {
        assert!(StandingThresholds::new([23.0, 56.0, 84.0]).is_ok());
        assert!(StandingThresholds::new([56.0, 23.0, 84.0]).is_err());
        assert!(StandingThresholds::new([-1.0, 23.0, 84.0]).is_err());
        assert!(StandingThresholds::new([f64::NAN, 23.0, 84.0]).is_err());
    }

    #[test]
    fn standing_is_strictly_greater() {
        let thresholds = StandingThresholds::default();
        let clause = RequirementClause::Standing(StandingTier(1));

        let at = StudentRecord::new("S1", "Ada").with_credits(23.0);
        let above = StudentRecord::new("S2", "Bo").with_credits(23.5);
        assert!(!clause.is_satisfied_by(&at, &thresholds));
        assert!(clause.is_satisfied_by(&above, &thresholds));
    }

    #[test]
    fn completion_needs_a_passing_grade() {
        let thresholds = StandingThresholds::default();
        let clause = RequirementClause::Completion(courses(&["CSE 114"]));

        let passed = StudentRecord::new("S1", "Ada").with_grade("CSE 114", Grade::D);
        let failed = StudentRecord::new("S2", "Bo").with_grade("CSE 114", Grade::F);
        let absent = StudentRecord::new("S3", "Cy");
        assert!(clause.is_satisfied_by(&passed, &thresholds));
        assert!(!clause.is_satisfied_by(&failed, &thresholds));
        assert!(!clause.is_satisfied_by(&absent, &thresholds));
    }
}
