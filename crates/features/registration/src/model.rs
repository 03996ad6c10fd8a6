//! Typed records exchanged with the stores and the HTTP layer.

use crate::error::RegistrationError;
use crate::rules::Grade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// A student document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub id: String,
    pub name: String,
    /// Program codes in declaration order, without duplicates.
    pub majors: Vec<String>,
    pub credits_earned: f64,
    pub gpa: Option<f64>,
    /// Course key (`"CSE 214"`) to final grade.
    #[schema(value_type = Object)]
    pub grades: BTreeMap<String, Grade>,
    /// The cart, replaced wholesale by every commit.
    pub active_selections: Vec<ClassSnapshot>,
    pub cart_version: CartVersion,
    pub timesheet: Vec<TimesheetEntry>,
    pub enrollment_date: Option<DateTime<Utc>>,
    pub housing_date: Option<DateTime<Utc>>,
}

impl StudentRecord {
    /// A student with no history, majors or cart.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            majors: Vec::new(),
            credits_earned: 0.0,
            gpa: None,
            grades: BTreeMap::new(),
            active_selections: Vec::new(),
            cart_version: CartVersion::default(),
            timesheet: Vec::new(),
            enrollment_date: None,
            housing_date: None,
        }
    }

    #[must_use]
    pub fn with_majors<I, S>(mut self, majors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for major in majors {
            let major = major.into();
            if !self.majors.contains(&major) {
                self.majors.push(major);
            }
        }
        self
    }

    #[must_use]
    pub const fn with_credits(mut self, credits: f64) -> Self {
        self.credits_earned = credits;
        self
    }

    #[must_use]
    pub fn with_grade(mut self, course_key: impl Into<String>, grade: Grade) -> Self {
        self.grades.insert(course_key.into(), grade);
        self
    }

    #[must_use]
    pub const fn with_gpa(mut self, gpa: f64) -> Self {
        self.gpa = Some(gpa);
        self
    }

    #[must_use]
    pub fn date(&self, field: DateField) -> Option<DateTime<Utc>> {
        match field {
            DateField::Enrollment => self.enrollment_date,
            DateField::Housing => self.housing_date,
        }
    }

    /// Applies a field update in place.
    pub fn apply(&mut self, update: FieldUpdate) {
        match update {
            FieldUpdate::Timesheet(entries) => self.timesheet = entries,
            FieldUpdate::EnrollmentDate(at) => self.enrollment_date = Some(at),
            FieldUpdate::HousingDate(at) => self.housing_date = Some(at),
        }
    }
}

/// Optimistic counter bumped on every cart reset.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(transparent)]
pub struct CartVersion(pub u64);

impl CartVersion {
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Reference data of a course, shared by all of its sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseMeta {
    /// Department code, e.g. `CSE`.
    pub subject: String,
    /// Catalog number, e.g. `214`.
    pub code: String,
    pub title: String,
    pub description: String,
    pub credits: f64,
    /// Requirement expression, `;`-separated clauses.
    pub prerequisites: String,
    /// General-education tags.
    pub sbc: Vec<String>,
}

impl CourseMeta {
    /// `"CSE 214"`.
    #[must_use]
    pub fn course_key(&self) -> String {
        format!("{} {}", self.subject, self.code)
    }
}

/// One section of a course with its remaining seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassOffering {
    pub course: CourseMeta,
    pub section_id: String,
    pub capacity_remaining: u32,
    pub days: String,
    pub time_start: String,
    pub time_end: String,
    pub instructor: String,
    pub room: String,
}

impl ClassOffering {
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::new(self.course.course_key(), self.section_id.clone())
    }
}

/// Display fields of an offering copied into a cart at commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassSnapshot {
    pub course: CourseMeta,
    pub section_id: String,
    pub days: String,
    pub time_start: String,
    pub time_end: String,
    pub instructor: String,
    pub room: String,
}

impl ClassSnapshot {
    #[must_use]
    pub fn selection(&self) -> Selection {
        Selection::new(self.course.course_key(), self.section_id.clone())
    }
}

impl From<&ClassOffering> for ClassSnapshot {
    fn from(offering: &ClassOffering) -> Self {
        Self {
            course: offering.course.clone(),
            section_id: offering.section_id.clone(),
            days: offering.days.clone(),
            time_start: offering.time_start.clone(),
            time_end: offering.time_end.clone(),
            instructor: offering.instructor.clone(),
            room: offering.room.clone(),
        }
    }
}

/// Identity of an offering as requested by a student: course key plus section.
///
/// Displays and parses as `"CSE 214-01"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    #[schema(example = "CSE 214")]
    pub course_key: String,
    #[schema(example = "01")]
    pub section_id: String,
}

impl Selection {
    pub fn new(course_key: impl Into<String>, section_id: impl Into<String>) -> Self {
        Self { course_key: course_key.into(), section_id: section_id.into() }
    }

    /// Rejects blank parts and section ids containing `-`.
    ///
    /// # Errors
    /// [`RegistrationError::Malformed`] naming the offending selection.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.course_key.trim().is_empty() || self.section_id.trim().is_empty() {
            return Err(RegistrationError::malformed(format!(
                "selection '{self}' needs both a course key and a section"
            )));
        }
        if self.section_id.contains('-') {
            return Err(RegistrationError::malformed(format!(
                "section '{}' must not contain '-'",
                self.section_id
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Selection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.course_key, self.section_id)
    }
}

impl FromStr for Selection {
    type Err = RegistrationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (course_key, section_id) = raw.trim().rsplit_once('-').ok_or_else(|| {
            RegistrationError::malformed(format!("'{raw}' is not of the form 'CSE 214-01'"))
        })?;
        let selection = Self::new(course_key.trim(), section_id.trim());
        selection.validate()?;
        Ok(selection)
    }
}

/// One shift of student employment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimesheetEntry {
    pub status: String,
    pub time_in: DateTime<Utc>,
    pub time_out: DateTime<Utc>,
}

impl TimesheetEntry {
    /// # Errors
    /// [`RegistrationError::Malformed`] when the shift ends before it starts.
    pub fn validate(&self) -> Result<(), RegistrationError> {
        if self.time_out < self.time_in {
            return Err(RegistrationError::malformed(format!(
                "timeOut {} is earlier than timeIn {}",
                self.time_out.to_rfc3339(),
                self.time_in.to_rfc3339()
            )));
        }
        Ok(())
    }
}

/// Named date fields on a student document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Enrollment,
    Housing,
}

impl DateField {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enrollment => "enrollment",
            Self::Housing => "housing",
        }
    }
}

impl FromStr for DateField {
    type Err = RegistrationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "enrollment" => Ok(Self::Enrollment),
            "housing" => Ok(Self::Housing),
            other => Err(RegistrationError::malformed(format!(
                "unknown date field '{other}', expected 'enrollment' or 'housing'"
            ))),
        }
    }
}

/// Single-field writes a student document accepts outside of cart commits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Timesheet(Vec<TimesheetEntry>),
    EnrollmentDate(DateTime<Utc>),
    HousingDate(DateTime<Utc>),
}

impl FieldUpdate {
    #[must_use]
    pub const fn date(field: DateField, at: DateTime<Utc>) -> Self {
        match field {
            DateField::Enrollment => Self::EnrollmentDate(at),
            DateField::Housing => Self::HousingDate(at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_round_trips_through_display() {
        let selection: Selection = "CSE 214-01".parse().expect("parse");
        assert_eq!(selection, Selection::new("CSE 214", "01"));
        assert_eq!(selection.to_string(), "CSE 214-01");
    }

    #[test]
    fn selection_rejects_missing_parts() {
        assert!("CSE 214".parse::<Selection>().is_err());
        assert!("-01".parse::<Selection>().is_err());
        assert!("CSE 214-".parse::<Selection>().is_err());
        assert!(Selection::new("CSE 214", "0-1").validate().is_err());
    }

    #[test]
    fn majors_keep_first_occurrence_order() {
        let student = StudentRecord::new("S1", "Ada").with_majors(["CSE", "AMS", "CSE"]);
        assert_eq!(student.majors, vec!["CSE".to_owned(), "AMS".to_owned()]);
    }

    #[test]
    fn timesheet_entries_must_not_end_before_start() {
        let start = DateTime::parse_from_rfc3339("2026-03-02T09:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);
        let end = DateTime::parse_from_rfc3339("2026-03-02T13:00:00Z")
            .expect("timestamp")
            .with_timezone(&Utc);

        let ok = TimesheetEntry { status: "worked".to_owned(), time_in: start, time_out: end };
        assert!(ok.validate().is_ok());

        let backwards = TimesheetEntry { time_in: end, time_out: start, ..ok };
        assert!(backwards.validate().is_err());
    }

    #[test]
    fn date_fields_parse_case_insensitively() {
        assert_eq!("Housing".parse::<DateField>().ok(), Some(DateField::Housing));
        assert!("graduation".parse::<DateField>().is_err());
    }
}
