use crate::error::RegistrationError;
use crate::model::{ClassSnapshot, DateField, FieldUpdate, TimesheetEntry};
use crate::rules::Grade;
use crate::store::StudentStore;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Read-only projections of a student document, plus the single-field writes.
///
/// Every call is one lookup keyed by student id and fails with
/// [`RegistrationError::NotFound`] for an unknown student.
#[derive(Debug, Clone)]
pub struct StudentRecords {
    students: Arc<dyn StudentStore>,
}

impl StudentRecords {
    pub fn new(students: Arc<dyn StudentStore>) -> Self {
        Self { students }
    }

    /// # Errors
    /// See the type docs.
    pub async fn cart(&self, student_id: &str) -> Result<Vec<ClassSnapshot>, RegistrationError> {
        Ok(self.students.find_by_id(student_id).await?.active_selections)
    }

    /// # Errors
    /// See the type docs.
    pub async fn transcript(
        &self,
        student_id: &str,
    ) -> Result<BTreeMap<String, Grade>, RegistrationError> {
        Ok(self.students.find_by_id(student_id).await?.grades)
    }

    /// Stored cumulative GPA; `None` until one is recorded.
    ///
    /// # Errors
    /// See the type docs.
    pub async fn gpa(&self, student_id: &str) -> Result<Option<f64>, RegistrationError> {
        Ok(self.students.find_by_id(student_id).await?.gpa)
    }

    /// # Errors
    /// See the type docs.
    pub async fn date(
        &self,
        student_id: &str,
        field: DateField,
    ) -> Result<Option<DateTime<Utc>>, RegistrationError> {
        Ok(self.students.find_by_id(student_id).await?.date(field))
    }

    /// # Errors
    /// See the type docs.
    #[instrument(skip(self))]
    pub async fn set_date(
        &self,
        student_id: &str,
        field: DateField,
        at: DateTime<Utc>,
    ) -> Result<(), RegistrationError> {
        self.students.update_field(student_id, FieldUpdate::date(field, at)).await
    }

    /// # Errors
    /// See the type docs.
    pub async fn timesheet(
        &self,
        student_id: &str,
    ) -> Result<Vec<TimesheetEntry>, RegistrationError> {
        Ok(self.students.find_by_id(student_id).await?.timesheet)
    }

    /// Replaces the whole timesheet.
    ///
    /// # Errors
    /// [`RegistrationError::Malformed`] when an entry ends before it starts;
    /// nothing is written in that case.
    #[instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn save_timesheet(
        &self,
        student_id: &str,
        entries: Vec<TimesheetEntry>,
    ) -> Result<(), RegistrationError> {
        for entry in &entries {
            entry.validate()?;
        }
        self.students.update_field(student_id, FieldUpdate::Timesheet(entries)).await?;
        debug!("Timesheet saved");
        Ok(())
    }
}
