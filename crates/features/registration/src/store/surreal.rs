use super::{CatalogStore, StudentStore};
use crate::error::RegistrationError;
use crate::model::{
    CartVersion, ClassOffering, ClassSnapshot, CourseMeta, FieldUpdate, Selection, StudentRecord,
    TimesheetEntry,
};
use crate::rules::Grade;
use crate::search::SearchTerm;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use polar_database::{Database, Migration};
use polar_domain::constants::{OFFERING, REGISTRATION, STUDENT};
use std::collections::BTreeMap;
use surrealdb::types::SurrealValue;
use tracing::debug;

const SCHEMA: &str = include_str!("schema.surql");

const FIND_STUDENT: &str = "SELECT student_id, name, majors, credits_earned, gpa, grades, \
     active_selections, cart_version, timesheet, enrollment_date, housing_date \
     FROM student WHERE student_id = $id LIMIT 1";

const RESET_SELECTIONS: &str = "UPDATE student SET active_selections = [], cart_version += 1 \
     WHERE student_id = $id RETURN VALUE cart_version";

const APPEND_SELECTION: &str = "UPDATE student SET active_selections += $snapshot \
     WHERE student_id = $id AND cart_version = $version RETURN VALUE cart_version";

const SET_TIMESHEET: &str =
    "UPDATE student SET timesheet = $value WHERE student_id = $id RETURN VALUE student_id";
const SET_ENROLLMENT_DATE: &str =
    "UPDATE student SET enrollment_date = $value WHERE student_id = $id RETURN VALUE student_id";
const SET_HOUSING_DATE: &str =
    "UPDATE student SET housing_date = $value WHERE student_id = $id RETURN VALUE student_id";

const FIND_OFFERING: &str = "SELECT course_key, section_id, capacity_remaining, days, \
     time_start, time_end, instructor, room, course \
     FROM offering WHERE course_key = $course AND section_id = $section LIMIT 1";

const DECREMENT_CAPACITY: &str = "UPDATE offering SET capacity_remaining -= 1 \
     WHERE course_key = $course AND section_id = $section AND capacity_remaining > 0 \
     RETURN VALUE capacity_remaining";

const RELEASE_CAPACITY: &str = "UPDATE offering SET capacity_remaining += 1 \
     WHERE course_key = $course AND section_id = $section RETURN VALUE capacity_remaining";

const SEARCH_BY_TAG: &str = "SELECT course_key, section_id, capacity_remaining, days, \
     time_start, time_end, instructor, room, course \
     FROM offering WHERE $tag INSIDE course.sbc ORDER BY course_key, section_id";

const SEARCH_BY_TEXT: &str = "SELECT course_key, section_id, capacity_remaining, days, \
     time_start, time_end, instructor, room, course \
     FROM offering WHERE string::uppercase(course.subject) = $upper \
     OR course.code = $text \
     OR string::contains(string::lowercase(course.title), $lower) \
     ORDER BY course_key, section_id";

/// Schema scripts of the registration slice, in apply order.
#[must_use]
pub fn migrations() -> Vec<Migration> {
    vec![Migration::new(REGISTRATION, "0001_schema", SCHEMA)]
}

#[derive(Debug, Clone, SurrealValue)]
struct CourseRow {
    subject: String,
    code: String,
    title: String,
    description: String,
    credits: f64,
    prerequisites: String,
    sbc: Vec<String>,
}

#[derive(Debug, Clone, SurrealValue)]
struct SnapshotRow {
    course: CourseRow,
    section_id: String,
    days: String,
    time_start: String,
    time_end: String,
    instructor: String,
    room: String,
}

#[derive(Debug, Clone, SurrealValue)]
struct OfferingRow {
    course_key: String,
    section_id: String,
    capacity_remaining: i64,
    days: String,
    time_start: String,
    time_end: String,
    instructor: String,
    room: String,
    course: CourseRow,
}

#[derive(Debug, Clone, SurrealValue)]
struct GradeRow {
    course: String,
    grade: String,
}

#[derive(Debug, Clone, SurrealValue)]
struct TimesheetRow {
    status: String,
    time_in: String,
    time_out: String,
}

#[derive(Debug, Clone, SurrealValue)]
struct StudentRow {
    student_id: String,
    name: String,
    majors: Vec<String>,
    credits_earned: f64,
    gpa: Option<f64>,
    grades: Vec<GradeRow>,
    active_selections: Vec<SnapshotRow>,
    cart_version: i64,
    timesheet: Vec<TimesheetRow>,
    enrollment_date: Option<String>,
    housing_date: Option<String>,
}

impl From<&CourseMeta> for CourseRow {
    fn from(course: &CourseMeta) -> Self {
        Self {
            subject: course.subject.clone(),
            code: course.code.clone(),
            title: course.title.clone(),
            description: course.description.clone(),
            credits: course.credits,
            prerequisites: course.prerequisites.clone(),
            sbc: course.sbc.iter().map(|tag| tag.to_ascii_uppercase()).collect(),
        }
    }
}

impl From<CourseRow> for CourseMeta {
    fn from(row: CourseRow) -> Self {
        Self {
            subject: row.subject,
            code: row.code,
            title: row.title,
            description: row.description,
            credits: row.credits,
            prerequisites: row.prerequisites,
            sbc: row.sbc,
        }
    }
}

impl From<&ClassSnapshot> for SnapshotRow {
    fn from(snapshot: &ClassSnapshot) -> Self {
        Self {
            course: CourseRow::from(&snapshot.course),
            section_id: snapshot.section_id.clone(),
            days: snapshot.days.clone(),
            time_start: snapshot.time_start.clone(),
            time_end: snapshot.time_end.clone(),
            instructor: snapshot.instructor.clone(),
            room: snapshot.room.clone(),
        }
    }
}

impl From<SnapshotRow> for ClassSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            course: row.course.into(),
            section_id: row.section_id,
            days: row.days,
            time_start: row.time_start,
            time_end: row.time_end,
            instructor: row.instructor,
            room: row.room,
        }
    }
}

impl From<&ClassOffering> for OfferingRow {
    fn from(offering: &ClassOffering) -> Self {
        Self {
            course_key: offering.course.course_key(),
            section_id: offering.section_id.clone(),
            capacity_remaining: i64::from(offering.capacity_remaining),
            days: offering.days.clone(),
            time_start: offering.time_start.clone(),
            time_end: offering.time_end.clone(),
            instructor: offering.instructor.clone(),
            room: offering.room.clone(),
            course: CourseRow::from(&offering.course),
        }
    }
}

impl TryFrom<OfferingRow> for ClassOffering {
    type Error = RegistrationError;

    fn try_from(row: OfferingRow) -> Result<Self, Self::Error> {
        let capacity_remaining = u32::try_from(row.capacity_remaining).map_err(|_| {
            RegistrationError::malformed(format!(
                "offering {}-{} has capacity {}",
                row.course_key, row.section_id, row.capacity_remaining
            ))
        })?;
        Ok(Self {
            course: row.course.into(),
            section_id: row.section_id,
            capacity_remaining,
            days: row.days,
            time_start: row.time_start,
            time_end: row.time_end,
            instructor: row.instructor,
            room: row.room,
        })
    }
}

impl From<&TimesheetEntry> for TimesheetRow {
    fn from(entry: &TimesheetEntry) -> Self {
        Self {
            status: entry.status.clone(),
            time_in: entry.time_in.to_rfc3339(),
            time_out: entry.time_out.to_rfc3339(),
        }
    }
}

impl TryFrom<TimesheetRow> for TimesheetEntry {
    type Error = RegistrationError;

    fn try_from(row: TimesheetRow) -> Result<Self, Self::Error> {
        Ok(Self {
            status: row.status,
            time_in: timestamp(&row.time_in)?,
            time_out: timestamp(&row.time_out)?,
        })
    }
}

impl From<&StudentRecord> for StudentRow {
    fn from(student: &StudentRecord) -> Self {
        Self {
            student_id: student.id.clone(),
            name: student.name.clone(),
            majors: student.majors.clone(),
            credits_earned: student.credits_earned,
            gpa: student.gpa,
            grades: student
                .grades
                .iter()
                .map(|(course, grade)| GradeRow {
                    course: course.clone(),
                    grade: grade.as_str().to_owned(),
                })
                .collect(),
            active_selections: student.active_selections.iter().map(SnapshotRow::from).collect(),
            cart_version: i64::try_from(student.cart_version.0).unwrap_or(i64::MAX),
            timesheet: student.timesheet.iter().map(TimesheetRow::from).collect(),
            enrollment_date: student.enrollment_date.map(|at| at.to_rfc3339()),
            housing_date: student.housing_date.map(|at| at.to_rfc3339()),
        }
    }
}

impl TryFrom<StudentRow> for StudentRecord {
    type Error = RegistrationError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let grades: BTreeMap<String, Grade> = row
            .grades
            .into_iter()
            .map(|entry| -> Result<(String, Grade), RegistrationError> {
                Ok((entry.course, entry.grade.parse()?))
            })
            .collect::<Result<_, _>>()?;
        let timesheet: Vec<TimesheetEntry> = row
            .timesheet
            .into_iter()
            .map(TimesheetEntry::try_from)
            .collect::<Result<_, _>>()?;

        Ok(Self {
            majors: row.majors,
            credits_earned: row.credits_earned,
            gpa: row.gpa,
            grades,
            active_selections: row.active_selections.into_iter().map(Into::into).collect(),
            cart_version: cart_version(row.cart_version)?,
            timesheet,
            enrollment_date: row.enrollment_date.as_deref().map(timestamp).transpose()?,
            housing_date: row.housing_date.as_deref().map(timestamp).transpose()?,
            id: row.student_id,
            name: row.name,
        })
    }
}

fn timestamp(raw: &str) -> Result<DateTime<Utc>, RegistrationError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| RegistrationError::malformed(format!("stored timestamp '{raw}': {e}")))
}

fn cart_version(raw: i64) -> Result<CartVersion, RegistrationError> {
    u64::try_from(raw)
        .map(CartVersion)
        .map_err(|_| RegistrationError::malformed(format!("stored cart version {raw}")))
}

/// Rows that came back but could not be read into the expected shape.
fn undecodable(what: &'static str) -> impl FnOnce(surrealdb::Error) -> RegistrationError {
    move |e| RegistrationError::Malformed {
        message: e.to_string().into(),
        context: Some(what.into()),
    }
}

/// Both store contracts backed by `SurrealDB`.
///
/// Conditional writes are single `UPDATE .. WHERE` statements, so the guard and
/// the write are evaluated together by the database. Every call runs under the
/// connection timeout.
#[derive(Debug, Clone)]
pub struct SurrealStore {
    db: Database,
}

impl SurrealStore {
    #[must_use]
    pub const fn new(db: Database) -> Self {
        Self { db }
    }

    /// Creates a student document.
    ///
    /// # Errors
    /// An unavailable-kind error when the write fails, including a duplicate id.
    pub async fn insert_student(&self, student: &StudentRecord) -> Result<(), RegistrationError> {
        let row = StudentRow::from(student);
        self.db
            .bounded("Creating student", async {
                self.db
                    .query("CREATE student CONTENT $row")
                    .bind(("row", row))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Creates an offering. Tags are stored uppercase.
    ///
    /// # Errors
    /// An unavailable-kind error when the write fails, including a duplicate section.
    pub async fn insert_offering(&self, offering: &ClassOffering) -> Result<(), RegistrationError> {
        let row = OfferingRow::from(offering);
        self.db
            .bounded("Creating offering", async {
                self.db
                    .query("CREATE offering CONTENT $row")
                    .bind(("row", row))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    async fn versions(
        &self,
        operation: &'static str,
        query: &'static str,
        id: &str,
        expected: Option<CartVersion>,
        snapshot: Option<SnapshotRow>,
    ) -> Result<Vec<i64>, RegistrationError> {
        let id = id.to_owned();
        let version = expected.map(|v| i64::try_from(v.0).unwrap_or(i64::MAX));
        let rows = self
            .db
            .bounded(operation, async {
                let mut response = self
                    .db
                    .query(query)
                    .bind(("id", id))
                    .bind(("version", version))
                    .bind(("snapshot", snapshot))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok::<_, surrealdb::Error>(response.take::<Vec<i64>>(0))
            })
            .await?;
        rows.map_err(undecodable(STUDENT))
    }

    async fn set_field<V>(
        &self,
        query: &'static str,
        id: &str,
        value: V,
    ) -> Result<(), RegistrationError>
    where
        V: SurrealValue + Send + 'static,
    {
        let key = id.to_owned();
        let touched = self
            .db
            .bounded("Updating student field", async {
                let mut response = self
                    .db
                    .query(query)
                    .bind(("id", key))
                    .bind(("value", value))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok::<_, surrealdb::Error>(response.take::<Vec<String>>(0))
            })
            .await?
            .map_err(undecodable(STUDENT))?;

        if touched.is_empty() {
            return Err(RegistrationError::not_found(STUDENT, id.to_owned()));
        }
        Ok(())
    }

    async fn offerings(
        &self,
        operation: &'static str,
        query: &'static str,
        bindings: Vec<(&'static str, String)>,
    ) -> Result<Vec<ClassOffering>, RegistrationError> {
        let rows = self
            .db
            .bounded(operation, async {
                let mut request = self.db.query(query);
                for binding in bindings {
                    request = request.bind(binding);
                }
                let mut response = request.await?.check().map_err(surrealdb::Error::from)?;
                Ok::<_, surrealdb::Error>(response.take::<Vec<OfferingRow>>(0))
            })
            .await?
            .map_err(undecodable(OFFERING))?;

        rows.into_iter().map(ClassOffering::try_from).collect()
    }

    async fn capacity_write(
        &self,
        operation: &'static str,
        query: &'static str,
        selection: &Selection,
    ) -> Result<Vec<i64>, RegistrationError> {
        let course = selection.course_key.clone();
        let section = selection.section_id.clone();
        let rows = self
            .db
            .bounded(operation, async {
                let mut response = self
                    .db
                    .query(query)
                    .bind(("course", course))
                    .bind(("section", section))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok::<_, surrealdb::Error>(response.take::<Vec<i64>>(0))
            })
            .await?;
        rows.map_err(undecodable(OFFERING))
    }
}

#[async_trait]
impl StudentStore for SurrealStore {
    async fn find_by_id(&self, id: &str) -> Result<StudentRecord, RegistrationError> {
        let key = id.to_owned();
        let rows = self
            .db
            .bounded("Loading student", async {
                let mut response = self
                    .db
                    .query(FIND_STUDENT)
                    .bind(("id", key))
                    .await?
                    .check()
                    .map_err(surrealdb::Error::from)?;
                Ok::<_, surrealdb::Error>(response.take::<Vec<StudentRow>>(0))
            })
            .await?
            .map_err(undecodable(STUDENT))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| RegistrationError::not_found(STUDENT, id.to_owned()))?
            .try_into()
    }

    async fn reset_selections(&self, id: &str) -> Result<CartVersion, RegistrationError> {
        let versions = self.versions("Resetting cart", RESET_SELECTIONS, id, None, None).await?;
        let version = versions
            .into_iter()
            .next()
            .ok_or_else(|| RegistrationError::not_found(STUDENT, id.to_owned()))?;
        cart_version(version)
    }

    async fn append_selection(
        &self,
        id: &str,
        expected: CartVersion,
        snapshot: &ClassSnapshot,
    ) -> Result<bool, RegistrationError> {
        let versions = self
            .versions(
                "Appending to cart",
                APPEND_SELECTION,
                id,
                Some(expected),
                Some(SnapshotRow::from(snapshot)),
            )
            .await?;

        if versions.is_empty() {
            // Either the cart moved on or the student is gone; only the latter is an error.
            self.find_by_id(id).await?;
            debug!(student = %id, ?expected, "Cart version moved, append skipped");
            return Ok(false);
        }
        Ok(true)
    }

    async fn update_field(&self, id: &str, update: FieldUpdate) -> Result<(), RegistrationError> {
        match update {
            FieldUpdate::Timesheet(entries) => {
                let rows: Vec<TimesheetRow> = entries.iter().map(TimesheetRow::from).collect();
                self.set_field(SET_TIMESHEET, id, rows).await
            },
            FieldUpdate::EnrollmentDate(at) => {
                self.set_field(SET_ENROLLMENT_DATE, id, at.to_rfc3339()).await
            },
            FieldUpdate::HousingDate(at) => {
                self.set_field(SET_HOUSING_DATE, id, at.to_rfc3339()).await
            },
        }
    }
}

#[async_trait]
impl CatalogStore for SurrealStore {
    async fn find_offering(
        &self,
        selection: &Selection,
    ) -> Result<ClassOffering, RegistrationError> {
        self.offerings(
            "Loading offering",
            FIND_OFFERING,
            vec![
                ("course", selection.course_key.clone()),
                ("section", selection.section_id.clone()),
            ],
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| RegistrationError::not_found(OFFERING, selection.to_string()))
    }

    async fn try_decrement_capacity(
        &self,
        selection: &Selection,
    ) -> Result<bool, RegistrationError> {
        match self.capacity_write("Taking a seat", DECREMENT_CAPACITY, selection).await {
            Ok(remaining) => Ok(!remaining.is_empty()),
            Err(RegistrationError::Database { source, .. }) if source.is_transaction_conflict() => {
                debug!(%selection, "Seat decrement lost a write conflict");
                Ok(false)
            },
            Err(e) => Err(e),
        }
    }

    async fn release_capacity(&self, selection: &Selection) -> Result<(), RegistrationError> {
        let remaining =
            self.capacity_write("Releasing a seat", RELEASE_CAPACITY, selection).await?;
        if remaining.is_empty() {
            return Err(RegistrationError::not_found(OFFERING, selection.to_string()));
        }
        Ok(())
    }

    async fn search(&self, term: &SearchTerm) -> Result<Vec<ClassOffering>, RegistrationError> {
        match term {
            SearchTerm::Tag(tag) => {
                self.offerings(
                    "Searching by tag",
                    SEARCH_BY_TAG,
                    vec![("tag", tag.to_ascii_uppercase())],
                )
                .await
            },
            SearchTerm::Text(text) => {
                self.offerings(
                    "Searching by text",
                    SEARCH_BY_TEXT,
                    vec![
                        ("upper", text.to_uppercase()),
                        ("text", text.clone()),
                        ("lower", text.to_lowercase()),
                    ],
                )
                .await
            },
        }
    }
}
