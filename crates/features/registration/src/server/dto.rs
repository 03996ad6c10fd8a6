use crate::enrollment::{CommitReport, FailedSelection};
use crate::model::{DateField, Selection, TimesheetEntry};
use crate::rules::Grade;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Whitespace-separated terms; `[TAG]` filters by general-education tag.
    #[param(example = "CSE [TECH]")]
    #[serde(default)]
    pub query: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PrerequisiteRequest {
    #[schema(example = "major CSE/AMS;standing U2;>B CSE,214")]
    pub expression: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PrerequisiteResponse {
    pub eligible: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CommitRequest {
    /// The full new cart, in the order seats should be taken.
    pub selections: Vec<Selection>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CommitResponse {
    pub committed: Vec<Selection>,
}

/// Body of a partially failed commit. The committed selections stay in the cart.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommitFailure {
    pub failed_selections: Vec<String>,
    pub failures: Vec<FailedSelection>,
    pub committed: Vec<Selection>,
    pub message: String,
}

impl From<CommitReport> for CommitFailure {
    fn from(report: CommitReport) -> Self {
        Self {
            failed_selections: report.failed_selections(),
            message: report.failure_message().unwrap_or_default(),
            failures: report.failed,
            committed: report.committed,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TranscriptResponse {
    /// Course key to letter grade.
    #[schema(value_type = Object)]
    pub grades: BTreeMap<String, Grade>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GpaResponse {
    pub gpa: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DateResponse {
    pub field: DateField,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct DateRequest {
    pub date: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TimesheetBody {
    pub entries: Vec<TimesheetEntry>,
}
