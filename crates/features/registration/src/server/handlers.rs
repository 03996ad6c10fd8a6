use super::dto::{
    CommitFailure, CommitRequest, CommitResponse, DateRequest, DateResponse, GpaResponse,
    PrerequisiteRequest, PrerequisiteResponse, SearchParams, TimesheetBody, TranscriptResponse,
};
use crate::Registration;
use crate::model::{ClassOffering, ClassSnapshot, DateField};
use crate::rules::{Eligibility, PrerequisiteConflict};
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use polar_domain::constants::{RECORDS_TAG, REGISTRATION_TAG};
use polar_kernel::prelude::{ApiError, ApiState, ErrorBody};

type ApiResult<T> = Result<T, ApiError>;

#[utoipa::path(
    get,
    path = "/api/offerings",
    params(SearchParams),
    responses(
        (status = OK, description = "Matching offerings, de-duplicated", body = Vec<ClassOffering>),
        (status = SERVICE_UNAVAILABLE, body = ErrorBody),
    ),
    tag = REGISTRATION_TAG,
)]
pub(super) async fn search_offerings(
    State(state): State<ApiState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<ClassOffering>>> {
    let registration = state.try_get_slice::<Registration>()?;
    Ok(Json(registration.search.search(&params.query).await?))
}

#[utoipa::path(
    post,
    path = "/api/students/{id}/prerequisites",
    params(("id" = String, Path, description = "Student id")),
    request_body = PrerequisiteRequest,
    responses(
        (status = OK, description = "Every clause holds", body = PrerequisiteResponse),
        (status = CONFLICT, description = "First failing clause", body = PrerequisiteConflict),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = REGISTRATION_TAG,
)]
pub(super) async fn check_prerequisites(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<PrerequisiteRequest>,
) -> ApiResult<Response> {
    let registration = state.try_get_slice::<Registration>()?;
    let response = match registration.prerequisites.check(&id, &request.expression).await? {
        Eligibility::Eligible => Json(PrerequisiteResponse { eligible: true }).into_response(),
        Eligibility::Ineligible(conflict) => (StatusCode::CONFLICT, Json(conflict)).into_response(),
    };
    Ok(response)
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/cart",
    params(("id" = String, Path, description = "Student id")),
    request_body = CommitRequest,
    responses(
        (status = OK, description = "Every selection committed", body = CommitResponse),
        (status = CONFLICT, description = "Some selections failed", body = CommitFailure),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
        (status = SERVICE_UNAVAILABLE, body = ErrorBody),
    ),
    tag = REGISTRATION_TAG,
)]
pub(super) async fn commit_cart(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(request): Json<CommitRequest>,
) -> ApiResult<Response> {
    let registration = state.try_get_slice::<Registration>()?;
    let report = registration.enrollment.commit(&id, &request.selections).await?;

    if report.is_complete() {
        return Ok(Json(CommitResponse { committed: report.committed }).into_response());
    }
    Ok((StatusCode::CONFLICT, Json(CommitFailure::from(report))).into_response())
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/cart",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = OK, body = Vec<ClassSnapshot>),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = REGISTRATION_TAG,
)]
pub(super) async fn get_cart(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ClassSnapshot>>> {
    let registration = state.try_get_slice::<Registration>()?;
    Ok(Json(registration.records.cart(&id).await?))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/transcript",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = OK, body = TranscriptResponse),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn get_transcript(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TranscriptResponse>> {
    let registration = state.try_get_slice::<Registration>()?;
    Ok(Json(TranscriptResponse { grades: registration.records.transcript(&id).await? }))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/gpa",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = OK, body = GpaResponse),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn get_gpa(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<GpaResponse>> {
    let registration = state.try_get_slice::<Registration>()?;
    Ok(Json(GpaResponse { gpa: registration.records.gpa(&id).await? }))
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/dates/{field}",
    params(
        ("id" = String, Path, description = "Student id"),
        ("field" = DateField, Path, description = "`enrollment` or `housing`"),
    ),
    responses(
        (status = OK, body = DateResponse),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn get_date(
    State(state): State<ApiState>,
    Path((id, field)): Path<(String, String)>,
) -> ApiResult<Json<DateResponse>> {
    let registration = state.try_get_slice::<Registration>()?;
    let field: DateField = field.parse()?;
    let date = registration.records.date(&id, field).await?;
    Ok(Json(DateResponse { field, date }))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/dates/{field}",
    params(
        ("id" = String, Path, description = "Student id"),
        ("field" = DateField, Path, description = "`enrollment` or `housing`"),
    ),
    request_body = DateRequest,
    responses(
        (status = NO_CONTENT),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn set_date(
    State(state): State<ApiState>,
    Path((id, field)): Path<(String, String)>,
    Json(request): Json<DateRequest>,
) -> ApiResult<StatusCode> {
    let registration = state.try_get_slice::<Registration>()?;
    let field: DateField = field.parse()?;
    registration.records.set_date(&id, field, request.date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/api/students/{id}/timesheet",
    params(("id" = String, Path, description = "Student id")),
    responses(
        (status = OK, body = TimesheetBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn get_timesheet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> ApiResult<Json<TimesheetBody>> {
    let registration = state.try_get_slice::<Registration>()?;
    Ok(Json(TimesheetBody { entries: registration.records.timesheet(&id).await? }))
}

#[utoipa::path(
    put,
    path = "/api/students/{id}/timesheet",
    params(("id" = String, Path, description = "Student id")),
    request_body = TimesheetBody,
    responses(
        (status = NO_CONTENT),
        (status = BAD_REQUEST, body = ErrorBody),
        (status = NOT_FOUND, body = ErrorBody),
    ),
    tag = RECORDS_TAG,
)]
pub(super) async fn save_timesheet(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(body): Json<TimesheetBody>,
) -> ApiResult<StatusCode> {
    let registration = state.try_get_slice::<Registration>()?;
    registration.records.save_timesheet(&id, body.entries).await?;
    Ok(StatusCode::NO_CONTENT)
}
