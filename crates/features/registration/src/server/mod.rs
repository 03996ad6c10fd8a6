//! HTTP surface of the registration slice.

pub mod dto;
mod handlers;

use crate::error::RegistrationError;
use polar_kernel::prelude::{ApiError, ApiState};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        Self::new(err.kind(), err.to_string())
    }
}

/// Search, prerequisite, cart and student record routes.
pub fn router() -> OpenApiRouter<ApiState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::search_offerings))
        .routes(routes!(handlers::check_prerequisites))
        .routes(routes!(handlers::commit_cart, handlers::get_cart))
        .routes(routes!(handlers::get_transcript))
        .routes(routes!(handlers::get_gpa))
        .routes(routes!(handlers::get_date, handlers::set_date))
        .routes(routes!(handlers::get_timesheet, handlers::save_timesheet))
}
