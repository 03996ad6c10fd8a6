use axum::Router;
use axum::http::HeaderValue;
use polar_domain::config::CorsConfig;
use polar_kernel::prelude::ApiState;
use polar_kernel::server::router::system_router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_scalar::{Scalar, Servable};

#[derive(OpenApi)]
#[openapi(
    info(title = "Polar registration API"),
    tags(
        (name = "System", description = "Liveness"),
        (name = "Registration", description = "Search, prerequisites and carts"),
        (name = "Records", description = "Transcript, GPA, dates and timesheets"),
    )
)]
struct ApiDoc;

/// Full application router with the `OpenAPI` UI mounted at `/docs`.
pub(crate) fn init(state: ApiState) -> Router {
    let cors = cors_layer(&state.config.server.cors);

    let (openapi_routes, api_doc) = OpenApiRouter::with_openapi(ApiDoc::openapi())
        .merge(system_router())
        .merge(polar_registration::server::router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
        .split_for_parts();

    let scalar_routes = Scalar::with_url("/docs", api_doc);

    Router::new().merge(openapi_routes).merge(scalar_routes)
}

/// Any origin when the list is empty, otherwise exactly the listed ones.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "Ignoring unparsable CORS origin");
                None
            },
        })
        .collect();
    layer.allow_origin(origins)
}
