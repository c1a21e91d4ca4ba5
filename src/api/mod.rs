//! HTTP surface: routes, middleware and the OpenAPI document.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::{self, AppState};

#[derive(OpenApi)]
#[openapi(
    info(title = "Telco Churn Predictor API"),
    paths(
        handlers::health,
        handlers::model_info,
        handlers::predict,
        handlers::features
    ),
    components(schemas(
        crate::models::CustomerForm,
        crate::models::FeatureRecord,
        crate::models::PredictionResponse,
        crate::models::ModelInfo,
        crate::models::RiskLevel,
        crate::models::Gender,
        crate::models::YesNo,
        crate::models::MultipleLines,
        crate::models::InternetService,
        crate::models::AddonService,
        crate::models::Contract,
        crate::models::PaymentMethod,
        crate::models::TenureGroup,
        crate::errors::ErrorResponse
    ))
)]
pub struct ApiDoc;

/// Form, prediction API and documentation routes.
///
/// Rate limiting and body limits are applied by the caller so tests can drive
/// the routes without a socket address.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(handlers::form_page))
        .route("/predict", post(handlers::submit_form))
        .route("/api/v1/predict", post(handlers::predict))
        .route("/api/v1/features", post(handlers::features))
        .route("/api/v1/model", get(handlers::model_info))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

/// Adds the health check, state and the outer middleware to `routes`.
///
/// The health check sits outside `routes` so it bypasses whatever limits
/// were layered onto them.
pub fn into_app(routes: Router<Arc<AppState>>, state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .merge(routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
