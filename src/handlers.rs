use crate::config::Config;
use crate::errors::AppError;
use crate::models::{CustomerForm, FeatureRecord, ModelInfo, PredictionResponse};
use crate::prediction::{build_features, predict_churn};
use crate::scorer::ChurnScorer;
use crate::ui::{render_page, Outcome};
use axum::{
    extract::{rejection::FormRejection, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form, Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// The loaded churn model. Initialized once before the server starts and
    /// never mutated afterwards.
    pub scorer: Arc<dyn ChurnScorer>,
}

impl AppState {
    pub fn new(config: Config, scorer: Arc<dyn ChurnScorer>) -> Self {
        Self { config, scorer }
    }
}

/// Health check endpoint.
///
/// Returns the service status, version and the loaded model.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up"))
)]
pub async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "telco-churn-api",
            "version": env!("CARGO_PKG_VERSION"),
            "model": state.scorer.info().label(),
        })),
    )
}

/// GET /api/v1/model
///
/// Describes the loaded model artifact.
#[utoipa::path(
    get,
    path = "/api/v1/model",
    responses((status = 200, body = ModelInfo))
)]
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfo> {
    Json(state.scorer.info().clone())
}

/// POST /api/v1/predict
///
/// Scores one customer and returns the churn probability and risk label.
#[utoipa::path(
    post,
    path = "/api/v1/predict",
    request_body = CustomerForm,
    responses(
        (status = 200, body = PredictionResponse),
        (status = 400, description = "Input outside the form bounds", body = crate::errors::ErrorResponse),
        (status = 422, description = "Record does not match the model schema", body = crate::errors::ErrorResponse)
    )
)]
pub async fn predict(
    State(state): State<Arc<AppState>>,
    Json(form): Json<CustomerForm>,
) -> Result<Json<PredictionResponse>, AppError> {
    tracing::info!("POST /api/v1/predict");

    let response = predict_churn(state.scorer.as_ref(), &form)?;
    Ok(Json(response))
}

/// POST /api/v1/features
///
/// Returns the derived feature record without scoring it.
#[utoipa::path(
    post,
    path = "/api/v1/features",
    request_body = CustomerForm,
    responses(
        (status = 200, body = FeatureRecord),
        (status = 400, description = "Input outside the form bounds", body = crate::errors::ErrorResponse)
    )
)]
pub async fn features(Json(form): Json<CustomerForm>) -> Result<Json<FeatureRecord>, AppError> {
    tracing::info!("POST /api/v1/features");

    let record = build_features(&form)?;
    Ok(Json(record))
}

/// GET /
///
/// Serves the empty customer form.
pub async fn form_page(State(state): State<Arc<AppState>>) -> Html<String> {
    Html(render_page(
        state.scorer.info(),
        &CustomerForm::default(),
        None,
    ))
}

/// POST /predict
///
/// Handles a form submission. Failures are rendered inline next to the
/// submitted answers; the process keeps serving.
pub async fn submit_form(
    State(state): State<Arc<AppState>>,
    form: Result<Form<CustomerForm>, FormRejection>,
) -> Response {
    tracing::info!("POST /predict");

    let info = state.scorer.info();
    let form = match form {
        Ok(Form(form)) => form,
        Err(rejection) => {
            let message = rejection.body_text();
            tracing::debug!("Rejected form body: {}", message);
            let page = render_page(info, &CustomerForm::default(), Some(Outcome::Error(&message)));
            return (rejection.status(), Html(page)).into_response();
        }
    };

    match predict_churn(state.scorer.as_ref(), &form) {
        Ok(result) => Html(render_page(info, &form, Some(Outcome::Prediction(&result))))
            .into_response(),
        Err(e) => {
            e.log();
            let message = e.public_message();
            (
                e.status(),
                Html(render_page(info, &form, Some(Outcome::Error(&message)))),
            )
                .into_response()
        }
    }
}
