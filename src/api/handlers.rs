//! API request handlers

use super::models::{
    HealthResponse, ModelsResponse, PredictRequest, RegisterQuery, SubmissionForm,
};
use super::routes::AppState;
use crate::error::ApiError;
use crate::service::{Prediction, Submission};
use axum::{
    Form, Json,
    extract::{
        Query, State,
        rejection::{FormRejection, JsonRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// GET /health - Service health check
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            models: state.service.model_ids().len(),
            timestamp: chrono::Utc::now(),
        }),
    )
}

/// GET /metrics - Prometheus metrics
pub async fn metrics(State(state): State<AppState>) -> String {
    state.prometheus_handle.render()
}

/// GET /api/pickleregister - Full register, or one entry with `?id=`
pub async fn get_register(
    State(state): State<AppState>,
    Query(params): Query<RegisterQuery>,
) -> Result<Response, ApiError> {
    // An empty id is the same as no id
    let id = params.id.as_deref().filter(|id| !id.is_empty());

    crate::metrics::record_register_request(id.is_some());

    let listing = state.service.register_listing(id)?;

    Ok((StatusCode::CREATED, Json(listing)).into_response())
}

/// POST /api/predict - Classify a text with a registered pipeline
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Prediction>), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let prediction = state.service.predict(&req.id, &req.text)?;

    Ok((StatusCode::CREATED, Json(prediction)))
}

/// GET /diy - Models selectable in the form
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        pickles: state.service.model_ids(),
    })
}

/// POST /diy/submission - Classify a form submission
pub async fn submit_form(
    State(state): State<AppState>,
    form: Result<Form<SubmissionForm>, FormRejection>,
) -> Result<Json<Submission>, ApiError> {
    let Form(form) = form.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let submission = state
        .service
        .render_submission(&form.pickles, &form.article_text)?;

    Ok(Json(submission))
}
