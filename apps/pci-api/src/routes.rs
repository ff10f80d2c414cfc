use axum::{
	Json, Router,
	extract::{Path, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::{Deserialize, Serialize};

use pci_domain::{
	dashboard::Dashboard,
	note::SearchResult,
	patient::{PatientId, PatientProfile},
};
use pci_service::{
	EntityExtraction, Error, ExtractEntitiesRequest, SearchNotesRequest, SearchNotesResponse,
	SimilarPatientsRequest, SimilarPatientsResponse,
};

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
	pub query: String,
	#[serde(default)]
	pub results: Vec<SearchResult>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
	pub summary: String,
}

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/notes/search", post(search_notes))
		.route("/v1/notes/summary", post(summarize))
		.route("/v1/patients/similar", post(similar_patients))
		.route("/v1/patients/{patient_id}", get(patient_details))
		.route("/v1/analytics/dashboard", get(dashboard))
		.route("/v1/entities/extract", post(extract_entities))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search_notes(
	State(state): State<AppState>,
	Json(payload): Json<SearchNotesRequest>,
) -> Result<Json<SearchNotesResponse>, ApiError> {
	let response = state.service.search_notes(payload).await?;

	Ok(Json(response))
}

async fn summarize(
	State(state): State<AppState>,
	Json(payload): Json<SummaryRequest>,
) -> Json<SummaryResponse> {
	let summary = state.service.summarize(&payload.query, &payload.results).await;

	Json(SummaryResponse { summary })
}

async fn similar_patients(
	State(state): State<AppState>,
	Json(payload): Json<SimilarPatientsRequest>,
) -> Result<Json<SimilarPatientsResponse>, ApiError> {
	let response = state.service.similar_patients(payload).await?;

	Ok(Json(response))
}

async fn patient_details(
	State(state): State<AppState>,
	Path(patient_id): Path<i64>,
) -> Result<Json<PatientProfile>, ApiError> {
	let profile = state.service.patient_details(PatientId(patient_id)).await?.ok_or_else(|| {
		ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Patient not found")
	})?;

	Ok(Json(profile))
}

async fn dashboard(State(state): State<AppState>) -> Result<Json<Dashboard>, ApiError> {
	let response = state.service.dashboard().await?;

	Ok(Json(response))
}

async fn extract_entities(
	State(state): State<AppState>,
	Json(payload): Json<ExtractEntitiesRequest>,
) -> Result<Json<EntityExtraction>, ApiError> {
	let response = state.service.extract_entities(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}
impl ApiError {
	fn new(status: StatusCode, error_code: impl Into<String>, message: impl Into<String>) -> Self {
		Self { status, error_code: error_code.into(), message: message.into() }
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { message } =>
				Self::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", message),
			Error::Provider { message } | Error::InvalidResponse { message } => {
				tracing::error!(error = %message, "Upstream call failed.");

				Self::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message)
			},
		}
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };

		(self.status, Json(body)).into_response()
	}
}
