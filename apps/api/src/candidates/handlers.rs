use axum::{
    extract::{FromRequest, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::RequireAuth;
use crate::candidates::filter::{filter_candidates, CandidateQuery, StatusCounts};
use crate::candidates::validation::{
    validate_candidate, validate_status, CandidateInput, StatusInput,
};
use crate::errors::AppError;
use crate::models::candidate::Candidate;
use crate::state::AppState;

/// `Json` whose rejections use the application error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Ids that are not UUIDs cannot name a record.
fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::candidate_not_found())
}

/// GET /api/candidates
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Query(query): Query<CandidateQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    let candidates = state.store.list().await?;
    if query.is_empty() {
        return Ok(Json(candidates));
    }
    Ok(Json(
        filter_candidates(&candidates, &query).cloned().collect(),
    ))
}

/// GET /api/candidates/stats
pub async fn handle_candidate_stats(
    State(state): State<AppState>,
) -> Result<Json<StatusCounts>, AppError> {
    let candidates = state.store.list().await?;
    Ok(Json(StatusCounts::tally(&candidates)))
}

/// GET /api/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Candidate>, AppError> {
    let candidate = state.store.get(parse_id(&id)?).await?;
    Ok(Json(candidate))
}

/// POST /api/candidates
pub async fn handle_create_candidate(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    ApiJson(input): ApiJson<CandidateInput>,
) -> Result<(StatusCode, Json<Candidate>), AppError> {
    let draft = validate_candidate(input)?;
    let candidate = state.store.create(draft).await?;
    info!(
        "{} created candidate {} ({})",
        principal.subject,
        candidate.id,
        candidate.full_name()
    );
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// PUT /api/candidates/:id
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<CandidateInput>,
) -> Result<Json<Candidate>, AppError> {
    let draft = validate_candidate(input)?;
    let candidate = state.store.update(parse_id(&id)?, draft).await?;
    info!("{} updated candidate {}", principal.subject, candidate.id);
    Ok(Json(candidate))
}

/// PATCH /api/candidates/:id/status
pub async fn handle_set_status(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<StatusInput>,
) -> Result<Json<Candidate>, AppError> {
    let status = validate_status(&input)?;
    let candidate = state.store.set_status(parse_id(&id)?, status).await?;
    info!(
        "{} moved candidate {} to {}",
        principal.subject, candidate.id, candidate.status
    );
    Ok(Json(candidate))
}

/// DELETE /api/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    RequireAuth(principal): RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = parse_id(&id)?;
    state.store.delete(id).await?;
    info!("{} deleted candidate {id}", principal.subject);
    Ok(Json(DeleteResponse {
        message: "Candidate deleted successfully".to_string(),
    }))
}
