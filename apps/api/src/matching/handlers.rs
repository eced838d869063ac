//! Axum route handlers for on-demand matching.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::matching::runner::{BatchReport, TargetMatch};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SubjectMatchesResponse {
    pub matches: Vec<TargetMatch>,
    pub count: usize,
}

/// GET /api/v1/subjects/:id/matches
///
/// Scores the subject's resume against every posting (cached where possible)
/// and returns the passing ones, best first.
pub async fn handle_subject_matches(
    State(state): State<AppState>,
    Path(subject_id): Path<Uuid>,
) -> Result<Json<SubjectMatchesResponse>, AppError> {
    let matches = state.runner.find_matches_for_subject(subject_id).await?;
    Ok(Json(SubjectMatchesResponse {
        count: matches.len(),
        matches,
    }))
}

/// POST /api/v1/matches/run
///
/// Runs the full cross-product immediately, outside the weekly schedule.
pub async fn handle_run_all(State(state): State<AppState>) -> Result<Json<BatchReport>, AppError> {
    let report = state.runner.run_all().await?;
    Ok(Json(report))
}
