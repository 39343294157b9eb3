//! Thesis API endpoints: submission, listings, decisions, flags, deletion.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{
    AwardeeRequest, CollegeStat, CreateThesisRequest, DecisionRequest, SubmissionOutcome, Thesis,
    ThesisFilter,
};
use crate::AppState;

/// POST /api/theses - Submit a thesis for review.
pub async fn submit_thesis(
    State(state): State<AppState>,
    Json(request): Json<CreateThesisRequest>,
) -> ApiResult<SubmissionOutcome> {
    // Validate required fields
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("Title is required".to_string()));
    }
    if request.author.trim().is_empty() {
        return Err(AppError::Validation("Author is required".to_string()));
    }
    if request.college.trim().is_empty() {
        return Err(AppError::Validation("College is required".to_string()));
    }
    if request.summary.trim().is_empty() {
        return Err(AppError::Validation("Summary is required".to_string()));
    }
    if request.year <= 0 {
        return Err(AppError::Validation("Year is required".to_string()));
    }

    let outcome = state.workflow.submit(&request).await?;
    success(outcome)
}

/// GET /api/theses - List theses with optional filters.
pub async fn list_theses(
    State(state): State<AppState>,
    Query(filter): Query<ThesisFilter>,
) -> ApiResult<Vec<Thesis>> {
    let theses = state.queries.list(&filter).await?;
    success(theses)
}

/// GET /api/theses/featured - The featured approved thesis, or null.
pub async fn get_featured(State(state): State<AppState>) -> ApiResult<Option<Thesis>> {
    let thesis = state.queries.featured().await?;
    success(thesis)
}

/// GET /api/theses/:id - Get a single thesis.
pub async fn get_thesis(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Thesis> {
    match state.queries.get(id).await? {
        Some(thesis) => success(thesis),
        None => Err(AppError::NotFound(format!("Thesis {} not found", id))),
    }
}

/// PUT /api/theses/:id/decision - Approve or reject a submission.
pub async fn decide_thesis(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<DecisionRequest>,
) -> ApiResult<()> {
    state.workflow.decide(id, &request).await?;
    success(())
}

/// PUT /api/theses/:id/awardee - Flip the awardee flag.
pub async fn set_awardee(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<AwardeeRequest>,
) -> ApiResult<()> {
    state.workflow.set_awardee(id, request.awardee).await?;
    success(())
}

/// PUT /api/theses/:id/featured - Make this the single featured thesis.
pub async fn set_featured(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.workflow.set_featured(id).await?;
    success(())
}

/// DELETE /api/theses/:id - Delete a submission and its stored files.
pub async fn delete_thesis(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    let warnings = state.workflow.delete(id).await?;
    for warning in &warnings {
        tracing::warn!(thesis_id = id, "{}", warning);
    }
    success(())
}

/// GET /api/college-stats - Approved thesis counts per college.
pub async fn college_stats(State(state): State<AppState>) -> ApiResult<Vec<CollegeStat>> {
    let stats = state.queries.college_stats().await?;
    success(stats)
}

/// GET /api/my-submissions/:user_id - Authored and accepted-collaboration theses.
pub async fn my_submissions(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> ApiResult<Vec<Thesis>> {
    let theses = state.queries.my_submissions(user_id).await?;
    success(theses)
}
