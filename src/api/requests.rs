//! Collaboration request API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{PendingRequestView, RespondRequest};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PendingRequestsQuery {
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// GET /api/collaboration-requests?user_id= - Pending invitations for a user.
pub async fn list_pending_requests(
    State(state): State<AppState>,
    Query(query): Query<PendingRequestsQuery>,
) -> ApiResult<Vec<PendingRequestView>> {
    let user_id = query
        .user_id
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;

    let views = state.queries.pending_requests(user_id).await?;
    success(views)
}

/// PUT /api/collaboration-requests/:id - Accept or decline an invitation.
pub async fn respond_to_request(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<RespondRequest>,
) -> ApiResult<()> {
    state.workflow.respond(id, &request).await?;
    success(())
}
