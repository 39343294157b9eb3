//! User API endpoints: registration, roster, lookup, profile edits.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::models::{CreateUserRequest, UpdateUserRequest, User, UserRole};
use crate::AppState;

/// GET /api/users - Student roster, most recently registered first.
pub async fn list_students(State(state): State<AppState>) -> ApiResult<Vec<User>> {
    let users = state.repo.list_students().await?;
    success(users)
}

#[derive(Debug, Deserialize)]
pub struct ByIdNumberQuery {
    #[serde(default)]
    pub id: Option<String>,
}

/// GET /api/users/by-id-number?id= - Resolve a student for the invite form.
pub async fn get_student_by_id_number(
    State(state): State<AppState>,
    Query(query): Query<ByIdNumberQuery>,
) -> ApiResult<User> {
    let id_number = query.id.as_deref().map(str::trim).unwrap_or("");
    if id_number.is_empty() {
        return Err(AppError::Validation("ID number is required".to_string()));
    }

    match state.repo.find_student_by_id_number(id_number).await? {
        Some(user) => success(user),
        None => Err(AppError::NotFound(
            "No student found with that ID number".to_string(),
        )),
    }
}

/// POST /api/users - Student self-registration.
pub async fn create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<User> {
    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.is_empty()
    {
        return Err(AppError::Validation(
            "Name, email, and password are required".to_string(),
        ));
    }

    let user = state.repo.create_user(&request, UserRole::Student).await?;
    success(user)
}

/// PUT /api/users/:id - Update profile fields.
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> ApiResult<()> {
    if request.name.is_none()
        && request.email.is_none()
        && request.password.is_none()
        && request.id_number.is_none()
    {
        return Err(AppError::Validation("No fields to update".to_string()));
    }

    state.repo.update_user(id, &request).await?;
    success(())
}

/// DELETE /api/users/:id - Remove an account (librarian action).
pub async fn delete_user(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<()> {
    state.repo.delete_user(id).await?;
    success(())
}
