//! Database repository for CRUD operations.
//!
//! The repository executes filtered queries and row mutations only; all
//! workflow rules live in the workflow and query services.

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};

use crate::errors::AppError;
use crate::models::{
    CollaborationRequest, Collaborator, CollegeStat, CreateThesisRequest, CreateUserRequest,
    RequestStatus, Thesis, ThesisFilter, ThesisStatus, UpdateUserRequest, User, UserRole,
};

const THESIS_COLUMNS: &str = "id, title, author, year, college, summary, cover_image_url, \
     pdf_url, awardee, featured, status, submitted_by, approval_date, collaborators";

const REQUEST_COLUMNS: &str =
    "id, thesis_id, requester_user_id, collaborator_user_id, status, created_at";

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ==================== USER OPERATIONS ====================

    /// Create a user with the given role. The credential is stored opaquely.
    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
        role: UserRole,
    ) -> Result<User, AppError> {
        let id_number = request
            .id_number
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        let result = sqlx::query(
            "INSERT INTO users (name, email, password, role, id_number) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&request.name)
        .bind(&request.email)
        .bind(&request.password)
        .bind(role.as_str())
        .bind(&id_number)
        .execute(&self.pool)
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: request.name.clone(),
            email: request.email.clone(),
            role,
            id_number,
        })
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let row = sqlx::query("SELECT id, name, email, role, id_number FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// List all student accounts, most recently created first.
    pub async fn list_students(&self) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query(
            "SELECT id, name, email, role, id_number FROM users WHERE role = 'student' ORDER BY id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(user_from_row).collect())
    }

    /// Look up a student by exact id_number match.
    pub async fn find_student_by_id_number(
        &self,
        id_number: &str,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query(
            "SELECT id, name, email, role, id_number FROM users WHERE role = 'student' AND id_number = ?",
        )
        .bind(id_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    /// Update a user's profile fields. Absent fields are left unchanged; an
    /// empty id_number clears the field, an empty password is ignored.
    pub async fn update_user(&self, id: i64, request: &UpdateUserRequest) -> Result<(), AppError> {
        let existing = self
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", id)))?;

        let name = request.name.as_ref().unwrap_or(&existing.name);
        let email = request.email.as_ref().unwrap_or(&existing.email);
        let id_number = match &request.id_number {
            Some(v) => {
                let trimmed = v.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            None => existing.id_number.clone(),
        };

        sqlx::query("UPDATE users SET name = ?, email = ?, id_number = ? WHERE id = ?")
            .bind(name)
            .bind(email)
            .bind(&id_number)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if let Some(password) = request.password.as_deref().filter(|p| !p.is_empty()) {
            sqlx::query("UPDATE users SET password = ? WHERE id = ?")
                .bind(password)
                .bind(id)
                .execute(&self.pool)
                .await?;
        }

        Ok(())
    }

    /// Delete a user.
    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User {} not found", id)));
        }

        Ok(())
    }

    // ==================== THESIS OPERATIONS ====================

    /// Insert a thesis in pending state; only id_number/name of each
    /// collaborator descriptor is persisted on the row.
    pub async fn insert_thesis(&self, request: &CreateThesisRequest) -> Result<i64, AppError> {
        let collaborators_json = request.collaborators.as_ref().and_then(|list| {
            if list.is_empty() {
                return None;
            }
            let embedded: Vec<Collaborator> = list
                .iter()
                .map(|c| Collaborator {
                    id_number: c.id_number.clone(),
                    name: c.name.clone(),
                })
                .collect();
            serde_json::to_string(&embedded).ok()
        });

        let result = sqlx::query(
            r#"INSERT INTO theses (
                title, author, year, college, summary, cover_image_url, pdf_url,
                awardee, featured, status, submitted_by, collaborators
            ) VALUES (?, ?, ?, ?, ?, ?, ?, 0, 0, 'pending', ?, ?)"#,
        )
        .bind(&request.title)
        .bind(&request.author)
        .bind(request.year)
        .bind(&request.college)
        .bind(&request.summary)
        .bind(request.cover_image_url.as_deref().unwrap_or(""))
        .bind(request.pdf_url.as_deref().unwrap_or(""))
        .bind(request.submitted_by)
        .bind(&collaborators_json)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a thesis by ID.
    pub async fn get_thesis(&self, id: i64) -> Result<Option<Thesis>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM theses WHERE id = ?",
            THESIS_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(thesis_from_row))
    }

    /// List theses matching the filter, ordered by year then id descending.
    pub async fn list_theses(&self, filter: &ThesisFilter) -> Result<Vec<Thesis>, AppError> {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM theses WHERE 1=1",
            THESIS_COLUMNS
        ));

        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status.as_str());
        }
        if let Some(college) = &filter.college {
            qb.push(" AND college = ").push_bind(college);
        }
        if let Some(year) = filter.year {
            qb.push(" AND year = ").push_bind(year);
        }
        if filter.awardee == Some(true) {
            qb.push(" AND awardee = 1");
        }
        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim().to_lowercase());
            qb.push(" AND (lower(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(author) LIKE ")
                .push_bind(pattern.clone())
                .push(" OR lower(summary) LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        qb.push(" ORDER BY year DESC, id DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(thesis_from_row).collect())
    }

    /// Fetch theses by id set.
    pub async fn theses_by_ids(&self, ids: &[i64]) -> Result<Vec<Thesis>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(format!(
            "SELECT {} FROM theses WHERE id IN (",
            THESIS_COLUMNS
        ));
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(thesis_from_row).collect())
    }

    /// List theses authored by a user, most recent first.
    pub async fn list_theses_by_submitter(&self, user_id: i64) -> Result<Vec<Thesis>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM theses WHERE submitted_by = ? ORDER BY id DESC",
            THESIS_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(thesis_from_row).collect())
    }

    /// The featured approved thesis, highest id wins.
    pub async fn featured_thesis(&self) -> Result<Option<Thesis>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM theses WHERE featured = 1 AND status = 'approved' ORDER BY id DESC LIMIT 1",
            THESIS_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(thesis_from_row))
    }

    /// Count of approved theses per college; colleges without approved
    /// theses are omitted.
    pub async fn college_stats(&self) -> Result<Vec<CollegeStat>, AppError> {
        let rows = sqlx::query(
            "SELECT college, COUNT(*) AS count FROM theses WHERE status = 'approved' GROUP BY college",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| CollegeStat {
                college: row.get("college"),
                count: row.get("count"),
            })
            .collect())
    }

    /// Write a new review status, keeping the existing approval date when
    /// none is supplied.
    pub async fn update_thesis_status(
        &self,
        id: i64,
        status: ThesisStatus,
        approval_date: Option<&str>,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE theses SET status = ?, approval_date = COALESCE(?, approval_date) WHERE id = ?",
        )
        .bind(status.as_str())
        .bind(approval_date)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Thesis {} not found", id)));
        }

        Ok(())
    }

    /// Flip the awardee flag.
    pub async fn set_awardee(&self, id: i64, awardee: bool) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE theses SET awardee = ? WHERE id = ?")
            .bind(awardee as i32)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Thesis {} not found", id)));
        }

        Ok(())
    }

    /// Make the target the only featured thesis. Clear-then-set runs inside
    /// one transaction so a concurrent call cannot leave zero or two featured.
    pub async fn feature_exclusively(&self, id: i64) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE theses SET featured = 0 WHERE id != ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("UPDATE theses SET featured = 1 WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Thesis {} not found", id)));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Replace the embedded collaborator list.
    pub async fn set_collaborators(
        &self,
        thesis_id: i64,
        collaborators: &[Collaborator],
    ) -> Result<(), AppError> {
        let json = serde_json::to_string(collaborators)
            .map_err(|e| AppError::Internal(format!("Failed to encode collaborators: {}", e)))?;

        let result = sqlx::query("UPDATE theses SET collaborators = ? WHERE id = ?")
            .bind(&json)
            .bind(thesis_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Thesis {} not found",
                thesis_id
            )));
        }

        Ok(())
    }

    /// Delete a thesis row. Collaboration requests go away via cascade.
    pub async fn delete_thesis(&self, id: i64) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM theses WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Thesis {} not found", id)));
        }

        Ok(())
    }

    // ==================== COLLABORATION REQUEST OPERATIONS ====================

    /// Insert a pending invitation.
    pub async fn insert_request(
        &self,
        thesis_id: i64,
        requester_user_id: i64,
        collaborator_user_id: i64,
    ) -> Result<i64, AppError> {
        let now = Utc::now().to_rfc3339();

        let result = sqlx::query(
            r#"INSERT INTO collaboration_requests
                (thesis_id, requester_user_id, collaborator_user_id, status, created_at)
               VALUES (?, ?, ?, 'pending', ?)"#,
        )
        .bind(thesis_id)
        .bind(requester_user_id)
        .bind(collaborator_user_id)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    /// Get a collaboration request by ID.
    pub async fn get_request(&self, id: i64) -> Result<Option<CollaborationRequest>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM collaboration_requests WHERE id = ?",
            REQUEST_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(request_from_row))
    }

    /// Record the collaborator's decision.
    pub async fn set_request_status(
        &self,
        id: i64,
        status: RequestStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE collaboration_requests SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Collaboration request {} not found",
                id
            )));
        }

        Ok(())
    }

    /// Count undecided invitations on one thesis.
    pub async fn count_pending_for_thesis(&self, thesis_id: i64) -> Result<i64, AppError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM collaboration_requests WHERE thesis_id = ? AND status = 'pending'",
        )
        .bind(thesis_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("count"))
    }

    /// Undecided-invitation counts grouped by thesis id.
    pub async fn pending_counts(&self, thesis_ids: &[i64]) -> Result<HashMap<i64, i64>, AppError> {
        if thesis_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT thesis_id, COUNT(*) AS count FROM collaboration_requests \
             WHERE status = 'pending' AND thesis_id IN (",
        );
        let mut separated = qb.separated(", ");
        for id in thesis_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") GROUP BY thesis_id");

        let rows = qb.build().fetch_all(&self.pool).await?;
        Ok(rows
            .into_iter()
            .map(|row| (row.get("thesis_id"), row.get("count")))
            .collect())
    }

    /// Pending invitations addressed to a collaborator, newest first.
    pub async fn pending_requests_for_collaborator(
        &self,
        user_id: i64,
    ) -> Result<Vec<CollaborationRequest>, AppError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM collaboration_requests \
             WHERE collaborator_user_id = ? AND status = 'pending' \
             ORDER BY created_at DESC, id DESC",
            REQUEST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(request_from_row).collect())
    }

    /// Ids of theses where the user accepted a collaboration.
    pub async fn accepted_thesis_ids(&self, user_id: i64) -> Result<Vec<i64>, AppError> {
        let rows = sqlx::query(
            "SELECT thesis_id FROM collaboration_requests \
             WHERE collaborator_user_id = ? AND status = 'accepted'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| row.get("thesis_id")).collect())
    }
}

// Helper functions for row conversion

fn user_from_row(row: &sqlx::sqlite::SqliteRow) -> User {
    let role: String = row.get("role");
    User {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        role: UserRole::from_str(&role).unwrap_or(UserRole::Student),
        id_number: row.get("id_number"),
    }
}

fn thesis_from_row(row: &sqlx::sqlite::SqliteRow) -> Thesis {
    let awardee: i32 = row.get("awardee");
    let featured: i32 = row.get("featured");
    let status: String = row.get("status");
    let collaborators_str: Option<String> = row.get("collaborators");

    Thesis {
        id: row.get("id"),
        title: row.get("title"),
        author: row.get("author"),
        year: row.get("year"),
        college: row.get("college"),
        summary: row.get("summary"),
        cover_image_url: row.get("cover_image_url"),
        pdf_url: row.get("pdf_url"),
        awardee: awardee != 0,
        featured: featured != 0,
        status: ThesisStatus::from_str(&status).unwrap_or(ThesisStatus::Pending),
        submitted_by: row.get("submitted_by"),
        approval_date: row.get("approval_date"),
        collaborators: collaborators_str.and_then(|s| serde_json::from_str(&s).ok()),
        pending_collaborator_count: None,
    }
}

fn request_from_row(row: &sqlx::sqlite::SqliteRow) -> CollaborationRequest {
    let status: String = row.get("status");
    CollaborationRequest {
        id: row.get("id"),
        thesis_id: row.get("thesis_id"),
        requester_user_id: row.get("requester_user_id"),
        collaborator_user_id: row.get("collaborator_user_id"),
        status: RequestStatus::from_str(&status).unwrap_or(RequestStatus::Pending),
        created_at: row.get("created_at"),
    }
}
