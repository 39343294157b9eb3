//! Submission workflow engine.
//!
//! Owns every state transition of theses and collaboration requests and
//! keeps the embedded collaborator list consistent with the request rows.
//! Primary mutations fail loudly; secondary fan-out and cleanup steps are
//! best-effort and logged.

use std::sync::Arc;

use chrono::Utc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    Collaborator, CreateThesisRequest, DecisionRequest, RequestStatus, RespondRequest,
    SubmissionOutcome, ThesisStatus,
};
use crate::storage::{object_path, FsBlobStore};

/// Workflow engine over the persistence gateway and the blob store.
#[derive(Clone)]
pub struct Workflow {
    repo: Arc<Repository>,
    blobs: Arc<FsBlobStore>,
}

impl Workflow {
    pub fn new(repo: Arc<Repository>, blobs: Arc<FsBlobStore>) -> Self {
        Self { repo, blobs }
    }

    /// Create a pending submission and fan out one invitation per resolvable
    /// collaborator. The thesis insert is the primary outcome; invitation
    /// inserts are best-effort and collected as warnings.
    pub async fn submit(
        &self,
        request: &CreateThesisRequest,
    ) -> Result<SubmissionOutcome, AppError> {
        let thesis_id = self.repo.insert_thesis(request).await?;

        let mut warnings = Vec::new();
        for descriptor in request.collaborators.iter().flatten() {
            let collaborator_id = match descriptor.user_id {
                Some(id) => Some(id),
                None => {
                    let id_number = descriptor.id_number.trim();
                    if id_number.is_empty() {
                        None
                    } else {
                        self.repo
                            .find_student_by_id_number(id_number)
                            .await?
                            .map(|u| u.id)
                    }
                }
            };

            let Some(collaborator_id) = collaborator_id else {
                tracing::debug!(
                    thesis_id,
                    id_number = %descriptor.id_number,
                    "Skipping unresolvable collaborator"
                );
                continue;
            };

            // No self-invitation
            if collaborator_id == request.submitted_by {
                continue;
            }

            if let Err(e) = self
                .repo
                .insert_request(thesis_id, request.submitted_by, collaborator_id)
                .await
            {
                tracing::warn!(
                    thesis_id,
                    collaborator_id,
                    "Failed to create collaboration request: {}",
                    e
                );
                warnings.push(format!(
                    "Failed to invite collaborator {}: {}",
                    descriptor.name, e
                ));
            }
        }

        Ok(SubmissionOutcome {
            id: thesis_id,
            warnings,
        })
    }

    /// Approve or reject a pending submission. Blocked while any
    /// collaboration request on a thesis with embedded collaborators is
    /// still undecided.
    pub async fn decide(&self, id: i64, decision: &DecisionRequest) -> Result<(), AppError> {
        if decision.status == ThesisStatus::Pending {
            return Err(AppError::Validation(
                "Decision status must be approved or rejected".to_string(),
            ));
        }

        let thesis = self
            .repo
            .get_thesis(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Thesis {} not found", id)))?;

        // Consent gate. The count read and the status write below are not
        // guarded by a lock; a request created or resolved in between can
        // slip past the gate.
        let has_collaborators = thesis
            .collaborators
            .as_ref()
            .is_some_and(|c| !c.is_empty());
        if has_collaborators {
            let pending = self.repo.count_pending_for_thesis(id).await?;
            if pending > 0 {
                return Err(AppError::ConsentIncomplete {
                    message: "All collaborators must accept or decline their requests \
                              before this submission can be approved or rejected."
                        .to_string(),
                    pending_count: pending,
                });
            }
        }

        let approval_date = match &decision.approval_date {
            Some(date) => Some(date.clone()),
            None if decision.status == ThesisStatus::Approved => Some(Utc::now().to_rfc3339()),
            None => None,
        };

        self.repo
            .update_thesis_status(id, decision.status, approval_date.as_deref())
            .await
    }

    /// Unconditional awardee flag flip, independent of review status.
    pub async fn set_awardee(&self, id: i64, awardee: bool) -> Result<(), AppError> {
        self.repo.set_awardee(id, awardee).await
    }

    /// Make the target the single featured thesis. Permitted regardless of
    /// review status; the featured listing only ever serves approved work.
    pub async fn set_featured(&self, id: i64) -> Result<(), AppError> {
        self.repo.feature_exclusively(id).await
    }

    /// Record the invited collaborator's decision. On decline, additionally
    /// remove the matching entry from the thesis's embedded collaborator
    /// list; a failure there is surfaced even though the status write has
    /// already committed.
    pub async fn respond(
        &self,
        request_id: i64,
        response: &RespondRequest,
    ) -> Result<(), AppError> {
        if response.status == RequestStatus::Pending {
            return Err(AppError::Validation(
                "Response status must be accepted or declined".to_string(),
            ));
        }

        let request = self.repo.get_request(request_id).await?.ok_or_else(|| {
            AppError::NotFound(format!("Collaboration request {} not found", request_id))
        })?;

        if response.user_id != request.collaborator_user_id {
            return Err(AppError::Unauthorized(
                "Only the invited collaborator may respond to this request".to_string(),
            ));
        }

        self.repo
            .set_request_status(request_id, response.status)
            .await?;

        if response.status == RequestStatus::Declined {
            if let Err(e) = self.remove_declined_collaborator(&request).await {
                tracing::error!(
                    request_id,
                    thesis_id = request.thesis_id,
                    "Failed to remove declined collaborator: {}",
                    e
                );
                return Err(e);
            }
        }

        Ok(())
    }

    async fn remove_declined_collaborator(
        &self,
        request: &crate::models::CollaborationRequest,
    ) -> Result<(), AppError> {
        let Some(user) = self.repo.get_user(request.collaborator_user_id).await? else {
            return Ok(());
        };
        let Some(thesis) = self.repo.get_thesis(request.thesis_id).await? else {
            return Ok(());
        };
        let Some(collaborators) = thesis.collaborators else {
            return Ok(());
        };

        let id_number = user.id_number.as_deref().unwrap_or("").trim().to_string();
        let name = user.name.trim().to_string();

        let filtered: Vec<Collaborator> = collaborators
            .into_iter()
            .filter(|entry| !matches_collaborator(entry, &id_number, &name))
            .collect();

        self.repo
            .set_collaborators(request.thesis_id, &filtered)
            .await
    }

    /// Delete a submission: best-effort blob cleanup, then the row (request
    /// rows cascade). Blob warnings are returned to the caller.
    pub async fn delete(&self, id: i64) -> Result<Vec<String>, AppError> {
        let thesis = self
            .repo
            .get_thesis(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Thesis {} not found", id)))?;

        let paths: Vec<String> = [&thesis.cover_image_url, &thesis.pdf_url]
            .iter()
            .filter_map(|url| object_path(url))
            .collect();

        let warnings = if paths.is_empty() {
            Vec::new()
        } else {
            self.blobs.delete(&paths).await
        };

        self.repo.delete_thesis(id).await?;
        Ok(warnings)
    }
}

/// An embedded entry matches the declining collaborator when the id_number
/// is equal (case-sensitive, trimmed) or the name is equal
/// (case-insensitive, trimmed). The OR tolerates missing id numbers.
fn matches_collaborator(entry: &Collaborator, id_number: &str, name: &str) -> bool {
    let entry_id = entry.id_number.trim();
    let entry_name = entry.name.trim();

    let id_match = !id_number.is_empty() && !entry_id.is_empty() && entry_id == id_number;
    let name_match = !name.is_empty()
        && !entry_name.is_empty()
        && entry_name.to_lowercase() == name.to_lowercase();

    id_match || name_match
}
