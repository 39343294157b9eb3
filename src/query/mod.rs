//! Read-side query service: listings, featured thesis, aggregates, and
//! per-user views. No state transitions happen here.

use std::collections::HashMap;
use std::sync::Arc;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{
    CollegeStat, PendingRequestView, RequesterRef, Thesis, ThesisFilter, ThesisRef, ThesisStatus,
};

/// Query service over the persistence gateway.
#[derive(Clone)]
pub struct Queries {
    repo: Arc<Repository>,
}

impl Queries {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }

    /// Filtered listing, year then id descending. Pending listings carry a
    /// pending-invitation count per thesis so reviewers see the gate state.
    pub async fn list(&self, filter: &ThesisFilter) -> Result<Vec<Thesis>, AppError> {
        let mut theses = self.repo.list_theses(filter).await?;

        if filter.status == Some(ThesisStatus::Pending) && !theses.is_empty() {
            let ids: Vec<i64> = theses.iter().map(|t| t.id).collect();
            let counts = self.repo.pending_counts(&ids).await?;
            for thesis in &mut theses {
                thesis.pending_collaborator_count =
                    Some(counts.get(&thesis.id).copied().unwrap_or(0));
            }
        }

        Ok(theses)
    }

    /// Single thesis by id.
    pub async fn get(&self, id: i64) -> Result<Option<Thesis>, AppError> {
        self.repo.get_thesis(id).await
    }

    /// The featured approved thesis, or None.
    pub async fn featured(&self) -> Result<Option<Thesis>, AppError> {
        self.repo.featured_thesis().await
    }

    /// Approved-thesis counts per college.
    pub async fn college_stats(&self) -> Result<Vec<CollegeStat>, AppError> {
        self.repo.college_stats().await
    }

    /// Theses the user authored plus theses they joined through an accepted
    /// invitation, deduplicated by id (authored entries win), id descending.
    pub async fn my_submissions(&self, user_id: i64) -> Result<Vec<Thesis>, AppError> {
        let authored = self.repo.list_theses_by_submitter(user_id).await?;
        let accepted_ids = self.repo.accepted_thesis_ids(user_id).await?;

        let mut by_id: HashMap<i64, Thesis> = HashMap::new();
        for thesis in authored {
            by_id.insert(thesis.id, thesis);
        }
        for thesis in self.repo.theses_by_ids(&accepted_ids).await? {
            by_id.entry(thesis.id).or_insert(thesis);
        }

        let mut merged: Vec<Thesis> = by_id.into_values().collect();
        merged.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(merged)
    }

    /// Pending invitations addressed to the user, enriched with thesis and
    /// requester display fields, newest first.
    pub async fn pending_requests(
        &self,
        user_id: i64,
    ) -> Result<Vec<PendingRequestView>, AppError> {
        let requests = self.repo.pending_requests_for_collaborator(user_id).await?;

        let mut views = Vec::with_capacity(requests.len());
        for request in requests {
            let thesis = self.repo.get_thesis(request.thesis_id).await?.map(|t| ThesisRef {
                id: t.id,
                title: t.title,
                author: t.author,
                year: t.year,
            });
            let requester = self
                .repo
                .get_user(request.requester_user_id)
                .await?
                .map(|u| RequesterRef {
                    id: u.id,
                    name: u.name,
                });

            views.push(PendingRequestView {
                request,
                thesis,
                requester,
            });
        }

        Ok(views)
    }
}
