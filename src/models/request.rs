//! Collaboration request model and response payloads.

use serde::{Deserialize, Serialize};

/// State of a collaborator invitation. Transitions exactly once,
/// from `pending` to `accepted` or `declined`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(RequestStatus::Pending),
            "accepted" => Some(RequestStatus::Accepted),
            "declined" => Some(RequestStatus::Declined),
            _ => None,
        }
    }
}

/// The authoritative record of one collaborator's invitation and response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollaborationRequest {
    pub id: i64,
    pub thesis_id: i64,
    pub collaborator_user_id: i64,
    pub requester_user_id: i64,
    pub status: RequestStatus,
    pub created_at: String,
}

/// Thesis fields shown alongside a pending invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThesisRef {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
}

/// Requester fields shown alongside a pending invitation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequesterRef {
    pub id: i64,
    pub name: String,
}

/// A pending invitation enriched for display in the collaborator's inbox.
#[derive(Debug, Clone, Serialize)]
pub struct PendingRequestView {
    #[serde(flatten)]
    pub request: CollaborationRequest,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thesis: Option<ThesisRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requester: Option<RequesterRef>,
}

/// Request body for responding to an invitation. `user_id` identifies the
/// acting caller and must match the invited collaborator.
#[derive(Debug, Clone, Deserialize)]
pub struct RespondRequest {
    pub status: RequestStatus,
    pub user_id: i64,
}
