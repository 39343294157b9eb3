//! Thesis model, review status, and listing filter.

use serde::{Deserialize, Serialize};

/// Review status of a submitted thesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThesisStatus {
    Pending,
    Approved,
    Rejected,
}

impl ThesisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThesisStatus::Pending => "pending",
            ThesisStatus::Approved => "approved",
            ThesisStatus::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ThesisStatus::Pending),
            "approved" => Some(ThesisStatus::Approved),
            "rejected" => Some(ThesisStatus::Rejected),
            _ => None,
        }
    }
}

/// An intended co-author as stored on the thesis itself. Denormalized;
/// the authoritative invitation state lives in collaboration requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collaborator {
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub name: String,
}

/// A collaborator descriptor supplied at submission time. `user_id` is an
/// optional pre-resolved account id; otherwise resolution goes through
/// `id_number` lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct CollaboratorDescriptor {
    #[serde(default)]
    pub id_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: Option<i64>,
}

/// A submitted academic work record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thesis {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub college: String,
    pub summary: String,
    pub cover_image_url: String,
    pub pdf_url: String,
    pub awardee: bool,
    pub featured: bool,
    pub status: ThesisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted_by: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approval_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collaborators: Option<Vec<Collaborator>>,
    /// Count of undecided invitations; only annotated on pending listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_collaborator_count: Option<i64>,
}

/// Request body for submitting a thesis.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateThesisRequest {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub college: String,
    pub summary: String,
    #[serde(default)]
    pub cover_image_url: Option<String>,
    #[serde(default)]
    pub pdf_url: Option<String>,
    pub submitted_by: i64,
    #[serde(default)]
    pub collaborators: Option<Vec<CollaboratorDescriptor>>,
}

/// Request body for a librarian decision on a pending thesis.
#[derive(Debug, Clone, Deserialize)]
pub struct DecisionRequest {
    pub status: ThesisStatus,
    #[serde(default)]
    pub approval_date: Option<String>,
}

/// Request body for flipping the awardee flag.
#[derive(Debug, Clone, Deserialize)]
pub struct AwardeeRequest {
    pub awardee: bool,
}

/// Typed listing filter; each field is an independent conjunct except
/// `search`, which is an OR-match across title, author, and summary.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThesisFilter {
    #[serde(default)]
    pub status: Option<ThesisStatus>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub awardee: Option<bool>,
    #[serde(default)]
    pub search: Option<String>,
}

/// Per-college count of approved theses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollegeStat {
    pub college: String,
    pub count: i64,
}

/// Primary outcome of a submission plus non-fatal warnings from the
/// collaborator-invitation fan-out.
#[derive(Debug, Clone, Serialize)]
pub struct SubmissionOutcome {
    pub id: i64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for s in ["pending", "approved", "rejected"] {
            assert_eq!(ThesisStatus::from_str(s).unwrap().as_str(), s);
        }
        assert!(ThesisStatus::from_str("archived").is_none());
    }

    #[test]
    fn test_status_serde_lowercase() {
        let json = serde_json::to_string(&ThesisStatus::Approved).unwrap();
        assert_eq!(json, "\"approved\"");
        let back: ThesisStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, ThesisStatus::Pending);
    }
}
