use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A candidate offered to a requester for manual team building
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedCandidate {
    pub user_id: Uuid,
    pub name: String,
    pub score: f64,
}

/// User-facing notification payloads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Notification {
    /// The optimizer was not confident enough to form a team automatically
    ManualTeamSuggestion {
        hackathon_id: Uuid,
        best_score: f64,
        candidates: Vec<SuggestedCandidate>,
    },
    /// A team was formed and the recipient is invited to join it
    TeamInvitation {
        team_id: Uuid,
        team_name: String,
        hackathon_id: Uuid,
        invited_by: Uuid,
    },
}

impl Notification {
    /// Short machine-readable name of the notification kind
    pub fn kind(&self) -> &'static str {
        match self {
            Notification::ManualTeamSuggestion { .. } => "manual_team_suggestion",
            Notification::TeamInvitation { .. } => "team_invitation",
        }
    }
}
