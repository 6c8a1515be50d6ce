use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a suggestion request asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Other participants to team up with
    Individuals,
    /// Existing teams with open seats
    Teams,
}

/// The user or team a suggestion points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum SuggestionTarget {
    User(Uuid),
    Team(Uuid),
}

/// A ranked match produced by the skill matching agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub target: SuggestionTarget,
    pub name: String,
    pub score: f64,
    /// Skills the requester and the target both have
    pub shared_skills: Vec<String>,
    /// Skills the target brings that the requester lacks
    pub complementary_skills: Vec<String>,
}

/// Request to assemble a team around the requester
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormationRequest {
    pub requester_id: Uuid,
    pub hackathon_id: Uuid,
    pub desired_team_size: usize,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    /// Restrict the search to these users when present
    #[serde(default)]
    pub target_users: Option<Vec<Uuid>>,
    #[serde(default)]
    pub auto_invite: bool,
}
