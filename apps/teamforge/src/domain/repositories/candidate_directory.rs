use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::team::TeamSnapshot;
use crate::domain::user::{Candidate, SkillProfile};

/// Limits and filters applied to a candidate lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilters {
    /// Maximum number of candidates returned
    pub limit: usize,
    /// Restrict the lookup to these users when present
    pub target_users: Option<Vec<Uuid>>,
}

impl Default for CandidateFilters {
    fn default() -> Self {
        Self {
            limit: 50,
            target_users: None,
        }
    }
}

/// Stored profile together with the user's display name
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfileRecord {
    pub name: String,
    pub profile: SkillProfile,
}

/// Directory of participants and open teams
///
/// Implementations merge structured and document-style profile data and
/// enforce their own timeout and retry policy.
#[async_trait]
pub trait CandidateDirectory: Send + Sync {
    /// Participants available for matching, never including `exclude_user_id`
    async fn fetch_candidates(
        &self,
        exclude_user_id: Uuid,
        hackathon_id: Option<Uuid>,
        filters: &CandidateFilters,
    ) -> Result<Vec<Candidate>, String>;

    /// Find a user's merged profile
    async fn fetch_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfileRecord>, String>;

    /// Save (insert or replace) a user's profile
    async fn save_user_profile(&self, profile: &SkillProfile) -> Result<(), String>;

    /// Teams of a hackathon that still accept members
    async fn fetch_open_teams(
        &self,
        hackathon_id: Option<Uuid>,
        exclude_team_ids: &[Uuid],
    ) -> Result<Vec<TeamSnapshot>, String>;
}
