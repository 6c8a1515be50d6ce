use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::team::TeamRole;

/// Repository trait for hackathon teams
///
/// Defines the contract for persisting formed teams and their memberships.
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Create a team; the creator is recorded as its leader
    async fn create_team(&self, name: &str, hackathon_id: Uuid, creator_id: Uuid) -> Result<Uuid, String>;

    /// Add a user to a team with the given role
    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid, role: TeamRole) -> Result<(), String>;

    /// The team a user already belongs to for a hackathon, if any
    async fn check_existing_membership(&self, user_id: Uuid, hackathon_id: Uuid) -> Result<Option<Uuid>, String>;
}
