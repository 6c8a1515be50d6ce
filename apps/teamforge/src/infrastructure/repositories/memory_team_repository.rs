use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::repositories::TeamRepository;
use crate::domain::team::TeamRole;

/// A persisted team and its memberships
#[derive(Debug, Clone, PartialEq)]
pub struct StoredTeam {
    pub id: Uuid,
    pub name: String,
    pub hackathon_id: Uuid,
    pub created_by: Uuid,
    pub members: Vec<(Uuid, TeamRole)>,
}

impl StoredTeam {
    pub fn has_member(&self, user_id: Uuid) -> bool {
        self.members.iter().any(|(id, _)| *id == user_id)
    }
}

/// In-memory implementation of TeamRepository
#[derive(Default)]
pub struct InMemoryTeamRepository {
    teams: RwLock<BTreeMap<Uuid, StoredTeam>>,
    unavailable: AtomicBool,
}

impl InMemoryTeamRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn team(&self, team_id: Uuid) -> Option<StoredTeam> {
        self.teams.read().await.get(&team_id).cloned()
    }

    pub async fn team_count(&self) -> usize {
        self.teams.read().await.len()
    }

    pub async fn members(&self, team_id: Uuid) -> Vec<(Uuid, TeamRole)> {
        self.teams
            .read()
            .await
            .get(&team_id)
            .map(|t| t.members.clone())
            .unwrap_or_default()
    }

    /// Make every call fail, as an unreachable store would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("Team store unavailable".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl TeamRepository for InMemoryTeamRepository {
    async fn create_team(&self, name: &str, hackathon_id: Uuid, creator_id: Uuid) -> Result<Uuid, String> {
        self.check_available()?;

        let id = Uuid::new_v4();
        self.teams.write().await.insert(
            id,
            StoredTeam {
                id,
                name: name.to_string(),
                hackathon_id,
                created_by: creator_id,
                members: vec![(creator_id, TeamRole::Leader)],
            },
        );
        Ok(id)
    }

    async fn add_team_member(&self, team_id: Uuid, user_id: Uuid, role: TeamRole) -> Result<(), String> {
        self.check_available()?;

        let mut teams = self.teams.write().await;
        let team = teams
            .get_mut(&team_id)
            .ok_or_else(|| format!("Failed to add member: team {} not found", team_id))?;
        if team.has_member(user_id) {
            return Err(format!("User {} is already a member of team {}", user_id, team_id));
        }
        team.members.push((user_id, role));
        Ok(())
    }

    async fn check_existing_membership(&self, user_id: Uuid, hackathon_id: Uuid) -> Result<Option<Uuid>, String> {
        self.check_available()?;

        Ok(self
            .teams
            .read()
            .await
            .values()
            .find(|t| t.hackathon_id == hackathon_id && t.has_member(user_id))
            .map(|t| t.id))
    }
}
