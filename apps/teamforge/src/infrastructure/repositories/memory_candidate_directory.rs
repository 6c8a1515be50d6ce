use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::repositories::{CandidateDirectory, CandidateFilters, UserProfileRecord};
use crate::domain::team::{TeamSnapshot, MAX_TEAM_SIZE};
use crate::domain::user::{Candidate, SkillProfile};

#[derive(Debug, Clone)]
struct Participant {
    name: String,
    profile: SkillProfile,
    /// Hackathons the user registered for; empty means any
    hackathons: BTreeSet<Uuid>,
}

#[derive(Debug, Clone)]
struct OpenTeam {
    hackathon_id: Uuid,
    snapshot: TeamSnapshot,
}

/// In-memory implementation of CandidateDirectory
///
/// Keeps users and teams in ordered maps so lookups return a stable order,
/// which keeps seeded team searches reproducible.
#[derive(Default)]
pub struct InMemoryCandidateDirectory {
    users: RwLock<BTreeMap<Uuid, Participant>>,
    teams: RwLock<BTreeMap<Uuid, OpenTeam>>,
    unavailable: AtomicBool,
}

impl InMemoryCandidateDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a participant
    pub async fn insert_user(&self, name: impl Into<String>, profile: SkillProfile) {
        let mut users = self.users.write().await;
        let hackathons = users
            .get(&profile.user_id)
            .map(|p| p.hackathons.clone())
            .unwrap_or_default();
        users.insert(
            profile.user_id,
            Participant {
                name: name.into(),
                profile,
                hackathons,
            },
        );
    }

    /// Restrict a participant to the hackathons they joined
    pub async fn join_hackathon(&self, user_id: Uuid, hackathon_id: Uuid) -> Result<(), String> {
        let mut users = self.users.write().await;
        let participant = users
            .get_mut(&user_id)
            .ok_or_else(|| format!("Unknown user: {}", user_id))?;
        participant.hackathons.insert(hackathon_id);
        Ok(())
    }

    /// Register a team that still accepts members
    pub async fn insert_team(&self, hackathon_id: Uuid, snapshot: TeamSnapshot) {
        self.teams.write().await.insert(
            snapshot.team_id,
            OpenTeam {
                hackathon_id,
                snapshot,
            },
        );
    }

    /// Make every call fail, as an unreachable store would
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), String> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err("Candidate directory unavailable".to_string());
        }
        Ok(())
    }
}

#[async_trait]
impl CandidateDirectory for InMemoryCandidateDirectory {
    async fn fetch_candidates(
        &self,
        exclude_user_id: Uuid,
        hackathon_id: Option<Uuid>,
        filters: &CandidateFilters,
    ) -> Result<Vec<Candidate>, String> {
        self.check_available()?;

        let users = self.users.read().await;
        let candidates = users
            .values()
            .filter(|p| p.profile.user_id != exclude_user_id)
            .filter(|p| match hackathon_id {
                Some(h) => p.hackathons.is_empty() || p.hackathons.contains(&h),
                None => true,
            })
            .filter(|p| match &filters.target_users {
                Some(targets) => targets.contains(&p.profile.user_id),
                None => true,
            })
            .take(filters.limit)
            .map(|p| Candidate {
                user_id: p.profile.user_id,
                name: p.name.clone(),
                skills: p.profile.skills.clone(),
                interests: p.profile.interests.clone(),
            })
            .collect();

        Ok(candidates)
    }

    async fn fetch_user_profile(&self, user_id: Uuid) -> Result<Option<UserProfileRecord>, String> {
        self.check_available()?;

        Ok(self.users.read().await.get(&user_id).map(|p| UserProfileRecord {
            name: p.name.clone(),
            profile: p.profile.clone(),
        }))
    }

    async fn save_user_profile(&self, profile: &SkillProfile) -> Result<(), String> {
        self.check_available()?;

        let mut users = self.users.write().await;
        match users.get_mut(&profile.user_id) {
            Some(participant) => participant.profile = profile.clone(),
            None => {
                users.insert(
                    profile.user_id,
                    Participant {
                        name: String::new(),
                        profile: profile.clone(),
                        hackathons: BTreeSet::new(),
                    },
                );
            }
        }
        Ok(())
    }

    async fn fetch_open_teams(
        &self,
        hackathon_id: Option<Uuid>,
        exclude_team_ids: &[Uuid],
    ) -> Result<Vec<TeamSnapshot>, String> {
        self.check_available()?;

        let teams = self.teams.read().await;
        Ok(teams
            .values()
            .filter(|t| hackathon_id.map_or(true, |h| t.hackathon_id == h))
            .filter(|t| !exclude_team_ids.contains(&t.snapshot.team_id))
            .filter(|t| t.snapshot.members.len() < MAX_TEAM_SIZE)
            .map(|t| t.snapshot.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(skills: &[&str]) -> SkillProfile {
        SkillProfile::new(Uuid::new_v4()).with_skills(skills.iter().copied())
    }

    #[tokio::test]
    async fn test_fetch_candidates_excludes_requester() {
        let directory = InMemoryCandidateDirectory::new();
        let me = profile(&["Rust"]);
        directory.insert_user("Me", me.clone()).await;
        directory.insert_user("Other", profile(&["Go"])).await;

        let candidates = directory
            .fetch_candidates(me.user_id, None, &CandidateFilters::default())
            .await
            .unwrap();

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name, "Other");
    }

    #[tokio::test]
    async fn test_fetch_candidates_applies_filters() {
        let directory = InMemoryCandidateDirectory::new();
        let hackathon = Uuid::new_v4();
        let elsewhere = profile(&["Go"]);
        let target = profile(&["Rust"]);
        directory.insert_user("Elsewhere", elsewhere.clone()).await;
        directory.insert_user("Target", target.clone()).await;
        directory.insert_user("Anyone", profile(&["SQL"])).await;
        directory.join_hackathon(elsewhere.user_id, Uuid::new_v4()).await.unwrap();

        let in_hackathon = directory
            .fetch_candidates(Uuid::new_v4(), Some(hackathon), &CandidateFilters::default())
            .await
            .unwrap();
        assert_eq!(in_hackathon.len(), 2);

        let filters = CandidateFilters {
            limit: 10,
            target_users: Some(vec![target.user_id]),
        };
        let targeted = directory
            .fetch_candidates(Uuid::new_v4(), None, &filters)
            .await
            .unwrap();
        assert_eq!(targeted.len(), 1);
        assert_eq!(targeted[0].user_id, target.user_id);

        let limited = CandidateFilters {
            limit: 1,
            target_users: None,
        };
        assert_eq!(
            directory.fetch_candidates(Uuid::new_v4(), None, &limited).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_save_keeps_display_name() {
        let directory = InMemoryCandidateDirectory::new();
        let mut me = profile(&["Rust"]);
        directory.insert_user("Ada", me.clone()).await;

        me.skills.insert("Go".to_string());
        directory.save_user_profile(&me).await.unwrap();

        let record = directory.fetch_user_profile(me.user_id).await.unwrap().unwrap();
        assert_eq!(record.name, "Ada");
        assert!(record.profile.skills.contains("Go"));
    }

    #[tokio::test]
    async fn test_unavailable_directory_errors() {
        let directory = InMemoryCandidateDirectory::new();
        directory.set_unavailable(true);

        assert!(directory.fetch_user_profile(Uuid::new_v4()).await.is_err());
        assert!(directory.fetch_open_teams(None, &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_open_teams_skip_full_and_excluded() {
        let directory = InMemoryCandidateDirectory::new();
        let hackathon = Uuid::new_v4();
        let member = Candidate {
            user_id: Uuid::new_v4(),
            name: "M".to_string(),
            skills: BTreeSet::new(),
            interests: BTreeSet::new(),
        };
        let open = TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Open".to_string(),
            members: vec![member.clone()],
        };
        let full = TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Full".to_string(),
            members: vec![member; MAX_TEAM_SIZE],
        };
        let excluded = TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Excluded".to_string(),
            members: Vec::new(),
        };
        directory.insert_team(hackathon, open.clone()).await;
        directory.insert_team(hackathon, full).await;
        directory.insert_team(hackathon, excluded.clone()).await;

        let teams = directory
            .fetch_open_teams(Some(hackathon), &[excluded.team_id])
            .await
            .unwrap();

        assert_eq!(teams, vec![open]);
    }
}
