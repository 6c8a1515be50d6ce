//! Skill matching agent
//!
//! Keeps stored profiles in canonical form and answers suggestion requests
//! with ranked individuals or open teams.

use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::agent::{Agent, AgentCore};
use super::errors::{AgentError, AgentResult};
use super::types::{Suggestion, SuggestionKind, SuggestionTarget};
use crate::domain::repositories::{CandidateDirectory, CandidateFilters};
use crate::domain::skills::{scoring, MatchingCriteria, SkillCatalog};
use crate::domain::team::TeamSnapshot;
use crate::domain::user::{Experience, ParsedResume, SkillProfile};
use crate::events::{EnvelopeField, Event, EventBus, EventPayload, EventType};

pub const SKILL_MATCHING_AGENT: &str = "skill-matching";

/// Pool size and ranking limits for suggestions
#[derive(Debug, Clone, PartialEq)]
pub struct MatchingSettings {
    pub candidate_pool_limit: usize,
    /// Individuals must score strictly above this
    pub individual_threshold: f64,
    /// Teams must score strictly above this
    pub team_threshold: f64,
    pub max_individual_suggestions: usize,
    pub max_team_suggestions: usize,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            candidate_pool_limit: 50,
            individual_threshold: 0.3,
            team_threshold: 0.2,
            max_individual_suggestions: 10,
            max_team_suggestions: 8,
        }
    }
}

fn rank(suggestions: &mut Vec<Suggestion>, limit: usize) {
    suggestions.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    suggestions.truncate(limit);
}

fn overlap(mine: &BTreeSet<String>, theirs: &BTreeSet<String>) -> (Vec<String>, Vec<String>) {
    let shared = mine.intersection(theirs).cloned().collect();
    let complementary = theirs.difference(mine).cloned().collect();
    (shared, complementary)
}

/// Scores participants against each other and produces suggestions
pub struct SkillMatchingAgent {
    core: AgentCore,
    catalog: Arc<SkillCatalog>,
    directory: Arc<dyn CandidateDirectory>,
    settings: MatchingSettings,
}

impl SkillMatchingAgent {
    pub fn new(
        bus: Arc<EventBus>,
        catalog: Arc<SkillCatalog>,
        directory: Arc<dyn CandidateDirectory>,
        settings: MatchingSettings,
    ) -> Self {
        Self {
            core: AgentCore::new(
                SKILL_MATCHING_AGENT,
                "Normalizes skills, scores compatibility and ranks team suggestions",
                bus,
            ),
            catalog,
            directory,
            settings,
        }
    }

    pub fn settings(&self) -> &MatchingSettings {
        &self.settings
    }

    /// Canonical, deduplicated form of a raw skill list
    ///
    /// # Example
    /// ```
    /// # use std::sync::Arc;
    /// # use teamforge::agents::{MatchingSettings, SkillMatchingAgent};
    /// # use teamforge::domain::skills::SkillCatalog;
    /// # use teamforge::events::EventBus;
    /// # use teamforge::infrastructure::InMemoryCandidateDirectory;
    /// let agent = SkillMatchingAgent::new(
    ///     Arc::new(EventBus::default()),
    ///     Arc::new(SkillCatalog::default()),
    ///     Arc::new(InMemoryCandidateDirectory::new()),
    ///     MatchingSettings::default(),
    /// );
    ///
    /// let skills = agent.normalize_skills(["JS", "js", "JavaScript"]);
    /// assert_eq!(skills.len(), 1);
    /// ```
    pub fn normalize_skills<I, S>(&self, raw: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.catalog.normalize_skills(raw)
    }

    pub fn skill_compatibility(
        &self,
        a: &BTreeSet<String>,
        b: &BTreeSet<String>,
        required: &BTreeSet<String>,
    ) -> f64 {
        scoring::skill_compatibility(&self.catalog, a, b, required)
    }

    pub fn interest_alignment(&self, a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
        scoring::interest_alignment(a, b)
    }

    pub fn experience_compatibility(&self, a: &[Experience], b: &[Experience]) -> f64 {
        scoring::experience_compatibility(&self.catalog, a, b)
    }

    pub fn diversity_bonus(&self, a: &SkillProfile, b: &SkillProfile) -> f64 {
        scoring::diversity_bonus(&self.catalog, a, b)
    }

    pub fn compatibility_score(
        &self,
        user: &SkillProfile,
        other: &SkillProfile,
        criteria: &MatchingCriteria,
    ) -> f64 {
        scoring::compatibility_score(&self.catalog, user, other, criteria)
    }

    pub fn team_compatibility(&self, user: &SkillProfile, team: &TeamSnapshot) -> f64 {
        scoring::team_compatibility(&self.catalog, user, team)
    }

    /// Ranked individuals for the requester; empty when any lookup fails
    pub async fn generate_individual_suggestions(&self, criteria: &MatchingCriteria) -> Vec<Suggestion> {
        match self.rank_individuals(criteria).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(user_id = %criteria.user_id, error = %e, "Individual suggestions unavailable");
                Vec::new()
            }
        }
    }

    /// Ranked open teams for the requester; empty when any lookup fails
    pub async fn generate_team_suggestions(&self, criteria: &MatchingCriteria) -> Vec<Suggestion> {
        match self.rank_teams(criteria).await {
            Ok(suggestions) => suggestions,
            Err(e) => {
                warn!(user_id = %criteria.user_id, error = %e, "Team suggestions unavailable");
                Vec::new()
            }
        }
    }

    async fn load_profile(&self, user_id: Uuid) -> AgentResult<SkillProfile> {
        let record = self
            .directory
            .fetch_user_profile(user_id)
            .await
            .map_err(AgentError::Dependency)?
            .ok_or_else(|| AgentError::NotFound(format!("Profile for user {}", user_id)))?;

        let mut profile = record.profile;
        profile.skills = self.normalize_skills(&profile.skills);
        Ok(profile)
    }

    async fn rank_individuals(&self, criteria: &MatchingCriteria) -> AgentResult<Vec<Suggestion>> {
        let user = self.load_profile(criteria.user_id).await?;

        let filters = CandidateFilters {
            limit: self.settings.candidate_pool_limit,
            target_users: None,
        };
        let mut candidates = self
            .directory
            .fetch_candidates(criteria.user_id, criteria.hackathon_id, &filters)
            .await
            .map_err(AgentError::Dependency)?;
        candidates.truncate(self.settings.candidate_pool_limit);

        let mut suggestions: Vec<Suggestion> = candidates
            .iter()
            .filter(|c| c.user_id != criteria.user_id)
            .filter_map(|candidate| {
                let mut other = candidate.to_profile();
                other.skills = self.normalize_skills(&other.skills);

                let score = self.compatibility_score(&user, &other, criteria);
                if score <= self.settings.individual_threshold {
                    return None;
                }
                let (shared_skills, complementary_skills) = overlap(&user.skills, &other.skills);
                Some(Suggestion {
                    target: SuggestionTarget::User(candidate.user_id),
                    name: candidate.name.clone(),
                    score,
                    shared_skills,
                    complementary_skills,
                })
            })
            .collect();

        rank(&mut suggestions, self.settings.max_individual_suggestions);
        debug!(
            user_id = %criteria.user_id,
            pool = candidates.len(),
            kept = suggestions.len(),
            "Ranked individual suggestions"
        );
        Ok(suggestions)
    }

    async fn rank_teams(&self, criteria: &MatchingCriteria) -> AgentResult<Vec<Suggestion>> {
        let user = self.load_profile(criteria.user_id).await?;

        let teams = self
            .directory
            .fetch_open_teams(criteria.hackathon_id, &criteria.exclude_team_ids)
            .await
            .map_err(AgentError::Dependency)?;

        let mut suggestions: Vec<Suggestion> = teams
            .iter()
            .filter(|team| !team.members.iter().any(|m| m.user_id == criteria.user_id))
            .filter_map(|team| {
                let score = self.team_compatibility(&user, team);
                if score <= self.settings.team_threshold {
                    return None;
                }
                let team_skills = self.normalize_skills(team.combined_skills());
                let (shared_skills, complementary_skills) = overlap(&user.skills, &team_skills);
                Some(Suggestion {
                    target: SuggestionTarget::Team(team.team_id),
                    name: team.name.clone(),
                    score,
                    shared_skills,
                    complementary_skills,
                })
            })
            .collect();

        rank(&mut suggestions, self.settings.max_team_suggestions);
        debug!(
            user_id = %criteria.user_id,
            teams = teams.len(),
            kept = suggestions.len(),
            "Ranked team suggestions"
        );
        Ok(suggestions)
    }

    async fn update_profile(&self, user_id: Uuid, resume: &ParsedResume) -> AgentResult<SkillProfile> {
        let mut profile = match self.directory.fetch_user_profile(user_id).await {
            Ok(Some(record)) => record.profile,
            Ok(None) => SkillProfile::new(user_id),
            Err(e) => return Err(AgentError::Dependency(e)),
        };

        let parsed = SkillProfile {
            user_id,
            skills: self.normalize_skills(&resume.skills),
            interests: BTreeSet::new(),
            experience: resume.experience.clone(),
            education: resume.education.clone(),
        };
        profile.merge(&parsed);
        profile.skills = self.normalize_skills(&profile.skills);

        self.directory
            .save_user_profile(&profile)
            .await
            .map_err(AgentError::Dependency)?;
        Ok(profile)
    }

    async fn on_resume_parsed(&self, event: &Event, resume: &ParsedResume) -> AgentResult<()> {
        if !self.core.validate_payload(event, &[EnvelopeField::UserId]) {
            return Ok(());
        }
        let Some(user_id) = event.user_id else {
            return Ok(());
        };

        match self.update_profile(user_id, resume).await {
            Ok(profile) => info!(
                %user_id,
                skills = profile.skills.len(),
                experience = profile.experience.len(),
                education = profile.education.len(),
                "Profile updated from resume"
            ),
            Err(e) => error!(%user_id, error = %e, "Failed to update profile from resume"),
        }
        Ok(())
    }

    async fn on_suggestions_requested(
        &self,
        event: &Event,
        criteria: &MatchingCriteria,
        kind: SuggestionKind,
    ) -> AgentResult<()> {
        let suggestions = match kind {
            SuggestionKind::Individuals => self.generate_individual_suggestions(criteria).await,
            SuggestionKind::Teams => self.generate_team_suggestions(criteria).await,
        };
        info!(
            user_id = %criteria.user_id,
            ?kind,
            count = suggestions.len(),
            "Suggestions generated"
        );

        let mut draft = self
            .core
            .event(EventPayload::TeamSuggestionsGenerated { kind, suggestions })
            .user(criteria.user_id)
            .correlation(event.correlation_id.unwrap_or(event.id));
        if let Some(hackathon_id) = criteria.hackathon_id.or(event.hackathon_id) {
            draft = draft.hackathon(hackathon_id);
        }
        self.core.publish(draft).await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for SkillMatchingAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn subscribed_types(&self) -> &'static [EventType] {
        &[EventType::ResumeParsed, EventType::TeamSuggestionsRequested]
    }

    fn published_types(&self) -> &'static [EventType] {
        &[EventType::TeamSuggestionsGenerated]
    }

    async fn handle(&self, event: &Event) -> AgentResult<()> {
        match &event.payload {
            EventPayload::ResumeParsed { resume } => self.on_resume_parsed(event, resume).await,
            EventPayload::TeamSuggestionsRequested { criteria, kind } => {
                self.on_suggestions_requested(event, criteria, *kind).await
            }
            EventPayload::AgentStarted { .. }
            | EventPayload::AgentStopped { .. }
            | EventPayload::ResumeUploaded { .. }
            | EventPayload::ResumeParsingFailed { .. }
            | EventPayload::TeamSuggestionsGenerated { .. }
            | EventPayload::TeamFormationRequested(_)
            | EventPayload::TeamFormed { .. }
            | EventPayload::TeamMemberAdded { .. }
            | EventPayload::NotificationSend { .. }
            | EventPayload::SystemError { .. } => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::agent::AgentLifecycle;
    use crate::domain::user::Candidate;
    use crate::events::EventDraft;
    use crate::infrastructure::InMemoryCandidateDirectory;

    struct Fixture {
        bus: Arc<EventBus>,
        directory: Arc<InMemoryCandidateDirectory>,
        agent: Arc<SkillMatchingAgent>,
        me: SkillProfile,
    }

    async fn fixture() -> Fixture {
        let bus = Arc::new(EventBus::default());
        let directory = Arc::new(InMemoryCandidateDirectory::new());
        let agent = Arc::new(SkillMatchingAgent::new(
            Arc::clone(&bus),
            Arc::new(SkillCatalog::default()),
            directory.clone(),
            MatchingSettings::default(),
        ));

        let me = SkillProfile::new(Uuid::new_v4())
            .with_skills(["Rust", "postgres"])
            .with_interests(["fintech", "open source"]);
        directory.insert_user("Ada", me.clone()).await;

        Fixture {
            bus,
            directory,
            agent,
            me,
        }
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn criteria(user_id: Uuid) -> MatchingCriteria {
        MatchingCriteria {
            user_id,
            team_size: 4,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_normalize_collapses_synonyms() {
        let f = fixture().await;

        assert_eq!(f.agent.normalize_skills(["JS", "js", "JavaScript"]), set(&["JavaScript"]));

        let once = f.agent.normalize_skills(["golang", "K8s", "Figma"]);
        assert_eq!(f.agent.normalize_skills(&once), once);
    }

    #[tokio::test]
    async fn test_skill_compatibility_bounds() {
        let f = fixture().await;
        let empty = BTreeSet::new();

        assert_eq!(f.agent.skill_compatibility(&empty, &empty, &empty), 0.0);

        let score = f.agent.skill_compatibility(
            &set(&["Rust", "Go", "React"]),
            &set(&["Rust", "Figma", "AWS"]),
            &set(&["AWS", "Swift"]),
        );
        assert!((0.0..=1.0).contains(&score));
    }

    #[tokio::test]
    async fn test_individual_suggestions_are_ranked_and_filtered() {
        let f = fixture().await;
        let strong = SkillProfile::new(Uuid::new_v4())
            .with_skills(["React", "Figma", "AWS"])
            .with_interests(["fintech", "open source"]);
        let weak = SkillProfile::new(Uuid::new_v4());
        f.directory.insert_user("Grace", strong.clone()).await;
        f.directory.insert_user("Nobody", weak).await;

        let suggestions = f.agent.generate_individual_suggestions(&criteria(f.me.user_id)).await;

        assert!(!suggestions.is_empty());
        assert_eq!(suggestions[0].target, SuggestionTarget::User(strong.user_id));
        assert!(suggestions.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(suggestions.iter().all(|s| s.score > 0.3));
        assert!(suggestions
            .iter()
            .all(|s| s.target != SuggestionTarget::User(f.me.user_id)));
    }

    #[tokio::test]
    async fn test_suggestions_are_capped() {
        let f = fixture().await;
        for i in 0..15 {
            let profile = SkillProfile::new(Uuid::new_v4())
                .with_skills(["React", "Figma", "AWS", "Swift"])
                .with_interests(["fintech"]);
            f.directory.insert_user(format!("User {}", i), profile).await;
        }

        let suggestions = f.agent.generate_individual_suggestions(&criteria(f.me.user_id)).await;

        assert_eq!(suggestions.len(), 10);
    }

    #[tokio::test]
    async fn test_directory_failure_yields_empty_list() {
        let f = fixture().await;
        f.directory.set_unavailable(true);

        assert!(f.agent.generate_individual_suggestions(&criteria(f.me.user_id)).await.is_empty());
        assert!(f.agent.generate_team_suggestions(&criteria(f.me.user_id)).await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_requester_yields_empty_list() {
        let f = fixture().await;

        assert!(f
            .agent
            .generate_individual_suggestions(&criteria(Uuid::new_v4()))
            .await
            .is_empty());
    }

    #[tokio::test]
    async fn test_team_suggestions() {
        let f = fixture().await;
        let hackathon = Uuid::new_v4();
        let member = Candidate {
            user_id: Uuid::new_v4(),
            name: "Linus".to_string(),
            skills: set(&["C++"]),
            interests: set(&["fintech"]),
        };
        let open = TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Kernel".to_string(),
            members: vec![member],
        };
        f.directory.insert_team(hackathon, open.clone()).await;

        let mut request = criteria(f.me.user_id);
        request.hackathon_id = Some(hackathon);
        let suggestions = f.agent.generate_team_suggestions(&request).await;

        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].target, SuggestionTarget::Team(open.team_id));
        assert_eq!(suggestions[0].complementary_skills, vec!["C++".to_string()]);

        request.exclude_team_ids = vec![open.team_id];
        assert!(f.agent.generate_team_suggestions(&request).await.is_empty());
    }

    #[tokio::test]
    async fn test_resume_parsed_updates_profile() {
        let f = fixture().await;
        let agent: Arc<dyn Agent> = f.agent.clone();
        agent.start().await.unwrap();

        let resume = ParsedResume {
            skills: vec!["js".to_string(), "Rust".to_string()],
            experience: vec![Experience {
                title: "Engineer".to_string(),
                company: "Acme".to_string(),
                years: 2,
            }],
            education: Vec::new(),
        };
        f.bus
            .publish(EventDraft::new("test", EventPayload::ResumeParsed { resume }).user(f.me.user_id))
            .await
            .unwrap();

        let record = f.directory.fetch_user_profile(f.me.user_id).await.unwrap().unwrap();
        assert_eq!(record.profile.skills, set(&["JavaScript", "PostgreSQL", "Rust"]));
        assert_eq!(record.profile.experience.len(), 1);
        assert_eq!(record.profile.interests, f.me.interests);
    }

    #[tokio::test]
    async fn test_suggestion_request_publishes_result() {
        let f = fixture().await;
        let agent: Arc<dyn Agent> = f.agent.clone();
        agent.start().await.unwrap();

        f.bus
            .publish(EventDraft::new(
                "test",
                EventPayload::TeamSuggestionsRequested {
                    criteria: criteria(f.me.user_id),
                    kind: SuggestionKind::Individuals,
                },
            ))
            .await
            .unwrap();

        let generated = f
            .bus
            .get_event_history(Some(EventType::TeamSuggestionsGenerated), 10)
            .await;
        assert_eq!(generated.len(), 1);
        assert_eq!(generated[0].user_id, Some(f.me.user_id));
        assert!(matches!(
            generated[0].payload,
            EventPayload::TeamSuggestionsGenerated {
                kind: SuggestionKind::Individuals,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_missing_experience_is_neutral() {
        let f = fixture().await;
        let one = [Experience {
            title: "Data Scientist".to_string(),
            company: "Acme".to_string(),
            years: 1,
        }];

        assert_eq!(f.agent.experience_compatibility(&one, &[]), 0.5);
        assert_eq!(f.agent.interest_alignment(&BTreeSet::new(), &set(&["ai"])), 0.5);
    }
}
