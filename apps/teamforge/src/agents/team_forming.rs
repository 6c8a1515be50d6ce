//! Team forming agent
//!
//! Runs the genetic optimizer for a formation request and either persists
//! the resulting team or, when the best composition scores below the
//! auto-form threshold, sends the requester a ranked shortlist instead.

use async_trait::async_trait;
use rand::RngCore;
use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::agent::{lock, Agent, AgentCore};
use super::errors::{AgentError, AgentResult};
use super::types::FormationRequest;
use crate::domain::notification::{Notification, SuggestedCandidate};
use crate::domain::repositories::{CandidateDirectory, CandidateFilters, TeamRepository};
use crate::domain::skills::SkillCatalog;
use crate::domain::team::{
    evaluate_team_composition, FormationGoals, GeneticOptimizer, TeamComposition, TeamMember,
    TeamRole, TeamSize,
};
use crate::events::{Event, EventBus, EventDraft, EventPayload, EventType};

pub const TEAM_FORMING_AGENT: &str = "team-forming";

/// Decision gate and pool limits for team formation
#[derive(Debug, Clone, PartialEq)]
pub struct FormationSettings {
    /// Compositions scoring below this fall back to manual suggestions
    pub auto_form_threshold: f64,
    pub candidate_pool_limit: usize,
    /// Candidates listed in a manual suggestion
    pub manual_suggestion_count: usize,
}

impl Default for FormationSettings {
    fn default() -> Self {
        Self {
            auto_form_threshold: 0.5,
            candidate_pool_limit: 50,
            manual_suggestion_count: 10,
        }
    }
}

/// Everything the optimizer needs for one request
struct SearchInput {
    leader: TeamMember,
    pool: Vec<TeamMember>,
    size: TeamSize,
    goals: FormationGoals,
}

pub struct TeamFormingAgent {
    core: AgentCore,
    catalog: Arc<SkillCatalog>,
    directory: Arc<dyn CandidateDirectory>,
    teams: Arc<dyn TeamRepository>,
    optimizer: GeneticOptimizer,
    rng: Mutex<Box<dyn RngCore + Send>>,
    settings: FormationSettings,
}

impl TeamFormingAgent {
    pub fn new(
        bus: Arc<EventBus>,
        catalog: Arc<SkillCatalog>,
        directory: Arc<dyn CandidateDirectory>,
        teams: Arc<dyn TeamRepository>,
        optimizer: GeneticOptimizer,
        rng: Box<dyn RngCore + Send>,
        settings: FormationSettings,
    ) -> Self {
        Self {
            core: AgentCore::new(
                TEAM_FORMING_AGENT,
                "Searches for a high-fitness team and forms it or suggests candidates",
                bus,
            ),
            catalog,
            directory,
            teams,
            optimizer,
            rng: Mutex::new(rng),
            settings,
        }
    }

    pub fn settings(&self) -> &FormationSettings {
        &self.settings
    }

    /// Handles one formation request end to end
    ///
    /// Rejections and collaborator failures are logged and end the flow
    /// without emitting anything; only bus failures are returned.
    pub async fn form_team(&self, event: &Event, request: &FormationRequest) -> AgentResult<()> {
        let input = match self.prepare(request).await {
            Ok(input) => input,
            Err(e @ AgentError::Dependency(_)) => {
                error!(requester = %request.requester_id, error = %e, "Team formation aborted");
                return Ok(());
            }
            Err(e) => {
                warn!(requester = %request.requester_id, error = %e, "Team formation rejected");
                return Ok(());
            }
        };

        let best = {
            let mut rng = lock(&self.rng);
            self.optimizer.optimize(
                &input.leader,
                &input.pool,
                input.size.needed_members(),
                &input.goals,
                &mut **rng,
            )
        };
        let Some(best) = best else {
            warn!(requester = %request.requester_id, "Optimizer found no composition");
            return Ok(());
        };

        info!(
            requester = %request.requester_id,
            hackathon_id = %request.hackathon_id,
            pool = input.pool.len(),
            total_score = best.total_score,
            "Optimal team found"
        );

        if best.total_score < self.settings.auto_form_threshold {
            return self.suggest_manually(event, request, &input, best.total_score).await;
        }
        self.create_team(event, request, &input.leader, best).await
    }

    /// Validates the request and gathers the leader and candidate pool
    async fn prepare(&self, request: &FormationRequest) -> AgentResult<SearchInput> {
        let size = TeamSize::new(request.desired_team_size)
            .map_err(|_| AgentError::InvalidTeamSize(request.desired_team_size))?;

        let existing = self
            .teams
            .check_existing_membership(request.requester_id, request.hackathon_id)
            .await
            .map_err(AgentError::Dependency)?;
        if let Some(team_id) = existing {
            return Err(AgentError::Validation(format!(
                "User {} already belongs to team {} for this hackathon",
                request.requester_id, team_id
            )));
        }

        let record = self
            .directory
            .fetch_user_profile(request.requester_id)
            .await
            .map_err(AgentError::Dependency)?
            .ok_or_else(|| AgentError::NotFound(format!("Requester {}", request.requester_id)))?;

        let leader = TeamMember {
            user_id: request.requester_id,
            name: record.name,
            skills: self.catalog.normalize_skills(&record.profile.skills),
            interests: record.profile.interests,
            role: TeamRole::Leader,
            contribution_score: 0.0,
        };

        let filters = CandidateFilters {
            limit: self.settings.candidate_pool_limit,
            target_users: request.target_users.clone(),
        };
        let candidates = self
            .directory
            .fetch_candidates(request.requester_id, Some(request.hackathon_id), &filters)
            .await
            .map_err(AgentError::Dependency)?;

        let pool: Vec<TeamMember> = candidates
            .iter()
            .filter(|c| c.user_id != request.requester_id)
            .take(self.settings.candidate_pool_limit)
            .map(|c| {
                let mut member = TeamMember::from_candidate(c, TeamRole::Member);
                member.skills = self.catalog.normalize_skills(&member.skills);
                member
            })
            .collect();

        if pool.len() < size.needed_members() {
            return Err(AgentError::Validation(format!(
                "Only {} candidates for {} open seats",
                pool.len(),
                size.needed_members()
            )));
        }

        let goals = FormationGoals {
            required_skills: self.catalog.normalize_skills(&request.required_skills),
            preferred_skills: self.catalog.normalize_skills(&request.preferred_skills),
        };

        Ok(SearchInput {
            leader,
            pool,
            size,
            goals,
        })
    }

    fn envelope(&self, event: &Event, request: &FormationRequest, payload: EventPayload) -> EventDraft {
        self.core
            .event(payload)
            .hackathon(request.hackathon_id)
            .correlation(event.correlation_id.unwrap_or(event.id))
    }

    /// Candidates ranked by how well each pairs with the leader alone
    fn shortlist(&self, input: &SearchInput) -> Vec<SuggestedCandidate> {
        let mut ranked: Vec<SuggestedCandidate> = input
            .pool
            .iter()
            .map(|candidate| {
                let pair = [input.leader.clone(), candidate.clone()];
                SuggestedCandidate {
                    user_id: candidate.user_id,
                    name: candidate.name.clone(),
                    score: evaluate_team_composition(&pair, &input.goals).total_score,
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked.truncate(self.settings.manual_suggestion_count);
        ranked
    }

    async fn suggest_manually(
        &self,
        event: &Event,
        request: &FormationRequest,
        input: &SearchInput,
        best_score: f64,
    ) -> AgentResult<()> {
        let candidates = self.shortlist(input);
        info!(
            requester = %request.requester_id,
            best_score,
            threshold = self.settings.auto_form_threshold,
            suggested = candidates.len(),
            "Score below threshold; sending manual suggestions"
        );

        let notification = Notification::ManualTeamSuggestion {
            hackathon_id: request.hackathon_id,
            best_score,
            candidates,
        };
        let draft = self
            .envelope(
                event,
                request,
                EventPayload::NotificationSend {
                    recipient: request.requester_id,
                    notification,
                },
            )
            .user(request.requester_id);
        self.core.publish(draft).await?;
        Ok(())
    }

    async fn create_team(
        &self,
        event: &Event,
        request: &FormationRequest,
        leader: &TeamMember,
        composition: TeamComposition,
    ) -> AgentResult<()> {
        let team_name = format!("Team {}", leader.name);
        let team_id = match self
            .teams
            .create_team(&team_name, request.hackathon_id, request.requester_id)
            .await
        {
            Ok(team_id) => team_id,
            Err(e) => {
                error!(requester = %request.requester_id, error = %e, "Failed to create team");
                return Ok(());
            }
        };

        let recruits: Vec<Uuid> = composition
            .members
            .iter()
            .filter(|m| m.role != TeamRole::Leader)
            .map(|m| m.user_id)
            .collect();

        for user_id in &recruits {
            let payload = if request.auto_invite {
                if let Err(e) = self
                    .teams
                    .add_team_member(team_id, *user_id, TeamRole::Member)
                    .await
                {
                    error!(%team_id, %user_id, error = %e, "Failed to add team member");
                    return Ok(());
                }
                EventPayload::TeamMemberAdded {
                    team_id,
                    user_id: *user_id,
                    role: TeamRole::Member,
                }
            } else {
                EventPayload::NotificationSend {
                    recipient: *user_id,
                    notification: Notification::TeamInvitation {
                        team_id,
                        team_name: team_name.clone(),
                        hackathon_id: request.hackathon_id,
                        invited_by: request.requester_id,
                    },
                }
            };

            let draft = self.envelope(event, request, payload).team(team_id).user(*user_id);
            self.core.publish(draft).await?;
        }

        info!(
            %team_id,
            team_name = %team_name,
            members = composition.members.len(),
            auto_invite = request.auto_invite,
            "Team formed"
        );

        let formed = EventPayload::TeamFormed {
            team_id,
            team_name,
            hackathon_id: request.hackathon_id,
            composition,
        };
        let draft = self
            .envelope(event, request, formed)
            .team(team_id)
            .user(request.requester_id);
        self.core.publish(draft).await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for TeamFormingAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn subscribed_types(&self) -> &'static [EventType] {
        &[EventType::TeamFormationRequested]
    }

    fn published_types(&self) -> &'static [EventType] {
        &[
            EventType::TeamFormed,
            EventType::TeamMemberAdded,
            EventType::NotificationSend,
        ]
    }

    async fn handle(&self, event: &Event) -> AgentResult<()> {
        match &event.payload {
            EventPayload::TeamFormationRequested(request) => self.form_team(event, request).await,
            EventPayload::AgentStarted { .. }
            | EventPayload::AgentStopped { .. }
            | EventPayload::ResumeUploaded { .. }
            | EventPayload::ResumeParsed { .. }
            | EventPayload::ResumeParsingFailed { .. }
            | EventPayload::TeamSuggestionsRequested { .. }
            | EventPayload::TeamSuggestionsGenerated { .. }
            | EventPayload::TeamFormed { .. }
            | EventPayload::TeamMemberAdded { .. }
            | EventPayload::NotificationSend { .. }
            | EventPayload::SystemError { .. } => Ok(()),
        }
    }
}
