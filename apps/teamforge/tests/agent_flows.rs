//! End-to-end agent flow tests
//!
//! These tests drive complete event flows through the default agents:
//! - resume upload to stored profile
//! - suggestion requests
//! - team formation (rejections, fallback, auto invite, invitations)
//! - collaborator failures

use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use teamforge::agents::{AgentDependencies, AgentManager, FormationRequest, SuggestionKind, SuggestionTarget};
use teamforge::config::AppConfig;
use teamforge::domain::notification::Notification;
use teamforge::domain::repositories::{CandidateDirectory, TeamRepository};
use teamforge::domain::skills::{MatchingCriteria, SkillCatalog};
use teamforge::domain::team::TeamRole;
use teamforge::domain::user::SkillProfile;
use teamforge::events::{Event, EventBus, EventDraft, EventPayload, EventType};
use teamforge::infrastructure::{InMemoryCandidateDirectory, InMemoryTeamRepository, TracingNotifier};
use uuid::Uuid;

const HACKATHON: Uuid = Uuid::from_u128(0xACE);
const ADA: Uuid = Uuid::from_u128(1);

struct System {
    bus: Arc<EventBus>,
    directory: Arc<InMemoryCandidateDirectory>,
    teams: Arc<InMemoryTeamRepository>,
    notifier: Arc<TracingNotifier>,
    manager: AgentManager,
}

async fn system_with(teams: Arc<dyn TeamRepository>, store: Arc<InMemoryTeamRepository>, seed: u64) -> System {
    let bus = Arc::new(EventBus::default());
    let directory = Arc::new(InMemoryCandidateDirectory::new());
    let notifier = Arc::new(TracingNotifier::new());

    let deps = AgentDependencies {
        directory: directory.clone(),
        teams,
        notifier: notifier.clone(),
        catalog: Arc::new(SkillCatalog::default()),
    };
    let config = AppConfig {
        rng_seed: Some(seed),
        ..Default::default()
    };
    let manager = AgentManager::with_default_agents(Arc::clone(&bus), deps, &config).unwrap();
    manager.start_all().await.unwrap();

    directory
        .insert_user(
            "Ada Lovelace",
            SkillProfile::new(ADA).with_skills(["Rust"]).with_interests(["ai"]),
        )
        .await;

    System {
        bus,
        directory,
        teams: store,
        notifier,
        manager,
    }
}

async fn system(seed: u64) -> System {
    let teams = Arc::new(InMemoryTeamRepository::new());
    system_with(teams.clone(), teams, seed).await
}

async fn add_candidates(s: &System, people: &[(u128, &str, &str)]) {
    for (id, name, skill) in people {
        s.directory
            .insert_user(
                *name,
                SkillProfile::new(Uuid::from_u128(*id))
                    .with_skills([*skill])
                    .with_interests(["ai"]),
            )
            .await;
    }
}

fn formation(size: usize, required: &[&str], auto_invite: bool) -> FormationRequest {
    FormationRequest {
        requester_id: ADA,
        hackathon_id: HACKATHON,
        desired_team_size: size,
        required_skills: required.iter().map(|s| s.to_string()).collect(),
        preferred_skills: Vec::new(),
        target_users: None,
        auto_invite,
    }
}

async fn request_team(s: &System, request: FormationRequest) {
    s.bus
        .publish(EventDraft::new("api", EventPayload::TeamFormationRequested(request)).user(ADA))
        .await
        .unwrap();
}

async fn events(s: &System, event_type: EventType) -> Vec<Arc<Event>> {
    s.bus.get_event_history(Some(event_type), 1000).await
}

async fn wait_for_notifications(notifier: &TracingNotifier, expected: usize) {
    for _ in 0..100 {
        if notifier.sent().len() >= expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_resume_upload_updates_profile() {
    let s = system(1).await;

    s.bus
        .publish(
            EventDraft::new(
                "api",
                EventPayload::ResumeUploaded {
                    file_name: "ada.txt".to_string(),
                    text: "Skills: JS, k8s\nSenior Engineer at Analytical Engines (5 years)\n\
                           MSc Mathematics, University of London (2015)"
                        .to_string(),
                },
            )
            .user(ADA),
        )
        .await
        .unwrap();

    let parsed = events(&s, EventType::ResumeParsed).await;
    assert_eq!(parsed.len(), 1);

    let record = s.directory.fetch_user_profile(ADA).await.unwrap().unwrap();
    let expected: BTreeSet<String> = ["JavaScript", "Kubernetes", "Rust"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    assert_eq!(record.profile.skills, expected);
    assert_eq!(record.profile.experience.len(), 1);
    assert_eq!(record.profile.education.len(), 1);
    assert_eq!(record.profile.education[0].year, Some(2015));
}

#[tokio::test]
async fn test_unparseable_resume_reports_failure() {
    let s = system(1).await;

    s.bus
        .publish(
            EventDraft::new(
                "api",
                EventPayload::ResumeUploaded {
                    file_name: "blank.txt".to_string(),
                    text: "lorem ipsum".to_string(),
                },
            )
            .user(ADA),
        )
        .await
        .unwrap();

    assert_eq!(events(&s, EventType::ResumeParsingFailed).await.len(), 1);
    assert!(events(&s, EventType::ResumeParsed).await.is_empty());
}

#[tokio::test]
async fn test_individual_suggestions_flow() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React"), (3, "Cy", "Figma")]).await;

    s.bus
        .publish(EventDraft::new(
            "api",
            EventPayload::TeamSuggestionsRequested {
                criteria: MatchingCriteria {
                    user_id: ADA,
                    hackathon_id: Some(HACKATHON),
                    team_size: 3,
                    ..Default::default()
                },
                kind: SuggestionKind::Individuals,
            },
        ))
        .await
        .unwrap();

    let generated = events(&s, EventType::TeamSuggestionsGenerated).await;
    assert_eq!(generated.len(), 1);
    let EventPayload::TeamSuggestionsGenerated { suggestions, .. } = &generated[0].payload else {
        panic!("expected TEAM_SUGGESTIONS_GENERATED");
    };
    assert_eq!(suggestions.len(), 2);
    assert!(suggestions
        .iter()
        .all(|s| matches!(s.target, SuggestionTarget::User(id) if id != ADA)));
}

#[tokio::test]
async fn test_oversized_team_is_rejected() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React"), (3, "Cy", "Figma")]).await;

    request_team(&s, formation(8, &[], true)).await;

    assert!(events(&s, EventType::TeamFormed).await.is_empty());
    assert!(events(&s, EventType::NotificationSend).await.is_empty());
    assert_eq!(s.teams.team_count().await, 0);
}

#[tokio::test]
async fn test_existing_member_is_rejected() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React")]).await;
    s.teams.create_team("Old Team", HACKATHON, ADA).await.unwrap();

    request_team(&s, formation(2, &["Rust", "React"], true)).await;

    assert_eq!(s.teams.team_count().await, 1);
    assert!(events(&s, EventType::TeamFormed).await.is_empty());
    assert!(events(&s, EventType::TeamMemberAdded).await.is_empty());
}

#[tokio::test]
async fn test_low_score_falls_back_to_manual_suggestion() {
    let s = system(1).await;
    s.directory
        .insert_user("Bob", SkillProfile::new(Uuid::from_u128(2)).with_skills(["Rust"]))
        .await;

    request_team(&s, formation(2, &["Swift", "Kotlin", "Flutter"], true)).await;

    assert_eq!(events(&s, EventType::NotificationSend).await.len(), 1);
    assert!(events(&s, EventType::TeamFormed).await.is_empty());
    assert!(events(&s, EventType::TeamMemberAdded).await.is_empty());

    wait_for_notifications(&s.notifier, 1).await;
    let sent = s.notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, ADA);
    assert!(matches!(sent[0].1, Notification::ManualTeamSuggestion { .. }));
}

#[tokio::test]
async fn test_auto_invite_forms_team() {
    let s = system(1).await;
    add_candidates(
        &s,
        &[(2, "Bob", "React"), (3, "Cy", "Figma"), (4, "Dee", "AWS"), (5, "Eve", "Rust")],
    )
    .await;

    request_team(&s, formation(4, &["Rust", "React", "Figma", "AWS"], true)).await;

    let added = events(&s, EventType::TeamMemberAdded).await;
    let formed = events(&s, EventType::TeamFormed).await;
    assert_eq!(added.len(), 3);
    assert_eq!(formed.len(), 1);

    let EventPayload::TeamFormed { team_id, composition, .. } = &formed[0].payload else {
        panic!("expected TEAM_FORMED");
    };
    assert_eq!(composition.members.len(), 4);
    assert_eq!(composition.members[0].user_id, ADA);
    assert!(composition.total_score >= 0.5);

    let stored = s.teams.members(*team_id).await;
    assert_eq!(stored.len(), 4);
    assert_eq!(stored[0], (ADA, TeamRole::Leader));
    assert!(events(&s, EventType::SystemError).await.is_empty());
}

#[tokio::test]
async fn test_invitations_without_auto_invite() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React"), (3, "Cy", "Figma")]).await;

    request_team(&s, formation(3, &["Rust", "React", "Figma"], false)).await;

    assert_eq!(events(&s, EventType::TeamFormed).await.len(), 1);
    assert!(events(&s, EventType::TeamMemberAdded).await.is_empty());

    wait_for_notifications(&s.notifier, 2).await;
    let invited: BTreeSet<Uuid> = s
        .notifier
        .sent()
        .into_iter()
        .filter(|(_, n)| matches!(n, Notification::TeamInvitation { .. }))
        .map(|(user, _)| user)
        .collect();
    assert_eq!(invited, [Uuid::from_u128(2), Uuid::from_u128(3)].into_iter().collect());
}

#[tokio::test]
async fn test_seeded_search_is_deterministic() {
    let people = [
        (2, "Bob", "React"),
        (3, "Cy", "Figma"),
        (4, "Dee", "AWS"),
        (5, "Eve", "Rust"),
        (6, "Fay", "Swift"),
        (7, "Gus", "Docker"),
    ];

    let mut picks = Vec::new();
    for _ in 0..2 {
        let s = system(42).await;
        add_candidates(&s, &people).await;
        request_team(&s, formation(3, &["React", "Docker"], true)).await;

        let formed = events(&s, EventType::TeamFormed).await;
        let EventPayload::TeamFormed { composition, .. } = &formed[0].payload else {
            panic!("expected TEAM_FORMED");
        };
        picks.push(composition.members.iter().map(|m| m.user_id).collect::<Vec<_>>());
    }

    assert_eq!(picks[0], picks[1]);
}

/// Team store whose membership writes always fail
struct FailingMemberships {
    inner: Arc<InMemoryTeamRepository>,
}

#[async_trait]
impl TeamRepository for FailingMemberships {
    async fn create_team(&self, name: &str, hackathon_id: Uuid, creator_id: Uuid) -> Result<Uuid, String> {
        self.inner.create_team(name, hackathon_id, creator_id).await
    }

    async fn add_team_member(&self, _team_id: Uuid, _user_id: Uuid, _role: TeamRole) -> Result<(), String> {
        Err("connection reset".to_string())
    }

    async fn check_existing_membership(&self, user_id: Uuid, hackathon_id: Uuid) -> Result<Option<Uuid>, String> {
        self.inner.check_existing_membership(user_id, hackathon_id).await
    }
}

#[tokio::test]
async fn test_membership_failure_halts_formation() {
    let store = Arc::new(InMemoryTeamRepository::new());
    let failing = Arc::new(FailingMemberships { inner: store.clone() });
    let s = system_with(failing, store, 1).await;
    add_candidates(&s, &[(2, "Bob", "React"), (3, "Cy", "Figma")]).await;

    request_team(&s, formation(3, &["Rust", "React", "Figma"], true)).await;

    assert_eq!(s.teams.team_count().await, 1);
    assert!(events(&s, EventType::TeamMemberAdded).await.is_empty());
    assert!(events(&s, EventType::TeamFormed).await.is_empty());
    assert!(events(&s, EventType::SystemError).await.is_empty());
}

#[tokio::test]
async fn test_directory_outage_is_contained() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React")]).await;
    s.directory.set_unavailable(true);

    request_team(&s, formation(2, &["Rust", "React"], true)).await;

    assert!(events(&s, EventType::TeamFormed).await.is_empty());
    assert!(events(&s, EventType::SystemError).await.is_empty());
    assert!(s.manager.health().await.healthy);
}

#[tokio::test]
async fn test_event_ids_are_unique() {
    let s = system(1).await;
    add_candidates(&s, &[(2, "Bob", "React"), (3, "Cy", "Figma")]).await;
    request_team(&s, formation(3, &["Rust", "React", "Figma"], true)).await;

    let history = s.bus.get_event_history(None, 1000).await;
    let ids: BTreeSet<Uuid> = history.iter().map(|e| e.id).collect();
    assert_eq!(ids.len(), history.len());
    assert!(history.len() > 4);
}

#[tokio::test]
async fn test_shutdown_stops_agents_and_drains() {
    let s = system(1).await;

    s.manager.shutdown().await.unwrap();

    let health = s.manager.health().await;
    assert_eq!(health.running_agents, 0);
    assert_eq!(events(&s, EventType::AgentStopped).await.len(), 4);
    assert!(s.bus.is_closed());
}
