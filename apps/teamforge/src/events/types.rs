use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::agents::types::{FormationRequest, Suggestion, SuggestionKind};
use crate::domain::notification::Notification;
use crate::domain::skills::MatchingCriteria;
use crate::domain::team::{TeamComposition, TeamRole};
use crate::domain::user::ParsedResume;

/// Current envelope version stamped on events that do not carry one
pub const EVENT_VERSION: u32 = 1;

/// Discriminant of every event the bus carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    AgentStarted,
    AgentStopped,
    ResumeUploaded,
    ResumeParsed,
    ResumeParsingFailed,
    TeamSuggestionsRequested,
    TeamSuggestionsGenerated,
    TeamFormationRequested,
    TeamFormed,
    TeamMemberAdded,
    NotificationSend,
    SystemError,
}

impl EventType {
    pub const ALL: [EventType; 12] = [
        EventType::AgentStarted,
        EventType::AgentStopped,
        EventType::ResumeUploaded,
        EventType::ResumeParsed,
        EventType::ResumeParsingFailed,
        EventType::TeamSuggestionsRequested,
        EventType::TeamSuggestionsGenerated,
        EventType::TeamFormationRequested,
        EventType::TeamFormed,
        EventType::TeamMemberAdded,
        EventType::NotificationSend,
        EventType::SystemError,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::AgentStarted => "AGENT_STARTED",
            EventType::AgentStopped => "AGENT_STOPPED",
            EventType::ResumeUploaded => "RESUME_UPLOADED",
            EventType::ResumeParsed => "RESUME_PARSED",
            EventType::ResumeParsingFailed => "RESUME_PARSING_FAILED",
            EventType::TeamSuggestionsRequested => "TEAM_SUGGESTIONS_REQUESTED",
            EventType::TeamSuggestionsGenerated => "TEAM_SUGGESTIONS_GENERATED",
            EventType::TeamFormationRequested => "TEAM_FORMATION_REQUESTED",
            EventType::TeamFormed => "TEAM_FORMED",
            EventType::TeamMemberAdded => "TEAM_MEMBER_ADDED",
            EventType::NotificationSend => "NOTIFICATION_SEND",
            EventType::SystemError => "SYSTEM_ERROR",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed body of an event; the variant determines the event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventPayload {
    AgentStarted {
        agent: String,
    },
    AgentStopped {
        agent: String,
    },
    /// Raw resume text uploaded by the envelope's user
    ResumeUploaded {
        file_name: String,
        text: String,
    },
    ResumeParsed {
        resume: ParsedResume,
    },
    ResumeParsingFailed {
        reason: String,
    },
    TeamSuggestionsRequested {
        criteria: MatchingCriteria,
        kind: SuggestionKind,
    },
    TeamSuggestionsGenerated {
        kind: SuggestionKind,
        suggestions: Vec<Suggestion>,
    },
    TeamFormationRequested(FormationRequest),
    TeamFormed {
        team_id: Uuid,
        team_name: String,
        hackathon_id: Uuid,
        composition: TeamComposition,
    },
    TeamMemberAdded {
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    },
    NotificationSend {
        recipient: Uuid,
        notification: Notification,
    },
    /// A handler failed while processing another event
    SystemError {
        handler: String,
        message: String,
        failed_event_id: Uuid,
        failed_event_type: EventType,
    },
}

impl EventPayload {
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::AgentStarted { .. } => EventType::AgentStarted,
            EventPayload::AgentStopped { .. } => EventType::AgentStopped,
            EventPayload::ResumeUploaded { .. } => EventType::ResumeUploaded,
            EventPayload::ResumeParsed { .. } => EventType::ResumeParsed,
            EventPayload::ResumeParsingFailed { .. } => EventType::ResumeParsingFailed,
            EventPayload::TeamSuggestionsRequested { .. } => EventType::TeamSuggestionsRequested,
            EventPayload::TeamSuggestionsGenerated { .. } => EventType::TeamSuggestionsGenerated,
            EventPayload::TeamFormationRequested(_) => EventType::TeamFormationRequested,
            EventPayload::TeamFormed { .. } => EventType::TeamFormed,
            EventPayload::TeamMemberAdded { .. } => EventType::TeamMemberAdded,
            EventPayload::NotificationSend { .. } => EventType::NotificationSend,
            EventPayload::SystemError { .. } => EventType::SystemError,
        }
    }
}

/// Envelope-level fields a handler may require to be present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeField {
    CorrelationId,
    UserId,
    TeamId,
    HackathonId,
}

impl std::fmt::Display for EnvelopeField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnvelopeField::CorrelationId => write!(f, "correlation_id"),
            EnvelopeField::UserId => write!(f, "user_id"),
            EnvelopeField::TeamId => write!(f, "team_id"),
            EnvelopeField::HackathonId => write!(f, "hackathon_id"),
        }
    }
}

/// A published event
///
/// Events are created by `EventBus::publish` and shared as `Arc<Event>`;
/// nothing mutates them afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub version: u32,
    pub correlation_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub hackathon_id: Option<Uuid>,
    pub payload: EventPayload,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    /// True when the envelope carries the given field
    pub fn has_field(&self, field: EnvelopeField) -> bool {
        match field {
            EnvelopeField::CorrelationId => self.correlation_id.is_some(),
            EnvelopeField::UserId => self.user_id.is_some(),
            EnvelopeField::TeamId => self.team_id.is_some(),
            EnvelopeField::HackathonId => self.hackathon_id.is_some(),
        }
    }
}

/// An event before publication
///
/// The bus assigns the id, and fills in the timestamp and version when the
/// draft leaves them empty.
///
/// # Example
/// ```
/// use teamforge::events::{EventDraft, EventPayload, EventType};
/// use uuid::Uuid;
///
/// let draft = EventDraft::new("api", EventPayload::ResumeUploaded {
///     file_name: "cv.txt".to_string(),
///     text: "Rust developer".to_string(),
/// })
/// .user(Uuid::new_v4());
///
/// assert_eq!(draft.event_type(), EventType::ResumeUploaded);
/// ```
#[derive(Debug, Clone)]
pub struct EventDraft {
    source: String,
    payload: EventPayload,
    timestamp: Option<DateTime<Utc>>,
    version: Option<u32>,
    correlation_id: Option<Uuid>,
    user_id: Option<Uuid>,
    team_id: Option<Uuid>,
    hackathon_id: Option<Uuid>,
}

impl EventDraft {
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            source: source.into(),
            payload,
            timestamp: None,
            version: None,
            correlation_id: None,
            user_id: None,
            team_id: None,
            hackathon_id: None,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.payload.event_type()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }

    pub fn correlation(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    pub fn user(mut self, user_id: Uuid) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn team(mut self, team_id: Uuid) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn hackathon(mut self, hackathon_id: Uuid) -> Self {
        self.hackathon_id = Some(hackathon_id);
        self
    }

    /// Overrides the source; used by agents to stamp their name
    pub(crate) fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub(crate) fn into_event(self) -> Event {
        Event {
            id: Uuid::new_v4(),
            timestamp: self.timestamp.unwrap_or_else(Utc::now),
            source: self.source,
            version: self.version.unwrap_or(EVENT_VERSION),
            correlation_id: self.correlation_id,
            user_id: self.user_id,
            team_id: self.team_id,
            hackathon_id: self.hackathon_id,
            payload: self.payload,
        }
    }
}
