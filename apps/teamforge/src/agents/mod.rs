// Agent system modules
//
// Reactive agents driven by the event bus, and the supervisor that
// starts, stops and reports on them.

pub mod agent;
pub mod errors;
pub mod manager;
pub mod notification;
pub mod profile_parsing;
pub mod skill_matching;
pub mod state;
pub mod team_forming;
pub mod types;

// Re-export main types
pub use agent::{Agent, AgentCore, AgentLifecycle};
pub use errors::{AgentError, AgentResult};
pub use manager::{AgentDependencies, AgentManager};
pub use notification::NotificationAgent;
pub use profile_parsing::{ProfileParsingAgent, ResumeParser};
pub use skill_matching::{MatchingSettings, SkillMatchingAgent};
pub use state::{AgentDescriptor, AgentStatus, ManagerHealth};
pub use team_forming::{FormationSettings, TeamFormingAgent};
pub use types::{FormationRequest, Suggestion, SuggestionKind, SuggestionTarget};
