use thiserror::Error;

use crate::events::BusError;

/// Errors that can occur in the agent system
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Invalid team size: {0} (must be 2-6 members)")]
    InvalidTeamSize(usize),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Dependency failure: {0}")]
    Dependency(String),

    #[error("Agent not found: {0}")]
    AgentNotFound(String),

    #[error("Agent already registered: {0}")]
    DuplicateAgent(String),

    #[error("Invalid parser pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("Event bus error: {0}")]
    Bus(#[from] BusError),
}

pub type AgentResult<T> = Result<T, AgentError>;
