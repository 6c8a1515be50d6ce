use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::{BusStatistics, EventType};

/// Lifecycle state of an agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    Stopped,
    Running,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Stopped => write!(f, "stopped"),
            AgentStatus::Running => write!(f, "running"),
        }
    }
}

/// Point-in-time description of an agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub name: String,
    pub description: String,
    pub subscribed_types: Vec<EventType>,
    pub published_types: Vec<EventType>,
    pub status: AgentStatus,
    pub processed_count: u64,
    pub last_activity: Option<DateTime<Utc>>,
}

impl AgentDescriptor {
    pub fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
    }
}

/// Aggregated health reported by the agent manager
#[derive(Debug, Clone)]
pub struct ManagerHealth {
    /// True when every registered agent is running
    pub healthy: bool,
    pub running_agents: usize,
    pub total_agents: usize,
    pub agents: Vec<AgentDescriptor>,
    pub bus: BusStatistics,
}
