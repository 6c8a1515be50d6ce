use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use tracing::{error, info, warn};

use super::agent::{Agent, AgentLifecycle};
use super::errors::{AgentError, AgentResult};
use super::notification::NotificationAgent;
use super::profile_parsing::ProfileParsingAgent;
use super::skill_matching::SkillMatchingAgent;
use super::state::{AgentDescriptor, ManagerHealth};
use super::team_forming::TeamFormingAgent;
use crate::config::AppConfig;
use crate::domain::repositories::{CandidateDirectory, Notifier, TeamRepository};
use crate::domain::skills::SkillCatalog;
use crate::domain::team::GeneticOptimizer;
use crate::events::EventBus;

/// Collaborators shared by the default agents
#[derive(Clone)]
pub struct AgentDependencies {
    pub directory: Arc<dyn CandidateDirectory>,
    pub teams: Arc<dyn TeamRepository>,
    pub notifier: Arc<dyn Notifier>,
    pub catalog: Arc<SkillCatalog>,
}

/// Supervisor owning every agent attached to a bus
pub struct AgentManager {
    bus: Arc<EventBus>,
    agents: Vec<Arc<dyn Agent>>,
}

impl AgentManager {
    /// Create an empty manager for a bus
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            agents: Vec::new(),
        }
    }

    /// Create a manager with the profile parsing, skill matching, team
    /// forming and notification agents registered (not yet started)
    pub fn with_default_agents(
        bus: Arc<EventBus>,
        deps: AgentDependencies,
        config: &AppConfig,
    ) -> AgentResult<Self> {
        let rng: Box<dyn RngCore + Send> = match config.rng_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };

        let mut manager = Self::new(Arc::clone(&bus));
        manager.register(Arc::new(ProfileParsingAgent::new(
            Arc::clone(&bus),
            Arc::clone(&deps.catalog),
        )?))?;
        manager.register(Arc::new(SkillMatchingAgent::new(
            Arc::clone(&bus),
            Arc::clone(&deps.catalog),
            Arc::clone(&deps.directory),
            config.matching.clone(),
        )))?;
        manager.register(Arc::new(TeamFormingAgent::new(
            Arc::clone(&bus),
            Arc::clone(&deps.catalog),
            Arc::clone(&deps.directory),
            Arc::clone(&deps.teams),
            GeneticOptimizer::new(config.optimizer),
            rng,
            config.formation.clone(),
        )))?;
        manager.register(Arc::new(NotificationAgent::new(bus, deps.notifier)))?;

        Ok(manager)
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Add an agent; names must be unique
    pub fn register(&mut self, agent: Arc<dyn Agent>) -> AgentResult<()> {
        if self.agent(agent.name()).is_some() {
            return Err(AgentError::DuplicateAgent(agent.name().to_string()));
        }
        info!(agent = agent.name(), "Agent registered");
        self.agents.push(agent);
        Ok(())
    }

    pub fn agent(&self, name: &str) -> Option<&Arc<dyn Agent>> {
        self.agents.iter().find(|a| a.name() == name)
    }

    pub fn agents(&self) -> &[Arc<dyn Agent>] {
        &self.agents
    }

    /// Start every agent in registration order
    ///
    /// A failing agent is logged and skipped; the first error is returned
    /// after the others were attempted.
    pub async fn start_all(&self) -> AgentResult<()> {
        let mut first_error = None;
        for agent in &self.agents {
            if let Err(e) = agent.start().await {
                error!(agent = agent.name(), error = %e, "Failed to start agent");
                first_error.get_or_insert(e);
            }
        }
        info!(agents = self.agents.len(), "Agents started");
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every agent in reverse registration order
    pub async fn stop_all(&self) -> AgentResult<()> {
        let mut first_error = None;
        for agent in self.agents.iter().rev() {
            if let Err(e) = agent.stop().await {
                warn!(agent = agent.name(), error = %e, "Agent stop hook failed");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    pub async fn start_agent(&self, name: &str) -> AgentResult<()> {
        self.agent(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_string()))?
            .start()
            .await
    }

    pub async fn stop_agent(&self, name: &str) -> AgentResult<()> {
        self.agent(name)
            .ok_or_else(|| AgentError::AgentNotFound(name.to_string()))?
            .stop()
            .await
    }

    pub fn descriptors(&self) -> Vec<AgentDescriptor> {
        self.agents.iter().map(|a| a.descriptor()).collect()
    }

    /// Healthy when every registered agent is running
    pub async fn health(&self) -> ManagerHealth {
        let agents = self.descriptors();
        let running_agents = agents.iter().filter(|d| d.is_running()).count();
        let total_agents = agents.len();

        ManagerHealth {
            healthy: running_agents == total_agents,
            running_agents,
            total_agents,
            agents,
            bus: self.bus.get_statistics().await,
        }
    }

    /// Stop all agents, then wait for in-flight publishes and close the bus
    pub async fn shutdown(&self) -> AgentResult<()> {
        info!("Shutting down agents");
        let stopped = self.stop_all().await;
        self.bus.drain().await;
        info!("Event bus drained");
        stopped
    }
}
