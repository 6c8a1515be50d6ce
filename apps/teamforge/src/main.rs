use std::sync::Arc;

use teamforge::agents::{AgentDependencies, AgentManager};
use teamforge::config::AppConfig;
use teamforge::events::EventBus;
use teamforge::infrastructure::{InMemoryCandidateDirectory, InMemoryTeamRepository, TracingNotifier};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration (reads .env first)
    let config = AppConfig::from_env().expect("Invalid configuration");
    let catalog = config.load_catalog().expect("Failed to load skill catalog");

    if let Some(seed) = config.rng_seed {
        tracing::info!(seed, "Team search is seeded");
    }

    // Build the bus and the agents
    let bus = Arc::new(EventBus::new(config.bus));
    let deps = AgentDependencies {
        directory: Arc::new(InMemoryCandidateDirectory::new()),
        teams: Arc::new(InMemoryTeamRepository::new()),
        notifier: Arc::new(TracingNotifier::new()),
        catalog: Arc::new(catalog),
    };
    let manager = AgentManager::with_default_agents(Arc::clone(&bus), deps, &config)
        .expect("Failed to create agents");

    if let Err(e) = manager.start_all().await {
        tracing::warn!(error = %e, "Some agents failed to start");
    }

    let health = manager.health().await;
    tracing::info!(
        running = health.running_agents,
        total = health.total_agents,
        "Teamforge ready; press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for shutdown signal");

    if let Err(e) = manager.shutdown().await {
        tracing::warn!(error = %e, "Shutdown finished with errors");
    }

    let stats = bus.get_statistics().await;
    tracing::info!(published = stats.published_total, "Teamforge stopped");
}
