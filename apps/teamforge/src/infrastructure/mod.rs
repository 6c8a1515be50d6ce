// Infrastructure layer module
// Contains collaborator adapters used by the binary and the tests
// Follows Hexagonal Architecture

pub mod repositories;
pub mod tracing_notifier;

pub use repositories::{InMemoryCandidateDirectory, InMemoryTeamRepository, StoredTeam};
pub use tracing_notifier::TracingNotifier;
