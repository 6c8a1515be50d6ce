// Repository implementations (data access layer)
// In-memory adapters that implement the domain collaborator traits

pub mod memory_candidate_directory;
pub mod memory_team_repository;

pub use memory_candidate_directory::InMemoryCandidateDirectory;
pub use memory_team_repository::{InMemoryTeamRepository, StoredTeam};
