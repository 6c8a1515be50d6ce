// Repository traits (ports)
// Collaborators the agents depend on; adapters live in infrastructure

pub mod candidate_directory;
pub mod notifier;
pub mod team_repository;

pub use candidate_directory::{CandidateDirectory, CandidateFilters, UserProfileRecord};
pub use notifier::Notifier;
pub use team_repository::TeamRepository;
