// Team domain module
// Contains team value objects, composition fitness, and the genetic optimizer

pub mod composition;
pub mod optimizer;
pub mod value_objects;

// Re-export main types for convenience
pub use composition::{evaluate_team_composition, FormationGoals, TeamComposition};
pub use optimizer::{GeneticOptimizer, OptimizerSettings};
pub use value_objects::{TeamMember, TeamRole, TeamSize, TeamSnapshot, MAX_TEAM_SIZE, MIN_TEAM_SIZE};
