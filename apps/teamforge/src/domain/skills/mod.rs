// Skill domain module
// Canonical skill tables and the compatibility scoring engine

pub mod catalog;
pub mod scoring;

pub use catalog::SkillCatalog;
pub use scoring::MatchingCriteria;
