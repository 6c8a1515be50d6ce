// User domain module
// Participant profiles as consumed by the matching engine

pub mod profile;

pub use profile::{Candidate, Education, Experience, ParsedResume, SkillProfile};
