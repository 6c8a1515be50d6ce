use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::domain::user::Candidate;

/// Smallest team a formation request may ask for
pub const MIN_TEAM_SIZE: usize = 2;

/// Largest team a formation request may ask for
pub const MAX_TEAM_SIZE: usize = 6;

/// Role a participant holds inside a team
///
/// The requester of a formation is always the `Leader`; everybody the
/// optimizer picks joins as a `Member`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Leader,
    Member,
}

impl std::fmt::Display for TeamRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamRole::Leader => write!(f, "leader"),
            TeamRole::Member => write!(f, "member"),
        }
    }
}

/// Validated team size
///
/// # Invariants
/// - Always within `[MIN_TEAM_SIZE, MAX_TEAM_SIZE]`
///
/// # Example
/// ```
/// use teamforge::domain::team::value_objects::TeamSize;
///
/// assert!(TeamSize::new(4).is_ok());
/// assert!(TeamSize::new(8).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSize(usize);

impl TeamSize {
    /// Creates a team size, rejecting values outside the allowed range
    pub fn new(size: usize) -> Result<Self, String> {
        if (MIN_TEAM_SIZE..=MAX_TEAM_SIZE).contains(&size) {
            Ok(Self(size))
        } else {
            Err(format!(
                "Team size {} outside {}-{}",
                size, MIN_TEAM_SIZE, MAX_TEAM_SIZE
            ))
        }
    }

    /// Total number of seats including the leader
    pub fn get(&self) -> usize {
        self.0
    }

    /// Seats the optimizer has to fill (everyone except the leader)
    pub fn needed_members(&self) -> usize {
        self.0 - 1
    }
}

/// A participant placed in a candidate or final team
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub user_id: Uuid,
    pub name: String,
    pub skills: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub role: TeamRole,
    pub contribution_score: f64,
}

impl TeamMember {
    /// Builds a member from a candidate record
    pub fn from_candidate(candidate: &Candidate, role: TeamRole) -> Self {
        Self {
            user_id: candidate.user_id,
            name: candidate.name.clone(),
            skills: candidate.skills.clone(),
            interests: candidate.interests.clone(),
            role,
            contribution_score: 0.0,
        }
    }

    /// First whitespace-separated token of the display name, lowercased
    pub fn first_name(&self) -> String {
        self.name
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Existing team as seen by the suggestion engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSnapshot {
    pub team_id: Uuid,
    pub name: String,
    pub members: Vec<Candidate>,
}

impl TeamSnapshot {
    /// Union of every member's skills
    pub fn combined_skills(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|m| m.skills.iter().cloned())
            .collect()
    }

    /// Union of every member's interests
    pub fn combined_interests(&self) -> BTreeSet<String> {
        self.members
            .iter()
            .flat_map(|m| m.interests.iter().cloned())
            .collect()
    }
}
