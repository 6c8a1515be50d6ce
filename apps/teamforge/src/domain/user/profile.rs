use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// One entry of a user's work history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub years: u32,
}

/// One entry of a user's education history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub degree: String,
    pub institution: String,
    pub year: Option<u32>,
}

/// Structured view of a participant used by every scoring function
///
/// Skills are expected to be canonical (see `SkillCatalog::normalize_skills`)
/// before a profile is scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SkillProfile {
    pub user_id: Uuid,
    pub skills: BTreeSet<String>,
    pub interests: BTreeSet<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
}

impl SkillProfile {
    /// Creates an empty profile for a user
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            ..Default::default()
        }
    }

    /// Builder-style helper for skills
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Builder-style helper for interests
    pub fn with_interests<I, S>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    /// Merges freshly parsed resume data into this profile.
    ///
    /// Skills and interests are unioned; experience and education entries
    /// are appended unless an identical entry already exists.
    pub fn merge(&mut self, other: &SkillProfile) {
        self.skills.extend(other.skills.iter().cloned());
        self.interests.extend(other.interests.iter().cloned());
        for entry in &other.experience {
            if !self.experience.contains(entry) {
                self.experience.push(entry.clone());
            }
        }
        for entry in &other.education {
            if !self.education.contains(entry) {
                self.education.push(entry.clone());
            }
        }
    }
}

/// Lightweight participant record returned by candidate lookups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub user_id: Uuid,
    pub name: String,
    pub skills: BTreeSet<String>,
    pub interests: BTreeSet<String>,
}

impl Candidate {
    /// Scoring view of the candidate; experience and education are unknown
    pub fn to_profile(&self) -> SkillProfile {
        SkillProfile {
            user_id: self.user_id,
            skills: self.skills.clone(),
            interests: self.interests.clone(),
            experience: Vec::new(),
            education: Vec::new(),
        }
    }
}

/// Output of the resume parser: what could be extracted from raw text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub skills: Vec<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
}

impl ParsedResume {
    /// True when the parser found nothing usable
    pub fn is_empty(&self) -> bool {
        self.skills.is_empty() && self.experience.is_empty() && self.education.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_unions_skills_and_dedupes_entries() {
        let user_id = Uuid::new_v4();
        let job = Experience {
            title: "Engineer".to_string(),
            company: "Acme".to_string(),
            years: 2,
        };

        let mut stored = SkillProfile::new(user_id).with_skills(["Rust"]);
        stored.experience.push(job.clone());

        let mut parsed = SkillProfile::new(user_id).with_skills(["Rust", "Python"]);
        parsed.experience.push(job);

        stored.merge(&parsed);

        assert_eq!(stored.skills.len(), 2);
        assert_eq!(stored.experience.len(), 1);
    }

    #[test]
    fn empty_parsed_resume() {
        assert!(ParsedResume::default().is_empty());
    }
}
