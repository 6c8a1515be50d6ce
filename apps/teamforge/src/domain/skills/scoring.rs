//! Pairwise compatibility scoring
//!
//! Every function here is pure and returns a score in `[0, 1]` unless noted
//! otherwise. Skill sets are expected to be canonical already.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::catalog::{SkillCatalog, MAX_SKILL_WEIGHT};
use crate::domain::team::value_objects::{TeamSnapshot, MAX_TEAM_SIZE};
use crate::domain::user::{Education, Experience, SkillProfile};

const SKILL_WEIGHT: f64 = 0.4;
const INTEREST_WEIGHT: f64 = 0.2;
const EXPERIENCE_WEIGHT: f64 = 0.25;
const DIVERSITY_WEIGHT: f64 = 0.15;

const REQUIRED_SKILL_POINTS: f64 = 15.0;
const OVERLAP_POINTS: f64 = 2.0;
const OVERLAP_CAP: usize = 3;

/// Score returned when one side has nothing to compare
pub const NEUTRAL_SCORE: f64 = 0.5;

/// What a requester is looking for when asking for suggestions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchingCriteria {
    pub user_id: Uuid,
    pub hackathon_id: Option<Uuid>,
    #[serde(default)]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub preferred_skills: Vec<String>,
    pub team_size: usize,
    #[serde(default)]
    pub exclude_team_ids: Vec<Uuid>,
}

fn lowercase_set(items: &BTreeSet<String>) -> BTreeSet<String> {
    items
        .iter()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Complementarity of two skill sets, with coverage of required skills
///
/// - each skill held by only one side earns `weight × 0.1` out of `1.0`
/// - each required skill covered by either side earns `15` out of `15`
/// - up to three shared skills earn a `+2` bonus each
pub fn skill_compatibility(
    catalog: &SkillCatalog,
    a: &BTreeSet<String>,
    b: &BTreeSet<String>,
    required: &BTreeSet<String>,
) -> f64 {
    let mut score = 0.0;
    let mut max_score = 0.0;

    let shared: BTreeSet<&String> = a.intersection(b).collect();
    let union: BTreeSet<&String> = a.union(b).collect();

    for skill in union.iter().filter(|s| !shared.contains(*s)) {
        score += f64::from(catalog.weight(skill)) * 0.1;
        max_score += f64::from(MAX_SKILL_WEIGHT) * 0.1;
    }

    for skill in required {
        if union.contains(skill) {
            score += REQUIRED_SKILL_POINTS;
        }
        max_score += REQUIRED_SKILL_POINTS;
    }

    score += shared.len().min(OVERLAP_CAP) as f64 * OVERLAP_POINTS;

    if max_score == 0.0 {
        return 0.0;
    }
    (score / max_score).clamp(0.0, 1.0)
}

/// Jaccard similarity of two interest sets with a small bonus per shared interest
pub fn interest_alignment(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return NEUTRAL_SCORE;
    }

    let a = lowercase_set(a);
    let b = lowercase_set(b);
    let common = a.intersection(&b).count();
    let union = a.union(&b).count();
    if union == 0 {
        return NEUTRAL_SCORE;
    }

    let jaccard = common as f64 / union as f64;
    let bonus = (common as f64 * 0.1).min(0.3);
    (jaccard + bonus).min(1.0)
}

/// Rewards pairs whose work history spans many domains
///
/// Each entry is tagged with the first catalog domain matching its title or
/// company (`general` otherwise); the score is unique tags over entries.
pub fn experience_compatibility(
    catalog: &SkillCatalog,
    a: &[Experience],
    b: &[Experience],
) -> f64 {
    if a.is_empty() || b.is_empty() {
        return NEUTRAL_SCORE;
    }

    let domains: BTreeSet<&str> = a
        .iter()
        .chain(b.iter())
        .map(|e| {
            catalog
                .domain_of(&format!("{} {}", e.title, e.company))
                .unwrap_or("general")
        })
        .collect();

    let total = a.len() + b.len();
    (domains.len() as f64 / total as f64).min(1.0)
}

fn degrees_overlap(a: &[Education], b: &[Education]) -> bool {
    a.iter().any(|x| {
        let x = x.degree.to_lowercase();
        b.iter().any(|y| {
            let y = y.degree.to_lowercase();
            x.contains(&y) || y.contains(&x)
        })
    })
}

/// Bonus for different educational backgrounds and broad category coverage
pub fn diversity_bonus(catalog: &SkillCatalog, a: &SkillProfile, b: &SkillProfile) -> f64 {
    let mut bonus = 0.0;

    if !a.education.is_empty()
        && !b.education.is_empty()
        && !degrees_overlap(&a.education, &b.education)
    {
        bonus += 0.3;
    }

    let total_categories = catalog.category_count();
    if total_categories > 0 {
        let covered: BTreeSet<&str> = a
            .skills
            .iter()
            .chain(b.skills.iter())
            .flat_map(|skill| catalog.categories_of(skill))
            .collect();
        bonus += 0.7 * (covered.len() as f64 / total_categories as f64);
    }

    bonus.min(1.0)
}

/// Overall pairwise score used to rank individual suggestions
pub fn compatibility_score(
    catalog: &SkillCatalog,
    user: &SkillProfile,
    other: &SkillProfile,
    criteria: &MatchingCriteria,
) -> f64 {
    let required = catalog.normalize_skills(&criteria.required_skills);

    let skill = skill_compatibility(catalog, &user.skills, &other.skills, &required);
    let interest = interest_alignment(&user.interests, &other.interests);
    let experience = experience_compatibility(catalog, &user.experience, &other.experience);
    let diversity = diversity_bonus(catalog, user, other);

    SKILL_WEIGHT * skill
        + INTEREST_WEIGHT * interest
        + EXPERIENCE_WEIGHT * experience
        + DIVERSITY_WEIGHT * diversity
}

/// How well a user would fit into an existing team
///
/// The weighted sum is divided by three on top of its weights; the result
/// is therefore not bounded by one for users bringing many new skills.
/// Member skills are normalized before being compared with the user's.
pub fn team_compatibility(catalog: &SkillCatalog, user: &SkillProfile, team: &TeamSnapshot) -> f64 {
    let team_skills = catalog.normalize_skills(team.combined_skills());
    let unique_contribution = user.skills.difference(&team_skills).count() as f64;
    let interests = interest_alignment(&user.interests, &team.combined_interests());

    let capacity = MAX_TEAM_SIZE as f64;
    let slack = ((capacity - team.members.len() as f64) / capacity).max(0.0);

    (unique_contribution * 0.1 + interests * 0.4 + slack * 0.5) / 3.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::user::Candidate;

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_skills_and_requirements_score_zero() {
        let catalog = SkillCatalog::default();
        let empty = BTreeSet::new();

        assert_eq!(skill_compatibility(&catalog, &empty, &empty, &empty), 0.0);
    }

    #[test]
    fn skill_compatibility_stays_in_unit_interval() {
        let catalog = SkillCatalog::default();
        let cases = [
            (set(&["Rust"]), set(&["Rust"]), set(&[])),
            (set(&["Rust", "Go", "SQL"]), set(&["Rust", "Go", "SQL"]), set(&[])),
            (set(&["Python"]), set(&["React"]), set(&["Python", "React"])),
            (set(&[]), set(&["COBOL"]), set(&["Rust"])),
        ];

        for (a, b, required) in cases {
            let score = skill_compatibility(&catalog, &a, &b, &required);
            assert!((0.0..=1.0).contains(&score), "score {} out of range", score);
        }
    }

    #[test]
    fn complementary_skills_use_weights() {
        let catalog = SkillCatalog::default();
        // Python (9) and React (8) are both unshared: (0.9 + 0.8) / 2.0
        let score = skill_compatibility(&catalog, &set(&["Python"]), &set(&["React"]), &set(&[]));

        assert!((score - 0.85).abs() < 1e-9);
    }

    #[test]
    fn required_skills_covered_by_union() {
        let catalog = SkillCatalog::default();
        let required = set(&["Python", "React"]);

        let full = skill_compatibility(&catalog, &set(&["Python"]), &set(&["React"]), &required);
        let half = skill_compatibility(&catalog, &set(&["Python"]), &set(&["Python"]), &required);

        assert!(full > half);
    }

    #[test]
    fn interest_alignment_is_neutral_without_data() {
        assert_eq!(interest_alignment(&set(&[]), &set(&["ai"])), NEUTRAL_SCORE);
    }

    #[test]
    fn interest_alignment_is_case_insensitive() {
        // jaccard 1/1 plus 0.1 bonus, clamped
        assert_eq!(interest_alignment(&set(&["AI "]), &set(&["ai"])), 1.0);

        // jaccard 1/3 plus 0.1
        let score = interest_alignment(&set(&["ai", "web"]), &set(&["ai", "games"]));
        assert!((score - (1.0 / 3.0 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn experience_rewards_domain_diversity() {
        let catalog = SkillCatalog::default();
        let job = |title: &str| Experience {
            title: title.to_string(),
            company: "Co".to_string(),
            years: 1,
        };

        let same = experience_compatibility(&catalog, &[job("Web Developer")], &[job("Frontend Engineer")]);
        let varied = experience_compatibility(&catalog, &[job("Web Developer")], &[job("Android Engineer")]);

        assert_eq!(same, 0.5);
        assert_eq!(varied, 1.0);
        assert_eq!(experience_compatibility(&catalog, &[], &[job("x")]), NEUTRAL_SCORE);
    }

    #[test]
    fn diversity_bonus_for_distinct_degrees() {
        let catalog = SkillCatalog::default();
        let degree = |d: &str| Education {
            degree: d.to_string(),
            institution: "Uni".to_string(),
            year: None,
        };

        let mut a = SkillProfile::new(Uuid::new_v4());
        let mut b = SkillProfile::new(Uuid::new_v4());
        a.education.push(degree("BSc Computer Science"));
        b.education.push(degree("MA Fine Arts"));

        assert!((diversity_bonus(&catalog, &a, &b) - 0.3).abs() < 1e-9);

        b.education = vec![degree("Computer Science")];
        assert_eq!(diversity_bonus(&catalog, &a, &b), 0.0);
    }

    #[test]
    fn diversity_bonus_counts_categories() {
        let catalog = SkillCatalog::default();
        let a = SkillProfile::new(Uuid::new_v4()).with_skills(["React"]);
        let b = SkillProfile::new(Uuid::new_v4()).with_skills(["Docker"]);

        let expected = 0.7 * 2.0 / catalog.category_count() as f64;
        assert!((diversity_bonus(&catalog, &a, &b) - expected).abs() < 1e-9);
    }

    #[test]
    fn compatibility_score_weights_sum_to_one() {
        assert!((SKILL_WEIGHT + INTEREST_WEIGHT + EXPERIENCE_WEIGHT + DIVERSITY_WEIGHT - 1.0).abs() < 1e-9);
    }

    #[test]
    fn compatibility_score_of_empty_profiles() {
        let catalog = SkillCatalog::default();
        let a = SkillProfile::new(Uuid::new_v4());
        let b = SkillProfile::new(Uuid::new_v4());
        let criteria = MatchingCriteria::default();

        // skill 0, interest 0.5, experience 0.5, diversity 0
        let score = compatibility_score(&catalog, &a, &b, &criteria);
        assert!((score - (0.2 * 0.5 + 0.25 * 0.5)).abs() < 1e-9);
    }

    #[test]
    fn lowercase_required_skill_is_covered_after_normalization() {
        let catalog = SkillCatalog::default();
        let a = set(&["Rust"]);
        let b = set(&["Go"]);
        let required = catalog.normalize_skills(["rust"]);

        // Rust 0.8 + Go 0.7 + required 15, out of 1 + 1 + 15
        let expected = (0.8 + 0.7 + 15.0) / 17.0;
        assert!((skill_compatibility(&catalog, &a, &b, &required) - expected).abs() < 1e-9);
    }

    #[test]
    fn team_compatibility_ignores_alias_spelling_of_member_skills() {
        let catalog = SkillCatalog::default();
        let user = SkillProfile::new(Uuid::new_v4()).with_skills(catalog.normalize_skills(["js"]));
        let team_with = |skill: &str| TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Scripters".to_string(),
            members: vec![Candidate {
                user_id: Uuid::new_v4(),
                name: "Brendan".to_string(),
                skills: set(&[skill]),
                interests: set(&[]),
            }],
        };

        let alias = team_compatibility(&catalog, &user, &team_with("js"));
        let canonical = team_compatibility(&catalog, &user, &team_with("JavaScript"));

        assert!((alias - canonical).abs() < 1e-9);
        // no new skill, neutral interests, five free seats of six
        let expected = (0.5 * 0.4 + (5.0 / 6.0) * 0.5) / 3.0;
        assert!((alias - expected).abs() < 1e-9);
    }

    #[test]
    fn team_compatibility_keeps_triple_normalization() {
        let catalog = SkillCatalog::default();
        let user = SkillProfile::new(Uuid::new_v4()).with_skills(["Rust", "Go"]);
        let team = TeamSnapshot {
            team_id: Uuid::new_v4(),
            name: "Crabs".to_string(),
            members: vec![Candidate {
                user_id: Uuid::new_v4(),
                name: "Ferris".to_string(),
                skills: set(&["Rust"]),
                interests: set(&[]),
            }],
        };

        // one new skill, neutral interests, five free seats of six
        let expected = (0.1 + 0.5 * 0.4 + (5.0 / 6.0) * 0.5) / 3.0;
        assert!((team_compatibility(&catalog, &user, &team) - expected).abs() < 1e-9);
    }
}
