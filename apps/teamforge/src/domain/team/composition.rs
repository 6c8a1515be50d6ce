use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::value_objects::TeamMember;

const COVERAGE_WEIGHT: f64 = 0.4;
const DIVERSITY_WEIGHT: f64 = 0.3;
const COMPATIBILITY_WEIGHT: f64 = 0.3;

const REQUIRED_POINTS: f64 = 10.0;
const PREFERRED_POINTS: f64 = 5.0;
const BREADTH_POINTS_PER_SKILL: f64 = 0.5;
const BREADTH_CAP: f64 = 10.0;

/// Skill goals a composition is measured against
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormationGoals {
    pub required_skills: BTreeSet<String>,
    pub preferred_skills: BTreeSet<String>,
}

/// A scored team: leader first, then the members picked by the optimizer
///
/// All scores are in `[0, 1]`. The value is computed on demand and never
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamComposition {
    pub members: Vec<TeamMember>,
    pub skill_coverage: f64,
    pub diversity_score: f64,
    pub compatibility_score: f64,
    pub total_score: f64,
}

fn lowercase(items: &BTreeSet<String>) -> BTreeSet<String> {
    items.iter().map(|s| s.trim().to_lowercase()).collect()
}

/// Scores a full team (leader included) as the GA fitness function
///
/// `total = 0.4 × skill coverage + 0.3 × diversity + 0.3 × compatibility`
pub fn evaluate_team_composition(members: &[TeamMember], goals: &FormationGoals) -> TeamComposition {
    let skill_coverage = skill_coverage(members, goals);
    let diversity_score = diversity_score(members);
    let compatibility_score = compatibility_score(members);

    let total_score = (COVERAGE_WEIGHT * skill_coverage
        + DIVERSITY_WEIGHT * diversity_score
        + COMPATIBILITY_WEIGHT * compatibility_score)
        .clamp(0.0, 1.0);

    TeamComposition {
        members: with_contributions(members),
        skill_coverage,
        diversity_score,
        compatibility_score,
        total_score,
    }
}

fn skill_coverage(members: &[TeamMember], goals: &FormationGoals) -> f64 {
    let team_skills: BTreeSet<String> = members.iter().flat_map(|m| lowercase(&m.skills)).collect();

    let mut score = 0.0;
    let mut max_score = 0.0;

    for skill in lowercase(&goals.required_skills) {
        if team_skills.contains(&skill) {
            score += REQUIRED_POINTS;
        }
        max_score += REQUIRED_POINTS;
    }

    for skill in lowercase(&goals.preferred_skills) {
        if team_skills.contains(&skill) {
            score += PREFERRED_POINTS;
        }
        max_score += PREFERRED_POINTS;
    }

    score += (team_skills.len() as f64 * BREADTH_POINTS_PER_SKILL).min(BREADTH_CAP);
    max_score += BREADTH_CAP;

    if max_score == 0.0 {
        return 0.0;
    }
    score / max_score
}

fn unique_ratio<I>(items: I) -> f64
where
    I: IntoIterator<Item = String>,
{
    let all: Vec<String> = items.into_iter().collect();
    if all.is_empty() {
        return 0.0;
    }
    let unique: BTreeSet<&String> = all.iter().collect();
    unique.len() as f64 / all.len() as f64
}

fn diversity_score(members: &[TeamMember]) -> f64 {
    if members.len() <= 1 {
        return 0.0;
    }

    let skills = unique_ratio(members.iter().flat_map(|m| lowercase(&m.skills)));
    let interests = unique_ratio(members.iter().flat_map(|m| lowercase(&m.interests)));
    let names = unique_ratio(members.iter().map(TeamMember::first_name));

    (0.4 * skills + 0.3 * interests + 0.3 * names).min(1.0)
}

fn compatibility_score(members: &[TeamMember]) -> f64 {
    if members.len() <= 1 {
        return 1.0;
    }

    let mut total = 0.0;
    let mut pairs = 0usize;
    for (i, a) in members.iter().enumerate() {
        for b in &members[i + 1..] {
            let common_interests = lowercase(&a.interests).intersection(&lowercase(&b.interests)).count();
            let common_skills = lowercase(&a.skills).intersection(&lowercase(&b.skills)).count();

            let interest_score = (common_interests as f64 * 0.2).min(1.0);
            let complement_score = (1.0 - 0.1 * common_skills as f64).max(0.0);
            total += (interest_score + complement_score) / 2.0;
            pairs += 1;
        }
    }

    total / pairs as f64
}

/// Share of the team's unique skills that only this member brings
fn with_contributions(members: &[TeamMember]) -> Vec<TeamMember> {
    let team_unique: BTreeSet<String> = members.iter().flat_map(|m| lowercase(&m.skills)).collect();

    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let others: BTreeSet<String> = members
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .flat_map(|(_, m)| lowercase(&m.skills))
                .collect();
            let exclusive = lowercase(&member.skills).difference(&others).count();

            let mut member = member.clone();
            member.contribution_score = if team_unique.is_empty() {
                0.0
            } else {
                exclusive as f64 / team_unique.len() as f64
            };
            member
        })
        .collect()
}
