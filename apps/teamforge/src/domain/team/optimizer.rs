//! Genetic search for a high-fitness team
//!
//! The leader is fixed; a chromosome is the list of candidate-pool indices
//! filling the remaining seats. Chromosomes are kept sorted so that two
//! orderings of the same people compare equal.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use super::composition::{evaluate_team_composition, FormationGoals, TeamComposition};
use super::value_objects::{TeamMember, TeamRole};

pub const POPULATION_SIZE: usize = 20;
pub const GENERATIONS: usize = 10;
pub const MUTATION_RATE: f64 = 0.1;

type Chromosome = Vec<usize>;

/// GA hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerSettings {
    pub population_size: usize,
    pub generations: usize,
    pub mutation_rate: f64,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            population_size: POPULATION_SIZE,
            generations: GENERATIONS,
            mutation_rate: MUTATION_RATE,
        }
    }
}

/// Population-based search over subteams drawn from a candidate pool
///
/// Cost is bounded by `population_size × generations` fitness evaluations
/// plus one final pass over the last population. The search never
/// suspends; randomness comes from the caller so runs can be seeded.
#[derive(Debug, Clone, Default)]
pub struct GeneticOptimizer {
    settings: OptimizerSettings,
}

impl GeneticOptimizer {
    pub fn new(settings: OptimizerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    /// Runs the search and returns the best composition of the final population
    ///
    /// Returns `None` when the pool cannot fill `needed` seats.
    pub fn optimize<R: Rng + ?Sized>(
        &self,
        leader: &TeamMember,
        pool: &[TeamMember],
        needed: usize,
        goals: &FormationGoals,
        rng: &mut R,
    ) -> Option<TeamComposition> {
        if pool.len() < needed {
            return None;
        }

        let search = Search {
            leader,
            pool,
            needed,
            goals,
        };

        if needed == 0 {
            return Some(search.evaluate(&Vec::new()));
        }

        let population_size = self.settings.population_size.max(2);
        let mut population = search.initial_population(population_size, rng);

        for _ in 0..self.settings.generations {
            population =
                search.next_generation(population, population_size, self.settings.mutation_rate, rng);
        }

        population
            .iter()
            .map(|chromosome| search.evaluate(chromosome))
            .max_by(|a, b| {
                a.total_score
                    .partial_cmp(&b.total_score)
                    .unwrap_or(Ordering::Equal)
            })
    }
}

struct Search<'a> {
    leader: &'a TeamMember,
    pool: &'a [TeamMember],
    needed: usize,
    goals: &'a FormationGoals,
}

impl Search<'_> {
    fn evaluate(&self, chromosome: &Chromosome) -> TeamComposition {
        let mut leader = self.leader.clone();
        leader.role = TeamRole::Leader;

        let mut team = Vec::with_capacity(chromosome.len() + 1);
        team.push(leader);
        team.extend(chromosome.iter().map(|&i| {
            let mut member = self.pool[i].clone();
            member.role = TeamRole::Member;
            member
        }));

        evaluate_team_composition(&team, self.goals)
    }

    fn random_chromosome<R: Rng + ?Sized>(&self, rng: &mut R) -> Chromosome {
        let mut indices: Chromosome = (0..self.pool.len()).collect();
        indices.shuffle(rng);
        indices.truncate(self.needed);
        indices.sort_unstable();
        indices
    }

    /// Random distinct subteams; duplicates are accepted only once the pool
    /// is too small to yield enough distinct ones
    fn initial_population<R: Rng + ?Sized>(&self, size: usize, rng: &mut R) -> Vec<Chromosome> {
        let mut population: Vec<Chromosome> = Vec::with_capacity(size);
        let mut attempts = 0;
        while population.len() < size && attempts < size * 10 {
            attempts += 1;
            let chromosome = self.random_chromosome(rng);
            if !population.contains(&chromosome) {
                population.push(chromosome);
            }
        }
        while population.len() < size {
            population.push(self.random_chromosome(rng));
        }
        population
    }

    /// Keeps the fitter half, best first
    fn select(&self, population: Vec<Chromosome>, size: usize) -> Vec<Chromosome> {
        let mut scored: Vec<(Chromosome, f64)> = population
            .into_iter()
            .map(|chromosome| {
                let score = self.evaluate(&chromosome).total_score;
                (chromosome, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        scored.truncate((size / 2).max(1));
        scored.into_iter().map(|(chromosome, _)| chromosome).collect()
    }

    /// Survivors pass through unchanged; offspring of random survivor
    /// pairs fill the remaining slots
    fn next_generation<R: Rng + ?Sized>(
        &self,
        population: Vec<Chromosome>,
        size: usize,
        mutation_rate: f64,
        rng: &mut R,
    ) -> Vec<Chromosome> {
        let survivors = self.select(population, size);

        let mut next = survivors.clone();
        while next.len() < size {
            let a = &survivors[rng.gen_range(0..survivors.len())];
            let b = &survivors[rng.gen_range(0..survivors.len())];

            let mut child = self.crossover(a, b, rng);
            if rng.gen::<f64>() < mutation_rate {
                self.mutate(&mut child, rng);
            }
            child.sort_unstable();
            next.push(child);
        }
        next
    }

    fn crossover<R: Rng + ?Sized>(&self, a: &Chromosome, b: &Chromosome, rng: &mut R) -> Chromosome {
        let mut merged: Chromosome = a.iter().chain(b.iter()).copied().collect();
        merged.shuffle(rng);

        let mut child: Chromosome = Vec::with_capacity(self.needed);
        for index in merged {
            if child.len() == self.needed {
                break;
            }
            if !child.contains(&index) {
                child.push(index);
            }
        }

        if child.len() < self.needed {
            let mut unused = self.unused(&child);
            unused.shuffle(rng);
            let missing = self.needed - child.len();
            child.extend(unused.into_iter().take(missing));
        }
        child
    }

    fn mutate<R: Rng + ?Sized>(&self, child: &mut Chromosome, rng: &mut R) {
        let unused = self.unused(child);
        if child.is_empty() || unused.is_empty() {
            return;
        }
        let slot = rng.gen_range(0..child.len());
        if let Some(replacement) = unused.choose(rng) {
            child[slot] = *replacement;
        }
    }

    fn unused(&self, chromosome: &Chromosome) -> Chromosome {
        (0..self.pool.len())
            .filter(|i| !chromosome.contains(i))
            .collect()
    }
}
