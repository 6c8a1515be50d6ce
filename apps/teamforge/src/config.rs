//! Environment-driven configuration
//!
//! Every setting has a default; a variable that is set but malformed is an
//! error rather than being silently ignored.

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::agents::{FormationSettings, MatchingSettings};
use crate::domain::skills::SkillCatalog;
use crate::domain::team::OptimizerSettings;
use crate::events::BusConfig;

pub const HISTORY_CAPACITY_VAR: &str = "TEAMFORGE_HISTORY_CAPACITY";
pub const GA_POPULATION_VAR: &str = "TEAMFORGE_GA_POPULATION";
pub const GA_GENERATIONS_VAR: &str = "TEAMFORGE_GA_GENERATIONS";
pub const GA_MUTATION_RATE_VAR: &str = "TEAMFORGE_GA_MUTATION_RATE";
pub const GA_SEED_VAR: &str = "TEAMFORGE_GA_SEED";
pub const AUTO_FORM_THRESHOLD_VAR: &str = "TEAMFORGE_AUTO_FORM_THRESHOLD";
pub const CANDIDATE_POOL_LIMIT_VAR: &str = "TEAMFORGE_CANDIDATE_POOL_LIMIT";
pub const SKILL_CATALOG_VAR: &str = "TEAMFORGE_SKILL_CATALOG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Failed to read skill catalog {path}: {source}")]
    CatalogRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse skill catalog {path}: {source}")]
    CatalogParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Runtime configuration of the bus, the optimizer and the agents
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub bus: BusConfig,
    pub optimizer: OptimizerSettings,
    /// Fixed seed for the team search; entropy is used when absent
    pub rng_seed: Option<u64>,
    pub matching: MatchingSettings,
    pub formation: FormationSettings,
    /// JSON file replacing the built-in skill tables
    pub skill_catalog_path: Option<PathBuf>,
}

fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

fn check_unit_interval(key: &'static str, value: f64) -> Result<f64, ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be between 0 and 1".to_string(),
        })
    }
}

fn check_positive(key: &'static str, value: usize) -> Result<usize, ConfigError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "must be greater than 0".to_string(),
        })
    }
}

impl AppConfig {
    /// Loads `.env` (when present) and reads the process environment
    ///
    /// # Environment Variables
    /// - `TEAMFORGE_HISTORY_CAPACITY`: events kept in bus history (default: 10000)
    /// - `TEAMFORGE_GA_POPULATION`: optimizer population (default: 20)
    /// - `TEAMFORGE_GA_GENERATIONS`: optimizer generations (default: 10)
    /// - `TEAMFORGE_GA_MUTATION_RATE`: mutation probability (default: 0.1)
    /// - `TEAMFORGE_GA_SEED`: fixed RNG seed (default: unset)
    /// - `TEAMFORGE_AUTO_FORM_THRESHOLD`: minimum score to form a team (default: 0.5)
    /// - `TEAMFORGE_CANDIDATE_POOL_LIMIT`: candidates fetched per request (default: 50)
    /// - `TEAMFORGE_SKILL_CATALOG`: path to a JSON skill catalog (default: built-in)
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(capacity) = parse_var(&lookup, HISTORY_CAPACITY_VAR)? {
            config.bus.history_capacity = check_positive(HISTORY_CAPACITY_VAR, capacity)?;
        }
        if let Some(population) = parse_var(&lookup, GA_POPULATION_VAR)? {
            config.optimizer.population_size = check_positive(GA_POPULATION_VAR, population)?;
        }
        if let Some(generations) = parse_var(&lookup, GA_GENERATIONS_VAR)? {
            config.optimizer.generations = generations;
        }
        if let Some(rate) = parse_var(&lookup, GA_MUTATION_RATE_VAR)? {
            config.optimizer.mutation_rate = check_unit_interval(GA_MUTATION_RATE_VAR, rate)?;
        }
        config.rng_seed = parse_var(&lookup, GA_SEED_VAR)?;
        if let Some(threshold) = parse_var(&lookup, AUTO_FORM_THRESHOLD_VAR)? {
            config.formation.auto_form_threshold =
                check_unit_interval(AUTO_FORM_THRESHOLD_VAR, threshold)?;
        }
        if let Some(limit) = parse_var(&lookup, CANDIDATE_POOL_LIMIT_VAR)? {
            let limit = check_positive(CANDIDATE_POOL_LIMIT_VAR, limit)?;
            config.matching.candidate_pool_limit = limit;
            config.formation.candidate_pool_limit = limit;
        }
        config.skill_catalog_path = lookup(SKILL_CATALOG_VAR)
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    /// The configured skill catalog, or the built-in one
    pub fn load_catalog(&self) -> Result<SkillCatalog, ConfigError> {
        let Some(path) = &self.skill_catalog_path else {
            return Ok(SkillCatalog::default());
        };

        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogRead {
            path: path.clone(),
            source,
        })?;
        SkillCatalog::from_json_str(&json).map_err(|source| ConfigError::CatalogParse {
            path: path.clone(),
            source,
        })
    }
}
