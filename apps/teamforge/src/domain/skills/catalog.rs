use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Weight given to skills missing from the weight table
pub const DEFAULT_SKILL_WEIGHT: u32 = 3;

/// Upper bound of a skill weight; scoring normalizes against it
pub const MAX_SKILL_WEIGHT: u32 = 10;

/// A canonical skill and the aliases that resolve to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SynonymGroup {
    pub canonical: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A named group of skills used for diversity scoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillCategory {
    pub name: String,
    pub skills: Vec<String>,
}

/// A named work domain detected from keywords in job titles and companies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceDomain {
    pub name: String,
    pub keywords: Vec<String>,
}

/// Lookup tables driving skill normalization and scoring
///
/// The built-in tables are returned by `SkillCatalog::default()`. A JSON
/// document with the same shape replaces them at startup (see
/// `AppConfig::skill_catalog_path`).
///
/// Synonym groups are ordered: when a raw skill matches the aliases of
/// several groups, the first group wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillCatalog {
    #[serde(default = "default_weight")]
    pub default_weight: u32,
    #[serde(default)]
    pub weights: BTreeMap<String, u32>,
    #[serde(default)]
    pub synonyms: Vec<SynonymGroup>,
    #[serde(default)]
    pub categories: Vec<SkillCategory>,
    #[serde(default)]
    pub domains: Vec<ExperienceDomain>,
}

fn default_weight() -> u32 {
    DEFAULT_SKILL_WEIGHT
}

impl SkillCatalog {
    /// Parses a catalog from its JSON representation
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolves a raw skill to its canonical name.
    ///
    /// Matching is case-insensitive against synonym groups first, then
    /// against skills named in the weight and category tables, returning the
    /// catalog spelling. Unknown skills are returned trimmed but otherwise
    /// unchanged.
    pub fn canonical_skill(&self, raw: &str) -> String {
        let needle = raw.trim();
        if let Some(group) = self.synonyms.iter().find(|group| {
            group.canonical.eq_ignore_ascii_case(needle)
                || group.aliases.iter().any(|a| a.eq_ignore_ascii_case(needle))
        }) {
            return group.canonical.clone();
        }

        self.weights
            .keys()
            .chain(self.categories.iter().flat_map(|c| c.skills.iter()))
            .find(|name| name.eq_ignore_ascii_case(needle))
            .cloned()
            .unwrap_or_else(|| needle.to_string())
    }

    /// Normalizes a list of raw skills into a deduplicated canonical set
    ///
    /// # Example
    /// ```
    /// use teamforge::domain::skills::SkillCatalog;
    ///
    /// let catalog = SkillCatalog::default();
    /// let skills = catalog.normalize_skills(["JS", "js", "JavaScript"]);
    /// assert_eq!(skills.len(), 1);
    /// assert!(skills.contains("JavaScript"));
    /// ```
    pub fn normalize_skills<I, S>(&self, raw: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .filter(|s| !s.as_ref().trim().is_empty())
            .map(|s| self.canonical_skill(s.as_ref()))
            .collect()
    }

    /// Returns the weight of a canonical skill
    pub fn weight(&self, skill: &str) -> u32 {
        self.weights
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(skill))
            .map(|(_, weight)| (*weight).min(MAX_SKILL_WEIGHT))
            .unwrap_or(self.default_weight)
    }

    /// Names of every category containing the skill
    pub fn categories_of<'a>(&'a self, skill: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.categories
            .iter()
            .filter(move |c| c.skills.iter().any(|s| s.eq_ignore_ascii_case(skill)))
            .map(|c| c.name.as_str())
    }

    /// Total number of categories in the table
    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    /// First domain whose keyword appears in the text, if any
    pub fn domain_of(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.domains
            .iter()
            .find(|d| d.keywords.iter().any(|k| text.contains(&k.to_lowercase())))
            .map(|d| d.name.as_str())
    }

    /// Every canonical skill and alias, paired with its canonical name
    ///
    /// Used by the resume parser to spot known skills in free text.
    pub fn vocabulary(&self) -> Vec<(String, String)> {
        let mut vocabulary: Vec<(String, String)> = Vec::new();
        for group in &self.synonyms {
            vocabulary.push((group.canonical.clone(), group.canonical.clone()));
            for alias in &group.aliases {
                vocabulary.push((alias.clone(), group.canonical.clone()));
            }
        }
        for name in self.weights.keys() {
            if !vocabulary.iter().any(|(term, _)| term.eq_ignore_ascii_case(name)) {
                vocabulary.push((name.clone(), name.clone()));
            }
        }
        vocabulary
    }
}

fn groups(table: &[(&str, &[&str])]) -> Vec<(String, Vec<String>)> {
    table
        .iter()
        .map(|(name, items)| {
            (
                name.to_string(),
                items.iter().map(|s| s.to_string()).collect(),
            )
        })
        .collect()
}

impl Default for SkillCatalog {
    fn default() -> Self {
        let weights = [
            ("JavaScript", 8),
            ("TypeScript", 8),
            ("Python", 9),
            ("Java", 7),
            ("C++", 7),
            ("Go", 7),
            ("Rust", 8),
            ("React", 8),
            ("Vue", 7),
            ("Angular", 6),
            ("Node.js", 8),
            ("Django", 6),
            ("Flask", 5),
            ("Spring", 6),
            ("SQL", 7),
            ("PostgreSQL", 6),
            ("MongoDB", 6),
            ("Docker", 7),
            ("Kubernetes", 7),
            ("AWS", 8),
            ("Machine Learning", 9),
            ("Data Science", 8),
            ("TensorFlow", 7),
            ("PyTorch", 7),
            ("UI/UX Design", 8),
            ("Figma", 6),
            ("Swift", 7),
            ("Kotlin", 7),
            ("Flutter", 6),
            ("Blockchain", 6),
            ("Git", 4),
            ("Project Management", 6),
        ]
        .into_iter()
        .map(|(name, weight)| (name.to_string(), weight))
        .collect();

        let synonyms = groups(&[
            ("JavaScript", &["js", "ecmascript", "es6"]),
            ("TypeScript", &["ts"]),
            ("Python", &["py", "python3"]),
            ("C++", &["cpp", "c plus plus"]),
            ("Go", &["golang"]),
            ("Node.js", &["node", "nodejs", "node js"]),
            ("React", &["reactjs", "react.js"]),
            ("Vue", &["vuejs", "vue.js"]),
            ("Angular", &["angularjs"]),
            ("PostgreSQL", &["postgres", "psql"]),
            ("MongoDB", &["mongo"]),
            ("Kubernetes", &["k8s"]),
            ("AWS", &["amazon web services"]),
            ("Machine Learning", &["ml"]),
            ("Data Science", &["data analysis"]),
            ("UI/UX Design", &["ui", "ux", "ui design", "ux design", "ui/ux"]),
            ("Project Management", &["pm"]),
        ])
        .into_iter()
        .map(|(canonical, aliases)| SynonymGroup { canonical, aliases })
        .collect();

        let categories = groups(&[
            (
                "frontend",
                &["JavaScript", "TypeScript", "React", "Vue", "Angular", "HTML", "CSS"],
            ),
            (
                "backend",
                &["Node.js", "Python", "Java", "Go", "Rust", "C++", "Django", "Flask", "Spring"],
            ),
            (
                "data",
                &["SQL", "PostgreSQL", "MongoDB", "Machine Learning", "Data Science", "TensorFlow", "PyTorch"],
            ),
            ("devops", &["Docker", "Kubernetes", "AWS", "Git"]),
            ("mobile", &["Swift", "Kotlin", "Flutter"]),
            ("design", &["UI/UX Design", "Figma"]),
            ("management", &["Project Management"]),
            ("web3", &["Blockchain"]),
        ])
        .into_iter()
        .map(|(name, skills)| SkillCategory { name, skills })
        .collect();

        let domains = groups(&[
            ("web", &["web", "frontend", "backend", "full stack", "fullstack"]),
            ("data", &["data", "analytics", "machine learning", "scientist"]),
            ("mobile", &["mobile", "ios", "android"]),
            ("finance", &["bank", "finance", "fintech", "trading"]),
            ("healthcare", &["health", "medical", "clinic", "hospital"]),
            ("research", &["research", "university", "lab"]),
            ("security", &["security", "pentest"]),
            ("games", &["game"]),
            ("design", &["design", "ux", "product"]),
        ])
        .into_iter()
        .map(|(name, keywords)| ExperienceDomain { name, keywords })
        .collect();

        Self {
            default_weight: DEFAULT_SKILL_WEIGHT,
            weights,
            synonyms,
            categories,
            domains,
        }
    }
}
