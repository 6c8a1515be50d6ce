//! Resume text to structured profile data
//!
//! The parser is deliberately heuristic. It recognises:
//! - known skills (catalog canonical names and aliases) anywhere in the text
//! - comma separated entries on a `Skills:` line
//! - experience lines shaped like `Backend Engineer at Acme (3 years)`
//! - education lines containing a degree keyword, with an optional year

use async_trait::async_trait;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, warn};

use super::agent::{Agent, AgentCore};
use super::errors::AgentResult;
use crate::domain::skills::SkillCatalog;
use crate::domain::user::{Education, Experience, ParsedResume};
use crate::events::{EnvelopeField, Event, EventBus, EventPayload, EventType};

pub const PROFILE_PARSING_AGENT: &str = "profile-parsing";

/// Aliases shorter than this only count on an explicit skills line
const MIN_FREE_TEXT_TERM: usize = 3;

const SKILL_CHARS: &str = "a-z0-9+#";

/// Extracts skills, experience and education from plain resume text
pub struct ResumeParser {
    catalog: Arc<SkillCatalog>,
    terms: Vec<(Regex, String)>,
    skills_line: Regex,
    experience: Regex,
    degree: Regex,
    year: Regex,
}

impl ResumeParser {
    pub fn new(catalog: Arc<SkillCatalog>) -> AgentResult<Self> {
        let mut terms = Vec::new();
        for (term, canonical) in catalog.vocabulary() {
            if term.chars().count() < MIN_FREE_TEXT_TERM {
                continue;
            }
            let pattern = format!(
                r"(?i)(?:^|[^{chars}.]){}(?:$|[^{chars}])",
                regex::escape(&term),
                chars = SKILL_CHARS
            );
            terms.push((Regex::new(&pattern)?, canonical));
        }

        Ok(Self {
            catalog,
            terms,
            skills_line: Regex::new(r"(?im)^\s*(?:technical\s+)?skills\s*:\s*(?P<list>.+)$")?,
            experience: Regex::new(
                r"(?im)^[ \t]*[-*]?[ \t]*(?P<title>[^\n]+?)[ \t]+at[ \t]+(?P<company>[^\n(]+?)[ \t]*\([ \t]*(?P<years>\d{1,2})\+?[ \t]*(?:years?|yrs?)[ \t]*\)",
            )?,
            degree: Regex::new(
                r"(?i)\b(?:bachelor|master|ph\.?d|doctorate|mba|b\.?sc|m\.?sc|associate|diploma)",
            )?,
            year: Regex::new(r"\b(?:19|20)\d{2}\b")?,
        })
    }

    pub fn parse(&self, text: &str) -> ParsedResume {
        ParsedResume {
            skills: self.extract_skills(text),
            experience: self.extract_experience(text),
            education: self.extract_education(text),
        }
    }

    fn extract_skills(&self, text: &str) -> Vec<String> {
        let mut skills: BTreeSet<String> = self
            .terms
            .iter()
            .filter(|(pattern, _)| pattern.is_match(text))
            .map(|(_, canonical)| canonical.clone())
            .collect();

        for captures in self.skills_line.captures_iter(text) {
            let listed = captures["list"].split([',', ';', '|']);
            skills.extend(self.catalog.normalize_skills(listed));
        }

        skills.into_iter().collect()
    }

    fn extract_experience(&self, text: &str) -> Vec<Experience> {
        self.experience
            .captures_iter(text)
            .filter_map(|captures| {
                Some(Experience {
                    title: captures["title"].trim().to_string(),
                    company: captures["company"].trim().to_string(),
                    years: captures["years"].parse().ok()?,
                })
            })
            .collect()
    }

    fn extract_education(&self, text: &str) -> Vec<Education> {
        text.lines()
            .map(|line| line.trim().trim_start_matches(['-', '*']).trim())
            .filter(|line| self.degree.is_match(line) && !self.experience.is_match(line))
            .map(|line| {
                let year = self
                    .year
                    .find_iter(line)
                    .last()
                    .and_then(|m| m.as_str().parse().ok());
                let without_year = self.year.replace_all(line, "");
                let cleaned = without_year.trim_end_matches([' ', ',', '(', ')', '-']);

                let (degree, institution) = split_institution(cleaned);
                Education {
                    degree: degree.trim().to_string(),
                    institution: institution
                        .trim()
                        .trim_matches(['(', ')', ',', '-', ' '])
                        .to_string(),
                    year,
                }
            })
            .collect()
    }
}

fn split_institution(line: &str) -> (&str, &str) {
    for separator in [" from ", ", ", " - ", " at "] {
        if let Some(index) = line.find(separator) {
            return (&line[..index], &line[index + separator.len()..]);
        }
    }
    (line, "")
}

/// Turns uploaded resumes into `RESUME_PARSED` events
pub struct ProfileParsingAgent {
    core: AgentCore,
    parser: ResumeParser,
}

impl ProfileParsingAgent {
    pub fn new(bus: Arc<EventBus>, catalog: Arc<SkillCatalog>) -> AgentResult<Self> {
        Ok(Self {
            core: AgentCore::new(
                PROFILE_PARSING_AGENT,
                "Extracts skills, experience and education from uploaded resumes",
                bus,
            ),
            parser: ResumeParser::new(catalog)?,
        })
    }

    pub fn parser(&self) -> &ResumeParser {
        &self.parser
    }

    async fn process_upload(&self, event: &Event, file_name: &str, text: &str) -> AgentResult<()> {
        if !self.core.validate_payload(event, &[EnvelopeField::UserId]) {
            return Ok(());
        }

        let resume = self.parser.parse(text);
        let payload = if text.trim().is_empty() {
            warn!(file_name, event_id = %event.id, "Uploaded resume is empty");
            EventPayload::ResumeParsingFailed {
                reason: "Resume text is empty".to_string(),
            }
        } else if resume.is_empty() {
            warn!(file_name, event_id = %event.id, "Nothing recognisable in resume");
            EventPayload::ResumeParsingFailed {
                reason: "No skills, experience or education found".to_string(),
            }
        } else {
            info!(
                file_name,
                skills = resume.skills.len(),
                experience = resume.experience.len(),
                education = resume.education.len(),
                "Resume parsed"
            );
            EventPayload::ResumeParsed { resume }
        };

        let mut draft = self
            .core
            .event(payload)
            .correlation(event.correlation_id.unwrap_or(event.id));
        if let Some(user_id) = event.user_id {
            draft = draft.user(user_id);
        }
        if let Some(hackathon_id) = event.hackathon_id {
            draft = draft.hackathon(hackathon_id);
        }
        self.core.publish(draft).await?;
        Ok(())
    }
}

#[async_trait]
impl Agent for ProfileParsingAgent {
    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn subscribed_types(&self) -> &'static [EventType] {
        &[EventType::ResumeUploaded]
    }

    fn published_types(&self) -> &'static [EventType] {
        &[EventType::ResumeParsed, EventType::ResumeParsingFailed]
    }

    async fn handle(&self, event: &Event) -> AgentResult<()> {
        match &event.payload {
            EventPayload::ResumeUploaded { file_name, text } => {
                self.process_upload(event, file_name, text).await
            }
            EventPayload::AgentStarted { .. }
            | EventPayload::AgentStopped { .. }
            | EventPayload::ResumeParsed { .. }
            | EventPayload::ResumeParsingFailed { .. }
            | EventPayload::TeamSuggestionsRequested { .. }
            | EventPayload::TeamSuggestionsGenerated { .. }
            | EventPayload::TeamFormationRequested(_)
            | EventPayload::TeamFormed { .. }
            | EventPayload::TeamMemberAdded { .. }
            | EventPayload::NotificationSend { .. }
            | EventPayload::SystemError { .. } => Ok(()),
        }
    }
}
