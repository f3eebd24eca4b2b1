//! Configuration types for mockprep-core.
//!
//! This module defines [`EngineConfig`] (CLI-level paths and overrides) and
//! [`InterviewConfig`] (templates and defaults, from `<data-dir>/config.yaml`
//! or the built-in configuration). The interview configuration is loaded once
//! per process and never mutated afterwards.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, de};
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

use crate::error::CoreError;

const BUILTIN_CONFIG: &str = include_str!("../config/default.yaml");

// ── Engine Configuration (CLI-level) ─────────────────────────

/// Engine configuration provided by the CLI layer.
///
/// Holds the data directory that contains the session file, the optional
/// `config.yaml` and the prompt override directory. An explicit config file
/// replaces `<data-dir>/config.yaml`.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use mockprep_core::EngineConfig;
///
/// let config = EngineConfig::builder()
///     .data_dir("/tmp/mockprep")
///     .config_file("/etc/mockprep/interviews.yaml")
///     .build();
///
/// assert_eq!(config.sessions_path(), PathBuf::from("/tmp/mockprep/sessions.json"));
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
pub struct EngineConfig {
    /// Directory holding sessions, configuration and logs.
    #[builder(setter(into))]
    data_dir: PathBuf,

    /// Explicit configuration file (takes precedence over `<data-dir>/config.yaml`).
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    config_file: Option<PathBuf>,

    /// Directory of prompt template overrides (defaults to `<data-dir>/prompts`).
    #[builder(default, setter(strip_option, into))]
    #[serde(skip_serializing_if = "Option::is_none")]
    prompts_dir: Option<PathBuf>,
}

impl EngineConfig {
    /// Returns the data directory.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Returns the explicit configuration file, if set.
    pub fn config_file(&self) -> Option<&Path> {
        self.config_file.as_deref()
    }

    /// Returns the configuration file path that will be read.
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join("config.yaml"))
    }

    /// Returns the path of the session store file.
    pub fn sessions_path(&self) -> PathBuf {
        self.data_dir.join("sessions.json")
    }

    /// Returns the log directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    /// Returns the prompt override directory.
    pub fn prompts_dir(&self) -> PathBuf {
        self.prompts_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("prompts"))
    }
}

// ── Enumerations ─────────────────────────────────────────────

/// Candidate seniority tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Junior,
    Middle,
    Senior,
}

impl Level {
    /// All levels in ascending order.
    pub const ALL: [Level; 3] = [Level::Junior, Level::Middle, Level::Senior];

    /// Returns the serialized name of this level.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Junior => "junior",
            Self::Middle => "middle",
            Self::Senior => "senior",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| CoreError::InvalidLevel(s.to_owned()))
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// Output shape requested from the consumer of the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ask the question, withhold the answer and wait for the candidate.
    Simulation,
    /// Question and answer in the same response.
    Direct,
}

impl Mode {
    /// Returns the mode matching a simulation flag.
    pub fn from_simulation(simulation: bool) -> Self {
        if simulation {
            Self::Simulation
        } else {
            Self::Direct
        }
    }
}

impl FromStr for Mode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simulation" => Ok(Self::Simulation),
            "direct" => Ok(Self::Direct),
            _ => Err(CoreError::InvalidMode(s.to_owned())),
        }
    }
}

impl<'de> Deserialize<'de> for Mode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        name.parse().map_err(de::Error::custom)
    }
}

/// A part of the expected response, listed in the output-format section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputSection {
    Question,
    Answer,
    FollowUps,
    Criteria,
    RedFlags,
    Scoring,
}

impl OutputSection {
    /// All sections in canonical order.
    pub const ALL: [OutputSection; 6] = [
        OutputSection::Question,
        OutputSection::Answer,
        OutputSection::FollowUps,
        OutputSection::Criteria,
        OutputSection::RedFlags,
        OutputSection::Scoring,
    ];
}

// ── Interview Configuration (config.yaml) ────────────────────

/// Templates and defaults, deserialized from YAML (or JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewConfig {
    /// Configuration version tag.
    #[serde(default = "default_version")]
    pub version: String,

    /// Settings used when neither the template nor the caller overrides them.
    #[serde(default)]
    pub defaults: Defaults,

    /// Interview templates, in display order.
    pub templates: Vec<Template>,
}

impl InterviewConfig {
    /// Look up a template by identifier.
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    /// Check structural rules serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if there are no templates, a template id is
    /// empty or duplicated, or a template supports no level.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.templates.is_empty() {
            return Err(CoreError::Config("no templates defined".to_owned()));
        }
        for (index, template) in self.templates.iter().enumerate() {
            if template.id.trim().is_empty() {
                return Err(CoreError::Config(format!(
                    "template #{} has an empty id",
                    index + 1
                )));
            }
            if self.templates[..index].iter().any(|t| t.id == template.id) {
                return Err(CoreError::Config(format!(
                    "duplicate template id: {}",
                    template.id
                )));
            }
            if template.levels.is_empty() {
                return Err(CoreError::Config(format!(
                    "template {} supports no levels",
                    template.id
                )));
            }
        }
        Ok(())
    }
}

/// Default settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Defaults {
    /// Hiring bar the interviewer should hold (e.g. "Big Tech").
    #[serde(default = "default_company_bar")]
    pub company_bar: String,

    /// Technology stack used when the caller supplies none.
    #[serde(default)]
    pub stack: Vec<String>,

    /// Language the interview is conducted in.
    #[serde(default = "default_language")]
    pub language: String,

    /// Number of follow-up questions to prepare.
    #[serde(default = "default_follow_ups")]
    pub follow_ups: u32,

    /// Sections included in the output format.
    #[serde(default = "default_sections")]
    pub sections: Vec<OutputSection>,

    /// Whether prompts run in simulation mode.
    #[serde(default = "default_true")]
    pub simulation: bool,

    /// Minutes the candidate has to answer in simulation mode.
    #[serde(default = "default_timebox_minutes")]
    pub timebox_minutes: u32,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            company_bar: default_company_bar(),
            stack: Vec::new(),
            language: default_language(),
            follow_ups: default_follow_ups(),
            sections: default_sections(),
            simulation: true,
            timebox_minutes: default_timebox_minutes(),
        }
    }
}

/// A named interview topic.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    /// Unique identifier.
    pub id: String,

    /// Display title.
    pub title: String,

    /// Levels this template can be composed for.
    pub levels: Vec<Level>,

    /// Focus topics.
    #[serde(default)]
    pub focus: Vec<String>,

    /// Question-style tags.
    #[serde(default)]
    pub question_styles: Vec<String>,

    /// Extra rules the interviewer must follow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,

    /// Per-template overrides of the defaults.
    #[serde(default)]
    pub overrides: TemplateOverrides,
}

impl Template {
    /// Returns whether the template supports `level`.
    pub fn supports(&self, level: Level) -> bool {
        self.levels.contains(&level)
    }
}

/// Optional per-template settings that win over [`Defaults`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub follow_ups: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sections: Option<Vec<OutputSection>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plain_language: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub good_answer_criteria: Option<Vec<String>>,
}

// ── Default value functions for serde ────────────────────────

fn default_true() -> bool {
    true
}

fn default_version() -> String {
    "1".to_owned()
}

fn default_company_bar() -> String {
    "Big Tech".to_owned()
}

fn default_language() -> String {
    "English".to_owned()
}

fn default_follow_ups() -> u32 {
    2
}

fn default_sections() -> Vec<OutputSection> {
    vec![
        OutputSection::Question,
        OutputSection::Answer,
        OutputSection::FollowUps,
        OutputSection::Criteria,
    ]
}

fn default_timebox_minutes() -> u32 {
    20
}

// ── Config loading ───────────────────────────────────────────

/// Parse and validate an [`InterviewConfig`] from YAML or JSON text.
///
/// # Errors
///
/// Returns `CoreError::Config` if the text cannot be parsed or fails validation.
pub fn parse_interview_config(content: &str) -> Result<InterviewConfig, CoreError> {
    let config: InterviewConfig =
        serde_yaml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Returns the configuration shipped with the crate.
///
/// # Errors
///
/// Returns `CoreError::Config` if the embedded configuration is invalid.
pub fn builtin_config() -> Result<InterviewConfig, CoreError> {
    parse_interview_config(BUILTIN_CONFIG)
}

/// Load the [`InterviewConfig`] for an engine.
///
/// Reads the explicit config file if one is set, else `<data-dir>/config.yaml`.
/// When the default path does not exist the built-in configuration is used.
///
/// # Errors
///
/// Returns `CoreError::Config` if an explicit file is missing, or the file is
/// invalid. Returns `CoreError::Io` if the file exists but cannot be read.
#[instrument(skip_all)]
pub fn load_interview_config(config: &EngineConfig) -> Result<InterviewConfig, CoreError> {
    let path = config.config_path();
    if !path.exists() {
        if config.config_file().is_some() {
            return Err(CoreError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        debug!("no config file, using built-in configuration");
        return builtin_config();
    }

    let content = std::fs::read_to_string(&path)?;
    let loaded = parse_interview_config(&content).map_err(|e| match e {
        CoreError::Config(msg) => CoreError::Config(format!("{}: {msg}", path.display())),
        other => other,
    })?;
    debug!(path = %path.display(), templates = loaded.templates.len(), "loaded config");
    Ok(loaded)
}
