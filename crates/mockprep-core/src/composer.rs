//! Prompt composition.
//!
//! [`resolve`] merges a template, the configuration defaults and the caller's
//! overrides into a [`PromptContext`]; [`Composer`] renders that context with
//! the prompt manager's interview layout. Composition never reads the clock
//! and never touches the session store, so identical inputs always produce
//! identical text.

use mockprep_pm::{INTERVIEW_TEMPLATE, PromptManager};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use typed_builder::TypedBuilder;

use crate::config::{InterviewConfig, Level, Mode, OutputSection, Template};
use crate::error::CoreError;

/// Parameters for composing one interview prompt.
///
/// # Examples
///
/// ```
/// use mockprep_core::{ComposeRequest, Level, Mode};
///
/// let request = ComposeRequest::builder()
///     .template_id("system-design")
///     .level(Level::Senior)
///     .focus_boost(vec!["caching".to_owned()])
///     .mode(Mode::Direct)
///     .build();
///
/// assert_eq!(request.template_id, "system-design");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    /// Template to compose.
    #[builder(setter(into))]
    pub template_id: String,

    /// Candidate level; must be supported by the template.
    pub level: Level,

    /// Technology stack, replacing the configured default when non-empty.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack: Option<Vec<String>>,

    /// Topics added after the template's own focus topics.
    #[builder(default)]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub focus_boost: Vec<String>,

    /// Free-form context appended to the context section.
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_context: Option<String>,

    /// Output shape override.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,

    /// Timebox override, in minutes.
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timebox_minutes: Option<u32>,

    /// Interview language override.
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Fully resolved values handed to the interview layout template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PromptContext {
    pub title: String,
    pub template_id: String,
    pub level: Level,
    pub company_bar: String,
    pub stack: Vec<String>,
    pub focus: Vec<String>,
    pub question_styles: Vec<String>,
    pub language: String,
    pub plain_language: bool,
    pub extra_context: Option<String>,
    pub follow_ups: u32,
    pub constraints: Vec<String>,
    pub simulation: bool,
    pub timebox_minutes: u32,
    pub output_format: Vec<String>,
    pub criteria: Vec<String>,
}

/// Renders interview prompts.
#[derive(Debug)]
pub struct Composer {
    prompts: PromptManager,
}

impl Composer {
    /// Create a composer rendering with the given prompt manager.
    pub fn new(prompts: PromptManager) -> Self {
        Self { prompts }
    }

    /// Compose the prompt text for a request.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownTemplate` if the template does not exist.
    /// Returns `CoreError::UnsupportedLevel` if the template excludes the level.
    /// Returns `CoreError::Prompt` if the layout template fails to render.
    #[instrument(skip_all, fields(template = %request.template_id, level = %request.level))]
    pub fn compose(
        &self,
        config: &InterviewConfig,
        request: &ComposeRequest,
    ) -> Result<String, CoreError> {
        let context = resolve(config, request)?;
        let text = self.prompts.render(INTERVIEW_TEMPLATE, &context)?;
        debug!(chars = text.len(), "composed prompt");
        Ok(text)
    }
}

/// Resolve a request against the configuration.
///
/// # Errors
///
/// Returns `CoreError::UnknownTemplate` if the template does not exist.
/// Returns `CoreError::UnsupportedLevel` if the template excludes the level.
pub fn resolve(
    config: &InterviewConfig,
    request: &ComposeRequest,
) -> Result<PromptContext, CoreError> {
    let template = config
        .template(&request.template_id)
        .ok_or_else(|| CoreError::UnknownTemplate(request.template_id.clone()))?;
    if !template.supports(request.level) {
        return Err(CoreError::UnsupportedLevel {
            template: template.id.clone(),
            level: request.level,
        });
    }

    let defaults = &config.defaults;
    let overrides = &template.overrides;

    let stack = request
        .stack
        .as_deref()
        .map(normalize_topics)
        .filter(|stack| !stack.is_empty())
        .unwrap_or_else(|| defaults.stack.clone());
    let follow_ups = overrides.follow_ups.unwrap_or(defaults.follow_ups);
    let sections = canonical_sections(
        overrides
            .sections
            .as_deref()
            .unwrap_or(&defaults.sections),
    );
    let mode = request
        .mode
        .unwrap_or(Mode::from_simulation(defaults.simulation));

    let criteria = if sections.contains(&OutputSection::Criteria) {
        overrides.good_answer_criteria.clone().unwrap_or_default()
    } else {
        Vec::new()
    };
    let output_format = sections
        .iter()
        .map(|section| describe_section(*section, mode, follow_ups))
        .collect();

    Ok(PromptContext {
        title: template.title.clone(),
        template_id: template.id.clone(),
        level: request.level,
        company_bar: defaults.company_bar.clone(),
        stack,
        focus: merge_focus(template, &request.focus_boost),
        question_styles: template.question_styles.clone(),
        language: request
            .language
            .clone()
            .unwrap_or_else(|| defaults.language.clone()),
        plain_language: overrides.plain_language.unwrap_or(false),
        extra_context: request
            .extra_context
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_owned),
        follow_ups,
        constraints: template.constraints.clone(),
        simulation: mode == Mode::Simulation,
        timebox_minutes: request.timebox_minutes.unwrap_or(defaults.timebox_minutes),
        output_format,
        criteria,
    })
}

/// Template focus topics followed by boost topics, first occurrence wins.
fn merge_focus(template: &Template, boost: &[String]) -> Vec<String> {
    normalize_topics(template.focus.iter().chain(boost))
}

/// Trimmed, non-blank entries without duplicates, in first-seen order.
fn normalize_topics<'a>(topics: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for topic in topics {
        let topic = topic.trim();
        if !topic.is_empty() && !out.iter().any(|seen| seen == topic) {
            out.push(topic.to_owned());
        }
    }
    out
}

fn canonical_sections(sections: &[OutputSection]) -> Vec<OutputSection> {
    OutputSection::ALL
        .into_iter()
        .filter(|section| sections.contains(section))
        .collect()
}

fn describe_section(section: OutputSection, mode: Mode, follow_ups: u32) -> String {
    match section {
        OutputSection::Question => "Question: the interview question itself".to_owned(),
        OutputSection::Answer => match mode {
            Mode::Simulation => "Model answer, revealed only after the candidate replies".to_owned(),
            Mode::Direct => "Model answer".to_owned(),
        },
        OutputSection::FollowUps => format!("Follow-up questions ({follow_ups})"),
        OutputSection::Criteria => "Criteria of a good answer".to_owned(),
        OutputSection::RedFlags => "Red flags that signal a weak answer".to_owned(),
        OutputSection::Scoring => "Score from 0 to 10 with a short justification".to_owned(),
    }
}
