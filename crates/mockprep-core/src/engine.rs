//! Core engine.
//!
//! The [`Engine`] is the entry point used by the CLI and the HTTP API. It
//! owns the loaded [`InterviewConfig`], the [`Composer`] and a
//! [`SessionStore`], and exposes the generate / evaluate / list operations.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::composer::{ComposeRequest, Composer};
use crate::config::{EngineConfig, InterviewConfig, Template, load_interview_config};
use crate::error::CoreError;
use crate::scorer::{self, Assessment};
use crate::session::Session;
use crate::store::{JsonFileStore, SessionStore};

/// Result of [`Engine::generate`].
#[derive(Debug, Clone, Serialize)]
pub struct Generated {
    /// Composed prompt text.
    pub prompt: String,
    /// Session created for this prompt, unless creation was disabled.
    pub session: Option<Session>,
}

/// Drives prompt composition and session bookkeeping.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use mockprep_core::{ComposeRequest, Engine, Level, MemoryStore, builtin_config};
///
/// # fn example() -> Result<(), mockprep_core::CoreError> {
/// let engine = Engine::with_store(builtin_config()?, Arc::new(MemoryStore::new()))?;
/// let request = ComposeRequest::builder()
///     .template_id("rust-ownership")
///     .level(Level::Junior)
///     .build();
///
/// let generated = engine.generate(&request, true)?;
/// assert!(generated.prompt.contains("Rust Ownership"));
/// assert_eq!(engine.sessions()?.len(), 1);
/// # Ok(())
/// # }
/// # example().unwrap();
/// ```
#[derive(Debug)]
pub struct Engine {
    config: InterviewConfig,
    composer: Composer,
    store: Arc<dyn SessionStore>,
}

impl Engine {
    /// Create an engine from CLI-level configuration.
    ///
    /// Loads the interview configuration, registers prompt overrides from the
    /// prompts directory when it exists, and opens the JSON session store in
    /// the data directory.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if the configuration cannot be loaded.
    /// Returns `CoreError::Prompt` if prompt templates cannot be loaded.
    #[instrument(skip_all)]
    pub fn new(config: EngineConfig) -> Result<Self, CoreError> {
        info!(data_dir = %config.data_dir().display(), "initializing engine");

        let interview_config = load_interview_config(&config)?;

        let mut prompts = mockprep_pm::PromptManager::new()?;
        let prompts_dir = config.prompts_dir();
        if prompts_dir.is_dir() {
            prompts.load_dir(&prompts_dir)?;
            debug!(dir = %prompts_dir.display(), "loaded custom prompt directory");
        }

        let store = Arc::new(JsonFileStore::new(config.sessions_path()));
        Ok(Self {
            config: interview_config,
            composer: Composer::new(prompts),
            store,
        })
    }

    /// Create an engine from an already loaded configuration and any store.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Config` if the configuration fails validation.
    /// Returns `CoreError::Prompt` if the built-in templates cannot be loaded.
    pub fn with_store(
        config: InterviewConfig,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            config,
            composer: Composer::new(mockprep_pm::PromptManager::new()?),
            store,
        })
    }

    /// Returns the loaded interview configuration.
    pub fn config(&self) -> &InterviewConfig {
        &self.config
    }

    /// Configured templates, in configuration order.
    pub fn templates(&self) -> &[Template] {
        &self.config.templates
    }

    /// Compose a prompt without touching the session store.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownTemplate` or `CoreError::UnsupportedLevel`
    /// for requests the configuration cannot serve.
    pub fn compose(&self, request: &ComposeRequest) -> Result<String, CoreError> {
        self.composer.compose(&self.config, request)
    }

    /// Compose a prompt and, when `create_session` is set, start a session.
    ///
    /// The session is only created after composition succeeds, so invalid
    /// requests never leave a record behind.
    ///
    /// # Errors
    ///
    /// Returns composition errors as for [`compose`](Self::compose).
    /// Returns `CoreError::Io` if the session cannot be persisted.
    #[instrument(skip(self, request), fields(template = %request.template_id, level = %request.level))]
    pub fn generate(
        &self,
        request: &ComposeRequest,
        create_session: bool,
    ) -> Result<Generated, CoreError> {
        let prompt = self.compose(request)?;
        let session = if create_session {
            let session = self.store.create(&request.template_id, request.level)?;
            info!(session = %session.id, "started session");
            Some(session)
        } else {
            None
        };
        Ok(Generated { prompt, session })
    }

    /// Record the evaluation of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidScore` for scores outside `[0, 10]`.
    /// Returns `CoreError::SessionNotFound` if the session does not exist.
    #[instrument(skip(self, notes))]
    pub fn evaluate(&self, id: &str, score: f64, notes: Option<&str>) -> Result<(), CoreError> {
        self.store.update_score(id, score, notes)?;
        info!("recorded evaluation");
        Ok(())
    }

    /// All sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the store cannot be read.
    pub fn sessions(&self) -> Result<Vec<Session>, CoreError> {
        self.store.list()
    }

    /// Remove every session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the store cannot be written.
    #[instrument(skip(self))]
    pub fn clear_sessions(&self) -> Result<(), CoreError> {
        self.store.clear()?;
        info!("cleared sessions");
        Ok(())
    }

    /// Heuristically score a free-text answer.
    pub fn assess(&self, answer: &str) -> Assessment {
        scorer::score(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Level, parse_interview_config};
    use crate::store::MemoryStore;

    fn engine() -> Engine {
        let config = parse_interview_config(
            "templates:\n  - { id: t1, title: Template One, levels: [junior, senior] }\n",
        )
        .expect("should parse");
        Engine::with_store(config, Arc::new(MemoryStore::new())).expect("should create engine")
    }

    fn request(level: Level) -> ComposeRequest {
        ComposeRequest::builder()
            .template_id("t1")
            .level(level)
            .build()
    }

    #[test]
    fn test_should_generate_and_create_session() {
        let engine = engine();
        let generated = engine
            .generate(&request(Level::Senior), true)
            .expect("should generate");

        assert!(generated.prompt.contains("Template One"));
        let session = generated.session.expect("should create session");
        assert_eq!(session.template_id, "t1");
        assert_eq!(session.level, Level::Senior);
        assert_eq!(engine.sessions().expect("should list")[0].id, session.id);
    }

    #[test]
    fn test_should_generate_without_session() {
        let engine = engine();
        let generated = engine
            .generate(&request(Level::Junior), false)
            .expect("should generate");

        assert!(generated.session.is_none());
        assert!(engine.sessions().expect("should list").is_empty());
    }

    #[test]
    fn test_should_not_create_session_when_compose_fails() {
        let engine = engine();
        let result = engine.generate(&request(Level::Middle), true);

        assert!(matches!(result, Err(CoreError::UnsupportedLevel { .. })));
        assert!(engine.sessions().expect("should list").is_empty());
    }

    #[test]
    fn test_should_evaluate_existing_session() {
        let engine = engine();
        let session = engine
            .generate(&request(Level::Senior), true)
            .expect("should generate")
            .session
            .expect("should create session");

        assert!(matches!(
            engine.evaluate(&session.id, 11.0, None),
            Err(CoreError::InvalidScore(_))
        ));
        assert!(matches!(
            engine.evaluate("missing", 5.0, None),
            Err(CoreError::SessionNotFound(_))
        ));
        engine
            .evaluate(&session.id, 8.5, Some("good"))
            .expect("should evaluate");

        let listed = engine.sessions().expect("should list");
        assert_eq!(listed[0].score, Some(8.5));
        assert_eq!(listed[0].notes.as_deref(), Some("good"));
    }

    #[test]
    fn test_should_clear_sessions() {
        let engine = engine();
        engine
            .generate(&request(Level::Junior), true)
            .expect("should generate");
        engine.clear_sessions().expect("should clear");
        assert!(engine.sessions().expect("should list").is_empty());
    }

    #[test]
    fn test_should_create_engine_from_data_dir() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        let prompts = dir.path().join("prompts");
        std::fs::create_dir_all(&prompts).expect("should create prompts dir");
        std::fs::write(prompts.join("interview.j2"), "Custom prompt for {{ title }}")
            .expect("should write template");

        let config = EngineConfig::builder().data_dir(dir.path()).build();
        let engine = Engine::new(config).expect("should create engine");

        let req = ComposeRequest::builder()
            .template_id("rust-ownership")
            .level(Level::Middle)
            .build();
        let generated = engine.generate(&req, true).expect("should generate");
        assert_eq!(
            generated.prompt,
            "Custom prompt for Rust Ownership and Borrowing"
        );
        assert!(dir.path().join("sessions.json").exists());
    }

    #[test]
    fn test_should_fail_engine_for_invalid_config() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        std::fs::write(dir.path().join("config.yaml"), "templates: []\n")
            .expect("should write config");

        let config = EngineConfig::builder().data_dir(dir.path()).build();
        let result = Engine::new(config);
        assert!(matches!(result, Err(CoreError::Config(_))));
    }

    #[test]
    fn test_should_assess_answer() {
        let assessment = engine().assess("An example with tests.");
        assert_eq!(assessment.score, 2);
    }
}
