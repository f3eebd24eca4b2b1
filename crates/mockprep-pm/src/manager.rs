//! Prompt manager backed by a minijinja environment.
//!
//! The manager ships with the built-in interview layout and can load
//! override directories whose templates replace built-ins with the same name.

use std::fs;
use std::path::Path;

use minijinja::{Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::PmError;
use crate::template::PromptTemplate;

/// Name of the built-in interview prompt layout.
pub const INTERVIEW_TEMPLATE: &str = "interview";

const BUILTIN_TEMPLATES: &[(&str, &str)] =
    &[(INTERVIEW_TEMPLATE, include_str!("../templates/interview.j2"))];

const TEMPLATE_EXTENSIONS: &[&str] = &["j2", "jinja"];

/// Manages prompt templates and renders them with context variables.
#[derive(Debug)]
pub struct PromptManager {
    env: Environment<'static>,
}

impl PromptManager {
    /// Create a PromptManager with the built-in templates registered.
    ///
    /// # Errors
    ///
    /// Returns `PmError::InvalidTemplate` if a built-in template fails to parse.
    pub fn new() -> Result<Self, PmError> {
        let mut env = Environment::new();
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_undefined_behavior(UndefinedBehavior::Strict);

        let mut manager = Self { env };
        for (name, source) in BUILTIN_TEMPLATES {
            manager.add_template(PromptTemplate::new(*name, *source))?;
        }
        Ok(manager)
    }

    /// Load all `.j2` / `.jinja` templates from a directory, recursively.
    ///
    /// Template names are the path relative to `dir` without the extension,
    /// using `/` as separator (`reviews/system.j2` becomes `reviews/system`).
    ///
    /// # Errors
    ///
    /// Returns `PmError::Io` if the directory cannot be read.
    /// Returns `PmError::InvalidTemplate` if a template fails to parse.
    #[instrument(skip(self))]
    pub fn load_dir(&mut self, dir: &Path) -> Result<(), PmError> {
        let mut loaded = Vec::new();
        collect_templates(dir, dir, &mut loaded)?;
        for template in loaded {
            debug!(name = %template.name, "loaded template override");
            self.add_template(template)?;
        }
        Ok(())
    }

    /// Register a single template, replacing any template with the same name.
    ///
    /// # Errors
    ///
    /// Returns `PmError::InvalidTemplate` if the source fails to parse.
    pub fn add_template(&mut self, template: PromptTemplate) -> Result<(), PmError> {
        let PromptTemplate { name, source } = template;
        self.env
            .add_template_owned(name.clone(), source)
            .map_err(|e| PmError::InvalidTemplate(format!("{name}: {e}")))
    }

    /// Returns whether a template with the given name is registered.
    pub fn has_template(&self, name: &str) -> bool {
        self.env.get_template(name).is_ok()
    }

    /// Render a template by name with the given context.
    ///
    /// # Errors
    ///
    /// Returns `PmError::TemplateNotFound` if no template has that name.
    /// Returns `PmError::RenderError` if rendering fails.
    pub fn render<S: Serialize>(&self, name: &str, ctx: &S) -> Result<String, PmError> {
        let template = self.env.get_template(name).map_err(|e| match e.kind() {
            ErrorKind::TemplateNotFound => PmError::TemplateNotFound(name.to_owned()),
            _ => PmError::RenderError(e.to_string()),
        })?;
        template
            .render(ctx)
            .map_err(|e| PmError::RenderError(format!("{name}: {e}")))
    }
}

fn collect_templates(
    root: &Path,
    dir: &Path,
    out: &mut Vec<PromptTemplate>,
) -> Result<(), PmError> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect_templates(root, &path, out)?;
            continue;
        }

        let is_template = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext));
        if !is_template {
            continue;
        }

        let Ok(relative) = path.with_extension("").strip_prefix(root).map(Path::to_path_buf)
        else {
            continue;
        };
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let source = fs::read_to_string(&path)?;
        out.push(PromptTemplate::new(name, source));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use minijinja::context;

    use super::*;

    fn interview_context() -> minijinja::Value {
        context! {
            title => "Rust Ownership",
            level => "senior",
            company_bar => "FAANG",
            stack => vec!["Rust", "Tokio"],
            focus => vec!["borrowing", "lifetimes"],
            question_styles => vec!["deep-dive"],
            language => "English",
            plain_language => false,
            extra_context => None::<String>,
            follow_ups => 2,
            constraints => Vec::<String>::new(),
            simulation => true,
            timebox_minutes => 30,
            output_format => vec!["Question"],
            criteria => Vec::<String>::new(),
        }
    }

    #[test]
    fn test_should_register_builtin_interview_template() {
        let pm = PromptManager::new().expect("should create manager");
        assert!(pm.has_template(INTERVIEW_TEMPLATE));
    }

    #[test]
    fn test_should_render_interview_sections() {
        let pm = PromptManager::new().expect("should create manager");
        let text = pm
            .render(INTERVIEW_TEMPLATE, &interview_context())
            .expect("should render");

        assert!(text.starts_with("# Rust Ownership (senior)"));
        assert!(text.contains("## Role"));
        assert!(text.contains("Technology stack: Rust, Tokio."));
        assert!(text.contains("prepare 2 follow-up questions."));
        assert!(text.contains("The candidate has 30 minutes."));
        assert!(text.contains("1. Question"));
        assert!(!text.contains("## Constraints"));
        assert!(!text.contains("Additional context"));
    }

    #[test]
    fn test_should_return_template_not_found() {
        let pm = PromptManager::new().expect("should create manager");
        let result = pm.render("missing", &context! {});
        assert!(matches!(result, Err(PmError::TemplateNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_should_fail_render_on_missing_variable() {
        let pm = PromptManager::new().expect("should create manager");
        let result = pm.render(INTERVIEW_TEMPLATE, &context! { title => "x" });
        assert!(matches!(result, Err(PmError::RenderError(_))));
    }

    #[test]
    fn test_should_reject_invalid_template_source() {
        let mut pm = PromptManager::new().expect("should create manager");
        let result = pm.add_template(PromptTemplate::new("broken", "{% if %}"));
        assert!(matches!(result, Err(PmError::InvalidTemplate(_))));
    }

    #[test]
    fn test_should_override_builtin_from_directory() {
        let dir = tempfile::TempDir::new().expect("should create temp dir");
        std::fs::write(dir.path().join("interview.j2"), "Custom {{ title }}")
            .expect("should write template");
        std::fs::create_dir_all(dir.path().join("extra")).expect("should create subdir");
        std::fs::write(dir.path().join("extra").join("note.jinja"), "Note for {{ level }}")
            .expect("should write template");
        std::fs::write(dir.path().join("README.md"), "ignored").expect("should write file");

        let mut pm = PromptManager::new().expect("should create manager");
        pm.load_dir(dir.path()).expect("should load dir");

        let text = pm
            .render(INTERVIEW_TEMPLATE, &interview_context())
            .expect("should render");
        assert_eq!(text, "Custom Rust Ownership");

        let note = pm
            .render("extra/note", &context! { level => "junior" })
            .expect("should render nested template");
        assert_eq!(note, "Note for junior");
        assert!(!pm.has_template("README"));
    }

    #[test]
    fn test_should_fail_load_for_missing_directory() {
        let mut pm = PromptManager::new().expect("should create manager");
        let result = pm.load_dir(Path::new("/nonexistent/templates"));
        assert!(matches!(result, Err(PmError::Io(_))));
    }
}
