//! REST API endpoint handlers.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use mockprep_core::{Assessment, ComposeRequest, CoreError, Engine, Level, Mode, Session};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Shared application state passed to all handlers via axum's `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
}

/// A configured template as listed by the API.
#[derive(Debug, Serialize)]
pub struct TemplateSummary {
    pub id: String,
    pub title: String,
    pub levels: Vec<Level>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateSummary>,
}

#[derive(Debug, Serialize)]
pub struct SessionsResponse {
    pub sessions: Vec<Session>,
}

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub ok: bool,
}

impl OkResponse {
    fn ok() -> Json<Self> {
        Json(Self { ok: true })
    }
}

/// GET /api/templates — Configured templates and their levels.
pub async fn list_templates(State(app): State<AppState>) -> Json<TemplatesResponse> {
    let templates = app
        .engine
        .templates()
        .iter()
        .map(|t| TemplateSummary {
            id: t.id.clone(),
            title: t.title.clone(),
            levels: t.levels.clone(),
        })
        .collect();
    Json(TemplatesResponse { templates })
}

/// GET /api/sessions — All sessions, most recent first.
pub async fn list_sessions(
    State(app): State<AppState>,
) -> Result<Json<SessionsResponse>, ApiError> {
    let sessions = app.engine.sessions()?;
    Ok(Json(SessionsResponse { sessions }))
}

/// DELETE /api/sessions — Remove every session.
pub async fn clear_sessions(State(app): State<AppState>) -> Result<Json<OkResponse>, ApiError> {
    app.engine.clear_sessions()?;
    Ok(OkResponse::ok())
}

/// Request body for POST /api/generate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub template_id: String,
    pub level: Level,
    #[serde(default)]
    pub stack: Option<Vec<String>>,
    #[serde(default)]
    pub focus_boost: Vec<String>,
    #[serde(default)]
    pub extra_context: Option<String>,
    #[serde(default)]
    pub mode: Option<Mode>,
    #[serde(default)]
    pub timebox_minutes: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,

    /// Start a session for the prompt (default `true`).
    #[serde(default = "default_true")]
    pub create_session: bool,
}

impl GenerateRequest {
    /// Split into the compose request and the session flag.
    pub fn into_parts(self) -> (ComposeRequest, bool) {
        let compose = ComposeRequest {
            template_id: self.template_id,
            level: self.level,
            stack: self.stack,
            focus_boost: self.focus_boost,
            extra_context: self.extra_context,
            mode: self.mode,
            timebox_minutes: self.timebox_minutes,
            language: self.language,
        };
        (compose, self.create_session)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// POST /api/generate — Compose a prompt and optionally start a session.
///
/// Returns 400 for unknown templates, unsupported levels and malformed bodies.
pub async fn generate(
    State(app): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let Json(body) = body?;
    let (request, create_session) = body.into_parts();
    let generated = app.engine.generate(&request, create_session)?;
    Ok(Json(GenerateResponse {
        prompt: generated.prompt,
        session_id: generated.session.map(|s| s.id),
    }))
}

/// Request body for POST /api/evaluate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub session_id: String,
    pub score: f64,
    #[serde(default)]
    pub notes: Option<String>,
}

/// POST /api/evaluate — Record a score for an existing session.
///
/// Returns 400 for invalid scores, 404 if the session does not exist.
pub async fn evaluate(
    State(app): State<AppState>,
    body: Result<Json<EvaluateRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, ApiError> {
    let Json(body) = body?;
    if body.session_id.trim().is_empty() {
        return Err(CoreError::Validation("sessionId must not be empty".to_owned()).into());
    }
    app.engine
        .evaluate(&body.session_id, body.score, body.notes.as_deref())?;
    Ok(OkResponse::ok())
}

/// Request body for POST /api/score.
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub answer: String,
}

/// POST /api/score — Heuristic assessment of an answer.
pub async fn score(
    State(app): State<AppState>,
    body: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<Assessment>, ApiError> {
    let Json(body) = body?;
    Ok(Json(app.engine.assess(&body.answer)))
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_deserialize_generate_request() {
        let json = r#"{"templateId":"t1","level":"senior","mode":"direct","timeboxMinutes":45,"focusBoost":["x"],"createSession":false}"#;
        let req: GenerateRequest = serde_json::from_str(json).expect("should deserialize");
        let (compose, create_session) = req.into_parts();

        assert_eq!(compose.template_id, "t1");
        assert_eq!(compose.level, Level::Senior);
        assert_eq!(compose.mode, Some(Mode::Direct));
        assert_eq!(compose.timebox_minutes, Some(45));
        assert_eq!(compose.focus_boost, vec!["x"]);
        assert!(!create_session);
    }

    #[test]
    fn test_should_accept_level_in_any_case() {
        let json = r#"{"templateId":"t1","level":"Senior"}"#;
        let req: GenerateRequest = serde_json::from_str(json).expect("should deserialize");
        assert_eq!(req.level, Level::Senior);
    }

    #[test]
    fn test_should_default_create_session_to_true() {
        let json = r#"{"templateId":"t1","level":"junior"}"#;
        let req: GenerateRequest = serde_json::from_str(json).expect("should deserialize");
        assert!(req.create_session);
    }

    #[test]
    fn test_should_serialize_generate_response_without_session() {
        let resp = GenerateResponse {
            prompt: "p".to_owned(),
            session_id: None,
        };
        let value = serde_json::to_value(&resp).expect("should serialize");
        assert_eq!(value, serde_json::json!({ "prompt": "p" }));
    }
}
