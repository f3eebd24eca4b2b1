//! Session records.
//!
//! A [`Session`] is one persisted generate-and-evaluate interaction. Records
//! read back from disk are checked field by field with
//! [`Session::from_value`]; anything that breaks the record invariant is
//! rejected rather than repaired.

use std::cmp::Ordering;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::Level;
use crate::error::CoreError;

/// Lowest and highest accepted scores.
pub const SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

static LAST_MILLIS: Mutex<i64> = Mutex::new(i64::MIN);

/// One persisted interview interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Creation time, RFC 3339 in UTC with millisecond precision.
    pub date: String,

    /// Template the prompt was composed from.
    pub template_id: String,

    /// Candidate level.
    pub level: Level,

    /// Evaluation score in `[0, 10]`, set by `evaluate`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Free-text evaluation notes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Session {
    /// Start a new session with a fresh id and the current timestamp.
    pub fn start(template_id: &str, level: Level) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date: next_timestamp().to_rfc3339_opts(SecondsFormat::Millis, true),
            template_id: template_id.to_owned(),
            level,
            score: None,
            notes: None,
        }
    }

    /// Build a session from a loosely typed JSON value.
    ///
    /// Returns `None` unless `id`, `date` and `templateId` are non-empty
    /// strings, `level` is a known level, `score` is absent or a finite number and
    /// `notes` is absent or a string. `null` counts as absent.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;

        let non_empty = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };

        let id = non_empty("id")?;
        let date = non_empty("date")?;
        let template_id = non_empty("templateId")?;
        let level_name = object.get("level").and_then(Value::as_str)?;
        let level = Level::ALL
            .into_iter()
            .find(|level| level.as_str() == level_name)?;

        let score = match object.get("score") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.as_f64().filter(|s| s.is_finite())?),
        };
        let notes = match object.get("notes") {
            None | Some(Value::Null) => None,
            Some(Value::String(notes)) => Some(notes.clone()),
            Some(_) => return None,
        };

        Some(Self {
            id,
            date,
            template_id,
            level,
            score,
            notes,
        })
    }

    /// Parsed creation time, if `date` is valid RFC 3339.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }

    /// Record an evaluation. Notes are only replaced when provided.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidScore` if `score` is not within [`SCORE_RANGE`].
    pub fn evaluate(&mut self, score: f64, notes: Option<&str>) -> Result<(), CoreError> {
        validate_score(score)?;
        self.score = Some(score);
        if let Some(notes) = notes {
            self.notes = Some(notes.to_owned());
        }
        Ok(())
    }
}

/// Check that a score is finite and within [`SCORE_RANGE`].
///
/// # Errors
///
/// Returns `CoreError::InvalidScore` otherwise.
pub fn validate_score(score: f64) -> Result<(), CoreError> {
    if score.is_finite() && SCORE_RANGE.contains(&score) {
        Ok(())
    } else {
        Err(CoreError::InvalidScore(score))
    }
}

/// Sort sessions most recent first.
///
/// The sort is stable, so records with equal dates keep their input order.
/// Dates that do not parse sort after every parseable date.
pub fn sort_most_recent_first(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| compare_dates(b, a));
}

fn compare_dates(a: &Session, b: &Session) -> Ordering {
    match (a.created_at(), b.created_at()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.date.cmp(&b.date),
    }
}

/// Current time at millisecond precision, strictly later than every
/// timestamp previously handed out by this process.
fn next_timestamp() -> DateTime<Utc> {
    let mut last = LAST_MILLIS.lock().unwrap_or_else(PoisonError::into_inner);
    let now = Utc::now().timestamp_millis();
    let next = if *last >= now { *last + 1 } else { now };
    *last = next;
    DateTime::from_timestamp_millis(next).unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn session(id: &str, date: &str) -> Session {
        Session {
            id: id.to_owned(),
            date: date.to_owned(),
            template_id: "t1".to_owned(),
            level: Level::Junior,
            score: None,
            notes: None,
        }
    }

    #[test]
    fn test_should_start_session_without_score() {
        let s = Session::start("t1", Level::Senior);

        assert!(!s.id.is_empty());
        assert!(s.created_at().is_some(), "date should be RFC 3339: {}", s.date);
        assert!(s.date.ends_with('Z'));
        assert_eq!(s.template_id, "t1");
        assert_eq!(s.level, Level::Senior);
        assert!(s.score.is_none());
        assert!(s.notes.is_none());
    }

    #[test]
    fn test_should_generate_unique_ids() {
        let a = Session::start("t1", Level::Junior);
        let b = Session::start("t1", Level::Junior);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_should_issue_increasing_timestamps() {
        let dates: Vec<_> = (0..50)
            .map(|_| {
                Session::start("t1", Level::Junior)
                    .created_at()
                    .expect("should parse")
            })
            .collect();
        assert!(dates.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_should_serialize_camel_case_and_skip_absent_fields() {
        let s = session("a", "2026-01-01T00:00:00.000Z");
        let value = serde_json::to_value(&s).expect("should serialize");

        assert_eq!(value["templateId"], "t1");
        assert_eq!(value["level"], "junior");
        assert!(value.get("score").is_none());
        assert!(value.get("notes").is_none());
    }

    #[test]
    fn test_should_accept_valid_value() {
        let value = json!({
            "id": "a",
            "date": "2026-01-01T00:00:00.000Z",
            "templateId": "t1",
            "level": "middle",
            "score": 7,
            "notes": "ok",
        });
        let s = Session::from_value(&value).expect("should accept");
        assert_eq!(s.level, Level::Middle);
        assert_eq!(s.score, Some(7.0));
        assert_eq!(s.notes.as_deref(), Some("ok"));
    }

    #[test]
    fn test_should_treat_null_optionals_as_absent() {
        let value = json!({
            "id": "a", "date": "d", "templateId": "t1", "level": "senior",
            "score": null, "notes": null,
        });
        let s = Session::from_value(&value).expect("should accept");
        assert!(s.score.is_none());
        assert!(s.notes.is_none());
    }

    #[test]
    fn test_should_reject_invalid_values() {
        let base = json!({ "id": "a", "date": "d", "templateId": "t1", "level": "junior" });
        assert!(Session::from_value(&base).is_some());

        let broken = [
            ("id", json!("")),
            ("id", json!(5)),
            ("date", json!("")),
            ("templateId", json!(null)),
            ("level", json!("staff")),
            ("level", json!("Junior")),
            ("score", json!("8")),
            ("notes", json!(["x"])),
        ];
        for (key, bad) in broken {
            let mut value = base.clone();
            value[key] = bad.clone();
            assert!(
                Session::from_value(&value).is_none(),
                "{key} = {bad} should be rejected"
            );
        }

        let mut missing = base.clone();
        missing.as_object_mut().expect("object").remove("level");
        assert!(Session::from_value(&missing).is_none());
        assert!(Session::from_value(&json!("not an object")).is_none());
    }

    #[test]
    fn test_should_reject_out_of_range_score() {
        let value: Value = serde_json::from_str(
            r#"{"id": "a", "date": "d", "templateId": "t1", "level": "junior", "score": 1e400}"#,
        )
        .expect("out-of-range numbers should still parse");
        assert!(Session::from_value(&value).is_none());
    }

    #[test]
    fn test_should_validate_score_range() {
        for ok in [0.0, 5.5, 10.0] {
            assert!(validate_score(ok).is_ok(), "{ok} should be valid");
        }
        for bad in [-1.0, 10.01, f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(
                matches!(validate_score(bad), Err(CoreError::InvalidScore(_))),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn test_should_keep_notes_when_not_provided() {
        let mut s = session("a", "d");
        s.evaluate(6.0, Some("first")).expect("should evaluate");
        s.evaluate(8.0, None).expect("should evaluate");

        assert_eq!(s.score, Some(8.0));
        assert_eq!(s.notes.as_deref(), Some("first"));
    }

    #[test]
    fn test_should_not_mutate_on_invalid_score() {
        let mut s = session("a", "d");
        assert!(s.evaluate(11.0, Some("nope")).is_err());
        assert!(s.score.is_none());
        assert!(s.notes.is_none());
    }

    #[test]
    fn test_should_sort_most_recent_first_with_stable_ties() {
        let mut sessions = vec![
            session("old", "2026-01-01T00:00:00.000Z"),
            session("bad", "yesterday"),
            session("tie-1", "2026-03-01T00:00:00.000Z"),
            session("new", "2026-03-01T10:00:00+02:00"),
            session("tie-2", "2026-03-01T00:00:00.000Z"),
        ];
        sort_most_recent_first(&mut sessions);

        let ids: Vec<_> = sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["new", "tie-1", "tie-2", "old", "bad"]);
    }
}
