//! Session persistence.
//!
//! [`SessionStore`] is the seam between front ends and storage. The
//! [`JsonFileStore`] keeps every session in one pretty-printed JSON array and
//! rewrites the whole file on each mutation; [`MemoryStore`] keeps them in a
//! `Vec` for tests and embedding.
//!
//! Each mutation re-reads the file first, so calls within one process observe
//! each other. Across processes the read-modify-write is not isolated: two
//! concurrent writers can lose an update. The atomic rename only guarantees
//! that every write is internally consistent.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::atomic::atomic_write;
use crate::config::Level;
use crate::error::CoreError;
use crate::session::{Session, sort_most_recent_first, validate_score};

/// Storage for session records.
pub trait SessionStore: Send + Sync + fmt::Debug {
    /// All valid sessions, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the backing storage cannot be read.
    fn list(&self) -> Result<Vec<Session>, CoreError>;

    /// Start and persist a new session.
    ///
    /// The template and level are stored as given; checking them against the
    /// configuration is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the session cannot be persisted.
    fn create(&self, template_id: &str, level: Level) -> Result<Session, CoreError>;

    /// Set the score, and the notes when provided, of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidScore` if `score` is not finite or outside
    /// `[0, 10]`. Returns `CoreError::SessionNotFound` if no session has `id`.
    /// Nothing is written in either case.
    fn update_score(&self, id: &str, score: f64, notes: Option<&str>) -> Result<(), CoreError>;

    /// Remove every session.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Io` if the empty collection cannot be persisted.
    fn clear(&self) -> Result<(), CoreError>;
}

fn apply_score(
    sessions: &mut [Session],
    id: &str,
    score: f64,
    notes: Option<&str>,
) -> Result<(), CoreError> {
    let session = sessions
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| CoreError::SessionNotFound(id.to_owned()))?;
    session.evaluate(score, notes)
}

// ── JSON file store ──────────────────────────────────────────

/// Session store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store for the given file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every valid record in file order.
    ///
    /// A missing file is an empty store. A file that is not valid JSON, or
    /// whose top level is not an array, is also treated as empty. Elements
    /// that fail validation are dropped individually.
    fn load(&self) -> Result<Vec<Session>, CoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let items = match serde_json::from_slice::<Value>(&bytes) {
            Ok(Value::Array(items)) => items,
            Ok(_) => {
                warn!(path = %self.path.display(), "session store is not a JSON array, treating as empty");
                return Ok(Vec::new());
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "session store is corrupt, treating as empty");
                return Ok(Vec::new());
            }
        };

        let total = items.len();
        let sessions: Vec<Session> = items.iter().filter_map(Session::from_value).collect();
        if sessions.len() < total {
            debug!(
                dropped = total - sessions.len(),
                "dropped invalid session records"
            );
        }
        Ok(sessions)
    }

    fn save(&self, sessions: &[Session]) -> Result<(), CoreError> {
        let mut json = serde_json::to_vec_pretty(sessions)?;
        json.push(b'\n');
        atomic_write(&self.path, &json)?;
        Ok(())
    }
}

impl SessionStore for JsonFileStore {
    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn list(&self) -> Result<Vec<Session>, CoreError> {
        let mut sessions = self.load()?;
        sort_most_recent_first(&mut sessions);
        Ok(sessions)
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn create(&self, template_id: &str, level: Level) -> Result<Session, CoreError> {
        let mut sessions = self.load()?;
        let session = Session::start(template_id, level);
        sessions.push(session.clone());
        self.save(&sessions)?;
        debug!(id = %session.id, "created session");
        Ok(session)
    }

    #[instrument(skip(self, notes), fields(path = %self.path.display()))]
    fn update_score(&self, id: &str, score: f64, notes: Option<&str>) -> Result<(), CoreError> {
        validate_score(score)?;
        let mut sessions = self.load()?;
        apply_score(&mut sessions, id, score, notes)?;
        self.save(&sessions)?;
        debug!("updated session score");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn clear(&self) -> Result<(), CoreError> {
        self.save(&[])
    }
}

// ── In-memory store ──────────────────────────────────────────

/// Session store that keeps records in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: Mutex<Vec<Session>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with sessions.
    pub fn with_sessions(sessions: Vec<Session>) -> Self {
        Self {
            sessions: Mutex::new(sessions),
        }
    }

    fn sessions(&self) -> std::sync::MutexGuard<'_, Vec<Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionStore for MemoryStore {
    fn list(&self) -> Result<Vec<Session>, CoreError> {
        let mut sessions = self.sessions().clone();
        sort_most_recent_first(&mut sessions);
        Ok(sessions)
    }

    fn create(&self, template_id: &str, level: Level) -> Result<Session, CoreError> {
        let session = Session::start(template_id, level);
        self.sessions().push(session.clone());
        Ok(session)
    }

    fn update_score(&self, id: &str, score: f64, notes: Option<&str>) -> Result<(), CoreError> {
        validate_score(score)?;
        apply_score(&mut self.sessions(), id, score, notes)
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.sessions().clear();
        Ok(())
    }
}
