//! Session state for the HTTP surface
//!
//! Each session owns one uploaded dataset plus everything derived from it:
//! the active filter selection and the most recently generated figures.
//! Derived state is invalidated whenever something upstream changes:
//! - a new dataset resets the filters to all-values and clears the figures
//! - a new filter selection clears the figures
//!
//! Sessions carry a last-activity timestamp so idle ones can be swept.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::chart::Figure;
use crate::filter::FilterSelection;
use crate::{ChartdeckError, Dataset, Result};

/// One client's pipeline state.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier
    pub id: String,
    /// File name the dataset was uploaded under
    pub source_name: Option<String>,
    /// The uploaded dataset, unfiltered
    pub dataset: Option<Dataset>,
    /// Active per-column value selections
    pub filters: FilterSelection,
    /// Figures generated from the last chart request
    pub figures: Vec<Figure>,
    /// Last activity timestamp for timeout tracking
    pub last_activity: Instant,
}

impl Session {
    /// Create a new session with a generated id
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string().replace("-", "")[..12].to_string(),
            source_name: None,
            dataset: None,
            filters: FilterSelection::empty(),
            figures: Vec::new(),
            last_activity: Instant::now(),
        }
    }

    /// Install a freshly loaded dataset. Filters reset to every value of
    /// every categorical column and existing figures are dropped.
    pub fn set_dataset(&mut self, source_name: impl Into<String>, dataset: Dataset) -> Result<()> {
        self.filters = FilterSelection::all_of(&dataset)?;
        self.source_name = Some(source_name.into());
        self.dataset = Some(dataset);
        self.figures.clear();
        Ok(())
    }

    /// Replace the filter selection. Figures built from the previous
    /// selection are dropped.
    pub fn set_filters(&mut self, filters: FilterSelection) -> Result<()> {
        let dataset = self.dataset.as_ref().ok_or_else(no_dataset)?;
        filters.validate(dataset)?;
        self.filters = filters;
        self.figures.clear();
        Ok(())
    }

    /// Replace the generated figures.
    pub fn set_figures(&mut self, figures: Vec<Figure>) {
        self.figures = figures;
    }

    /// The dataset with the active filters applied.
    pub fn filtered_dataset(&self) -> Result<Dataset> {
        let dataset = self.dataset.as_ref().ok_or_else(no_dataset)?;
        self.filters.apply(dataset)
    }

    /// Update last activity timestamp
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Check if session has expired
    pub fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

fn no_dataset() -> ChartdeckError {
    ChartdeckError::SessionError("no dataset uploaded yet".to_string())
}

/// Manages all active sessions
pub struct SessionManager {
    /// Active sessions indexed by session id
    sessions: RwLock<HashMap<String, Session>>,
    /// Session inactivity timeout
    timeout: Duration,
}

impl SessionManager {
    /// Create a new session manager with the specified timeout
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    /// Create a new session and return its id
    pub fn create_session(&self) -> String {
        let session = Session::new();
        let id = session.id.clone();
        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(id.clone(), session);
        id
    }

    /// Run `f` against a session without touching its activity clock.
    /// Returns `None` when the session does not exist.
    pub fn with_session<T>(&self, id: &str, f: impl FnOnce(&Session) -> T) -> Option<T> {
        let sessions = self.sessions.read().unwrap();
        sessions.get(id).map(f)
    }

    /// Run `f` against a session mutably, updating its activity clock.
    /// Returns `None` when the session does not exist.
    pub fn update_session<T>(&self, id: &str, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.sessions.write().unwrap();
        sessions.get_mut(id).map(|session| {
            session.touch();
            f(session)
        })
    }

    /// Delete a session
    pub fn delete_session(&self, id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(id).is_some()
    }

    /// Remove expired sessions, returning how many were dropped
    pub fn remove_expired(&self) -> usize {
        let mut sessions = self.sessions.write().unwrap();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(self.timeout));
        before - sessions.len()
    }

    /// Check if a session exists
    pub fn session_exists(&self, id: &str) -> bool {
        let sessions = self.sessions.read().unwrap();
        sessions.contains_key(id)
    }

    /// Get session count (for health check)
    pub fn session_count(&self) -> usize {
        let sessions = self.sessions.read().unwrap();
        sessions.len()
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}
