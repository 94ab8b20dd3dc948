//! Per-session navigation history and UI preferences

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::{mapref::one::RefMut, DashMap};
use serde::{Deserialize, Serialize};

use crate::util::time::unix_millis;

/// Entries kept per navigation history
pub const MAX_HISTORY: usize = 10;

/// Capped back-stack of visited paths, oldest first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NavigationHistory {
    entries: VecDeque<String>,
}

impl NavigationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a visit. Repeating the current path is a no-op; the oldest entry
    /// is evicted past the cap.
    pub fn push(&mut self, path: &str) {
        if self.entries.back().map(String::as_str) == Some(path) {
            return;
        }

        self.entries.push_back(path.to_string());
        while self.entries.len() > MAX_HISTORY {
            self.entries.pop_front();
        }
    }

    /// Leave the current path and return the one to go back to
    pub fn back(&mut self) -> Option<String> {
        if self.entries.len() < 2 {
            return None;
        }
        self.entries.pop_back();
        self.entries.back().cloned()
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.back().map(String::as_str)
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }
}

/// Which index the search box queries
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Products,
    Suppliers,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub search_mode: SearchMode,
}

/// Sessions untouched for this long are dropped by `purge_idle`
pub const SESSION_IDLE_TTL: Duration = Duration::from_secs(2 * 60 * 60);

#[derive(Debug, Clone, Default)]
struct SessionState {
    history: NavigationHistory,
    preferences: Preferences,
    /// Unix millis of the last read or write
    last_seen: u64,
}

/// Session state keyed by the client's session id
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, SessionState>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn touch(&self, session: &str) -> RefMut<'_, String, SessionState> {
        let mut state = self.sessions.entry(session.to_string()).or_default();
        state.last_seen = unix_millis();
        state
    }

    pub fn visit(&self, session: &str, path: &str) -> NavigationHistory {
        let mut state = self.touch(session);
        state.history.push(path);
        state.history.clone()
    }

    pub fn back(&self, session: &str) -> Option<String> {
        let mut state = self.sessions.get_mut(session)?;
        state.last_seen = unix_millis();
        state.history.back()
    }

    pub fn history(&self, session: &str) -> NavigationHistory {
        self.sessions
            .get(session)
            .map(|s| s.history.clone())
            .unwrap_or_default()
    }

    pub fn preferences(&self, session: &str) -> Preferences {
        self.sessions
            .get(session)
            .map(|s| s.preferences)
            .unwrap_or_default()
    }

    pub fn set_preferences(&self, session: &str, preferences: Preferences) {
        self.touch(session).preferences = preferences;
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Drop sessions idle for at least `max_idle`, returning how many went
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        self.purge_idle_at(max_idle, unix_millis())
    }

    fn purge_idle_at(&self, max_idle: Duration, now: u64) -> usize {
        let max_idle = max_idle.as_millis() as u64;
        let before = self.sessions.len();
        self.sessions
            .retain(|_, state| now < state.last_seen.saturating_add(max_idle));
        before.saturating_sub(self.sessions.len())
    }
}
