//! # Persistence
//!
//! Typed JSON persistence over a host-provided key/value store.
//!
//! Writes are fire-and-forget: the `save_*` helpers log a failed write and
//! carry on, since in-memory state stays authoritative and the next successful
//! write carries it forward. The `try_save_*` variants surface the error.
//!
//! | Key | Value |
//! |-----|-------|
//! | `@achievements` | achievement catalog |
//! | `@current_streak` | `{streak, lastUpdateDate}` |
//! | `@goals_reached` | lifetime goal days |
//! | `@daily_goal` | step goal (decimal string) |
//! | `@step_records` | most recent daily step totals, newest first |
//! | `@sessions` | most recent completed sessions, newest first |

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::achievements::Achievement;
use crate::error::{ActivityError, Result};
use crate::session::CompletedSessionRecord;
use crate::steps::StepRecord;
use crate::streak::StreakState;

pub const ACHIEVEMENTS_KEY: &str = "@achievements";
pub const STREAK_KEY: &str = "@current_streak";
pub const GOALS_REACHED_KEY: &str = "@goals_reached";
pub const DAILY_GOAL_KEY: &str = "@daily_goal";
pub const STEP_RECORDS_KEY: &str = "@step_records";
pub const SESSIONS_KEY: &str = "@sessions";

pub const DEFAULT_DAILY_GOAL: u64 = 10_000;

/// String key/value storage (AsyncStorage, SharedPreferences, UserDefaults, ...).
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Arc<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

/// In-process store. Can be switched into a failing mode to exercise the
/// write-failure paths.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    fail_writes: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| ActivityError::write_failure(key, "store lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.lock().map(|f| *f).unwrap_or(false) {
            return Err(ActivityError::write_failure(key, "writes disabled"));
        }
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| ActivityError::write_failure(key, "store lock poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// History retention limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct StoreLimits {
    /// Days of step totals kept. Default: 30
    pub step_history_len: u32,
    /// Completed sessions kept. Default: 50
    pub session_history_len: u32,
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self {
            step_history_len: 30,
            session_history_len: 50,
        }
    }
}

/// Typed access to everything the app persists.
#[derive(Debug)]
pub struct ActivityStore<S: KeyValueStore> {
    store: S,
    limits: StoreLimits,
}

impl<S: KeyValueStore> ActivityStore<S> {
    pub fn new(store: S) -> Self {
        Self::with_limits(store, StoreLimits::default())
    }

    pub fn with_limits(store: S, limits: StoreLimits) -> Self {
        Self { store, limits }
    }

    pub fn inner(&self) -> &S {
        &self.store
    }

    pub fn limits(&self) -> StoreLimits {
        self.limits
    }

    // ------------------------------------------------------------------------
    // JSON plumbing
    // ------------------------------------------------------------------------

    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store.set(key, &raw)?;
        debug!("[ActivityStore] Wrote {} ({} bytes)", key, raw.len());
        Ok(())
    }

    /// Load `key`, falling back to `None` (with a warning) on read or parse errors.
    fn load_or_warn<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.load_json(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("[ActivityStore] Failed to load {}: {}", key, e);
                None
            }
        }
    }

    fn save_or_warn<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        match self.write_json(key, value) {
            Ok(()) => true,
            Err(e) => {
                warn!("[ActivityStore] Failed to save {}: {}", key, e);
                false
            }
        }
    }

    // ------------------------------------------------------------------------
    // Rewards
    // ------------------------------------------------------------------------

    pub fn load_catalog(&self) -> Option<Vec<Achievement>> {
        self.load_or_warn(ACHIEVEMENTS_KEY)
    }

    pub fn try_save_catalog(&self, achievements: &[Achievement]) -> Result<()> {
        self.write_json(ACHIEVEMENTS_KEY, achievements)
    }

    pub fn save_catalog(&self, achievements: &[Achievement]) -> bool {
        self.save_or_warn(ACHIEVEMENTS_KEY, achievements)
    }

    pub fn load_streak(&self) -> StreakState {
        self.load_or_warn(STREAK_KEY).unwrap_or_default()
    }

    pub fn save_streak(&self, streak: &StreakState) -> bool {
        self.save_or_warn(STREAK_KEY, streak)
    }

    pub fn load_goals_reached(&self) -> Option<u32> {
        self.load_or_warn(GOALS_REACHED_KEY)
    }

    pub fn save_goals_reached(&self, count: u32) -> bool {
        self.save_or_warn(GOALS_REACHED_KEY, &count)
    }

    // ------------------------------------------------------------------------
    // Steps
    // ------------------------------------------------------------------------

    /// Stored daily goal, or [`DEFAULT_DAILY_GOAL`] if unset or unreadable.
    pub fn daily_goal(&self) -> u64 {
        match self.store.get(DAILY_GOAL_KEY) {
            Ok(Some(raw)) => match raw.trim().parse::<u64>() {
                Ok(goal) if goal > 0 => goal,
                _ => {
                    warn!("[ActivityStore] Ignoring invalid daily goal {:?}", raw);
                    DEFAULT_DAILY_GOAL
                }
            },
            Ok(None) => DEFAULT_DAILY_GOAL,
            Err(e) => {
                warn!("[ActivityStore] Failed to load {}: {}", DAILY_GOAL_KEY, e);
                DEFAULT_DAILY_GOAL
            }
        }
    }

    /// Store a new daily goal. Zero is raised to one step.
    pub fn set_daily_goal(&self, goal: u64) -> Result<u64> {
        let goal = goal.max(1);
        self.store.set(DAILY_GOAL_KEY, &goal.to_string())?;
        Ok(goal)
    }

    pub fn step_history(&self) -> Vec<StepRecord> {
        self.load_or_warn(STEP_RECORDS_KEY).unwrap_or_default()
    }

    /// Record today's total, replacing any earlier entry for the same date.
    /// Returns the updated history (newest first).
    pub fn save_steps(&self, date: NaiveDate, steps: u64, goal: u64) -> Vec<StepRecord> {
        let mut history: Vec<StepRecord> = self
            .step_history()
            .into_iter()
            .filter(|r| r.date != date)
            .collect();
        history.insert(0, StepRecord { date, steps, goal });
        history.truncate(self.limits.step_history_len as usize);
        self.save_or_warn(STEP_RECORDS_KEY, &history);
        history
    }

    // ------------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------------

    pub fn session_history(&self) -> Vec<CompletedSessionRecord> {
        self.load_or_warn(SESSIONS_KEY).unwrap_or_default()
    }

    /// Prepend a finished session, dropping the oldest beyond the limit.
    pub fn save_session(&self, record: &CompletedSessionRecord) -> bool {
        let mut history = self.session_history();
        history.retain(|r| r.id != record.id);
        history.insert(0, record.clone());
        history.truncate(self.limits.session_history_len as usize);
        self.save_or_warn(SESSIONS_KEY, &history)
    }
}
