//! FFI bindings for mobile platforms (iOS/Android).
//!
//! This module provides the UniFFI bindings that expose the engine to
//! Kotlin and Swift (and React Native through them). All FFI functions are
//! prefixed with `ffi_` to avoid naming conflicts with the internal API.
//!
//! State lives in a process-wide [`ActivityEngine`] behind a mutex, so every
//! call (UI action, location fix, step update) runs to completion before the
//! next one starts. Host callbacks must not call back into `ffi_*` functions.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use once_cell::sync::Lazy;

use crate::clock::{Clock, SystemClock};
use crate::error::ActivityError;
use crate::format;
use crate::providers::{LocationProvider, LocationSubscription, PermissionStatus, WatchOptions};
use crate::rewards::{CompletionSummary, RewardsEngine};
use crate::session::{CompletedSessionRecord, SessionConfig, SessionState, TrackingSession, TrackingStats};
use crate::steps::{DailyEstimates, StepRecord};
use crate::store::{ActivityStore, KeyValueStore};
use crate::{init_logging, Achievement, Bounds, LocationSample, RoutePoint};

// ============================================================================
// Host Callback Interfaces
// ============================================================================

/// Platform location services. Implement this in Kotlin/Swift.
///
/// While a watch is running, forward each fix to [`ffi_on_location_update`].
#[uniffi::export(callback_interface)]
pub trait HostLocationProvider: Send + Sync {
    fn is_supported(&self) -> bool;
    fn request_permission(&self) -> PermissionStatus;
    /// One-shot current position; `None` if no fix could be obtained.
    fn current_fix(&self) -> Option<LocationSample>;
    /// Begin delivering fixes. Return `false` if the watch could not start.
    fn start_watch(&self, options: WatchOptions) -> bool;
    /// Stop delivering fixes before returning.
    fn stop_watch(&self);
}

/// Durable key/value storage (AsyncStorage, SharedPreferences, UserDefaults).
#[uniffi::export(callback_interface)]
pub trait HostKeyValueStore: Send + Sync {
    fn get(&self, key: String) -> Option<String>;
    /// Return `false` if the write failed.
    fn set(&self, key: String, value: String) -> bool;
}

struct CallbackLocationProvider {
    host: Arc<dyn HostLocationProvider>,
}

struct CallbackWatch {
    host: Arc<dyn HostLocationProvider>,
}

impl LocationSubscription for CallbackWatch {
    fn unsubscribe(&mut self) {
        self.host.stop_watch();
    }
}

impl LocationProvider for CallbackLocationProvider {
    type Subscription = CallbackWatch;

    fn is_supported(&self) -> bool {
        self.host.is_supported()
    }

    fn request_permission(&self) -> PermissionStatus {
        self.host.request_permission()
    }

    fn current_fix(&self) -> crate::Result<LocationSample> {
        self.host
            .current_fix()
            .ok_or_else(|| ActivityError::LocationUnavailable("no current fix".to_string()))
    }

    fn subscribe(&self, options: WatchOptions) -> crate::Result<CallbackWatch> {
        if self.host.start_watch(options) {
            Ok(CallbackWatch { host: Arc::clone(&self.host) })
        } else {
            Err(ActivityError::LocationUnavailable("location watch failed to start".to_string()))
        }
    }
}

struct CallbackStore {
    host: Box<dyn HostKeyValueStore>,
}

impl KeyValueStore for CallbackStore {
    fn get(&self, key: &str) -> crate::Result<Option<String>> {
        Ok(self.host.get(key.to_string()))
    }

    fn set(&self, key: &str, value: &str) -> crate::Result<()> {
        if self.host.set(key.to_string(), value.to_string()) {
            Ok(())
        } else {
            Err(ActivityError::write_failure(key, "host store rejected write"))
        }
    }
}

// ============================================================================
// Errors and Records
// ============================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
#[uniffi(flat_error)]
pub enum FfiActivityError {
    #[error("Engine not initialized; call ffi_init first")]
    NotInitialized,
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    DeviceUnsupported(String),
    #[error("{0}")]
    LocationUnavailable(String),
    #[error("{0}")]
    InvalidStateTransition(String),
    #[error("{0}")]
    Persistence(String),
}

impl From<ActivityError> for FfiActivityError {
    fn from(e: ActivityError) -> Self {
        let msg = e.to_string();
        match e {
            ActivityError::PermissionDenied(_) => Self::PermissionDenied(msg),
            ActivityError::DeviceUnsupported(_) => Self::DeviceUnsupported(msg),
            ActivityError::LocationUnavailable(_) | ActivityError::TransientLocationFailure(_) => {
                Self::LocationUnavailable(msg)
            }
            ActivityError::InvalidStateTransition { .. } => Self::InvalidStateTransition(msg),
            ActivityError::PersistenceWriteFailure { .. } | ActivityError::Serialization(_) => {
                Self::Persistence(msg)
            }
        }
    }
}

/// Step history entry with the date as `YYYY-MM-DD`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStepRecord {
    pub date: String,
    pub steps: u64,
    pub goal: u64,
}

impl From<StepRecord> for FfiStepRecord {
    fn from(r: StepRecord) -> Self {
        Self {
            date: r.date.format("%Y-%m-%d").to_string(),
            steps: r.steps,
            goal: r.goal,
        }
    }
}

// ============================================================================
// Engine Singleton
// ============================================================================

type HostStore = Arc<CallbackStore>;

/// Everything the app keeps alive between FFI calls.
pub struct ActivityEngine {
    session: TrackingSession<CallbackLocationProvider>,
    rewards: RewardsEngine<HostStore>,
    history: ActivityStore<HostStore>,
}

static ENGINE: Lazy<Mutex<Option<ActivityEngine>>> = Lazy::new(|| Mutex::new(None));

fn with_engine<R>(f: impl FnOnce(&mut ActivityEngine) -> R) -> Result<R, FfiActivityError> {
    let mut guard = ENGINE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    match guard.as_mut() {
        Some(engine) => Ok(f(engine)),
        None => {
            warn!("[ActivityEngineRust] Called before ffi_init");
            Err(FfiActivityError::NotInitialized)
        }
    }
}

/// Create (or replace) the engine with host collaborators.
#[uniffi::export]
pub fn ffi_init(
    location: Box<dyn HostLocationProvider>,
    store: Box<dyn HostKeyValueStore>,
    config: SessionConfig,
) {
    init_logging();
    info!("[ActivityEngineRust] Initializing engine");

    let store: HostStore = Arc::new(CallbackStore { host: store });
    let provider = CallbackLocationProvider { host: Arc::from(location) };

    let engine = ActivityEngine {
        session: TrackingSession::with_clock(provider, SystemClock, config),
        rewards: RewardsEngine::load(ActivityStore::new(Arc::clone(&store)), SystemClock),
        history: ActivityStore::new(store),
    };

    let mut guard = ENGINE.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = Some(engine);
}

#[uniffi::export]
pub fn default_session_config() -> SessionConfig {
    SessionConfig::default()
}

// ============================================================================
// Tracking Session
// ============================================================================

#[uniffi::export]
pub fn ffi_start_session() -> Result<(), FfiActivityError> {
    with_engine(|e| e.session.start())?.map_err(Into::into)
}

#[uniffi::export]
pub fn ffi_pause_session() -> Result<(), FfiActivityError> {
    with_engine(|e| e.session.pause())?.map_err(Into::into)
}

#[uniffi::export]
pub fn ffi_resume_session() -> Result<(), FfiActivityError> {
    with_engine(|e| e.session.resume())?.map_err(Into::into)
}

/// Stop the session and append its record to the session history.
#[uniffi::export]
pub fn ffi_stop_session() -> Result<Option<CompletedSessionRecord>, FfiActivityError> {
    with_engine(|e| -> Result<Option<CompletedSessionRecord>, FfiActivityError> {
        let record = e.session.stop()?;
        if let Some(ref r) = record {
            e.history.save_session(r);
        }
        Ok(record)
    })?
}

#[uniffi::export]
pub fn ffi_reset_session() -> Result<(), FfiActivityError> {
    with_engine(|e| e.session.reset())
}

/// Forward one fix from the host's location watch.
#[uniffi::export]
pub fn ffi_on_location_update(sample: LocationSample) -> bool {
    with_engine(|e| e.session.on_location_update(sample)).unwrap_or(false)
}

#[uniffi::export]
pub fn ffi_on_location_error(message: String) {
    let _ = with_engine(|e| e.session.on_location_error(&message));
}

#[uniffi::export]
pub fn ffi_session_state() -> SessionState {
    with_engine(|e| e.session.state()).unwrap_or(SessionState::Idle)
}

#[uniffi::export]
pub fn ffi_session_stats() -> TrackingStats {
    with_engine(|e| e.session.stats()).unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_session_route() -> Vec<RoutePoint> {
    with_engine(|e| e.session.route().to_vec()).unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_current_position() -> Option<LocationSample> {
    with_engine(|e| e.session.current_position().copied()).ok().flatten()
}

#[uniffi::export]
pub fn ffi_session_route_bounds() -> Option<Bounds> {
    with_engine(|e| e.session.route_bounds()).ok().flatten()
}

#[uniffi::export]
pub fn ffi_session_history() -> Vec<CompletedSessionRecord> {
    with_engine(|e| e.history.session_history()).unwrap_or_default()
}

// ============================================================================
// Rewards
// ============================================================================

/// Evaluate today's steps; returns achievements unlocked by this call.
#[uniffi::export]
pub fn ffi_evaluate_steps(steps_today: u64, daily_goal_met: bool, daily_goal: u64) -> Vec<Achievement> {
    with_engine(|e| {
        let outcome = e.rewards.evaluate(steps_today, daily_goal_met, daily_goal);
        debug!(
            "[ActivityEngineRust] evaluate({}) -> {} unlocked",
            steps_today,
            outcome.unlocked.len()
        );
        outcome.unlocked
    })
    .unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_achievements() -> Vec<Achievement> {
    with_engine(|e| e.rewards.achievements().to_vec()).unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_take_new_unlocks() -> Vec<Achievement> {
    with_engine(|e| e.rewards.take_new_unlocks()).unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_completion_summary() -> Result<CompletionSummary, FfiActivityError> {
    with_engine(|e| e.rewards.summary())
}

#[uniffi::export]
pub fn ffi_current_streak() -> u32 {
    with_engine(|e| e.rewards.display_streak()).unwrap_or(0)
}

#[uniffi::export]
pub fn ffi_goals_reached() -> u32 {
    with_engine(|e| e.rewards.goals_reached()).unwrap_or(0)
}

#[uniffi::export]
pub fn ffi_reset_streak() -> Result<(), FfiActivityError> {
    with_engine(|e| e.rewards.reset_streak())
}

// ============================================================================
// Steps
// ============================================================================

#[uniffi::export]
pub fn ffi_daily_goal() -> u64 {
    with_engine(|e| e.history.daily_goal()).unwrap_or(crate::store::DEFAULT_DAILY_GOAL)
}

#[uniffi::export]
pub fn ffi_set_daily_goal(goal: u64) -> Result<u64, FfiActivityError> {
    with_engine(|e| e.history.set_daily_goal(goal))?.map_err(Into::into)
}

/// Record today's total against the current goal; returns the updated history.
#[uniffi::export]
pub fn ffi_save_steps(steps: u64) -> Vec<FfiStepRecord> {
    with_engine(|e| {
        let goal = e.history.daily_goal();
        e.history
            .save_steps(SystemClock.today(), steps, goal)
            .into_iter()
            .map(FfiStepRecord::from)
            .collect()
    })
    .unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_step_history() -> Vec<FfiStepRecord> {
    with_engine(|e| {
        e.history
            .step_history()
            .into_iter()
            .map(FfiStepRecord::from)
            .collect()
    })
    .unwrap_or_default()
}

#[uniffi::export]
pub fn ffi_daily_estimates(steps: u64, goal: u64) -> DailyEstimates {
    DailyEstimates::from_steps(steps, goal)
}

// ============================================================================
// Formatting
// ============================================================================

#[uniffi::export]
pub fn ffi_format_duration(duration_ms: i64) -> String {
    format::format_duration_ms(duration_ms)
}

#[uniffi::export]
pub fn ffi_format_distance(meters: f64) -> String {
    format::format_distance(meters)
}

#[uniffi::export]
pub fn ffi_format_speed(kmh: f64) -> String {
    format::format_speed(kmh)
}

#[uniffi::export]
pub fn ffi_format_pace(kmh: f64) -> String {
    format::format_pace(kmh)
}
