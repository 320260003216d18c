//! # Activity Engine
//!
//! Core logic for a step-counting and GPS activity app: the tracking session
//! state machine and the achievement/streak rewards engine.
//!
//! This library provides:
//! - GPS session tracking with pause-aware duration and haversine distance
//! - Achievement evaluation for step, streak and goal-count milestones
//! - Typed JSON persistence over any key/value store
//!
//! Sensors, maps and storage stay on the host side; the engine only sees
//! them through the traits in [`providers`] and [`store`].
//!
//! ## Features
//!
//! - **`ffi`** - Enable FFI bindings for mobile platforms (iOS/Android)
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use activity_engine::{RewardsEngine, ManualClock};
//! use chrono::NaiveDate;
//!
//! let clock = ManualClock::at_date(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
//! let mut rewards = RewardsEngine::with_clock(clock);
//!
//! let outcome = rewards.evaluate(12_000, true, 10_000);
//! assert!(outcome.unlocked.iter().any(|a| a.id == "achiever"));
//! assert_eq!(rewards.streak().current_streak, 1);
//! ```

use serde::{Deserialize, Serialize};

pub mod achievements;
pub mod clock;
pub mod error;
pub mod format;
pub mod geo_utils;
pub mod providers;
pub mod rewards;
pub mod session;
pub mod steps;
pub mod store;
pub mod streak;

#[cfg(feature = "ffi")]
pub mod ffi;

pub use achievements::{default_catalog, Achievement, AchievementCategory, Catalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ActivityError, Result};
pub use providers::{
    LocationProvider, LocationSubscription, PermissionStatus, StepCounter, WatchOptions,
};
pub use rewards::{CompletionSummary, EvaluationOutcome, RewardsEngine};
pub use session::{
    CompletedSessionRecord, SessionConfig, SessionState, TrackingSession, TrackingStats,
};
pub use steps::{DailyEstimates, StepRecord, StepTally};
pub use store::{ActivityStore, KeyValueStore, MemoryStore, StoreLimits};
pub use streak::StreakState;

#[cfg(feature = "ffi")]
uniffi::setup_scaffolding!();

/// Initialize logging for Android (only used in FFI)
#[cfg(all(feature = "ffi", target_os = "android"))]
pub(crate) fn init_logging() {
    use android_logger::Config;
    use log::LevelFilter;

    android_logger::init_once(
        Config::default()
            .with_max_level(LevelFilter::Debug)
            .with_tag("ActivityEngineRust")
    );
}

#[cfg(all(feature = "ffi", not(target_os = "android")))]
pub(crate) fn init_logging() {
    // No-op on non-Android platforms
}

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use activity_engine::GpsPoint;
/// let point = GpsPoint::new(51.5074, -0.1278); // London
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a route.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Get the center point of the bounds.
    pub fn center(&self) -> GpsPoint {
        GpsPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// A single fix from the location provider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Fix time in milliseconds since the Unix epoch
    pub timestamp_ms: i64,
    /// Reported ground speed; `None` when the provider has no estimate
    pub speed_mps: Option<f64>,
}

impl LocationSample {
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
            speed_mps: None,
        }
    }

    pub fn with_speed(mut self, speed_mps: f64) -> Self {
        self.speed_mps = Some(speed_mps);
        self
    }

    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

/// A fix retained on a session's route. Never mutated once appended.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct RoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(rename = "timestamp")]
    pub timestamp_ms: i64,
}

impl RoutePoint {
    pub fn point(&self) -> GpsPoint {
        GpsPoint::new(self.latitude, self.longitude)
    }
}

impl From<&LocationSample> for RoutePoint {
    fn from(sample: &LocationSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp_ms: sample.timestamp_ms,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
