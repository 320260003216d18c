//! # Tracking Session
//!
//! State machine for a single GPS-tracked walk or run.
//!
//! ```text
//! Idle ──start──▶ Active ◀──resume── Paused
//!                   │  └────pause────▶ │
//!                   └──────stop──────▶ Stopped ──start──▶ Active
//! ```
//!
//! Fixes delivered while `Paused` only move the displayed position; they are
//! never appended to the route and never add distance. Elapsed time is wall
//! time since `start` minus every paused interval.

use std::fmt;

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{ActivityError, Result};
use crate::geo_utils;
use crate::providers::{LocationProvider, LocationSubscription, WatchOptions};
use crate::{Bounds, GpsPoint, LocationSample, RoutePoint};

// ============================================================================
// Types
// ============================================================================

/// Lifecycle state of a [`TrackingSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum SessionState {
    Idle,
    Active,
    Paused,
    Stopped,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Configuration for a tracking session.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct SessionConfig {
    /// Minimum time between location fixes requested from the provider.
    /// Default: 1000 ms
    pub location_interval_ms: u32,

    /// Minimum movement between location fixes requested from the provider.
    /// Default: 5.0 meters
    pub location_distance_interval_m: f64,

    /// Routes with fewer points than this are discarded at stop instead of
    /// producing a [`CompletedSessionRecord`].
    /// Default: 2 (the starting fix plus at least one tracked fix)
    pub min_points_for_record: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            location_interval_ms: 1000,
            location_distance_interval_m: 5.0,
            min_points_for_record: 2,
        }
    }
}

impl SessionConfig {
    pub fn watch_options(&self) -> WatchOptions {
        WatchOptions {
            interval_ms: self.location_interval_ms,
            distance_interval_m: self.location_distance_interval_m,
        }
    }
}

/// Live figures for the tracking screen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct TrackingStats {
    pub distance_meters: f64,
    /// Elapsed time net of pauses
    pub duration_ms: i64,
    pub avg_speed_kmh: f64,
    pub current_speed_kmh: f64,
}

/// A finished session, written once at stop time.
///
/// `duration_ms == end_timestamp_ms - start_timestamp_ms - total paused time`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
#[serde(rename_all = "camelCase")]
pub struct CompletedSessionRecord {
    pub id: String,
    pub start_timestamp_ms: i64,
    pub end_timestamp_ms: i64,
    pub route: Vec<RoutePoint>,
    pub distance_meters: f64,
    pub duration_ms: i64,
    pub avg_speed_kmh: f64,
}

// ============================================================================
// Session
// ============================================================================

/// Controller for one GPS-tracked activity at a time.
pub struct TrackingSession<P: LocationProvider, C: Clock = SystemClock> {
    provider: P,
    clock: C,
    config: SessionConfig,
    state: SessionState,
    route: Vec<RoutePoint>,
    current_position: Option<LocationSample>,
    subscription: Option<P::Subscription>,
    start_timestamp_ms: i64,
    end_timestamp_ms: Option<i64>,
    pause_started_ms: Option<i64>,
    accumulated_pause_ms: i64,
    final_duration_ms: i64,
    distance_meters: f64,
    current_speed_kmh: f64,
}

impl<P: LocationProvider> TrackingSession<P, SystemClock> {
    /// Create an idle session driven by the wall clock.
    pub fn new(provider: P) -> Self {
        Self::with_clock(provider, SystemClock, SessionConfig::default())
    }
}

impl<P: LocationProvider, C: Clock> TrackingSession<P, C> {
    pub fn with_clock(provider: P, clock: C, config: SessionConfig) -> Self {
        Self {
            provider,
            clock,
            config,
            state: SessionState::Idle,
            route: Vec::new(),
            current_position: None,
            subscription: None,
            start_timestamp_ms: 0,
            end_timestamp_ms: None,
            pause_started_ms: None,
            accumulated_pause_ms: 0,
            final_duration_ms: 0,
            distance_meters: 0.0,
            current_speed_kmh: 0.0,
        }
    }

    fn reject(&self, operation: &'static str) -> ActivityError {
        warn!("[TrackingSession] Rejected {} while {}", operation, self.state);
        ActivityError::InvalidStateTransition {
            from: self.state,
            operation,
        }
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Begin a new session from `Idle` or `Stopped`.
    ///
    /// Requests permission, takes one initial fix as the starting route point
    /// and subscribes to the location stream. On any failure the session is
    /// left exactly as it was.
    pub fn start(&mut self) -> Result<()> {
        if !matches!(self.state, SessionState::Idle | SessionState::Stopped) {
            return Err(self.reject("start"));
        }

        if !self.provider.is_supported() {
            warn!("[TrackingSession] Location services unsupported on this device");
            return Err(ActivityError::unsupported("Location tracking is not available on this device"));
        }

        if !self.provider.request_permission().is_granted() {
            warn!("[TrackingSession] Location permission denied");
            return Err(ActivityError::permission("Location permission denied"));
        }

        let fix = self.provider.current_fix().map_err(|e| match e {
            ActivityError::LocationUnavailable(_) => e,
            other => ActivityError::LocationUnavailable(other.to_string()),
        })?;
        if !fix.point().is_valid() {
            return Err(ActivityError::LocationUnavailable(format!(
                "initial fix has invalid coordinates ({}, {})",
                fix.latitude, fix.longitude
            )));
        }

        let subscription = self.provider.subscribe(self.config.watch_options())?;

        let now = self.clock.now_ms();
        self.route = vec![RoutePoint::from(&fix)];
        self.current_position = Some(fix);
        self.subscription = Some(subscription);
        self.start_timestamp_ms = now;
        self.end_timestamp_ms = None;
        self.pause_started_ms = None;
        self.accumulated_pause_ms = 0;
        self.final_duration_ms = 0;
        self.distance_meters = 0.0;
        self.current_speed_kmh = 0.0;
        self.state = SessionState::Active;

        info!(
            "[TrackingSession] Started at {} from ({:.6}, {:.6})",
            now, fix.latitude, fix.longitude
        );
        Ok(())
    }

    /// Handle one fix from the location stream.
    ///
    /// Returns `true` if the fix was appended to the route. The state is read
    /// at call time, so a pause that landed before this call applies to it.
    pub fn on_location_update(&mut self, sample: LocationSample) -> bool {
        match self.state {
            SessionState::Idle | SessionState::Stopped => {
                debug!("[TrackingSession] Ignoring fix while {}", self.state);
                false
            }
            SessionState::Paused => {
                self.current_position = Some(sample);
                false
            }
            SessionState::Active => self.record_fix(sample),
        }
    }

    fn record_fix(&mut self, sample: LocationSample) -> bool {
        let point = sample.point();
        if !point.is_valid() {
            warn!(
                "[TrackingSession] Dropping fix with invalid coordinates ({}, {})",
                sample.latitude, sample.longitude
            );
            return false;
        }

        let Some(last) = self.route.last() else {
            // Unreachable after a successful start; treat the fix as the origin.
            self.route.push(RoutePoint::from(&sample));
            self.current_position = Some(sample);
            return true;
        };

        if sample.timestamp_ms < last.timestamp_ms {
            warn!(
                "[TrackingSession] Dropping out-of-order fix ({} < {})",
                sample.timestamp_ms, last.timestamp_ms
            );
            return false;
        }

        let increment = geo_utils::haversine_distance(&last.point(), &point);
        self.distance_meters += increment;
        self.current_speed_kmh = geo_utils::mps_to_kmh(sample.speed_mps);
        self.route.push(RoutePoint::from(&sample));
        self.current_position = Some(sample);

        debug!(
            "[TrackingSession] Fix #{}: +{:.1}m (total {:.1}m, {:.1} km/h)",
            self.route.len(),
            increment,
            self.distance_meters,
            self.current_speed_kmh
        );
        true
    }

    /// Report a failed fix from the location stream. Tracking carries on with
    /// the samples already recorded.
    pub fn on_location_error(&mut self, message: &str) {
        let err = ActivityError::TransientLocationFailure(message.to_string());
        warn!("[TrackingSession] {} (state: {})", err, self.state);
    }

    pub fn pause(&mut self) -> Result<()> {
        if self.state != SessionState::Active {
            return Err(self.reject("pause"));
        }
        let now = self.clock.now_ms();
        self.pause_started_ms = Some(now);
        self.state = SessionState::Paused;
        info!("[TrackingSession] Paused at {}", now);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        if self.state != SessionState::Paused {
            return Err(self.reject("resume"));
        }
        let now = self.clock.now_ms();
        let paused_for = self.close_pause(now);
        self.state = SessionState::Active;
        info!("[TrackingSession] Resumed after {}ms paused", paused_for);
        Ok(())
    }

    fn close_pause(&mut self, now: i64) -> i64 {
        let paused_for = self
            .pause_started_ms
            .take()
            .map_or(0, |started| (now - started).max(0));
        self.accumulated_pause_ms += paused_for;
        paused_for
    }

    /// Finish the session from `Active` or `Paused`.
    ///
    /// The location watch is released before this returns. A record is
    /// produced only when the route has at least
    /// [`SessionConfig::min_points_for_record`] points.
    pub fn stop(&mut self) -> Result<Option<CompletedSessionRecord>> {
        if !matches!(self.state, SessionState::Active | SessionState::Paused) {
            return Err(self.reject("stop"));
        }

        self.release_subscription();

        let now = self.clock.now_ms();
        if self.state == SessionState::Paused {
            self.close_pause(now);
        }

        let duration_ms = (now - self.start_timestamp_ms - self.accumulated_pause_ms).max(0);
        let avg_speed_kmh = geo_utils::average_speed_kmh(self.distance_meters, duration_ms);

        self.final_duration_ms = duration_ms;
        self.end_timestamp_ms = Some(now);
        self.current_speed_kmh = 0.0;
        self.state = SessionState::Stopped;

        info!(
            "[TrackingSession] Stopped: {:.0}m in {}ms ({:.2} km/h avg, {} points)",
            self.distance_meters,
            duration_ms,
            avg_speed_kmh,
            self.route.len()
        );

        if self.route.len() < self.config.min_points_for_record as usize {
            debug!("[TrackingSession] Route too short to record");
            return Ok(None);
        }

        Ok(Some(CompletedSessionRecord {
            id: format!("session-{}", self.start_timestamp_ms),
            start_timestamp_ms: self.start_timestamp_ms,
            end_timestamp_ms: now,
            route: self.route.clone(),
            distance_meters: self.distance_meters,
            duration_ms,
            avg_speed_kmh,
        }))
    }

    /// Return to `Idle`, discarding the route and figures. An unfinished
    /// session is abandoned without a record.
    pub fn reset(&mut self) {
        if matches!(self.state, SessionState::Active | SessionState::Paused) {
            info!("[TrackingSession] Abandoning {} session", self.state);
        }
        self.release_subscription();
        self.state = SessionState::Idle;
        self.route.clear();
        self.current_position = None;
        self.start_timestamp_ms = 0;
        self.end_timestamp_ms = None;
        self.pause_started_ms = None;
        self.accumulated_pause_ms = 0;
        self.final_duration_ms = 0;
        self.distance_meters = 0.0;
        self.current_speed_kmh = 0.0;
    }

    fn release_subscription(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("[TrackingSession] Location watch released");
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Elapsed time net of pauses. Frozen while paused and after stop.
    pub fn duration_ms(&self) -> i64 {
        let elapsed = match self.state {
            SessionState::Idle => 0,
            SessionState::Active => {
                self.clock.now_ms() - self.start_timestamp_ms - self.accumulated_pause_ms
            }
            SessionState::Paused => {
                let paused_at = self.pause_started_ms.unwrap_or(self.start_timestamp_ms);
                paused_at - self.start_timestamp_ms - self.accumulated_pause_ms
            }
            SessionState::Stopped => self.final_duration_ms,
        };
        elapsed.max(0)
    }

    pub fn stats(&self) -> TrackingStats {
        let duration_ms = self.duration_ms();
        TrackingStats {
            distance_meters: self.distance_meters,
            duration_ms,
            avg_speed_kmh: geo_utils::average_speed_kmh(self.distance_meters, duration_ms),
            current_speed_kmh: self.current_speed_kmh,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// `true` while the session is `Active` or `Paused`.
    pub fn is_tracking(&self) -> bool {
        matches!(self.state, SessionState::Active | SessionState::Paused)
    }

    pub fn is_paused(&self) -> bool {
        self.state == SessionState::Paused
    }

    pub fn route(&self) -> &[RoutePoint] {
        &self.route
    }

    pub fn distance_meters(&self) -> f64 {
        self.distance_meters
    }

    pub fn current_speed_kmh(&self) -> f64 {
        self.current_speed_kmh
    }

    /// Most recent fix, including fixes received while paused.
    pub fn current_position(&self) -> Option<&LocationSample> {
        self.current_position.as_ref()
    }

    pub fn start_timestamp_ms(&self) -> i64 {
        self.start_timestamp_ms
    }

    pub fn end_timestamp_ms(&self) -> Option<i64> {
        self.end_timestamp_ms
    }

    pub fn accumulated_pause_ms(&self) -> i64 {
        self.accumulated_pause_ms
    }

    pub fn route_bounds(&self) -> Option<Bounds> {
        geo_utils::compute_bounds(&self.route_points())
    }

    pub fn route_center(&self) -> Option<GpsPoint> {
        geo_utils::compute_center(&self.route_points())
    }

    fn route_points(&self) -> Vec<GpsPoint> {
        self.route.iter().map(RoutePoint::point).collect()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl<P: LocationProvider, C: Clock> Drop for TrackingSession<P, C> {
    fn drop(&mut self) {
        self.release_subscription();
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::providers::PermissionStatus;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const T0: i64 = 1_700_000_000_000;

    fn approx_eq(a: f64, b: f64, epsilon: f64) -> bool {
        (a - b).abs() < epsilon
    }

    struct FakeSubscription {
        live: Arc<AtomicUsize>,
        released: bool,
    }

    impl LocationSubscription for FakeSubscription {
        fn unsubscribe(&mut self) {
            if !self.released {
                self.released = true;
                self.live.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    struct FakeProvider {
        supported: bool,
        permission: PermissionStatus,
        fix: Option<LocationSample>,
        live_watches: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        fn at(latitude: f64, longitude: f64) -> Self {
            Self {
                supported: true,
                permission: PermissionStatus::Granted,
                fix: Some(LocationSample::new(latitude, longitude, T0)),
                live_watches: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl LocationProvider for FakeProvider {
        type Subscription = FakeSubscription;

        fn is_supported(&self) -> bool {
            self.supported
        }

        fn request_permission(&self) -> PermissionStatus {
            self.permission
        }

        fn current_fix(&self) -> Result<LocationSample> {
            self.fix
                .ok_or_else(|| ActivityError::TransientLocationFailure("no fix".into()))
        }

        fn subscribe(&self, _options: WatchOptions) -> Result<FakeSubscription> {
            self.live_watches.fetch_add(1, Ordering::SeqCst);
            Ok(FakeSubscription {
                live: Arc::clone(&self.live_watches),
                released: false,
            })
        }
    }

    fn session_at(provider: FakeProvider) -> (TrackingSession<FakeProvider, ManualClock>, ManualClock) {
        let clock = ManualClock::new(T0);
        let session = TrackingSession::with_clock(provider, clock.clone(), SessionConfig::default());
        (session, clock)
    }

    fn fix(latitude: f64, longitude: f64, clock: &ManualClock) -> LocationSample {
        LocationSample::new(latitude, longitude, clock.now_ms())
    }

    #[test]
    fn test_three_fixes_one_second_apart() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();

        clock.advance(1000);
        assert!(session.on_location_update(fix(0.0, 0.001, &clock)));
        clock.advance(1000);
        assert!(session.on_location_update(fix(0.0, 0.002, &clock)));

        assert!(approx_eq(session.distance_meters(), 222.39, 0.5));
        assert_eq!(session.duration_ms(), 2000);
        assert_eq!(session.route().len(), 3);

        let record = session.stop().unwrap().expect("record");
        assert_eq!(record.duration_ms, 2000);
        assert_eq!(record.route.len(), 3);
        assert!(approx_eq(record.distance_meters, 222.39, 0.5));
        // 0.22239 km in 2 s
        assert!(approx_eq(record.avg_speed_kmh, 400.3, 0.5));
    }

    #[test]
    fn test_pause_resume_excludes_paused_time() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        session.pause().unwrap();
        clock.advance(5000);
        session.resume().unwrap();
        clock.advance(1000);

        let record = session.stop().unwrap();
        assert!(record.is_none(), "a single-point route is not recorded");
        assert_eq!(session.duration_ms(), 1000);
        assert_eq!(session.accumulated_pause_ms(), 5000);
    }

    #[test]
    fn test_duration_formula() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        let t0 = clock.now_ms();
        session.start().unwrap();

        clock.set(t0 + 3_000);
        session.on_location_update(fix(0.0, 0.001, &clock));
        session.pause().unwrap();
        let t1 = clock.now_ms();

        clock.set(t0 + 10_000);
        session.resume().unwrap();
        let t2 = clock.now_ms();

        clock.set(t0 + 12_500);
        let t3 = clock.now_ms();
        let record = session.stop().unwrap().unwrap();

        assert_eq!(record.duration_ms, (t3 - t0) - (t2 - t1));
        assert_eq!(
            record.duration_ms,
            record.end_timestamp_ms - record.start_timestamp_ms - session.accumulated_pause_ms()
        );
    }

    #[test]
    fn test_duration_frozen_while_paused() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(4000);
        session.pause().unwrap();
        clock.advance(60_000);
        assert_eq!(session.duration_ms(), 4000);
        assert_eq!(session.stats().duration_ms, 4000);
    }

    #[test]
    fn test_stop_while_paused_excludes_open_pause() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.001, &clock));
        clock.advance(1000);
        session.pause().unwrap();
        clock.advance(30_000);

        let record = session.stop().unwrap().unwrap();
        assert_eq!(record.duration_ms, 2000);
        assert_eq!(session.duration_ms(), 2000);
    }

    #[test]
    fn test_paused_fixes_do_not_add_distance() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.001, &clock));
        let before = session.distance_meters();

        session.pause().unwrap();
        for i in 2..10 {
            clock.advance(1000);
            assert!(!session.on_location_update(fix(0.0, 0.001 * i as f64, &clock)));
        }

        assert_eq!(session.distance_meters(), before);
        assert_eq!(session.route().len(), 2);
        let shown = session.current_position().unwrap();
        assert!(approx_eq(shown.longitude, 0.009, 1e-12));

        // Resuming measures from the last recorded point, not the idle drift.
        session.resume().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.001, &clock));
        assert_eq!(session.distance_meters(), before);
        assert_eq!(session.route().len(), 3);
    }

    #[test]
    fn test_distance_is_monotonic() {
        let (mut session, clock) = session_at(FakeProvider::at(51.5, -0.12));
        session.start().unwrap();
        let mut last = 0.0;
        let wiggle = [0.0, 0.0003, -0.0002, 0.0001, 0.0, 0.0004];
        for (i, dlat) in wiggle.iter().enumerate() {
            clock.advance(1000);
            session.on_location_update(fix(51.5 + dlat, -0.12 + i as f64 * 0.0001, &clock));
            assert!(session.distance_meters() >= last);
            last = session.distance_meters();
        }
    }

    #[test]
    fn test_identical_fix_adds_zero() {
        let (mut session, clock) = session_at(FakeProvider::at(10.0, 10.0));
        session.start().unwrap();
        clock.advance(1000);
        assert!(session.on_location_update(fix(10.0, 10.0, &clock)));
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_speed_conversion_and_clamp() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.0001, &clock).with_speed(2.5));
        assert!(approx_eq(session.current_speed_kmh(), 9.0, 1e-9));

        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.0002, &clock).with_speed(-1.0));
        assert_eq!(session.current_speed_kmh(), 0.0);
    }

    #[test]
    fn test_invalid_and_stale_fixes_dropped() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        assert!(!session.on_location_update(fix(f64::NAN, 0.0, &clock)));
        assert!(!session.on_location_update(LocationSample::new(0.0, 0.001, T0 - 1)));
        assert_eq!(session.route().len(), 1);
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_invalid_transitions_are_rejected_without_change() {
        let (mut session, _clock) = session_at(FakeProvider::at(0.0, 0.0));

        let err = session.pause().unwrap_err();
        assert!(matches!(
            err,
            ActivityError::InvalidStateTransition { from: SessionState::Idle, operation: "pause" }
        ));
        assert!(session.resume().is_err());
        assert!(session.stop().is_err());
        assert_eq!(session.state(), SessionState::Idle);

        session.start().unwrap();
        assert!(session.start().is_err());
        assert!(session.resume().is_err());
        assert_eq!(session.state(), SessionState::Active);

        session.pause().unwrap();
        assert!(session.pause().is_err());
        assert_eq!(session.state(), SessionState::Paused);
    }

    #[test]
    fn test_permission_denied() {
        let mut provider = FakeProvider::at(0.0, 0.0);
        provider.permission = PermissionStatus::Denied;
        let (mut session, _clock) = session_at(provider);

        assert!(matches!(session.start(), Err(ActivityError::PermissionDenied(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.provider().live_watches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_location_unavailable() {
        let mut provider = FakeProvider::at(0.0, 0.0);
        provider.fix = None;
        let (mut session, _clock) = session_at(provider);

        assert!(matches!(session.start(), Err(ActivityError::LocationUnavailable(_))));
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.route().is_empty());
    }

    #[test]
    fn test_unsupported_device() {
        let mut provider = FakeProvider::at(0.0, 0.0);
        provider.supported = false;
        let (mut session, _clock) = session_at(provider);
        assert!(matches!(session.start(), Err(ActivityError::DeviceUnsupported(_))));
    }

    #[test]
    fn test_stop_releases_location_watch() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        assert_eq!(session.provider().live_watches.load(Ordering::SeqCst), 1);

        session.stop().unwrap();
        assert_eq!(session.provider().live_watches.load(Ordering::SeqCst), 0);

        // Late deliveries after stop are ignored
        clock.advance(1000);
        assert!(!session.on_location_update(fix(0.0, 0.01, &clock)));
        assert_eq!(session.distance_meters(), 0.0);
    }

    #[test]
    fn test_restart_after_stop_resets_accumulators() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.001, &clock));
        session.pause().unwrap();
        clock.advance(1000);
        session.stop().unwrap();

        clock.advance(10_000);
        session.start().unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.route().len(), 1);
        assert_eq!(session.distance_meters(), 0.0);
        assert_eq!(session.accumulated_pause_ms(), 0);
        assert_eq!(session.duration_ms(), 0);
        assert_eq!(session.start_timestamp_ms(), clock.now_ms());
    }

    #[test]
    fn test_reset_abandons_session() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.0, 0.001, &clock));

        session.reset();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.route().is_empty());
        assert!(session.current_position().is_none());
        assert_eq!(session.stats(), TrackingStats::default());
        assert_eq!(session.provider().live_watches.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_drop_releases_location_watch() {
        let provider = FakeProvider::at(0.0, 0.0);
        let live = Arc::clone(&provider.live_watches);
        {
            let (mut session, _clock) = session_at(provider);
            session.start().unwrap();
            assert_eq!(live.load(Ordering::SeqCst), 1);
        }
        assert_eq!(live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_route_frame() {
        let (mut session, clock) = session_at(FakeProvider::at(0.0, 0.0));
        session.start().unwrap();
        clock.advance(1000);
        session.on_location_update(fix(0.002, 0.004, &clock));

        let bounds = session.route_bounds().unwrap();
        assert_eq!(bounds.max_lat, 0.002);
        assert_eq!(bounds.max_lng, 0.004);
        let center = session.route_center().unwrap();
        assert!(approx_eq(center.latitude, 0.001, 1e-12));
        assert!(approx_eq(center.longitude, 0.002, 1e-12));
    }

    #[test]
    fn test_record_serializes_camel_case() {
        let record = CompletedSessionRecord {
            id: "session-1".into(),
            start_timestamp_ms: 1,
            end_timestamp_ms: 2,
            route: vec![],
            distance_meters: 0.0,
            duration_ms: 1,
            avg_speed_kmh: 0.0,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"startTimestampMs\":1"));
        assert!(json.contains("\"avgSpeedKmh\""));
    }
}
