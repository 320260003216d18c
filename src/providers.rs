//! Collaborator interfaces for platform sensors.
//!
//! The engine never talks to GPS or pedometer hardware directly. Hosts implement
//! these traits over their platform APIs (Expo Location, Core Location, Fused
//! Location Provider, CMPedometer, ...) and feed the resulting samples back in.
//!
//! Location delivery is push based: after [`LocationProvider::subscribe`] the
//! host forwards every fix to
//! [`TrackingSession::on_location_update`](crate::TrackingSession::on_location_update)
//! until the returned handle is unsubscribed.

use crate::error::Result;
use crate::LocationSample;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum PermissionStatus {
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Parameters for a live location watch.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct WatchOptions {
    /// Minimum time between fixes (ms)
    pub interval_ms: u32,
    /// Minimum movement between fixes (meters)
    pub distance_interval_m: f64,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            distance_interval_m: 5.0,
        }
    }
}

/// Handle for an active location watch.
pub trait LocationSubscription {
    /// Stop delivery. After this returns the host must not forward further fixes.
    fn unsubscribe(&mut self);
}

/// Permission-gated source of location fixes.
pub trait LocationProvider {
    type Subscription: LocationSubscription;

    /// Capability probe; `false` on platforms without location services.
    fn is_supported(&self) -> bool {
        true
    }

    fn request_permission(&self) -> PermissionStatus;

    /// One-shot "where am I now" query.
    fn current_fix(&self) -> Result<LocationSample>;

    fn subscribe(&self, options: WatchOptions) -> Result<Self::Subscription>;
}

/// Source of daily step counts.
pub trait StepCounter {
    fn is_available(&self) -> bool;

    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    /// Steps recorded since local midnight.
    fn steps_since_midnight(&self) -> Result<u64>;
}
