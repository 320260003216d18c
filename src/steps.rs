//! Step counting helpers.
//!
//! The pedometer reports a one-shot "steps since midnight" plus a live count
//! of steps since the watch began; [`StepTally`] sums the two into today's
//! total that is fed to [`RewardsEngine::evaluate`](crate::RewardsEngine::evaluate).

use chrono::NaiveDate;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{ActivityError, Result};
use crate::providers::StepCounter;

/// Approximate energy per step (kcal).
pub const KCAL_PER_STEP: f64 = 0.04;

/// Approximate stride length (km).
pub const KM_PER_STEP: f64 = 0.0008;

/// One day's step total, as kept in the step history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub date: NaiveDate,
    pub steps: u64,
    pub goal: u64,
}

impl StepRecord {
    pub fn goal_reached(&self) -> bool {
        self.steps >= self.goal
    }
}

/// Today's step count assembled from the pedometer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepTally {
    base: u64,
    live: u64,
    last_evaluated: u64,
}

impl StepTally {
    pub fn new(base: u64) -> Self {
        Self {
            base,
            live: 0,
            last_evaluated: 0,
        }
    }

    /// Check availability and permission, then read the steps already taken today.
    pub fn start<C: StepCounter + ?Sized>(counter: &C) -> Result<Self> {
        if !counter.is_available() {
            warn!("[StepTally] Step counting is not available on this device");
            return Err(ActivityError::unsupported(
                "Step counting is not available on this device",
            ));
        }
        if !counter.request_permission().is_granted() {
            warn!("[StepTally] Motion permission denied");
            return Err(ActivityError::permission("Step counting permission denied"));
        }
        let base = counter.steps_since_midnight()?;
        info!("[StepTally] Starting from {} steps since midnight", base);
        Ok(Self::new(base))
    }

    /// Update with the live stream's count of steps since the watch began.
    pub fn on_live_steps(&mut self, steps_since_watch: u64) {
        self.live = steps_since_watch;
    }

    pub fn total(&self) -> u64 {
        self.base.saturating_add(self.live)
    }

    /// Start a new day from `base` steps.
    pub fn rebase(&mut self, base: u64) {
        *self = Self::new(base);
    }

    /// Today's total if it grew since the last call, so evaluation only runs
    /// on new steps.
    pub fn take_for_evaluation(&mut self) -> Option<u64> {
        let total = self.total();
        if total > 0 && total > self.last_evaluated {
            self.last_evaluated = total;
            Some(total)
        } else {
            None
        }
    }
}

/// Figures derived from a day's step count.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct DailyEstimates {
    pub calories: u64,
    pub distance_km: f64,
    /// Fraction of the goal reached; exceeds 1.0 past the goal
    pub goal_progress: f64,
    pub goal_reached: bool,
}

impl DailyEstimates {
    pub fn from_steps(steps: u64, goal: u64) -> Self {
        let goal = goal.max(1);
        Self {
            calories: (steps as f64 * KCAL_PER_STEP).round() as u64,
            distance_km: steps as f64 * KM_PER_STEP,
            goal_progress: steps as f64 / goal as f64,
            goal_reached: steps >= goal,
        }
    }
}
