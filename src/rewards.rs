//! # Rewards Engine
//!
//! Turns today's step count into achievement unlocks and streak updates.
//!
//! Each [`RewardsEngine::evaluate`] call runs three passes, each touching
//! only its own category of the catalog:
//!
//! 1. **Steps** - every locked step milestone is measured against today's steps.
//! 2. **Streak** - when the daily goal is met for the first time today, the
//!    streak is advanced and persisted, then streak achievements are measured
//!    against the *new* streak.
//! 3. **Goal count** - on that same first goal of the day the lifetime goal
//!    counter is advanced and goal-count achievements are measured against it.
//!
//! The catalog is persisted whenever an unlock or a progress change happened.

use log::{debug, info};

use crate::achievements::{Achievement, AchievementCategory, Catalog};
use crate::clock::{Clock, SystemClock};
use crate::store::{ActivityStore, KeyValueStore, MemoryStore};
use crate::streak::{StreakState, StreakUpdate};

use chrono::NaiveDate;

/// Result of one evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    /// Achievements unlocked by this call, in catalog order per pass
    pub unlocked: Vec<Achievement>,
    /// Whether any unlock or progress value changed
    pub catalog_changed: bool,
    /// `Some` when the goal condition held; tells whether the day counted
    pub streak_update: Option<StreakUpdate>,
    pub current_streak: u32,
    pub goals_reached: u32,
}

impl EvaluationOutcome {
    pub fn goal_counted(&self) -> bool {
        self.streak_update.map_or(false, |u| u.fired())
    }
}

/// Unlock totals for the rewards screen header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct CompletionSummary {
    pub unlocked_count: u32,
    pub total_count: u32,
    /// `round(100 * unlocked / total)`
    pub completion_percentage: u32,
}

/// Achievement catalog, streak and lifetime goal counter, kept in sync with
/// durable storage.
pub struct RewardsEngine<S: KeyValueStore = MemoryStore, C: Clock = SystemClock> {
    catalog: Catalog,
    streak: StreakState,
    goals_reached: u32,
    pending_unlocks: Vec<Achievement>,
    store: ActivityStore<S>,
    clock: C,
}

impl<C: Clock> RewardsEngine<MemoryStore, C> {
    /// Fresh engine over an in-memory store.
    pub fn with_clock(clock: C) -> Self {
        Self::load(ActivityStore::new(MemoryStore::new()), clock)
    }
}

impl<S: KeyValueStore, C: Clock> RewardsEngine<S, C> {
    /// Restore catalog, streak and goal counter from `store`.
    ///
    /// Stores written before the goal counter was kept separately fall back
    /// to the number of unlocked goal-count achievements.
    pub fn load(store: ActivityStore<S>, clock: C) -> Self {
        let mut catalog = Catalog::default();
        if let Some(saved) = store.load_catalog() {
            let applied = catalog.restore(&saved, clock.now_ms());
            debug!("[RewardsEngine] Restored {} achievements", applied);
        }

        let streak = store.load_streak();
        let goals_reached = store.load_goals_reached().unwrap_or_else(|| {
            catalog
                .in_category(AchievementCategory::GoalCount)
                .filter(|a| a.unlocked)
                .count() as u32
        });

        info!(
            "[RewardsEngine] Loaded: {}/{} unlocked, streak {}, {} goal days",
            catalog.unlocked_count(),
            catalog.len(),
            streak.current_streak,
            goals_reached
        );

        Self {
            catalog,
            streak,
            goals_reached,
            pending_unlocks: Vec::new(),
            store,
            clock,
        }
    }

    /// Evaluate today's steps at the clock's current instant and date.
    ///
    /// The goal counts only when `daily_goal_met` is set and
    /// `steps_today >= daily_goal`, and at most once per calendar day.
    pub fn evaluate(&mut self, steps_today: u64, daily_goal_met: bool, daily_goal: u64) -> EvaluationOutcome {
        let now_ms = self.clock.now_ms();
        let today = self.clock.today();
        self.evaluate_at(steps_today, daily_goal_met, daily_goal, today, now_ms)
    }

    /// [`evaluate`](Self::evaluate) with an explicit date and instant.
    pub fn evaluate_at(
        &mut self,
        steps_today: u64,
        daily_goal_met: bool,
        daily_goal: u64,
        today: NaiveDate,
        now_ms: i64,
    ) -> EvaluationOutcome {
        let (mut unlocked, mut catalog_changed) =
            self.catalog.apply(AchievementCategory::Steps, steps_today, now_ms);

        let mut streak_update = None;
        if daily_goal_met && steps_today >= daily_goal {
            let update = self.streak.record_goal_met(today);
            streak_update = Some(update);

            if update.fired() {
                info!(
                    "[RewardsEngine] Goal met on {}: streak {} ({:?})",
                    today, self.streak.current_streak, update
                );
                self.store.save_streak(&self.streak);

                let (streak_unlocks, streak_changed) = self.catalog.apply(
                    AchievementCategory::Streak,
                    self.streak.current_streak as u64,
                    now_ms,
                );
                unlocked.extend(streak_unlocks);
                catalog_changed |= streak_changed;

                self.goals_reached += 1;
                self.store.save_goals_reached(self.goals_reached);

                let (goal_unlocks, goal_changed) = self.catalog.apply(
                    AchievementCategory::GoalCount,
                    self.goals_reached as u64,
                    now_ms,
                );
                unlocked.extend(goal_unlocks);
                catalog_changed |= goal_changed;
            } else {
                debug!("[RewardsEngine] Goal already counted for {}", today);
            }
        }

        if catalog_changed {
            self.store.save_catalog(self.catalog.achievements());
        }

        for a in &unlocked {
            info!("[RewardsEngine] Unlocked {} {} ({})", a.icon, a.title, a.id);
        }
        self.pending_unlocks.extend(unlocked.iter().cloned());

        EvaluationOutcome {
            unlocked,
            catalog_changed,
            streak_update,
            current_streak: self.streak.current_streak,
            goals_reached: self.goals_reached,
        }
    }

    /// Drain unlocks not yet shown to the user.
    pub fn take_new_unlocks(&mut self) -> Vec<Achievement> {
        std::mem::take(&mut self.pending_unlocks)
    }

    pub fn reset_streak(&mut self) {
        self.streak.reset();
        self.store.save_streak(&self.streak);
        info!("[RewardsEngine] Streak reset");
    }

    pub fn achievements(&self) -> &[Achievement] {
        self.catalog.achievements()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn streak(&self) -> &StreakState {
        &self.streak
    }

    /// Streak as shown today: zero once a goal day has been missed.
    pub fn display_streak(&self) -> u32 {
        self.streak.display_streak(self.clock.today())
    }

    pub fn goals_reached(&self) -> u32 {
        self.goals_reached
    }

    pub fn summary(&self) -> CompletionSummary {
        let unlocked_count = self.catalog.unlocked_count() as u32;
        let total_count = self.catalog.len() as u32;
        let completion_percentage = if total_count == 0 {
            0
        } else {
            (100.0 * unlocked_count as f64 / total_count as f64).round() as u32
        };
        CompletionSummary {
            unlocked_count,
            total_count,
            completion_percentage,
        }
    }

    pub fn store(&self) -> &ActivityStore<S> {
        &self.store
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

// ============================================================================
// Tests
// ============================================================================
