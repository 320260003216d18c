//! Daily goal streak.
//!
//! The "already counted today" guard is the stored `last_goal_met_date`
//! compared against the caller's calendar date, so repeated evaluations on the
//! same day can never count twice.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Persisted streak counter (`{"streak": n, "lastUpdateDate": "YYYY-MM-DD"}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakState {
    #[serde(rename = "streak", default)]
    pub current_streak: u32,
    #[serde(rename = "lastUpdateDate", alias = "lastUpdate", default)]
    pub last_goal_met_date: Option<NaiveDate>,
    #[serde(rename = "longestStreak", default)]
    pub longest_streak: u32,
}

/// What recording a goal day did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakUpdate {
    /// Today was already counted (or the date went backwards); nothing changed.
    AlreadyCounted,
    /// Continued from yesterday, or the first goal day ever.
    Extended(u32),
    /// A day was missed; the streak starts over at 1.
    Restarted,
}

impl StreakUpdate {
    pub fn fired(&self) -> bool {
        !matches!(self, Self::AlreadyCounted)
    }
}

impl StreakState {
    /// Count `today` as a goal day.
    pub fn record_goal_met(&mut self, today: NaiveDate) -> StreakUpdate {
        let update = match self.last_goal_met_date {
            Some(last) if last >= today => return StreakUpdate::AlreadyCounted,
            Some(last) if today.pred_opt() == Some(last) => {
                self.current_streak += 1;
                StreakUpdate::Extended(self.current_streak)
            }
            Some(_) => {
                self.current_streak = 1;
                StreakUpdate::Restarted
            }
            None => {
                self.current_streak += 1;
                StreakUpdate::Extended(self.current_streak)
            }
        };
        self.last_goal_met_date = Some(today);
        self.longest_streak = self.longest_streak.max(self.current_streak);
        update
    }

    pub fn counted_on(&self, today: NaiveDate) -> bool {
        self.last_goal_met_date == Some(today)
    }

    /// Alive if the goal was met today or yesterday.
    pub fn is_active(&self, today: NaiveDate) -> bool {
        match self.last_goal_met_date {
            Some(last) => last == today || today.pred_opt() == Some(last),
            None => false,
        }
    }

    /// Streak to show on `today`: zero once a day has been missed.
    pub fn display_streak(&self, today: NaiveDate) -> u32 {
        if self.is_active(today) {
            self.current_streak
        } else {
            0
        }
    }

    pub fn reset(&mut self) {
        self.current_streak = 0;
        self.last_goal_met_date = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_same_day_counts_once() {
        let mut s = StreakState::default();
        assert_eq!(s.record_goal_met(day(1)), StreakUpdate::Extended(1));
        assert_eq!(s.record_goal_met(day(1)), StreakUpdate::AlreadyCounted);
        assert_eq!(s.current_streak, 1);
        assert!(s.counted_on(day(1)));
    }

    #[test]
    fn test_consecutive_days_extend() {
        let mut s = StreakState::default();
        for d in 1..=5 {
            assert!(s.record_goal_met(day(d)).fired());
        }
        assert_eq!(s.current_streak, 5);
        assert_eq!(s.longest_streak, 5);
    }

    #[test]
    fn test_gap_restarts() {
        let mut s = StreakState::default();
        s.record_goal_met(day(1));
        s.record_goal_met(day(2));
        assert_eq!(s.record_goal_met(day(4)), StreakUpdate::Restarted);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.longest_streak, 2);
        assert_eq!(s.last_goal_met_date, Some(day(4)));
    }

    #[test]
    fn test_date_going_backwards_is_ignored() {
        let mut s = StreakState::default();
        s.record_goal_met(day(10));
        assert_eq!(s.record_goal_met(day(9)), StreakUpdate::AlreadyCounted);
        assert_eq!(s.current_streak, 1);
        assert_eq!(s.last_goal_met_date, Some(day(10)));
    }

    #[test]
    fn test_active_window() {
        let mut s = StreakState::default();
        assert!(!s.is_active(day(1)));
        s.record_goal_met(day(1));
        assert!(s.is_active(day(1)));
        assert!(s.is_active(day(2)));
        assert!(!s.is_active(day(3)));
        assert_eq!(s.display_streak(day(3)), 0);
        assert_eq!(s.current_streak, 1);
    }

    #[test]
    fn test_reset() {
        let mut s = StreakState::default();
        s.record_goal_met(day(1));
        s.reset();
        assert_eq!(s.current_streak, 0);
        assert_eq!(s.last_goal_met_date, None);
        assert_eq!(s.longest_streak, 1);
    }

    #[test]
    fn test_json_format() {
        let mut s = StreakState::default();
        s.record_goal_met(day(3));
        let json = serde_json::to_string(&s).unwrap();
        assert!(json.contains("\"streak\":1"));
        assert!(json.contains("\"lastUpdateDate\":\"2024-06-03\""));

        let legacy: StreakState =
            serde_json::from_str(r#"{"streak":4,"lastUpdate":"2024-06-02"}"#).unwrap();
        assert_eq!(legacy.current_streak, 4);
        assert_eq!(legacy.last_goal_met_date, Some(day(2)));

        let cleared: StreakState = serde_json::from_str(r#"{"streak":0,"lastUpdate":null}"#).unwrap();
        assert_eq!(cleared, StreakState::default());
    }
}
