//! Achievement definitions and catalog.
//!
//! The set of achievements is fixed at build time. Only `unlocked`,
//! `unlocked_at_ms` and `progress_percent` ever change, and an unlocked
//! achievement never locks again.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// What an achievement's requirement is measured against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum AchievementCategory {
    /// Steps taken today
    #[serde(rename = "steps")]
    Steps,
    /// Consecutive days the daily goal was met
    #[serde(rename = "streak")]
    Streak,
    /// Lifetime number of days the daily goal was met
    #[serde(rename = "goal")]
    GoalCount,
}

impl AchievementCategory {
    pub const ALL: [AchievementCategory; 3] = [Self::Steps, Self::Streak, Self::GoalCount];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Steps => "Step Milestones",
            Self::Streak => "Streak Achievements",
            Self::GoalCount => "Goal Achievements",
        }
    }
}

/// A badge and its unlock state. Field names on disk match the app's
/// `@achievements` JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Record))]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    #[serde(rename = "requirement")]
    pub requirement_value: u64,
    #[serde(rename = "type")]
    pub category: AchievementCategory,
    pub unlocked: bool,
    #[serde(rename = "unlockedAt", default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at_ms: Option<i64>,
    /// 0..=99 while locked; meaningless once unlocked
    #[serde(
        rename = "progress",
        default,
        deserialize_with = "deserialize_progress",
        skip_serializing_if = "Option::is_none"
    )]
    pub progress_percent: Option<u8>,
}

// Older stores wrote progress as an unrounded float (e.g. 45.67).
fn deserialize_progress<'de, D>(deserializer: D) -> Result<Option<u8>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|v| v.is_finite())
        .map(|v| v.floor().clamp(0.0, MAX_LOCKED_PROGRESS as f64) as u8))
}

/// Highest progress a locked achievement can show.
pub const MAX_LOCKED_PROGRESS: u8 = 99;

/// Result of measuring one achievement against a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressChange {
    Unlocked,
    Progressed,
    Unchanged,
}

impl Achievement {
    pub fn new(
        id: &str,
        title: &str,
        description: &str,
        icon: &str,
        requirement_value: u64,
        category: AchievementCategory,
    ) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            requirement_value,
            category,
            unlocked: false,
            unlocked_at_ms: None,
            progress_percent: None,
        }
    }

    /// `min(99, floor(100 * value / requirement))`.
    pub fn progress_for(&self, value: u64) -> u8 {
        if self.requirement_value == 0 {
            return MAX_LOCKED_PROGRESS;
        }
        let pct = value.saturating_mul(100) / self.requirement_value;
        pct.min(MAX_LOCKED_PROGRESS as u64) as u8
    }

    /// Unlock if `value` meets the requirement, otherwise update progress.
    /// Unlocked achievements are left untouched.
    pub fn apply(&mut self, value: u64, now_ms: i64) -> ProgressChange {
        if self.unlocked {
            return ProgressChange::Unchanged;
        }
        if value >= self.requirement_value {
            self.unlocked = true;
            self.unlocked_at_ms = Some(now_ms);
            self.progress_percent = None;
            return ProgressChange::Unlocked;
        }
        let progress = Some(self.progress_for(value));
        if self.progress_percent == progress {
            ProgressChange::Unchanged
        } else {
            self.progress_percent = progress;
            ProgressChange::Progressed
        }
    }
}

// ============================================================================
// Built-in definitions
// ============================================================================

const BUILTIN: &[(&str, &str, &str, &str, u64, AchievementCategory)] = &[
    // Steps Milestones
    ("first_steps", "First Steps", "Take your first 100 steps", "👣", 100, AchievementCategory::Steps),
    ("walker", "Walker", "Walk 1,000 steps in a day", "🚶", 1_000, AchievementCategory::Steps),
    ("explorer", "Explorer", "Walk 5,000 steps in a day", "🥾", 5_000, AchievementCategory::Steps),
    ("achiever", "Achiever", "Reach 10,000 steps in a day", "⭐", 10_000, AchievementCategory::Steps),
    ("champion", "Champion", "Walk 15,000 steps in a day", "🏆", 15_000, AchievementCategory::Steps),
    ("marathon", "Marathon", "Walk 20,000 steps in a day", "👑", 20_000, AchievementCategory::Steps),
    ("legend", "Legend", "Walk 30,000 steps in a day", "💎", 30_000, AchievementCategory::Steps),
    ("superhuman", "Superhuman", "Walk 50,000 steps in a day", "🌟", 50_000, AchievementCategory::Steps),
    // Streak Achievements
    ("consistent", "Consistent", "Reach your goal 3 days in a row", "🔥", 3, AchievementCategory::Streak),
    ("dedicated", "Dedicated", "Reach your goal 7 days in a row", "💪", 7, AchievementCategory::Streak),
    ("unstoppable", "Unstoppable", "Reach your goal 30 days in a row", "⚡", 30, AchievementCategory::Streak),
    // Goal Achievements
    ("goal_first", "Goal Getter", "Reach your daily goal", "🎯", 1, AchievementCategory::GoalCount),
    ("goal_10", "Perfect Week", "Reach your goal 10 times", "✨", 10, AchievementCategory::GoalCount),
    ("goal_50", "Fitness Master", "Reach your goal 50 times", "🎖️", 50, AchievementCategory::GoalCount),
];

/// All built-in achievements, locked.
pub fn default_catalog() -> Vec<Achievement> {
    BUILTIN
        .iter()
        .map(|&(id, title, description, icon, requirement, category)| {
            Achievement::new(id, title, description, icon, requirement, category)
        })
        .collect()
}

// ============================================================================
// Catalog
// ============================================================================

/// Ordered achievement list with a per-category index, so an evaluation only
/// walks the achievements it can affect.
#[derive(Debug, Clone)]
pub struct Catalog {
    achievements: Vec<Achievement>,
    by_category: HashMap<AchievementCategory, Vec<usize>>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new(default_catalog())
    }
}

impl Catalog {
    pub fn new(achievements: Vec<Achievement>) -> Self {
        let mut by_category: HashMap<AchievementCategory, Vec<usize>> = HashMap::new();
        for (idx, a) in achievements.iter().enumerate() {
            by_category.entry(a.category).or_default().push(idx);
        }
        Self { achievements, by_category }
    }

    /// Copy unlock state and progress from a stored catalog onto these
    /// definitions, matching by id. Stored ids with no definition are
    /// ignored. Returns the number of entries applied.
    pub fn restore(&mut self, saved: &[Achievement], now_ms: i64) -> usize {
        let mut applied = 0;
        for stored in saved {
            let Some(current) = self.achievements.iter_mut().find(|a| a.id == stored.id) else {
                continue;
            };
            if stored.unlocked {
                current.unlocked = true;
                current.unlocked_at_ms = Some(stored.unlocked_at_ms.unwrap_or(now_ms));
                current.progress_percent = None;
            } else if !current.unlocked {
                current.progress_percent = stored.progress_percent;
            }
            applied += 1;
        }
        applied
    }

    /// Measure every locked achievement of `category` against `value`.
    ///
    /// Returns the achievements unlocked by this call and whether anything
    /// (unlock or progress) changed.
    pub fn apply(
        &mut self,
        category: AchievementCategory,
        value: u64,
        now_ms: i64,
    ) -> (Vec<Achievement>, bool) {
        let mut unlocked = Vec::new();
        let mut changed = false;
        let Some(indices) = self.by_category.get(&category) else {
            return (unlocked, changed);
        };
        for &idx in indices {
            let achievement = &mut self.achievements[idx];
            match achievement.apply(value, now_ms) {
                ProgressChange::Unlocked => {
                    changed = true;
                    unlocked.push(achievement.clone());
                }
                ProgressChange::Progressed => changed = true,
                ProgressChange::Unchanged => {}
            }
        }
        (unlocked, changed)
    }

    pub fn achievements(&self) -> &[Achievement] {
        &self.achievements
    }

    pub fn get(&self, id: &str) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    pub fn in_category(&self, category: AchievementCategory) -> impl Iterator<Item = &Achievement> {
        self.by_category
            .get(&category)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.achievements[idx])
    }

    pub fn len(&self) -> usize {
        self.achievements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.achievements.is_empty()
    }

    pub fn unlocked_count(&self) -> usize {
        self.achievements.iter().filter(|a| a.unlocked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = Catalog::default();
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.in_category(AchievementCategory::Steps).count(), 8);
        assert_eq!(catalog.in_category(AchievementCategory::Streak).count(), 3);
        assert_eq!(catalog.in_category(AchievementCategory::GoalCount).count(), 3);
        assert_eq!(catalog.unlocked_count(), 0);
        assert_eq!(catalog.get("first_steps").unwrap().requirement_value, 100);
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids: Vec<_> = default_catalog().into_iter().map(|a| a.id).collect();
        let total = ids.len();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn test_progress_floors_and_caps() {
        let a = Achievement::new("x", "X", "", "", 1_000, AchievementCategory::Steps);
        assert_eq!(a.progress_for(0), 0);
        assert_eq!(a.progress_for(456), 45);
        assert_eq!(a.progress_for(999), 99);
        assert_eq!(a.progress_for(5_000), 99);
    }

    #[test]
    fn test_apply_unlocks_at_threshold() {
        let mut a = Achievement::new("x", "X", "", "", 100, AchievementCategory::Steps);
        assert_eq!(a.apply(99, 1), ProgressChange::Progressed);
        assert_eq!(a.progress_percent, Some(99));
        assert!(!a.unlocked);

        assert_eq!(a.apply(99, 2), ProgressChange::Unchanged);

        assert_eq!(a.apply(100, 3), ProgressChange::Unlocked);
        assert!(a.unlocked);
        assert_eq!(a.unlocked_at_ms, Some(3));
        assert_eq!(a.progress_percent, None);

        // Never re-locks, never re-stamps
        assert_eq!(a.apply(0, 4), ProgressChange::Unchanged);
        assert!(a.unlocked);
        assert_eq!(a.unlocked_at_ms, Some(3));
    }

    #[test]
    fn test_catalog_apply_only_touches_category() {
        let mut catalog = Catalog::default();
        let (unlocked, changed) = catalog.apply(AchievementCategory::Streak, 3, 10);
        assert!(changed);
        assert_eq!(unlocked.len(), 1);
        assert_eq!(unlocked[0].id, "consistent");
        assert!(catalog
            .in_category(AchievementCategory::Steps)
            .all(|a| a.progress_percent.is_none() && !a.unlocked));
    }

    #[test]
    fn test_restore_from_saved() {
        let mut saved = default_catalog();
        saved[0].unlocked = true;
        saved[0].unlocked_at_ms = Some(55);
        saved[1].progress_percent = Some(40);
        saved.push(Achievement::new("retired", "Old", "", "", 1, AchievementCategory::Steps));

        let mut catalog = Catalog::default();
        let applied = catalog.restore(&saved, 99);
        assert_eq!(applied, 14);
        assert!(catalog.get("first_steps").unwrap().unlocked);
        assert_eq!(catalog.get("first_steps").unwrap().unlocked_at_ms, Some(55));
        assert_eq!(catalog.get("walker").unwrap().progress_percent, Some(40));
        assert!(catalog.get("retired").is_none());
    }

    #[test]
    fn test_restore_fills_missing_unlock_time() {
        let mut saved = default_catalog();
        saved[2].unlocked = true;
        let mut catalog = Catalog::default();
        catalog.restore(&saved, 777);
        assert_eq!(catalog.get("explorer").unwrap().unlocked_at_ms, Some(777));
    }

    #[test]
    fn test_json_matches_stored_format() {
        let json = r#"{
            "id": "walker",
            "title": "Walker",
            "description": "Walk 1,000 steps in a day",
            "icon": "🚶",
            "requirement": 1000,
            "type": "steps",
            "unlocked": false,
            "progress": 45.67
        }"#;
        let a: Achievement = serde_json::from_str(json).unwrap();
        assert_eq!(a.category, AchievementCategory::Steps);
        assert_eq!(a.requirement_value, 1000);
        assert_eq!(a.progress_percent, Some(45));
        assert_eq!(a.unlocked_at_ms, None);

        let goal: Achievement = serde_json::from_str(
            r#"{"id":"goal_first","title":"","description":"","icon":"","requirement":1,"type":"goal","unlocked":true,"unlockedAt":1700000000000}"#,
        )
        .unwrap();
        assert_eq!(goal.category, AchievementCategory::GoalCount);
        assert_eq!(goal.unlocked_at_ms, Some(1_700_000_000_000));
        assert_eq!(goal.progress_percent, None);

        let back = serde_json::to_string(&goal).unwrap();
        assert!(back.contains("\"type\":\"goal\""));
        assert!(back.contains("\"unlockedAt\":1700000000000"));
        assert!(!back.contains("progress"));
    }
}
