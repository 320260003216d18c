//! A week of step counts fed through the rewards engine.
//!
//! Run with: cargo run --example daily_rewards

use std::sync::Arc;

use activity_engine::{ActivityStore, Clock, DailyEstimates, ManualClock, MemoryStore, RewardsEngine};
use chrono::NaiveDate;

fn main() {
    let start = NaiveDate::from_ymd_opt(2024, 5, 1).expect("valid date");
    let clock = ManualClock::at_date(start);
    let store = Arc::new(MemoryStore::new());
    let history = ActivityStore::new(Arc::clone(&store));

    let mut engine = RewardsEngine::load(ActivityStore::new(Arc::clone(&store)), clock.clone());
    let goal = history.daily_goal();

    println!("Daily Rewards Demo (goal: {} steps)\n", goal);

    // Day 5 misses the goal, which breaks the streak
    let week = [12_000_u64, 10_500, 11_200, 25_000, 4_000, 10_000, 52_000];

    for steps in week {
        let today = clock.today();
        let est = DailyEstimates::from_steps(steps, goal);
        history.save_steps(today, steps, goal);

        // The app evaluates as the count climbs during the day
        engine.evaluate(steps / 2, false, goal);
        let outcome = engine.evaluate(steps, est.goal_reached, goal);

        println!(
            "{}  {:>6} steps  {:>4} kcal  {:>5.2} km  streak {}",
            today, steps, est.calories, est.distance_km, outcome.current_streak
        );
        for a in engine.take_new_unlocks() {
            println!("    {} unlocked: {}", a.icon, a.title);
        }

        clock.advance_days(1);
    }

    let summary = engine.summary();
    println!(
        "\nUnlocked {}/{} ({}%), goals reached: {}",
        summary.unlocked_count,
        summary.total_count,
        summary.completion_percentage,
        engine.goals_reached()
    );

    // A fresh engine over the same store picks up where this one left off
    let reloaded = RewardsEngine::load(ActivityStore::new(store), clock);
    println!(
        "Reloaded: streak {}, {} achievements unlocked",
        reloaded.display_streak(),
        reloaded.catalog().unlocked_count()
    );
    println!("History entries: {}", history.step_history().len());
}
