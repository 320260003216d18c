//! Simulated walk through a tracking session with a pause in the middle.
//!
//! Run with: cargo run --example track_walk

use activity_engine::format::{format_distance, format_duration_ms, format_pace, format_speed};
use activity_engine::{
    LocationProvider, LocationSample, LocationSubscription, ManualClock, PermissionStatus,
    SessionConfig, TrackingSession, WatchOptions,
};

struct ScriptedGps {
    start: LocationSample,
}

struct Watch;

impl LocationSubscription for Watch {
    fn unsubscribe(&mut self) {
        println!("  (location watch released)");
    }
}

impl LocationProvider for ScriptedGps {
    type Subscription = Watch;

    fn request_permission(&self) -> PermissionStatus {
        PermissionStatus::Granted
    }

    fn current_fix(&self) -> activity_engine::Result<LocationSample> {
        Ok(self.start)
    }

    fn subscribe(&self, options: WatchOptions) -> activity_engine::Result<Watch> {
        println!(
            "  (watching every {}ms / {}m)",
            options.interval_ms, options.distance_interval_m
        );
        Ok(Watch)
    }
}

fn main() {
    // Hyde Park, heading roughly north-east
    let origin = (51.5073, -0.1657);
    let t0 = 1_714_550_400_000_i64;
    let clock = ManualClock::new(t0);

    let gps = ScriptedGps {
        start: LocationSample::new(origin.0, origin.1, t0),
    };
    let mut session = TrackingSession::with_clock(gps, clock.clone(), SessionConfig::default());

    println!("Tracking Session Demo\n");
    session.start().expect("start");
    println!("State: {}", session.state());

    // One fix every 10s, ~14m apart (about 5 km/h)
    let mut t = t0;
    for i in 1..=30 {
        t += 10_000;
        clock.set(t);
        let step = i as f64 * 0.0001;
        let fix = LocationSample::new(origin.0 + step, origin.1 + step * 0.5, t).with_speed(1.4);
        session.on_location_update(fix);

        if i == 15 {
            session.pause().expect("pause");
            println!("Paused after {}", format_distance(session.distance_meters()));
            clock.advance(120_000);
            t += 120_000;
            // Fixes while paused move the marker only
            session.on_location_update(LocationSample::new(origin.0 + 1.0, origin.1, t));
            session.resume().expect("resume");
            println!("Resumed, paused for {}", format_duration_ms(session.accumulated_pause_ms()));
        }
    }

    let stats = session.stats();
    println!(
        "Live: {} in {} at {}",
        format_distance(stats.distance_meters),
        format_duration_ms(stats.duration_ms),
        format_speed(stats.current_speed_kmh)
    );

    match session.stop().expect("stop") {
        Some(record) => {
            println!("\nSession {}", record.id);
            println!("  Points:   {}", record.route.len());
            println!("  Distance: {}", format_distance(record.distance_meters));
            println!("  Duration: {}", format_duration_ms(record.duration_ms));
            println!("  Avg:      {}", format_speed(record.avg_speed_kmh));
            println!("  Pace:     {}", format_pace(record.avg_speed_kmh));
            if let Some(center) = session.route_center() {
                println!("  Center:   {:.5}, {:.5}", center.latitude, center.longitude);
            }
        }
        None => println!("Too few points for a record"),
    }
}
