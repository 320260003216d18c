//! Display strings for the tracking and home screens.

/// `m:ss`, or `h:mm:ss` from one hour up.
pub fn format_duration(total_seconds: u64) -> String {
    let hrs = total_seconds / 3600;
    let mins = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hrs > 0 {
        format!("{}:{:02}:{:02}", hrs, mins, secs)
    } else {
        format!("{}:{:02}", mins, secs)
    }
}

/// Whole-second variant of [`format_duration`] for millisecond durations.
pub fn format_duration_ms(duration_ms: i64) -> String {
    format_duration((duration_ms.max(0) / 1000) as u64)
}

/// Meters below one kilometer, otherwise kilometers with two decimals.
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{:.0}m", meters)
    } else {
        format!("{:.2}km", meters / 1000.0)
    }
}

pub fn format_speed(kmh: f64) -> String {
    format!("{:.1} km/h", kmh)
}

/// Minutes per kilometer; `--:--` when not moving.
pub fn format_pace(kmh: f64) -> String {
    if !kmh.is_finite() || kmh <= 0.0 {
        return "--:--".to_string();
    }
    let min_per_km = 60.0 / kmh;
    let mut mins = min_per_km.floor() as u64;
    let mut secs = ((min_per_km - mins as f64) * 60.0).round() as u64;
    // 4:59.6 rounds to 5:00, not 4:60
    if secs == 60 {
        mins += 1;
        secs = 0;
    }
    format!("{}:{:02} /km", mins, secs)
}
