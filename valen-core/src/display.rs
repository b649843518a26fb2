//! Helpers for front-ends rendering a report.

use std::time::Duration;

use serde::Serialize;

use crate::status::StatusCode;

/// Traffic light shown next to a facility or instance
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Light {
    Green,
    Yellow,
    Red,
}

impl Light {
    /// Anything short of fully good or fully failed is yellow
    pub fn facility(status: StatusCode) -> Self {
        match status {
            StatusCode::Good => Self::Green,
            StatusCode::Fail => Self::Red,
            _ => Self::Yellow,
        }
    }

    pub fn instance(status: StatusCode) -> Self {
        if status.is_good() { Self::Green } else { Self::Red }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

pub fn facility_label(status: StatusCode) -> &'static str {
    match Light::facility(status) {
        Light::Green => "Online",
        Light::Red => "Offline",
        Light::Yellow => "Issues",
    }
}

pub fn instance_label(status: StatusCode) -> &'static str {
    match Light::instance(status) {
        Light::Green => "On",
        _ => "Off",
    }
}

/// `"N/A"`, `"12.5 ms"`, or seconds above one second (`"1.5 s"`)
pub fn format_response_time(millis: Option<f64>) -> String {
    match millis {
        None => "N/A".to_string(),
        Some(ms) if ms > 1000.0 => format!("{} s", round1(ms / 1000.0)),
        Some(ms) => format!("{} ms", round1(ms)),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Age of a report in words, e.g. `"1 day, 3 hours, 5 minutes"`.
///
/// Seconds are only mentioned when the minutes component is zero.
pub fn format_age(secs: i64) -> String {
    let secs = secs.max(0);
    let (days, rest) = (secs / 86_400, secs % 86_400);
    let (hours, rest) = (rest / 3_600, rest % 3_600);
    let (mins, secs) = (rest / 60, rest % 60);

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(unit(days, "day"));
    }
    if hours > 0 {
        parts.push(unit(hours, "hour"));
    }
    if mins > 0 {
        parts.push(unit(mins, "minute"));
    }
    if secs > 0 && mins == 0 {
        parts.push(unit(secs, "second"));
    }

    if parts.is_empty() {
        "0 seconds".to_string()
    } else {
        parts.join(", ")
    }
}

fn unit(value: i64, name: &str) -> String {
    if value == 1 {
        format!("{} {}", value, name)
    } else {
        format!("{} {}s", value, name)
    }
}

/// Delay until the next multiple of `interval` on the wall clock.
///
/// `now` is the time since the Unix epoch. Front-ends refreshing on these
/// boundaries line up with a monitor that writes on the same interval.
pub fn next_refresh_delay(now: Duration, interval: u64) -> Duration {
    let interval_ms = u128::from(interval.max(1)) * 1000;
    let remaining = interval_ms - now.as_millis() % interval_ms;
    Duration::from_millis(u64::try_from(remaining).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_facility_lights() {
        assert_eq!(Light::facility(StatusCode::Good), Light::Green);
        assert_eq!(Light::facility(StatusCode::Fail), Light::Red);
        for status in [StatusCode::Incomplete, StatusCode::DnsBad, StatusCode::Unknown] {
            assert_eq!(Light::facility(status), Light::Yellow);
            assert_eq!(facility_label(status), "Issues");
        }
        assert_eq!(facility_label(StatusCode::Good), "Online");
        assert_eq!(facility_label(StatusCode::Fail), "Offline");
    }

    #[test]
    fn test_instance_lights() {
        assert_eq!(instance_label(StatusCode::Good), "On");
        assert_eq!(instance_label(StatusCode::Fail), "Off");
        assert_eq!(Light::instance(StatusCode::Unknown).color(), "red");
    }

    #[test]
    fn test_format_response_time() {
        assert_eq!(format_response_time(None), "N/A");
        assert_eq!(format_response_time(Some(12.34)), "12.3 ms");
        assert_eq!(format_response_time(Some(80.0)), "80 ms");
        assert_eq!(format_response_time(Some(1000.0)), "1000 ms");
        assert_eq!(format_response_time(Some(1534.0)), "1.5 s");
    }

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(0), "0 seconds");
        assert_eq!(format_age(-30), "0 seconds");
        assert_eq!(format_age(1), "1 second");
        assert_eq!(format_age(45), "45 seconds");
        assert_eq!(format_age(125), "2 minutes");
        assert_eq!(format_age(3_605), "1 hour, 5 seconds");
        assert_eq!(format_age(90_000 + 120), "1 day, 1 hour, 2 minutes");
    }

    #[test]
    fn test_next_refresh_delay_aligns_to_clock() {
        assert_eq!(
            next_refresh_delay(Duration::from_secs(1_000), 900),
            Duration::from_secs(800)
        );
        assert_eq!(
            next_refresh_delay(Duration::from_secs(1_800), 900),
            Duration::from_secs(900)
        );
        assert_eq!(
            next_refresh_delay(Duration::from_millis(899_500), 900),
            Duration::from_millis(500)
        );
        assert_eq!(next_refresh_delay(Duration::from_secs(7), 0), Duration::from_secs(1));
    }

    #[test]
    fn test_next_refresh_delay_huge_interval_saturates() {
        assert_eq!(
            next_refresh_delay(Duration::from_secs(1), u64::MAX),
            Duration::from_millis(u64::MAX)
        );
        assert_eq!(
            next_refresh_delay(Duration::from_secs(1), i64::MAX as u64),
            Duration::from_millis(u64::MAX)
        );
    }
}
