//! Playback clock helpers.

/// Coerce a time reported by a media element into a usable value.
/// Negative and non-finite readings count as zero.
pub fn sanitize_seconds(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Percentage of `duration` covered by `current_time`, in `[0, 100]`.
pub fn progress_percent(current_time: f64, duration: f64) -> f64 {
    let current_time = sanitize_seconds(current_time);
    let duration = sanitize_seconds(duration);
    if duration > 0.0 {
        (current_time / duration * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Format seconds as `MM:SS`. Minutes are not wrapped into hours.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds <= 0.0 {
        return "00:00".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_whole_and_fractional_seconds() {
        assert_eq!(format_time(0.0), "00:00");
        assert_eq!(format_time(65.0), "01:05");
        assert_eq!(format_time(3600.0), "60:00");
        assert_eq!(format_time(59.99), "00:59");
        assert_eq!(format_time(119.5), "01:59");
    }

    #[test]
    fn formats_invalid_input_as_zero() {
        assert_eq!(format_time(f64::NAN), "00:00");
        assert_eq!(format_time(f64::INFINITY), "00:00");
        assert_eq!(format_time(-3.0), "00:00");
    }

    #[test]
    fn progress_is_ratio_of_duration() {
        assert_eq!(progress_percent(30.0, 120.0), 25.0);
        assert_eq!(progress_percent(120.0, 120.0), 100.0);
        assert_eq!(progress_percent(10.0, 0.0), 0.0);
        assert_eq!(progress_percent(10.0, f64::NAN), 0.0);
    }

    #[test]
    fn progress_is_clamped() {
        assert_eq!(progress_percent(150.0, 120.0), 100.0);
        assert_eq!(progress_percent(-5.0, 120.0), 0.0);
    }
}
