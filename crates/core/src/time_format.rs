//! Playback time formatting.
//!
//! Renders second offsets the way video players label their scrub rail:
//! `M:SS` below one hour and `H:MM:SS` above it.

/// Floor `seconds` to a whole, non-negative number of seconds.
///
/// Negative, NaN and infinite inputs collapse to zero.
pub fn seek_seconds(seconds: f64) -> u64 {
    if !seconds.is_finite() || seconds <= 0.0 {
        return 0;
    }
    seconds.floor() as u64
}

/// Format a playback offset as `M:SS` or `H:MM:SS`.
///
/// Fractional seconds are truncated, so the output is monotonic in its
/// input and lossless for integer seconds.
pub fn format_time(seconds: f64) -> String {
    let total = seek_seconds(seconds);
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_under_a_minute() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(7.9), "0:07");
    }

    #[test]
    fn formats_minutes_with_padded_seconds() {
        assert_eq!(format_time(65.0), "1:05");
        assert_eq!(format_time(65.4), "1:05");
        assert_eq!(format_time(599.0), "9:59");
    }

    #[test]
    fn formats_hours_with_padded_minutes() {
        assert_eq!(format_time(3600.0), "1:00:00");
        assert_eq!(format_time(3725.0), "1:02:05");
        assert_eq!(format_time(36_000.0), "10:00:00");
    }

    #[test]
    fn negative_and_non_finite_clamp_to_zero() {
        assert_eq!(format_time(-12.0), "0:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(f64::INFINITY), "0:00");
    }

    #[test]
    fn integer_seconds_are_distinct_and_ordered() {
        let labels: Vec<String> = (0..4000).map(|s| format_time(s as f64)).collect();
        for pair in labels.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
    }

    #[test]
    fn seek_seconds_floors() {
        assert_eq!(seek_seconds(42.99), 42);
        assert_eq!(seek_seconds(-1.0), 0);
    }
}
