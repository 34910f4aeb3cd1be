//! Time formatting helpers.

use agora_types::Timestamp;

/// Format a duration in seconds to a human-readable string.
pub fn format_duration(secs: u64) -> String {
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs < 86400 {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    } else {
        format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
    }
}

/// Where `now` falls in the window `[start, end)`, for display.
pub fn voting_window(start: Timestamp, end: Timestamp, now: Timestamp) -> String {
    if !start.has_passed(now) {
        format!("starts in {}", format_duration(start.remaining_from(now)))
    } else if !end.has_passed(now) {
        format!("{} left", format_duration(end.remaining_from(now)))
    } else {
        format!("ended {} ago", format_duration(end.elapsed_since(now)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations() {
        assert_eq!(format_duration(59), "59s");
        assert_eq!(format_duration(61), "1m 1s");
        assert_eq!(format_duration(7_260), "2h 1m");
        assert_eq!(format_duration(90_000), "1d 1h");
    }

    #[test]
    fn window_phases() {
        let start = Timestamp::new(1_000);
        let end = Timestamp::new(4_600);
        assert_eq!(voting_window(start, end, Timestamp::new(940)), "starts in 1m 0s");
        assert_eq!(voting_window(start, end, Timestamp::new(1_000)), "1h 0m left");
        assert_eq!(voting_window(start, end, Timestamp::new(4_630)), "ended 30s ago");
    }
}
