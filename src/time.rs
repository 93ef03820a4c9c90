/// Formats a millisecond offset as `mm:ss`, or `hh:mm:ss` once it reaches an hour.
///
/// Position and duration are formatted independently, so a label may read
/// `59:59 / 01:30:00`.
pub fn format_time(ms: u64) -> String {
    let secs = ms / 1000;
    let (hours, rem) = (secs / 3600, secs % 3600);
    let (minutes, seconds) = (rem / 60, rem % 60);
    if hours > 0 {
        format!("{hours:02}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes:02}:{seconds:02}")
    }
}

/// The `position / duration` text shown next to the seek slider.
pub fn time_label(position_ms: u64, duration_ms: u64) -> String {
    format!("{} / {}", format_time(position_ms), format_time(duration_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn under_an_hour_is_minutes_and_seconds() {
        assert_eq!(format_time(0), "00:00");
        assert_eq!(format_time(999), "00:00");
        assert_eq!(format_time(65_000), "01:05");
        assert_eq!(format_time(3_599_999), "59:59");
    }

    #[test]
    fn an_hour_or_more_adds_hours() {
        assert_eq!(format_time(3_600_000), "01:00:00");
        assert_eq!(format_time(5_025_000), "01:23:45");
        assert_eq!(format_time(360_000_000), "100:00:00");
    }

    #[test]
    fn label_sides_keep_their_own_width() {
        assert_eq!(time_label(65_000, 125_000), "01:05 / 02:05");
        assert_eq!(time_label(65_000, 5_400_000), "01:05 / 01:30:00");
    }
}
