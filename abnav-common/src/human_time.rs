//! Human-readable playback clock formatting
//!
//! Used for CLI listings and log lines. Formats follow player conventions:
//! `M:SS` for resources under an hour, `H:MM:SS` for longer ones.

/// Resources shorter than this are shown as `M:SS`
const SHORT_FORMAT_MAX: f64 = 3600.0;

/// Placeholder for unknown durations
pub const UNKNOWN_TIME: &str = "--:--";

/// Format `seconds` as a playback clock
///
/// `typical_max` picks the format so every value in a column lines up
/// (usually the resource duration). Fractions of a second are truncated.
/// Negative and non-finite values are shown as zero.
///
/// # Examples
///
/// ```
/// use abnav_common::human_time::format_playback_time;
///
/// assert_eq!(format_playback_time(75.9, 600.0), "1:15");
/// assert_eq!(format_playback_time(75.0, 7200.0), "0:01:15");
/// assert_eq!(format_playback_time(3725.0, 7200.0), "1:02:05");
/// ```
pub fn format_playback_time(seconds: f64, typical_max: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.trunc() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if typical_max < SHORT_FORMAT_MAX && hours == 0 {
        format!("{}:{:02}", minutes, secs)
    } else {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    }
}

/// Format an optional duration, inferring the format from the value itself
pub fn format_playback_time_opt(seconds: Option<f64>) -> String {
    match seconds {
        Some(seconds) => format_playback_time(seconds, seconds),
        None => UNKNOWN_TIME.to_string(),
    }
}
