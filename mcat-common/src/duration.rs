//! Song duration helpers
//!
//! Durations are stored as whole seconds. The `M:SS` clock form is a
//! presentation format only; [`parse_clock`] exists so legacy payloads that
//! still send `"3:45"` can be converted on input.

/// Placeholder shown when a song has no duration
pub const MISSING: &str = "N/A";

/// Format whole seconds as `M:SS`.
///
/// Minutes are not wrapped into hours, matching how track lengths are
/// usually shown.
///
/// # Examples
///
/// ```
/// use mcat_common::duration::format_duration;
///
/// assert_eq!(format_duration(0), "0:00");
/// assert_eq!(format_duration(225), "3:45");
/// assert_eq!(format_duration(3600), "60:00");
/// ```
pub fn format_duration(seconds: u32) -> String {
    let minutes = seconds / 60;
    let secs = seconds % 60;
    format!("{}:{:02}", minutes, secs)
}

/// Format an optional duration, falling back to [`MISSING`]
pub fn format_optional_duration(seconds: Option<u32>) -> String {
    match seconds {
        Some(s) => format_duration(s),
        None => MISSING.to_string(),
    }
}

/// Parse a `M+:SS` clock string into whole seconds.
///
/// Minutes may have any number of digits; seconds must be exactly two
/// digits below 60. Returns `None` for anything else (signs, fractions,
/// whitespace inside the value).
///
/// # Examples
///
/// ```
/// use mcat_common::duration::parse_clock;
///
/// assert_eq!(parse_clock("3:45"), Some(225));
/// assert_eq!(parse_clock("125:00"), Some(7500));
/// assert_eq!(parse_clock("3:75"), None);
/// assert_eq!(parse_clock("-1:00"), None);
/// ```
pub fn parse_clock(value: &str) -> Option<u32> {
    let (minutes, seconds) = value.trim().split_once(':')?;

    if minutes.is_empty() || !minutes.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if seconds.len() != 2 || !seconds.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }

    minutes.checked_mul(60)?.checked_add(seconds)
}
