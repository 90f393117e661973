//! Duration parsing for timing sheet values.
//!
//! Three admissible shapes, disambiguated by colon count:
//! `SS.mmm` (pit stop durations), `M:SS.mmm` (lap times), and
//! `H:MM:SS.mmm` (total race time of multi-hour events). Anything else is
//! a layout mismatch and fails hard; guessing would corrupt every derived
//! statistic downstream.

use crate::error::{Error, Result};

/// Parse a duration string into non-negative integer milliseconds.
///
/// ```
/// use laptrace::time::parse_duration;
///
/// assert_eq!(parse_duration("23.456").unwrap(), 23_456);
/// assert_eq!(parse_duration("1:02.456").unwrap(), 62_456);
/// assert_eq!(parse_duration("1:20.5").unwrap(), 80_500);
/// assert_eq!(parse_duration("1:26:33.894").unwrap(), 5_193_894);
/// assert!(parse_duration("1:2:3:4").is_err());
/// ```
pub fn parse_duration(text: &str) -> Result<i64> {
    let malformed = || Error::MalformedDuration(text.to_string());
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(malformed());
    }

    let segments: Vec<&str> = trimmed.split(':').collect();
    if segments.is_empty() || segments.len() > 3 {
        return Err(malformed());
    }

    // All segments before the last are whole minutes/hours.
    let mut leading: Vec<i64> = Vec::with_capacity(2);
    for seg in &segments[..segments.len() - 1] {
        if seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        leading.push(seg.parse().map_err(|_| malformed())?);
    }

    let (seconds, millis) = parse_seconds(segments[segments.len() - 1]).ok_or_else(malformed)?;

    let total = match leading.as_slice() {
        [] => seconds * 1_000 + millis,
        [minutes] => minutes * 60_000 + seconds * 1_000 + millis,
        [hours, minutes] => hours * 3_600_000 + minutes * 60_000 + seconds * 1_000 + millis,
        _ => unreachable!(),
    };
    Ok(total)
}

/// Parse the final "SS.mmm" segment; fraction digits scale to milliseconds
/// (".5" is 500 ms).
fn parse_seconds(seg: &str) -> Option<(i64, i64)> {
    let (whole, frac) = match seg.split_once('.') {
        Some((w, f)) => (w, Some(f)),
        None => (seg, None),
    };

    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let seconds: i64 = whole.parse().ok()?;

    let millis = match frac {
        None => 0,
        Some(f) => {
            if f.is_empty() || f.len() > 3 || !f.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let raw: i64 = f.parse().ok()?;
            raw * 10_i64.pow(3 - f.len() as u32)
        }
    };
    Some((seconds, millis))
}

/// Format milliseconds back into the timing sheet shape.
///
/// Durations of an hour or more render as `H:MM:SS.mmm`, shorter ones as
/// `M:SS.mmm`; zero-padding of the fraction is always three digits.
pub fn format_duration(millis: i64) -> String {
    let hours = millis / 3_600_000;
    let minutes = (millis % 3_600_000) / 60_000;
    let seconds = (millis % 60_000) / 1_000;
    let frac = millis % 1_000;
    if hours > 0 {
        format!("{}:{:02}:{:02}.{:03}", hours, minutes, seconds, frac)
    } else {
        format!("{}:{:02}.{:03}", minutes, seconds, frac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_segment_lap_time() {
        assert_eq!(parse_duration("1:19.222").unwrap(), 79_222);
        assert_eq!(parse_duration("0:59.999").unwrap(), 59_999);
    }

    #[test]
    fn test_three_segment_race_time() {
        // hours*3600000 + minutes*60000 + seconds*1000 + millis
        assert_eq!(parse_duration("1:26:33.894").unwrap(), 5_193_894);
        assert_eq!(parse_duration("2:00:00.001").unwrap(), 7_200_001);
    }

    #[test]
    fn test_single_segment_pit_duration() {
        assert_eq!(parse_duration("23.456").unwrap(), 23_456);
        assert_eq!(parse_duration("21").unwrap(), 21_000);
    }

    #[test]
    fn test_short_fraction_scales() {
        assert_eq!(parse_duration("1:20.5").unwrap(), 80_500);
        assert_eq!(parse_duration("1:20.45").unwrap(), 80_450);
    }

    #[test]
    fn test_malformed_inputs() {
        for bad in ["", "  ", "1:2:3:4", "abc", "1:xx.000", "+1 LAP", "1:20.4567", "-1:20.000"] {
            let err = parse_duration(bad).unwrap_err();
            assert!(
                matches!(err, Error::MalformedDuration(_)),
                "expected MalformedDuration for {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_round_trip() {
        // Formatting reproduces the numeric value, not the original padding.
        for text in ["1:19.222", "1:20.5", "1:26:33.894", "0:59.999"] {
            let ms = parse_duration(text).unwrap();
            assert_eq!(parse_duration(&format_duration(ms)).unwrap(), ms);
        }
    }

    #[test]
    fn test_ordering_matches_duration() {
        assert!(parse_duration("1:19.999").unwrap() < parse_duration("1:20.000").unwrap());
    }
}
