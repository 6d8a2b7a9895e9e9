//! `H:MM:SS[.fraction]` formatting for durations given in seconds.

/// Nanosecond resolution; more digits would overflow the scaled integer.
pub const MAX_DIGITS: u32 = 9;

/// Format a duration, rounding to `digits` fractional-second digits.
///
/// Rounding is half-to-even on `seconds * 10^digits`. Durations of a day or
/// more render as `N day(s), H:MM:SS`. `digits` is capped at `MAX_DIGITS`.
///
/// ```text
/// format_duration(3661.0, 0) == "1:01:01"
/// format_duration(0.5, 1)    == "0:00:00.5"
/// ```
pub fn format_duration(seconds: f64, digits: u32) -> String {
    if !seconds.is_finite() {
        return "NaT".to_string();
    }

    let digits = digits.min(MAX_DIGITS);
    let scale = 10u64.pow(digits);
    let scaled = (seconds.abs() * scale as f64).round_ties_even() as u64;
    let (isec, fsec) = (scaled / scale, scaled % scale);

    let sign = if seconds < 0.0 && scaled != 0 { "-" } else { "" };
    let clock = format_clock(isec);
    if digits == 0 {
        format!("{}{}", sign, clock)
    } else {
        format!("{}{}.{:0width$}", sign, clock, fsec, width = digits as usize)
    }
}

fn format_clock(total: u64) -> String {
    let days = total / 86_400;
    let rem = total % 86_400;
    let (h, m, s) = (rem / 3600, (rem / 60) % 60, rem % 60);
    match days {
        0 => format!("{}:{:02}:{:02}", h, m, s),
        1 => format!("1 day, {}:{:02}:{:02}", h, m, s),
        d => format!("{} days, {}:{:02}:{:02}", d, h, m, s),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn whole_seconds() {
        assert_eq!(format_duration(3661.0, 0), "1:01:01");
        assert_eq!(format_duration(59.0, 0), "0:00:59");
        assert_eq!(format_duration(0.0, 0), "0:00:00");
    }

    #[test]
    fn fractional_digits() {
        assert_eq!(format_duration(0.5, 1), "0:00:00.5");
        assert_eq!(format_duration(3661.25, 2), "1:01:01.25");
        assert_eq!(format_duration(10.0, 1), "0:00:10.0");
        assert_eq!(format_duration(0.0, 3), "0:00:00.000");
    }

    #[test]
    fn rounds_half_to_even() {
        assert_eq!(format_duration(2.5, 0), "0:00:02");
        assert_eq!(format_duration(3.5, 0), "0:00:04");
        assert_eq!(format_duration(59.96, 1), "0:01:00.0");
    }

    #[test]
    fn digits_beyond_nanoseconds_are_capped() {
        assert_eq!(format_duration(10.0, 9), "0:00:10.000000000");
        assert_eq!(format_duration(10.0, 19), "0:00:10.000000000");
        assert_eq!(format_duration(1.0, 20), "0:00:01.000000000");
        assert_eq!(format_duration(3661.5, u32::MAX), "1:01:01.500000000");
    }

    #[test]
    fn days_and_negatives() {
        assert_eq!(format_duration(86_400.0 + 61.0, 0), "1 day, 0:01:01");
        assert_eq!(format_duration(3.0 * 86_400.0, 0), "3 days, 0:00:00");
        assert_eq!(format_duration(-90.0, 0), "-0:01:30");
        assert_eq!(format_duration(-0.01, 0), "0:00:00");
    }
}
