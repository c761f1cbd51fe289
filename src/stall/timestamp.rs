use std::sync::OnceLock;

use regex::Regex;

fn clock_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(\d+):([0-5]?\d):([0-5]?\d(?:\.\d+)?)$").expect("valid timestamp regex")
    })
}

/// Parse either plain seconds (`12.5`) or a clock value (`HH:MM:SS.mmm`).
pub fn parse_timestamp(value: &str) -> Result<f64, String> {
    let value = value.trim();

    if let Some(caps) = clock_pattern().captures(value) {
        let hours: f64 = caps[1].parse().map_err(|_| invalid(value))?;
        let minutes: f64 = caps[2].parse().map_err(|_| invalid(value))?;
        let seconds: f64 = caps[3].parse().map_err(|_| invalid(value))?;
        let total = hours * 3600.0 + minutes * 60.0 + seconds;
        if total <= 0.0 {
            return Err(invalid(value));
        }
        return Ok(total);
    }

    match value.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds > 0.0 => Ok(seconds),
        _ => Err(invalid(value)),
    }
}

fn invalid(value: &str) -> String {
    format!("'{value}' is not a positive number of seconds or HH:MM:SS.mmm timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_seconds() {
        assert_eq!(parse_timestamp("12.5"), Ok(12.5));
    }

    #[test]
    fn parses_clock_format() {
        assert_eq!(parse_timestamp("00:01:02.500"), Ok(62.5));
        assert_eq!(parse_timestamp("1:00:00"), Ok(3600.0));
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("soon").is_err());
        assert!(parse_timestamp("-3").is_err());
        assert!(parse_timestamp("00:99:00").is_err());
    }

    #[test]
    fn zero_clock_value_is_rejected() {
        assert!(parse_timestamp("00:00:00").is_err());
        assert!(parse_timestamp("0:0:0.000").is_err());
        assert_eq!(parse_timestamp("0:0:0.5"), Ok(0.5));
    }
}
