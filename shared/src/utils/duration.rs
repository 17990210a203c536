//! Human-readable duration parsing for configuration values
//!
//! Token lifetimes are configured as strings such as `"15m"`, `"2h"` or `"7d"`.
//! Compound values (`"1h30m"`) are accepted; every segment needs a unit.

use std::time::Duration;
use thiserror::Error;

/// Errors produced while parsing a duration string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DurationParseError {
    #[error("Duration string is empty")]
    Empty,

    #[error("Missing unit after number in duration: {0}")]
    MissingUnit(String),

    #[error("Missing number before unit in duration: {0}")]
    MissingNumber(String),

    #[error("Unknown duration unit '{unit}' in: {input}")]
    UnknownUnit { unit: String, input: String },

    #[error("Duration overflows: {0}")]
    Overflow(String),
}

/// Parse a duration string like `"15m"`, `"7d"` or `"1h30m"`
///
/// Supported units: `ms`, `s`, `m`, `h`, `d`, `w`.
pub fn parse_duration(input: &str) -> Result<Duration, DurationParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DurationParseError::Empty);
    }

    let mut total_ms: u64 = 0;
    let mut chars = trimmed.chars().peekable();

    while chars.peek().is_some() {
        let mut number = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
            number.push(c);
            chars.next();
        }

        let mut unit = String::new();
        while let Some(c) = chars.peek().copied().filter(char::is_ascii_alphabetic) {
            unit.push(c);
            chars.next();
        }

        if number.is_empty() {
            return Err(DurationParseError::MissingNumber(input.to_string()));
        }
        if unit.is_empty() {
            // Either a bare number or a stray character we cannot interpret
            return match chars.peek() {
                None => Err(DurationParseError::MissingUnit(input.to_string())),
                Some(c) => Err(DurationParseError::UnknownUnit {
                    unit: c.to_string(),
                    input: input.to_string(),
                }),
            };
        }

        let value: u64 = number
            .parse()
            .map_err(|_| DurationParseError::Overflow(input.to_string()))?;
        let unit_ms: u64 = match unit.as_str() {
            "ms" => 1,
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            "d" => 86_400_000,
            "w" => 604_800_000,
            _ => {
                return Err(DurationParseError::UnknownUnit {
                    unit,
                    input: input.to_string(),
                })
            }
        };

        total_ms = value
            .checked_mul(unit_ms)
            .and_then(|ms| total_ms.checked_add(ms))
            .ok_or_else(|| DurationParseError::Overflow(input.to_string()))?;
    }

    Ok(Duration::from_millis(total_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_units() {
        assert_eq!(parse_duration("500ms").unwrap(), Duration::from_millis(500));
        assert_eq!(parse_duration("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("1w").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_compound_and_whitespace() {
        assert_eq!(parse_duration("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_duration("  1d12h ").unwrap(), Duration::from_secs(129_600));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(parse_duration(""), Err(DurationParseError::Empty));
        assert!(matches!(parse_duration("15"), Err(DurationParseError::MissingUnit(_))));
        assert!(matches!(parse_duration("h"), Err(DurationParseError::MissingNumber(_))));
        assert!(matches!(
            parse_duration("3y"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("3-h"),
            Err(DurationParseError::UnknownUnit { .. })
        ));
        assert!(matches!(
            parse_duration("99999999999999999999d"),
            Err(DurationParseError::Overflow(_))
        ));
    }
}
