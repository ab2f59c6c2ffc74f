//! Validation helpers shared by the models and the loader.

use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Validate a raw batch limit, accepting `1..=u32::MAX`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the value is below one or does not fit in `u32`.
pub fn validate_batch_max(value: i64) -> ConfigResult<u32> {
    if value < 1 {
        return Err(ConfigError::invalid(
            "symlink",
            "batch_max",
            value.to_string(),
            "must be at least 1",
        ));
    }
    u32::try_from(value).map_err(|_| {
        ConfigError::invalid(
            "symlink",
            "batch_max",
            value.to_string(),
            "must fit within an unsigned 32-bit integer",
        )
    })
}

/// Parse a batch limit supplied as text (environment variables, CLI flags).
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the text is not an integer or fails
/// [`validate_batch_max`].
pub fn parse_batch_max(raw: &str) -> ConfigResult<u32> {
    let value = raw
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::invalid("symlink", "batch_max", raw, "must be an integer"))?;
    validate_batch_max(value)
}

/// Validate a log filter directive.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidField`] when the directive is blank.
pub fn validate_log_level(raw: &str) -> ConfigResult<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            "logging",
            "level",
            raw,
            "must not be empty",
        ));
    }
    Ok(trimmed.to_string())
}

/// Convert a cache TTL in seconds; zero disables caching expiry.
#[must_use]
pub const fn cache_ttl_from_secs(secs: u64) -> Option<Duration> {
    if secs == 0 {
        None
    } else {
        Some(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_max_accepts_positive_values() {
        assert_eq!(validate_batch_max(1).ok(), Some(1));
        assert_eq!(parse_batch_max(" 250 ").ok(), Some(250));
    }

    #[test]
    fn batch_max_rejects_zero_negative_and_overflow() {
        for value in [0, -5, i64::from(u32::MAX) + 1] {
            let err = validate_batch_max(value).unwrap_err();
            assert_eq!(err.field(), Some("batch_max"));
        }
        assert!(matches!(
            parse_batch_max("lots"),
            Err(ConfigError::InvalidField {
                reason: "must be an integer",
                ..
            })
        ));
    }

    #[test]
    fn log_level_must_not_be_blank() {
        assert_eq!(validate_log_level(" debug ").ok().as_deref(), Some("debug"));
        assert!(validate_log_level("   ").is_err());
    }

    #[test]
    fn zero_ttl_disables_expiry() {
        assert!(cache_ttl_from_secs(0).is_none());
        assert_eq!(cache_ttl_from_secs(5), Some(Duration::from_secs(5)));
    }
}
