//! CLI-level error type distinguishing validation from operational failures.

use std::fmt::{self, Display, Formatter};

use mklink_config::ConfigError;
use mklink_core::LinkError;

/// Exit code when every requested link was created.
pub(crate) const EXIT_OK: i32 = 0;
/// Exit code when at least one link failed.
pub(crate) const EXIT_PARTIAL: i32 = 1;
/// Exit code when the process was interrupted.
pub(crate) const EXIT_CANCELLED: i32 = 130;

#[derive(Debug)]
pub(crate) enum CliError {
    Validation(String),
    Failure(anyhow::Error),
    Cancelled,
}

/// Convenience alias for functions returning a `CliError`.
pub(crate) type CliResult<T> = Result<T, CliError>;

impl CliError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn failure(error: impl Into<anyhow::Error>) -> Self {
        Self::Failure(error.into())
    }

    pub(crate) const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 3,
            Self::Cancelled => EXIT_CANCELLED,
        }
    }

    pub(crate) fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
            Self::Cancelled => "cancelled".to_string(),
        }
    }
}

impl Display for CliError {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("cli error")
    }
}

impl std::error::Error for CliError {}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        let message = match error {
            ConfigError::InvalidField {
                section,
                field,
                value,
                reason,
            } => format!(
                "invalid {section}.{field}{}: {reason}",
                value.map(|value| format!(" ({value})")).unwrap_or_default()
            ),
            ConfigError::Io { path, source, .. } => format!(
                "configuration file {} could not be read: {source}",
                path.display()
            ),
            ConfigError::Json { path, source } => format!(
                "configuration file {} could not be parsed: {source}",
                path.display()
            ),
        };
        Self::Validation(message)
    }
}

impl From<LinkError> for CliError {
    fn from(error: LinkError) -> Self {
        match error {
            LinkError::Cancelled => Self::Cancelled,
            other => Self::failure(other),
        }
    }
}
