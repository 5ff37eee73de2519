//! Domain error types.

/// Top-level error type for fundwatch.
#[derive(Debug, thiserror::Error)]
pub enum FundwatchError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no NAV data available for {holding}")]
    DataUnavailable { holding: String },

    #[error("persistence error for {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl FundwatchError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        FundwatchError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_missing(section: &str, key: &str) -> Self {
        FundwatchError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<&FundwatchError> for std::process::ExitCode {
    fn from(err: &FundwatchError) -> Self {
        let code: u8 = match err {
            FundwatchError::Io(_) => 1,
            FundwatchError::ConfigParse { .. }
            | FundwatchError::ConfigMissing { .. }
            | FundwatchError::ConfigInvalid { .. } => 2,
            FundwatchError::Database { .. } | FundwatchError::DatabaseQuery { .. } => 3,
            FundwatchError::Persistence { .. } | FundwatchError::Serialization(_) => 4,
            FundwatchError::DataUnavailable { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_errors_name_section_and_key() {
        let err = FundwatchError::config_invalid("holding.006282", "callback", "must be in (0, 1)");
        assert_eq!(
            err.to_string(),
            "invalid config value [holding.006282] callback: must be in (0, 1)"
        );

        let err = FundwatchError::config_missing("portfolio", "holdings");
        assert_eq!(err.to_string(), "missing config key [portfolio] holdings");
    }

    #[test]
    fn data_unavailable_message() {
        let err = FundwatchError::DataUnavailable {
            holding: "017091".into(),
        };
        assert_eq!(err.to_string(), "no NAV data available for 017091");
    }
}
