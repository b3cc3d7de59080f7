//! Error types module
//!
//! Configuration errors are fatal: the process refuses to start instead of
//! serving traffic with a partially configured telemetry stack.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{key} has an invalid value '{value}': {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must not be empty")]
    Empty { key: &'static str },

    #[error("Invalid collector endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_offending_key() {
        let err = ConfigError::InvalidValue {
            key: "PORT",
            value: "eighty".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "PORT has an invalid value 'eighty': invalid digit found in string"
        );

        let err = ConfigError::InvalidEndpoint {
            endpoint: "localhost".to_string(),
            reason: "missing scheme".to_string(),
        };
        assert!(err.to_string().contains("localhost"));
    }
}
