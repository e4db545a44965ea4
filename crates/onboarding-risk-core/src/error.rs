use thiserror::Error;

#[derive(Debug, Error)]
pub enum RiskEngineError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invalid rule table: rule {rule_id}: {reason}")]
    InvalidRuleTable { rule_id: String, reason: String },

    #[error("Rule source unavailable: {0}")]
    RuleSourceUnavailable(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<serde_json::Error> for RiskEngineError {
    fn from(e: serde_json::Error) -> Self {
        RiskEngineError::SerializationError(e.to_string())
    }
}
