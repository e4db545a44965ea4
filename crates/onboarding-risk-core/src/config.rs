use serde::{Deserialize, Serialize};

use crate::error::RiskEngineError;
use crate::types::RuleType;
use crate::RiskEngineResult;

/// Engine-wide settings. Every field has a default so partial config files work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a built rule index stays valid before it is rebuilt from source.
    pub cache_ttl_seconds: u64,
    /// When false every evaluation rebuilds its index from the rule source.
    pub cache_enabled: bool,
    /// Rule type the calculator scores against.
    pub rule_type: RuleType,
}

pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;
/// One year.
pub const MAX_CACHE_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cache_ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            cache_enabled: true,
            rule_type: RuleType::Onboarding,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> RiskEngineResult<()> {
        if self.cache_enabled && self.cache_ttl_seconds == 0 {
            return Err(RiskEngineError::ConfigError(
                "cache_ttl_seconds must be positive when the cache is enabled".to_string(),
            ));
        }
        if self.cache_ttl_seconds > MAX_CACHE_TTL_SECONDS {
            return Err(RiskEngineError::ConfigError(format!(
                "cache_ttl_seconds {} exceeds the maximum of {}",
                self.cache_ttl_seconds, MAX_CACHE_TTL_SECONDS
            )));
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> chrono::Duration {
        i64::try_from(self.cache_ttl_seconds)
            .ok()
            .and_then(chrono::Duration::try_seconds)
            .unwrap_or_else(|| chrono::Duration::seconds(i64::MAX / 1000))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.cache_ttl_seconds, 300);
        assert!(config.cache_enabled);
        assert_eq!(config.rule_type, RuleType::Onboarding);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"cache_ttl_seconds": 60}"#).unwrap();
        assert_eq!(config.cache_ttl_seconds, 60);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_ttl(), chrono::Duration::seconds(60));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = EngineConfig {
            cache_ttl_seconds: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(RiskEngineError::ConfigError(_))));
    }

    #[test]
    fn test_ttl_above_one_year_rejected() {
        let at_limit = EngineConfig {
            cache_ttl_seconds: MAX_CACHE_TTL_SECONDS,
            ..EngineConfig::default()
        };
        assert!(at_limit.validate().is_ok());
        let too_long = EngineConfig {
            cache_ttl_seconds: 10_000_000_000_000,
            ..EngineConfig::default()
        };
        assert!(matches!(too_long.validate(), Err(RiskEngineError::ConfigError(_))));
    }

    #[test]
    fn test_zero_ttl_allowed_without_cache() {
        let config = EngineConfig {
            cache_ttl_seconds: 0,
            cache_enabled: false,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
