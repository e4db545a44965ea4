pub mod config;
pub mod error;
pub mod types;

#[cfg(feature = "onboarding")]
pub mod onboarding;

pub use config::EngineConfig;
pub use error::RiskEngineError;
pub use types::*;

/// Standard result type for all onboarding-risk operations
pub type RiskEngineResult<T> = Result<T, RiskEngineError>;
