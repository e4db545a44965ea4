use std::fs;

use onboarding_risk_core::EngineConfig;

use super::file::resolve_path;

/// Load engine settings from a YAML file, or defaults when no path is given.
pub fn load_config(path: Option<&str>) -> Result<EngineConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => {
            let canonical = resolve_path(path)?;
            let contents = fs::read_to_string(&canonical)
                .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
            serde_yaml::from_str::<EngineConfig>(&contents)
                .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
        }
        None => EngineConfig::default(),
    };
    config.validate()?;
    Ok(config)
}
