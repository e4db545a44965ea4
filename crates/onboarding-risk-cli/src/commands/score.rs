use std::sync::Arc;

use clap::Args;
use serde_json::Value;

use onboarding_risk_core::onboarding::{Entity, RiskCalculator, StaticRuleSource};
use onboarding_risk_core::{EngineConfig, RiskEngineError};

use crate::input;

/// Arguments for scoring a single entity
#[derive(Args)]
pub struct ScoreArgs {
    /// Path to the rule table JSON (`{ "categories": [...], "rules": [...] }`)
    #[arg(long)]
    pub rules: String,

    /// Path to the entity record JSON (reads stdin when omitted)
    #[arg(long)]
    pub entity: Option<String>,
}

pub fn run_score(args: ScoreArgs, config: EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let table = input::file::read_rule_table(&args.rules)?;

    let record: Value = if let Some(ref path) = args.entity {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        data
    } else {
        return Err("--entity is required (or pipe a record on stdin)".into());
    };

    if !record.is_object() {
        return Err(RiskEngineError::InvalidInput {
            field: "entity".into(),
            reason: "record must be a JSON object".into(),
        }
        .into());
    }

    let calculator = RiskCalculator::new(Arc::new(StaticRuleSource::new(table)), config);
    let result = calculator.calculate_risk_score(&Entity::from_json(&record));
    tracing::info!(
        score = %result.score,
        level = %result.level,
        triggered = result.triggered_rules.len(),
        "scored entity"
    );
    Ok(serde_json::to_value(result)?)
}
