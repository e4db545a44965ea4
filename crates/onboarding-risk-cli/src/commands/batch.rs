use std::sync::Arc;

use clap::Args;
use serde_json::{json, Value};

use onboarding_risk_core::onboarding::{Entity, RiskCalculator, StaticRuleSource};
use onboarding_risk_core::{EngineConfig, RiskEngineError};

use crate::input;

/// Arguments for scoring many entities against one rule table
#[derive(Args)]
pub struct BatchArgs {
    /// Path to the rule table JSON
    #[arg(long)]
    pub rules: String,

    /// Path to a JSON array of entity records
    #[arg(long)]
    pub entities: String,
}

pub fn run_batch(args: BatchArgs, config: EngineConfig) -> Result<Value, Box<dyn std::error::Error>> {
    let table = input::file::read_rule_table(&args.rules)?;
    let records = input::file::read_records(&args.entities)?;

    let calculator = RiskCalculator::new(Arc::new(StaticRuleSource::new(table)), config);

    let mut results = Vec::with_capacity(records.len());
    for (position, record) in records.iter().enumerate() {
        if !record.is_object() {
            return Err(RiskEngineError::InvalidInput {
                field: format!("entities[{}]", position),
                reason: "record must be a JSON object".into(),
            }
            .into());
        }
        let result = calculator.calculate_risk_score(&Entity::from_json(record));
        results.push(json!({
            "record": position,
            "score": result.score,
            "level": result.level,
            "totalScore": result.total_score,
            "triggeredRules": result.triggered_rules.len(),
        }));
    }

    tracing::info!(
        records = results.len(),
        cached_indexes = calculator.cache().len(),
        "batch complete"
    );
    Ok(json!({ "results": results }))
}
