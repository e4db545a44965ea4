use napi::Result as NapiResult;
use napi_derive::napi;

use onboarding_risk_core::onboarding::{self, Entity};
use onboarding_risk_core::{RiskEngineError, RuleTable};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_rule_table(rules_json: &str) -> NapiResult<RuleTable> {
    serde_json::from_str(rules_json).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Scoring
// ---------------------------------------------------------------------------

/// Score one onboarding record. Both arguments are JSON strings; the record
/// may use camelCase, lowercase or snake_case attribute names.
#[napi]
pub fn calculate_risk_score(rules_json: String, entity_json: String) -> NapiResult<String> {
    let table = parse_rule_table(&rules_json)?;
    let record: serde_json::Value = serde_json::from_str(&entity_json).map_err(to_napi_error)?;
    if !record.is_object() {
        return Err(to_napi_error(RiskEngineError::InvalidInput {
            field: "entity".into(),
            reason: "record must be a JSON object".into(),
        }));
    }
    let output = onboarding::calculate_risk_score(&Entity::from_json(&record), &table);
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn bucketize_score(score: f64) -> NapiResult<String> {
    Ok(onboarding::bucketizer::bucketize_f64(score).to_string())
}

// ---------------------------------------------------------------------------
// Rule tables
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_rule_table(rules_json: String) -> NapiResult<String> {
    let table = parse_rule_table(&rules_json)?;
    table.validate().map_err(to_napi_error)?;
    serde_json::to_string(&table.summary()).map_err(to_napi_error)
}
