use clap::Args;
use serde_json::{json, Value};

use crate::input;

/// Arguments for checking a rule table export
#[derive(Args)]
pub struct ValidateRulesArgs {
    /// Path to the rule table JSON
    #[arg(long)]
    pub rules: String,
}

pub fn run_validate_rules(args: ValidateRulesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let table = input::file::read_rule_table(&args.rules)?;
    table.validate()?;

    let summary = table.summary();
    if !summary.unresolved_rules.is_empty() {
        tracing::warn!(
            count = summary.unresolved_rules.len(),
            "rules reference unknown categories and will not be scored"
        );
    }
    Ok(json!({ "result": summary }))
}
