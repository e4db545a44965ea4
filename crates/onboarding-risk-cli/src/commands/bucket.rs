use clap::Args;
use rust_decimal::Decimal;
use serde_json::{json, Value};

use onboarding_risk_core::onboarding::bucketize;

/// Arguments for mapping a raw average score to its tier
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct BucketArgs {
    /// Average score, normally within 0-5
    #[arg(long)]
    pub score: Decimal,
}

pub fn run_bucket(args: BucketArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let level = bucketize(args.score);
    Ok(json!({ "score": args.score, "level": level }))
}
