pub mod bucketizer;
pub mod cache;
pub mod calculator;
pub mod entity;
pub mod evaluator;
pub mod field_mapping;
pub mod normalizer;
pub mod rule_index;
pub mod rule_source;

pub use bucketizer::bucketize;
pub use cache::{Clock, IndexCacheKey, RuleIndexCache, SystemClock};
pub use calculator::{calculate_risk_score, RiskCalculator};
pub use entity::{Attributes, Entity, FieldValue, Shareholder};
pub use field_mapping::EntityArchetype;
pub use rule_index::{build_index, RuleIndex};
pub use rule_source::{RuleSource, StaticRuleSource};
