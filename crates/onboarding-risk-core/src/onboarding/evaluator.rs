use std::collections::HashSet;

use rust_decimal::Decimal;

use crate::types::TriggeredRule;

use super::entity::{Attributes, FieldValue};
use super::field_mapping::{
    categories, default_value, fields, is_gated, mapping_for, should_always_evaluate,
    EntityArchetype,
};
use super::normalizer::{normalize, normalize_text, NormalizedValue};
use super::rule_index::RuleIndex;

pub const FULL_NAME_MATCH: &str = "Full name match";
pub const PARTIAL_NAME_MATCH: &str = "Partial name match";
pub const NO_NAME_MATCH: &str = "No name match";

/// Qualitative label for an upstream sanction-screening match count.
pub fn sanction_match_label(match_count: u32) -> &'static str {
    match match_count {
        0..=2 => NO_NAME_MATCH,
        3 | 4 => PARTIAL_NAME_MATCH,
        _ => FULL_NAME_MATCH,
    }
}

/// `fieldName`, or `shareholder.<i>.fieldName` when `prefix` is set.
pub fn field_context(prefix: &str, field_name: &str) -> String {
    format!("{}{}", prefix, field_name)
}

pub fn shareholder_prefix(position: usize) -> String {
    format!("shareholder.{}.", position)
}

/// Rules fired for one entity and their summed score.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Evaluation {
    pub triggered_rules: Vec<TriggeredRule>,
    pub total_score: Decimal,
}

impl Evaluation {
    /// Append another evaluation's rules after this one's.
    pub fn merge(&mut self, other: Evaluation) {
        self.triggered_rules.extend(other.triggered_rules);
        self.total_score += other.total_score;
    }
}

/// Collects matches for a single evaluation call, suppressing repeats of the
/// same `ruleId:fieldContext` pair.
struct Accumulator<'a> {
    index: &'a RuleIndex,
    prefix: &'a str,
    seen: HashSet<String>,
    evaluation: Evaluation,
}

impl<'a> Accumulator<'a> {
    fn new(index: &'a RuleIndex, prefix: &'a str) -> Self {
        Self {
            index,
            prefix,
            seen: HashSet::new(),
            evaluation: Evaluation::default(),
        }
    }

    fn check(&mut self, field_name: &str, category_name: &str, value: &NormalizedValue) {
        let index = self.index;
        let context = field_context(self.prefix, field_name);
        for token in value.tokens() {
            for rule in index.lookup(category_name, token) {
                let key = format!("{}:{}", rule.id, context);
                if !self.seen.insert(key) {
                    continue;
                }
                self.evaluation.total_score += Decimal::from(rule.risk_score);
                self.evaluation.triggered_rules.push(TriggeredRule {
                    rule_id: rule.id.clone(),
                    rule_text: rule.option_label.clone(),
                    score: rule.risk_score,
                    category_name: rule
                        .category_name
                        .clone()
                        .unwrap_or_else(|| category_name.to_string()),
                    field_context: context.clone(),
                });
            }
        }
    }

    fn check_text(&mut self, field_name: &str, category_name: &str, raw: &str) {
        if let Some(token) = normalize_text(raw) {
            self.check(field_name, category_name, &NormalizedValue::Single(token));
        }
    }
}

/// Evaluate one entity (top-level or a single shareholder) against the index.
/// Shareholders are not visited; the calculator does that.
pub fn evaluate(
    attributes: &Attributes,
    archetype: EntityArchetype,
    index: &RuleIndex,
    prefix: &str,
) -> Evaluation {
    let mut acc = Accumulator::new(index, prefix);

    // every entity is screened, a missing count reads as no match
    acc.check_text(
        fields::FULL_NAME_SANCTION_MATCH,
        categories::FULL_NAME_SANCTION,
        sanction_match_label(attributes.sanction_match_count()),
    );

    for mapping in mapping_for(archetype) {
        if mapping.field == fields::FULL_NAME_SANCTION_MATCH {
            continue;
        }
        if is_gated(mapping.field, attributes) {
            continue;
        }
        let normalized = match attributes.get(mapping.field) {
            Some(raw) => normalize(raw, mapping.category),
            None => None,
        };
        let normalized = match normalized {
            Some(n) => n,
            None if should_always_evaluate(mapping.field) => {
                match default_value(mapping.field)
                    .and_then(|d| normalize(&FieldValue::Text(d.to_string()), mapping.category))
                {
                    Some(n) => n,
                    None => continue,
                }
            }
            None => continue,
        };
        acc.check(mapping.field, mapping.category, &normalized);
    }

    acc.evaluation
}

/// Check a shareholder's declared type against the `CUSTOMER TYPE` category.
pub fn evaluate_declared_type(declared_type: &str, index: &RuleIndex, prefix: &str) -> Evaluation {
    let mut acc = Accumulator::new(index, prefix);
    acc.check_text(fields::CUSTOMER_TYPE, categories::CUSTOMER_TYPE, declared_type);
    acc.evaluation
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
