use std::collections::{BTreeMap, HashSet};
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RiskEngineError;
use crate::RiskEngineResult;

/// Individual rule scores. Always within 1..=5 for a well-formed table.
pub type RuleScore = u8;

pub const MIN_RULE_SCORE: RuleScore = 1;
pub const MAX_RULE_SCORE: RuleScore = 5;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which workflow a category's rules belong to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleType {
    #[default]
    Onboarding,
    TransactionProfile,
    TransactionEvent,
}

/// Qualitative label stored alongside a rule's numeric score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLogic {
    Low,
    MediumLow,
    Medium,
    MediumHigh,
    High,
}

/// Ordinal risk tier derived from the average triggered score.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    #[serde(rename = "Medium Low")]
    MediumLow,
    Medium,
    #[serde(rename = "Medium High")]
    MediumHigh,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::MediumLow => "Medium Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::MediumHigh => "Medium High",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub rule_type: RuleType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskRule {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Display text of the option, e.g. "United States (Tier 1)".
    pub option_label: String,
    pub risk_score: RuleScore,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_logic: Option<RiskLogic>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Overrides the category's rule type when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,
}

fn default_true() -> bool {
    true
}

impl RiskRule {
    pub fn has_valid_score(&self) -> bool {
        (MIN_RULE_SCORE..=MAX_RULE_SCORE).contains(&self.risk_score)
    }
}

/// The externally sourced reference data the engine scores against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTable {
    #[serde(default)]
    pub categories: Vec<RiskCategory>,
    #[serde(default)]
    pub rules: Vec<RiskRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleTableSummary {
    pub total_rules: usize,
    pub active_rules: usize,
    pub inactive_rules: usize,
    /// Active rule count per resolved category name.
    pub rules_per_category: BTreeMap<String, usize>,
    pub unresolved_rules: Vec<String>,
}

/// Category names compare case-insensitively with whitespace collapsed.
fn same_category_name(a: &str, b: &str) -> bool {
    let mut left = a.split_whitespace().map(str::to_lowercase);
    let mut right = b.split_whitespace().map(str::to_lowercase);
    loop {
        match (left.next(), right.next()) {
            (None, None) => return true,
            (Some(l), Some(r)) if l == r => continue,
            _ => return false,
        }
    }
}

impl RuleTable {
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Category name for a rule, falling back to its category id.
    pub fn category_name_of<'a>(&'a self, rule: &'a RiskRule) -> Option<&'a str> {
        if let Some(name) = rule.category_name.as_deref() {
            if !name.trim().is_empty() {
                return Some(name);
            }
        }
        let id = rule.category_id.as_deref()?;
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
    }

    fn rule_type_of(&self, rule: &RiskRule) -> RuleType {
        if let Some(rt) = rule.rule_type {
            return rt;
        }
        let by_id = rule
            .category_id
            .as_deref()
            .and_then(|id| self.categories.iter().find(|c| c.id == id));
        let by_name = || {
            rule.category_name
                .as_deref()
                .and_then(|n| self.categories.iter().find(|c| same_category_name(&c.name, n)))
        };
        by_id
            .or_else(by_name)
            .map(|c| c.rule_type)
            .unwrap_or_default()
    }

    /// Active rules of the given type, each with its category name filled in.
    /// Rules whose category cannot be resolved are dropped.
    pub fn scoring_rules(&self, rule_type: RuleType) -> Vec<RiskRule> {
        let mut out = Vec::with_capacity(self.rules.len());
        for rule in &self.rules {
            if !rule.is_active || self.rule_type_of(rule) != rule_type {
                continue;
            }
            match self.category_name_of(rule) {
                Some(name) => {
                    let mut resolved = rule.clone();
                    resolved.category_name = Some(name.to_string());
                    out.push(resolved);
                }
                None => {
                    tracing::warn!(rule_id = %rule.id, "rule has no resolvable category, skipping");
                }
            }
        }
        out
    }

    /// Check the table for structural defects, returning the first found.
    pub fn validate(&self) -> RiskEngineResult<()> {
        let mut seen_ids = HashSet::new();
        for rule in &self.rules {
            if rule.id.trim().is_empty() {
                return Err(RiskEngineError::InvalidRuleTable {
                    rule_id: "<empty>".to_string(),
                    reason: "Rule id must not be empty".to_string(),
                });
            }
            if !seen_ids.insert(rule.id.as_str()) {
                return Err(RiskEngineError::InvalidRuleTable {
                    rule_id: rule.id.clone(),
                    reason: "Duplicate rule id".to_string(),
                });
            }
            if !rule.has_valid_score() {
                return Err(RiskEngineError::InvalidRuleTable {
                    rule_id: rule.id.clone(),
                    reason: format!(
                        "Risk score {} outside {}..={}",
                        rule.risk_score, MIN_RULE_SCORE, MAX_RULE_SCORE
                    ),
                });
            }
            if rule.option_label.trim().is_empty() {
                return Err(RiskEngineError::InvalidRuleTable {
                    rule_id: rule.id.clone(),
                    reason: "Option label must not be empty".to_string(),
                });
            }
            if self.category_name_of(rule).is_none() {
                return Err(RiskEngineError::InvalidRuleTable {
                    rule_id: rule.id.clone(),
                    reason: match &rule.category_id {
                        Some(id) => format!("Category id '{}' not found", id),
                        None => "Rule has neither category name nor category id".to_string(),
                    },
                });
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> RuleTableSummary {
        let mut rules_per_category: BTreeMap<String, usize> = BTreeMap::new();
        let mut unresolved_rules = Vec::new();
        let mut active_rules = 0;
        for rule in &self.rules {
            if !rule.is_active {
                continue;
            }
            active_rules += 1;
            match self.category_name_of(rule) {
                Some(name) => *rules_per_category.entry(name.to_string()).or_insert(0) += 1,
                None => unresolved_rules.push(rule.id.clone()),
            }
        }
        RuleTableSummary {
            total_rules: self.rules.len(),
            active_rules,
            inactive_rules: self.rules.len() - active_rules,
            rules_per_category,
            unresolved_rules,
        }
    }
}

// ---------------------------------------------------------------------------
// Output structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggeredRule {
    pub rule_id: String,
    pub rule_text: String,
    pub score: RuleScore,
    pub category_name: String,
    /// Which attribute (and shareholder) produced the match,
    /// e.g. `nationality` or `shareholder.2.nationality`.
    pub field_context: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessmentResult {
    /// Average of the triggered rule scores.
    pub score: Decimal,
    pub level: RiskLevel,
    /// Sum of the triggered rule scores.
    pub total_score: Decimal,
    pub triggered_rules: Vec<TriggeredRule>,
}

impl RiskAssessmentResult {
    pub fn zero() -> Self {
        Self {
            score: Decimal::ZERO,
            level: RiskLevel::Low,
            total_score: Decimal::ZERO,
            triggered_rules: Vec::new(),
        }
    }
}

impl Default for RiskAssessmentResult {
    fn default() -> Self {
        Self::zero()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, category: Option<&str>, category_id: Option<&str>, score: u8) -> RiskRule {
        RiskRule {
            id: id.to_string(),
            category_id: category_id.map(str::to_string),
            category_name: category.map(str::to_string),
            option_label: "Yes".to_string(),
            risk_score: score,
            risk_logic: None,
            is_active: true,
            rule_type: None,
        }
    }

    fn table() -> RuleTable {
        RuleTable {
            categories: vec![
                RiskCategory {
                    id: "c1".to_string(),
                    name: "PEP".to_string(),
                    rule_type: RuleType::Onboarding,
                },
                RiskCategory {
                    id: "c2".to_string(),
                    name: "Transaction Volume".to_string(),
                    rule_type: RuleType::TransactionProfile,
                },
            ],
            rules: vec![
                rule("r1", None, Some("c1"), 4),
                rule("r2", Some("Transaction Volume"), None, 3),
                rule("r3", Some("PEP"), None, 2),
            ],
        }
    }

    #[test]
    fn test_level_serialises_with_spaces() {
        let json = serde_json::to_string(&RiskLevel::MediumHigh).unwrap();
        assert_eq!(json, "\"Medium High\"");
        assert_eq!(RiskLevel::MediumLow.to_string(), "Medium Low");
    }

    #[test]
    fn test_scoring_rules_resolve_category_by_id() {
        let rules = table().scoring_rules(RuleType::Onboarding);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].category_name.as_deref(), Some("PEP"));
        assert_eq!(rules[1].id, "r3");
    }

    #[test]
    fn test_scoring_rules_filter_by_type() {
        let rules = table().scoring_rules(RuleType::TransactionProfile);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "r2");
    }

    #[test]
    fn test_rule_type_matches_category_name_loosely() {
        let mut t = table();
        t.rules.push(rule("r4", Some("  transaction   VOLUME "), None, 3));
        let ids: Vec<String> = t
            .scoring_rules(RuleType::TransactionProfile)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec!["r2", "r4"]);
        assert!(t.scoring_rules(RuleType::Onboarding).iter().all(|r| r.id != "r4"));
    }

    #[test]
    fn test_inactive_rules_excluded() {
        let mut t = table();
        t.rules[0].is_active = false;
        let rules = t.scoring_rules(RuleType::Onboarding);
        assert_eq!(rules.len(), 1);
        assert_eq!(t.summary().inactive_rules, 1);
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let mut t = table();
        t.rules[2].risk_score = 6;
        let err = t.validate().unwrap_err();
        assert!(matches!(err, RiskEngineError::InvalidRuleTable { ref rule_id, .. } if rule_id == "r3"));
    }

    #[test]
    fn test_validate_rejects_duplicate_ids() {
        let mut t = table();
        t.rules[1].id = "r1".to_string();
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_dangling_category() {
        let mut t = table();
        t.rules.push(rule("r4", None, Some("missing"), 2));
        assert!(t.validate().is_err());
        assert_eq!(t.summary().unresolved_rules, vec!["r4".to_string()]);
    }

    #[test]
    fn test_rule_table_deserialises_camel_case() {
        let json = r#"{
            "categories": [{"id": "c1", "name": "PEP", "ruleType": "onboarding"}],
            "rules": [{"id": "r1", "categoryId": "c1", "optionLabel": "Yes", "riskScore": 4, "riskLogic": "medium_high"}]
        }"#;
        let t: RuleTable = serde_json::from_str(json).unwrap();
        assert!(t.rules[0].is_active);
        assert_eq!(t.rules[0].risk_logic, Some(RiskLogic::MediumHigh));
        assert!(t.validate().is_ok());
    }
}
