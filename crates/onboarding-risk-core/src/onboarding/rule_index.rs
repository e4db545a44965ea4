use std::collections::HashMap;

use crate::types::RiskRule;

use super::normalizer::normalize_text;

/// Two-level lookup: normalized category name → normalized option label →
/// rules in insertion order.
#[derive(Debug, Clone, Default)]
pub struct RuleIndex {
    categories: HashMap<String, HashMap<String, Vec<RiskRule>>>,
    rule_count: usize,
}

impl RuleIndex {
    /// Rules in `category_name` whose label normalizes to `normalized_label`.
    pub fn lookup(&self, category_name: &str, normalized_label: &str) -> &[RiskRule] {
        let Some(key) = normalize_text(category_name) else {
            return &[];
        };
        self.categories
            .get(&key)
            .and_then(|labels| labels.get(normalized_label))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_category(&self, category_name: &str) -> bool {
        normalize_text(category_name).is_some_and(|key| self.categories.contains_key(&key))
    }

    pub fn rule_count(&self) -> usize {
        self.rule_count
    }

    pub fn category_count(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rule_count == 0
    }
}

/// Strip trailing parenthetical qualifiers from a rule's display text:
/// "United States (Tier 1)" → "United States".
pub fn extract_option_label(text: &str) -> &str {
    let mut label = text.trim();
    while label.ends_with(')') {
        let Some(open) = label.rfind('(') else {
            break;
        };
        let stripped = label[..open].trim_end();
        if stripped.is_empty() {
            break;
        }
        label = stripped;
    }
    label
}

/// Build the lookup index. Pure: the same rules always yield the same index.
///
/// Rules without a category name, with an empty label, or with a score
/// outside 1..=5 are skipped.
pub fn build_index(rules: &[RiskRule]) -> RuleIndex {
    let mut index = RuleIndex::default();
    for rule in rules {
        if !rule.has_valid_score() {
            tracing::warn!(rule_id = %rule.id, score = rule.risk_score, "rule score out of range, not indexed");
            continue;
        }
        let Some(category) = rule.category_name.as_deref().and_then(normalize_text) else {
            tracing::warn!(rule_id = %rule.id, "rule has no category name, not indexed");
            continue;
        };
        let Some(label) = normalize_text(extract_option_label(&rule.option_label)) else {
            tracing::warn!(rule_id = %rule.id, "rule has an empty option label, not indexed");
            continue;
        };
        index
            .categories
            .entry(category)
            .or_default()
            .entry(label)
            .or_default()
            .push(rule.clone());
        index.rule_count += 1;
    }
    tracing::debug!(
        rules = index.rule_count,
        categories = index.categories.len(),
        "built rule index"
    );
    index
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str, category: &str, label: &str, score: u8) -> RiskRule {
        RiskRule {
            id: id.to_string(),
            category_id: None,
            category_name: Some(category.to_string()),
            option_label: label.to_string(),
            risk_score: score,
            risk_logic: None,
            is_active: true,
            rule_type: None,
        }
    }

    #[test]
    fn test_extract_option_label() {
        assert_eq!(extract_option_label("United States (Tier 1)"), "United States");
        assert_eq!(extract_option_label("Iran (FATF) (blacklist)"), "Iran");
        assert_eq!(extract_option_label("  Yes "), "Yes");
        assert_eq!(extract_option_label("(Other)"), "(Other)");
        assert_eq!(extract_option_label("Cocos (Keeling) Islands"), "Cocos (Keeling) Islands");
    }

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let index = build_index(&[rule("r1", "Nationality", "United  States (Tier 1)", 2)]);
        let hits = index.lookup("NATIONALITY", "united states");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "r1");
        assert!(index.has_category(" nationality "));
    }

    #[test]
    fn test_duplicate_labels_keep_insertion_order() {
        let index = build_index(&[
            rule("a", "Business Activity", "Airline", 3),
            rule("b", "Business Activity", "airline", 5),
        ]);
        let ids: Vec<&str> = index
            .lookup("Business Activity", "airline")
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(index.rule_count(), 2);
        assert_eq!(index.category_count(), 1);
    }

    #[test]
    fn test_invalid_rules_skipped() {
        let mut no_category = rule("c", "PEP", "Yes", 3);
        no_category.category_name = None;
        let index = build_index(&[
            rule("a", "PEP", "Yes", 0),
            rule("b", "PEP", "  ", 3),
            no_category,
        ]);
        assert!(index.is_empty());
        assert!(index.lookup("PEP", "yes").is_empty());
    }

    #[test]
    fn test_missing_category_yields_empty_slice() {
        let index = build_index(&[]);
        assert!(index.lookup("Nationality", "iran").is_empty());
        assert!(!index.has_category("Nationality"));
    }

    #[test]
    fn test_rebuild_is_deterministic() {
        let rules = vec![
            rule("a", "PEP", "Yes", 4),
            rule("b", "PEP", "No", 1),
            rule("c", "Nationality", "Iran", 5),
        ];
        let first = build_index(&rules);
        let second = build_index(&rules);
        assert_eq!(first.lookup("PEP", "yes"), second.lookup("PEP", "yes"));
        assert_eq!(first.rule_count(), second.rule_count());
    }
}
