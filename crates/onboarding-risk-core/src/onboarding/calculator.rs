use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::types::{RiskAssessmentResult, RuleTable, RuleType};

use super::bucketizer::bucketize;
use super::cache::{Clock, IndexCacheKey, RuleIndexCache, SystemClock};
use super::entity::Entity;
use super::evaluator::{evaluate, evaluate_declared_type, shareholder_prefix, Evaluation};
use super::field_mapping::{relevant_categories, EntityArchetype};
use super::normalizer::normalize_text;
use super::rule_index::{build_index, RuleIndex};
use super::rule_source::RuleSource;

// ---------------------------------------------------------------------------
// Pure scoring
// ---------------------------------------------------------------------------

/// Archetype and shareholder flag for an entity, or `None` when its customer
/// type is missing or unknown.
pub fn index_key_for(entity: &Entity) -> Option<IndexCacheKey> {
    let archetype = EntityArchetype::from_customer_type(entity.customer_type.as_deref()?)?;
    Some(IndexCacheKey {
        archetype,
        include_shareholders: archetype == EntityArchetype::LegalEntity
            && !entity.shareholders.is_empty(),
    })
}

/// Index over just the rules an evaluation under `key` can fire.
pub fn build_index_for(table: &RuleTable, rule_type: RuleType, key: IndexCacheKey) -> RuleIndex {
    let wanted: Vec<String> = relevant_categories(key.archetype, key.include_shareholders)
        .into_iter()
        .filter_map(normalize_text)
        .collect();
    let subset: Vec<_> = table
        .scoring_rules(rule_type)
        .into_iter()
        .filter(|rule| {
            rule.category_name
                .as_deref()
                .and_then(normalize_text)
                .is_some_and(|c| wanted.contains(&c))
        })
        .collect();
    build_index(&subset)
}

fn finalize(evaluation: Evaluation) -> RiskAssessmentResult {
    let count = evaluation.triggered_rules.len();
    let score = if count == 0 {
        Decimal::ZERO
    } else {
        (evaluation.total_score / Decimal::from(count)).normalize()
    };
    RiskAssessmentResult {
        score,
        level: bucketize(score),
        total_score: evaluation.total_score,
        triggered_rules: evaluation.triggered_rules,
    }
}

/// Score an entity against a prepared index.
///
/// Output order: the entity's own fields in mapping order, then each
/// shareholder in array order.
pub fn assess_with_index(entity: &Entity, key: IndexCacheKey, index: &RuleIndex) -> RiskAssessmentResult {
    let mut evaluation = evaluate(&entity.attributes, key.archetype, index, "");

    if key.include_shareholders {
        for shareholder in &entity.shareholders {
            let prefix = shareholder_prefix(shareholder.position);
            let archetype = EntityArchetype::for_shareholder(shareholder.entity_type.as_deref());
            evaluation.merge(evaluate(&shareholder.attributes, archetype, index, &prefix));
            if let Some(declared) = shareholder.entity_type.as_deref() {
                evaluation.merge(evaluate_declared_type(declared, index, &prefix));
            }
        }
    }

    finalize(evaluation)
}

/// One-shot scoring against a rule table, without caching.
pub fn calculate_risk_score(entity: &Entity, table: &RuleTable) -> RiskAssessmentResult {
    let Some(key) = index_key_for(entity) else {
        return RiskAssessmentResult::zero();
    };
    let index = build_index_for(table, RuleType::Onboarding, key);
    assess_with_index(entity, key, &index)
}

// ---------------------------------------------------------------------------
// Cached calculator
// ---------------------------------------------------------------------------

/// Long-lived scorer that fetches rules from a source and caches built
/// indexes per archetype. Safe to share across threads.
pub struct RiskCalculator {
    source: Arc<dyn RuleSource>,
    cache: RuleIndexCache,
    config: EngineConfig,
}

impl std::fmt::Debug for RiskCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskCalculator")
            .field("cache", &self.cache)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RiskCalculator {
    pub fn new(source: Arc<dyn RuleSource>, config: EngineConfig) -> Self {
        Self::with_clock(source, config, Arc::new(SystemClock))
    }

    pub fn with_clock(source: Arc<dyn RuleSource>, config: EngineConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            cache: RuleIndexCache::new(clock),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &RuleIndexCache {
        &self.cache
    }

    /// Index for `key`, from cache or rebuilt from the rule source. `None`
    /// when the source cannot be read.
    pub fn rule_index(&self, key: IndexCacheKey) -> Option<Arc<RuleIndex>> {
        if self.config.cache_enabled {
            if let Some(index) = self.cache.get(&key) {
                tracing::debug!(?key, "rule index cache hit");
                return Some(index);
            }
        }

        let table = match self.source.fetch_rule_table() {
            Ok(table) => table,
            Err(e) => {
                tracing::warn!(error = %e, "rule source unavailable, scoring with no rules");
                return None;
            }
        };
        if table.is_empty() {
            tracing::warn!("rule source returned an empty rule table");
        }

        let index = Arc::new(build_index_for(&table, self.config.rule_type, key));
        tracing::debug!(?key, rules = index.rule_count(), "rebuilt rule index");
        if self.config.cache_enabled {
            let expires_at = self
                .cache
                .now()
                .checked_add_signed(self.config.cache_ttl())
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            self.cache.put(key, Arc::clone(&index), expires_at);
        }
        Some(index)
    }

    /// Score an entity. Never fails: unknown customer types and rule source
    /// outages both yield the zero result.
    pub fn calculate_risk_score(&self, entity: &Entity) -> RiskAssessmentResult {
        let Some(key) = index_key_for(entity) else {
            tracing::debug!(
                customer_type = ?entity.customer_type,
                "unknown customer type, returning zero score"
            );
            return RiskAssessmentResult::zero();
        };
        match self.rule_index(key) {
            Some(index) => assess_with_index(entity, key, &index),
            None => RiskAssessmentResult::zero(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RiskEngineError;
    use crate::onboarding::cache::tests::FakeClock;
    use crate::onboarding::entity::Attributes;
    use crate::onboarding::rule_source::StaticRuleSource;
    use crate::types::{RiskLevel, RiskRule};
    use crate::RiskEngineResult;
    use chrono::Duration;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

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

    fn table() -> RuleTable {
        RuleTable {
            categories: Vec::new(),
            rules: vec![
                rule("san-none", "Full Name Sanction", "No name match", 1),
                rule("pep-yes", "PEP", "Yes", 4),
                rule("nat-ir", "Nationality", "Iran", 5),
                rule("ct-off", "CUSTOMER TYPE", "Offshore Company", 5),
            ],
        }
    }

    struct CountingSource {
        calls: AtomicUsize,
        table: RuleTable,
    }

    impl RuleSource for CountingSource {
        fn fetch_rule_table(&self) -> RiskEngineResult<RuleTable> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.table.clone())
        }
    }

    fn legal_entity() -> Entity {
        Entity::new("Legal Entities", Attributes::default())
            .with_shareholder("Natural Person", Attributes::default().with("pep", "Yes"))
    }

    #[test]
    fn test_unknown_customer_type_is_zero() {
        let entity = Entity::new("Trust", Attributes::default().with("pep", "Yes"));
        assert_eq!(calculate_risk_score(&entity, &table()), RiskAssessmentResult::zero());
        assert_eq!(
            calculate_risk_score(&Entity::default(), &table()),
            RiskAssessmentResult::zero()
        );
    }

    #[test]
    fn test_natural_person_ignores_shareholders() {
        let entity = Entity::new("Natural Person", Attributes::default())
            .with_shareholder("Offshore Company", Attributes::default().with("nationality", "Iran"));
        let key = index_key_for(&entity).unwrap();
        assert!(!key.include_shareholders);
        let result = calculate_risk_score(&entity, &table());
        assert_eq!(result.triggered_rules.len(), 1);
    }

    #[test]
    fn test_subset_excludes_shareholder_categories() {
        let key = IndexCacheKey {
            archetype: EntityArchetype::LegalEntity,
            include_shareholders: false,
        };
        let index = build_index_for(&table(), RuleType::Onboarding, key);
        assert!(!index.has_category("CUSTOMER TYPE"));
        assert!(!index.has_category("PEP"));
        assert!(index.has_category("Nationality"));
    }

    #[test]
    fn test_average_not_sum() {
        let entity = Entity::new("Natural Person", Attributes::default().with("nationality", "Iran"));
        let result = calculate_risk_score(&entity, &table());
        assert_eq!(result.total_score, dec!(6));
        assert_eq!(result.score, dec!(3));
        assert_eq!(result.level, RiskLevel::Medium);
    }

    #[test]
    fn test_shareholder_declared_type_checked() {
        let entity = Entity::new("Legal Entities", Attributes::default())
            .with_shareholder("Offshore Company", Attributes::default());
        let result = calculate_risk_score(&entity, &table());
        let contexts: Vec<&str> = result
            .triggered_rules
            .iter()
            .map(|r| r.field_context.as_str())
            .collect();
        assert_eq!(
            contexts,
            vec![
                "fullNameSanctionMatch",
                "shareholder.0.fullNameSanctionMatch",
                "shareholder.0.customerType"
            ]
        );
    }

    #[test]
    fn test_cache_reused_until_expiry() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            table: table(),
        });
        let clock = Arc::new(FakeClock::new());
        let calc = RiskCalculator::with_clock(source.clone(), EngineConfig::default(), clock.clone());

        calc.calculate_risk_score(&legal_entity());
        calc.calculate_risk_score(&legal_entity());
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        clock.advance(Duration::seconds(301));
        calc.calculate_risk_score(&legal_entity());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_keyed_by_shareholder_flag() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            table: table(),
        });
        let calc = RiskCalculator::new(source.clone(), EngineConfig::default());
        calc.calculate_risk_score(&legal_entity());
        calc.calculate_risk_score(&Entity::new("Legal Entities", Attributes::default()));
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(calc.cache().len(), 2);
    }

    #[test]
    fn test_cache_disabled_always_fetches() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            table: table(),
        });
        let config = EngineConfig {
            cache_enabled: false,
            ..EngineConfig::default()
        };
        let calc = RiskCalculator::new(source.clone(), config);
        calc.calculate_risk_score(&legal_entity());
        calc.calculate_risk_score(&legal_entity());
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert!(calc.cache().is_empty());
    }

    #[test]
    fn test_source_failure_degrades_and_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let failing = move || -> RiskEngineResult<RuleTable> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(RiskEngineError::RuleSourceUnavailable("timeout".to_string()))
        };
        let calc = RiskCalculator::new(Arc::new(failing), EngineConfig::default());
        assert_eq!(calc.calculate_risk_score(&legal_entity()), RiskAssessmentResult::zero());
        assert_eq!(calc.calculate_risk_score(&legal_entity()), RiskAssessmentResult::zero());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(calc.cache().is_empty());
    }

    #[test]
    fn test_huge_ttl_saturates_instead_of_overflowing() {
        let source = Arc::new(CountingSource {
            calls: AtomicUsize::new(0),
            table: table(),
        });
        let config = EngineConfig {
            cache_ttl_seconds: 10_000_000_000_000,
            ..EngineConfig::default()
        };
        let calc = RiskCalculator::new(source.clone(), config);
        let entity = Entity::new("Natural Person", Attributes::default().with("pep", "Yes"));
        let result = calc.calculate_risk_score(&entity);
        assert_eq!(result.total_score, dec!(5));
        calc.calculate_risk_score(&entity);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_average_has_canonical_scale() {
        let entity = Entity::new("Natural Person", Attributes::default().with("pep", "Yes"));
        let result = calculate_risk_score(&entity, &table());
        assert_eq!(result.score.to_string(), "2.5");
        assert_eq!(serde_json::to_value(&result).unwrap()["score"], serde_json::json!("2.5"));
    }

    #[test]
    fn test_static_source_matches_one_shot() {
        let calc = RiskCalculator::new(Arc::new(StaticRuleSource::new(table())), EngineConfig::default());
        assert_eq!(
            calc.calculate_risk_score(&legal_entity()),
            calculate_risk_score(&legal_entity(), &table())
        );
    }
}
