use crate::types::RuleTable;
use crate::RiskEngineResult;

/// Authoritative provider of the rule table, e.g. a configuration store.
pub trait RuleSource: Send + Sync {
    fn fetch_rule_table(&self) -> RiskEngineResult<RuleTable>;
}

/// A rule table held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticRuleSource {
    table: RuleTable,
}

impl StaticRuleSource {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }
}

impl RuleSource for StaticRuleSource {
    fn fetch_rule_table(&self) -> RiskEngineResult<RuleTable> {
        Ok(self.table.clone())
    }
}

impl<F> RuleSource for F
where
    F: Fn() -> RiskEngineResult<RuleTable> + Send + Sync,
{
    fn fetch_rule_table(&self) -> RiskEngineResult<RuleTable> {
        self()
    }
}
