use std::{collections::BTreeMap, sync::Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{log_info, log_warn};

use super::BlockingRules;

const ENABLE_LOGS: bool = true;

pub const DEFAULT_RULE_ID_START: u32 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RuleCondition {
    pub url_filter: String,
    pub resource_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BlockRule {
    pub id: u32,
    pub priority: u32,
    pub action: String,
    pub condition: RuleCondition,
}

/// Rule ids are positional: the domain at `index` always maps to
/// `rule_id_start + index`.
pub fn rule_ids(domains: &[String], rule_id_start: u32) -> Vec<u32> {
    (0..domains.len() as u32)
        .map(|index| rule_id_start + index)
        .collect()
}

pub fn build_rules(domains: &[String], rule_id_start: u32) -> Vec<BlockRule> {
    domains
        .iter()
        .zip(rule_ids(domains, rule_id_start))
        .map(|(domain, id)| BlockRule {
            id,
            priority: 1,
            action: "block".to_string(),
            condition: RuleCondition {
                url_filter: domain.clone(),
                resource_types: vec!["main_frame".to_string()],
            },
        })
        .collect()
}

/// Dynamic rule table kept in memory. Stands in for the browser's
/// packet-filter API in tests and headless runs.
#[derive(Debug)]
pub struct InMemoryRuleSet {
    rule_id_start: u32,
    rules: Mutex<BTreeMap<u32, BlockRule>>,
}

impl Default for InMemoryRuleSet {
    fn default() -> Self {
        Self::new(DEFAULT_RULE_ID_START)
    }
}

impl InMemoryRuleSet {
    pub fn new(rule_id_start: u32) -> Self {
        Self {
            rule_id_start,
            rules: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn installed(&self) -> Vec<BlockRule> {
        match self.rules.lock() {
            Ok(guard) => guard.values().cloned().collect(),
            Err(poisoned) => poisoned.into_inner().values().cloned().collect(),
        }
    }

    pub fn blocked_filters(&self) -> Vec<String> {
        self.installed()
            .into_iter()
            .map(|rule| rule.condition.url_filter)
            .collect()
    }
}

#[async_trait]
impl BlockingRules for InMemoryRuleSet {
    async fn apply_blocking_rules(&self, domains: &[String], active: bool) -> Result<()> {
        let ids = rule_ids(domains, self.rule_id_start);
        let mut guard = self
            .rules
            .lock()
            .map_err(|err| anyhow!("rule table lock poisoned: {err}"))?;

        for id in &ids {
            guard.remove(id);
        }

        if !active {
            log_info!("Blocking rules removed: {:?}", ids);
            return Ok(());
        }

        let rules = build_rules(domains, self.rule_id_start);
        for rule in rules {
            guard.insert(rule.id, rule);
        }
        log_info!("Blocking rules applied: {:?}", ids);
        Ok(())
    }
}

/// Adapter for environments without a rule API. Every call fails, which the
/// session machine logs and otherwise ignores.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnavailableBlocker;

#[async_trait]
impl BlockingRules for UnavailableBlocker {
    async fn apply_blocking_rules(&self, domains: &[String], active: bool) -> Result<()> {
        log_warn!(
            "Rule API not available; cannot {} {} domain(s)",
            if active { "block" } else { "unblock" },
            domains.len()
        );
        Err(anyhow!("declarative rule API not available"))
    }
}
