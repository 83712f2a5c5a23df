//! Website blocking: domain input handling and the rule-table collaborator.

use anyhow::Result;
use async_trait::async_trait;

pub mod domain;
pub mod rules;

pub use domain::{normalize_domain, DomainError, DomainList};
pub use rules::{build_rules, BlockRule, InMemoryRuleSet, UnavailableBlocker, DEFAULT_RULE_ID_START};

#[async_trait]
pub trait BlockingRules: Send + Sync {
    /// With `active` set, install one block rule per domain (replacing any
    /// rule with the same id). Otherwise remove the rules for these domains;
    /// absent rules are ignored.
    async fn apply_blocking_rules(&self, domains: &[String], active: bool) -> Result<()>;
}
