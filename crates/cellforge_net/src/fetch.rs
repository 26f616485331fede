//! Remote rule fetching.
//!
//! [`RuleFetcher`] is the capability the cache talks through; the default
//! [`HttpRuleFetcher`] pulls `.rule` files from the configured repository.
//! Tests substitute their own implementation to control resolution order.

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::config::RuleRepositoryConfig;

#[async_trait]
pub trait RuleFetcher: Send + Sync {
    /// Fetches the raw rule definition text for `rule_name`.
    async fn fetch(&self, rule_name: &str) -> Result<String>;
}

/// Fetches rule definitions over HTTP from the configured repository.
pub struct HttpRuleFetcher {
    client: reqwest::Client,
    config: RuleRepositoryConfig,
}

impl HttpRuleFetcher {
    #[must_use]
    pub fn new(config: RuleRepositoryConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl RuleFetcher for HttpRuleFetcher {
    async fn fetch(&self, rule_name: &str) -> Result<String> {
        let url = self.config.rule_url(rule_name);
        tracing::debug!(rule = rule_name, url = %url, "fetching rule definition");

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("rule fetch failed: {e}"))?;

        if !response.status().is_success() {
            return Err(anyhow::anyhow!(
                "rule repository returned {}",
                response.status()
            ));
        }

        response
            .text()
            .await
            .map_err(|e| anyhow::anyhow!("rule response read failed: {e}"))
    }
}
