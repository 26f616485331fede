//! Rule repository configuration.
//!
//! Maps to a `[repository]`-style TOML table. Defaults point at the public
//! rule collection; hosts override the location and timeout through
//! `config.toml`.
//!
//! ## Example
//!
//! ```toml
//! base_url = "https://conwaylife.com/rules"
//! timeout_secs = 30
//! ```

use serde::{Deserialize, Serialize};

/// Where remote `@TABLE`/`@TREE` definitions are fetched from.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct RuleRepositoryConfig {
    /// Repository root; `<base_url>/<name>.rule` must resolve.
    pub base_url: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RuleRepositoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://conwaylife.com/rules".to_string(),
            timeout_secs: 30,
        }
    }
}

impl RuleRepositoryConfig {
    /// Loads and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config = toml::from_str::<Self>(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.base_url.is_empty(), "base_url must not be empty");
        anyhow::ensure!(self.timeout_secs > 0, "timeout_secs must be positive");
        anyhow::ensure!(
            self.timeout_secs <= 300,
            "timeout_secs too high (max 300)"
        );
        Ok(())
    }

    /// The URL a named rule definition is served from.
    #[must_use]
    pub fn rule_url(&self, rule_name: &str) -> String {
        format!("{}/{}.rule", self.base_url.trim_end_matches('/'), rule_name)
    }
}
