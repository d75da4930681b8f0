//! Extraction timeouts, settle delays and interaction budgets.

use std::time::Duration;

pub const ENV_FETCH_TIMEOUT_MS: &str = "SITELENS_FETCH_TIMEOUT_MS";
pub const ENV_NAV_TIMEOUT_MS: &str = "SITELENS_NAV_TIMEOUT_MS";
pub const ENV_SETTLE_MS: &str = "SITELENS_SETTLE_MS";
pub const ENV_USER_AGENT: &str = "SITELENS_USER_AGENT";

/// Upper bound on any settle delay.
pub const MAX_SETTLE: Duration = Duration::from_millis(1500);

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a positive integer of milliseconds, got {value:?}")]
    InvalidDuration { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Upper bounds on simulated interactions during one dynamic pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractionBudget {
    pub max_tabs: usize,
    pub max_load_more: usize,
    pub scrolls: u32,
    pub max_pagination_hops: usize,
}

impl Default for InteractionBudget {
    fn default() -> Self {
        Self {
            max_tabs: 3,
            max_load_more: 1,
            scrolls: 3,
            max_pagination_hops: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractConfig {
    /// Total deadline for the static GET.
    pub fetch_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    /// Per navigation and per network-idle wait.
    pub navigation_timeout: Duration,
    /// Pause after each tab click.
    pub tab_settle: Duration,
    /// Pause after load-more clicks and scrolls.
    pub settle: Duration,
    /// Quiet period that counts as network idle.
    pub idle_quiet: Duration,
    pub budget: InteractionBudget,
    pub user_agent: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
            max_redirects: 5,
            navigation_timeout: Duration::from_secs(20),
            tab_settle: Duration::from_millis(1000),
            settle: MAX_SETTLE,
            idle_quiet: Duration::from_millis(500),
            budget: InteractionBudget::default(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ExtractConfig {
    /// Defaults overridden by `SITELENS_*` environment variables.
    ///
    /// `SITELENS_SETTLE_MS` sets both settle delays and is capped at
    /// [`MAX_SETTLE`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(d) = duration_var(&lookup, ENV_FETCH_TIMEOUT_MS)? {
            config.fetch_timeout = d;
        }
        if let Some(d) = duration_var(&lookup, ENV_NAV_TIMEOUT_MS)? {
            config.navigation_timeout = d;
        }
        if let Some(d) = duration_var(&lookup, ENV_SETTLE_MS)? {
            if d > MAX_SETTLE {
                tracing::warn!(
                    "{ENV_SETTLE_MS}={}ms exceeds the {}ms settle bound; clamping",
                    d.as_millis(),
                    MAX_SETTLE.as_millis()
                );
            }
            config.settle = d.min(MAX_SETTLE);
            config.tab_settle = config.settle;
        }
        if let Some(ua) = lookup(ENV_USER_AGENT) {
            let ua = ua.trim();
            if ua.is_empty() {
                return Err(ConfigError::Empty { var: ENV_USER_AGENT });
            }
            config.user_agent = ua.to_string();
        }
        Ok(config)
    }
}

fn duration_var(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(ConfigError::InvalidDuration { var, value: raw }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn test_defaults() {
        let c = ExtractConfig::default();
        assert_eq!(c.fetch_timeout, Duration::from_secs(15));
        assert_eq!(c.navigation_timeout, Duration::from_secs(20));
        assert_eq!(c.settle, Duration::from_millis(1500));
        assert_eq!(c.budget.scrolls, 3);
        assert_eq!(c.budget.max_pagination_hops, 2);
    }

    #[test]
    fn test_env_overrides() {
        let c = ExtractConfig::from_lookup(lookup(&[
            (ENV_FETCH_TIMEOUT_MS, "2500"),
            (ENV_SETTLE_MS, " 10 "),
            (ENV_USER_AGENT, "bot/1.0"),
        ]))
        .unwrap();
        assert_eq!(c.fetch_timeout, Duration::from_millis(2500));
        assert_eq!(c.settle, Duration::from_millis(10));
        assert_eq!(c.tab_settle, Duration::from_millis(10));
        assert_eq!(c.navigation_timeout, Duration::from_secs(20));
        assert_eq!(c.user_agent, "bot/1.0");
    }

    #[test]
    fn test_settle_override_is_capped() {
        let c = ExtractConfig::from_lookup(lookup(&[(ENV_SETTLE_MS, "5000")])).unwrap();
        assert_eq!(c.settle, MAX_SETTLE);
        assert_eq!(c.tab_settle, MAX_SETTLE);
        assert_eq!(ExtractConfig::default().tab_settle, Duration::from_secs(1));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = ExtractConfig::from_lookup(lookup(&[(ENV_NAV_TIMEOUT_MS, "soon")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidDuration { var: ENV_NAV_TIMEOUT_MS, value: "soon".into() }
        );
        assert!(ExtractConfig::from_lookup(lookup(&[(ENV_SETTLE_MS, "0")])).is_err());
        assert!(ExtractConfig::from_lookup(lookup(&[(ENV_USER_AGENT, "  ")])).is_err());
    }
}
