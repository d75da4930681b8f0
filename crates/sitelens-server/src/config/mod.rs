//! Configuration loading and resolution.
//!
//! Every setting resolves as: explicit flag, then environment, then default.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use sitelens::NoiseRules;

pub const ENV_ADDR: &str = "SITELENS_ADDR";
pub const ENV_NOISE_RULES: &str = "SITELENS_NOISE_RULES";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SITELENS_REQUEST_TIMEOUT_MS";

pub const DEFAULT_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolve the listen address.
pub fn resolve_addr(explicit: Option<&str>) -> String {
    if let Some(addr) = explicit {
        return addr.to_string();
    }

    if let Ok(env_addr) = std::env::var(ENV_ADDR) {
        if !env_addr.trim().is_empty() {
            return env_addr.trim().to_string();
        }
    }

    DEFAULT_ADDR.to_string()
}

/// Resolve the noise rule file, if any. `None` means the embedded table.
pub fn resolve_noise_rules_path(explicit: Option<&str>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(PathBuf::from(path));
    }

    std::env::var(ENV_NOISE_RULES)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
}

/// Load the resolved noise table. A file that cannot be read or parsed is a
/// startup error.
pub fn load_noise_rules(explicit: Option<&str>) -> anyhow::Result<NoiseRules> {
    match resolve_noise_rules_path(explicit) {
        Some(path) => NoiseRules::from_path(&path)
            .with_context(|| format!("failed to load noise rules from {}", path.display())),
        None => Ok(NoiseRules::builtin().clone()),
    }
}

/// Resolve the per-request deadline.
pub fn resolve_request_timeout(explicit_ms: Option<u64>) -> anyhow::Result<Duration> {
    if let Some(ms) = explicit_ms {
        return Ok(Duration::from_millis(ms));
    }

    match std::env::var(ENV_REQUEST_TIMEOUT_MS) {
        Ok(raw) => {
            let ms: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_REQUEST_TIMEOUT_MS} must be milliseconds, got {raw:?}"))?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(DEFAULT_REQUEST_TIMEOUT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_values_win() {
        assert_eq!(resolve_addr(Some("0.0.0.0:9000")), "0.0.0.0:9000");
        assert_eq!(
            resolve_noise_rules_path(Some("/tmp/rules.json")),
            Some(PathBuf::from("/tmp/rules.json"))
        );
        assert_eq!(resolve_request_timeout(Some(250)).unwrap(), Duration::from_millis(250));
    }

    #[test]
    fn test_load_noise_rules_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(
            &path,
            r#"{"version":1,"rules":[{"attribute":"class","match":"token","value":"promo"}]}"#,
        )
        .unwrap();
        let rules = load_noise_rules(path.to_str()).unwrap();
        assert_eq!(rules.rules.len(), 1);

        std::fs::write(&path, "not json").unwrap();
        let err = load_noise_rules(path.to_str()).unwrap_err();
        assert!(err.to_string().contains("failed to load noise rules"));
    }
}
