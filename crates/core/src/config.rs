//! Engine configuration loaded from environment variables.

use std::time::Duration;

use crate::error::CoreError;
use crate::validation::files::MimeMap;

/// Default per-attempt timeout for `active_url` DNS lookups.
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default number of DNS lookup attempts.
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 2;

/// Settings shared by every validation pass.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Timeout applied to each `active_url` lookup attempt.
    pub probe_timeout: Duration,
    /// Lookup attempts before `active_url` gives up.
    pub probe_attempts: u32,
    /// Extension to MIME type table used by `mimes`.
    pub mimes: MimeMap,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_millis(DEFAULT_PROBE_TIMEOUT_MS),
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
            mimes: MimeMap::default(),
        }
    }
}

impl ValidatorConfig {
    /// Load from the process environment.
    ///
    /// | Env var                      | Default |
    /// |------------------------------|---------|
    /// | `VALIDATOR_PROBE_TIMEOUT_MS` | `2000`  |
    /// | `VALIDATOR_PROBE_ATTEMPTS`   | `2`     |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` in place of the environment.
    pub fn from_vars<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timeout_ms: u64 = parse_var(&lookup, "VALIDATOR_PROBE_TIMEOUT_MS")?
            .unwrap_or(DEFAULT_PROBE_TIMEOUT_MS);
        let probe_attempts: u32 =
            parse_var(&lookup, "VALIDATOR_PROBE_ATTEMPTS")?.unwrap_or(DEFAULT_PROBE_ATTEMPTS);

        if timeout_ms == 0 {
            return Err(CoreError::Config(
                "VALIDATOR_PROBE_TIMEOUT_MS must be greater than 0".into(),
            ));
        }
        if probe_attempts == 0 {
            return Err(CoreError::Config(
                "VALIDATOR_PROBE_ATTEMPTS must be at least 1".into(),
            ));
        }

        Ok(Self {
            probe_timeout: Duration::from_millis(timeout_ms),
            probe_attempts,
            mimes: MimeMap::default(),
        })
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Result<Option<T>, CoreError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::Config(format!("{key} must be a positive integer, got '{raw}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = ValidatorConfig::from_vars(vars(&[])).unwrap();
        assert_eq!(config.probe_timeout, Duration::from_millis(2_000));
        assert_eq!(config.probe_attempts, 2);
    }

    #[test]
    fn reads_overrides() {
        let config = ValidatorConfig::from_vars(vars(&[
            ("VALIDATOR_PROBE_TIMEOUT_MS", "250"),
            ("VALIDATOR_PROBE_ATTEMPTS", " 5 "),
        ]))
        .unwrap();
        assert_eq!(config.probe_timeout, Duration::from_millis(250));
        assert_eq!(config.probe_attempts, 5);
    }

    #[test]
    fn rejects_invalid_values() {
        assert_matches!(
            ValidatorConfig::from_vars(vars(&[("VALIDATOR_PROBE_TIMEOUT_MS", "soon")])),
            Err(CoreError::Config(_))
        );
        assert_matches!(
            ValidatorConfig::from_vars(vars(&[("VALIDATOR_PROBE_ATTEMPTS", "0")])),
            Err(CoreError::Config(_))
        );
    }
}
