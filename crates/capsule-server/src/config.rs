use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value '{value}' for {key}")]
pub struct ConfigError {
    pub key: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Minimum gap between now and an accepted delivery date.
    pub min_lead: Duration,
    /// Width of the window each dispatch run scans. Always positive.
    pub lookback: Duration,
    pub dispatch_interval_secs: u64,
    pub delivery_concurrency: usize,
    pub sendgrid_api_key: Option<String>,
    pub sender_address: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            host: non_empty("CAPSULE_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_or(&lookup, "CAPSULE_PORT", 3000)?,
            db_path: non_empty("CAPSULE_DB_PATH")
                .unwrap_or_else(|| "timecapsule.db".into())
                .into(),
            min_lead: parse_secs(&lookup, "CAPSULE_MIN_LEAD_SECS", 0, 0)?,
            lookback: parse_secs(&lookup, "CAPSULE_LOOKBACK_SECS", 600, 1)?,
            dispatch_interval_secs: parse_or(&lookup, "CAPSULE_DISPATCH_INTERVAL_SECS", 60)?,
            delivery_concurrency: parse_or(&lookup, "CAPSULE_DELIVERY_CONCURRENCY", 4)?,
            sendgrid_api_key: non_empty("SENDGRID_API_KEY"),
            sender_address: non_empty("CAPSULE_SENDER_ADDRESS"),
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) if raw.trim().is_empty() => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError { key, value: raw }),
    }
}

/// Whole seconds no smaller than `min`, within chrono's duration range.
fn parse_secs<F>(lookup: &F, key: &'static str, default: u64, min: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs: u64 = parse_or(lookup, key, default)?;
    i64::try_from(secs)
        .ok()
        .filter(|_| secs >= min)
        .and_then(Duration::try_seconds)
        .ok_or_else(|| ConfigError {
            key,
            value: secs.to_string(),
        })
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.db_path, PathBuf::from("timecapsule.db"));
        assert_eq!(config.min_lead, Duration::zero());
        assert_eq!(config.lookback, Duration::minutes(10));
        assert_eq!(config.dispatch_interval_secs, 60);
        assert_eq!(config.delivery_concurrency, 4);
        assert_eq!(config.sendgrid_api_key, None);
        assert_eq!(config.sender_address, None);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("CAPSULE_PORT", "8080"),
            ("CAPSULE_MIN_LEAD_SECS", "60"),
            ("CAPSULE_LOOKBACK_SECS", " 900 "),
            ("SENDGRID_API_KEY", "SG.key"),
            ("CAPSULE_SENDER_ADDRESS", ""),
        ]))
        .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.min_lead, Duration::minutes(1));
        assert_eq!(config.lookback, Duration::minutes(15));
        assert_eq!(config.sendgrid_api_key.as_deref(), Some("SG.key"));
        assert_eq!(config.sender_address, None);
    }

    #[test]
    fn malformed_number_names_the_variable() {
        let err = Config::from_lookup(lookup(&[("CAPSULE_PORT", "eighty")])).unwrap_err();

        assert_eq!(err.key, "CAPSULE_PORT");
        assert_eq!(err.to_string(), "invalid value 'eighty' for CAPSULE_PORT");
    }

    #[test]
    fn negative_durations_are_rejected() {
        let err = Config::from_lookup(lookup(&[("CAPSULE_MIN_LEAD_SECS", "-3600")])).unwrap_err();
        assert_eq!(err.key, "CAPSULE_MIN_LEAD_SECS");

        let err = Config::from_lookup(lookup(&[("CAPSULE_LOOKBACK_SECS", "-600")])).unwrap_err();
        assert_eq!(err.key, "CAPSULE_LOOKBACK_SECS");
    }

    #[test]
    fn zero_lookback_is_rejected() {
        let err = Config::from_lookup(lookup(&[("CAPSULE_LOOKBACK_SECS", "0")])).unwrap_err();

        assert_eq!(err.to_string(), "invalid value '0' for CAPSULE_LOOKBACK_SECS");
    }

    #[test]
    fn durations_beyond_chrono_range_are_rejected() {
        let err = Config::from_lookup(lookup(&[("CAPSULE_LOOKBACK_SECS", "18446744073709551615")]))
            .unwrap_err();
        assert_eq!(err.key, "CAPSULE_LOOKBACK_SECS");

        let err = Config::from_lookup(lookup(&[("CAPSULE_MIN_LEAD_SECS", "9300000000000")]))
            .unwrap_err();
        assert_eq!(err.key, "CAPSULE_MIN_LEAD_SECS");
    }
}
