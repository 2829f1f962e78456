use core::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use cinema_booking::RefundPolicy;
use cinema_observability::ObservabilityConfig;
use cinema_seating::{HistoryConfig, LayoutConfig, PreBooking};

/// Everything the demo needs, with defaults for a small hall.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DemoConfig {
    pub layout: LayoutConfig,
    pub history: HistoryConfig,
    pub refunds: RefundPolicy,
    pub observability: ObservabilityConfig,
}

impl DemoConfig {
    /// Read overrides from `CINEMA_*` environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`DemoConfig::from_env`] with an arbitrary variable source.
    ///
    /// Unset variables keep their defaults; unparseable values are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(rows) = parse_var(&lookup, "CINEMA_ROWS")? {
            config.layout.rows = rows;
        }
        if let Some(columns) = parse_var(&lookup, "CINEMA_COLUMNS")? {
            config.layout.columns = columns;
        }
        if let Some(base_price) = parse_var(&lookup, "CINEMA_BASE_PRICE")? {
            config.layout.base_price = base_price;
        }
        if let Some(premium_rows) = parse_var(&lookup, "CINEMA_PREMIUM_ROWS")? {
            config.layout.premium_back_rows = premium_rows;
        }
        if let Some(max_entries) = parse_var(&lookup, "CINEMA_HISTORY_LIMIT")? {
            config.history.max_entries = max_entries;
        }
        if let Some(seed) = parse_var::<u64>(&lookup, "CINEMA_PREBOOK_SEED")? {
            let fraction = parse_var(&lookup, "CINEMA_PREBOOK_FRACTION")?.unwrap_or(0.2);
            config.layout.pre_booking = PreBooking::Seeded { seed, fraction };
        }
        if let Some(json) = parse_var(&lookup, "CINEMA_LOG_JSON")? {
            config.observability.json = json;
        }

        config.layout.validate().context("invalid hall layout")?;
        config.history.validate().context("invalid history settings")?;
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> anyhow::Result<Option<T>>
where
    T: FromStr,
    T::Err: core::fmt::Display,
{
    let Some(raw) = lookup(name) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e| anyhow::anyhow!("{name}={raw:?}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| vars.get(name).cloned()
    }

    #[test]
    fn no_variables_means_defaults() {
        let config = DemoConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, DemoConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = DemoConfig::from_lookup(lookup_from(&[
            ("CINEMA_ROWS", "5"),
            ("CINEMA_COLUMNS", " 6 "),
            ("CINEMA_BASE_PRICE", "90000"),
            ("CINEMA_HISTORY_LIMIT", "3"),
            ("CINEMA_PREBOOK_SEED", "11"),
            ("CINEMA_LOG_JSON", "true"),
        ]))
        .unwrap();

        assert_eq!(config.layout.rows, 5);
        assert_eq!(config.layout.columns, 6);
        assert_eq!(config.layout.base_price, 90_000);
        assert_eq!(config.history.max_entries, 3);
        assert_eq!(
            config.layout.pre_booking,
            PreBooking::Seeded {
                seed: 11,
                fraction: 0.2
            }
        );
        assert!(config.observability.json);
    }

    #[test]
    fn garbage_values_are_errors() {
        let err = DemoConfig::from_lookup(lookup_from(&[("CINEMA_ROWS", "many")])).unwrap_err();
        assert!(err.to_string().contains("CINEMA_ROWS"));
    }

    #[test]
    fn out_of_range_layout_is_an_error() {
        let err = DemoConfig::from_lookup(lookup_from(&[("CINEMA_ROWS", "30")])).unwrap_err();
        assert!(err.to_string().contains("invalid hall layout"));
    }
}
