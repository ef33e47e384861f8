use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use std::path::PathBuf;

/// Process configuration, read once from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_start: NaiveDate,
    pub data_end: NaiveDate,
    pub plants: Vec<String>,
    pub consumption_mean: f64,
    pub consumption_std: f64,
    pub cost_mean: f64,
    pub cost_std: f64,
    pub co2_mean: f64,
    pub co2_std: f64,
    pub seed: Option<u64>,
    pub alert_threshold: f64,
    pub alert_threshold_min: f64,
    pub alert_threshold_max: f64,
    pub brand_assets: Vec<PathBuf>,
    pub brand_name: String,
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_start: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            data_end: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            plants: vec!["Steel 1".to_string(), "Steel 2".to_string(), "Foundry".to_string()],
            consumption_mean: 500.0,
            consumption_std: 50.0,
            cost_mean: 100_000.0,
            cost_std: 5_000.0,
            co2_mean: 200.0,
            co2_std: 10.0,
            seed: None,
            alert_threshold: 550.0,
            alert_threshold_min: 400.0,
            alert_threshold_max: 600.0,
            brand_assets: vec![PathBuf::from("images/images.png"), PathBuf::from("images.png")],
            brand_name: "Plant Energy".to_string(),
            port: 8765,
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

fn env_date(key: &str) -> Option<NaiveDate> {
    std::env::var(key)
        .ok()
        .and_then(|v| NaiveDate::parse_from_str(v.trim(), "%Y-%m-%d").ok())
}

fn env_list(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().map(|v| split_list(&v))
}

/// Splits a comma-separated list, dropping blanks.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

impl Config {
    pub fn from_env() -> Self {
        let d = Config::default();
        Self {
            data_start: env_date("DATA_START").unwrap_or(d.data_start),
            data_end: env_date("DATA_END").unwrap_or(d.data_end),
            plants: env_list("PLANTS").unwrap_or(d.plants),
            consumption_mean: env_parse("CONSUMPTION_MEAN").unwrap_or(d.consumption_mean),
            consumption_std: env_parse("CONSUMPTION_STD").unwrap_or(d.consumption_std),
            cost_mean: env_parse("COST_MEAN").unwrap_or(d.cost_mean),
            cost_std: env_parse("COST_STD").unwrap_or(d.cost_std),
            co2_mean: env_parse("CO2_MEAN").unwrap_or(d.co2_mean),
            co2_std: env_parse("CO2_STD").unwrap_or(d.co2_std),
            seed: env_parse("SEED"),
            alert_threshold: env_parse("ALERT_THRESHOLD").unwrap_or(d.alert_threshold),
            alert_threshold_min: env_parse("ALERT_THRESHOLD_MIN").unwrap_or(d.alert_threshold_min),
            alert_threshold_max: env_parse("ALERT_THRESHOLD_MAX").unwrap_or(d.alert_threshold_max),
            brand_assets: env_list("BRAND_ASSETS")
                .map(|v| v.into_iter().map(PathBuf::from).collect())
                .unwrap_or(d.brand_assets),
            brand_name: std::env::var("BRAND_NAME").unwrap_or(d.brand_name),
            port: env_parse("DASH_PORT").unwrap_or(d.port),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.data_start > self.data_end {
            return Err(anyhow!(
                "DATA_START {} is after DATA_END {}",
                self.data_start,
                self.data_end
            ));
        }
        if self.plants.is_empty() {
            return Err(anyhow!("PLANTS must name at least one plant"));
        }
        for (name, std) in [
            ("CONSUMPTION_STD", self.consumption_std),
            ("COST_STD", self.cost_std),
            ("CO2_STD", self.co2_std),
        ] {
            if !std.is_finite() || std < 0.0 {
                return Err(anyhow!("{} must be a finite non-negative number, got {}", name, std));
            }
        }
        if !self.alert_threshold.is_finite() {
            return Err(anyhow!("ALERT_THRESHOLD must be finite, got {}", self.alert_threshold));
        }
        if !(self.alert_threshold_min <= self.alert_threshold_max) {
            return Err(anyhow!(
                "alert threshold bounds inverted: min={} max={}",
                self.alert_threshold_min,
                self.alert_threshold_max
            ));
        }
        Ok(())
    }

    /// Clamps a requested alert threshold into the configured bounds.
    pub fn clamp_threshold(&self, threshold: f64) -> f64 {
        threshold.clamp(self.alert_threshold_min, self.alert_threshold_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let cfg = Config::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.plants.len(), 3);
        assert_eq!(cfg.alert_threshold, 550.0);
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let cfg = Config {
            data_start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            data_end: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_std() {
        let cfg = Config { cost_std: -1.0, ..Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_plants() {
        let cfg = Config { plants: Vec::new(), ..Config::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_clamp_threshold() {
        let cfg = Config::default();
        assert_eq!(cfg.clamp_threshold(1000.0), 600.0);
        assert_eq!(cfg.clamp_threshold(10.0), 400.0);
        assert_eq!(cfg.clamp_threshold(512.5), 512.5);
    }

    #[test]
    fn test_split_list_trims_and_drops_blanks() {
        assert_eq!(split_list(" Steel 1 , ,Foundry"), vec!["Steel 1", "Foundry"]);
    }
}
