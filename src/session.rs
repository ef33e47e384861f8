//! Per-session filter selection.
//!
//! A `FilterSelection` is owned by whoever drives the dashboard (a CLI run, an
//! HTTP request) and passed into `Dashboard::compute`. Nothing here is global.

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::filter::available_plants;
use crate::logging::log_selection_change;
use crate::model::{DateRange, EnergyRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterSelection {
    range: DateRange,
    selected_plants: BTreeSet<String>,
    alert_threshold_mwh: f64,
    /// Plants present in `range`, in order of first appearance.
    available: Vec<String>,
}

impl FilterSelection {
    /// Starts with every plant available in `range` selected.
    pub fn new(records: &[EnergyRecord], range: DateRange, threshold: f64) -> Self {
        let available = available_plants(records, &range);
        Self {
            range,
            selected_plants: available.iter().cloned().collect(),
            alert_threshold_mwh: threshold,
            available,
        }
    }

    pub fn range(&self) -> &DateRange {
        &self.range
    }

    pub fn selected_plants(&self) -> &BTreeSet<String> {
        &self.selected_plants
    }

    pub fn available_plants(&self) -> &[String] {
        &self.available
    }

    pub fn alert_threshold_mwh(&self) -> f64 {
        self.alert_threshold_mwh
    }

    /// Validates and applies a new date range. Plants with no records in the
    /// new range are dropped from the selection; newly available plants are
    /// not added.
    pub fn set_dates(&mut self, records: &[EnergyRecord], start: NaiveDate, end: NaiveDate) -> Result<()> {
        let range = DateRange::new(start, end)?;
        self.set_range(records, range);
        Ok(())
    }

    pub fn set_range(&mut self, records: &[EnergyRecord], range: DateRange) {
        self.range = range;
        self.available = available_plants(records, &range);
        let available = &self.available;
        self.selected_plants.retain(|p| available.contains(p));
        self.log_change("range");
    }

    /// Checks or unchecks one plant. Returns false if the plant has no records
    /// in the current range.
    pub fn set_plant(&mut self, plant: &str, checked: bool) -> bool {
        if !self.available.iter().any(|p| p == plant) {
            return false;
        }
        if checked {
            self.selected_plants.insert(plant.to_string());
        } else {
            self.selected_plants.remove(plant);
        }
        self.log_change("plant");
        true
    }

    /// Replaces the selection with the given plants, ignoring any that are not
    /// available in the current range.
    pub fn select_only<S: AsRef<str>>(&mut self, plants: &[S]) {
        self.selected_plants = plants
            .iter()
            .map(|p| p.as_ref())
            .filter(|p| self.available.iter().any(|a| a == p))
            .map(|p| p.to_string())
            .collect();
        self.log_change("select_only");
    }

    pub fn select_all(&mut self) {
        self.selected_plants = self.available.iter().cloned().collect();
        self.log_change("select_all");
    }

    /// Sets the alert threshold, clamped into the configured bounds. Returns
    /// the value actually applied.
    pub fn set_threshold(&mut self, cfg: &Config, threshold: f64) -> Result<f64> {
        if !threshold.is_finite() {
            return Err(DashboardError::InvalidThreshold(threshold));
        }
        self.alert_threshold_mwh = cfg.clamp_threshold(threshold);
        self.log_change("threshold");
        Ok(self.alert_threshold_mwh)
    }

    fn log_change(&self, change: &str) {
        let plants: Vec<String> = self.selected_plants.iter().cloned().collect();
        log_selection_change(change, &plants, self.alert_threshold_mwh);
    }
}
