//! Core record types shared by the generator, filter, aggregator and alerts.

use crate::error::{DashboardError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of plant telemetry. The numeric columns are running totals over the
/// whole series, not per-day values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnergyRecord {
    pub date: NaiveDate,
    pub consumption_mwh: f64,
    pub cost_mxn: f64,
    pub co2_tons: f64,
    pub plant: String,
}

/// Numeric columns of an `EnergyRecord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Consumption,
    Cost,
    Co2,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Consumption, Column::Cost, Column::Co2];

    pub fn value(&self, record: &EnergyRecord) -> f64 {
        match self {
            Column::Consumption => record.consumption_mwh,
            Column::Cost => record.cost_mxn,
            Column::Co2 => record.co2_tons,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Consumption => "consumption_mwh",
            Column::Cost => "cost_mxn",
            Column::Co2 => "co2_tons",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Column::Consumption => "Energy consumption",
            Column::Cost => "Energy cost",
            Column::Co2 => "CO2 emissions",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Column::Consumption => "MWh",
            Column::Cost => "MXN",
            Column::Co2 => "ton",
        }
    }
}

/// Inclusive calendar range at daily granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "DateBounds")]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

/// Unchecked wire form; deserialization goes through `DateRange::new`.
#[derive(Deserialize)]
struct DateBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<DateBounds> for DateRange {
    type Error = DashboardError;

    fn try_from(bounds: DateBounds) -> Result<Self> {
        DateRange::new(bounds.start, bounds.end)
    }
}

impl DateRange {
    /// Rejects `start > end`; a single-day range is valid.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DashboardError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn num_days(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        std::iter::successors(Some(self.start), move |d| {
            d.succ_opt().filter(|next| *next <= end)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SustainabilityMetric {
    pub name: String,
    pub current_percent: f64,
    pub target_2025_percent: f64,
}

pub const ENERGY_EFFICIENCY: &str = "Energy efficiency";

/// The fixed sustainability table. Values do not change during the process.
pub fn sustainability_metrics() -> Vec<SustainabilityMetric> {
    [
        ("Renewable energy", 15.0, 30.0),
        ("Recycled water", 45.0, 60.0),
        ("Recycled material", 78.0, 85.0),
        (ENERGY_EFFICIENCY, 62.0, 75.0),
    ]
    .into_iter()
    .map(|(name, current, target)| SustainabilityMetric {
        name: name.to_string(),
        current_percent: current,
        target_2025_percent: target,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_range_rejects_inverted_bounds() {
        let err = DateRange::new(d(2023, 5, 2), d(2023, 5, 1)).unwrap_err();
        assert!(matches!(err, DashboardError::InvalidRange { .. }));
    }

    #[test]
    fn test_range_days_inclusive() {
        let range = DateRange::new(d(2023, 12, 30), d(2024, 1, 2)).unwrap();
        let days: Vec<_> = range.days().collect();
        assert_eq!(days.len(), 4);
        assert_eq!(range.num_days(), 4);
        assert_eq!(days[0], d(2023, 12, 30));
        assert_eq!(days[3], d(2024, 1, 2));
        assert!(range.contains(d(2024, 1, 1)));
        assert!(!range.contains(d(2024, 1, 3)));
    }

    #[test]
    fn test_deserialize_validates_bounds() {
        let ok: DateRange =
            serde_json::from_str(r#"{"start":"2023-01-01","end":"2023-01-31"}"#).unwrap();
        assert_eq!(ok.num_days(), 31);
        let err = serde_json::from_str::<DateRange>(r#"{"start":"2023-02-01","end":"2023-01-31"}"#)
            .unwrap_err();
        assert!(err.to_string().contains("is after end date"));
    }

    #[test]
    fn test_single_day_range() {
        let range = DateRange::new(d(2023, 1, 1), d(2023, 1, 1)).unwrap();
        assert_eq!(range.days().count(), 1);
    }

    #[test]
    fn test_sustainability_table_is_fixed() {
        let metrics = sustainability_metrics();
        assert_eq!(metrics.len(), 4);
        let eff = metrics.iter().find(|m| m.name == ENERGY_EFFICIENCY).unwrap();
        assert_eq!(eff.current_percent, 62.0);
        assert_eq!(eff.target_2025_percent, 75.0);
    }
}
