use crate::error::{DashboardError, Result};
use crate::logging::log_alert;
use crate::model::EnergyRecord;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlertRecord {
    pub plant: String,
    pub max_consumption_mwh: f64,
    pub threshold: f64,
}

/// Highest consumption value seen per plant, keyed by plant name.
pub fn max_consumption_by_plant(records: &[EnergyRecord]) -> BTreeMap<String, f64> {
    let mut maxima: BTreeMap<String, f64> = BTreeMap::new();
    for r in records {
        maxima
            .entry(r.plant.clone())
            .and_modify(|m| *m = m.max(r.consumption_mwh))
            .or_insert(r.consumption_mwh);
    }
    maxima
}

/// One alert per plant whose maximum strictly exceeds `threshold`, sorted by
/// plant. An empty series is `EmptySelection`, not "no alerts".
pub fn evaluate_alerts(records: &[EnergyRecord], threshold: f64) -> Result<Vec<AlertRecord>> {
    if !threshold.is_finite() {
        return Err(DashboardError::InvalidThreshold(threshold));
    }
    if records.is_empty() {
        return Err(DashboardError::EmptySelection);
    }
    let alerts: Vec<AlertRecord> = max_consumption_by_plant(records)
        .into_iter()
        .filter(|(_, max)| *max > threshold)
        .map(|(plant, max)| AlertRecord {
            plant,
            max_consumption_mwh: max,
            threshold,
        })
        .collect();
    for a in &alerts {
        log_alert(&a.plant, a.max_consumption_mwh, a.threshold);
    }
    Ok(alerts)
}
