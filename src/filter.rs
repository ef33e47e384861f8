use crate::logging::log_filter_applied;
use crate::model::{DateRange, EnergyRecord};
use std::collections::BTreeSet;

/// Records inside `range` whose plant is selected, in input order.
///
/// An empty plant set yields an empty result. The input is never modified.
pub fn filter_records(
    records: &[EnergyRecord],
    range: &DateRange,
    plants: &BTreeSet<String>,
) -> Vec<EnergyRecord> {
    let kept: Vec<EnergyRecord> = records
        .iter()
        .filter(|r| range.contains(r.date) && plants.contains(&r.plant))
        .cloned()
        .collect();
    log_filter_applied(
        &range.start().to_string(),
        &range.end().to_string(),
        plants.len(),
        kept.len(),
        records.len(),
    );
    kept
}

/// Distinct plants with at least one record in `range`, in order of first
/// appearance.
pub fn available_plants(records: &[EnergyRecord], range: &DateRange) -> Vec<String> {
    let mut plants: Vec<String> = Vec::new();
    for r in records.iter().filter(|r| range.contains(r.date)) {
        if !plants.contains(&r.plant) {
            plants.push(r.plant.clone());
        }
    }
    plants
}
