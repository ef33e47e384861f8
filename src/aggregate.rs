//! Derived views over a filtered record series.
//!
//! The stored columns are running totals over the mixed-plant series, so any
//! per-day figure must be recovered by differencing *within* a single plant's
//! records. Differencing the unpartitioned series mixes plants and yields
//! meaningless deltas.

use crate::error::{DashboardError, Result};
use crate::model::{Column, EnergyRecord, SustainabilityMetric, ENERGY_EFFICIENCY};
use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;
use std::collections::BTreeMap;

// =============================================================================
// Period delta (KPI cards)
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodDelta {
    pub column: Column,
    pub first: f64,
    pub last: f64,
    pub delta: f64,
    /// `None` when the baseline is zero ("n/a").
    pub percent: Option<f64>,
}

/// Change of `column` between the first and last record of the series.
pub fn period_delta(records: &[EnergyRecord], column: Column) -> Result<PeriodDelta> {
    let (first, last) = match (records.first(), records.last()) {
        (Some(f), Some(l)) => (column.value(f), column.value(l)),
        _ => return Err(DashboardError::EmptySelection),
    };
    let delta = last - first;
    Ok(PeriodDelta {
        column,
        first,
        last,
        delta,
        percent: percent_change(first, delta, column).ok(),
    })
}

pub fn percent_change(baseline: f64, delta: f64, column: Column) -> Result<f64> {
    if baseline == 0.0 {
        return Err(DashboardError::ZeroBaseline {
            column: column.as_str(),
        });
    }
    Ok(delta / baseline * 100.0)
}

// =============================================================================
// Per-plant partitions
// =============================================================================

/// Groups records by plant (plants in order of first appearance), each group
/// sorted by date.
pub fn partition_by_plant(records: &[EnergyRecord]) -> Vec<(String, Vec<&EnergyRecord>)> {
    let mut groups: Vec<(String, Vec<&EnergyRecord>)> = Vec::new();
    for r in records {
        match groups.iter_mut().find(|(plant, _)| *plant == r.plant) {
            Some((_, group)) => group.push(r),
            None => groups.push((r.plant.clone(), vec![r])),
        }
    }
    for (_, group) in groups.iter_mut() {
        group.sort_by_key(|r| r.date);
    }
    groups
}

// =============================================================================
// Daily differenced trend
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub consumption_mwh: f64,
    pub cost_mxn: f64,
    pub co2_tons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantTrend {
    pub plant: String,
    pub points: Vec<TrendPoint>,
}

/// First differences of every cumulative column, per plant. The first point
/// of each plant is zero.
pub fn daily_trends(records: &[EnergyRecord]) -> Result<Vec<PlantTrend>> {
    if records.is_empty() {
        return Err(DashboardError::EmptySelection);
    }
    Ok(partition_by_plant(records)
        .into_iter()
        .map(|(plant, group)| {
            let mut prev: Option<&EnergyRecord> = None;
            let points = group
                .into_iter()
                .map(|r| {
                    let diff = |c: Column| prev.map(|p| c.value(r) - c.value(p)).unwrap_or(0.0);
                    let point = TrendPoint {
                        date: r.date,
                        consumption_mwh: diff(Column::Consumption),
                        cost_mxn: diff(Column::Cost),
                        co2_tons: diff(Column::Co2),
                    };
                    prev = Some(r);
                    point
                })
                .collect();
            PlantTrend { plant, points }
        })
        .collect())
}

// =============================================================================
// Cumulative series
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlantSeries {
    pub plant: String,
    pub column: Column,
    pub points: Vec<SeriesPoint>,
}

/// Stored running totals of `column`, split per plant.
pub fn cumulative_series(records: &[EnergyRecord], column: Column) -> Result<Vec<PlantSeries>> {
    if records.is_empty() {
        return Err(DashboardError::EmptySelection);
    }
    Ok(partition_by_plant(records)
        .into_iter()
        .map(|(plant, group)| PlantSeries {
            plant,
            column,
            points: group
                .into_iter()
                .map(|r| SeriesPoint {
                    date: r.date,
                    value: column.value(r),
                })
                .collect(),
        })
        .collect())
}

// =============================================================================
// Day-of-week x ISO week grid
// =============================================================================

pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct WeekColumn {
    pub iso_year: i32,
    pub week: u32,
}

impl WeekColumn {
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            iso_year: iso.year(),
            week: iso.week(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub weekday: &'static str,
    /// One cell per entry of `HeatmapGrid::weeks`; `None` where no sample fell.
    pub cells: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapGrid {
    pub weeks: Vec<WeekColumn>,
    /// Always seven rows, Monday first.
    pub rows: Vec<HeatmapRow>,
}

impl HeatmapGrid {
    pub fn cell(&self, day: Weekday, week: WeekColumn) -> Option<f64> {
        let col = self.weeks.iter().position(|w| *w == week)?;
        self.rows[day.num_days_from_monday() as usize].cells[col]
    }

    pub fn populated_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|row| row.cells.iter().filter(|c| c.is_some()).count())
            .sum()
    }
}

/// Mean of `samples` grouped by (weekday, ISO week). No samples gives seven
/// rows with no week columns.
pub fn weekday_week_grid(samples: &[(NaiveDate, f64)]) -> HeatmapGrid {
    let mut groups: BTreeMap<(WeekColumn, u32), (f64, u32)> = BTreeMap::new();
    for (date, value) in samples {
        let key = (WeekColumn::of(*date), date.weekday().num_days_from_monday());
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += value;
        entry.1 += 1;
    }

    let mut weeks: Vec<WeekColumn> = groups.keys().map(|(week, _)| *week).collect();
    weeks.dedup();

    let rows = WEEKDAYS
        .iter()
        .map(|day| {
            let idx = day.num_days_from_monday();
            HeatmapRow {
                weekday: weekday_name(*day),
                cells: weeks
                    .iter()
                    .map(|week| groups.get(&(*week, idx)).map(|(sum, n)| sum / *n as f64))
                    .collect(),
            }
        })
        .collect();

    HeatmapGrid { weeks, rows }
}

/// Average daily consumption per (weekday, ISO week), using per-plant
/// differenced consumption. A plant's first record has no previous value, so
/// its day is not a known daily amount and is left out of the grid.
pub fn consumption_heatmap(records: &[EnergyRecord]) -> Result<HeatmapGrid> {
    let samples: Vec<(NaiveDate, f64)> = daily_trends(records)?
        .iter()
        .flat_map(|t| t.points.iter().skip(1).map(|p| (p.date, p.consumption_mwh)))
        .collect();
    Ok(weekday_week_grid(&samples))
}

// =============================================================================
// Sustainability
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SustainabilityProgress {
    pub name: String,
    pub current_percent: f64,
    pub target_2025_percent: f64,
    pub remaining_percent: f64,
}

pub fn sustainability_progress(metrics: &[SustainabilityMetric]) -> Vec<SustainabilityProgress> {
    metrics
        .iter()
        .map(|m| SustainabilityProgress {
            name: m.name.clone(),
            current_percent: m.current_percent,
            target_2025_percent: m.target_2025_percent,
            remaining_percent: m.target_2025_percent - m.current_percent,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EfficiencyCard {
    pub current_percent: f64,
    pub target_2025_percent: f64,
}

pub fn efficiency_card(metrics: &[SustainabilityMetric]) -> Result<EfficiencyCard> {
    metrics
        .iter()
        .find(|m| m.name == ENERGY_EFFICIENCY)
        .map(|m| EfficiencyCard {
            current_percent: m.current_percent,
            target_2025_percent: m.target_2025_percent,
        })
        .ok_or_else(|| DashboardError::MissingMetric(ENERGY_EFFICIENCY.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sustainability_metrics;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, m, day).unwrap()
    }

    fn rec(date: NaiveDate, plant: &str, mwh: f64) -> EnergyRecord {
        EnergyRecord {
            date,
            consumption_mwh: mwh,
            cost_mxn: mwh * 100.0,
            co2_tons: mwh / 2.0,
            plant: plant.to_string(),
        }
    }

    #[test]
    fn test_period_delta() {
        let records = vec![rec(d(1, 1), "A", 500.0), rec(d(1, 2), "B", 1000.0), rec(d(1, 3), "A", 1500.0)];
        let kpi = period_delta(&records, Column::Consumption).unwrap();
        assert_eq!(kpi.delta, 1000.0);
        assert_eq!(kpi.percent, Some(200.0));
        let cost = period_delta(&records, Column::Cost).unwrap();
        assert_eq!(cost.delta, 100_000.0);
    }

    #[test]
    fn test_period_delta_empty_is_no_data() {
        assert!(matches!(
            period_delta(&[], Column::Co2),
            Err(DashboardError::EmptySelection)
        ));
    }

    #[test]
    fn test_zero_baseline_keeps_absolute_delta() {
        let records = vec![rec(d(1, 1), "A", 0.0), rec(d(1, 2), "A", 40.0)];
        let kpi = period_delta(&records, Column::Consumption).unwrap();
        assert_eq!(kpi.delta, 40.0);
        assert_eq!(kpi.percent, None);
        assert!(matches!(
            percent_change(0.0, 40.0, Column::Consumption),
            Err(DashboardError::ZeroBaseline { column: "consumption_mwh" })
        ));
    }

    #[test]
    fn test_trend_differences_within_plant_only() {
        // Interleaved plants: naive differencing would give 100, 100, 100.
        let records = vec![
            rec(d(1, 1), "A", 100.0),
            rec(d(1, 2), "B", 200.0),
            rec(d(1, 3), "A", 300.0),
            rec(d(1, 4), "B", 400.0),
        ];
        let trends = daily_trends(&records).unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].plant, "A");
        let a: Vec<f64> = trends[0].points.iter().map(|p| p.consumption_mwh).collect();
        assert_eq!(a, vec![0.0, 200.0]);
        let b: Vec<f64> = trends[1].points.iter().map(|p| p.consumption_mwh).collect();
        assert_eq!(b, vec![0.0, 200.0]);
        assert_eq!(trends[1].points[1].cost_mxn, 20_000.0);
    }

    #[test]
    fn test_partition_sorts_by_date() {
        let records = vec![rec(d(1, 3), "A", 300.0), rec(d(1, 1), "A", 100.0)];
        let parts = partition_by_plant(&records);
        assert_eq!(parts[0].1[0].date, d(1, 1));
        let trends = daily_trends(&records).unwrap();
        assert_eq!(trends[0].points[1].consumption_mwh, 200.0);
    }

    #[test]
    fn test_cumulative_series_per_plant() {
        let records = vec![rec(d(1, 1), "A", 1.0), rec(d(1, 2), "B", 2.0), rec(d(1, 3), "A", 3.0)];
        let series = cumulative_series(&records, Column::Co2).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].points.len(), 2);
        assert_eq!(series[0].points[1].value, 1.5);
        assert!(cumulative_series(&[], Column::Co2).is_err());
    }

    #[test]
    fn test_grid_means_and_missing_cells() {
        // 2023-01-02 is a Monday in ISO week 1; 2023-01-09 is Monday of week 2.
        let samples = vec![
            (d(1, 2), 10.0),
            (d(1, 2), 30.0),
            (d(1, 3), 5.0),
            (d(1, 9), 7.0),
        ];
        let grid = weekday_week_grid(&samples);
        let w1 = WeekColumn { iso_year: 2023, week: 1 };
        let w2 = WeekColumn { iso_year: 2023, week: 2 };
        assert_eq!(grid.weeks, vec![w1, w2]);
        assert_eq!(grid.rows.len(), 7);
        assert_eq!(grid.rows[0].weekday, "Monday");
        assert_eq!(grid.rows[6].weekday, "Sunday");
        assert_eq!(grid.cell(Weekday::Mon, w1), Some(20.0));
        assert_eq!(grid.cell(Weekday::Tue, w1), Some(5.0));
        assert_eq!(grid.cell(Weekday::Tue, w2), None);
        assert_eq!(grid.cell(Weekday::Mon, w2), Some(7.0));
        assert_eq!(grid.populated_cells(), 3);
    }

    #[test]
    fn test_grid_separates_iso_years() {
        // 2023-01-01 is Sunday of ISO week 52 of 2022.
        let samples = vec![(d(1, 1), 1.0), (d(12, 31), 2.0)];
        let grid = weekday_week_grid(&samples);
        assert_eq!(
            grid.weeks,
            vec![
                WeekColumn { iso_year: 2022, week: 52 },
                WeekColumn { iso_year: 2023, week: 52 },
            ]
        );
    }

    #[test]
    fn test_heatmap_leaves_first_day_of_each_plant_empty() {
        // Each plant has a single record, so no day has a known daily amount.
        let records = vec![
            rec(d(1, 2), "A", 1480.0),
            rec(d(1, 3), "B", 960.0),
            rec(d(1, 4), "C", 720.0),
        ];
        let grid = consumption_heatmap(&records).unwrap();
        assert!(grid.weeks.is_empty());
        assert_eq!(grid.rows.len(), 7);
        assert_eq!(grid.populated_cells(), 0);
        let w1 = WeekColumn { iso_year: 2023, week: 1 };
        assert_eq!(grid.cell(Weekday::Mon, w1), None);
        assert_eq!(grid.cell(Weekday::Wed, w1), None);
    }

    #[test]
    fn test_heatmap_first_day_does_not_dilute_later_days() {
        // Monday 2023-01-02 through Sunday 2023-01-08, one plant.
        let mut total = 1480.0;
        let mut records = vec![rec(d(1, 2), "A", total)];
        for (day, inc) in (3..=8).zip([510.0, 490.0, 505.0, 495.0, 520.0, 480.0]) {
            total += inc;
            records.push(rec(d(1, day), "A", total));
        }
        let grid = consumption_heatmap(&records).unwrap();
        let w1 = WeekColumn { iso_year: 2023, week: 1 };
        assert_eq!(grid.weeks, vec![w1]);
        assert_eq!(grid.cell(Weekday::Mon, w1), None);
        assert_eq!(grid.cell(Weekday::Tue, w1), Some(510.0));
        assert_eq!(grid.cell(Weekday::Sun, w1), Some(480.0));
        assert_eq!(grid.populated_cells(), 6);
    }

    #[test]
    fn test_sustainability_and_efficiency() {
        let metrics = sustainability_metrics();
        let progress = sustainability_progress(&metrics);
        assert_eq!(progress.len(), 4);
        assert_eq!(progress[0].remaining_percent, 15.0);
        let card = efficiency_card(&metrics).unwrap();
        assert_eq!(card.current_percent, 62.0);
        assert!(matches!(
            efficiency_card(&metrics[..2]),
            Err(DashboardError::MissingMetric(_))
        ));
    }
}
