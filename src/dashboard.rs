//! The full filter -> aggregate -> alert pass.
//!
//! `Dashboard` holds the immutable dataset generated at startup. Every call to
//! `compute` recomputes all views from scratch for the given selection.

use crate::aggregate::{
    consumption_heatmap, cumulative_series, daily_trends, efficiency_card, period_delta,
    sustainability_progress, EfficiencyCard, HeatmapGrid, PeriodDelta, PlantSeries, PlantTrend,
    SustainabilityProgress,
};
use crate::alerts::{evaluate_alerts, AlertRecord};
use crate::branding::{load_branding, Branding};
use crate::config::Config;
use crate::error::Result;
use crate::filter::filter_records;
use crate::generator::{Dataset, EnergySource, SyntheticSource};
use crate::logging::{log_view_summary, ts_now, v_num, ProfileScope};
use crate::model::{Column, DateRange, EnergyRecord};
use crate::opportunities::{opportunities, Opportunity};
use crate::session::FilterSelection;
use crate::view::View;
use chrono::NaiveDate;
use serde::Serialize;
use serde_json::json;

#[derive(Debug, Clone, Serialize)]
pub struct KpiCard {
    pub column: Column,
    pub label: &'static str,
    pub unit: &'static str,
    pub delta: View<PeriodDelta>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewMeta {
    pub generated_at: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub selected_plants: Vec<String>,
    pub available_plants: Vec<String>,
    pub alert_threshold_mwh: f64,
    pub record_count: usize,
    pub dataset_fingerprint: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub meta: ViewMeta,
    pub branding: Branding,
    pub records: Vec<EnergyRecord>,
    pub kpis: Vec<KpiCard>,
    pub efficiency: View<EfficiencyCard>,
    pub trends: View<Vec<PlantTrend>>,
    pub cumulative_co2: View<Vec<PlantSeries>>,
    pub heatmap: View<HeatmapGrid>,
    pub sustainability: Vec<SustainabilityProgress>,
    pub alerts: View<Vec<AlertRecord>>,
    pub opportunities: Vec<Opportunity>,
}

impl DashboardView {
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub struct Dashboard {
    cfg: Config,
    dataset: Dataset,
    branding: Branding,
}

impl Dashboard {
    /// Validates `cfg` and generates the synthetic dataset it describes.
    pub fn new(cfg: Config) -> anyhow::Result<Self> {
        let source = SyntheticSource::from_config(&cfg);
        Self::with_source(cfg, &source)
    }

    /// Builds the dashboard over any record source.
    pub fn with_source(cfg: Config, source: &dyn EnergySource) -> anyhow::Result<Self> {
        cfg.validate()?;
        let range = DateRange::new(cfg.data_start, cfg.data_end)?;
        let dataset = Dataset::load(source, range, &cfg.plants, cfg.seed.is_some())?;
        let branding = load_branding(&cfg.brand_assets, &cfg.brand_name);
        Ok(Self {
            cfg,
            dataset,
            branding,
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn records(&self) -> &[EnergyRecord] {
        &self.dataset.records
    }

    /// Full dataset range, every available plant, configured threshold.
    pub fn default_selection(&self) -> FilterSelection {
        FilterSelection::new(
            &self.dataset.records,
            self.dataset.range,
            self.cfg.clamp_threshold(self.cfg.alert_threshold),
        )
    }

    /// Builds a selection from optional overrides on top of the defaults.
    pub fn selection(
        &self,
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        plants: Option<&[String]>,
        threshold: Option<f64>,
    ) -> Result<FilterSelection> {
        let mut sel = self.default_selection();
        if start.is_some() || end.is_some() {
            sel.set_dates(
                &self.dataset.records,
                start.unwrap_or(self.dataset.range.start()),
                end.unwrap_or(self.dataset.range.end()),
            )?;
        }
        if let Some(plants) = plants {
            sel.select_only(plants);
        }
        if let Some(threshold) = threshold {
            sel.set_threshold(&self.cfg, threshold)?;
        }
        Ok(sel)
    }

    pub fn compute(&self, selection: &FilterSelection) -> DashboardView {
        let _scope = ProfileScope::with_context(
            "dashboard_compute",
            &[("threshold", v_num(selection.alert_threshold_mwh()))],
        );
        let filtered = filter_records(
            &self.dataset.records,
            selection.range(),
            selection.selected_plants(),
        );

        let kpis = Column::ALL
            .iter()
            .map(|column| KpiCard {
                column: *column,
                label: column.label(),
                unit: column.unit(),
                delta: View::from_result(column.as_str(), period_delta(&filtered, *column)),
            })
            .collect();
        let trends = View::from_result("trends", daily_trends(&filtered));
        let cumulative_co2 = View::from_result("cumulative_co2", cumulative_series(&filtered, Column::Co2));
        let heatmap = View::from_result("heatmap", consumption_heatmap(&filtered));
        let alerts = View::from_result(
            "alerts",
            evaluate_alerts(&filtered, selection.alert_threshold_mwh()),
        );
        let efficiency = View::from_result("efficiency", efficiency_card(&self.dataset.sustainability));

        log_view_summary(
            filtered.len(),
            alerts.ready().map(Vec::len).unwrap_or(0),
            filtered.is_empty(),
        );

        DashboardView {
            meta: ViewMeta {
                generated_at: ts_now(),
                start: selection.range().start(),
                end: selection.range().end(),
                selected_plants: selection.selected_plants().iter().cloned().collect(),
                available_plants: selection.available_plants().to_vec(),
                alert_threshold_mwh: selection.alert_threshold_mwh(),
                record_count: filtered.len(),
                dataset_fingerprint: self.dataset.fingerprint.clone(),
            },
            branding: self.branding.clone(),
            records: filtered,
            kpis,
            efficiency,
            trends,
            cumulative_co2,
            heatmap,
            sustainability: sustainability_progress(&self.dataset.sustainability),
            alerts,
            opportunities: opportunities(),
        }
    }

    /// Plants with records in the given range, for populating plant pickers.
    pub fn plants_in(&self, start: NaiveDate, end: NaiveDate) -> Result<serde_json::Value> {
        let range = DateRange::new(start, end)?;
        let plants = crate::filter::available_plants(&self.dataset.records, &range);
        Ok(json!({
            "start": range.start(),
            "end": range.end(),
            "plants": plants,
        }))
    }
}
