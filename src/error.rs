//! Domain errors for the dashboard pipeline.
//!
//! Every variant is soft: the pipeline folds them into a `View::NoData` value
//! (see `view.rs`) instead of propagating them to the caller.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("no data for this selection")]
    EmptySelection,

    #[error("baseline for {column} is zero, percent change is undefined")]
    ZeroBaseline { column: &'static str },

    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("alert threshold must be a finite number, got {0}")]
    InvalidThreshold(f64),

    #[error("failed to load branding asset {path}: {source}")]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("sustainability metric not found: {0}")]
    MissingMetric(String),

    #[error("dataset generation failed: {0}")]
    Generator(String),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_user_facing() {
        let start = NaiveDate::from_ymd_opt(2023, 3, 2).unwrap();
        let end = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let err = DashboardError::InvalidRange { start, end };
        assert_eq!(
            err.to_string(),
            "start date 2023-03-02 is after end date 2023-03-01"
        );
        assert_eq!(
            DashboardError::EmptySelection.to_string(),
            "no data for this selection"
        );
    }
}
