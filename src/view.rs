use crate::error::Result;
use crate::logging::log_no_data;
use serde::Serialize;

/// A derived view as handed to the presentation layer: either ready, or an
/// explicit "no data" state carrying a user-facing reason.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum View<T> {
    Ready(T),
    NoData { reason: String },
}

impl<T> View<T> {
    /// Folds a soft error into `NoData`, logging which view was affected.
    pub fn from_result(name: &str, result: Result<T>) -> Self {
        match result {
            Ok(value) => View::Ready(value),
            Err(err) => {
                let reason = err.to_string();
                log_no_data(name, &reason);
                View::NoData { reason }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, View::Ready(_))
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            View::Ready(value) => Some(value),
            View::NoData { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;

    #[test]
    fn test_error_becomes_no_data() {
        let view: View<f64> = View::from_result("kpi", Err(DashboardError::EmptySelection));
        assert!(!view.is_ready());
        assert_eq!(
            view,
            View::NoData {
                reason: "no data for this selection".to_string()
            }
        );
    }

    #[test]
    fn test_serialized_shape() {
        let ready: View<f64> = View::Ready(1.5);
        assert_eq!(
            serde_json::to_value(&ready).unwrap(),
            serde_json::json!({"status": "ready", "value": 1.5})
        );
        let empty: View<f64> = View::NoData { reason: "none".to_string() };
        assert_eq!(
            serde_json::to_value(&empty).unwrap(),
            serde_json::json!({"status": "no_data", "value": {"reason": "none"}})
        );
    }
}
