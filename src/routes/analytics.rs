//! Analytics route handlers
//!
//! Aggregated submission activity for dashboard heatmaps.

use crate::error::ApiResult;
use crate::models::{HeatmapResponse, SuccessResponse};
use crate::state::SharedState;
use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::debug;

/// Default trailing window, in days
const DEFAULT_WINDOW_DAYS: i64 = 365;

/// Upper bound on the aggregation window
const MAX_WINDOW_DAYS: i64 = 730;

#[derive(Debug, Deserialize)]
pub struct HeatmapQuery {
    pub days: Option<i64>,
}

impl HeatmapQuery {
    fn window(&self) -> i64 {
        self.days
            .unwrap_or(DEFAULT_WINDOW_DAYS)
            .clamp(1, MAX_WINDOW_DAYS)
    }
}

/// Per-day submission counts and mean score ratio over the trailing window
pub async fn get_heatmap_data(
    State(state): State<SharedState>,
    Query(params): Query<HeatmapQuery>,
) -> ApiResult<Json<SuccessResponse<HeatmapResponse>>> {
    let days = params.window();
    debug!("Aggregating submission heatmap over {} days", days);

    let buckets = state.submissions.heatmap(days).await?;

    Ok(Json(SuccessResponse::with_data(
        "Heatmap data fetched successfully.",
        HeatmapResponse { days, buckets },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_defaults_to_a_year() {
        assert_eq!(HeatmapQuery { days: None }.window(), 365);
    }

    #[test]
    fn test_window_is_clamped() {
        assert_eq!(HeatmapQuery { days: Some(0) }.window(), 1);
        assert_eq!(HeatmapQuery { days: Some(-3) }.window(), 1);
        assert_eq!(HeatmapQuery { days: Some(10_000) }.window(), 730);
        assert_eq!(HeatmapQuery { days: Some(30) }.window(), 30);
    }
}
