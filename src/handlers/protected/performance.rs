use axum::extract::State;

use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::services::performance_service::{FailureAnalysis, TechnicianPerformance};
use crate::services::PerformanceService;
use crate::state::AppState;

/// GET /api/performance/techniciens
pub async fn techniciens(State(state): State<AppState>, _user: AuthUser) -> ApiResult<Vec<TechnicianPerformance>> {
    let stats = PerformanceService::new(state.pool.clone()).technicians().await?;
    Ok(ApiResponse::success(stats))
}

/// GET /api/performance/analyse-pannes
pub async fn analyse_pannes(State(state): State<AppState>, _user: AuthUser) -> ApiResult<FailureAnalysis> {
    let analysis = PerformanceService::new(state.pool.clone()).failure_analysis().await?;
    Ok(ApiResponse::success(analysis))
}
