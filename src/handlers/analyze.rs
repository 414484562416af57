use axum::{extract::State, Json};
use axum_extra::extract::WithRejection;

use crate::analysis::analyze_with_timeout;
use crate::dto::{AnalyzeRequest, AnalyzeResponse};
use crate::error::{AppError, AppResult};
use crate::AppState;

/// Stateless analysis of caller-supplied entries. Nothing is persisted.
pub async fn analyze(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<AnalyzeRequest>, AppError>,
) -> AppResult<Json<AnalyzeResponse>> {
    let user_id = body.user_id.clone();
    let excerpts = body.into_excerpts()?;
    let gateway = state.gateway.get()?;

    tracing::info!(user_id = ?user_id, entries = excerpts.len(), "Analyzing supplied journals");
    let analytics = analyze_with_timeout(gateway, &excerpts, state.config.analysis_timeout()).await?;

    Ok(Json(AnalyzeResponse {
        success: true,
        analytics,
    }))
}
