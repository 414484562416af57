use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::Utc;
use validator::Validate;

use crate::dto::{
    parse_date, required, AnalyticsLookupResponse, AnalyticsQuery, GenerateAnalyticsRequest,
    GenerateAnalyticsResponse, SaveAnalyticsRequest, SaveResponse,
};
use crate::error::{AppError, AppResult};
use crate::services::analytics;
use crate::AppState;

pub async fn save_analytics(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<SaveAnalyticsRequest>, AppError>,
) -> AppResult<Json<SaveResponse>> {
    let cmd = body.into_command()?;
    let store = state.store.get()?;

    let snapshot =
        analytics::save_analytics(store, cmd.user_id, cmd.date, cmd.payload, cmd.journal_count).await?;
    Ok(Json(SaveResponse::created(snapshot.id)))
}

/// `?date=` returns one snapshot; otherwise the list, optionally capped by `limit`.
pub async fn get_analytics(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<AnalyticsQuery>, AppError>,
) -> AppResult<Json<AnalyticsLookupResponse>> {
    query.validate()?;
    let user_id = required(query.user_id, "userId")?;
    let store = state.store.get()?;

    let response = match query.date {
        Some(date) => {
            let date = parse_date(&date, "date")?;
            AnalyticsLookupResponse::One {
                analytics: analytics::get_by_date(store, &user_id, date).await?,
            }
        }
        None => AnalyticsLookupResponse::All {
            analytics: analytics::list(store, &user_id, query.limit).await?,
        },
    };
    Ok(Json(response))
}

pub async fn get_latest_analytics(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<AnalyticsQuery>, AppError>,
) -> AppResult<Json<AnalyticsLookupResponse>> {
    query.validate()?;
    let user_id = required(query.user_id, "userId")?;
    let store = state.store.get()?;

    Ok(Json(AnalyticsLookupResponse::One {
        analytics: analytics::get_latest(store, &user_id).await?,
    }))
}

pub async fn generate_analytics(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<GenerateAnalyticsRequest>, AppError>,
) -> AppResult<Json<GenerateAnalyticsResponse>> {
    body.validate()?;
    let user_id = required(body.user_id, "userId")?;
    let store = state.store.get()?;
    let gateway = state.gateway.get()?;

    let snapshot = analytics::generate_analytics(
        store,
        &state.cache,
        gateway,
        &user_id,
        Utc::now().date_naive(),
        state.config.analysis_timeout(),
    )
    .await?;
    Ok(Json(snapshot.into()))
}
