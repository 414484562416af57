use axum::{
    extract::{Query, State},
    Json,
};
use axum_extra::extract::WithRejection;
use validator::Validate;

use crate::dto::{parse_date, required, JournalLookupResponse, JournalQuery, SaveJournalRequest, SaveResponse};
use crate::error::{AppError, AppResult};
use crate::services::journals;
use crate::AppState;

pub async fn save_journal(
    State(state): State<AppState>,
    WithRejection(Json(body), _): WithRejection<Json<SaveJournalRequest>, AppError>,
) -> AppResult<Json<SaveResponse>> {
    let cmd = body.into_command()?;
    let store = state.store.get()?;

    let entry = journals::save_journal(store, &state.cache, &cmd.user_id, cmd.date, &cmd.text).await?;
    Ok(Json(SaveResponse::created(entry.id)))
}

/// `?date=` looks up one entry; without it the full list is returned.
pub async fn get_journals(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<JournalQuery>, AppError>,
) -> AppResult<Json<JournalLookupResponse>> {
    query.validate()?;
    let user_id = required(query.user_id, "userId")?;
    let store = state.store.get()?;

    let response = match query.date {
        Some(date) => {
            let date = parse_date(&date, "date")?;
            JournalLookupResponse::One {
                journal: journals::get_journal(store, &user_id, date).await?,
            }
        }
        None => JournalLookupResponse::All {
            journals: journals::list_journals(store, &state.cache, &user_id, query.refresh.into()).await?,
        },
    };
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::super::tests::{get, post_json};
    use crate::testkit::{test_state, MemoryStore};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_save_then_lookup_by_date() {
        let state = test_state(Arc::new(MemoryStore::new()), None);

        let (status, body) = post_json(
            &state,
            "/api/journals",
            json!({"userId": "u1", "date": "2025-01-01", "text": "A"}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let id = body["id"].clone();

        let (status, body) = get(&state, "/api/journals?userId=u1&date=2025-01-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["journal"]["id"], id);
        assert_eq!(body["journal"]["text"], "A");
    }

    #[tokio::test]
    async fn test_resave_updates_in_place() {
        let state = test_state(Arc::new(MemoryStore::new()), None);
        for text in ["A", "B"] {
            post_json(
                &state,
                "/api/journals",
                json!({"userId": "u1", "date": "2025-01-01", "text": text}),
            )
            .await;
        }

        let (_, body) = get(&state, "/api/journals?userId=u1").await;
        let journals = body["journals"].as_array().unwrap();
        assert_eq!(journals.len(), 1);
        assert_eq!(journals[0]["text"], "B");
        assert!(journals[0]["updatedAt"].is_string());
    }

    #[tokio::test]
    async fn test_list_is_newest_first_with_refresh() {
        let state = test_state(Arc::new(MemoryStore::without_sort_index()), None);
        for date in ["2025-01-01", "2025-01-03", "2025-01-02"] {
            post_json(
                &state,
                "/api/journals",
                json!({"userId": "u1", "date": date, "text": date}),
            )
            .await;
        }

        let (status, body) = get(&state, "/api/journals?userId=u1&refresh=true").await;
        assert_eq!(status, StatusCode::OK);
        let dates: Vec<&str> = body["journals"]
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["date"].as_str().unwrap())
            .collect();
        assert_eq!(dates, vec!["2025-01-03", "2025-01-02", "2025-01-01"]);
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let state = test_state(Arc::new(MemoryStore::new()), None);

        let (status, body) = post_json(&state, "/api/journals", json!({"userId": "u1", "date": "2025-01-01"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "userId, date, and text are required");

        let (status, _) = get(&state, "/api/journals").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get(&state, "/api/journals?userId=u1&date=01-02-2025").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_body_uses_error_envelope() {
        let state = test_state(Arc::new(MemoryStore::new()), None);

        let (status, body) = post_json(&state, "/api/journals", json!({"userId": 42, "date": "2025-01-01", "text": "x"})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], 400);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
    }

    #[tokio::test]
    async fn test_unknown_date_is_null() {
        let state = test_state(Arc::new(MemoryStore::new()), None);

        let (status, body) = get(&state, "/api/journals?userId=u1&date=2025-06-01").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["journal"].is_null());
    }
}
