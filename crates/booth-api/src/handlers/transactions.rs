//! Transaction counter endpoints.
//!
//! Wire contract notes:
//! - Missing fields are a 400, so bodies are inspected as raw JSON rather
//!   than letting typed extraction turn them into 422s.
//! - An unknown accessId on increment is reported as a 500; the dashboard
//!   depends on that status.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use booth_models::{AccessId, CounterField, CreateAccessResponse, TransactionReport};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// `POST /userAccess`
pub async fn user_access(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<(StatusCode, Json<CreateAccessResponse>)> {
    let user_id = body.get("userId").and_then(Value::as_str);
    let access_id = body.get("accessId").and_then(Value::as_str);
    let artist_id = body.get("artistId").and_then(Value::as_u64);

    let (Some(user_id), Some(access_id), Some(artist_id)) = (user_id, access_id, artist_id)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let access_id = AccessId::from_string(access_id);
    state
        .store
        .create_access(user_id, &access_id, artist_id as u32)
        .await?;
    metrics::record_access_created(artist_id as u32);

    Ok((
        StatusCode::CREATED,
        Json(CreateAccessResponse {
            message: "New transaction created".to_string(),
            access_id,
        }),
    ))
}

/// `POST /updateTransaction`
pub async fn update_transaction(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let access_id = body.get("accessId").and_then(Value::as_str);
    let field = body.get("field").and_then(Value::as_str);

    let (Some(access_id), Some(field)) = (access_id, field) else {
        return Err(ApiError::bad_request("Missing required fields"));
    };

    let field: CounterField = field
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid field"))?;

    let access_id = AccessId::from_string(access_id);
    state.store.increment(&access_id, field).await?;
    metrics::record_counter_incremented(field.wire_name());

    Ok(Json(json!({
        "message": format!("{} incremented successfully", field.wire_name()),
        "accessId": access_id,
    })))
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

/// `GET /getTransactions`
pub async fn get_transactions(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Json<TransactionReport>> {
    let report = state
        .store
        .report(query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;
    Ok(Json(report))
}
