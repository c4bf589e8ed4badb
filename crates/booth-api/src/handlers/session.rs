//! Session resolution.
//!
//! Decrypts the QR routing parameters server-side, validates them into
//! `SessionParams` with a fresh access id, and records the visit. Anything
//! malformed produces the scan-to-begin error so clients never start the
//! media pipeline with null identifiers.

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use booth_models::{ArtistProfile, SessionParams};

use crate::error::{ApiError, ApiResult};
use crate::metrics;
use crate::state::AppState;

/// Encrypted query parameters as carried by the QR code.
#[derive(Debug, Deserialize)]
pub struct SessionQuery {
    pub userid: Option<String>,
    pub consent: Option<String>,
    pub age: Option<String>,
    #[serde(rename = "artistId")]
    pub artist_id: Option<String>,
}

/// `GET /session`
pub async fn resolve_session(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> ApiResult<Json<SessionParams>> {
    let result = decode_session(&state, &query).await;
    metrics::record_session_decrypted(result.is_ok());
    let params = result?;

    // One access row per session, created as soon as the parameters resolve
    state
        .store
        .create_access(&params.user_id, &params.access_id, params.artist_id)
        .await?;

    info!(
        access_id = params.access_id.as_str(),
        artist_id = params.artist_id,
        "Session resolved"
    );
    Ok(Json(params))
}

async fn decode_session(state: &AppState, query: &SessionQuery) -> ApiResult<SessionParams> {
    let (Some(userid), Some(consent), Some(age), Some(artist_id)) = (
        query.userid.as_deref(),
        query.consent.as_deref(),
        query.age.as_deref(),
        query.artist_id.as_deref(),
    ) else {
        return Err(ApiError::ScanToBegin);
    };

    let decrypt = |value: &str| state.crypto.decrypt(value).map_err(|_| ApiError::ScanToBegin);

    let user_id = decrypt(userid)?;
    if user_id.is_empty() {
        return Err(ApiError::ScanToBegin);
    }

    let consent = matches!(decrypt(consent)?.as_str(), "true" | "1");
    let age: u32 = decrypt(age)?.parse().map_err(|_| ApiError::ScanToBegin)?;
    let artist_id: u32 = decrypt(artist_id)?.parse().map_err(|_| ApiError::ScanToBegin)?;

    // Unknown artists cannot render a booth
    if ArtistProfile::by_id(artist_id).is_none() {
        return Err(ApiError::ScanToBegin);
    }

    Ok(SessionParams::new(user_id, consent, age, artist_id))
}
