//! Transaction counter fields and reporting wire types.
//!
//! Field names on the wire stay camelCase to preserve the original API
//! contract consumed by the dashboard.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::session::AccessId;

/// A per-access counter that can be incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum CounterField {
    #[serde(rename = "takePhoto")]
    TakePhoto,
    #[serde(rename = "takeVideo")]
    TakeVideo,
    #[serde(rename = "saveAndShare")]
    SaveAndShare,
}

impl CounterField {
    /// Wire name as sent by clients.
    pub fn wire_name(&self) -> &'static str {
        match self {
            CounterField::TakePhoto => "takePhoto",
            CounterField::TakeVideo => "takeVideo",
            CounterField::SaveAndShare => "saveAndShare",
        }
    }

    /// Database column. Deliberately a closed mapping so a field name can
    /// never reach SQL as free text.
    pub fn column(&self) -> &'static str {
        match self {
            CounterField::TakePhoto => "take_photo",
            CounterField::TakeVideo => "take_video",
            CounterField::SaveAndShare => "save_and_share",
        }
    }
}

impl fmt::Display for CounterField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wire_name())
    }
}

#[derive(Debug, Error)]
#[error("Invalid field: {0}")]
pub struct CounterFieldParseError(String);

impl FromStr for CounterField {
    type Err = CounterFieldParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "takePhoto" => Ok(CounterField::TakePhoto),
            "takeVideo" => Ok(CounterField::TakeVideo),
            "saveAndShare" => Ok(CounterField::SaveAndShare),
            other => Err(CounterFieldParseError(other.to_string())),
        }
    }
}

/// `POST /userAccess` request body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessRequest {
    pub user_id: String,
    pub access_id: AccessId,
    pub artist_id: u32,
    #[serde(default)]
    pub take_photo: i64,
    #[serde(default)]
    pub take_video: i64,
    #[serde(default)]
    pub save_and_share: i64,
}

/// `POST /userAccess` response body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccessResponse {
    pub message: String,
    pub access_id: AccessId,
}

/// `POST /updateTransaction` request body.
///
/// `field` is a raw string on purpose: an unknown name must produce a 400,
/// not a deserialization failure buried in a 422.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncrementRequest {
    pub access_id: AccessId,
    pub field: String,
}

/// One row of the per-day aggregate report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DailyAggregate {
    /// Day in `YYYY-MM-DD`
    pub date: String,
    pub total_rows: i64,
    pub unique_users: i64,
    pub total_save_and_share: i64,
}

/// Per-artist session totals, zero-filled for artists with no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtistTotal {
    pub artist_id: u32,
    pub total_rows: i64,
}

/// Per-artist save&share totals, zero-filled for artists with no rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArtistSaveShareTotal {
    pub artist_id: u32,
    pub total_save_and_share: i64,
}

/// `GET /getTransactions` response body.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReport {
    pub total_records: i64,
    pub total_pages: i64,
    pub current_page: i64,
    pub page_size: i64,
    pub data: Vec<DailyAggregate>,
    pub sum_by_artist: Vec<ArtistTotal>,
    pub save_share_by_artist: Vec<ArtistSaveShareTotal>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_parse_allowlist() {
        assert_eq!("takePhoto".parse::<CounterField>().unwrap(), CounterField::TakePhoto);
        assert_eq!("saveAndShare".parse::<CounterField>().unwrap(), CounterField::SaveAndShare);
        assert!("take_photo".parse::<CounterField>().is_err());
        assert!("DROP TABLE transactions".parse::<CounterField>().is_err());
    }

    #[test]
    fn test_wire_names_round_trip() {
        for field in [
            CounterField::TakePhoto,
            CounterField::TakeVideo,
            CounterField::SaveAndShare,
        ] {
            assert_eq!(field.wire_name().parse::<CounterField>().unwrap(), field);
        }
    }

    #[test]
    fn test_create_access_request_wire_shape() {
        let body: CreateAccessRequest = serde_json::from_str(
            r#"{"userId":"u1","accessId":"a1","artistId":4,"takePhoto":0,"takeVideo":0,"saveAndShare":0}"#,
        )
        .unwrap();
        assert_eq!(body.user_id, "u1");
        assert_eq!(body.artist_id, 4);
        assert_eq!(body.take_photo, 0);
    }
}
