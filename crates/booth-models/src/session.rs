//! Session identity decrypted from QR routing parameters.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Minimum age for storage upload eligibility.
pub const UPLOAD_MIN_AGE: u32 = 20;

/// Unique identifier for one photobooth visit.
///
/// Generated fresh per session; it is the key every transaction counter
/// hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AccessId(pub String);

impl AccessId {
    /// Generate a new random access ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AccessId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AccessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decrypted per-visit session parameters.
///
/// Built once at session start from server-side decrypted routing
/// parameters; never mutated afterwards. The consent flag and age gate
/// storage uploads and must only ever come from here, not from any
/// client-toggleable state.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionParams {
    pub user_id: String,
    pub consent: bool,
    pub age: u32,
    pub artist_id: u32,
    pub access_id: AccessId,
}

impl SessionParams {
    pub fn new(user_id: impl Into<String>, consent: bool, age: u32, artist_id: u32) -> Self {
        Self {
            user_id: user_id.into(),
            consent,
            age,
            artist_id,
            access_id: AccessId::new(),
        }
    }

    /// Whether captured media may be uploaded to durable storage.
    pub fn upload_permitted(&self) -> bool {
        self.consent && self.age >= UPLOAD_MIN_AGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_ids_are_unique() {
        assert_ne!(AccessId::new(), AccessId::new());
    }

    #[test]
    fn test_upload_gate_requires_consent_and_age() {
        let mut params = SessionParams::new("u1", true, 25, 1);
        assert!(params.upload_permitted());

        params.consent = false;
        assert!(!params.upload_permitted());

        params.consent = true;
        params.age = 19;
        assert!(!params.upload_permitted());
    }

    #[test]
    fn test_wire_field_names() {
        let params = SessionParams::new("u1", true, 25, 3);
        let json = serde_json::to_value(&params).unwrap();
        assert!(json.get("userId").is_some());
        assert!(json.get("artistId").is_some());
        assert!(json.get("accessId").is_some());
    }
}
