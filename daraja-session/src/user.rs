//! User profile cached alongside the session token

use crate::{SessionError, SessionResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// User identifier as issued by the backend (numeric or textual)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(id) => write!(f, "{}", id),
            UserId::Text(id) => write!(f, "{}", id),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Number(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Text(id.to_string())
    }
}

/// Profile of the logged-in user
///
/// Fields the client does not know about (phone, country, KYC status, ...)
/// are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn new(id: impl Into<UserId>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: email.into(),
            name: None,
            is_admin: false,
            is_verified: false,
            extra: Map::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Name shown in the UI, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }

    /// Return a copy with the patch applied.
    ///
    /// Only keys present in the patch change. A `null` value clears an
    /// optional field. The patch must be a JSON object and the result must
    /// still be a valid profile; otherwise `self` is left as is.
    pub fn merged(&self, patch: &Value) -> SessionResult<UserProfile> {
        let patch = patch
            .as_object()
            .ok_or_else(|| SessionError::validation("user update must be a JSON object"))?;

        let mut record = match serde_json::to_value(self) {
            Ok(Value::Object(record)) => record,
            Ok(_) => return Err(SessionError::malformed("user profile is not an object")),
            Err(e) => return Err(SessionError::malformed(e.to_string())),
        };

        for (key, value) in patch {
            record.insert(key.clone(), value.clone());
        }

        serde_json::from_value(Value::Object(record))
            .map_err(|e| SessionError::validation(format!("user update rejected: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_user() -> UserProfile {
        serde_json::from_value(json!({
            "id": 1,
            "email": "amina@example.com",
            "name": "Amina",
            "phone": "+254700000000",
            "country": "KE",
            "kyc": {"status": "approved", "level": 2}
        }))
        .unwrap()
    }

    #[test]
    fn test_unknown_fields_pass_through() {
        let user = sample_user();
        assert_eq!(user.extra.get("country"), Some(&json!("KE")));

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value["kyc"]["level"], json!(2));
        assert_eq!(value["phone"], json!("+254700000000"));
    }

    #[test]
    fn test_numeric_and_text_ids() {
        let numeric: UserProfile =
            serde_json::from_value(json!({"id": 1, "email": "a@b.com"})).unwrap();
        assert_eq!(numeric.id, UserId::Number(1));

        let text: UserProfile =
            serde_json::from_value(json!({"id": "usr_9f2", "email": "a@b.com"})).unwrap();
        assert_eq!(text.id.to_string(), "usr_9f2");
    }

    #[test]
    fn test_merge_changes_only_patched_field() {
        let user = sample_user();
        let updated = user.merged(&json!({"phone": "+16135550000"})).unwrap();

        assert_eq!(updated.extra["phone"], json!("+16135550000"));
        assert_eq!(updated.id, user.id);
        assert_eq!(updated.email, user.email);
        assert_eq!(updated.name, user.name);
        assert_eq!(updated.extra["kyc"], user.extra["kyc"]);
        assert_eq!(updated.extra["country"], user.extra["country"]);
    }

    #[test]
    fn test_merge_known_field() {
        let updated = sample_user().merged(&json!({"name": "Amina W."})).unwrap();
        assert_eq!(updated.display_name(), "Amina W.");

        let cleared = updated.merged(&json!({"name": null})).unwrap();
        assert_eq!(cleared.name, None);
        assert_eq!(cleared.display_name(), "amina@example.com");
    }

    #[test]
    fn test_merge_rejects_invalid_patches() {
        let user = sample_user();
        assert!(matches!(
            user.merged(&json!(["name"])),
            Err(SessionError::Validation { .. })
        ));
        assert!(matches!(
            user.merged(&json!({"email": 5})),
            Err(SessionError::Validation { .. })
        ));
    }
}
