// common/src/models/session.rs
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use super::role::Role;

/// Normalized "who is this session and what may it do", written on every login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalIdentity {
    pub subject_id: Uuid,
    pub role: Role,
    pub issued_at: DateTime<Utc>,
}

impl CanonicalIdentity {
    pub fn new(subject_id: Uuid, role: Role) -> Self {
        Self {
            subject_id,
            role,
            issued_at: Utc::now(),
        }
    }
}

/// Server-held authentication state of one browser
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Opaque token carried in the session cookie
    pub session_id: String,
    /// Timestamp when the session was created
    pub created_at: DateTime<Utc>,
    /// Timestamp of last request carrying this session
    pub last_active: DateTime<Utc>,
    /// Identity written by the login endpoints
    pub identity: Option<CanonicalIdentity>,
    /// Flags written by older login code paths (`isAdmin`, `userType`, `passport`, ...)
    #[serde(default)]
    pub flags: Map<String, Value>,
}

impl Session {
    /// Create a session with no identity and no flags
    pub fn new_anonymous(session_id: String) -> Self {
        let now = Utc::now();
        Self {
            session_id,
            created_at: now,
            last_active: now,
            identity: None,
            flags: Map::new(),
        }
    }

    /// Create a session already carrying a login identity
    pub fn new_authenticated(session_id: String, identity: CanonicalIdentity) -> Self {
        let mut session = Self::new_anonymous(session_id);
        session.identity = Some(identity);
        session
    }

    /// Update session activity timestamp
    pub fn update_activity(&mut self) {
        self.last_active = Utc::now();
    }

    /// Check if the session has expired based on TTL
    pub fn is_expired(&self, ttl_seconds: i64) -> bool {
        let age = Utc::now().signed_duration_since(self.last_active);
        age.num_seconds() > ttl_seconds
    }

    pub fn expires_at(&self, ttl_seconds: i64) -> DateTime<Utc> {
        self.last_active + Duration::seconds(ttl_seconds)
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    pub fn role(&self) -> Option<Role> {
        self.identity.as_ref().map(|identity| identity.role)
    }

    /// Merge flags into the bag, overwriting existing keys
    pub fn merge_flags(&mut self, flags: Map<String, Value>) {
        for (key, value) in flags {
            self.flags.insert(key, value);
        }
    }

    /// Look up a possibly nested flag by JSON pointer (`/passport/user/isAdmin`).
    ///
    /// Any missing or non-object segment yields `None`.
    pub fn flag(&self, pointer: &str) -> Option<&Value> {
        let mut segments = pointer.trim_start_matches('/').split('/');
        let first = segments.next()?;
        let mut current = self.flags.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// True only when the flag holds the JSON boolean `true`
    pub fn flag_is_true(&self, pointer: &str) -> bool {
        matches!(self.flag(pointer), Some(Value::Bool(true)))
    }

    pub fn flag_str(&self, pointer: &str) -> Option<&str> {
        self.flag(pointer).and_then(Value::as_str)
    }

    /// Present and not JSON `null`
    pub fn has_flag(&self, pointer: &str) -> bool {
        !matches!(self.flag(pointer), None | Some(Value::Null))
    }
}

/// Result of session operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionResult {
    Success(Session),
    NotFound,
    Expired,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn with_flags(flags: Value) -> Session {
        let mut session = Session::new_anonymous("token".to_string());
        if let Value::Object(map) = flags {
            session.merge_flags(map);
        }
        session
    }

    #[test]
    fn test_nested_flag_lookup() {
        let session = with_flags(json!({ "passport": { "user": { "isAdmin": true } } }));
        assert!(session.flag_is_true("/passport/user/isAdmin"));
        assert!(session.has_flag("/passport/user"));
        assert!(!session.has_flag("/passport/user/name"));
    }

    #[test]
    fn test_flag_lookup_through_non_object_is_absent() {
        let session = with_flags(json!({ "passport": "legacy", "user": null }));
        assert!(session.flag("/passport/user/isAdmin").is_none());
        assert!(session.flag_str("/user/username").is_none());
        assert!(!session.has_flag("/user"));
    }

    #[test]
    fn test_flag_is_true_requires_boolean() {
        let session = with_flags(json!({ "isAdmin": "true", "authenticatedAdmin": 1 }));
        assert!(!session.flag_is_true("/isAdmin"));
        assert!(!session.flag_is_true("/authenticatedAdmin"));
    }

    #[test]
    fn test_expiry() {
        let mut session = Session::new_anonymous("token".to_string());
        assert!(!session.is_expired(60));
        session.last_active = Utc::now() - Duration::seconds(120);
        assert!(session.is_expired(60));
        assert!(session.expires_at(60) < Utc::now());
    }

    #[test]
    fn test_authenticated_session_reports_role() {
        let identity = CanonicalIdentity::new(Uuid::new_v4(), Role::Agent);
        let session = Session::new_authenticated("token".to_string(), identity);
        assert!(session.is_authenticated());
        assert_eq!(session.role(), Some(Role::Agent));
    }
}
