// common/src/models/user.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::role::Role;

/// Persisted account of an admin, agent or client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    /// Argon2 PHC string; never leaves the server
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Role,
    pub profile_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: impl Into<String>, password_hash: String, role: Role) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            password_hash,
            full_name: None,
            email: None,
            role,
            profile_image: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// The user behind a request's session, loaded fresh from the store
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_is_not_serialized() {
        let user = User::new("jane", "$argon2id$secret".to_string(), Role::Agent);
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["role"], "agent");
        assert_eq!(json["username"], "jane");
    }
}
