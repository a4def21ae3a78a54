// common/src/auth/credentials.rs
use std::sync::Arc;

use argon2::password_hash::{PasswordHash, SaltString};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use crate::error::AuthError;
use crate::models::User;

use super::store::UserStore;

/// Hash a password into an argon2id PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// An unparsable stored hash never matches
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Checks submitted username/password pairs against stored accounts.
///
/// There is no lockout or attempt counting; every call is independent.
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn UserStore>,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    pub async fn verify(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .find_by_username(username)
            .await?
            .ok_or(AuthError::NotFound)?;

        // Argon2 is deliberately slow; keep it off the request threads
        let hash = user.password_hash.clone();
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        if matches {
            tracing::debug!("Credentials accepted for {}", user.username);
            Ok(user)
        } else {
            Err(AuthError::InvalidCredential)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::store::InMemoryUserStore;
    use crate::config::UserSeed;
    use crate::models::Role;

    fn verifier() -> CredentialVerifier {
        let store = InMemoryUserStore::from_seeds(&[UserSeed {
            username: "broker".to_string(),
            password: Some("open-house".to_string()),
            password_hash: None,
            role: Role::Agent,
            full_name: Some("Pat Broker".to_string()),
            email: None,
        }])
        .unwrap();
        CredentialVerifier::new(Arc::new(store))
    }

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "hunter2"));
        assert!(!verify_password(&hash, "hunter3"));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("plaintext", "plaintext"));
        assert!(!verify_password("", ""));
    }

    #[tokio::test]
    async fn test_unknown_username_is_not_found() {
        let err = verifier().verify("nobody", "open-house").await.unwrap_err();
        assert!(matches!(err, AuthError::NotFound));
    }

    #[tokio::test]
    async fn test_wrong_password_is_invalid_credential() {
        let err = verifier().verify("broker", "closed-house").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential));
    }

    #[tokio::test]
    async fn test_correct_credentials_return_user_with_role() {
        let user = verifier().verify("broker", "open-house").await.unwrap();
        assert_eq!(user.username, "broker");
        assert_eq!(user.role, Role::Agent);
        assert_eq!(user.full_name.as_deref(), Some("Pat Broker"));
    }
}
