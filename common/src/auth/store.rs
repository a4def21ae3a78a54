// common/src/auth/store.rs
use async_trait::async_trait;
use dashmap::DashMap;
use uuid::Uuid;

use crate::config::UserSeed;
use crate::error::AuthError;
use crate::models::User;

use super::credentials::hash_password;

/// Persistence seam for user accounts
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError>;

    /// Fails with `UsernameTaken` when the username already exists
    async fn insert(&self, user: User) -> Result<User, AuthError>;

    async fn list(&self) -> Result<Vec<User>, AuthError>;
}

/// Process-local user store
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: DashMap<Uuid, User>,
    // Map from username to user id
    username_lookup: DashMap<String, Uuid>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from configured seeds, hashing plaintext passwords
    pub fn from_seeds(seeds: &[UserSeed]) -> Result<Self, AuthError> {
        let store = Self::new();

        for seed in seeds {
            let password_hash = match (&seed.password_hash, &seed.password) {
                (Some(hash), _) => hash.clone(),
                (None, Some(password)) => hash_password(password)?,
                (None, None) => {
                    tracing::warn!("Skipping user seed {} without a password", seed.username);
                    continue;
                }
            };

            let mut user = User::new(seed.username.clone(), password_hash, seed.role);
            user.full_name = seed.full_name.clone();
            user.email = seed.email.clone();
            store.insert_user(user)?;
        }

        tracing::info!("User store seeded with {} accounts", store.users.len());
        Ok(store)
    }

    fn insert_user(&self, user: User) -> Result<User, AuthError> {
        match self.username_lookup.entry(user.username.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => {
                Err(AuthError::UsernameTaken(user.username))
            }
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user.clone());
                Ok(user)
            }
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = self
            .username_lookup
            .get(username)
            .and_then(|id| self.users.get(id.value()).map(|entry| entry.value().clone()));
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn insert(&self, user: User) -> Result<User, AuthError> {
        let user = self.insert_user(user)?;
        tracing::info!("Created user {} with role {}", user.username, user.role);
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, AuthError> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.value().clone()).collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }
}
