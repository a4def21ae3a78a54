//! Credential checks, user storage and the admin access rules.

pub mod credentials;
pub mod resolver;
pub mod store;

pub use credentials::{hash_password, verify_password, CredentialVerifier};
pub use resolver::{AccessGrant, AccessPolicy, AccessRequest, Decision, RoleResolver};
pub use store::{InMemoryUserStore, UserStore};
