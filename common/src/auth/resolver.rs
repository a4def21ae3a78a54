// common/src/auth/resolver.rs
//! Decides whether a request may act as an administrator.
//!
//! Several historical login paths left differently shaped sessions behind.
//! The resolver checks the canonical identity first, then each legacy shape,
//! then the deployment-level grants. The first match wins; there is no
//! partial trust, only allow or deny.

use serde::Serialize;

use crate::config::{AccessConfig, Config, DeploymentMode};
use crate::models::{Session, User};

/// Which rule let a request through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessGrant {
    CanonicalIdentity,
    IsAdminFlag,
    AuthenticatedAdminFlag,
    UserTypeAdmin,
    PassportAdmin,
    AuthenticatedPrincipal,
    BootstrapUsername,
    PlatformHeader,
    DevelopmentMode,
}

impl AccessGrant {
    /// Grants that only exist to keep old session shapes working
    pub fn is_legacy(&self) -> bool {
        matches!(
            self,
            AccessGrant::IsAdminFlag
                | AccessGrant::AuthenticatedAdminFlag
                | AccessGrant::UserTypeAdmin
                | AccessGrant::PassportAdmin
                | AccessGrant::BootstrapUsername
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow(AccessGrant),
    Deny,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// Everything the resolver may look at for one request
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessRequest<'a> {
    pub session: Option<&'a Session>,
    /// User loaded from storage for the session identity; `Some` means authenticated
    pub principal: Option<&'a User>,
    pub platform_header_present: bool,
}

impl<'a> AccessRequest<'a> {
    pub fn new(session: Option<&'a Session>) -> Self {
        Self {
            session,
            principal: None,
            platform_header_present: false,
        }
    }

    pub fn with_principal(mut self, principal: Option<&'a User>) -> Self {
        self.principal = principal;
        self
    }

    pub fn with_platform_header(mut self, present: bool) -> Self {
        self.platform_header_present = present;
        self
    }

    fn is_authenticated(&self) -> bool {
        self.principal.is_some()
    }
}

/// Startup-time settings of the resolver
#[derive(Debug, Clone)]
pub struct AccessPolicy {
    pub deployment: DeploymentMode,
    pub legacy_fallbacks: bool,
    pub bootstrap_usernames: Vec<String>,
    pub platform_header: Option<String>,
}

impl AccessPolicy {
    pub fn new(deployment: DeploymentMode, access: &AccessConfig) -> Self {
        Self {
            deployment,
            legacy_fallbacks: access.legacy_fallbacks,
            bootstrap_usernames: access.bootstrap_usernames.clone(),
            platform_header: access.platform_header.clone(),
        }
    }
}

impl From<&Config> for AccessPolicy {
    fn from(config: &Config) -> Self {
        Self::new(config.deployment, &config.access)
    }
}

#[derive(Debug, Clone)]
pub struct RoleResolver {
    policy: AccessPolicy,
}

impl RoleResolver {
    pub fn new(policy: AccessPolicy) -> Self {
        if policy.deployment.is_development() {
            tracing::warn!("Development deployment: admin access is granted to every request");
        }
        if let Some(header) = &policy.platform_header {
            tracing::warn!("Requests carrying the {} header are granted admin access", header);
        }
        Self { policy }
    }

    pub fn policy(&self) -> &AccessPolicy {
        &self.policy
    }

    /// Header name whose presence grants access, if one is configured
    pub fn platform_header(&self) -> Option<&str> {
        self.policy.platform_header.as_deref()
    }

    /// Evaluate the access rules in order; pure, no side effects beyond logging.
    pub fn resolve(&self, request: &AccessRequest<'_>) -> Decision {
        let decision = self.evaluate(request);
        if let Decision::Allow(grant) = decision {
            if grant.is_legacy() {
                tracing::warn!(?grant, "Admin access granted through a deprecated session shape");
            }
        }
        decision
    }

    fn evaluate(&self, request: &AccessRequest<'_>) -> Decision {
        if let Some(session) = request.session {
            if session.role().is_some_and(|role| role.is_admin()) {
                return Decision::Allow(AccessGrant::CanonicalIdentity);
            }

            if self.policy.legacy_fallbacks {
                if let Some(grant) = legacy_session_grant(session) {
                    return Decision::Allow(grant);
                }
            }
        }

        if request.is_authenticated() && request.principal.is_some_and(User::is_admin) {
            return Decision::Allow(AccessGrant::AuthenticatedPrincipal);
        }

        if self.policy.legacy_fallbacks && !self.policy.deployment.is_development() {
            let username = request
                .session
                .and_then(|session| session.flag_str("/user/username"));
            if let Some(username) = username {
                if self.policy.bootstrap_usernames.iter().any(|known| known == username) {
                    return Decision::Allow(AccessGrant::BootstrapUsername);
                }
            }
        }

        if self.policy.platform_header.is_some() && request.platform_header_present {
            return Decision::Allow(AccessGrant::PlatformHeader);
        }

        if self.policy.deployment.is_development() {
            return Decision::Allow(AccessGrant::DevelopmentMode);
        }

        Decision::Deny
    }
}

fn legacy_session_grant(session: &Session) -> Option<AccessGrant> {
    if session.flag_is_true("/isAdmin") {
        return Some(AccessGrant::IsAdminFlag);
    }
    if session.flag_is_true("/authenticatedAdmin") {
        return Some(AccessGrant::AuthenticatedAdminFlag);
    }
    if session.flag_str("/userType") == Some("admin") {
        return Some(AccessGrant::UserTypeAdmin);
    }
    if session.has_flag("/passport/user") && session.flag_is_true("/passport/user/isAdmin") {
        return Some(AccessGrant::PassportAdmin);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CanonicalIdentity, Role};
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn resolver(deployment: DeploymentMode) -> RoleResolver {
        RoleResolver::new(AccessPolicy::new(deployment, &AccessConfig::default()))
    }

    fn session(flags: Value) -> Session {
        let mut session = Session::new_anonymous("token".to_string());
        if let Value::Object(map) = flags {
            session.merge_flags(map);
        }
        session
    }

    fn decide(resolver: &RoleResolver, session: &Session) -> Decision {
        resolver.resolve(&AccessRequest::new(Some(session)))
    }

    #[test]
    fn test_is_admin_flag_allows_regardless_of_other_flags() {
        let resolver = resolver(DeploymentMode::Production);
        let session = session(json!({ "isAdmin": true, "userType": "client", "authenticatedAdmin": false }));
        assert_eq!(decide(&resolver, &session), Decision::Allow(AccessGrant::IsAdminFlag));
    }

    #[test]
    fn test_empty_session_denied_in_production() {
        let resolver = resolver(DeploymentMode::Production);
        assert_eq!(decide(&resolver, &session(json!({}))), Decision::Deny);
        assert_eq!(resolver.resolve(&AccessRequest::default()), Decision::Deny);
    }

    #[test]
    fn test_bootstrap_username_allows_in_production() {
        let resolver = resolver(DeploymentMode::Production);
        let session = session(json!({ "user": { "username": "admin" } }));
        assert_eq!(decide(&resolver, &session), Decision::Allow(AccessGrant::BootstrapUsername));

        let other = self::session(json!({ "user": { "username": "Admin" } }));
        assert_eq!(decide(&resolver, &other), Decision::Deny);
    }

    #[test]
    fn test_development_allows_anything() {
        let resolver = resolver(DeploymentMode::Development);
        assert_eq!(
            resolver.resolve(&AccessRequest::default()),
            Decision::Allow(AccessGrant::DevelopmentMode)
        );
        let session = session(json!({ "isAdmin": false, "userType": "client" }));
        assert!(decide(&resolver, &session).is_allowed());
    }

    #[test]
    fn test_legacy_shapes() {
        let resolver = resolver(DeploymentMode::Production);
        assert_eq!(
            decide(&resolver, &session(json!({ "authenticatedAdmin": true }))),
            Decision::Allow(AccessGrant::AuthenticatedAdminFlag)
        );
        assert_eq!(
            decide(&resolver, &session(json!({ "userType": "admin" }))),
            Decision::Allow(AccessGrant::UserTypeAdmin)
        );
        assert_eq!(
            decide(&resolver, &session(json!({ "passport": { "user": { "isAdmin": true } } }))),
            Decision::Allow(AccessGrant::PassportAdmin)
        );
        assert_eq!(
            decide(&resolver, &session(json!({ "passport": { "user": null, "isAdmin": true } }))),
            Decision::Deny
        );
        assert_eq!(decide(&resolver, &session(json!({ "userType": "agent" }))), Decision::Deny);
    }

    #[test]
    fn test_canonical_identity_checked_first() {
        let resolver = resolver(DeploymentMode::Production);
        let admin = Session::new_authenticated(
            "token".to_string(),
            CanonicalIdentity::new(Uuid::new_v4(), Role::Admin),
        );
        assert_eq!(decide(&resolver, &admin), Decision::Allow(AccessGrant::CanonicalIdentity));

        let agent = Session::new_authenticated(
            "token".to_string(),
            CanonicalIdentity::new(Uuid::new_v4(), Role::Agent),
        );
        assert_eq!(decide(&resolver, &agent), Decision::Deny);
    }

    #[test]
    fn test_principal_with_admin_role_allows() {
        let resolver = resolver(DeploymentMode::Production);
        let admin = User::new("root", String::new(), Role::Admin);
        let agent = User::new("broker", String::new(), Role::Agent);

        let request = AccessRequest::new(None).with_principal(Some(&admin));
        assert_eq!(resolver.resolve(&request), Decision::Allow(AccessGrant::AuthenticatedPrincipal));

        let request = AccessRequest::new(None).with_principal(Some(&agent));
        assert_eq!(resolver.resolve(&request), Decision::Deny);
    }

    #[test]
    fn test_platform_header_only_when_configured() {
        let unconfigured = resolver(DeploymentMode::Production);
        let request = AccessRequest::new(None).with_platform_header(true);
        assert_eq!(unconfigured.resolve(&request), Decision::Deny);

        let access = AccessConfig {
            platform_header: Some("x-platform-user-id".to_string()),
            ..AccessConfig::default()
        };
        let configured = RoleResolver::new(AccessPolicy::new(DeploymentMode::Production, &access));
        assert_eq!(configured.resolve(&request), Decision::Allow(AccessGrant::PlatformHeader));
        assert_eq!(configured.resolve(&AccessRequest::new(None)), Decision::Deny);
    }

    #[test]
    fn test_legacy_fallbacks_can_be_disabled() {
        let access = AccessConfig {
            legacy_fallbacks: false,
            ..AccessConfig::default()
        };
        let resolver = RoleResolver::new(AccessPolicy::new(DeploymentMode::Production, &access));
        assert_eq!(decide(&resolver, &session(json!({ "isAdmin": true }))), Decision::Deny);
        assert_eq!(
            decide(&resolver, &session(json!({ "user": { "username": "admin" } }))),
            Decision::Deny
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let resolver = resolver(DeploymentMode::Production);
        for flags in [
            json!({}),
            json!({ "isAdmin": true }),
            json!({ "user": { "username": "administrator" } }),
            json!({ "passport": { "user": { "isAdmin": "yes" } } }),
        ] {
            let session = session(flags);
            assert_eq!(decide(&resolver, &session), decide(&resolver, &session));
        }
    }
}
