// common/src/client_guard.rs
//! Redirect decision for protected pages, evaluated before a page renders.
//!
//! This only spares the visitor a flash of content they cannot use. The
//! server rejects unauthorized API calls on its own whatever this says.

use serde::{Deserialize, Serialize};

use crate::models::role::LOGIN_PATH;
use crate::models::{CanonicalIdentity, Role};

/// Authentication state the browser keeps after login
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuthState {
    #[serde(default)]
    pub role: Option<Role>,
    /// Flag kept by older front-end builds
    #[serde(rename = "isAdmin", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_admin: bool,
}

impl ClientAuthState {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_role(role: Role) -> Self {
        Self {
            role: Some(role),
            is_admin: false,
        }
    }

    pub fn from_identity(identity: Option<&CanonicalIdentity>) -> Self {
        identity.map_or_else(Self::anonymous, |identity| Self::with_role(identity.role))
    }

    pub fn effective_role(&self) -> Option<Role> {
        if self.is_admin {
            Some(Role::Admin)
        } else {
            self.role
        }
    }
}

/// Per-render state of a protected route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unchecked,
    Authorized,
    WrongRole(Role),
    Unauthenticated,
}

impl GuardState {
    /// Where to send the visitor, if anywhere
    pub fn redirect_target(&self) -> Option<&'static str> {
        match self {
            GuardState::Unchecked | GuardState::Authorized => None,
            GuardState::WrongRole(role) => Some(role.dashboard_path()),
            GuardState::Unauthenticated => Some(LOGIN_PATH),
        }
    }
}

/// What a render pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Render<T> {
    Component(T),
    Redirect(&'static str),
}

/// Wrapper around one protected page
#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    required: Role,
    state: GuardState,
}

impl ProtectedRoute {
    pub fn new(required: Role) -> Self {
        Self {
            required,
            state: GuardState::Unchecked,
        }
    }

    pub fn required(&self) -> Role {
        self.required
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    /// Classify client state against the required role without rendering
    pub fn check(&self, auth: &ClientAuthState) -> GuardState {
        match auth.effective_role() {
            Some(role) if role.satisfies(self.required) => GuardState::Authorized,
            Some(role) => GuardState::WrongRole(role),
            None => GuardState::Unauthenticated,
        }
    }

    /// Run one render pass; `component` is only invoked when authorized.
    ///
    /// The outcome is terminal until `auth_changed` starts a fresh pass.
    pub fn render<T, F>(&mut self, auth: &ClientAuthState, component: F) -> Render<T>
    where
        F: FnOnce() -> T,
    {
        if self.state == GuardState::Unchecked {
            self.state = self.check(auth);
            tracing::debug!(required = %self.required, state = ?self.state, "Protected route checked");
        }

        match self.state.redirect_target() {
            Some(target) => Render::Redirect(target),
            None => Render::Component(component()),
        }
    }

    /// Login or logout happened; the next render re-checks from `Unchecked`
    pub fn auth_changed(&mut self) {
        self.state = GuardState::Unchecked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_agent_on_admin_page_redirects_to_agent_dashboard() {
        let auth: ClientAuthState = serde_json::from_str(r#"{ "role": "agent" }"#).unwrap();
        let mut route = ProtectedRoute::new(Role::Admin);
        let mut rendered = false;

        let outcome = route.render(&auth, || rendered = true);

        assert_eq!(outcome, Render::Redirect("/agent-dashboard"));
        assert_eq!(route.state(), GuardState::WrongRole(Role::Agent));
        assert!(!rendered);
    }

    #[test]
    fn test_no_state_redirects_to_login() {
        let mut route = ProtectedRoute::new(Role::Client);
        let outcome = route.render(&ClientAuthState::anonymous(), || "dashboard");
        assert_eq!(outcome, Render::Redirect("/login"));
        assert_eq!(route.state(), GuardState::Unauthenticated);
    }

    #[test]
    fn test_matching_role_renders() {
        let mut route = ProtectedRoute::new(Role::Agent);
        let outcome = route.render(&ClientAuthState::with_role(Role::Agent), || "listings");
        assert_eq!(outcome, Render::Component("listings"));
        assert_eq!(route.state(), GuardState::Authorized);
    }

    #[test]
    fn test_legacy_admin_flag_opens_every_page() {
        let auth: ClientAuthState = serde_json::from_str(r#"{ "isAdmin": true }"#).unwrap();
        for required in [Role::Admin, Role::Agent, Role::Client] {
            assert_eq!(ProtectedRoute::new(required).check(&auth), GuardState::Authorized);
        }
    }

    #[test]
    fn test_state_is_terminal_until_auth_changes() {
        let mut route = ProtectedRoute::new(Role::Admin);
        assert_eq!(route.render(&ClientAuthState::anonymous(), || ()), Render::Redirect("/login"));

        // Login completed but no fresh pass was started yet
        let admin = ClientAuthState::with_role(Role::Admin);
        assert_eq!(route.render(&admin, || ()), Render::Redirect("/login"));

        route.auth_changed();
        assert_eq!(route.state(), GuardState::Unchecked);
        assert_eq!(route.render(&admin, || ()), Render::Component(()));
    }

    #[test]
    fn test_client_state_serialization() {
        let json = serde_json::to_value(ClientAuthState::with_role(Role::Client)).unwrap();
        assert_eq!(json, serde_json::json!({ "role": "client" }));
        let json = serde_json::to_value(ClientAuthState::anonymous()).unwrap();
        assert_eq!(json, serde_json::json!({ "role": null }));
    }
}
