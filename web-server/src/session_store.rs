// web-server/src/session_store.rs
use actix::{Actor, Context, Handler, Message, AsyncContext, MessageResult};
use chrono::Utc;
use common::models::{CanonicalIdentity, Session, SessionResult};
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{Map, Value};
use std::time::Duration;
use crate::utils::token::create_session_id;

// Default session TTL in seconds (24 hours)
const DEFAULT_SESSION_TTL: i64 = 86400;

/// Actor message: Create a session with no identity
#[derive(Message)]
#[rtype(result = "Session")]
pub struct CreateSession;

/// Actor message: Create a session for a successful login, retiring the old one
#[derive(Message)]
#[rtype(result = "Session")]
pub struct StartAuthenticatedSession {
    pub identity: CanonicalIdentity,
    pub replaces: Option<String>,
}

/// Actor message: Get a session by id
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct GetSession {
    pub session_id: String,
}

/// Actor message: Merge flags into a session. Only sessions carried over from
/// older deployments hold flags; no login path here writes them.
#[derive(Message)]
#[rtype(result = "SessionResult")]
pub struct UpdateSessionFlags {
    pub session_id: String,
    pub flags: Map<String, Value>,
}

/// Actor message: Destroy a session (logout)
#[derive(Message)]
#[rtype(result = "bool")]
pub struct DestroySession {
    pub session_id: String,
}

/// Actor message: Clean up expired sessions
#[derive(Message)]
#[rtype(result = "usize")]
pub struct CleanupExpiredSessions;

/// Actor message: Get session metrics
#[derive(Message)]
#[rtype(result = "SessionMetrics")]
pub struct GetSessionMetrics;

/// Session metrics
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionMetrics {
    pub total_sessions: usize,
    pub anonymous_sessions: usize,
    pub authenticated_sessions: usize,
    pub expired_count: usize,
    pub avg_session_age_seconds: f64,
}

/// Sole owner of every session record
pub struct SessionStoreActor {
    // Map from session id to session data
    sessions: DashMap<String, Session>,
    // Session TTL in seconds
    session_ttl: i64,
    // Cleanup interval in seconds
    cleanup_interval: u64,
    // Sessions removed because they expired, over the actor's lifetime
    expired_count: usize,
}

impl Default for SessionStoreActor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStoreActor {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            session_ttl: DEFAULT_SESSION_TTL,
            cleanup_interval: 3600, // Run cleanup every hour
            expired_count: 0,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.session_ttl = ttl_seconds;
        self
    }

    pub fn with_cleanup_interval(mut self, interval_seconds: u64) -> Self {
        self.cleanup_interval = interval_seconds.max(1);
        self
    }

    fn insert(&mut self, session: Session) -> Session {
        self.sessions.insert(session.session_id.clone(), session.clone());
        session
    }

    fn metrics(&self) -> SessionMetrics {
        let now = Utc::now();
        let mut authenticated = 0;
        let mut age_sum = 0.0;

        for entry in self.sessions.iter() {
            let session = entry.value();
            if session.is_authenticated() {
                authenticated += 1;
            }
            age_sum += now.signed_duration_since(session.created_at).num_seconds() as f64;
        }

        let total = self.sessions.len();
        SessionMetrics {
            total_sessions: total,
            anonymous_sessions: total - authenticated,
            authenticated_sessions: authenticated,
            expired_count: self.expired_count,
            avg_session_age_seconds: if total > 0 { age_sum / total as f64 } else { 0.0 },
        }
    }

    /// Remove expired sessions
    fn cleanup_sessions(&mut self) -> usize {
        let ttl = self.session_ttl;
        let before = self.sessions.len();
        self.sessions.retain(|_, session| !session.is_expired(ttl));

        let removed = before - self.sessions.len();
        self.expired_count += removed;
        removed
    }
}

impl Actor for SessionStoreActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("SessionStoreActor started with TTL: {}s", self.session_ttl);

        // Schedule periodic session cleanup
        ctx.run_interval(Duration::from_secs(self.cleanup_interval), |act, _ctx| {
            let expired_count = act.cleanup_sessions();
            if expired_count > 0 {
                tracing::info!("Cleaned up {} expired sessions", expired_count);
            }
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            "SessionStoreActor stopped. {} live sessions, {} expired during lifetime",
            self.sessions.len(),
            self.expired_count
        );
    }
}

impl Handler<CreateSession> for SessionStoreActor {
    type Result = MessageResult<CreateSession>;

    fn handle(&mut self, _msg: CreateSession, _ctx: &mut Self::Context) -> Self::Result {
        let session = self.insert(Session::new_anonymous(create_session_id()));
        tracing::debug!("Created anonymous session");
        MessageResult(session)
    }
}

impl Handler<StartAuthenticatedSession> for SessionStoreActor {
    type Result = MessageResult<StartAuthenticatedSession>;

    fn handle(&mut self, msg: StartAuthenticatedSession, _ctx: &mut Self::Context) -> Self::Result {
        // Rotate the id so a pre-login cookie never becomes an authenticated one
        if let Some(old_id) = msg.replaces {
            if self.sessions.remove(&old_id).is_some() {
                tracing::debug!("Retired pre-login session");
            }
        }

        let subject = msg.identity.subject_id;
        let role = msg.identity.role;
        let session = self.insert(Session::new_authenticated(create_session_id(), msg.identity));

        tracing::info!("Started {} session for subject {}", role, subject);
        MessageResult(session)
    }
}

impl Handler<GetSession> for SessionStoreActor {
    type Result = MessageResult<GetSession>;

    fn handle(&mut self, msg: GetSession, _ctx: &mut Self::Context) -> Self::Result {
        let result = if let Some(mut entry) = self.sessions.get_mut(&msg.session_id) {
            let session = entry.value_mut();

            if session.is_expired(self.session_ttl) {
                tracing::debug!("Session expired");
                SessionResult::Expired
            } else {
                session.update_activity();
                SessionResult::Success(session.clone())
            }
        } else {
            tracing::debug!("Session not found");
            SessionResult::NotFound
        };

        MessageResult(result)
    }
}

impl Handler<UpdateSessionFlags> for SessionStoreActor {
    type Result = MessageResult<UpdateSessionFlags>;

    fn handle(&mut self, msg: UpdateSessionFlags, _ctx: &mut Self::Context) -> Self::Result {
        let result = if let Some(mut entry) = self.sessions.get_mut(&msg.session_id) {
            let session = entry.value_mut();

            if session.is_expired(self.session_ttl) {
                SessionResult::Expired
            } else {
                session.merge_flags(msg.flags);
                session.update_activity();
                SessionResult::Success(session.clone())
            }
        } else {
            SessionResult::NotFound
        };

        MessageResult(result)
    }
}

impl Handler<DestroySession> for SessionStoreActor {
    type Result = MessageResult<DestroySession>;

    fn handle(&mut self, msg: DestroySession, _ctx: &mut Self::Context) -> Self::Result {
        let removed = self.sessions.remove(&msg.session_id).is_some();
        if removed {
            tracing::info!("Session destroyed");
        }
        MessageResult(removed)
    }
}

impl Handler<CleanupExpiredSessions> for SessionStoreActor {
    type Result = MessageResult<CleanupExpiredSessions>;

    fn handle(&mut self, _msg: CleanupExpiredSessions, _ctx: &mut Self::Context) -> Self::Result {
        let expired_count = self.cleanup_sessions();
        tracing::info!("Cleaned up {} expired sessions", expired_count);
        MessageResult(expired_count)
    }
}

impl Handler<GetSessionMetrics> for SessionStoreActor {
    type Result = MessageResult<GetSessionMetrics>;

    fn handle(&mut self, _msg: GetSessionMetrics, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix::Actor;
    use common::models::Role;
    use serde_json::json;
    use uuid::Uuid;

    fn admin_identity() -> CanonicalIdentity {
        CanonicalIdentity::new(Uuid::new_v4(), Role::Admin)
    }

    #[actix_web::test]
    async fn test_login_rotates_session_id() {
        let store = SessionStoreActor::new().start();
        let anonymous = store.send(CreateSession).await.unwrap();

        let session = store
            .send(StartAuthenticatedSession {
                identity: admin_identity(),
                replaces: Some(anonymous.session_id.clone()),
            })
            .await
            .unwrap();

        assert_ne!(session.session_id, anonymous.session_id);
        let old = store.send(GetSession { session_id: anonymous.session_id }).await.unwrap();
        assert!(matches!(old, SessionResult::NotFound));

        let current = store.send(GetSession { session_id: session.session_id }).await.unwrap();
        match current {
            SessionResult::Success(found) => assert_eq!(found.role(), Some(Role::Admin)),
            other => panic!("expected session, got {:?}", other),
        }
    }

    #[actix_web::test]
    async fn test_expired_session_reported_and_cleaned() {
        let store = SessionStoreActor::new().with_ttl(-1).start();
        let session = store.send(CreateSession).await.unwrap();

        let result = store.send(GetSession { session_id: session.session_id }).await.unwrap();
        assert!(matches!(result, SessionResult::Expired));

        assert_eq!(store.send(CleanupExpiredSessions).await.unwrap(), 1);
        let metrics = store.send(GetSessionMetrics).await.unwrap();
        assert_eq!(metrics.total_sessions, 0);
        assert_eq!(metrics.expired_count, 1);
    }

    #[actix_web::test]
    async fn test_flags_merge_and_destroy() {
        let store = SessionStoreActor::new().start();
        let session = store.send(CreateSession).await.unwrap();

        let flags = json!({ "isAdmin": true }).as_object().cloned().unwrap();
        let updated = store
            .send(UpdateSessionFlags { session_id: session.session_id.clone(), flags })
            .await
            .unwrap();
        match updated {
            SessionResult::Success(found) => assert!(found.flag_is_true("/isAdmin")),
            other => panic!("expected session, got {:?}", other),
        }

        assert!(store.send(DestroySession { session_id: session.session_id.clone() }).await.unwrap());
        assert!(!store.send(DestroySession { session_id: session.session_id }).await.unwrap());
    }

    #[actix_web::test]
    async fn test_metrics_split_by_authentication() {
        let store = SessionStoreActor::new().start();
        store.send(CreateSession).await.unwrap();
        store
            .send(StartAuthenticatedSession { identity: admin_identity(), replaces: None })
            .await
            .unwrap();

        let metrics = store.send(GetSessionMetrics).await.unwrap();
        assert_eq!(metrics.total_sessions, 2);
        assert_eq!(metrics.anonymous_sessions, 1);
        assert_eq!(metrics.authenticated_sessions, 1);
    }
}
