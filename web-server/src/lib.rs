// web-server/src/lib.rs
pub mod api;
pub mod error;
pub mod message_store;
pub mod middleware;
pub mod pages;
pub mod session_store;
pub mod utils;

use std::sync::Arc;
use actix::{Actor, Addr};
use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use common::auth::{AccessPolicy, CredentialVerifier, InMemoryUserStore, RoleResolver, UserStore};
use common::{AuthError, Config};
use message_store::MessageStore;
use middleware::SessionLoader;
use session_store::SessionStoreActor;

/// Shared handles every worker's app is built from
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub users: Arc<dyn UserStore>,
    pub verifier: CredentialVerifier,
    pub sessions: Addr<SessionStoreActor>,
    pub messages: Arc<MessageStore>,
    pub resolver: Arc<RoleResolver>,
}

impl AppState {
    /// Seed the user store and start the session store actor.
    ///
    /// Must be called from within a running actix system.
    pub fn from_config(config: Config) -> Result<Self, AuthError> {
        let users: Arc<dyn UserStore> = Arc::new(InMemoryUserStore::from_seeds(&config.users)?);

        let sessions = SessionStoreActor::new()
            .with_ttl(config.session.ttl_seconds)
            .with_cleanup_interval(config.session.cleanup_interval_seconds)
            .start();

        let resolver = Arc::new(RoleResolver::new(AccessPolicy::from(&config)));

        Ok(Self {
            verifier: CredentialVerifier::new(users.clone()),
            users,
            sessions,
            messages: Arc::new(MessageStore::new()),
            resolver,
            config: Arc::new(config),
        })
    }
}

/// Assemble the application: session loading, API, guarded admin scope, pages
pub fn build_app(
    state: &AppState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let pages_config = pages::PageConfig::from(&state.config.static_files);

    App::new()
        .app_data(web::Data::new(state.clone()))
        .wrap(SessionLoader::new(
            state.sessions.clone(),
            state.users.clone(),
            &state.config.session,
        ))
        .configure(|cfg| api::configure(cfg, state.resolver.clone()))
        .configure(|cfg| pages::configure(cfg, pages_config))
}
