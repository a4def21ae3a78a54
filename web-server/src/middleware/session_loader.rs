// web-server/src/middleware/session_loader.rs
use std::rc::Rc;
use std::sync::Arc;
use actix::Addr;
use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    error::ErrorInternalServerError,
    Error, HttpMessage,
};
use common::auth::UserStore;
use common::models::{AuthenticatedUser, SessionResult};
use common::SessionConfig;
use futures_util::future::{LocalBoxFuture, Ready, ready};
use crate::session_store::{GetSession, SessionStoreActor};

/// Cookie carrying the session id. Max-Age tracks the idle TTL, so it is
/// reissued on every request that touches a live session.
pub fn session_cookie(config: &SessionConfig, session_id: String) -> Cookie<'static> {
    Cookie::build(config.cookie_name.clone(), session_id)
        .path("/")
        .secure(config.secure_cookie)
        .http_only(true)
        .same_site(SameSite::Lax)
        .max_age(CookieDuration::seconds(config.ttl_seconds))
        .finish()
}

/// Attaches the cookie's session snapshot, and the stored user behind its
/// identity, to the request extensions before any handler or guard runs.
#[derive(Clone)]
pub struct SessionLoader {
    store: Addr<SessionStoreActor>,
    users: Arc<dyn UserStore>,
    config: Rc<SessionConfig>,
}

impl SessionLoader {
    pub fn new(store: Addr<SessionStoreActor>, users: Arc<dyn UserStore>, config: &SessionConfig) -> Self {
        Self {
            store,
            users,
            config: Rc::new(config.clone()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionLoader
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Transform = SessionLoaderMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionLoaderMiddleware {
            service: Rc::new(service),
            loader: self.clone(),
        }))
    }
}

pub struct SessionLoaderMiddleware<S> {
    service: Rc<S>,
    loader: SessionLoader,
}

impl<S, B> Service<ServiceRequest> for SessionLoaderMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<ServiceResponse<B>, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let loader = self.loader.clone();

        Box::pin(async move {
            let session_id = req.cookie(&loader.config.cookie_name).map(|cookie| cookie.value().to_string());
            let mut live_session = None;

            if let Some(session_id) = session_id {
                // Store failures are not ours to handle; they surface as a 500
                match loader.store.send(GetSession { session_id }).await {
                    Ok(SessionResult::Success(session)) => {
                        if let Some(identity) = &session.identity {
                            match loader.users.find_by_id(identity.subject_id).await {
                                Ok(Some(user)) => {
                                    req.extensions_mut().insert(AuthenticatedUser(user));
                                }
                                Ok(None) => {
                                    tracing::warn!("Session identity {} has no stored user", identity.subject_id);
                                }
                                Err(e) => {
                                    tracing::error!("Error loading session user: {}", e);
                                    return Err(ErrorInternalServerError(e));
                                }
                            }
                        }
                        live_session = Some(session.session_id.clone());
                        req.extensions_mut().insert(session);
                    },
                    Ok(SessionResult::Expired) => {
                        tracing::debug!("Request carried an expired session");
                    },
                    Ok(SessionResult::NotFound) => {
                        tracing::debug!("Request carried an unknown session");
                    },
                    Err(e) => {
                        tracing::error!("Error retrieving session: {}", e);
                        return Err(ErrorInternalServerError(e));
                    }
                }
            }

            let mut res = service.call(req).await?;

            // Login and logout write their own cookie; leave theirs alone
            if let Some(session_id) = live_session {
                let cookie_name = loader.config.cookie_name.as_str();
                let handler_set_cookie = res.response().cookies().any(|cookie| cookie.name() == cookie_name);
                if !handler_set_cookie {
                    res.response_mut()
                        .add_cookie(&session_cookie(&loader.config, session_id))
                        .map_err(ErrorInternalServerError)?;
                }
            }

            Ok(res)
        })
    }
}
