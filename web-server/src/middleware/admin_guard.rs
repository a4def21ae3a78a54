// web-server/src/middleware/admin_guard.rs
use std::sync::Arc;
use actix_web::{
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    Error, HttpMessage, HttpResponse,
};
use common::auth::{AccessRequest, Decision, RoleResolver};
use common::models::{AuthenticatedUser, Session};
use futures_util::future::{LocalBoxFuture, Ready, ready};
use serde_json::{json, Value};

pub const ADMIN_ACCESS_DENIED: &str = "ADMIN_ACCESS_DENIED";
pub const ADMIN_ACCESS_MESSAGE: &str = "Admin access required for message functions";
const ADMIN_ACCESS_HINT: &str = "Sign in with an administrator account and retry";

/// Body of every 403 produced by the guard
pub fn access_denied_body() -> Value {
    json!({
        "message": ADMIN_ACCESS_MESSAGE,
        "error": ADMIN_ACCESS_DENIED,
        "hint": ADMIN_ACCESS_HINT,
    })
}

/// Lets a request reach the wrapped admin handlers only when the role
/// resolver allows it; otherwise answers 403 without calling them.
#[derive(Clone)]
pub struct AdminGuard {
    resolver: Arc<RoleResolver>,
}

impl AdminGuard {
    pub fn new(resolver: Arc<RoleResolver>) -> Self {
        Self { resolver }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AdminGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AdminGuardMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AdminGuardMiddleware {
            service,
            resolver: self.resolver.clone(),
        }))
    }
}

pub struct AdminGuardMiddleware<S> {
    service: S,
    resolver: Arc<RoleResolver>,
}

impl<S> AdminGuardMiddleware<S> {
    fn decide(&self, req: &ServiceRequest) -> Decision {
        let platform_header_present = self
            .resolver
            .platform_header()
            .is_some_and(|name| req.headers().contains_key(name));

        let extensions = req.extensions();
        let request = AccessRequest::new(extensions.get::<Session>())
            .with_principal(extensions.get::<AuthenticatedUser>().map(|user| &user.0))
            .with_platform_header(platform_header_present);

        self.resolver.resolve(&request)
    }
}

impl<S, B> Service<ServiceRequest> for AdminGuardMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        match self.decide(&req) {
            Decision::Allow(grant) => {
                tracing::debug!(?grant, path = %req.path(), "Admin access granted");
                let fut = self.service.call(req);
                Box::pin(async move {
                    let res = fut.await?;
                    Ok(res.map_into_left_body())
                })
            }
            Decision::Deny => {
                tracing::info!(path = %req.path(), "Admin access denied");
                let response = HttpResponse::Forbidden().json(access_denied_body());
                Box::pin(async move { Ok(req.into_response(response).map_into_right_body()) })
            }
        }
    }
}
