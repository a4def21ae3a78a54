// web-server/src/api/mod.rs
pub mod admin;
pub mod auth;
pub mod messages;

use std::sync::Arc;
use common::auth::RoleResolver;
use crate::middleware::AdminGuard;

pub fn configure(cfg: &mut actix_web::web::ServiceConfig, resolver: Arc<RoleResolver>) {
    cfg.service(
        actix_web::web::scope("/api")
            .service(auth::login)
            .service(auth::admin_login)
            .service(auth::logout)
            .service(auth::current_user)
            .service(auth::auth_status)
            .service(messages::submit_message)
            .service(
                actix_web::web::scope("/admin")
                    .wrap(AdminGuard::new(resolver))
                    .service(admin::list_messages)
                    .service(admin::mark_message_read)
                    .service(admin::delete_message)
                    .service(admin::list_users)
                    .service(admin::create_user)
                    .service(admin::session_metrics)
            )
    );
}
