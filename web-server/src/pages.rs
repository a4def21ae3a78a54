// web-server/src/pages.rs
use actix_web::{
    dev::{fn_service, ServiceRequest, ServiceResponse},
    http::header,
    web, Error, HttpRequest, HttpResponse, Result,
};
use actix_files::{Files, NamedFile};
use common::client_guard::{ClientAuthState, ProtectedRoute, Render};
use common::models::{Role, Session};
use common::StaticFilesConfig;
use std::path::PathBuf;

// Configuration for page and static file serving
#[derive(Clone)]
pub struct PageConfig {
    pub root_path: PathBuf,
    pub index_file: String,
}

impl From<&StaticFilesConfig> for PageConfig {
    fn from(config: &StaticFilesConfig) -> Self {
        Self {
            root_path: PathBuf::from(&config.path),
            index_file: config.index.clone(),
        }
    }
}

fn serve_index(req: &HttpRequest, config: &PageConfig) -> Result<HttpResponse, Error> {
    let file = NamedFile::open(config.root_path.join(&config.index_file))?;
    Ok(file.into_response(req))
}

/// Serve the SPA shell for a protected page, or redirect before it renders
fn render_protected(
    required: Role,
    req: &HttpRequest,
    session: Option<&Session>,
    config: &PageConfig,
) -> Result<HttpResponse, Error> {
    let auth = ClientAuthState::from_identity(session.and_then(|session| session.identity.as_ref()));
    let mut route = ProtectedRoute::new(required);

    match route.render(&auth, || serve_index(req, config)) {
        Render::Component(page) => page,
        Render::Redirect(target) => {
            tracing::debug!("Redirecting {} to {}", req.path(), target);
            Ok(HttpResponse::Found()
                .insert_header((header::LOCATION, target))
                .finish())
        }
    }
}

async fn admin_page(
    req: HttpRequest,
    session: Option<web::ReqData<Session>>,
    config: web::Data<PageConfig>,
) -> Result<HttpResponse, Error> {
    render_protected(Role::Admin, &req, session.as_deref(), &config)
}

async fn agent_page(
    req: HttpRequest,
    session: Option<web::ReqData<Session>>,
    config: web::Data<PageConfig>,
) -> Result<HttpResponse, Error> {
    render_protected(Role::Agent, &req, session.as_deref(), &config)
}

async fn client_page(
    req: HttpRequest,
    session: Option<web::ReqData<Session>>,
    config: web::Data<PageConfig>,
) -> Result<HttpResponse, Error> {
    render_protected(Role::Client, &req, session.as_deref(), &config)
}

// Unmatched paths get the SPA shell; the /api scope answers its own 404s
async fn spa_fallback(req: ServiceRequest, config: PageConfig) -> Result<ServiceResponse, Error> {
    let (req, _) = req.into_parts();
    let res = serve_index(&req, &config)?;
    Ok(ServiceResponse::new(req, res))
}

/// Protected page routes, static files and SPA fallback
pub fn configure(cfg: &mut web::ServiceConfig, config: PageConfig) {
    let fallback_config = config.clone();

    cfg.app_data(web::Data::new(config.clone()))
        .route("/admin", web::get().to(admin_page))
        .route("/admin/{tail:.*}", web::get().to(admin_page))
        .route("/agent-dashboard", web::get().to(agent_page))
        .route("/client-dashboard", web::get().to(client_page))
        .service(
            Files::new("/", &config.root_path)
                .index_file(config.index_file.clone())
                .prefer_utf8(true)
                .use_etag(true)
                .use_last_modified(true)
                .default_handler(fn_service(move |req: ServiceRequest| {
                    spa_fallback(req, fallback_config.clone())
                })),
        );
}
