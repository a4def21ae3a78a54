pub mod admin_guard;
pub mod session_loader;

pub use admin_guard::AdminGuard;
pub use session_loader::SessionLoader;
