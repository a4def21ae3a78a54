pub mod role;
pub mod session;
pub mod user;

pub use role::Role;
pub use session::{CanonicalIdentity, Session, SessionResult};
pub use user::{AuthenticatedUser, User};
