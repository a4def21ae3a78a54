pub mod auth;
pub mod client_guard;
pub mod config;
pub mod error;
pub mod models;
pub mod utils;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::utils::*;
