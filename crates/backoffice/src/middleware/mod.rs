//! Middleware for the backoffice.

pub mod auth;
pub mod session;

pub use auth::{OptionalStaffAuth, RequireStaffAuth, force_login_on_unauthorized};
pub use session::create_session_layer;
