//! Service layer for the backoffice.

pub mod auth;
