//! POS ME Core - Shared types library.
//!
//! This crate provides common types used across the POS ME web components:
//! - `site` - Public marketing site
//! - `backoffice` - Staff backoffice panel
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! handling. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs and the member/staff/transaction domain types
//!   mirroring the external POS ME REST contract

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
