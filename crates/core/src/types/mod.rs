//! Core types for POS ME web.
//!
//! These mirror the records owned by the external POS ME backend. The web
//! tier only displays them and requests mutations; nothing here is computed
//! locally.

pub mod id;
pub mod member;
pub mod staff;
pub mod transaction;

pub use id::{MemberId, StaffUserId, TransactionId};
pub use member::Member;
pub use staff::StaffUser;
pub use transaction::{ProductType, Transaction, TransactionAction, redeemable_bottles};
