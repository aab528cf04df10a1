//! Staff user record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::StaffUserId;

/// A staff user of the backoffice, as returned by `auth/login`.
///
/// Owned by the external backend; the web tier caches it alongside the
/// session token for display purposes only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaffUser {
    pub id: StaffUserId,
    pub email: String,
    /// Branch (store location) this staff account belongs to.
    pub branch: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staff_user_wire_shape() {
        let json = r#"{
            "id": "s_1",
            "email": "staff@posme.app",
            "branch": "Central",
            "created_at": "2025-01-02T03:04:05Z",
            "updated_at": "2025-01-02T03:04:05Z"
        }"#;

        let user: StaffUser = serde_json::from_str(json).expect("deserialize");
        assert_eq!(user.id.as_str(), "s_1");
        assert_eq!(user.branch, "Central");
    }
}
