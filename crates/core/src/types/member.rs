//! Member (loyalty customer) record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemberId, ProductType};

/// A loyalty member, as returned by the `members` endpoints.
///
/// Fully owned and computed by the external backend - including the per-size
/// point balances and the milestone score. The web tier displays these values
/// and requests mutations; it never derives them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    /// Last four digits of the member's phone number.
    pub last4: String,
    #[serde(default)]
    pub total_points: i64,
    pub milestone_score: i64,
    pub points_1_0_liter: i64,
    pub points_1_5_liter: i64,
    pub branch: String,
    /// Opaque status string owned by the backend.
    pub status: String,
    #[serde(default)]
    pub membership_number: Option<String>,
    pub registration_receipt_number: String,
    pub welcome_bonus_claimed: bool,
    pub registered_by_staff: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Member {
    /// Current stored point balance for one product type.
    #[must_use]
    pub const fn points_for(&self, product_type: ProductType) -> i64 {
        match product_type {
            ProductType::OneLiter => self.points_1_0_liter,
            ProductType::OneAndHalfLiter => self.points_1_5_liter,
        }
    }

    /// Whether the member has at least one redeemable bottle on any size.
    #[must_use]
    pub fn can_redeem(&self) -> bool {
        ProductType::ALL
            .iter()
            .any(|&pt| crate::types::redeemable_bottles(self.points_for(pt)) > 0)
    }
}
