//! Loyalty-point transaction types.
//!
//! The point ledger itself is owned by the external backend; these types
//! mirror its wire contract plus the two fixed conversion rules the
//! backoffice UI needs (1 point per bottle on EARN, 5 points per bottle on
//! REDEEM).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{MemberId, StaffUserId, TransactionId};

/// Transaction direction for the loyalty-points ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionAction {
    /// Credit points for a purchase.
    Earn,
    /// Debit points for a reward.
    Redeem,
}

impl TransactionAction {
    /// Points moved by one bottle under this action.
    ///
    /// One tap in the transaction dialog adds exactly one bottle's worth of
    /// points: 1 on EARN, 5 on REDEEM.
    #[must_use]
    pub const fn points_per_bottle(self) -> i64 {
        match self {
            Self::Earn => 1,
            Self::Redeem => 5,
        }
    }
}

/// Bottle-size category with an independent point balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    #[serde(rename = "1_0_LITER")]
    OneLiter,
    #[serde(rename = "1_5_LITER")]
    OneAndHalfLiter,
}

impl ProductType {
    /// All product types, in display order.
    pub const ALL: [Self; 2] = [Self::OneLiter, Self::OneAndHalfLiter];

    /// Human-readable size label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::OneLiter => "1.0 L",
            Self::OneAndHalfLiter => "1.5 L",
        }
    }
}

impl std::fmt::Display for ProductType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// How many bottles a point balance is worth at the REDEEM rate.
#[must_use]
pub const fn redeemable_bottles(balance: i64) -> i64 {
    balance / TransactionAction::Redeem.points_per_bottle()
}

/// A single ledger entry, as returned by `transactions/branch`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub member_id: MemberId,
    pub staff_user_id: StaffUserId,
    pub action: TransactionAction,
    pub product_type: ProductType,
    pub points: i64,
    pub receipt_text: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransactionAction::Earn).expect("serialize"),
            "\"EARN\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionAction::Redeem).expect("serialize"),
            "\"REDEEM\""
        );
    }

    #[test]
    fn test_product_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ProductType::OneLiter).expect("serialize"),
            "\"1_0_LITER\""
        );
        let back: ProductType = serde_json::from_str("\"1_5_LITER\"").expect("deserialize");
        assert_eq!(back, ProductType::OneAndHalfLiter);
    }

    #[test]
    fn test_points_per_bottle() {
        assert_eq!(TransactionAction::Earn.points_per_bottle(), 1);
        assert_eq!(TransactionAction::Redeem.points_per_bottle(), 5);
    }

    #[test]
    fn test_redeemable_bottles_rounds_down() {
        assert_eq!(redeemable_bottles(0), 0);
        assert_eq!(redeemable_bottles(4), 0);
        assert_eq!(redeemable_bottles(5), 1);
        assert_eq!(redeemable_bottles(12), 2);
    }
}
