//! Points transaction composer.
//!
//! Accumulates pending point adjustments for one member across the two
//! product categories before a single submit to the API. One instance lives
//! in the session for the duration of one open dialog: created empty when the
//! dialog opens, discarded on close or successful submit.
//!
//! Unit sizes: EARN moves 1 point per tap (1 bottle = 1 point), REDEEM moves
//! 5 points per tap (1 bottle = 5 points). The REDEEM guard runs before every
//! increment - the backend is the final authority, but the UI must not let a
//! user draft an impossible redemption.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use posme_core::{Member, MemberId, ProductType, TransactionAction, redeemable_bottles};

use crate::posme::types::{ProductEntry, TransactionRequest};

/// Composer-level rejections. All are handled locally, before any network
/// call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComposerError {
    /// REDEEM increment would exceed the member's stored balance.
    #[error(
        "Not enough {} points: balance {balance}, {max_bottles} bottle(s) redeemable, {drafted_bottles} already selected",
        .product_type.label()
    )]
    InsufficientPoints {
        product_type: ProductType,
        balance: i64,
        max_bottles: i64,
        drafted_bottles: i64,
    },

    /// Submit attempted with no entries in the draft.
    #[error("Select at least one bottle first")]
    EmptyDraft,

    /// Submit attempted with a blank receipt number.
    #[error("Receipt number is required")]
    MissingReceiptNumber,
}

/// The member fields the composer needs: identity plus the stored balances
/// the REDEEM guard checks against. Taken from the already-loaded member
/// list, not re-fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub id: MemberId,
    pub name: String,
    pub last4: String,
    pub points_1_0_liter: i64,
    pub points_1_5_liter: i64,
}

impl MemberSnapshot {
    /// Stored balance for one product type.
    #[must_use]
    pub const fn points_for(&self, product_type: ProductType) -> i64 {
        match product_type {
            ProductType::OneLiter => self.points_1_0_liter,
            ProductType::OneAndHalfLiter => self.points_1_5_liter,
        }
    }
}

impl From<&Member> for MemberSnapshot {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            last4: member.last4.clone(),
            points_1_0_liter: member.points_1_0_liter,
            points_1_5_liter: member.points_1_5_liter,
        }
    }
}

/// One drafted adjustment. At most one entry exists per product type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    pub product_type: ProductType,
    pub points: i64,
}

/// Per-dialog accumulator of pending point adjustments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionComposer {
    action: TransactionAction,
    member: MemberSnapshot,
    entries: Vec<DraftEntry>,
    receipt_number: String,
}

impl TransactionComposer {
    /// Create an empty draft for one member and action.
    #[must_use]
    pub const fn new(action: TransactionAction, member: MemberSnapshot) -> Self {
        Self {
            action,
            member,
            entries: Vec::new(),
            receipt_number: String::new(),
        }
    }

    #[must_use]
    pub const fn action(&self) -> TransactionAction {
        self.action
    }

    #[must_use]
    pub const fn member(&self) -> &MemberSnapshot {
        &self.member
    }

    #[must_use]
    pub fn entries(&self) -> &[DraftEntry] {
        &self.entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drafted points for one product type (0 when no entry exists).
    #[must_use]
    pub fn points_for(&self, product_type: ProductType) -> i64 {
        self.entries
            .iter()
            .find(|entry| entry.product_type == product_type)
            .map_or(0, |entry| entry.points)
    }

    /// Drafted bottles for one product type.
    #[must_use]
    pub fn bottles_for(&self, product_type: ProductType) -> i64 {
        self.points_for(product_type) / self.action.points_per_bottle()
    }

    /// Total drafted points across both product types.
    #[must_use]
    pub fn total_points(&self) -> i64 {
        self.entries.iter().map(|entry| entry.points).sum()
    }

    #[must_use]
    pub fn receipt_number(&self) -> &str {
        &self.receipt_number
    }

    pub fn set_receipt_number(&mut self, receipt_number: impl Into<String>) {
        self.receipt_number = receipt_number.into();
    }

    /// Add one bottle's worth of points for a product type.
    ///
    /// # Errors
    ///
    /// On REDEEM, rejects without changing state when the running total for
    /// the product type would exceed the member's stored balance.
    pub fn increment(&mut self, product_type: ProductType) -> Result<(), ComposerError> {
        let unit = self.action.points_per_bottle();

        if self.action == TransactionAction::Redeem {
            let balance = self.member.points_for(product_type);
            let drafted = self.points_for(product_type);
            if drafted + unit > balance {
                return Err(ComposerError::InsufficientPoints {
                    product_type,
                    balance,
                    max_bottles: redeemable_bottles(balance),
                    drafted_bottles: drafted / unit,
                });
            }
        }

        match self
            .entries
            .iter_mut()
            .find(|entry| entry.product_type == product_type)
        {
            Some(entry) => entry.points += unit,
            None => self.entries.push(DraftEntry {
                product_type,
                points: unit,
            }),
        }
        Ok(())
    }

    /// Remove one bottle's worth of points for a product type.
    ///
    /// When the remaining total would be zero or less, the entry is removed
    /// entirely rather than stored as zero. Decrementing a product type with
    /// no entry is a no-op.
    pub fn decrement(&mut self, product_type: ProductType) {
        let unit = self.action.points_per_bottle();

        if let Some(index) = self
            .entries
            .iter()
            .position(|entry| entry.product_type == product_type)
        {
            if let Some(entry) = self.entries.get_mut(index) {
                if entry.points > unit {
                    entry.points -= unit;
                } else {
                    self.entries.remove(index);
                }
            }
        }
    }

    /// Human-readable receipt description: per-product-type summaries,
    /// concatenated in display order.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut parts = Vec::new();

        for product_type in ProductType::ALL {
            let points = self.points_for(product_type);
            if points == 0 {
                continue;
            }
            let part = match self.action {
                TransactionAction::Earn => {
                    format!("Earn {}: {points} bottle(s)", product_type.label())
                }
                TransactionAction::Redeem => format!(
                    "Redeem {}: {} bottle(s) ({points} pts)",
                    product_type.label(),
                    points / self.action.points_per_bottle(),
                ),
            };
            parts.push(part);
        }

        parts.join(", ")
    }

    /// Validate the draft and serialize it into the transaction request.
    ///
    /// # Errors
    ///
    /// Rejected locally (no network call) when the draft has no entries or
    /// the receipt number is blank.
    pub fn finish(&self) -> Result<TransactionRequest, ComposerError> {
        if self.is_empty() {
            return Err(ComposerError::EmptyDraft);
        }
        let receipt_number = self.receipt_number.trim();
        if receipt_number.is_empty() {
            return Err(ComposerError::MissingReceiptNumber);
        }

        Ok(TransactionRequest {
            member_id: self.member.id.clone(),
            action: self.action,
            products: self
                .entries
                .iter()
                .map(|entry| ProductEntry {
                    product_type: entry.product_type,
                    points: entry.points,
                })
                .collect(),
            receipt_text: format!("{} - {receipt_number}", self.describe()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(points_1_0: i64, points_1_5: i64) -> MemberSnapshot {
        MemberSnapshot {
            id: MemberId::new("m_1"),
            name: "Test Member".to_string(),
            last4: "1234".to_string(),
            points_1_0_liter: points_1_0,
            points_1_5_liter: points_1_5,
        }
    }

    #[test]
    fn test_redeem_guard_rejects_third_bottle_on_12_points() {
        let mut composer =
            TransactionComposer::new(TransactionAction::Redeem, snapshot(12, 0));

        composer
            .increment(ProductType::OneLiter)
            .expect("first bottle");
        composer
            .increment(ProductType::OneLiter)
            .expect("second bottle");
        assert_eq!(composer.points_for(ProductType::OneLiter), 10);

        // Third bottle would require 15 > 12
        let err = composer
            .increment(ProductType::OneLiter)
            .expect_err("third bottle must be rejected");
        assert_eq!(
            err,
            ComposerError::InsufficientPoints {
                product_type: ProductType::OneLiter,
                balance: 12,
                max_bottles: 2,
                drafted_bottles: 2,
            }
        );

        // Rejection leaves the draft unchanged
        assert_eq!(composer.points_for(ProductType::OneLiter), 10);
    }

    #[test]
    fn test_redeem_guard_is_per_product_type() {
        let mut composer = TransactionComposer::new(TransactionAction::Redeem, snapshot(5, 10));

        composer
            .increment(ProductType::OneLiter)
            .expect("1.0 L bottle");
        composer
            .increment(ProductType::OneLiter)
            .expect_err("1.0 L exhausted");

        // 1.5 L balance is independent
        composer
            .increment(ProductType::OneAndHalfLiter)
            .expect("1.5 L bottle");
        composer
            .increment(ProductType::OneAndHalfLiter)
            .expect("second 1.5 L bottle");
    }

    #[test]
    fn test_earn_increments_unbounded_by_balance() {
        let mut composer = TransactionComposer::new(TransactionAction::Earn, snapshot(0, 0));

        for _ in 0..100 {
            composer
                .increment(ProductType::OneLiter)
                .expect("earn is unbounded");
        }
        assert_eq!(composer.points_for(ProductType::OneLiter), 100);
        assert_eq!(composer.bottles_for(ProductType::OneLiter), 100);
    }

    #[test]
    fn test_decrement_below_unit_removes_entry() {
        let mut composer = TransactionComposer::new(TransactionAction::Redeem, snapshot(0, 5));

        composer
            .increment(ProductType::OneAndHalfLiter)
            .expect("one bottle");
        assert_eq!(composer.points_for(ProductType::OneAndHalfLiter), 5);

        composer.decrement(ProductType::OneAndHalfLiter);
        assert!(composer.is_empty());
        assert!(composer.entries().is_empty());
    }

    #[test]
    fn test_decrement_keeps_entry_above_unit() {
        let mut composer = TransactionComposer::new(TransactionAction::Earn, snapshot(0, 0));

        composer.increment(ProductType::OneLiter).expect("earn");
        composer.increment(ProductType::OneLiter).expect("earn");
        composer.decrement(ProductType::OneLiter);
        assert_eq!(composer.points_for(ProductType::OneLiter), 1);

        // No-op on a product type with no entry
        composer.decrement(ProductType::OneAndHalfLiter);
        assert_eq!(composer.total_points(), 1);
    }

    #[test]
    fn test_finish_rejects_empty_draft() {
        let composer = TransactionComposer::new(TransactionAction::Earn, snapshot(0, 0));
        assert_eq!(composer.finish(), Err(ComposerError::EmptyDraft));
    }

    #[test]
    fn test_finish_rejects_blank_receipt_number() {
        let mut composer = TransactionComposer::new(TransactionAction::Earn, snapshot(0, 0));
        composer.increment(ProductType::OneLiter).expect("earn");
        composer.set_receipt_number("   ");
        assert_eq!(composer.finish(), Err(ComposerError::MissingReceiptNumber));
    }

    #[test]
    fn test_finish_serializes_entries_and_receipt_text() {
        let mut composer = TransactionComposer::new(TransactionAction::Redeem, snapshot(10, 5));
        composer.increment(ProductType::OneLiter).expect("redeem");
        composer.increment(ProductType::OneLiter).expect("redeem");
        composer
            .increment(ProductType::OneAndHalfLiter)
            .expect("redeem");
        composer.set_receipt_number("5-99925");

        let request = composer.finish().expect("valid draft");
        assert_eq!(request.member_id, MemberId::new("m_1"));
        assert_eq!(request.action, TransactionAction::Redeem);
        assert_eq!(
            request.products,
            vec![
                ProductEntry {
                    product_type: ProductType::OneLiter,
                    points: 10,
                },
                ProductEntry {
                    product_type: ProductType::OneAndHalfLiter,
                    points: 5,
                },
            ]
        );
        assert_eq!(
            request.receipt_text,
            "Redeem 1.0 L: 2 bottle(s) (10 pts), Redeem 1.5 L: 1 bottle(s) (5 pts) - 5-99925"
        );
    }

    #[test]
    fn test_describe_earn() {
        let mut composer = TransactionComposer::new(TransactionAction::Earn, snapshot(0, 0));
        composer.increment(ProductType::OneAndHalfLiter).expect("earn");
        composer.increment(ProductType::OneAndHalfLiter).expect("earn");
        assert_eq!(composer.describe(), "Earn 1.5 L: 2 bottle(s)");
    }
}
