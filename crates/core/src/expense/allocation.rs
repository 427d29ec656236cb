//! Equal-share split allocation.
//!
//! Amounts are stored with two fractional digits, so a total rarely divides
//! evenly. Shares are computed with the Largest Remainder Method:
//! 1. Every participant receives the per-head share rounded down to the cent
//! 2. The leftover cents (fewer than the participant count) are handed out
//!    one at a time, creator first, then the others in input order
//!
//! The sum of the shares therefore always equals the receipt total.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::*;

use roomie_shared::types::{Amount, AmountError, ExpenseId, MONEY_SCALE, TenantId};

use crate::error::LedgerError;
use crate::types::{NewSplit, SplitStatus};

/// Equal division of a total into fixed-precision units.
pub struct AllocationUtil;

impl AllocationUtil {
    /// Divides `total` into `count` shares at `decimal_places` precision.
    ///
    /// The first `remainder` shares carry one extra unit, so the shares sum
    /// to `total` rounded to `decimal_places`.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use roomie_core::expense::AllocationUtil;
    ///
    /// let shares = AllocationUtil::allocate_equal(dec!(100), 3, 2);
    /// assert_eq!(shares, vec![dec!(33.34), dec!(33.33), dec!(33.33)]);
    /// ```
    #[must_use]
    pub fn allocate_equal(total: Decimal, count: usize, decimal_places: u32) -> Vec<Decimal> {
        if count == 0 {
            return vec![];
        }

        let total = total.round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        if count == 1 {
            return vec![total];
        }

        let count_dec = Decimal::from(count);
        let unit = Decimal::new(1, decimal_places);

        let base = (total / count_dec).round_dp_with_strategy(decimal_places, RoundingStrategy::ToZero);
        let remainder = total - base * count_dec;

        let extra = (remainder / unit)
            .trunc()
            .to_usize()
            .unwrap_or(0);

        (0..count)
            .map(|i| if i < extra { base + unit } else { base })
            .collect()
    }
}

/// A computed share, before it is attached to a stored expense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitAllocation {
    /// Participant who owes the share.
    pub assigned_to: TenantId,
    /// Creator of the expense, who is owed the share.
    pub assigned_by: TenantId,
    /// Share amount.
    pub split_amount: Amount,
    /// Paid for the creator's own share, unpaid otherwise.
    pub status: SplitStatus,
    /// Set for the creator's own share.
    pub paid_date: Option<DateTime<Utc>>,
}

impl SplitAllocation {
    /// Converts the allocation into a split row for `expense_id`.
    #[must_use]
    pub fn into_new_split(self, expense_id: ExpenseId) -> NewSplit {
        NewSplit {
            expense_id,
            status: self.status,
            split_amount: self.split_amount,
            assigned_to: self.assigned_to,
            assigned_by: Some(self.assigned_by),
            paid_date: self.paid_date,
        }
    }
}

/// Computes the splits for a new expense.
pub struct SplitAllocator;

impl SplitAllocator {
    /// Splits `total` equally across `participants`.
    ///
    /// Returns one allocation per participant in input order. The creator's
    /// share is already settled at `now`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the participant list is empty, lacks
    /// the creator, or repeats a tenant, or if `total` cannot give each
    /// participant at least one cent.
    pub fn allocate(
        total: Amount,
        participants: &[TenantId],
        creator: TenantId,
        now: DateTime<Utc>,
    ) -> Result<Vec<SplitAllocation>, LedgerError> {
        if participants.is_empty() {
            return Err(LedgerError::NoParticipants);
        }
        if !participants.contains(&creator) {
            return Err(LedgerError::CreatorNotParticipant(creator));
        }
        let mut seen = HashSet::with_capacity(participants.len());
        if let Some(dup) = participants.iter().find(|p| !seen.insert(**p)) {
            return Err(LedgerError::DuplicateParticipant(*dup));
        }

        let value = total.value();
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value).into());
        }
        if value < Decimal::new(1, MONEY_SCALE) * Decimal::from(participants.len()) {
            return Err(LedgerError::TotalTooSmall {
                total: value,
                participants: participants.len(),
            });
        }

        let shares = AllocationUtil::allocate_equal(value, participants.len(), MONEY_SCALE);

        // Leftover cents sit at the front of `shares`; the creator takes the
        // first slot, everyone else keeps their input order behind it.
        let mut slot = 1;
        let allocations = participants
            .iter()
            .map(|&tenant| {
                let share = if tenant == creator {
                    shares[0]
                } else {
                    let share = shares[slot];
                    slot += 1;
                    share
                };
                let settled = tenant == creator;
                SplitAllocation {
                    assigned_to: tenant,
                    assigned_by: creator,
                    split_amount: Amount::from_decimal(share),
                    status: if settled {
                        SplitStatus::Paid
                    } else {
                        SplitStatus::Unpaid
                    },
                    paid_date: settled.then_some(now),
                }
            })
            .collect();

        Ok(allocations)
    }
}
