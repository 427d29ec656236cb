//! Property-based tests for split allocation.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use roomie_shared::types::{Amount, TenantId};

use super::allocation::{AllocationUtil, SplitAllocator};
use crate::types::SplitStatus;

/// Totals from 0.01 to 1,000,000.00.
fn receipt_cents() -> impl Strategy<Value = i64> {
    1i64..100_000_000i64
}

fn participant_count() -> impl Strategy<Value = usize> {
    1usize..40
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Shares always add back up to the receipt total.
    #[test]
    fn prop_split_sum_equals_total(
        cents in receipt_cents(),
        count in participant_count(),
        creator_index in any::<prop::sample::Index>(),
    ) {
        prop_assume!(cents >= i64::try_from(count).unwrap_or(i64::MAX));
        let people: Vec<TenantId> = (0..count).map(|_| TenantId::new()).collect();
        let creator = people[creator_index.index(count)];
        let total = Amount::from_cents(cents);

        let result = SplitAllocator::allocate(total, &people, creator, Utc::now()).unwrap();

        let sum: Amount = result.iter().map(|a| a.split_amount).sum();
        prop_assert_eq!(sum, total);
        prop_assert_eq!(result.len(), count);
    }

    /// Shares differ by at most one cent and are all positive.
    #[test]
    fn prop_shares_are_near_equal(
        cents in receipt_cents(),
        count in participant_count(),
    ) {
        prop_assume!(cents >= i64::try_from(count).unwrap_or(i64::MAX));
        let people: Vec<TenantId> = (0..count).map(|_| TenantId::new()).collect();

        let result =
            SplitAllocator::allocate(Amount::from_cents(cents), &people, people[0], Utc::now())
                .unwrap();

        let min = result.iter().map(|a| a.split_amount).min().unwrap();
        let max = result.iter().map(|a| a.split_amount).max().unwrap();
        prop_assert!(min.is_positive());
        prop_assert!(max.value() - min.value() <= Decimal::new(1, 2));
        // The creator never receives less than anyone else.
        prop_assert_eq!(result[0].split_amount, max);
    }

    /// Exactly one share, the creator's, starts settled.
    #[test]
    fn prop_only_creator_is_settled(
        count in participant_count(),
        creator_index in any::<prop::sample::Index>(),
    ) {
        let people: Vec<TenantId> = (0..count).map(|_| TenantId::new()).collect();
        let creator = people[creator_index.index(count)];

        let result =
            SplitAllocator::allocate(Amount::from_cents(100_000), &people, creator, Utc::now())
                .unwrap();

        for allocation in &result {
            let is_creator = allocation.assigned_to == creator;
            prop_assert_eq!(allocation.status == SplitStatus::Paid, is_creator);
            prop_assert_eq!(allocation.paid_date.is_some(), is_creator);
        }
    }

    /// The utility keeps its count and sum for any precision.
    #[test]
    fn prop_allocate_equal_preserves_sum(
        cents in receipt_cents(),
        count in 1usize..100,
    ) {
        let total = Decimal::new(cents, 2);
        let result = AllocationUtil::allocate_equal(total, count, 2);
        prop_assert_eq!(result.len(), count);
        prop_assert_eq!(result.iter().copied().sum::<Decimal>(), total);
    }
}
