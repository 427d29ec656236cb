//! Property-based tests for split status transitions.

use chrono::{DateTime, Duration, Utc};
use proptest::prelude::*;

use super::lifecycle::SplitLifecycle;
use crate::types::SplitStatus;

fn status() -> impl Strategy<Value = SplitStatus> {
    prop_oneof![
        Just(SplitStatus::Unpaid),
        Just(SplitStatus::Pending),
        Just(SplitStatus::Paid),
    ]
}

fn maybe_date() -> impl Strategy<Value = Option<DateTime<Utc>>> {
    proptest::option::of((0i64..10_000).prop_map(|days| Utc::now() - Duration::days(days)))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// paid_date is set if and only if the resulting status is paid.
    #[test]
    fn prop_paid_date_tracks_status(
        from in status(),
        to in status(),
        paid_date in maybe_date(),
    ) {
        let change = SplitLifecycle::transition(from, to, paid_date, Utc::now());

        prop_assert_eq!(change.status, to);
        prop_assert_eq!(change.paid_date.is_some(), to == SplitStatus::Paid);
        prop_assert_eq!(change.settles, to == SplitStatus::Paid);
    }

    /// A supplied paid date is kept verbatim when settling.
    #[test]
    fn prop_supplied_paid_date_is_kept(
        from in status(),
        paid_date in maybe_date(),
    ) {
        let now = Utc::now();
        let change = SplitLifecycle::transition(from, SplitStatus::Paid, paid_date, now);
        prop_assert_eq!(change.paid_date, Some(paid_date.unwrap_or(now)));
    }

    /// Nothing leaves paid through the defined lifecycle.
    #[test]
    fn prop_paid_is_terminal(to in status()) {
        prop_assert_eq!(
            SplitLifecycle::is_defined_transition(SplitStatus::Paid, to),
            to == SplitStatus::Paid
        );
    }
}
