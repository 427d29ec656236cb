//! Split status state machine.
//!
//! Computes the outcome of a status change without touching storage. The
//! service persists the outcome and emits the settlement event.

use chrono::{DateTime, Utc};

use crate::types::{SplitPatch, SplitStatus};

/// Outcome of a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    /// Status before the change.
    pub from: SplitStatus,
    /// Status after the change.
    pub status: SplitStatus,
    /// Paid date after the change; set exactly when `status` is paid.
    pub paid_date: Option<DateTime<Utc>>,
    /// True when the change settles the split.
    pub settles: bool,
}

impl StatusChange {
    /// Returns true if the move follows the defined lifecycle.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        SplitLifecycle::is_defined_transition(self.from, self.status)
    }

    /// Store update that applies the change.
    #[must_use]
    pub fn into_patch(self) -> SplitPatch {
        SplitPatch {
            status: Some(self.status),
            paid_date: Some(self.paid_date),
            ..SplitPatch::default()
        }
    }
}

/// Stateless transition logic for splits.
pub struct SplitLifecycle;

impl SplitLifecycle {
    /// Computes the result of moving a split from `from` to `to`.
    ///
    /// Moving to paid stamps `paid_date` (or `now` when absent). Moving to
    /// any other status clears it, including for a split that was paid.
    /// Moves outside the defined lifecycle are still applied; callers can
    /// check [`StatusChange::is_defined`].
    #[must_use]
    pub fn transition(
        from: SplitStatus,
        to: SplitStatus,
        paid_date: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> StatusChange {
        let settles = to == SplitStatus::Paid;
        StatusChange {
            from,
            status: to,
            paid_date: settles.then(|| paid_date.unwrap_or(now)),
            settles,
        }
    }

    /// Returns true for the lifecycle moves and for no-op moves.
    ///
    /// - Unpaid → Pending
    /// - Unpaid → Paid
    /// - Pending → Paid
    #[must_use]
    pub fn is_defined_transition(from: SplitStatus, to: SplitStatus) -> bool {
        from == to
            || matches!(
                (from, to),
                (SplitStatus::Unpaid, SplitStatus::Pending | SplitStatus::Paid)
                    | (SplitStatus::Pending, SplitStatus::Paid)
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rstest::rstest;

    #[test]
    fn test_paid_uses_given_date() {
        let now = Utc::now();
        let paid_at = now - Duration::days(2);

        let change =
            SplitLifecycle::transition(SplitStatus::Unpaid, SplitStatus::Paid, Some(paid_at), now);

        assert_eq!(change.status, SplitStatus::Paid);
        assert_eq!(change.paid_date, Some(paid_at));
        assert!(change.settles);
    }

    #[test]
    fn test_paid_defaults_to_now() {
        let now = Utc::now();
        let change = SplitLifecycle::transition(SplitStatus::Pending, SplitStatus::Paid, None, now);
        assert_eq!(change.paid_date, Some(now));
    }

    #[rstest]
    #[case(SplitStatus::Paid, SplitStatus::Unpaid)]
    #[case(SplitStatus::Paid, SplitStatus::Pending)]
    #[case(SplitStatus::Unpaid, SplitStatus::Pending)]
    fn test_non_paid_clears_date(#[case] from: SplitStatus, #[case] to: SplitStatus) {
        let now = Utc::now();
        // A supplied date is ignored unless the target is paid.
        let change = SplitLifecycle::transition(from, to, Some(now), now);
        assert_eq!(change.paid_date, None);
        assert!(!change.settles);
    }

    #[rstest]
    #[case(SplitStatus::Unpaid, SplitStatus::Pending, true)]
    #[case(SplitStatus::Unpaid, SplitStatus::Paid, true)]
    #[case(SplitStatus::Pending, SplitStatus::Paid, true)]
    #[case(SplitStatus::Paid, SplitStatus::Paid, true)]
    #[case(SplitStatus::Pending, SplitStatus::Unpaid, false)]
    #[case(SplitStatus::Paid, SplitStatus::Unpaid, false)]
    #[case(SplitStatus::Paid, SplitStatus::Pending, false)]
    fn test_defined_transitions(
        #[case] from: SplitStatus,
        #[case] to: SplitStatus,
        #[case] defined: bool,
    ) {
        assert_eq!(SplitLifecycle::is_defined_transition(from, to), defined);
    }

    #[test]
    fn test_into_patch_sets_status_and_date_only() {
        let now = Utc::now();
        let patch =
            SplitLifecycle::transition(SplitStatus::Paid, SplitStatus::Unpaid, None, now)
                .into_patch();

        assert_eq!(patch.status, Some(SplitStatus::Unpaid));
        assert_eq!(patch.paid_date, Some(None));
        assert_eq!(patch.split_amount, None);
        assert_eq!(patch.assigned_to, None);
    }
}
