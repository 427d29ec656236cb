//! Ledger records and operation inputs.
//!
//! Records (`Expense`, `Split`, `Tenant`, `Group`) are what the store hands
//! back. `Create*`/`Update*` inputs are what callers hand in; they carry raw
//! decimals that the services validate into [`Amount`]s. `New*`/`*Patch`
//! values are the validated forms the store persists.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use roomie_shared::types::{Amount, ExpenseId, GroupId, SplitId, TenantId, UserId};

/// Settlement status of a split.
///
/// The defined transitions are:
/// - Unpaid → Pending (payment announced)
/// - Unpaid → Paid (settled directly)
/// - Pending → Paid (payment confirmed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitStatus {
    /// Nothing paid yet.
    Unpaid,
    /// Payment announced, awaiting confirmation.
    Pending,
    /// Settled.
    Paid,
}

impl SplitStatus {
    /// Statuses that still represent an open obligation.
    pub const OPEN: [Self; 2] = [Self::Unpaid, Self::Pending];

    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unpaid => "unpaid",
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "unpaid" => Some(Self::Unpaid),
            "pending" => Some(Self::Pending),
            "paid" => Some(Self::Paid),
            _ => None,
        }
    }

    /// Returns true while money is still owed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Unpaid | Self::Pending)
    }
}

impl fmt::Display for SplitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown split status: {s}"))
    }
}

/// A roommate group that owns expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Group ID.
    pub id: GroupId,
    /// Display name.
    pub name: String,
}

/// A renter-role user, the party on either side of a split.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    /// Tenant ID.
    pub id: TenantId,
    /// The user account this tenant record belongs to.
    pub user_id: UserId,
    /// Display name.
    pub display_name: String,
    /// Group the tenant currently belongs to.
    pub group_id: Option<GroupId>,
}

/// A shared cost paid by one tenant on behalf of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    /// Expense ID.
    pub id: ExpenseId,
    /// Free-text category label.
    pub category: String,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Receipt total, always positive.
    pub receipt_total: Amount,
    /// Owning group.
    pub group_id: GroupId,
    /// Tenant who paid the receipt.
    pub created_by: TenantId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// One participant's share of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Split {
    /// Split ID.
    pub id: SplitId,
    /// Settlement status.
    pub status: SplitStatus,
    /// Amount owed, always positive.
    pub split_amount: Amount,
    /// Tenant who owes the amount (payer).
    pub assigned_to: TenantId,
    /// Tenant who is owed the amount (payee).
    pub assigned_by: Option<TenantId>,
    /// When the split was settled. Set exactly when `status` is paid.
    pub paid_date: Option<DateTime<Utc>>,
    /// Parent expense.
    pub expense_id: ExpenseId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// An expense together with its splits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpenseWithSplits {
    /// The expense.
    #[serde(flatten)]
    pub expense: Expense,
    /// Its splits.
    pub splits: Vec<Split>,
}

/// A split annotated with what it is for, as shown in tenant views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitView {
    /// The split.
    #[serde(flatten)]
    pub split: Split,
    /// Parent expense title.
    pub expense_title: String,
    /// Parent expense category.
    pub expense_category: String,
    /// Group owning the parent expense.
    pub group_id: GroupId,
}

// ============================================================================
// Operation inputs
// ============================================================================

/// Input for creating an expense together with its splits.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExpenseInput {
    /// Free-text category label.
    pub category: String,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Receipt total.
    pub receipt_total: Decimal,
    /// Owning group.
    pub group_id: GroupId,
    /// Tenant who paid the receipt.
    pub created_by: TenantId,
    /// Tenants sharing the expense, creator included.
    pub participants: Vec<TenantId>,
}

/// Field updates for an expense. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExpenseInput {
    /// New category.
    pub category: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description; `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New receipt total. Existing splits are not recomputed.
    pub receipt_total: Option<Decimal>,
}

/// One split to create through the direct creation path.
#[derive(Debug, Clone, Deserialize)]
pub struct SplitLine {
    /// Tenant who owes the amount.
    pub assigned_to: TenantId,
    /// Tenant who is owed; defaults to the expense creator.
    pub assigned_by: Option<TenantId>,
    /// Amount owed.
    pub split_amount: Decimal,
    /// Initial status; defaults to unpaid.
    pub status: Option<SplitStatus>,
}

/// Input for creating a single split outside expense creation.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSplitInput {
    /// Parent expense.
    pub expense_id: ExpenseId,
    /// Tenant who owes the amount.
    pub assigned_to: TenantId,
    /// Tenant who is owed; defaults to the expense creator.
    pub assigned_by: Option<TenantId>,
    /// Amount owed.
    pub split_amount: Decimal,
    /// Initial status; defaults to unpaid.
    pub status: Option<SplitStatus>,
}

impl CreateSplitInput {
    /// Drops the expense reference, keeping the split line.
    #[must_use]
    pub fn into_line(self) -> (ExpenseId, SplitLine) {
        (
            self.expense_id,
            SplitLine {
                assigned_to: self.assigned_to,
                assigned_by: self.assigned_by,
                split_amount: self.split_amount,
                status: self.status,
            },
        )
    }
}

/// Field corrections for a split. Bypasses the status lifecycle.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSplitInput {
    /// New status, stored as given.
    pub status: Option<SplitStatus>,
    /// New amount.
    pub split_amount: Option<Decimal>,
    /// New payer.
    pub assigned_to: Option<TenantId>,
    /// New payee; `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_by: Option<Option<TenantId>>,
    /// New paid date; `Some(None)` clears it.
    #[serde(default, deserialize_with = "double_option")]
    pub paid_date: Option<Option<DateTime<Utc>>>,
}

/// Status change request for a split.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SplitStatusUpdate {
    /// Target status.
    pub status: SplitStatus,
    /// Settlement time when moving to paid; defaults to now.
    pub paid_date: Option<DateTime<Utc>>,
}

// ============================================================================
// Validated store writes
// ============================================================================

/// A validated expense row ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExpense {
    /// Category label.
    pub category: String,
    /// Title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Receipt total.
    pub receipt_total: Amount,
    /// Owning group.
    pub group_id: GroupId,
    /// Creator.
    pub created_by: TenantId,
}

/// A validated split row ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSplit {
    /// Parent expense.
    pub expense_id: ExpenseId,
    /// Initial status.
    pub status: SplitStatus,
    /// Amount owed.
    pub split_amount: Amount,
    /// Payer.
    pub assigned_to: TenantId,
    /// Payee.
    pub assigned_by: Option<TenantId>,
    /// Paid date, set when `status` is paid.
    pub paid_date: Option<DateTime<Utc>>,
}

/// Validated expense field updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpensePatch {
    /// New category.
    pub category: Option<String>,
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New receipt total.
    pub receipt_total: Option<Amount>,
}

/// Validated split field updates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitPatch {
    /// New status.
    pub status: Option<SplitStatus>,
    /// New amount.
    pub split_amount: Option<Amount>,
    /// New payer.
    pub assigned_to: Option<TenantId>,
    /// New payee.
    pub assigned_by: Option<Option<TenantId>>,
    /// New paid date.
    pub paid_date: Option<Option<DateTime<Utc>>>,
}

impl ExpensePatch {
    /// Applies the patch to an expense record in place.
    pub fn apply(&self, expense: &mut Expense) {
        if let Some(category) = &self.category {
            expense.category.clone_from(category);
        }
        if let Some(title) = &self.title {
            expense.title.clone_from(title);
        }
        if let Some(description) = &self.description {
            expense.description.clone_from(description);
        }
        if let Some(total) = self.receipt_total {
            expense.receipt_total = total;
        }
    }
}

impl SplitPatch {
    /// Applies the patch to a split record in place.
    pub fn apply(&self, split: &mut Split) {
        if let Some(status) = self.status {
            split.status = status;
        }
        if let Some(amount) = self.split_amount {
            split.split_amount = amount;
        }
        if let Some(assigned_to) = self.assigned_to {
            split.assigned_to = assigned_to;
        }
        if let Some(assigned_by) = self.assigned_by {
            split.assigned_by = assigned_by;
        }
        if let Some(paid_date) = self.paid_date {
            split.paid_date = paid_date;
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_status_as_str() {
        assert_eq!(SplitStatus::Unpaid.as_str(), "unpaid");
        assert_eq!(SplitStatus::Pending.as_str(), "pending");
        assert_eq!(SplitStatus::Paid.as_str(), "paid");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!(SplitStatus::parse("PAID"), Some(SplitStatus::Paid));
        assert_eq!(SplitStatus::parse("Pending"), Some(SplitStatus::Pending));
        assert_eq!("unpaid".parse::<SplitStatus>(), Ok(SplitStatus::Unpaid));
        assert_eq!(SplitStatus::parse("settled"), None);
    }

    #[test]
    fn test_status_open() {
        assert!(SplitStatus::Unpaid.is_open());
        assert!(SplitStatus::Pending.is_open());
        assert!(!SplitStatus::Paid.is_open());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SplitStatus::Pending).unwrap(),
            "\"pending\""
        );
    }

    #[test]
    fn test_update_input_distinguishes_null_from_absent() {
        let absent: UpdateExpenseInput = serde_json::from_str(r#"{"title":"Rent"}"#).unwrap();
        assert_eq!(absent.description, None);

        let cleared: UpdateExpenseInput =
            serde_json::from_str(r#"{"description":null}"#).unwrap();
        assert_eq!(cleared.description, Some(None));

        let total: UpdateExpenseInput =
            serde_json::from_str(r#"{"receipt_total":"12.50"}"#).unwrap();
        assert_eq!(total.receipt_total, Some(dec!(12.50)));
    }

    #[test]
    fn test_split_patch_apply() {
        let now = Utc::now();
        let mut split = Split {
            id: SplitId::new(),
            status: SplitStatus::Unpaid,
            split_amount: Amount::from_cents(3000),
            assigned_to: TenantId::new(),
            assigned_by: Some(TenantId::new()),
            paid_date: None,
            expense_id: ExpenseId::new(),
            created_at: now,
            updated_at: now,
        };
        let patch = SplitPatch {
            split_amount: Some(Amount::from_cents(2500)),
            assigned_by: Some(None),
            ..SplitPatch::default()
        };

        patch.apply(&mut split);

        assert_eq!(split.split_amount, Amount::from_cents(2500));
        assert_eq!(split.assigned_by, None);
        assert_eq!(split.status, SplitStatus::Unpaid);
    }
}
