//! Ledger store abstraction.
//!
//! The store is the single source of truth for expenses and splits. Writes
//! that must land together go through a [`LedgerTransaction`]: nothing a
//! transaction wrote is visible until [`LedgerTransaction::commit`], and
//! dropping an uncommitted transaction discards it.

pub mod memory;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use roomie_shared::types::{Amount, ExpenseId, GroupId, SplitId, TenantId, UserId};

use crate::types::{
    Expense, ExpensePatch, Group, NewExpense, NewSplit, Split, SplitPatch, SplitStatus, SplitView,
    Tenant,
};

pub use memory::MemoryLedgerStore;

/// Errors raised by a store implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Store connection failed: {0}")]
    Connection(String),

    /// A row violated a constraint (foreign key, check, unique).
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A query failed.
    #[error("Query failed: {0}")]
    Query(String),

    /// Beginning or committing a transaction failed.
    #[error("Transaction failed: {0}")]
    Transaction(String),
}

/// Which side of a split a tenant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitParty {
    /// Tenant owes the split (`assigned_to`).
    Payer(TenantId),
    /// Tenant is owed the split (`assigned_by`).
    Payee(TenantId),
    /// Tenant is on either side.
    Either(TenantId),
}

/// Result ordering for split queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitOrder {
    /// Most recently created first.
    #[default]
    NewestFirst,
    /// Oldest first.
    OldestFirst,
    /// Most recently settled first.
    PaidDateDesc,
}

/// Filter for split reads and aggregates. Empty `statuses` matches any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitQuery {
    /// Restrict to one expense.
    pub expense_id: Option<ExpenseId>,
    /// Restrict to one tenant's side.
    pub party: Option<SplitParty>,
    /// Allowed statuses.
    pub statuses: Vec<SplitStatus>,
    /// Ordering for list reads.
    pub order: SplitOrder,
}

impl SplitQuery {
    /// Splits of one expense, oldest first.
    #[must_use]
    pub fn for_expense(expense_id: ExpenseId) -> Self {
        Self {
            expense_id: Some(expense_id),
            order: SplitOrder::OldestFirst,
            ..Self::default()
        }
    }

    /// Every split a tenant owes, regardless of status.
    #[must_use]
    pub fn assigned_to(tenant_id: TenantId) -> Self {
        Self {
            party: Some(SplitParty::Payer(tenant_id)),
            ..Self::default()
        }
    }

    /// Open splits a tenant owes to others.
    #[must_use]
    pub fn to_pay(tenant_id: TenantId) -> Self {
        Self {
            party: Some(SplitParty::Payer(tenant_id)),
            statuses: SplitStatus::OPEN.to_vec(),
            ..Self::default()
        }
    }

    /// Open splits others owe to a tenant.
    #[must_use]
    pub fn to_receive(tenant_id: TenantId) -> Self {
        Self {
            party: Some(SplitParty::Payee(tenant_id)),
            statuses: SplitStatus::OPEN.to_vec(),
            ..Self::default()
        }
    }

    /// Settled splits with the tenant on either side.
    #[must_use]
    pub fn history(tenant_id: TenantId) -> Self {
        Self {
            party: Some(SplitParty::Either(tenant_id)),
            statuses: vec![SplitStatus::Paid],
            order: SplitOrder::PaidDateDesc,
            ..Self::default()
        }
    }

    /// Restricts the query to a single status.
    #[must_use]
    pub fn with_status(mut self, status: SplitStatus) -> Self {
        self.statuses = vec![status];
        self
    }

    /// Returns true if the split passes every filter.
    #[must_use]
    pub fn matches(&self, split: &Split) -> bool {
        if self.expense_id.is_some_and(|id| id != split.expense_id) {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&split.status) {
            return false;
        }
        match self.party {
            None => true,
            Some(SplitParty::Payer(t)) => split.assigned_to == t,
            Some(SplitParty::Payee(t)) => split.assigned_by == Some(t),
            Some(SplitParty::Either(t)) => split.assigned_to == t || split.assigned_by == Some(t),
        }
    }
}

/// Sum and count of the splits matching a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitTotals {
    /// Sum of `split_amount`, zero when nothing matches.
    pub total: Amount,
    /// Number of matching splits.
    pub count: u64,
}

/// Persistence for expenses, splits, and the tenant/group records they
/// reference.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Opens a transaction for writes that must land together.
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError>;

    // ========== Groups & Tenants ==========

    /// Finds a group by ID.
    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError>;

    /// Finds a tenant by ID.
    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError>;

    /// Finds the tenant record belonging to a user account.
    async fn find_tenant_by_user(&self, user_id: UserId) -> Result<Option<Tenant>, StoreError>;

    /// Lists the tenants belonging to a group.
    async fn list_group_tenants(&self, group_id: GroupId) -> Result<Vec<Tenant>, StoreError>;

    // ========== Expenses ==========

    /// Finds an expense by ID.
    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError>;

    /// Lists a group's expenses, newest first.
    async fn list_expenses_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, StoreError>;

    /// Lists expenses whose category matches case-insensitively, newest first.
    async fn list_expenses_by_category(&self, category: &str)
    -> Result<Vec<Expense>, StoreError>;

    /// Updates expense fields; returns `None` if the expense does not exist.
    async fn update_expense(
        &self,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError>;

    /// Sums `receipt_total` over a group's expenses; zero when there are none.
    async fn sum_expenses_by_group(&self, group_id: GroupId) -> Result<Amount, StoreError>;

    // ========== Splits ==========

    /// Finds a split by ID.
    async fn find_split(&self, id: SplitId) -> Result<Option<Split>, StoreError>;

    /// Lists splits matching a query.
    async fn list_splits(&self, query: &SplitQuery) -> Result<Vec<Split>, StoreError>;

    /// Lists splits matching a query, joined with their parent expense.
    async fn list_split_views(&self, query: &SplitQuery) -> Result<Vec<SplitView>, StoreError>;

    /// Sums and counts splits matching a query without loading them.
    async fn summarize_splits(&self, query: &SplitQuery) -> Result<SplitTotals, StoreError>;

    /// Updates split fields; returns `None` if the split does not exist.
    async fn update_split(&self, id: SplitId, patch: SplitPatch)
    -> Result<Option<Split>, StoreError>;

    /// Deletes a split; returns `false` if it did not exist.
    async fn delete_split(&self, id: SplitId) -> Result<bool, StoreError>;
}

/// A unit of writes that becomes visible all at once on commit.
#[async_trait]
pub trait LedgerTransaction: Send {
    /// Inserts an expense row.
    async fn insert_expense(&mut self, expense: NewExpense) -> Result<Expense, StoreError>;

    /// Inserts split rows.
    async fn insert_splits(&mut self, splits: Vec<NewSplit>) -> Result<Vec<Split>, StoreError>;

    /// Deletes an expense and all of its splits; returns `false` if the
    /// expense did not exist.
    async fn delete_expense(&mut self, id: ExpenseId) -> Result<bool, StoreError>;

    /// Makes every write of this transaction visible.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}
