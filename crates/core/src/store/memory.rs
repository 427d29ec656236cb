//! In-memory ledger store.
//!
//! Backs the service tests and local runs without PostgreSQL. It enforces
//! the same row constraints as the relational schema (foreign keys and
//! positive amounts) so constraint failures surface the same way.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use roomie_shared::types::{Amount, ExpenseId, GroupId, SplitId, TenantId, UserId};

use super::{LedgerStore, LedgerTransaction, SplitOrder, SplitQuery, SplitTotals, StoreError};
use crate::types::{
    Expense, ExpensePatch, Group, NewExpense, NewSplit, Split, SplitPatch, SplitView, Tenant,
};

#[derive(Debug, Default)]
struct Tables {
    groups: HashMap<GroupId, Group>,
    tenants: HashMap<TenantId, Tenant>,
    expenses: HashMap<ExpenseId, Expense>,
    splits: HashMap<SplitId, Split>,
}

impl Tables {
    fn matching_splits(&self, query: &SplitQuery) -> Vec<&Split> {
        let mut splits: Vec<&Split> = self.splits.values().filter(|s| query.matches(s)).collect();
        match query.order {
            SplitOrder::NewestFirst => splits.sort_by_key(|s| Reverse((s.created_at, s.id))),
            SplitOrder::OldestFirst => splits.sort_by_key(|s| (s.created_at, s.id)),
            SplitOrder::PaidDateDesc => {
                splits.sort_by_key(|s| Reverse((s.paid_date.is_some(), s.paid_date, s.created_at)));
            }
        }
        splits
    }

    fn check_tenant(&self, id: TenantId) -> Result<(), StoreError> {
        if self.tenants.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!(
                "tenant {id} is not present in table \"tenants\""
            )))
        }
    }
}

/// Ledger store holding every table in process memory.
///
/// Cloning yields another handle to the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a group.
    pub async fn insert_group(&self, name: &str) -> Group {
        let group = Group {
            id: GroupId::new(),
            name: name.to_string(),
        };
        self.tables
            .write()
            .await
            .groups
            .insert(group.id, group.clone());
        group
    }

    /// Inserts a tenant for a fresh user account.
    pub async fn insert_tenant(&self, display_name: &str, group_id: Option<GroupId>) -> Tenant {
        let tenant = Tenant {
            id: TenantId::new(),
            user_id: UserId::new(),
            display_name: display_name.to_string(),
            group_id,
        };
        self.tables
            .write()
            .await
            .tenants
            .insert(tenant.id, tenant.clone());
        tenant
    }

    /// Number of stored expenses.
    pub async fn expense_count(&self) -> usize {
        self.tables.read().await.expenses.len()
    }

    /// Number of stored splits.
    pub async fn split_count(&self) -> usize {
        self.tables.read().await.splits.len()
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            tables: Arc::clone(&self.tables),
            writes: Vec::new(),
            staged_expenses: HashSet::new(),
        }))
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        Ok(self.tables.read().await.tenants.get(&id).cloned())
    }

    async fn find_tenant_by_user(&self, user_id: UserId) -> Result<Option<Tenant>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .tenants
            .values()
            .find(|t| t.user_id == user_id)
            .cloned())
    }

    async fn list_group_tenants(&self, group_id: GroupId) -> Result<Vec<Tenant>, StoreError> {
        let tables = self.tables.read().await;
        let mut tenants: Vec<Tenant> = tables
            .tenants
            .values()
            .filter(|t| t.group_id == Some(group_id))
            .cloned()
            .collect();
        tenants.sort_by(|a, b| a.display_name.cmp(&b.display_name));
        Ok(tenants)
    }

    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        Ok(self.tables.read().await.expenses.get(&id).cloned())
    }

    async fn list_expenses_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, StoreError> {
        let tables = self.tables.read().await;
        let mut expenses: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| Reverse((e.created_at, e.id)));
        Ok(expenses)
    }

    async fn list_expenses_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Expense>, StoreError> {
        let needle = category.trim().to_lowercase();
        let tables = self.tables.read().await;
        let mut expenses: Vec<Expense> = tables
            .expenses
            .values()
            .filter(|e| e.category.to_lowercase() == needle)
            .cloned()
            .collect();
        expenses.sort_by_key(|e| Reverse((e.created_at, e.id)));
        Ok(expenses)
    }

    async fn update_expense(
        &self,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        let mut tables = self.tables.write().await;
        let Some(expense) = tables.expenses.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(expense);
        expense.updated_at = Utc::now();
        Ok(Some(expense.clone()))
    }

    async fn sum_expenses_by_group(&self, group_id: GroupId) -> Result<Amount, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .expenses
            .values()
            .filter(|e| e.group_id == group_id)
            .map(|e| e.receipt_total)
            .sum())
    }

    async fn find_split(&self, id: SplitId) -> Result<Option<Split>, StoreError> {
        Ok(self.tables.read().await.splits.get(&id).cloned())
    }

    async fn list_splits(&self, query: &SplitQuery) -> Result<Vec<Split>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.matching_splits(query).into_iter().cloned().collect())
    }

    async fn list_split_views(&self, query: &SplitQuery) -> Result<Vec<SplitView>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .matching_splits(query)
            .into_iter()
            .filter_map(|split| {
                tables.expenses.get(&split.expense_id).map(|expense| SplitView {
                    split: split.clone(),
                    expense_title: expense.title.clone(),
                    expense_category: expense.category.clone(),
                    group_id: expense.group_id,
                })
            })
            .collect())
    }

    async fn summarize_splits(&self, query: &SplitQuery) -> Result<SplitTotals, StoreError> {
        let tables = self.tables.read().await;
        let matching = tables.splits.values().filter(|s| query.matches(s));
        let (total, count) = matching.fold((Amount::ZERO, 0u64), |(total, count), s| {
            (total + s.split_amount, count + 1)
        });
        Ok(SplitTotals { total, count })
    }

    async fn update_split(
        &self,
        id: SplitId,
        patch: SplitPatch,
    ) -> Result<Option<Split>, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(tenant) = patch.assigned_to {
            tables.check_tenant(tenant)?;
        }
        if let Some(Some(tenant)) = patch.assigned_by {
            tables.check_tenant(tenant)?;
        }
        let Some(split) = tables.splits.get_mut(&id) else {
            return Ok(None);
        };
        patch.apply(split);
        split.updated_at = Utc::now();
        Ok(Some(split.clone()))
    }

    async fn delete_split(&self, id: SplitId) -> Result<bool, StoreError> {
        Ok(self.tables.write().await.splits.remove(&id).is_some())
    }
}

#[derive(Debug)]
enum StagedWrite {
    Expense(Expense),
    Splits(Vec<Split>),
    DeleteExpense(ExpenseId),
}

/// Transaction staging writes until commit.
struct MemoryTransaction {
    tables: Arc<RwLock<Tables>>,
    writes: Vec<StagedWrite>,
    staged_expenses: HashSet<ExpenseId>,
}

#[async_trait]
impl LedgerTransaction for MemoryTransaction {
    async fn insert_expense(&mut self, expense: NewExpense) -> Result<Expense, StoreError> {
        {
            let tables = self.tables.read().await;
            if !tables.groups.contains_key(&expense.group_id) {
                return Err(StoreError::Constraint(format!(
                    "group {} is not present in table \"groups\"",
                    expense.group_id
                )));
            }
            tables.check_tenant(expense.created_by)?;
        }
        if !expense.receipt_total.is_positive() {
            return Err(StoreError::Constraint(
                "expenses_receipt_total_check".to_string(),
            ));
        }

        let now = Utc::now();
        let row = Expense {
            id: ExpenseId::new(),
            category: expense.category,
            title: expense.title,
            description: expense.description,
            receipt_total: expense.receipt_total,
            group_id: expense.group_id,
            created_by: expense.created_by,
            created_at: now,
            updated_at: now,
        };
        self.staged_expenses.insert(row.id);
        self.writes.push(StagedWrite::Expense(row.clone()));
        Ok(row)
    }

    async fn insert_splits(&mut self, splits: Vec<NewSplit>) -> Result<Vec<Split>, StoreError> {
        let tables = self.tables.read().await;
        let now = Utc::now();
        let mut rows = Vec::with_capacity(splits.len());

        for split in splits {
            if !self.staged_expenses.contains(&split.expense_id)
                && !tables.expenses.contains_key(&split.expense_id)
            {
                return Err(StoreError::Constraint(format!(
                    "expense {} is not present in table \"expenses\"",
                    split.expense_id
                )));
            }
            tables.check_tenant(split.assigned_to)?;
            if let Some(payee) = split.assigned_by {
                tables.check_tenant(payee)?;
            }
            if !split.split_amount.is_positive() {
                return Err(StoreError::Constraint(
                    "splits_split_amount_check".to_string(),
                ));
            }

            rows.push(Split {
                id: SplitId::new(),
                status: split.status,
                split_amount: split.split_amount,
                assigned_to: split.assigned_to,
                assigned_by: split.assigned_by,
                paid_date: split.paid_date,
                expense_id: split.expense_id,
                created_at: now,
                updated_at: now,
            });
        }
        drop(tables);

        self.writes.push(StagedWrite::Splits(rows.clone()));
        Ok(rows)
    }

    async fn delete_expense(&mut self, id: ExpenseId) -> Result<bool, StoreError> {
        let exists = self.staged_expenses.contains(&id)
            || self.tables.read().await.expenses.contains_key(&id);
        if exists {
            self.writes.push(StagedWrite::DeleteExpense(id));
        }
        Ok(exists)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        for write in self.writes {
            match write {
                StagedWrite::Expense(expense) => {
                    tables.expenses.insert(expense.id, expense);
                }
                StagedWrite::Splits(splits) => {
                    for split in splits {
                        tables.splits.insert(split.id, split);
                    }
                }
                StagedWrite::DeleteExpense(id) => {
                    tables.splits.retain(|_, s| s.expense_id != id);
                    tables.expenses.remove(&id);
                }
            }
        }
        Ok(())
    }
}
