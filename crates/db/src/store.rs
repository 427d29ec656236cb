//! PostgreSQL-backed ledger store.

use async_trait::async_trait;
use sea_orm::{DatabaseConnection, DatabaseTransaction, DbErr, SqlErr, TransactionTrait};
use tracing::error;

use roomie_core::store::{LedgerStore, LedgerTransaction, SplitQuery, SplitTotals, StoreError};
use roomie_core::types::{
    Expense, ExpensePatch, Group, NewExpense, NewSplit, Split, SplitPatch, SplitView, Tenant,
};
use roomie_shared::types::{Amount, ExpenseId, GroupId, SplitId, TenantId, UserId};

use crate::entities::{expenses, splits};
use crate::repositories::{ExpenseRepository, SplitRepository, TenantRepository};

/// Maps a database error onto the store's error kinds.
fn store_error(err: DbErr) -> StoreError {
    if let Some(
        SqlErr::ForeignKeyConstraintViolation(msg) | SqlErr::UniqueConstraintViolation(msg),
    ) = err.sql_err()
    {
        return StoreError::Constraint(msg);
    }

    match err {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => StoreError::Connection(err.to_string()),
        other => {
            let msg = other.to_string();
            if msg.contains("violates check constraint") {
                StoreError::Constraint(msg)
            } else {
                StoreError::Query(msg)
            }
        }
    }
}

fn transaction_error(err: DbErr) -> StoreError {
    error!(error = %err, "Ledger transaction failed");
    StoreError::Transaction(err.to_string())
}

fn into_view((split, expense): (splits::Model, expenses::Model)) -> SplitView {
    SplitView {
        split: split.into(),
        expense_title: expense.title,
        expense_category: expense.category,
        group_id: expense.group_id.into(),
    }
}

/// Ledger store over a `SeaORM` connection pool.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    expenses: ExpenseRepository,
    splits: SplitRepository,
    tenants: TenantRepository,
}

impl PgLedgerStore {
    /// Creates a store sharing the given connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            expenses: ExpenseRepository::new(db.clone()),
            splits: SplitRepository::new(db.clone()),
            tenants: TenantRepository::new(db.clone()),
            db,
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError> {
        let txn = self.db.begin().await.map_err(transaction_error)?;
        Ok(Box::new(PgLedgerTransaction { txn }))
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        let group = self
            .tenants
            .find_group(id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(group.map(Into::into))
    }

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        let tenant = self
            .tenants
            .find_tenant(id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(tenant.map(Into::into))
    }

    async fn find_tenant_by_user(&self, user_id: UserId) -> Result<Option<Tenant>, StoreError> {
        let tenant = self
            .tenants
            .find_by_user(user_id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(tenant.map(Into::into))
    }

    async fn list_group_tenants(&self, group_id: GroupId) -> Result<Vec<Tenant>, StoreError> {
        let tenants = self
            .tenants
            .list_by_group(group_id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(tenants.into_iter().map(Into::into).collect())
    }

    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        let expense = self
            .expenses
            .find_by_id(id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(expense.map(Into::into))
    }

    async fn list_expenses_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, StoreError> {
        let expenses = self
            .expenses
            .list_by_group(group_id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(expenses.into_iter().map(Into::into).collect())
    }

    async fn list_expenses_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Expense>, StoreError> {
        let expenses = self
            .expenses
            .list_by_category(category)
            .await
            .map_err(store_error)?;
        Ok(expenses.into_iter().map(Into::into).collect())
    }

    async fn update_expense(
        &self,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        let expense = self
            .expenses
            .update(id.into_inner(), patch)
            .await
            .map_err(store_error)?;
        Ok(expense.map(Into::into))
    }

    async fn sum_expenses_by_group(&self, group_id: GroupId) -> Result<Amount, StoreError> {
        let total = self
            .expenses
            .sum_by_group(group_id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(Amount::from_decimal(total))
    }

    async fn find_split(&self, id: SplitId) -> Result<Option<Split>, StoreError> {
        let split = self
            .splits
            .find_by_id(id.into_inner())
            .await
            .map_err(store_error)?;
        Ok(split.map(Into::into))
    }

    async fn list_splits(&self, query: &SplitQuery) -> Result<Vec<Split>, StoreError> {
        let splits = self.splits.list(query).await.map_err(store_error)?;
        Ok(splits.into_iter().map(Into::into).collect())
    }

    async fn list_split_views(&self, query: &SplitQuery) -> Result<Vec<SplitView>, StoreError> {
        let rows = self
            .splits
            .list_with_expense(query)
            .await
            .map_err(store_error)?;
        Ok(rows.into_iter().map(into_view).collect())
    }

    async fn summarize_splits(&self, query: &SplitQuery) -> Result<SplitTotals, StoreError> {
        let (total, count) = self.splits.totals(query).await.map_err(store_error)?;
        Ok(SplitTotals {
            total: Amount::from_decimal(total),
            count,
        })
    }

    async fn update_split(
        &self,
        id: SplitId,
        patch: SplitPatch,
    ) -> Result<Option<Split>, StoreError> {
        let split = self
            .splits
            .update(id.into_inner(), patch)
            .await
            .map_err(store_error)?;
        Ok(split.map(Into::into))
    }

    async fn delete_split(&self, id: SplitId) -> Result<bool, StoreError> {
        self.splits
            .delete(id.into_inner())
            .await
            .map_err(store_error)
    }
}

/// A database transaction. Dropping it without commit rolls back.
pub struct PgLedgerTransaction {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LedgerTransaction for PgLedgerTransaction {
    async fn insert_expense(&mut self, expense: NewExpense) -> Result<Expense, StoreError> {
        let model = ExpenseRepository::insert(&self.txn, expense)
            .await
            .map_err(store_error)?;
        Ok(model.into())
    }

    async fn insert_splits(&mut self, splits: Vec<NewSplit>) -> Result<Vec<Split>, StoreError> {
        let models = SplitRepository::insert_many(&self.txn, splits)
            .await
            .map_err(store_error)?;
        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn delete_expense(&mut self, id: ExpenseId) -> Result<bool, StoreError> {
        ExpenseRepository::delete_with_splits(&self.txn, id.into_inner())
            .await
            .map_err(store_error)
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(transaction_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    use crate::entities::sea_orm_active_enums::SplitStatus as DbSplitStatus;
    use roomie_core::types::SplitStatus;

    fn expense_model() -> expenses::Model {
        let now = Utc::now().into();
        expenses::Model {
            id: Uuid::now_v7(),
            category: "Utilities".to_string(),
            title: "Electricity".to_string(),
            description: None,
            receipt_total: dec!(120.5),
            group_id: Uuid::now_v7(),
            created_by: Uuid::now_v7(),
            created_at: now,
            updated_at: now,
        }
    }

    fn split_model(expense_id: Uuid) -> splits::Model {
        let now = Utc::now().into();
        splits::Model {
            id: Uuid::now_v7(),
            status: DbSplitStatus::Pending,
            split_amount: dec!(40.17),
            assigned_to: Uuid::now_v7(),
            assigned_by: None,
            paid_date: None,
            expense_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_expense_model_converts_to_domain() {
        let model = expense_model();
        let expense: Expense = model.clone().into();

        assert_eq!(expense.id.into_inner(), model.id);
        assert_eq!(expense.receipt_total.to_string(), "120.50");
        assert_eq!(expense.created_by.into_inner(), model.created_by);
    }

    #[test]
    fn test_split_view_takes_expense_fields() {
        let expense = expense_model();
        let split = split_model(expense.id);
        let view = into_view((split, expense.clone()));

        assert_eq!(view.split.status, SplitStatus::Pending);
        assert_eq!(view.split.split_amount, Amount::from_cents(4017));
        assert_eq!(view.expense_title, "Electricity");
        assert_eq!(view.group_id.into_inner(), expense.group_id);
    }

    #[test]
    fn test_status_enum_maps_both_ways() {
        for status in [SplitStatus::Unpaid, SplitStatus::Pending, SplitStatus::Paid] {
            let db: DbSplitStatus = status.into();
            assert_eq!(SplitStatus::from(db), status);
        }
    }

    #[test]
    fn test_connection_errors_map_to_connection() {
        let err = DbErr::Conn(sea_orm::RuntimeErr::Internal("refused".to_string()));
        assert!(matches!(store_error(err), StoreError::Connection(_)));
    }

    #[test]
    fn test_other_errors_map_to_query() {
        let err = DbErr::Custom("boom".to_string());
        assert!(matches!(store_error(err), StoreError::Query(_)));

        let err = DbErr::Custom("new row violates check constraint \"splits_amount\"".to_string());
        assert!(matches!(store_error(err), StoreError::Constraint(_)));
    }
}
