//! Expense repository for expense database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use roomie_core::types::{ExpensePatch, NewExpense};

use crate::entities::{expenses, splits};

#[derive(Debug, FromQueryResult)]
struct TotalRow {
    total: Option<Decimal>,
}

/// Expense repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    db: DatabaseConnection,
}

impl ExpenseRepository {
    /// Creates a new expense repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<expenses::Model>, DbErr> {
        expenses::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists a group's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<expenses::Model>, DbErr> {
        expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .all(&self.db)
            .await
    }

    /// Lists expenses whose category matches, ignoring case and surrounding
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_category(&self, category: &str) -> Result<Vec<expenses::Model>, DbErr> {
        let needle = category.trim().to_lowercase();
        expenses::Entity::find()
            .filter(Expr::expr(Func::lower(Expr::col(expenses::Column::Category))).eq(needle))
            .order_by_desc(expenses::Column::CreatedAt)
            .order_by_desc(expenses::Column::Id)
            .all(&self.db)
            .await
    }

    /// Sums `receipt_total` over a group's expenses.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn sum_by_group(&self, group_id: Uuid) -> Result<Decimal, DbErr> {
        let row = expenses::Entity::find()
            .filter(expenses::Column::GroupId.eq(group_id))
            .select_only()
            .column_as(expenses::Column::ReceiptTotal.sum(), "total")
            .into_model::<TotalRow>()
            .one(&self.db)
            .await?;

        Ok(row.and_then(|r| r.total).unwrap_or(Decimal::ZERO))
    }

    /// Applies field updates to an expense. Returns `None` if it does not
    /// exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update(
        &self,
        id: Uuid,
        patch: ExpensePatch,
    ) -> Result<Option<expenses::Model>, DbErr> {
        let Some(expense) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: expenses::ActiveModel = expense.into();
        if let Some(category) = patch.category {
            active.category = Set(category);
        }
        if let Some(title) = patch.title {
            active.title = Set(title);
        }
        if let Some(description) = patch.description {
            active.description = Set(description);
        }
        if let Some(total) = patch.receipt_total {
            active.receipt_total = Set(total.value());
        }
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map(Some)
    }

    /// Inserts an expense on the given connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C: ConnectionTrait>(
        conn: &C,
        expense: NewExpense,
    ) -> Result<expenses::Model, DbErr> {
        let now = Utc::now().into();
        expenses::ActiveModel {
            id: Set(Uuid::now_v7()),
            category: Set(expense.category),
            title: Set(expense.title),
            description: Set(expense.description),
            receipt_total: Set(expense.receipt_total.value()),
            group_id: Set(expense.group_id.into_inner()),
            created_by: Set(expense.created_by.into_inner()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(conn)
        .await
    }

    /// Deletes an expense after deleting its splits. Returns `false` if the
    /// expense did not exist.
    ///
    /// Run it inside a transaction so both deletes land together.
    ///
    /// # Errors
    ///
    /// Returns an error if a delete fails.
    pub async fn delete_with_splits<C: ConnectionTrait>(conn: &C, id: Uuid) -> Result<bool, DbErr> {
        splits::Entity::delete_many()
            .filter(splits::Column::ExpenseId.eq(id))
            .exec(conn)
            .await?;

        let result = expenses::Entity::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
