//! Split repository for split database operations.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use roomie_core::store::{SplitOrder, SplitParty, SplitQuery};
use roomie_core::types::{NewSplit, SplitPatch};

use crate::entities::sea_orm_active_enums::SplitStatus;
use crate::entities::{expenses, splits};

#[derive(Debug, FromQueryResult)]
struct TotalsRow {
    total: Option<Decimal>,
    count: i64,
}

/// Split repository for CRUD and aggregate operations.
#[derive(Debug, Clone)]
pub struct SplitRepository {
    db: DatabaseConnection,
}

impl SplitRepository {
    /// Creates a new split repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a split by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<splits::Model>, DbErr> {
        splits::Entity::find_by_id(id).one(&self.db).await
    }

    /// Lists splits matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self, query: &SplitQuery) -> Result<Vec<splits::Model>, DbErr> {
        order(filtered(query), query.order).all(&self.db).await
    }

    /// Lists splits matching a query together with their expense.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_with_expense(
        &self,
        query: &SplitQuery,
    ) -> Result<Vec<(splits::Model, expenses::Model)>, DbErr> {
        let rows = order(filtered(query), query.order)
            .find_also_related(expenses::Entity)
            .all(&self.db)
            .await?;

        // The foreign key guarantees the expense; skip rather than fail if a
        // concurrent delete removed it between the join and the read.
        Ok(rows
            .into_iter()
            .filter_map(|(split, expense)| expense.map(|e| (split, e)))
            .collect())
    }

    /// Sums and counts splits matching a query.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn totals(&self, query: &SplitQuery) -> Result<(Decimal, u64), DbErr> {
        let row = filtered(query)
            .select_only()
            .column_as(splits::Column::SplitAmount.sum(), "total")
            .column_as(splits::Column::Id.count(), "count")
            .into_model::<TotalsRow>()
            .one(&self.db)
            .await?;

        Ok(row.map_or((Decimal::ZERO, 0), |r| {
            (
                r.total.unwrap_or(Decimal::ZERO),
                u64::try_from(r.count).unwrap_or(0),
            )
        }))
    }

    /// Applies field updates to a split. Returns `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub async fn update(&self, id: Uuid, patch: SplitPatch) -> Result<Option<splits::Model>, DbErr> {
        let Some(split) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let mut active: splits::ActiveModel = split.into();
        if let Some(status) = patch.status {
            active.status = Set(status.into());
        }
        if let Some(amount) = patch.split_amount {
            active.split_amount = Set(amount.value());
        }
        if let Some(assigned_to) = patch.assigned_to {
            active.assigned_to = Set(assigned_to.into_inner());
        }
        if let Some(assigned_by) = patch.assigned_by {
            active.assigned_by = Set(assigned_by.map(Into::into));
        }
        if let Some(paid_date) = patch.paid_date {
            active.paid_date = Set(paid_date.map(Into::into));
        }
        active.updated_at = Set(Utc::now().into());

        active.update(&self.db).await.map(Some)
    }

    /// Deletes a split. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: Uuid) -> Result<bool, DbErr> {
        let result = splits::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected > 0)
    }

    /// Inserts splits on the given connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns an error on the first failed insert.
    pub async fn insert_many<C: ConnectionTrait>(
        conn: &C,
        rows: Vec<NewSplit>,
    ) -> Result<Vec<splits::Model>, DbErr> {
        let now = Utc::now().into();
        let mut inserted = Vec::with_capacity(rows.len());

        for row in rows {
            let model = splits::ActiveModel {
                id: Set(Uuid::now_v7()),
                status: Set(row.status.into()),
                split_amount: Set(row.split_amount.value()),
                assigned_to: Set(row.assigned_to.into_inner()),
                assigned_by: Set(row.assigned_by.map(Into::into)),
                paid_date: Set(row.paid_date.map(Into::into)),
                expense_id: Set(row.expense_id.into_inner()),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(conn)
            .await?;
            inserted.push(model);
        }

        Ok(inserted)
    }
}

/// Applies the filters of a query.
fn filtered(query: &SplitQuery) -> Select<splits::Entity> {
    let mut select = splits::Entity::find();

    if let Some(expense_id) = query.expense_id {
        select = select.filter(splits::Column::ExpenseId.eq(expense_id.into_inner()));
    }
    if !query.statuses.is_empty() {
        let statuses: Vec<SplitStatus> = query.statuses.iter().map(|s| (*s).into()).collect();
        select = select.filter(splits::Column::Status.is_in(statuses));
    }
    match query.party {
        None => {}
        Some(SplitParty::Payer(tenant)) => {
            select = select.filter(splits::Column::AssignedTo.eq(tenant.into_inner()));
        }
        Some(SplitParty::Payee(tenant)) => {
            select = select.filter(splits::Column::AssignedBy.eq(tenant.into_inner()));
        }
        Some(SplitParty::Either(tenant)) => {
            select = select.filter(
                Condition::any()
                    .add(splits::Column::AssignedTo.eq(tenant.into_inner()))
                    .add(splits::Column::AssignedBy.eq(tenant.into_inner())),
            );
        }
    }

    select
}

fn order(select: Select<splits::Entity>, order: SplitOrder) -> Select<splits::Entity> {
    match order {
        SplitOrder::NewestFirst => select
            .order_by_desc(splits::Column::CreatedAt)
            .order_by_desc(splits::Column::Id),
        SplitOrder::OldestFirst => select
            .order_by_asc(splits::Column::CreatedAt)
            .order_by_asc(splits::Column::Id),
        SplitOrder::PaidDateDesc => select
            .order_by_desc(splits::Column::PaidDate)
            .order_by_desc(splits::Column::CreatedAt),
    }
}
