//! `SeaORM` Entity for splits table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use roomie_core::types::Split;
use roomie_shared::types::Amount;

use super::sea_orm_active_enums::SplitStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "splits")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub status: SplitStatus,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub split_amount: Decimal,
    pub assigned_to: Uuid,
    pub assigned_by: Option<Uuid>,
    pub paid_date: Option<DateTimeWithTimeZone>,
    pub expense_id: Uuid,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::expenses::Entity",
        from = "Column::ExpenseId",
        to = "super::expenses::Column::Id",
        on_delete = "Cascade"
    )]
    Expenses,
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::AssignedTo",
        to = "super::tenants::Column::Id",
        on_delete = "Cascade"
    )]
    Payer,
    #[sea_orm(
        belongs_to = "super::tenants::Entity",
        from = "Column::AssignedBy",
        to = "super::tenants::Column::Id",
        on_delete = "SetNull"
    )]
    Payee,
}

impl Related<super::expenses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Expenses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Split {
    fn from(model: Model) -> Self {
        Self {
            id: model.id.into(),
            status: model.status.into(),
            split_amount: Amount::from_decimal(model.split_amount),
            assigned_to: model.assigned_to.into(),
            assigned_by: model.assigned_by.map(Into::into),
            paid_date: model.paid_date.map(Into::into),
            expense_id: model.expense_id.into(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}
