//! Tenant repository for users, groups, and tenant records.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use roomie_shared::UserRole;

use crate::entities::{groups, tenants, users};

/// Repository for the records expenses and splits reference.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    db: DatabaseConnection,
}

impl TenantRepository {
    /// Creates a new tenant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a group by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_group(&self, id: Uuid) -> Result<Option<groups::Model>, DbErr> {
        groups::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds a tenant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_tenant(&self, id: Uuid) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find_by_id(id).one(&self.db).await
    }

    /// Finds the tenant record of a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<tenants::Model>, DbErr> {
        tenants::Entity::find()
            .filter(tenants::Column::UserId.eq(user_id))
            .one(&self.db)
            .await
    }

    /// Lists the tenants of a group by display name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_group(&self, group_id: Uuid) -> Result<Vec<tenants::Model>, DbErr> {
        tenants::Entity::find()
            .filter(tenants::Column::GroupId.eq(group_id))
            .order_by_asc(tenants::Column::DisplayName)
            .order_by_asc(tenants::Column::Id)
            .all(&self.db)
            .await
    }

    /// Creates a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. on a duplicate email.
    pub async fn create_user(
        &self,
        email: &str,
        full_name: &str,
        role: UserRole,
    ) -> Result<users::Model, DbErr> {
        let now = Utc::now().into();
        users::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(email.to_string()),
            full_name: Set(full_name.to_string()),
            role: Set(role.into()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Creates a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create_group(&self, name: &str) -> Result<groups::Model, DbErr> {
        groups::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(name.to_string()),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }

    /// Creates the tenant record of a user, optionally placed in a group.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails, e.g. when the user already has
    /// a tenant record.
    pub async fn create_tenant(
        &self,
        user_id: Uuid,
        display_name: &str,
        group_id: Option<Uuid>,
    ) -> Result<tenants::Model, DbErr> {
        tenants::ActiveModel {
            id: Set(Uuid::now_v7()),
            user_id: Set(user_id),
            display_name: Set(display_name.to_string()),
            group_id: Set(group_id),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
    }
}
