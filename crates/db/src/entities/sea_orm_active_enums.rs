//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use roomie_core::types::SplitStatus as DomainSplitStatus;
use roomie_shared::UserRole as DomainUserRole;

/// `split_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "split_status")]
pub enum SplitStatus {
    /// Nothing paid yet.
    #[sea_orm(string_value = "unpaid")]
    Unpaid,
    /// Payment announced.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Settled.
    #[sea_orm(string_value = "paid")]
    Paid,
}

/// `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Platform administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Property owner.
    #[sea_orm(string_value = "owner")]
    Owner,
    /// Renter.
    #[sea_orm(string_value = "tenant")]
    Tenant,
}

impl From<SplitStatus> for DomainSplitStatus {
    fn from(status: SplitStatus) -> Self {
        match status {
            SplitStatus::Unpaid => Self::Unpaid,
            SplitStatus::Pending => Self::Pending,
            SplitStatus::Paid => Self::Paid,
        }
    }
}

impl From<DomainSplitStatus> for SplitStatus {
    fn from(status: DomainSplitStatus) -> Self {
        match status {
            DomainSplitStatus::Unpaid => Self::Unpaid,
            DomainSplitStatus::Pending => Self::Pending,
            DomainSplitStatus::Paid => Self::Paid,
        }
    }
}

impl From<DomainUserRole> for UserRole {
    fn from(role: DomainUserRole) -> Self {
        match role {
            DomainUserRole::Admin => Self::Admin,
            DomainUserRole::Owner => Self::Owner,
            DomainUserRole::Tenant => Self::Tenant,
        }
    }
}

impl From<UserRole> for DomainUserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Admin => Self::Admin,
            UserRole::Owner => Self::Owner,
            UserRole::Tenant => Self::Tenant,
        }
    }
}
