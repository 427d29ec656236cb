//! `SeaORM` entity definitions.

pub mod prelude;

pub mod expenses;
pub mod groups;
pub mod sea_orm_active_enums;
pub mod splits;
pub mod tenants;
pub mod users;
