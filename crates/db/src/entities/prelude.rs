//! Entity re-exports.

pub use super::expenses::Entity as Expenses;
pub use super::groups::Entity as Groups;
pub use super::splits::Entity as Splits;
pub use super::tenants::Entity as Tenants;
pub use super::users::Entity as Users;
