//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod expense;
pub mod split;
pub mod tenant;

pub use expense::ExpenseRepository;
pub use split::SplitRepository;
pub use tenant::TenantRepository;
