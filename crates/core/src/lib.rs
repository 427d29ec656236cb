//! Expense splitting and settlement engine for Roomie.
//!
//! This crate contains the business logic with ZERO web or database
//! dependencies. Persistence and notification delivery sit behind the
//! [`store::LedgerStore`] and [`notify::NotificationDispatcher`] traits so
//! services can be wired against PostgreSQL in production and against
//! [`store::MemoryLedgerStore`] in tests.
//!
//! # Modules
//!
//! - `types` - Expense, split, tenant and group records plus operation inputs
//! - `error` - Error taxonomy shared by every service
//! - `store` - Ledger store traits and the in-memory implementation
//! - `notify` - Notification dispatch boundary
//! - `expense` - Split allocation and the expense service
//! - `split` - Split lifecycle state machine and service
//! - `aggregation` - Per-tenant payer/payee roll-ups

pub mod aggregation;
pub mod error;
pub mod expense;
pub mod notify;
pub mod split;
pub mod store;
pub mod types;

#[cfg(test)]
mod testing;

pub use aggregation::{AggregationService, SplitSummary};
pub use error::{ErrorKind, LedgerError};
pub use expense::{AllocationUtil, ExpenseService, SplitAllocator};
pub use notify::{
    Notification, NotificationDispatcher, NotificationError, NotificationPayload,
    SettlementEvent, TracingNotifier,
};
pub use split::{SplitLifecycle, SplitService};
pub use store::{LedgerStore, LedgerTransaction, MemoryLedgerStore, StoreError};
