//! Expenses and the equal-split allocation that accompanies them.

pub mod allocation;
pub mod service;

#[cfg(test)]
mod allocation_props;

pub use allocation::{AllocationUtil, SplitAllocation, SplitAllocator};
pub use service::ExpenseService;
