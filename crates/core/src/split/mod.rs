//! Split lifecycle: status transitions, corrections and direct creation.

pub mod lifecycle;
pub mod service;

#[cfg(test)]
mod lifecycle_props;

pub use lifecycle::{SplitLifecycle, StatusChange};
pub use service::SplitService;
