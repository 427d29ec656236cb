//! Notification dispatch boundary.
//!
//! Persistence and real-time delivery of notifications live outside this
//! crate. Services hand structured events to a [`NotificationDispatcher`]
//! after their writes are durable, and a failed dispatch never undoes or
//! fails the write that triggered it.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use roomie_shared::types::TenantId;

use crate::types::{Expense, Split, Tenant};

/// Errors raised by a dispatcher.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The delivery channel is down.
    #[error("Notification channel unavailable: {0}")]
    Unavailable(String),

    /// The channel refused the event.
    #[error("Notification rejected: {0}")]
    Rejected(String),
}

/// Payload of a split settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SettlementEvent {
    /// The split, as stored after settlement.
    pub split: Split,
    /// The split's expense.
    pub expense: Expense,
    /// Tenant who paid (`assigned_to`).
    pub payer: Tenant,
    /// Tenant who was paid (`assigned_by`, or the expense creator).
    pub payee: Tenant,
}

/// Event payloads, serialized as `{"kind": ..., ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationPayload {
    /// An expense was created and split across the group.
    ExpenseCreated {
        /// The new expense.
        expense: Expense,
        /// Number of splits generated for it.
        split_count: usize,
    },
    /// A split moved to paid.
    SplitSettled(SettlementEvent),
}

impl NotificationPayload {
    /// Returns the wire name of the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ExpenseCreated { .. } => "expense_created",
            Self::SplitSettled(_) => "split_settled",
        }
    }
}

/// An event addressed to one or more tenants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    /// Tenants to deliver to.
    pub recipients: Vec<TenantId>,
    /// What happened.
    #[serde(flatten)]
    pub payload: NotificationPayload,
}

/// Capability to deliver notifications.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Delivers a notification.
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Dispatcher that only records events in the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

#[async_trait]
impl NotificationDispatcher for TracingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            kind = notification.payload.kind(),
            recipients = ?notification.recipients,
            "Notification dispatched"
        );
        Ok(())
    }
}

/// Sends a notification, logging instead of returning any failure.
///
/// Events with no recipients are dropped.
pub(crate) async fn dispatch_best_effort(
    dispatcher: &dyn NotificationDispatcher,
    notification: Notification,
) {
    if notification.recipients.is_empty() {
        return;
    }
    let kind = notification.payload.kind();
    if let Err(err) = dispatcher.notify(notification).await {
        warn!(kind, error = %err, "Notification dispatch failed");
    }
}
