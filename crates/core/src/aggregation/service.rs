//! Tenant-scoped views over the split table.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use roomie_shared::types::UserId;

use crate::error::LedgerError;
use crate::store::{LedgerStore, SplitQuery, SplitTotals};
use crate::types::{SplitView, Tenant};

/// Totals for the three tenant views.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SplitSummary {
    /// Open splits the tenant owes.
    pub to_pay: SplitTotals,
    /// Open splits owed to the tenant.
    pub to_receive: SplitTotals,
    /// Settled splits on either side.
    pub history: SplitTotals,
}

/// Computes what a tenant owes, is owed, and has settled.
///
/// Every view is requested by user ID and resolved to that user's tenant
/// record first.
pub struct AggregationService {
    store: Arc<dyn LedgerStore>,
}

impl AggregationService {
    /// Creates a new aggregation service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Open splits the user's tenant owes to others, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TenantForUserNotFound` if the user has no tenant record.
    pub async fn to_pay(&self, user_id: UserId) -> Result<Vec<SplitView>, LedgerError> {
        let tenant = self.tenant_for_user(user_id).await?;
        Ok(self
            .store
            .list_split_views(&SplitQuery::to_pay(tenant.id))
            .await?)
    }

    /// Open splits others owe the user's tenant, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TenantForUserNotFound` if the user has no tenant record.
    pub async fn to_receive(&self, user_id: UserId) -> Result<Vec<SplitView>, LedgerError> {
        let tenant = self.tenant_for_user(user_id).await?;
        Ok(self
            .store
            .list_split_views(&SplitQuery::to_receive(tenant.id))
            .await?)
    }

    /// Settled splits with the user's tenant as payer or payee, most
    /// recently paid first.
    ///
    /// # Errors
    ///
    /// Returns `TenantForUserNotFound` if the user has no tenant record.
    pub async fn history(&self, user_id: UserId) -> Result<Vec<SplitView>, LedgerError> {
        let tenant = self.tenant_for_user(user_id).await?;
        Ok(self
            .store
            .list_split_views(&SplitQuery::history(tenant.id))
            .await?)
    }

    /// Totals and counts for the three views, each aggregated separately.
    ///
    /// # Errors
    ///
    /// Returns `TenantForUserNotFound` if the user has no tenant record.
    pub async fn summary(&self, user_id: UserId) -> Result<SplitSummary, LedgerError> {
        let tenant = self.tenant_for_user(user_id).await?;

        let summary = SplitSummary {
            to_pay: self
                .store
                .summarize_splits(&SplitQuery::to_pay(tenant.id))
                .await?,
            to_receive: self
                .store
                .summarize_splits(&SplitQuery::to_receive(tenant.id))
                .await?,
            history: self
                .store
                .summarize_splits(&SplitQuery::history(tenant.id))
                .await?,
        };

        debug!(
            tenant_id = %tenant.id,
            to_pay = %summary.to_pay.total,
            to_receive = %summary.to_receive.total,
            "Computed split summary"
        );
        Ok(summary)
    }

    /// Resolves a user account to its tenant record.
    ///
    /// # Errors
    ///
    /// Returns `TenantForUserNotFound` if the user has no tenant record.
    pub async fn tenant_for_user(&self, user_id: UserId) -> Result<Tenant, LedgerError> {
        self.store
            .find_tenant_by_user(user_id)
            .await?
            .ok_or(LedgerError::TenantForUserNotFound(user_id))
    }
}
