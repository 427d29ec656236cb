//! Split service: direct split creation, corrections and status changes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use roomie_shared::types::{Amount, ExpenseId, SplitId, TenantId};

use super::lifecycle::SplitLifecycle;
use crate::error::LedgerError;
use crate::notify::{
    Notification, NotificationDispatcher, NotificationPayload, SettlementEvent,
    dispatch_best_effort,
};
use crate::store::{LedgerStore, SplitQuery};
use crate::types::{
    CreateSplitInput, Expense, NewSplit, Split, SplitLine, SplitPatch, SplitStatus,
    SplitStatusUpdate, UpdateSplitInput,
};

/// Manages individual splits and their settlement lifecycle.
pub struct SplitService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl SplitService {
    /// Creates a new split service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    /// Creates one split on an existing expense.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound`/`TenantNotFound` for unknown references and
    /// `InvalidAmount` for a non-positive or over-precise amount.
    pub async fn create_split(&self, input: CreateSplitInput) -> Result<Split, LedgerError> {
        let (expense_id, line) = input.into_line();
        let mut splits = self.bulk_create_splits(expense_id, vec![line]).await?;
        splits.pop().ok_or(LedgerError::NoSplits)
    }

    /// Creates several splits on an existing expense in one transaction.
    ///
    /// The payee defaults to the expense creator and the status to unpaid.
    /// Splits created as paid are stamped with the current time. The sum of
    /// the expense's splits is not checked against its total.
    ///
    /// # Errors
    ///
    /// Returns `NoSplits` for an empty list, plus the errors of
    /// [`Self::create_split`].
    pub async fn bulk_create_splits(
        &self,
        expense_id: ExpenseId,
        lines: Vec<SplitLine>,
    ) -> Result<Vec<Split>, LedgerError> {
        if lines.is_empty() {
            return Err(LedgerError::NoSplits);
        }
        let expense = self.expense(expense_id).await?;

        let now = Utc::now();
        let mut rows = Vec::with_capacity(lines.len());
        for line in lines {
            rows.push(self.prepare_line(&expense, line, now).await?);
        }

        let mut txn = self.store.begin().await?;
        let splits = txn.insert_splits(rows).await?;
        txn.commit().await?;

        info!(expense_id = %expense_id, count = splits.len(), "Splits created");
        Ok(splits)
    }

    /// Gets a split by ID.
    ///
    /// # Errors
    ///
    /// Returns `SplitNotFound` if the split does not exist.
    pub async fn get_split(&self, id: SplitId) -> Result<Split, LedgerError> {
        self.store
            .find_split(id)
            .await?
            .ok_or(LedgerError::SplitNotFound(id))
    }

    /// Lists an expense's splits, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if the expense does not exist.
    pub async fn get_splits_by_expense(
        &self,
        expense_id: ExpenseId,
    ) -> Result<Vec<Split>, LedgerError> {
        self.expense(expense_id).await?;
        Ok(self
            .store
            .list_splits(&SplitQuery::for_expense(expense_id))
            .await?)
    }

    /// Lists every split a tenant owes, in any status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `TenantNotFound` if the tenant does not exist.
    pub async fn get_splits_by_tenant(&self, tenant_id: TenantId) -> Result<Vec<Split>, LedgerError> {
        self.tenant(tenant_id).await?;
        let splits = self
            .store
            .list_splits(&SplitQuery::assigned_to(tenant_id))
            .await?;
        debug!(tenant_id = %tenant_id, count = splits.len(), "Listed tenant splits");
        Ok(splits)
    }

    /// Lists an expense's splits in one status. Empty when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the read fails.
    pub async fn get_splits_by_status(
        &self,
        expense_id: ExpenseId,
        status: SplitStatus,
    ) -> Result<Vec<Split>, LedgerError> {
        let query = SplitQuery::for_expense(expense_id).with_status(status);
        Ok(self.store.list_splits(&query).await?)
    }

    /// Sums an expense's splits in one status. Zero when nothing matches.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the read fails.
    pub async fn get_total_splits_by_status(
        &self,
        expense_id: ExpenseId,
        status: SplitStatus,
    ) -> Result<Amount, LedgerError> {
        let query = SplitQuery::for_expense(expense_id).with_status(status);
        Ok(self.store.summarize_splits(&query).await?.total)
    }

    /// Corrects split fields.
    ///
    /// Status and paid date are stored as given: no paid date is stamped or
    /// cleared and no settlement event is sent.
    ///
    /// # Errors
    ///
    /// Returns `SplitNotFound`, `TenantNotFound` for unknown tenants, and
    /// `InvalidAmount` for a bad amount.
    pub async fn update_split(
        &self,
        id: SplitId,
        input: UpdateSplitInput,
    ) -> Result<Split, LedgerError> {
        let split_amount = input.split_amount.map(Amount::positive).transpose()?;
        if let Some(tenant) = input.assigned_to {
            self.tenant(tenant).await?;
        }
        if let Some(Some(tenant)) = input.assigned_by {
            self.tenant(tenant).await?;
        }

        let patch = SplitPatch {
            status: input.status,
            split_amount,
            assigned_to: input.assigned_to,
            assigned_by: input.assigned_by,
            paid_date: input.paid_date,
        };
        let split = self
            .store
            .update_split(id, patch)
            .await?
            .ok_or(LedgerError::SplitNotFound(id))?;

        info!(split_id = %id, "Split updated");
        Ok(split)
    }

    /// Moves a split to a new status.
    ///
    /// Settling stamps the paid date (the given one, or now) and notifies the
    /// payee. Any other status clears the paid date. A failed notification
    /// is logged and does not fail the update.
    ///
    /// Two concurrent updates of one split are not serialized; the later
    /// write wins.
    ///
    /// # Errors
    ///
    /// Returns `SplitNotFound` if the split does not exist.
    pub async fn update_split_status(
        &self,
        id: SplitId,
        update: SplitStatusUpdate,
    ) -> Result<Split, LedgerError> {
        let current = self.get_split(id).await?;
        let change =
            SplitLifecycle::transition(current.status, update.status, update.paid_date, Utc::now());
        if !change.is_defined() {
            warn!(
                split_id = %id,
                from = %change.from,
                to = %change.status,
                "Split status moved outside the settlement lifecycle"
            );
        }

        let split = self
            .store
            .update_split(id, change.into_patch())
            .await?
            .ok_or(LedgerError::SplitNotFound(id))?;

        info!(split_id = %id, status = %split.status, "Split status updated");

        if change.settles {
            self.notify_settlement(&split).await;
        }
        Ok(split)
    }

    /// Deletes a split.
    ///
    /// # Errors
    ///
    /// Returns `SplitNotFound` if the split does not exist.
    pub async fn delete_split(&self, id: SplitId) -> Result<(), LedgerError> {
        if !self.store.delete_split(id).await? {
            return Err(LedgerError::SplitNotFound(id));
        }
        info!(split_id = %id, "Split deleted");
        Ok(())
    }

    async fn expense(&self, id: ExpenseId) -> Result<Expense, LedgerError> {
        self.store
            .find_expense(id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(id))
    }

    async fn tenant(&self, id: TenantId) -> Result<(), LedgerError> {
        match self.store.find_tenant(id).await? {
            Some(_) => Ok(()),
            None => Err(LedgerError::TenantNotFound(id)),
        }
    }

    async fn prepare_line(
        &self,
        expense: &Expense,
        line: SplitLine,
        now: DateTime<Utc>,
    ) -> Result<NewSplit, LedgerError> {
        let split_amount = Amount::positive(line.split_amount)?;
        let assigned_by = line.assigned_by.unwrap_or(expense.created_by);
        self.tenant(line.assigned_to).await?;
        self.tenant(assigned_by).await?;

        let status = line.status.unwrap_or(SplitStatus::Unpaid);
        Ok(NewSplit {
            expense_id: expense.id,
            status,
            split_amount,
            assigned_to: line.assigned_to,
            assigned_by: Some(assigned_by),
            paid_date: (status == SplitStatus::Paid).then_some(now),
        })
    }

    async fn notify_settlement(&self, split: &Split) {
        let event = match self.settlement_event(split).await {
            Ok(Some(event)) => event,
            Ok(None) => {
                warn!(split_id = %split.id, "Settlement parties no longer resolve; skipping notification");
                return;
            }
            Err(err) => {
                warn!(split_id = %split.id, error = %err, "Could not build settlement notification");
                return;
            }
        };

        info!(
            split_id = %split.id,
            payer = %event.payer.id,
            payee = %event.payee.id,
            "Split settled"
        );
        dispatch_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipients: vec![event.payee.id],
                payload: NotificationPayload::SplitSettled(event),
            },
        )
        .await;
    }

    async fn settlement_event(
        &self,
        split: &Split,
    ) -> Result<Option<SettlementEvent>, LedgerError> {
        let Some(expense) = self.store.find_expense(split.expense_id).await? else {
            return Ok(None);
        };
        let payee_id = split.assigned_by.unwrap_or(expense.created_by);
        let Some(payer) = self.store.find_tenant(split.assigned_to).await? else {
            return Ok(None);
        };
        let Some(payee) = self.store.find_tenant(payee_id).await? else {
            return Ok(None);
        };

        Ok(Some(SettlementEvent {
            split: split.clone(),
            expense,
            payer,
            payee,
        }))
    }
}
