//! Expense service.
//!
//! An expense and the splits generated for it are written in one store
//! transaction: either every row becomes visible or none does.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use roomie_shared::types::{Amount, ExpenseId, GroupId};

use super::allocation::SplitAllocator;
use crate::error::LedgerError;
use crate::notify::{Notification, NotificationDispatcher, NotificationPayload, dispatch_best_effort};
use crate::store::{LedgerStore, SplitQuery};
use crate::types::{
    CreateExpenseInput, Expense, ExpensePatch, ExpenseWithSplits, NewExpense, UpdateExpenseInput,
};

/// Creates, reads, updates and deletes expenses.
pub struct ExpenseService {
    store: Arc<dyn LedgerStore>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ExpenseService {
    /// Creates a new expense service.
    #[must_use]
    pub fn new(store: Arc<dyn LedgerStore>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { store, notifier }
    }

    /// Creates an expense and splits it equally across its participants.
    ///
    /// The creator must be one of the participants; their own split is
    /// stored as already paid. Group tenants other than the creator are
    /// notified once the rows are committed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields, a bad total or a bad
    /// participant list, `GroupNotFound`/`TenantNotFound` for unknown
    /// references, and `Store` if the write fails (nothing is persisted).
    pub async fn create_expense(
        &self,
        input: CreateExpenseInput,
    ) -> Result<ExpenseWithSplits, LedgerError> {
        let category = required("category", input.category)?;
        let title = required("title", input.title)?;
        let receipt_total = Amount::positive(input.receipt_total)?;
        let allocations = SplitAllocator::allocate(
            receipt_total,
            &input.participants,
            input.created_by,
            Utc::now(),
        )?;

        if self.store.find_group(input.group_id).await?.is_none() {
            return Err(LedgerError::GroupNotFound(input.group_id));
        }
        for &participant in &input.participants {
            if self.store.find_tenant(participant).await?.is_none() {
                return Err(LedgerError::TenantNotFound(participant));
            }
        }

        let mut txn = self.store.begin().await?;
        let expense = txn
            .insert_expense(NewExpense {
                category,
                title,
                description: input.description,
                receipt_total,
                group_id: input.group_id,
                created_by: input.created_by,
            })
            .await?;
        let rows = allocations
            .into_iter()
            .map(|a| a.into_new_split(expense.id))
            .collect();
        let splits = txn.insert_splits(rows).await?;
        txn.commit().await?;

        info!(
            expense_id = %expense.id,
            group_id = %expense.group_id,
            total = %expense.receipt_total,
            splits = splits.len(),
            "Expense created"
        );

        self.notify_group(&expense, splits.len()).await;

        Ok(ExpenseWithSplits { expense, splits })
    }

    /// Gets an expense by ID.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if the expense does not exist.
    pub async fn get_expense(&self, id: ExpenseId) -> Result<Expense, LedgerError> {
        self.store
            .find_expense(id)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(id))
    }

    /// Gets an expense together with its splits.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if the expense does not exist.
    pub async fn get_expense_with_splits(
        &self,
        id: ExpenseId,
    ) -> Result<ExpenseWithSplits, LedgerError> {
        let expense = self.get_expense(id).await?;
        let splits = self.store.list_splits(&SplitQuery::for_expense(id)).await?;
        Ok(ExpenseWithSplits { expense, splits })
    }

    /// Lists a group's expenses, newest first.
    ///
    /// # Errors
    ///
    /// Returns `GroupNotFound` if the group does not exist.
    pub async fn get_expenses_by_group(
        &self,
        group_id: GroupId,
    ) -> Result<Vec<Expense>, LedgerError> {
        if self.store.find_group(group_id).await?.is_none() {
            return Err(LedgerError::GroupNotFound(group_id));
        }
        let expenses = self.store.list_expenses_by_group(group_id).await?;
        debug!(group_id = %group_id, count = expenses.len(), "Listed group expenses");
        Ok(expenses)
    }

    /// Lists expenses carrying a category label, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the read fails.
    pub async fn get_expenses_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Expense>, LedgerError> {
        Ok(self.store.list_expenses_by_category(category).await?)
    }

    /// Updates expense fields. Existing splits are left as they are, even
    /// when the total changes.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank fields or a bad total, and
    /// `ExpenseNotFound` if the expense does not exist.
    pub async fn update_expense(
        &self,
        id: ExpenseId,
        input: UpdateExpenseInput,
    ) -> Result<Expense, LedgerError> {
        let patch = ExpensePatch {
            category: input.category.map(|c| required("category", c)).transpose()?,
            title: input.title.map(|t| required("title", t)).transpose()?,
            description: input.description,
            receipt_total: input.receipt_total.map(Amount::positive).transpose()?,
        };

        let expense = self
            .store
            .update_expense(id, patch)
            .await?
            .ok_or(LedgerError::ExpenseNotFound(id))?;

        info!(expense_id = %id, "Expense updated");
        Ok(expense)
    }

    /// Deletes an expense and all of its splits.
    ///
    /// # Errors
    ///
    /// Returns `ExpenseNotFound` if the expense does not exist.
    pub async fn delete_expense(&self, id: ExpenseId) -> Result<(), LedgerError> {
        let mut txn = self.store.begin().await?;
        if !txn.delete_expense(id).await? {
            return Err(LedgerError::ExpenseNotFound(id));
        }
        txn.commit().await?;

        info!(expense_id = %id, "Expense deleted");
        Ok(())
    }

    /// Sums the receipt totals of a group's expenses; zero when it has none.
    ///
    /// # Errors
    ///
    /// Returns `Store` if the read fails.
    pub async fn get_total_expenses_by_group(
        &self,
        group_id: GroupId,
    ) -> Result<Amount, LedgerError> {
        Ok(self.store.sum_expenses_by_group(group_id).await?)
    }

    async fn notify_group(&self, expense: &Expense, split_count: usize) {
        let recipients = match self.store.list_group_tenants(expense.group_id).await {
            Ok(tenants) => tenants
                .into_iter()
                .map(|t| t.id)
                .filter(|id| *id != expense.created_by)
                .collect(),
            Err(err) => {
                warn!(expense_id = %expense.id, error = %err, "Could not resolve notification recipients");
                return;
            }
        };

        dispatch_best_effort(
            self.notifier.as_ref(),
            Notification {
                recipients,
                payload: NotificationPayload::ExpenseCreated {
                    expense: expense.clone(),
                    split_count,
                },
            },
        )
        .await;
    }
}

/// Trims a text field, rejecting it when blank.
fn required(field: &'static str, value: String) -> Result<String, LedgerError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingNotifier, FailingSplitInsertStore, Household};
    use crate::types::SplitStatus;
    use roomie_shared::types::TenantId;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_create_expense_splits_equally() {
        let home = Household::new().await;
        let service = home.expenses();

        let created = service
            .create_expense(home.shared_by_all(dec!(90.00)))
            .await
            .unwrap();

        assert_eq!(created.expense.receipt_total, Amount::from_cents(9000));
        assert_eq!(created.splits.len(), 3);
        for split in &created.splits {
            assert_eq!(split.split_amount, Amount::from_cents(3000));
            assert_eq!(split.assigned_by, Some(home.alice.id));
            if split.assigned_to == home.alice.id {
                assert_eq!(split.status, SplitStatus::Paid);
                assert!(split.paid_date.is_some());
            } else {
                assert_eq!(split.status, SplitStatus::Unpaid);
                assert!(split.paid_date.is_none());
            }
        }
    }

    #[tokio::test]
    async fn test_create_expense_notifies_group_except_creator() {
        let home = Household::new().await;
        home.expenses()
            .create_expense(home.shared_by_all(dec!(60)))
            .await
            .unwrap();

        let sent = home.notifier.sent().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].payload.kind(), "expense_created");
        assert!(!sent[0].recipients.contains(&home.alice.id));
        assert!(sent[0].recipients.contains(&home.bob.id));
        assert!(sent[0].recipients.contains(&home.carol.id));
    }

    #[tokio::test]
    async fn test_create_expense_requires_creator_participation() {
        let home = Household::new().await;
        let mut input = home.shared_by_all(dec!(90));
        input.participants = vec![home.bob.id, home.carol.id];

        let err = home.expenses().create_expense(input).await.unwrap_err();

        assert!(matches!(err, LedgerError::CreatorNotParticipant(_)));
        assert!(err.to_string().contains("Creator must be included"));
        assert_eq!(home.store.expense_count().await, 0);
    }

    #[tokio::test]
    async fn test_create_expense_rejects_empty_participants() {
        let home = Household::new().await;
        let mut input = home.shared_by_all(dec!(90));
        input.participants.clear();

        let err = home.expenses().create_expense(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoParticipants));
    }

    #[tokio::test]
    async fn test_create_expense_rejects_bad_total_and_blank_title() {
        let home = Household::new().await;
        let service = home.expenses();

        let err = service
            .create_expense(home.shared_by_all(dec!(0)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));

        let mut input = home.shared_by_all(dec!(10));
        input.title = "   ".to_string();
        let err = service.create_expense(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::EmptyField("title")));
    }

    #[tokio::test]
    async fn test_create_expense_checks_references() {
        let home = Household::new().await;
        let service = home.expenses();

        let mut input = home.shared_by_all(dec!(10));
        input.group_id = GroupId::new();
        let err = service.create_expense(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::GroupNotFound(_)));

        let stranger = TenantId::new();
        let mut input = home.shared_by_all(dec!(10));
        input.participants.push(stranger);
        let err = service.create_expense(input).await.unwrap_err();
        assert!(matches!(err, LedgerError::TenantNotFound(t) if t == stranger));
    }

    #[tokio::test]
    async fn test_failed_split_insert_leaves_no_expense() {
        let home = Household::new().await;
        let service = ExpenseService::new(
            Arc::new(FailingSplitInsertStore::new(home.store.clone())),
            home.notifier.clone(),
        );

        let err = service
            .create_expense(home.shared_by_all(dec!(90)))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(home.store.expense_count().await, 0);
        assert_eq!(home.store.split_count().await, 0);
        assert!(home.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_creation() {
        let home = Household::new().await;
        let service = ExpenseService::new(Arc::new(home.store.clone()), Arc::new(FailingNotifier));

        let created = service
            .create_expense(home.shared_by_all(dec!(30)))
            .await
            .unwrap();

        assert!(service.get_expense(created.expense.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_expense_not_found() {
        let home = Household::new().await;
        let id = ExpenseId::new();
        let err = home.expenses().get_expense(id).await.unwrap_err();
        assert!(matches!(err, LedgerError::ExpenseNotFound(e) if e == id));
    }

    #[tokio::test]
    async fn test_get_expense_with_splits() {
        let home = Household::new().await;
        let service = home.expenses();
        let created = service
            .create_expense(home.shared_by_all(dec!(45)))
            .await
            .unwrap();

        let fetched = service
            .get_expense_with_splits(created.expense.id)
            .await
            .unwrap();

        assert_eq!(fetched.expense, created.expense);
        assert_eq!(fetched.splits.len(), 3);
    }

    #[tokio::test]
    async fn test_expenses_by_group_and_category() {
        let home = Household::new().await;
        let service = home.expenses();
        service
            .create_expense(home.shared_by_all(dec!(45)))
            .await
            .unwrap();
        let mut utilities = home.shared_by_all(dec!(120));
        utilities.category = "Utilities".to_string();
        service.create_expense(utilities).await.unwrap();

        assert_eq!(
            service
                .get_expenses_by_group(home.group.id)
                .await
                .unwrap()
                .len(),
            2
        );
        assert_eq!(
            service
                .get_expenses_by_category("utilities")
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(
            service
                .get_expenses_by_category("Rent")
                .await
                .unwrap()
                .is_empty()
        );

        let err = service
            .get_expenses_by_group(GroupId::new())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::GroupNotFound(_)));
    }

    #[tokio::test]
    async fn test_total_by_group_defaults_to_zero() {
        let home = Household::new().await;
        let service = home.expenses();

        assert!(
            service
                .get_total_expenses_by_group(home.group.id)
                .await
                .unwrap()
                .is_zero()
        );

        service
            .create_expense(home.shared_by_all(dec!(45.50)))
            .await
            .unwrap();
        service
            .create_expense(home.shared_by_all(dec!(14.50)))
            .await
            .unwrap();

        assert_eq!(
            service
                .get_total_expenses_by_group(home.group.id)
                .await
                .unwrap(),
            Amount::from_cents(6000)
        );
    }

    #[tokio::test]
    async fn test_update_total_does_not_recompute_splits() {
        let home = Household::new().await;
        let service = home.expenses();
        let created = service
            .create_expense(home.shared_by_all(dec!(90)))
            .await
            .unwrap();

        let updated = service
            .update_expense(
                created.expense.id,
                UpdateExpenseInput {
                    receipt_total: Some(dec!(120)),
                    description: Some(None),
                    ..UpdateExpenseInput::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.receipt_total, Amount::from_cents(12000));
        assert_eq!(updated.description, None);
        assert_eq!(updated.title, created.expense.title);

        // Splits still add up to the old total.
        let splits = service
            .get_expense_with_splits(created.expense.id)
            .await
            .unwrap()
            .splits;
        let sum: Amount = splits.iter().map(|s| s.split_amount).sum();
        assert_eq!(sum, Amount::from_cents(9000));
    }

    #[tokio::test]
    async fn test_update_expense_validation() {
        let home = Household::new().await;
        let service = home.expenses();
        let created = service
            .create_expense(home.shared_by_all(dec!(90)))
            .await
            .unwrap();

        let err = service
            .update_expense(
                created.expense.id,
                UpdateExpenseInput {
                    receipt_total: Some(dec!(-1)),
                    ..UpdateExpenseInput::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount(_)));

        let err = service
            .update_expense(ExpenseId::new(), UpdateExpenseInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ExpenseNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_expense_cascades_to_splits() {
        let home = Household::new().await;
        let service = home.expenses();
        let created = service
            .create_expense(home.shared_by_all(dec!(90)))
            .await
            .unwrap();

        service.delete_expense(created.expense.id).await.unwrap();

        assert_eq!(home.store.split_count().await, 0);
        let err = service.get_expense(created.expense.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::ExpenseNotFound(_)));

        let err = service
            .delete_expense(created.expense.id)
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::ExpenseNotFound(_)));
    }
}
