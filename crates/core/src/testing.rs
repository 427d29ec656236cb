//! Fixtures shared by the service tests.

use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use roomie_shared::types::{Amount, ExpenseId, GroupId, SplitId, TenantId, UserId};

use crate::aggregation::AggregationService;
use crate::expense::ExpenseService;
use crate::notify::{Notification, NotificationDispatcher, NotificationError};
use crate::split::SplitService;
use crate::store::{
    LedgerStore, LedgerTransaction, MemoryLedgerStore, SplitQuery, SplitTotals, StoreError,
};
use crate::types::{
    CreateExpenseInput, Expense, ExpensePatch, Group, NewExpense, NewSplit, Split, SplitPatch,
    SplitView, Tenant,
};

/// Dispatcher that keeps every notification it receives.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<Notification> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingNotifier {
    async fn notify(&self, notification: Notification) -> Result<(), NotificationError> {
        self.sent.lock().await.push(notification);
        Ok(())
    }
}

/// Dispatcher whose channel is always down.
#[derive(Debug, Default)]
pub struct FailingNotifier;

#[async_trait]
impl NotificationDispatcher for FailingNotifier {
    async fn notify(&self, _notification: Notification) -> Result<(), NotificationError> {
        Err(NotificationError::Unavailable("socket closed".to_string()))
    }
}

/// Store whose transactions fail every split insert.
pub struct FailingSplitInsertStore {
    inner: MemoryLedgerStore,
}

impl FailingSplitInsertStore {
    pub fn new(inner: MemoryLedgerStore) -> Self {
        Self { inner }
    }
}

struct FailingSplitInsertTransaction {
    inner: Box<dyn LedgerTransaction>,
}

#[async_trait]
impl LedgerTransaction for FailingSplitInsertTransaction {
    async fn insert_expense(&mut self, expense: NewExpense) -> Result<Expense, StoreError> {
        self.inner.insert_expense(expense).await
    }

    async fn insert_splits(&mut self, _splits: Vec<NewSplit>) -> Result<Vec<Split>, StoreError> {
        Err(StoreError::Query("connection reset during split insert".to_string()))
    }

    async fn delete_expense(&mut self, id: ExpenseId) -> Result<bool, StoreError> {
        self.inner.delete_expense(id).await
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.inner.commit().await
    }
}

#[async_trait]
impl LedgerStore for FailingSplitInsertStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTransaction>, StoreError> {
        Ok(Box::new(FailingSplitInsertTransaction {
            inner: self.inner.begin().await?,
        }))
    }

    async fn find_group(&self, id: GroupId) -> Result<Option<Group>, StoreError> {
        self.inner.find_group(id).await
    }

    async fn find_tenant(&self, id: TenantId) -> Result<Option<Tenant>, StoreError> {
        self.inner.find_tenant(id).await
    }

    async fn find_tenant_by_user(&self, user_id: UserId) -> Result<Option<Tenant>, StoreError> {
        self.inner.find_tenant_by_user(user_id).await
    }

    async fn list_group_tenants(&self, group_id: GroupId) -> Result<Vec<Tenant>, StoreError> {
        self.inner.list_group_tenants(group_id).await
    }

    async fn find_expense(&self, id: ExpenseId) -> Result<Option<Expense>, StoreError> {
        self.inner.find_expense(id).await
    }

    async fn list_expenses_by_group(&self, group_id: GroupId) -> Result<Vec<Expense>, StoreError> {
        self.inner.list_expenses_by_group(group_id).await
    }

    async fn list_expenses_by_category(
        &self,
        category: &str,
    ) -> Result<Vec<Expense>, StoreError> {
        self.inner.list_expenses_by_category(category).await
    }

    async fn update_expense(
        &self,
        id: ExpenseId,
        patch: ExpensePatch,
    ) -> Result<Option<Expense>, StoreError> {
        self.inner.update_expense(id, patch).await
    }

    async fn sum_expenses_by_group(&self, group_id: GroupId) -> Result<Amount, StoreError> {
        self.inner.sum_expenses_by_group(group_id).await
    }

    async fn find_split(&self, id: SplitId) -> Result<Option<Split>, StoreError> {
        self.inner.find_split(id).await
    }

    async fn list_splits(&self, query: &SplitQuery) -> Result<Vec<Split>, StoreError> {
        self.inner.list_splits(query).await
    }

    async fn list_split_views(&self, query: &SplitQuery) -> Result<Vec<SplitView>, StoreError> {
        self.inner.list_split_views(query).await
    }

    async fn summarize_splits(&self, query: &SplitQuery) -> Result<SplitTotals, StoreError> {
        self.inner.summarize_splits(query).await
    }

    async fn update_split(
        &self,
        id: SplitId,
        patch: SplitPatch,
    ) -> Result<Option<Split>, StoreError> {
        self.inner.update_split(id, patch).await
    }

    async fn delete_split(&self, id: SplitId) -> Result<bool, StoreError> {
        self.inner.delete_split(id).await
    }
}

/// A group of three tenants: Alice, Bob and Carol.
pub struct Household {
    pub store: MemoryLedgerStore,
    pub notifier: Arc<RecordingNotifier>,
    pub group: Group,
    pub alice: Tenant,
    pub bob: Tenant,
    pub carol: Tenant,
}

impl Household {
    pub async fn new() -> Self {
        let store = MemoryLedgerStore::new();
        let group = store.insert_group("Maple Street").await;
        let alice = store.insert_tenant("Alice", Some(group.id)).await;
        let bob = store.insert_tenant("Bob", Some(group.id)).await;
        let carol = store.insert_tenant("Carol", Some(group.id)).await;
        Self {
            store,
            notifier: Arc::new(RecordingNotifier::default()),
            group,
            alice,
            bob,
            carol,
        }
    }

    pub fn expenses(&self) -> ExpenseService {
        ExpenseService::new(Arc::new(self.store.clone()), self.notifier.clone())
    }

    pub fn splits(&self) -> SplitService {
        SplitService::new(Arc::new(self.store.clone()), self.notifier.clone())
    }

    pub fn aggregation(&self) -> AggregationService {
        AggregationService::new(Arc::new(self.store.clone()))
    }

    /// Expense paid by Alice and shared by all three tenants.
    pub fn shared_by_all(&self, total: Decimal) -> CreateExpenseInput {
        CreateExpenseInput {
            category: "Groceries".to_string(),
            title: "Weekly shop".to_string(),
            description: Some("Market run".to_string()),
            receipt_total: total,
            group_id: self.group.id,
            created_by: self.alice.id,
            participants: vec![self.alice.id, self.bob.id, self.carol.id],
        }
    }

    /// The split a tenant owes on an expense.
    pub async fn split_of(&self, expense_id: ExpenseId, tenant: &Tenant) -> Split {
        self.store
            .list_splits(&SplitQuery::for_expense(expense_id))
            .await
            .unwrap()
            .into_iter()
            .find(|s| s.assigned_to == tenant.id)
            .unwrap()
    }
}
