//! Ledger error types.
//!
//! Every service returns [`LedgerError`]. Each variant falls into one of
//! three kinds: caller-fixable validation failures, references that do not
//! resolve, and persistence failures raised by the store.

use rust_decimal::Decimal;
use thiserror::Error;

use roomie_shared::AppError;
use roomie_shared::types::{AmountError, ExpenseId, GroupId, SplitId, TenantId, UserId};

use crate::store::StoreError;

/// Coarse classification of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request violates a business invariant; never retried.
    Validation,
    /// A referenced expense, split, tenant or group does not exist.
    NotFound,
    /// The store failed; no partial writes are visible.
    Persistence,
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Expense has no participants.
    #[error("At least one participant is required")]
    NoParticipants,

    /// Creator is missing from the participant list.
    #[error("Creator must be included in the participants ({0})")]
    CreatorNotParticipant(TenantId),

    /// Participant listed more than once.
    #[error("Participant {0} is listed more than once")]
    DuplicateParticipant(TenantId),

    /// Amount is not positive or has sub-cent precision.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),

    /// Total cannot give every participant at least one cent.
    #[error("Total {total} is too small to split across {participants} participants")]
    TotalTooSmall {
        /// Receipt total.
        total: Decimal,
        /// Number of participants.
        participants: usize,
    },

    /// A required text field is blank.
    #[error("Field '{0}' must not be empty")]
    EmptyField(&'static str),

    /// Bulk split creation without any split.
    #[error("At least one split is required")]
    NoSplits,

    // ========== Not Found Errors ==========
    /// Expense not found.
    #[error("Expense not found: {0}")]
    ExpenseNotFound(ExpenseId),

    /// Split not found.
    #[error("Split not found: {0}")]
    SplitNotFound(SplitId),

    /// Tenant not found.
    #[error("Tenant not found: {0}")]
    TenantNotFound(TenantId),

    /// No tenant record exists for the user.
    #[error("No tenant record for user {0}")]
    TenantForUserNotFound(UserId),

    /// Group not found.
    #[error("Group not found: {0}")]
    GroupNotFound(GroupId),

    // ========== Persistence Errors ==========
    /// Store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the kind of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoParticipants
            | Self::CreatorNotParticipant(_)
            | Self::DuplicateParticipant(_)
            | Self::InvalidAmount(_)
            | Self::TotalTooSmall { .. }
            | Self::EmptyField(_)
            | Self::NoSplits => ErrorKind::Validation,

            Self::ExpenseNotFound(_)
            | Self::SplitNotFound(_)
            | Self::TenantNotFound(_)
            | Self::TenantForUserNotFound(_)
            | Self::GroupNotFound(_) => ErrorKind::NotFound,

            Self::Store(_) => ErrorKind::Persistence,
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation => 400,
            ErrorKind::NotFound => 404,
            ErrorKind::Persistence => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NoParticipants => "NO_PARTICIPANTS",
            Self::CreatorNotParticipant(_) => "CREATOR_NOT_PARTICIPANT",
            Self::DuplicateParticipant(_) => "DUPLICATE_PARTICIPANT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::TotalTooSmall { .. } => "TOTAL_TOO_SMALL",
            Self::EmptyField(_) => "EMPTY_FIELD",
            Self::NoSplits => "NO_SPLITS",
            Self::ExpenseNotFound(_) => "EXPENSE_NOT_FOUND",
            Self::SplitNotFound(_) => "SPLIT_NOT_FOUND",
            Self::TenantNotFound(_) | Self::TenantForUserNotFound(_) => "TENANT_NOT_FOUND",
            Self::GroupNotFound(_) => "GROUP_NOT_FOUND",
            Self::Store(_) => "PERSISTENCE_ERROR",
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err.kind() {
            ErrorKind::Validation => Self::Validation(err.to_string()),
            ErrorKind::NotFound => Self::NotFound(err.to_string()),
            ErrorKind::Persistence => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_creator_not_participant_error() {
        let err = LedgerError::CreatorNotParticipant(TenantId::new());
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.error_code(), "CREATOR_NOT_PARTICIPANT");
        assert!(err.to_string().contains("Creator must be included"));
    }

    #[test]
    fn test_invalid_amount_error() {
        let err = LedgerError::from(AmountError::NotPositive(dec!(-5)));
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.error_code(), "INVALID_AMOUNT");
        assert!(err.to_string().contains("-5"));
    }

    #[test]
    fn test_not_found_errors() {
        let errors = [
            LedgerError::ExpenseNotFound(ExpenseId::new()),
            LedgerError::SplitNotFound(SplitId::new()),
            LedgerError::TenantNotFound(TenantId::new()),
            LedgerError::TenantForUserNotFound(UserId::new()),
            LedgerError::GroupNotFound(GroupId::new()),
        ];
        for err in errors {
            assert_eq!(err.kind(), ErrorKind::NotFound);
            assert_eq!(err.status_code(), 404);
        }
    }

    #[test]
    fn test_store_error_is_persistence() {
        let err = LedgerError::from(StoreError::Connection("refused".into()));
        assert_eq!(err.kind(), ErrorKind::Persistence);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "PERSISTENCE_ERROR");
    }

    #[test]
    fn test_into_app_error() {
        let app: AppError = LedgerError::NoParticipants.into();
        assert!(matches!(app, AppError::Validation(_)));

        let app: AppError = LedgerError::SplitNotFound(SplitId::new()).into();
        assert!(matches!(app, AppError::NotFound(_)));

        let app: AppError = LedgerError::Store(StoreError::Query("boom".into())).into();
        assert!(matches!(app, AppError::Database(_)));
    }
}
