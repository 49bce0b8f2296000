//! Ledger error types for validation, state, and storage errors.
//!
//! Every error here aborts the whole composite operation it occurs in;
//! partial success is disallowed by design. Only [`LedgerError::Concurrency`]
//! is safe for callers to retry.

use arca_shared::error::AppError;
use arca_shared::types::{AccountId, EntryId, ResourceId};
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors (never persisted) ==========
    /// Entry description must not be empty.
    #[error("Entry description must not be empty")]
    EmptyDescription,

    /// Entry must have at least 2 lines.
    #[error("Entry must have at least 2 lines")]
    InsufficientLines,

    /// Line amounts cannot be negative.
    #[error("Line {line_number}: amounts cannot be negative")]
    NegativeAmount {
        /// 1-based line position.
        line_number: i32,
    },

    /// A line must not carry both a debit and a credit.
    #[error("Line {line_number}: a line must be either a debit or a credit, not both")]
    BothSidesSet {
        /// 1-based line position.
        line_number: i32,
    },

    /// A line must carry a non-zero amount on exactly one side.
    #[error("Line {line_number}: a line must carry a non-zero debit or credit")]
    NeitherSideSet {
        /// 1-based line position.
        line_number: i32,
    },

    /// Entry is not balanced (debits != credits).
    #[error("Entry is not balanced. Debit: {debit}, Credit: {credit}")]
    Imbalance {
        /// Total debit amount.
        debit: Decimal,
        /// Total credit amount.
        credit: Decimal,
    },

    // ========== Account Errors ==========
    /// Account not found.
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    /// Account is inactive and cannot be posted to.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Header accounts are rollups and cannot be posted to.
    #[error("Account {0} is a header account and cannot be posted to")]
    AccountNotPostable(AccountId),

    /// A child account's type must match its parent's.
    #[error("Account {child} type differs from parent {parent}")]
    ParentTypeMismatch {
        /// Child account code.
        child: String,
        /// Parent account code.
        parent: String,
    },

    /// Hierarchy depth bound exceeded.
    #[error("Account {code} exceeds the maximum hierarchy depth")]
    HierarchyTooDeep {
        /// Account code.
        code: String,
    },

    // ========== Entry State Errors ==========
    /// Journal entry not found.
    #[error("Journal entry not found: {0}")]
    EntryNotFound(EntryId),

    /// Only draft entries can be posted.
    #[error("Entry {0} is not in draft status")]
    NotDraft(EntryId),

    /// Only posted entries can be reversed.
    #[error("Entry {0} is not posted")]
    NotPosted(EntryId),

    // ========== Coordinator Errors ==========
    /// External resource not found.
    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    /// A decreasing delta would drive a resource balance negative.
    #[error(
        "Insufficient balance on resource {resource_id}: {available} available, {requested} requested"
    )]
    InsufficientBalance {
        /// The resource.
        resource_id: ResourceId,
        /// Balance before the delta.
        available: Decimal,
        /// Magnitude of the decreasing delta.
        requested: Decimal,
    },

    /// The idempotency key has already produced a posting.
    #[error("Transaction '{0}' has already been posted")]
    DuplicateTransaction(String),

    // ========== Infrastructure Errors ==========
    /// Lock contention or timeout; safe for the caller to retry.
    #[error("Could not acquire lock: {0}")]
    Concurrency(String),

    /// Storage-layer failure.
    #[error("Storage error: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyDescription => "EMPTY_DESCRIPTION",
            Self::InsufficientLines => "INSUFFICIENT_LINES",
            Self::NegativeAmount { .. } => "NEGATIVE_AMOUNT",
            Self::BothSidesSet { .. } => "BOTH_SIDES_SET",
            Self::NeitherSideSet { .. } => "NEITHER_SIDE_SET",
            Self::Imbalance { .. } => "IMBALANCE",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::AccountNotPostable(_) => "ACCOUNT_NOT_POSTABLE",
            Self::ParentTypeMismatch { .. } => "PARENT_TYPE_MISMATCH",
            Self::HierarchyTooDeep { .. } => "HIERARCHY_TOO_DEEP",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
            Self::NotDraft(_) => "NOT_DRAFT",
            Self::NotPosted(_) => "NOT_POSTED",
            Self::ResourceNotFound(_) => "RESOURCE_NOT_FOUND",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::DuplicateTransaction(_) => "DUPLICATE_TRANSACTION",
            Self::Concurrency(_) => "CONCURRENCY",
            Self::Persistence(_) => "PERSISTENCE",
        }
    }

    /// Returns true if this error is safe for the caller to retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Concurrency(_))
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::AccountNotFound(_)
            | LedgerError::EntryNotFound(_)
            | LedgerError::ResourceNotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::EmptyDescription
            | LedgerError::InsufficientLines
            | LedgerError::NegativeAmount { .. }
            | LedgerError::BothSidesSet { .. }
            | LedgerError::NeitherSideSet { .. }
            | LedgerError::Imbalance { .. } => Self::Validation(err.to_string()),
            LedgerError::AccountInactive(_)
            | LedgerError::AccountNotPostable(_)
            | LedgerError::ParentTypeMismatch { .. }
            | LedgerError::HierarchyTooDeep { .. }
            | LedgerError::NotDraft(_)
            | LedgerError::NotPosted(_)
            | LedgerError::InsufficientBalance { .. } => Self::BusinessRule(err.to_string()),
            LedgerError::DuplicateTransaction(_) | LedgerError::Concurrency(_) => {
                Self::Conflict(err.to_string())
            }
            LedgerError::Persistence(_) => Self::Database(err.to_string()),
        }
    }
}
