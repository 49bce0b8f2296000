//! Storage abstraction for the posting engine.
//!
//! The engine is written against a unit-of-work pair: [`LedgerStore`] opens a
//! transaction, [`LedgerTxn`] carries every read and write inside it, and the
//! transaction ends in exactly one `commit` or `rollback`. Balance effects,
//! entry rows, resource movements, and the idempotency record for one
//! operation all live in one transaction, so a failure anywhere discards
//! everything.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use arca_shared::types::{AccountId, EntryId, ResourceId};

use crate::ledger::{Account, JournalEntry, JournalLine, LedgerError, SourceType};

/// An external resource balance managed alongside the journal (e.g. a cash
/// drawer or a stock quantity owned by another subsystem).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceBalance {
    /// Unique identifier.
    pub id: ResourceId,
    /// Display name.
    pub name: String,
    /// Current balance. Never negative after a decreasing delta.
    pub balance: Decimal,
}

/// Audit record of a single resource balance change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceMovement {
    /// Unique identifier.
    pub id: Uuid,
    /// The resource that moved.
    pub resource_id: ResourceId,
    /// Signed delta applied to the resource balance.
    pub amount: Decimal,
    /// Balance before the delta.
    pub previous_balance: Decimal,
    /// Balance after the delta.
    pub new_balance: Decimal,
    /// Idempotency key of the operation that produced this movement.
    pub transaction_id: String,
    /// When the movement was recorded.
    pub occurred_at: DateTime<Utc>,
}

/// Durable idempotency record for a processed source transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedTransaction {
    /// Caller-supplied idempotency key, unique across all operations.
    pub transaction_id: String,
    /// Business event tag of the processed operation.
    pub source_type: SourceType,
    /// Journal entry produced by the operation, if it carried one.
    pub entry_id: Option<EntryId>,
    /// When the operation committed.
    pub processed_at: DateTime<Utc>,
}

/// Opens units of work against the underlying storage.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Begins a new transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Persistence`] if the store cannot open one.
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>, LedgerError>;
}

/// A single unit of work over ledger storage.
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// its writes.
#[async_trait]
pub trait LedgerTxn: Send {
    /// Fetches an account by id.
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Fetches an account with a write lock held until the transaction ends.
    async fn account_for_update(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError>;

    /// Fetches every account.
    async fn all_accounts(&mut self) -> Result<Vec<Account>, LedgerError>;

    /// Fetches the direct children of an account.
    async fn children_of(&mut self, id: AccountId) -> Result<Vec<Account>, LedgerError>;

    /// Applies a signed delta to an account's cached balance in place.
    async fn add_to_balance(&mut self, id: AccountId, delta: Decimal) -> Result<(), LedgerError>;

    /// Overwrites an account's cached balance.
    async fn set_balance(&mut self, id: AccountId, balance: Decimal) -> Result<(), LedgerError>;

    /// Issues the next sequential journal entry number.
    async fn next_entry_number(&mut self) -> Result<i64, LedgerError>;

    /// Inserts an entry together with its lines.
    async fn insert_entry(
        &mut self,
        entry: &JournalEntry,
        lines: &[JournalLine],
    ) -> Result<(), LedgerError>;

    /// Fetches an entry and its lines in line order.
    async fn entry(
        &mut self,
        id: EntryId,
    ) -> Result<Option<(JournalEntry, Vec<JournalLine>)>, LedgerError>;

    /// Transitions an entry to posted.
    async fn mark_posted(
        &mut self,
        id: EntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError>;

    /// Fetches every line of every posted entry touching an account.
    async fn posted_lines_for_account(
        &mut self,
        id: AccountId,
    ) -> Result<Vec<JournalLine>, LedgerError>;

    /// Fetches a resource balance with a write lock held until the
    /// transaction ends.
    async fn resource_for_update(
        &mut self,
        id: ResourceId,
    ) -> Result<Option<ResourceBalance>, LedgerError>;

    /// Overwrites a resource balance.
    async fn update_resource_balance(
        &mut self,
        id: ResourceId,
        balance: Decimal,
    ) -> Result<(), LedgerError>;

    /// Appends a resource movement audit record.
    async fn insert_movement(&mut self, movement: &ResourceMovement) -> Result<(), LedgerError>;

    /// Returns true if an idempotency key has already been recorded.
    async fn transaction_processed(&mut self, transaction_id: &str) -> Result<bool, LedgerError>;

    /// Records an idempotency key.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::DuplicateTransaction`] if the key already
    /// exists; the unique constraint is the last line of defense when two
    /// transactions race past [`transaction_processed`](Self::transaction_processed).
    async fn record_processed(&mut self, record: &ProcessedTransaction) -> Result<(), LedgerError>;

    /// Commits the unit of work.
    async fn commit(self: Box<Self>) -> Result<(), LedgerError>;

    /// Discards the unit of work.
    async fn rollback(self: Box<Self>) -> Result<(), LedgerError>;
}
