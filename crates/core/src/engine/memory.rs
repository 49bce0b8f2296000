//! In-memory [`LedgerStore`] implementation.
//!
//! Each transaction takes the single store lock at `begin` and works on a
//! staged clone of the state; `commit` swaps the clone in, `rollback` (or a
//! drop) discards it. Holding the lock for the transaction's lifetime
//! serializes units of work, which makes this store a faithful stand-in for
//! a database in tests and single-process embeddings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use arca_shared::types::{AccountId, EntryId, ResourceId};

use crate::ledger::{Account, EntryStatus, JournalEntry, JournalLine, LedgerError};

use super::store::{
    LedgerStore, LedgerTxn, ProcessedTransaction, ResourceBalance, ResourceMovement,
};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    accounts: HashMap<AccountId, Account>,
    entries: HashMap<EntryId, JournalEntry>,
    lines: HashMap<EntryId, Vec<JournalLine>>,
    resources: HashMap<ResourceId, ResourceBalance>,
    movements: Vec<ResourceMovement>,
    processed: HashMap<String, ProcessedTransaction>,
    next_entry_number: i64,
}

/// In-memory ledger store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an account outside any transaction.
    pub async fn seed_account(&self, account: Account) {
        let mut state = self.state.lock().await;
        state.accounts.insert(account.id, account);
    }

    /// Seeds a resource balance outside any transaction.
    pub async fn seed_resource(&self, resource: ResourceBalance) {
        let mut state = self.state.lock().await;
        state.resources.insert(resource.id, resource);
    }

    /// Reads an account's cached balance.
    pub async fn account_balance(&self, id: AccountId) -> Option<Decimal> {
        let state = self.state.lock().await;
        state.accounts.get(&id).map(|a| a.balance)
    }

    /// Reads a resource's balance.
    pub async fn resource_balance(&self, id: ResourceId) -> Option<Decimal> {
        let state = self.state.lock().await;
        state.resources.get(&id).map(|r| r.balance)
    }

    /// Reads an entry's status.
    pub async fn entry_status(&self, id: EntryId) -> Option<EntryStatus> {
        let state = self.state.lock().await;
        state.entries.get(&id).map(|e| e.status)
    }

    /// Returns the number of persisted entries.
    pub async fn entry_count(&self) -> usize {
        let state = self.state.lock().await;
        state.entries.len()
    }

    /// Returns the number of recorded resource movements.
    pub async fn movement_count(&self) -> usize {
        let state = self.state.lock().await;
        state.movements.len()
    }

    /// Returns true if an idempotency key is durably recorded.
    pub async fn is_processed(&self, transaction_id: &str) -> bool {
        let state = self.state.lock().await;
        state.processed.contains_key(transaction_id)
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>, LedgerError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryTxn { guard, staged }))
    }
}

/// A unit of work over [`MemoryStore`].
struct MemoryTxn {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

#[async_trait]
impl LedgerTxn for MemoryTxn {
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn account_for_update(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        // The store lock held by this transaction already excludes writers.
        Ok(self.staged.accounts.get(&id).cloned())
    }

    async fn all_accounts(&mut self) -> Result<Vec<Account>, LedgerError> {
        let mut accounts: Vec<Account> = self.staged.accounts.values().cloned().collect();
        accounts.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(accounts)
    }

    async fn children_of(&mut self, id: AccountId) -> Result<Vec<Account>, LedgerError> {
        let mut children: Vec<Account> = self
            .staged
            .accounts
            .values()
            .filter(|a| a.parent_id == Some(id))
            .cloned()
            .collect();
        children.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(children)
    }

    async fn add_to_balance(&mut self, id: AccountId, delta: Decimal) -> Result<(), LedgerError> {
        let account = self
            .staged
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.balance += delta;
        Ok(())
    }

    async fn set_balance(&mut self, id: AccountId, balance: Decimal) -> Result<(), LedgerError> {
        let account = self
            .staged
            .accounts
            .get_mut(&id)
            .ok_or(LedgerError::AccountNotFound(id))?;
        account.balance = balance;
        Ok(())
    }

    async fn next_entry_number(&mut self) -> Result<i64, LedgerError> {
        self.staged.next_entry_number += 1;
        Ok(self.staged.next_entry_number)
    }

    async fn insert_entry(
        &mut self,
        entry: &JournalEntry,
        lines: &[JournalLine],
    ) -> Result<(), LedgerError> {
        self.staged.entries.insert(entry.id, entry.clone());
        self.staged.lines.insert(entry.id, lines.to_vec());
        Ok(())
    }

    async fn entry(
        &mut self,
        id: EntryId,
    ) -> Result<Option<(JournalEntry, Vec<JournalLine>)>, LedgerError> {
        let Some(entry) = self.staged.entries.get(&id).cloned() else {
            return Ok(None);
        };
        let lines = self.staged.lines.get(&id).cloned().unwrap_or_default();
        Ok(Some((entry, lines)))
    }

    async fn mark_posted(
        &mut self,
        id: EntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let entry = self
            .staged
            .entries
            .get_mut(&id)
            .ok_or(LedgerError::EntryNotFound(id))?;
        entry.status = EntryStatus::Posted;
        entry.posted_at = Some(posted_at);
        Ok(())
    }

    async fn posted_lines_for_account(
        &mut self,
        id: AccountId,
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let mut lines = Vec::new();
        for (entry_id, entry_lines) in &self.staged.lines {
            let posted = self
                .staged
                .entries
                .get(entry_id)
                .is_some_and(|e| e.status == EntryStatus::Posted);
            if !posted {
                continue;
            }
            lines.extend(entry_lines.iter().filter(|l| l.account_id == id).cloned());
        }
        Ok(lines)
    }

    async fn resource_for_update(
        &mut self,
        id: ResourceId,
    ) -> Result<Option<ResourceBalance>, LedgerError> {
        Ok(self.staged.resources.get(&id).cloned())
    }

    async fn update_resource_balance(
        &mut self,
        id: ResourceId,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        let resource = self
            .staged
            .resources
            .get_mut(&id)
            .ok_or(LedgerError::ResourceNotFound(id))?;
        resource.balance = balance;
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &ResourceMovement) -> Result<(), LedgerError> {
        self.staged.movements.push(movement.clone());
        Ok(())
    }

    async fn transaction_processed(&mut self, transaction_id: &str) -> Result<bool, LedgerError> {
        Ok(self.staged.processed.contains_key(transaction_id))
    }

    async fn record_processed(&mut self, record: &ProcessedTransaction) -> Result<(), LedgerError> {
        if self.staged.processed.contains_key(&record.transaction_id) {
            return Err(LedgerError::DuplicateTransaction(
                record.transaction_id.clone(),
            ));
        }
        self.staged
            .processed
            .insert(record.transaction_id.clone(), record.clone());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        let Self { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        Ok(())
    }
}
