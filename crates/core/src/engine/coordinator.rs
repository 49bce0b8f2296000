//! Single-source posting coordinator.
//!
//! Composite business operations bundle external resource updates and a
//! journal entry into one unit of work keyed by a caller-supplied
//! transaction id. The coordinator is the only writer of resource balances,
//! and a given transaction id produces its effects at most once.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dashmap::DashMap;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use uuid::Uuid;

use arca_shared::config::PostingConfig;
use arca_shared::types::ResourceId;

use crate::ledger::{EntryInput, EntryResult, LedgerError, SourceType};

use super::posting::{abort, submit_entry_in};
use super::store::{LedgerStore, LedgerTxn, ProcessedTransaction, ResourceMovement};

/// A signed balance change to apply to one external resource.
#[derive(Debug, Clone)]
pub struct ResourceDelta {
    /// The resource to move.
    pub resource_id: ResourceId,
    /// Signed delta; a decreasing delta may not drive the balance negative.
    pub amount: Decimal,
}

/// A composite operation: resource deltas plus an optional journal entry,
/// processed at most once per transaction id.
#[derive(Debug, Clone)]
pub struct BalanceUpdateRequest {
    /// Caller-supplied idempotency key, unique across all operations.
    pub transaction_id: String,
    /// Business event tag recorded with the idempotency key.
    pub source_type: SourceType,
    /// Resource balance changes, applied in order.
    pub deltas: Vec<ResourceDelta>,
    /// Journal entry to create and post in the same unit of work.
    pub entry: Option<EntryInput>,
    /// Skip duplicate rejection for this id (controlled replays only).
    pub allow_duplicate: bool,
}

/// Result of a committed composite operation.
#[derive(Debug, Clone)]
pub struct PostingOutcome {
    /// The idempotency key that was recorded.
    pub transaction_id: String,
    /// The posted journal entry, if the request carried one.
    pub entry: Option<EntryResult>,
    /// Movement audit records, one per delta in request order.
    pub movements: Vec<ResourceMovement>,
}

/// Serializes composite postings and suppresses duplicate transaction ids.
pub struct PostingCoordinator<S> {
    store: Arc<S>,
    gate: Mutex<()>,
    lock_timeout: Duration,
    // Commit-confirmed ids only; inserted after the transaction commits so a
    // failed operation can be retried under the same id.
    seen: DashMap<String, ()>,
}

impl<S: LedgerStore> PostingCoordinator<S> {
    /// Creates a coordinator over a store.
    pub fn new(store: Arc<S>, config: &PostingConfig) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
            lock_timeout: Duration::from_secs(config.lock_timeout_secs),
            seen: DashMap::new(),
        }
    }

    /// Processes a composite operation.
    ///
    /// Acquires the posting gate, replays the duplicate checks inside the
    /// transaction, applies every delta with its audit movement, submits and
    /// posts the entry if present, records the idempotency key, and commits.
    /// Any failure discards every effect.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::DuplicateTransaction`] if the id was already posted
    /// - [`LedgerError::Concurrency`] if the gate is not acquired in time
    /// - [`LedgerError::ResourceNotFound`] / [`LedgerError::InsufficientBalance`]
    ///   for a bad delta
    /// - any validation or account error from the journal entry
    pub async fn post_balance_update(
        &self,
        request: BalanceUpdateRequest,
    ) -> Result<PostingOutcome, LedgerError> {
        if !request.allow_duplicate && self.seen.contains_key(&request.transaction_id) {
            return Err(LedgerError::DuplicateTransaction(request.transaction_id));
        }

        let _gate = tokio::time::timeout(self.lock_timeout, self.gate.lock())
            .await
            .map_err(|_| {
                LedgerError::Concurrency(format!(
                    "posting gate not acquired within {}s",
                    self.lock_timeout.as_secs()
                ))
            })?;

        let mut txn = self.store.begin().await?;
        match Self::process_in(txn.as_mut(), &request).await {
            Ok(outcome) => {
                txn.commit().await?;
                // Only a committed id may poison future fast-path checks.
                self.seen.insert(outcome.transaction_id.clone(), ());
                tracing::info!(
                    transaction_id = %outcome.transaction_id,
                    movements = outcome.movements.len(),
                    has_entry = outcome.entry.is_some(),
                    "composite posting committed"
                );
                Ok(outcome)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    async fn process_in(
        txn: &mut dyn LedgerTxn,
        request: &BalanceUpdateRequest,
    ) -> Result<PostingOutcome, LedgerError> {
        // The durable record is authoritative; the fast path above only
        // short-circuits ids this process has already committed.
        let already_processed = txn.transaction_processed(&request.transaction_id).await?;
        if already_processed && !request.allow_duplicate {
            return Err(LedgerError::DuplicateTransaction(
                request.transaction_id.clone(),
            ));
        }

        let mut movements = Vec::with_capacity(request.deltas.len());
        for delta in &request.deltas {
            let resource = txn
                .resource_for_update(delta.resource_id)
                .await?
                .ok_or(LedgerError::ResourceNotFound(delta.resource_id))?;

            let new_balance = resource.balance + delta.amount;
            if delta.amount < Decimal::ZERO && new_balance < Decimal::ZERO {
                return Err(LedgerError::InsufficientBalance {
                    resource_id: delta.resource_id,
                    available: resource.balance,
                    requested: -delta.amount,
                });
            }

            txn.update_resource_balance(delta.resource_id, new_balance)
                .await?;

            let movement = ResourceMovement {
                id: Uuid::now_v7(),
                resource_id: delta.resource_id,
                amount: delta.amount,
                previous_balance: resource.balance,
                new_balance,
                transaction_id: request.transaction_id.clone(),
                occurred_at: Utc::now(),
            };
            txn.insert_movement(&movement).await?;
            movements.push(movement);
        }

        let entry = match &request.entry {
            Some(input) => {
                let mut input = input.clone();
                input.auto_post = true;
                Some(submit_entry_in(txn, &input).await?)
            }
            None => None,
        };

        // A sanctioned replay keeps the original marker.
        if !already_processed {
            txn.record_processed(&ProcessedTransaction {
                transaction_id: request.transaction_id.clone(),
                source_type: request.source_type,
                entry_id: entry.as_ref().map(|e| e.entry_id),
                processed_at: Utc::now(),
            })
            .await?;
        }

        Ok(PostingOutcome {
            transaction_id: request.transaction_id.clone(),
            entry,
            movements,
        })
    }
}
