//! Journal entry creation, posting, and reversal.
//!
//! Every public method opens one unit of work and ends it in exactly one
//! commit or rollback. The `_in` variants run inside a caller-owned
//! transaction so composite operations can bundle an entry with other writes.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use arca_shared::types::{AccountId, EntryId, LineId, UserId};

use crate::ledger::{
    build_reversal, validate_entry, Account, EntryInput, EntryResult, EntryStatus, JournalEntry,
    JournalLine, LedgerError,
};

use super::propagation::{apply_line_effect, recompute_header_balances};
use super::store::{LedgerStore, LedgerTxn};

/// Rolls a transaction back, keeping the original error.
pub(crate) async fn abort(txn: Box<dyn LedgerTxn>, err: LedgerError) -> LedgerError {
    if let Err(rollback_err) = txn.rollback().await {
        tracing::warn!(error = %rollback_err, "transaction rollback failed");
    }
    err
}

/// The posting engine: the single write path into the journal.
#[derive(Debug, Clone)]
pub struct PostingEngine<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> PostingEngine<S> {
    /// Creates an engine over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Validates and persists an entry, posting it in the same unit of work
    /// when `auto_post` is set.
    ///
    /// # Errors
    ///
    /// Returns a validation, account, or storage error; on any error nothing
    /// is persisted.
    pub async fn submit_entry(&self, input: EntryInput) -> Result<EntryResult, LedgerError> {
        let mut txn = self.store.begin().await?;
        match submit_entry_in(txn.as_mut(), &input).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Posts a draft entry, applying its balance effects.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::EntryNotFound`] or [`LedgerError::NotDraft`],
    /// or a storage error; on any error the entry stays draft.
    pub async fn post_entry(&self, id: EntryId) -> Result<(), LedgerError> {
        let mut txn = self.store.begin().await?;
        match post_entry_in(txn.as_mut(), id).await {
            Ok(()) => txn.commit().await,
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Reverses a posted entry by posting a new entry with swapped sides.
    ///
    /// The reversal is posted immediately; after it commits, every affected
    /// balance is back to its pre-original value.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::NotPosted`] if the entry is not posted, or a
    /// validation or storage error from the reversing entry.
    pub async fn reverse_entry(
        &self,
        id: EntryId,
        reason: &str,
        entry_date: NaiveDate,
        created_by: UserId,
    ) -> Result<EntryResult, LedgerError> {
        let mut txn = self.store.begin().await?;
        match reverse_entry_in(txn.as_mut(), id, reason, entry_date, created_by).await {
            Ok(result) => {
                txn.commit().await?;
                Ok(result)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }
}

/// Validates and persists an entry inside a caller-owned transaction.
///
/// # Errors
///
/// Returns a validation error, an account error for any line, or a storage
/// error.
pub async fn submit_entry_in(
    txn: &mut dyn LedgerTxn,
    input: &EntryInput,
) -> Result<EntryResult, LedgerError> {
    let totals = validate_entry(input)?;

    // Resolve every account up front so a bad line rejects the whole entry.
    let mut accounts = Vec::with_capacity(input.lines.len());
    for line in &input.lines {
        let account = fetch_postable_account(txn, line.account_id).await?;
        accounts.push(account);
    }

    let entry_number = txn.next_entry_number().await?;
    let entry_id = EntryId::new();
    let now = Utc::now();

    let entry = JournalEntry {
        id: entry_id,
        entry_number,
        source_type: input.source_type,
        source_id: input.source_id,
        reference: input.reference.clone(),
        entry_date: input.entry_date,
        description: input.description.clone(),
        total_debit: totals.total_debit,
        total_credit: totals.total_credit,
        status: EntryStatus::Draft,
        posted_at: None,
        reverses: input.reverses,
        created_by: input.created_by,
        created_at: now,
    };

    let lines: Vec<JournalLine> = input
        .lines
        .iter()
        .enumerate()
        .map(|(idx, line)| JournalLine {
            id: LineId::new(),
            entry_id,
            line_number: i32::try_from(idx + 1).unwrap_or(i32::MAX),
            account_id: line.account_id,
            debit: line.debit,
            credit: line.credit,
            memo: line.memo.clone(),
        })
        .collect();

    txn.insert_entry(&entry, &lines).await?;

    let status = if input.auto_post {
        apply_posting(txn, &entry, &lines, &accounts).await?;
        EntryStatus::Posted
    } else {
        EntryStatus::Draft
    };

    tracing::debug!(
        entry_number,
        status = ?status,
        total = %totals.total_debit,
        "journal entry recorded"
    );

    Ok(EntryResult {
        entry_id,
        entry_number,
        status,
        totals,
        lines,
    })
}

/// Posts a draft entry inside a caller-owned transaction.
///
/// # Errors
///
/// Returns [`LedgerError::EntryNotFound`], [`LedgerError::NotDraft`], or a
/// storage error.
pub async fn post_entry_in(txn: &mut dyn LedgerTxn, id: EntryId) -> Result<(), LedgerError> {
    let (entry, lines) = txn
        .entry(id)
        .await?
        .ok_or(LedgerError::EntryNotFound(id))?;
    if !entry.can_post() {
        return Err(LedgerError::NotDraft(id));
    }

    let mut accounts = Vec::with_capacity(lines.len());
    for line in &lines {
        let account = fetch_postable_account(txn, line.account_id).await?;
        accounts.push(account);
    }

    apply_posting(txn, &entry, &lines, &accounts).await
}

/// Builds and posts the reversing entry inside a caller-owned transaction.
///
/// # Errors
///
/// Returns [`LedgerError::EntryNotFound`], [`LedgerError::NotPosted`], or an
/// error from the reversing entry itself.
pub async fn reverse_entry_in(
    txn: &mut dyn LedgerTxn,
    id: EntryId,
    reason: &str,
    entry_date: NaiveDate,
    created_by: UserId,
) -> Result<EntryResult, LedgerError> {
    let (original, original_lines) = txn
        .entry(id)
        .await?
        .ok_or(LedgerError::EntryNotFound(id))?;
    if original.status != EntryStatus::Posted {
        return Err(LedgerError::NotPosted(id));
    }

    let input = build_reversal(&original, &original_lines, reason, entry_date, created_by);
    submit_entry_in(txn, &input).await
}

/// Marks the entry posted and propagates every line's balance effect.
async fn apply_posting(
    txn: &mut dyn LedgerTxn,
    entry: &JournalEntry,
    lines: &[JournalLine],
    accounts: &[Account],
) -> Result<(), LedgerError> {
    txn.mark_posted(entry.id, Utc::now()).await?;

    let mut parents = HashSet::new();
    for (line, account) in lines.iter().zip(accounts) {
        if let Some(parent_id) = apply_line_effect(txn, account, line).await? {
            parents.insert(parent_id);
        }
    }

    // Header drift only degrades reporting rollups; the posting itself
    // stands even if the recomputation fails, and the reconciler will
    // repair the headers on its next pass.
    if let Err(err) = recompute_header_balances(txn, parents).await {
        tracing::warn!(
            entry_number = entry.entry_number,
            error = %err,
            "header balance recomputation failed"
        );
    }

    Ok(())
}

/// Fetches an account with a write lock, rejecting non-postable targets.
async fn fetch_postable_account(
    txn: &mut dyn LedgerTxn,
    id: AccountId,
) -> Result<Account, LedgerError> {
    let account = txn
        .account_for_update(id)
        .await?
        .ok_or(LedgerError::AccountNotFound(id))?;
    if account.is_header {
        return Err(LedgerError::AccountNotPostable(id));
    }
    if !account.is_active {
        return Err(LedgerError::AccountInactive(id));
    }
    Ok(account)
}
