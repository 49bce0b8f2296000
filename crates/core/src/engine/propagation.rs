//! Balance propagation from posted lines to cached account balances.
//!
//! Leaf balances move by signed delta per the normal-balance convention;
//! header balances are recomputed bottom-up as the sum of their children.
//! Aggregation follows `parent_id` relationships only.

use std::collections::HashSet;

use arca_shared::types::AccountId;
use rust_decimal::Decimal;

use crate::ledger::{Account, JournalLine, LedgerError};

use super::store::LedgerTxn;

/// Applies one posted line's effect to its account's cached balance.
///
/// Accounts whose balance is owned by an external subledger are skipped so
/// the owner's updates are not double-counted.
///
/// Returns the account's parent, for header recomputation.
///
/// # Errors
///
/// Returns a storage error if the balance write fails.
pub async fn apply_line_effect(
    txn: &mut dyn LedgerTxn,
    account: &Account,
    line: &JournalLine,
) -> Result<Option<AccountId>, LedgerError> {
    if !account.balance_owned_externally {
        let delta = account.account_type.balance_change(line.debit, line.credit);
        txn.add_to_balance(account.id, delta).await?;
    }
    Ok(account.parent_id)
}

/// Recomputes header balances for the ancestors of the given parents.
///
/// Ancestors are collected first, then recomputed deepest-first so every
/// header sums already-recomputed children. A header's balance is only
/// written when it changed.
///
/// # Errors
///
/// Returns a storage error if an ancestor cannot be read or written.
pub async fn recompute_header_balances(
    txn: &mut dyn LedgerTxn,
    parents: impl IntoIterator<Item = AccountId>,
) -> Result<(), LedgerError> {
    let mut seen = HashSet::new();
    let mut ancestors: Vec<Account> = Vec::new();
    let mut queue: Vec<AccountId> = parents.into_iter().collect();

    while let Some(id) = queue.pop() {
        if !seen.insert(id) {
            continue;
        }
        let account = txn
            .account(id)
            .await?
            .ok_or(LedgerError::AccountNotFound(id))?;
        if let Some(parent_id) = account.parent_id {
            queue.push(parent_id);
        }
        ancestors.push(account);
    }

    ancestors.sort_by(|a, b| b.level.cmp(&a.level));

    for header in ancestors {
        let children = txn.children_of(header.id).await?;
        let total: Decimal = children.iter().map(|c| c.balance).sum();
        if total != header.balance {
            txn.set_balance(header.id, total).await?;
        }
    }

    Ok(())
}
