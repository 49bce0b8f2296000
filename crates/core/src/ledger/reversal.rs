//! Reversal construction for posted entries.
//!
//! A posted entry is never edited; correction happens by posting a new entry
//! whose lines are the original's with debit and credit swapped.

use arca_shared::types::UserId;
use chrono::NaiveDate;

use super::entry::{JournalEntry, JournalLine, SourceType};
use super::types::{EntryInput, LineInput};

/// Builds the reversing input for a posted entry.
///
/// For each original line, debit and credit are swapped; accounts, amounts,
/// and order are preserved. The result carries `SourceType::Reversal`, a
/// back-link to the original, and auto-post set.
#[must_use]
pub fn build_reversal(
    original: &JournalEntry,
    original_lines: &[JournalLine],
    reason: &str,
    entry_date: NaiveDate,
    created_by: UserId,
) -> EntryInput {
    let lines = original_lines
        .iter()
        .map(|line| LineInput {
            account_id: line.account_id,
            debit: line.credit,
            credit: line.debit,
            memo: Some(match &line.memo {
                Some(memo) => format!("Reversal: {memo}"),
                None => "Reversal".to_string(),
            }),
        })
        .collect();

    EntryInput {
        source_type: SourceType::Reversal,
        source_id: Some(original.id.into_inner()),
        reference: original.reference.clone(),
        entry_date,
        description: format!(
            "Reversal of entry #{}. Reason: {reason}",
            original.entry_number
        ),
        lines,
        auto_post: true,
        reverses: Some(original.id),
        created_by,
    }
}
