//! Input and result types for entry creation.

use arca_shared::types::{AccountId, EntryId, UserId};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entry::{EntryStatus, JournalLine, SourceType};

/// Input for a single journal line.
#[derive(Debug, Clone)]
pub struct LineInput {
    /// The account to post to (must be a postable leaf).
    pub account_id: AccountId,
    /// Debit amount (zero for credit lines).
    pub debit: Decimal,
    /// Credit amount (zero for debit lines).
    pub credit: Decimal,
    /// Optional memo for this line.
    pub memo: Option<String>,
}

/// Input for creating a journal entry.
#[derive(Debug, Clone)]
pub struct EntryInput {
    /// Business event tag.
    pub source_type: SourceType,
    /// The business record that caused this entry, if any.
    pub source_id: Option<Uuid>,
    /// Human reference string.
    pub reference: Option<String>,
    /// Accounting date of the event.
    pub entry_date: NaiveDate,
    /// Description of the event.
    pub description: String,
    /// The journal lines (must have at least 2).
    pub lines: Vec<LineInput>,
    /// Post the entry in the same unit of work as creation.
    pub auto_post: bool,
    /// The posted entry this input reverses, if any.
    pub reverses: Option<EntryId>,
    /// Actor creating the entry.
    pub created_by: UserId,
}

/// Entry totals for validation and display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryTotals {
    /// Total debit amount.
    pub total_debit: Decimal,
    /// Total credit amount.
    pub total_credit: Decimal,
    /// Whether debits equal credits exactly.
    pub is_balanced: bool,
}

impl EntryTotals {
    /// Creates new totals from debit and credit sums.
    #[must_use]
    pub fn new(total_debit: Decimal, total_credit: Decimal) -> Self {
        Self {
            total_debit,
            total_credit,
            is_balanced: total_debit == total_credit,
        }
    }

    /// Returns the difference between debits and credits.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.total_debit - self.total_credit
    }
}

/// Result of entry creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryResult {
    /// The entry ID.
    pub entry_id: EntryId,
    /// The issued sequential entry number.
    pub entry_number: i64,
    /// Status after the call (posted when auto-post was requested).
    pub status: EntryStatus,
    /// The computed totals.
    pub totals: EntryTotals,
    /// Per-line echo in input order.
    pub lines: Vec<JournalLine>,
}
