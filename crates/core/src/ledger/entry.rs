//! Journal entry and line domain types.

use arca_shared::types::{AccountId, EntryId, LineId, UserId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag for the business event that produced an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// Sales invoice or sale confirmation.
    Sale,
    /// Vendor purchase.
    Purchase,
    /// Payment (incoming or outgoing).
    Payment,
    /// Manually keyed journal entry.
    Manual,
    /// Reversal of a previously posted entry.
    Reversal,
    /// Opening balance entry.
    Opening,
    /// Tax remittance.
    Tax,
}

/// Journal entry status.
///
/// Posted is terminal: a posted entry's lines are immutable and correction
/// happens via a reversing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Entry is persisted but does not yet affect balances.
    Draft,
    /// Entry has been posted to the ledger (immutable).
    Posted,
}

impl EntryStatus {
    /// Returns true if the entry can no longer be mutated.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Posted)
    }
}

/// A journal entry: one balanced business event in the general ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Unique identifier.
    pub id: EntryId,
    /// Sequential entry number issued by the numbering collaborator.
    pub entry_number: i64,
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
    /// Sum of the lines' debit amounts.
    pub total_debit: Decimal,
    /// Sum of the lines' credit amounts.
    pub total_credit: Decimal,
    /// Current status.
    pub status: EntryStatus,
    /// When the entry transitioned to posted.
    pub posted_at: Option<DateTime<Utc>>,
    /// The posted entry this one reverses, if any.
    pub reverses: Option<EntryId>,
    /// Actor who created the entry.
    pub created_by: UserId,
    /// When the entry was created.
    pub created_at: DateTime<Utc>,
}

impl JournalEntry {
    /// Returns true if debits equal credits exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }

    /// Returns true if the entry may transition to posted.
    #[must_use]
    pub fn can_post(&self) -> bool {
        self.status == EntryStatus::Draft && self.is_balanced()
    }
}

/// A single debit or credit line within a journal entry.
///
/// Exactly one of `debit`/`credit` is non-zero; both are non-negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalLine {
    /// Unique identifier.
    pub id: LineId,
    /// The entry this line belongs to.
    pub entry_id: EntryId,
    /// 1-based position in input order. Significant for audit display only.
    pub line_number: i32,
    /// The account affected by this line.
    pub account_id: AccountId,
    /// Debit amount (zero if this is a credit line).
    pub debit: Decimal,
    /// Credit amount (zero if this is a debit line).
    pub credit: Decimal,
    /// Optional memo for this line.
    pub memo: Option<String>,
}

impl JournalLine {
    /// Returns true if this is a debit line.
    #[must_use]
    pub fn is_debit(&self) -> bool {
        self.debit > Decimal::ZERO
    }
}
