//! Double-entry journal domain.
//!
//! This module implements the core ledger vocabulary:
//! - Accounts and the normal-balance convention
//! - Journal entries and lines
//! - Business rule validation for proposed entries
//! - Reversal construction
//! - Error types for ledger operations

pub mod account;
pub mod entry;
pub mod error;
pub mod reversal;
pub mod types;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use account::{Account, AccountCategory, AccountType, NormalBalance, MAX_HIERARCHY_DEPTH};
pub use entry::{EntryStatus, JournalEntry, JournalLine, SourceType};
pub use error::LedgerError;
pub use reversal::build_reversal;
pub use types::{EntryInput, EntryResult, EntryTotals, LineInput};
pub use validation::validate_entry;
