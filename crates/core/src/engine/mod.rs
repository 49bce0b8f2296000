//! The posting engine: the single write path into the journal.
//!
//! - [`store`]: the unit-of-work abstraction the engine runs against
//! - [`memory`]: in-memory store for tests and single-process embeddings
//! - [`posting`]: entry creation, posting, and reversal
//! - [`propagation`]: cached balance maintenance, leaf and header
//! - [`coordinator`]: composite operations with idempotent suppression
//! - [`reconcile`]: journal-derived validation and repair

pub mod coordinator;
pub mod memory;
pub mod posting;
pub mod propagation;
pub mod reconcile;
pub mod store;

#[cfg(test)]
mod scenarios;

pub use coordinator::{BalanceUpdateRequest, PostingCoordinator, PostingOutcome, ResourceDelta};
pub use memory::MemoryStore;
pub use posting::PostingEngine;
pub use reconcile::{
    AccountBalanceView, AccountValidation, BalanceValidator, EquationResult, EQUATION_TOLERANCE,
};
pub use store::{
    LedgerStore, LedgerTxn, ProcessedTransaction, ResourceBalance, ResourceMovement,
};
