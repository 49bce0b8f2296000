//! `SeaORM` entity definitions for the journal schema.

pub mod accounts;
pub mod document_sequences;
pub mod journal_entries;
pub mod journal_lines;
pub mod processed_transactions;
pub mod resource_balances;
pub mod resource_movements;
pub mod sea_orm_active_enums;
