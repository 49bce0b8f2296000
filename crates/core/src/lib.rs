//! Core posting engine for Arca.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the posting engine live here.
//!
//! # Modules
//!
//! - `ledger` - Double-entry journal domain: accounts, entries, validation, reversal
//! - `engine` - Posting engine, coordinator, balance propagation, reconciliation
//!
//! Storage is reached through the [`engine::store`] unit-of-work traits; the
//! `arca-db` crate provides the SQL implementation and [`engine::memory`]
//! provides an in-memory one for tests and embedding.

pub mod engine;
pub mod ledger;
