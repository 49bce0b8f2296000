//! Database layer with `SeaORM` entities and the SQL ledger store.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for the journal schema
//! - Database migrations
//! - [`SqlLedgerStore`], the Postgres-backed unit-of-work implementation
//!   the posting engine runs against

pub mod entities;
pub mod migration;
pub mod store;

pub use store::SqlLedgerStore;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use arca_shared::config::DatabaseConfig;

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(&config.url);
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections);
    Database::connect(options).await
}
