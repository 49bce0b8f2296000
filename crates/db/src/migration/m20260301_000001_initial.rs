//! Initial database migration.
//!
//! Creates the journal schema: enums, the chart of accounts, journal entries
//! and lines, the idempotency ledger, resource balances with their movement
//! audit trail, and the document number sequence.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        db.execute_unprepared(ENUMS_SQL).await?;
        db.execute_unprepared(ACCOUNTS_SQL).await?;
        db.execute_unprepared(JOURNAL_ENTRIES_SQL).await?;
        db.execute_unprepared(JOURNAL_LINES_SQL).await?;
        db.execute_unprepared(PROCESSED_TRANSACTIONS_SQL).await?;
        db.execute_unprepared(RESOURCE_BALANCES_SQL).await?;
        db.execute_unprepared(RESOURCE_MOVEMENTS_SQL).await?;
        db.execute_unprepared(DOCUMENT_SEQUENCES_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
-- Account type classification
CREATE TYPE account_type AS ENUM (
    'asset',
    'liability',
    'equity',
    'revenue',
    'expense'
);

-- Report grouping sub-classification
CREATE TYPE account_category AS ENUM (
    'current_asset',
    'fixed_asset',
    'current_liability',
    'long_term_liability',
    'owners_equity',
    'operating_revenue',
    'other_revenue',
    'cost_of_sales',
    'operating_expense',
    'other_expense'
);

-- Business event tag
CREATE TYPE source_type AS ENUM (
    'sale',
    'purchase',
    'payment',
    'manual',
    'reversal',
    'opening',
    'tax'
);

-- Journal entry lifecycle
CREATE TYPE entry_status AS ENUM ('draft', 'posted');
";

const ACCOUNTS_SQL: &str = r"
CREATE TABLE accounts (
    id UUID PRIMARY KEY,
    code VARCHAR(20) NOT NULL UNIQUE,
    name VARCHAR(255) NOT NULL,
    account_type account_type NOT NULL,
    category account_category,
    is_header BOOLEAN NOT NULL DEFAULT FALSE,
    parent_id UUID REFERENCES accounts(id),
    level SMALLINT NOT NULL DEFAULT 1 CHECK (level BETWEEN 1 AND 4),
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0,
    balance_owned_externally BOOLEAN NOT NULL DEFAULT FALSE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_accounts_parent ON accounts(parent_id);
CREATE INDEX idx_accounts_type ON accounts(account_type);
";

const JOURNAL_ENTRIES_SQL: &str = r"
CREATE TABLE journal_entries (
    id UUID PRIMARY KEY,
    entry_number BIGINT NOT NULL UNIQUE,
    source_type source_type NOT NULL,
    source_id UUID,
    reference VARCHAR(100),
    entry_date DATE NOT NULL,
    description TEXT NOT NULL,
    total_debit NUMERIC(19, 4) NOT NULL,
    total_credit NUMERIC(19, 4) NOT NULL,
    status entry_status NOT NULL DEFAULT 'draft',
    posted_at TIMESTAMPTZ,
    reverses UUID REFERENCES journal_entries(id),
    created_by UUID NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),

    -- A posted entry always carries its posting time; debits equal credits.
    CONSTRAINT chk_posted_has_timestamp
        CHECK (status != 'posted' OR posted_at IS NOT NULL),
    CONSTRAINT chk_balanced CHECK (total_debit = total_credit)
);

CREATE INDEX idx_journal_entries_date ON journal_entries(entry_date);
CREATE INDEX idx_journal_entries_source ON journal_entries(source_type, source_id);
CREATE INDEX idx_journal_entries_status ON journal_entries(status);
";

const JOURNAL_LINES_SQL: &str = r"
CREATE TABLE journal_lines (
    id UUID PRIMARY KEY,
    entry_id UUID NOT NULL REFERENCES journal_entries(id) ON DELETE CASCADE,
    line_number INTEGER NOT NULL,
    account_id UUID NOT NULL REFERENCES accounts(id),
    debit NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (debit >= 0),
    credit NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (credit >= 0),
    memo TEXT,

    -- Exactly one side of each line is non-zero.
    CONSTRAINT chk_single_side CHECK (
        (debit > 0 AND credit = 0) OR (credit > 0 AND debit = 0)
    ),
    CONSTRAINT uq_entry_line UNIQUE (entry_id, line_number)
);

CREATE INDEX idx_journal_lines_account ON journal_lines(account_id);
";

const PROCESSED_TRANSACTIONS_SQL: &str = r"
CREATE TABLE processed_transactions (
    transaction_id VARCHAR(100) PRIMARY KEY,
    source_type source_type NOT NULL,
    entry_id UUID REFERENCES journal_entries(id),
    processed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const RESOURCE_BALANCES_SQL: &str = r"
CREATE TABLE resource_balances (
    id UUID PRIMARY KEY,
    name VARCHAR(255) NOT NULL,
    balance NUMERIC(19, 4) NOT NULL DEFAULT 0 CHECK (balance >= 0),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
";

const RESOURCE_MOVEMENTS_SQL: &str = r"
CREATE TABLE resource_movements (
    id UUID PRIMARY KEY,
    resource_id UUID NOT NULL REFERENCES resource_balances(id),
    amount NUMERIC(19, 4) NOT NULL,
    previous_balance NUMERIC(19, 4) NOT NULL,
    new_balance NUMERIC(19, 4) NOT NULL,
    transaction_id VARCHAR(100) NOT NULL,
    occurred_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX idx_resource_movements_resource ON resource_movements(resource_id);
CREATE INDEX idx_resource_movements_txn ON resource_movements(transaction_id);
";

const DOCUMENT_SEQUENCES_SQL: &str = r"
CREATE TABLE document_sequences (
    name VARCHAR(50) PRIMARY KEY,
    next_value BIGINT NOT NULL DEFAULT 0
);

INSERT INTO document_sequences (name, next_value) VALUES ('journal_entry', 0);
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS document_sequences;
DROP TABLE IF EXISTS resource_movements;
DROP TABLE IF EXISTS resource_balances;
DROP TABLE IF EXISTS processed_transactions;
DROP TABLE IF EXISTS journal_lines;
DROP TABLE IF EXISTS journal_entries;
DROP TABLE IF EXISTS accounts;
DROP TYPE IF EXISTS entry_status;
DROP TYPE IF EXISTS source_type;
DROP TYPE IF EXISTS account_category;
DROP TYPE IF EXISTS account_type;
";
