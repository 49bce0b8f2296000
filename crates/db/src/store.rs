//! Postgres-backed [`LedgerStore`] implementation.
//!
//! Each unit of work maps to one database transaction. Row locks
//! (`SELECT ... FOR UPDATE`) back the `*_for_update` fetches, balance deltas
//! are applied as SQL-level increments, and the idempotency ledger's primary
//! key is the final duplicate guard.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, RuntimeErr, Set, SqlErr, TransactionTrait,
};

use arca_core::engine::{
    LedgerStore, LedgerTxn, ProcessedTransaction, ResourceBalance, ResourceMovement,
};
use arca_core::ledger::{Account, JournalEntry, JournalLine, LedgerError};
use arca_shared::types::{AccountId, EntryId, LineId, ResourceId, UserId};

use crate::entities::{
    accounts, document_sequences, journal_entries, journal_lines, processed_transactions,
    resource_balances, resource_movements, sea_orm_active_enums,
};

/// Name of the journal entry number sequence row.
const ENTRY_SEQUENCE: &str = "journal_entry";

/// Postgres-backed ledger store.
#[derive(Debug, Clone)]
pub struct SqlLedgerStore {
    db: DatabaseConnection,
}

impl SqlLedgerStore {
    /// Creates a store over a connection pool.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LedgerStore for SqlLedgerStore {
    async fn begin(&self) -> Result<Box<dyn LedgerTxn>, LedgerError> {
        let txn = self.db.begin().await.map_err(persistence)?;
        Ok(Box::new(SqlLedgerTxn { txn }))
    }
}

/// A unit of work over one database transaction.
struct SqlLedgerTxn {
    txn: DatabaseTransaction,
}

#[async_trait]
impl LedgerTxn for SqlLedgerTxn {
    async fn account(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(model.map(account_from_model))
    }

    async fn account_for_update(&mut self, id: AccountId) -> Result<Option<Account>, LedgerError> {
        let model = accounts::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(model.map(account_from_model))
    }

    async fn all_accounts(&mut self) -> Result<Vec<Account>, LedgerError> {
        let models = accounts::Entity::find()
            .order_by_asc(accounts::Column::Code)
            .all(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(models.into_iter().map(account_from_model).collect())
    }

    async fn children_of(&mut self, id: AccountId) -> Result<Vec<Account>, LedgerError> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::ParentId.eq(id.into_inner()))
            .order_by_asc(accounts::Column::Code)
            .all(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(models.into_iter().map(account_from_model).collect())
    }

    async fn add_to_balance(&mut self, id: AccountId, delta: Decimal) -> Result<(), LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(
                accounts::Column::Balance,
                Expr::col(accounts::Column::Balance).add(delta),
            )
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(persistence)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn set_balance(&mut self, id: AccountId, balance: Decimal) -> Result<(), LedgerError> {
        let result = accounts::Entity::update_many()
            .col_expr(accounts::Column::Balance, Expr::value(balance))
            .col_expr(accounts::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(accounts::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(persistence)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::AccountNotFound(id));
        }
        Ok(())
    }

    async fn next_entry_number(&mut self) -> Result<i64, LedgerError> {
        // The sequence row lock serializes number issuance across writers.
        let sequence = document_sequences::Entity::find_by_id(ENTRY_SEQUENCE)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(persistence)?
            .ok_or_else(|| {
                LedgerError::Persistence(format!("missing document sequence '{ENTRY_SEQUENCE}'"))
            })?;

        let issued = sequence.next_value + 1;
        let mut active: document_sequences::ActiveModel = sequence.into();
        active.next_value = Set(issued);
        active.update(&self.txn).await.map_err(persistence)?;
        Ok(issued)
    }

    async fn insert_entry(
        &mut self,
        entry: &JournalEntry,
        lines: &[JournalLine],
    ) -> Result<(), LedgerError> {
        entry_to_active(entry)
            .insert(&self.txn)
            .await
            .map_err(persistence)?;
        journal_lines::Entity::insert_many(lines.iter().map(line_to_active))
            .exec(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(())
    }

    async fn entry(
        &mut self,
        id: EntryId,
    ) -> Result<Option<(JournalEntry, Vec<JournalLine>)>, LedgerError> {
        let Some(model) = journal_entries::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(persistence)?
        else {
            return Ok(None);
        };

        let lines = journal_lines::Entity::find()
            .filter(journal_lines::Column::EntryId.eq(id.into_inner()))
            .order_by_asc(journal_lines::Column::LineNumber)
            .all(&self.txn)
            .await
            .map_err(persistence)?;

        Ok(Some((
            entry_from_model(model),
            lines.into_iter().map(line_from_model).collect(),
        )))
    }

    async fn mark_posted(
        &mut self,
        id: EntryId,
        posted_at: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let result = journal_entries::Entity::update_many()
            .col_expr(
                journal_entries::Column::Status,
                Expr::value(sea_orm_active_enums::EntryStatus::Posted),
            )
            .col_expr(journal_entries::Column::PostedAt, Expr::value(posted_at))
            .filter(journal_entries::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(persistence)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::EntryNotFound(id));
        }
        Ok(())
    }

    async fn posted_lines_for_account(
        &mut self,
        id: AccountId,
    ) -> Result<Vec<JournalLine>, LedgerError> {
        let models = journal_lines::Entity::find()
            .filter(journal_lines::Column::AccountId.eq(id.into_inner()))
            .inner_join(journal_entries::Entity)
            .filter(
                journal_entries::Column::Status.eq(sea_orm_active_enums::EntryStatus::Posted),
            )
            .all(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(models.into_iter().map(line_from_model).collect())
    }

    async fn resource_for_update(
        &mut self,
        id: ResourceId,
    ) -> Result<Option<ResourceBalance>, LedgerError> {
        let model = resource_balances::Entity::find_by_id(id.into_inner())
            .lock_exclusive()
            .one(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(model.map(resource_from_model))
    }

    async fn update_resource_balance(
        &mut self,
        id: ResourceId,
        balance: Decimal,
    ) -> Result<(), LedgerError> {
        let result = resource_balances::Entity::update_many()
            .col_expr(resource_balances::Column::Balance, Expr::value(balance))
            .col_expr(resource_balances::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(resource_balances::Column::Id.eq(id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(persistence)?;
        if result.rows_affected == 0 {
            return Err(LedgerError::ResourceNotFound(id));
        }
        Ok(())
    }

    async fn insert_movement(&mut self, movement: &ResourceMovement) -> Result<(), LedgerError> {
        movement_to_active(movement)
            .insert(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(())
    }

    async fn transaction_processed(&mut self, transaction_id: &str) -> Result<bool, LedgerError> {
        let record = processed_transactions::Entity::find_by_id(transaction_id)
            .one(&self.txn)
            .await
            .map_err(persistence)?;
        Ok(record.is_some())
    }

    async fn record_processed(&mut self, record: &ProcessedTransaction) -> Result<(), LedgerError> {
        processed_to_active(record)
            .insert(&self.txn)
            .await
            .map_err(|err| match err.sql_err() {
                Some(SqlErr::UniqueConstraintViolation(_)) => {
                    LedgerError::DuplicateTransaction(record.transaction_id.clone())
                }
                _ => persistence(err),
            })?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), LedgerError> {
        self.txn.commit().await.map_err(persistence)
    }

    async fn rollback(self: Box<Self>) -> Result<(), LedgerError> {
        self.txn.rollback().await.map_err(persistence)
    }
}

fn persistence(err: DbErr) -> LedgerError {
    let sqlstate = match &err {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(db)))
        | DbErr::Exec(RuntimeErr::SqlxError(sqlx::Error::Database(db))) => {
            db.code().map(std::borrow::Cow::into_owned)
        }
        _ => None,
    };
    classify_db_err(sqlstate.as_deref(), err.to_string())
}

// 55P03 lock_not_available, 40P01 deadlock_detected: lock contention the
// caller may retry. Everything else is a storage failure.
fn classify_db_err(sqlstate: Option<&str>, message: String) -> LedgerError {
    match sqlstate {
        Some("55P03" | "40P01") => LedgerError::Concurrency(message),
        _ => LedgerError::Persistence(message),
    }
}

// ============================================================
// Model <-> domain mapping
// ============================================================

fn account_from_model(model: accounts::Model) -> Account {
    Account {
        id: AccountId::from_uuid(model.id),
        code: model.code,
        name: model.name,
        account_type: model.account_type.into(),
        category: model.category.map(Into::into),
        is_header: model.is_header,
        parent_id: model.parent_id.map(AccountId::from_uuid),
        level: model.level,
        is_active: model.is_active,
        balance: model.balance,
        balance_owned_externally: model.balance_owned_externally,
    }
}

fn entry_from_model(model: journal_entries::Model) -> JournalEntry {
    JournalEntry {
        id: EntryId::from_uuid(model.id),
        entry_number: model.entry_number,
        source_type: model.source_type.into(),
        source_id: model.source_id,
        reference: model.reference,
        entry_date: model.entry_date,
        description: model.description,
        total_debit: model.total_debit,
        total_credit: model.total_credit,
        status: model.status.into(),
        posted_at: model.posted_at.map(|t| t.with_timezone(&Utc)),
        reverses: model.reverses.map(EntryId::from_uuid),
        created_by: UserId::from_uuid(model.created_by),
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn entry_to_active(entry: &JournalEntry) -> journal_entries::ActiveModel {
    journal_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        entry_number: Set(entry.entry_number),
        source_type: Set(entry.source_type.into()),
        source_id: Set(entry.source_id),
        reference: Set(entry.reference.clone()),
        entry_date: Set(entry.entry_date),
        description: Set(entry.description.clone()),
        total_debit: Set(entry.total_debit),
        total_credit: Set(entry.total_credit),
        status: Set(entry.status.into()),
        posted_at: Set(entry.posted_at.map(Into::into)),
        reverses: Set(entry.reverses.map(arca_shared::types::EntryId::into_inner)),
        created_by: Set(entry.created_by.into_inner()),
        created_at: Set(entry.created_at.into()),
    }
}

fn line_from_model(model: journal_lines::Model) -> JournalLine {
    JournalLine {
        id: LineId::from_uuid(model.id),
        entry_id: EntryId::from_uuid(model.entry_id),
        line_number: model.line_number,
        account_id: AccountId::from_uuid(model.account_id),
        debit: model.debit,
        credit: model.credit,
        memo: model.memo,
    }
}

fn line_to_active(line: &JournalLine) -> journal_lines::ActiveModel {
    journal_lines::ActiveModel {
        id: Set(line.id.into_inner()),
        entry_id: Set(line.entry_id.into_inner()),
        line_number: Set(line.line_number),
        account_id: Set(line.account_id.into_inner()),
        debit: Set(line.debit),
        credit: Set(line.credit),
        memo: Set(line.memo.clone()),
    }
}

fn resource_from_model(model: resource_balances::Model) -> ResourceBalance {
    ResourceBalance {
        id: ResourceId::from_uuid(model.id),
        name: model.name,
        balance: model.balance,
    }
}

fn movement_to_active(movement: &ResourceMovement) -> resource_movements::ActiveModel {
    resource_movements::ActiveModel {
        id: Set(movement.id),
        resource_id: Set(movement.resource_id.into_inner()),
        amount: Set(movement.amount),
        previous_balance: Set(movement.previous_balance),
        new_balance: Set(movement.new_balance),
        transaction_id: Set(movement.transaction_id.clone()),
        occurred_at: Set(movement.occurred_at.into()),
    }
}

fn processed_to_active(record: &ProcessedTransaction) -> processed_transactions::ActiveModel {
    processed_transactions::ActiveModel {
        transaction_id: Set(record.transaction_id.clone()),
        source_type: Set(record.source_type.into()),
        entry_id: Set(record.entry_id.map(arca_shared::types::EntryId::into_inner)),
        processed_at: Set(record.processed_at.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arca_core::ledger::{AccountType, EntryStatus, SourceType};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_lock_contention_sqlstates_map_to_retryable_concurrency() {
        for code in ["55P03", "40P01"] {
            let err = classify_db_err(Some(code), "could not obtain lock".to_string());
            assert!(matches!(err, LedgerError::Concurrency(_)));
            assert!(err.is_retryable());
        }

        let err = classify_db_err(Some("23505"), "duplicate key".to_string());
        assert!(matches!(err, LedgerError::Persistence(_)));
        assert!(!err.is_retryable());

        let err = classify_db_err(None, "connection reset".to_string());
        assert!(matches!(err, LedgerError::Persistence(_)));
    }

    #[test]
    fn test_account_mapping() {
        let parent = Uuid::now_v7();
        let model = accounts::Model {
            id: Uuid::now_v7(),
            code: "1101".to_string(),
            name: "Cash".to_string(),
            account_type: sea_orm_active_enums::AccountType::Asset,
            category: Some(sea_orm_active_enums::AccountCategory::CurrentAsset),
            is_header: false,
            parent_id: Some(parent),
            level: 2,
            is_active: true,
            balance: dec!(1500.50),
            balance_owned_externally: false,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };

        let account = account_from_model(model.clone());
        assert_eq!(account.id.into_inner(), model.id);
        assert_eq!(account.code, "1101");
        assert_eq!(account.account_type, AccountType::Asset);
        assert_eq!(account.parent_id.map(AccountId::into_inner), Some(parent));
        assert_eq!(account.balance, dec!(1500.50));
        assert!(account.is_postable());
    }

    #[test]
    fn test_entry_round_trip() {
        let entry = JournalEntry {
            id: EntryId::new(),
            entry_number: 42,
            source_type: SourceType::Sale,
            source_id: Some(Uuid::now_v7()),
            reference: Some("INV-001".to_string()),
            entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            description: "Cash sale".to_string(),
            total_debit: dec!(100),
            total_credit: dec!(100),
            status: EntryStatus::Posted,
            posted_at: Some(Utc::now()),
            reverses: None,
            created_by: UserId::new(),
            created_at: Utc::now(),
        };

        let active = entry_to_active(&entry);
        let model = journal_entries::Model {
            id: entry.id.into_inner(),
            entry_number: 42,
            source_type: active.source_type.clone().unwrap(),
            source_id: entry.source_id,
            reference: entry.reference.clone(),
            entry_date: entry.entry_date,
            description: entry.description.clone(),
            total_debit: entry.total_debit,
            total_credit: entry.total_credit,
            status: active.status.clone().unwrap(),
            posted_at: active.posted_at.clone().unwrap(),
            reverses: None,
            created_by: entry.created_by.into_inner(),
            created_at: active.created_at.clone().unwrap(),
        };

        let back = entry_from_model(model);
        assert_eq!(back.id, entry.id);
        assert_eq!(back.entry_number, entry.entry_number);
        assert_eq!(back.source_type, entry.source_type);
        assert_eq!(back.status, EntryStatus::Posted);
        assert_eq!(back.total_debit, entry.total_debit);
        assert_eq!(back.posted_at, entry.posted_at);
    }

    #[test]
    fn test_line_round_trip() {
        let line = JournalLine {
            id: LineId::new(),
            entry_id: EntryId::new(),
            line_number: 1,
            account_id: AccountId::new(),
            debit: dec!(100),
            credit: Decimal::ZERO,
            memo: Some("Cash".to_string()),
        };

        let active = line_to_active(&line);
        let model = journal_lines::Model {
            id: line.id.into_inner(),
            entry_id: line.entry_id.into_inner(),
            line_number: active.line_number.clone().unwrap(),
            account_id: line.account_id.into_inner(),
            debit: line.debit,
            credit: line.credit,
            memo: line.memo.clone(),
        };

        let back = line_from_model(model);
        assert_eq!(back.id, line.id);
        assert_eq!(back.entry_id, line.entry_id);
        assert_eq!(back.debit, line.debit);
        assert_eq!(back.memo, line.memo);
    }

    #[test]
    fn test_enum_conversions_cover_all_variants() {
        for account_type in AccountType::ALL {
            let db: sea_orm_active_enums::AccountType = account_type.into();
            let back: AccountType = db.into();
            assert_eq!(back, account_type);
        }

        for source_type in [
            SourceType::Sale,
            SourceType::Purchase,
            SourceType::Payment,
            SourceType::Manual,
            SourceType::Reversal,
            SourceType::Opening,
            SourceType::Tax,
        ] {
            let db: sea_orm_active_enums::SourceType = source_type.into();
            let back: SourceType = db.into();
            assert_eq!(back, source_type);
        }
    }
}
