//! Postgres enum mappings with conversions to the domain enums.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use arca_core::ledger;

/// Account type classification (`account_type` enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_type")]
pub enum AccountType {
    /// Resources owned.
    #[sea_orm(string_value = "asset")]
    Asset,
    /// Obligations owed.
    #[sea_orm(string_value = "liability")]
    Liability,
    /// Owner's residual interest.
    #[sea_orm(string_value = "equity")]
    Equity,
    /// Income from operations.
    #[sea_orm(string_value = "revenue")]
    Revenue,
    /// Costs of operations.
    #[sea_orm(string_value = "expense")]
    Expense,
}

impl From<AccountType> for ledger::AccountType {
    fn from(value: AccountType) -> Self {
        match value {
            AccountType::Asset => Self::Asset,
            AccountType::Liability => Self::Liability,
            AccountType::Equity => Self::Equity,
            AccountType::Revenue => Self::Revenue,
            AccountType::Expense => Self::Expense,
        }
    }
}

impl From<ledger::AccountType> for AccountType {
    fn from(value: ledger::AccountType) -> Self {
        match value {
            ledger::AccountType::Asset => Self::Asset,
            ledger::AccountType::Liability => Self::Liability,
            ledger::AccountType::Equity => Self::Equity,
            ledger::AccountType::Revenue => Self::Revenue,
            ledger::AccountType::Expense => Self::Expense,
        }
    }
}

/// Report grouping sub-classification (`account_category` enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "account_category")]
pub enum AccountCategory {
    /// Cash, receivables, inventory.
    #[sea_orm(string_value = "current_asset")]
    CurrentAsset,
    /// Property and equipment.
    #[sea_orm(string_value = "fixed_asset")]
    FixedAsset,
    /// Payables, accrued tax.
    #[sea_orm(string_value = "current_liability")]
    CurrentLiability,
    /// Loans and other long-term obligations.
    #[sea_orm(string_value = "long_term_liability")]
    LongTermLiability,
    /// Capital and retained earnings.
    #[sea_orm(string_value = "owners_equity")]
    OwnersEquity,
    /// Revenue from primary operations.
    #[sea_orm(string_value = "operating_revenue")]
    OperatingRevenue,
    /// Interest and other income.
    #[sea_orm(string_value = "other_revenue")]
    OtherRevenue,
    /// Cost of goods sold.
    #[sea_orm(string_value = "cost_of_sales")]
    CostOfSales,
    /// Selling, general, administrative expense.
    #[sea_orm(string_value = "operating_expense")]
    OperatingExpense,
    /// Non-operating expense.
    #[sea_orm(string_value = "other_expense")]
    OtherExpense,
}

impl From<AccountCategory> for ledger::AccountCategory {
    fn from(value: AccountCategory) -> Self {
        match value {
            AccountCategory::CurrentAsset => Self::CurrentAsset,
            AccountCategory::FixedAsset => Self::FixedAsset,
            AccountCategory::CurrentLiability => Self::CurrentLiability,
            AccountCategory::LongTermLiability => Self::LongTermLiability,
            AccountCategory::OwnersEquity => Self::OwnersEquity,
            AccountCategory::OperatingRevenue => Self::OperatingRevenue,
            AccountCategory::OtherRevenue => Self::OtherRevenue,
            AccountCategory::CostOfSales => Self::CostOfSales,
            AccountCategory::OperatingExpense => Self::OperatingExpense,
            AccountCategory::OtherExpense => Self::OtherExpense,
        }
    }
}

impl From<ledger::AccountCategory> for AccountCategory {
    fn from(value: ledger::AccountCategory) -> Self {
        match value {
            ledger::AccountCategory::CurrentAsset => Self::CurrentAsset,
            ledger::AccountCategory::FixedAsset => Self::FixedAsset,
            ledger::AccountCategory::CurrentLiability => Self::CurrentLiability,
            ledger::AccountCategory::LongTermLiability => Self::LongTermLiability,
            ledger::AccountCategory::OwnersEquity => Self::OwnersEquity,
            ledger::AccountCategory::OperatingRevenue => Self::OperatingRevenue,
            ledger::AccountCategory::OtherRevenue => Self::OtherRevenue,
            ledger::AccountCategory::CostOfSales => Self::CostOfSales,
            ledger::AccountCategory::OperatingExpense => Self::OperatingExpense,
            ledger::AccountCategory::OtherExpense => Self::OtherExpense,
        }
    }
}

/// Business event tag (`source_type` enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "source_type")]
pub enum SourceType {
    /// Sales invoice or sale confirmation.
    #[sea_orm(string_value = "sale")]
    Sale,
    /// Vendor purchase.
    #[sea_orm(string_value = "purchase")]
    Purchase,
    /// Payment (incoming or outgoing).
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Manually keyed journal entry.
    #[sea_orm(string_value = "manual")]
    Manual,
    /// Reversal of a previously posted entry.
    #[sea_orm(string_value = "reversal")]
    Reversal,
    /// Opening balance entry.
    #[sea_orm(string_value = "opening")]
    Opening,
    /// Tax remittance.
    #[sea_orm(string_value = "tax")]
    Tax,
}

impl From<SourceType> for ledger::SourceType {
    fn from(value: SourceType) -> Self {
        match value {
            SourceType::Sale => Self::Sale,
            SourceType::Purchase => Self::Purchase,
            SourceType::Payment => Self::Payment,
            SourceType::Manual => Self::Manual,
            SourceType::Reversal => Self::Reversal,
            SourceType::Opening => Self::Opening,
            SourceType::Tax => Self::Tax,
        }
    }
}

impl From<ledger::SourceType> for SourceType {
    fn from(value: ledger::SourceType) -> Self {
        match value {
            ledger::SourceType::Sale => Self::Sale,
            ledger::SourceType::Purchase => Self::Purchase,
            ledger::SourceType::Payment => Self::Payment,
            ledger::SourceType::Manual => Self::Manual,
            ledger::SourceType::Reversal => Self::Reversal,
            ledger::SourceType::Opening => Self::Opening,
            ledger::SourceType::Tax => Self::Tax,
        }
    }
}

/// Journal entry status (`entry_status` enum).
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_status")]
pub enum EntryStatus {
    /// Persisted but not yet affecting balances.
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Posted to the ledger (immutable).
    #[sea_orm(string_value = "posted")]
    Posted,
}

impl From<EntryStatus> for ledger::EntryStatus {
    fn from(value: EntryStatus) -> Self {
        match value {
            EntryStatus::Draft => Self::Draft,
            EntryStatus::Posted => Self::Posted,
        }
    }
}

impl From<ledger::EntryStatus> for EntryStatus {
    fn from(value: ledger::EntryStatus) -> Self {
        match value {
            ledger::EntryStatus::Draft => Self::Draft,
            ledger::EntryStatus::Posted => Self::Posted,
        }
    }
}
