//! Account domain types and the normal-balance convention.
//!
//! The debit/credit sign convention is derived in exactly one place:
//! [`AccountType::balance_change`]. Everything that moves a balance goes
//! through it.

use arca_shared::types::AccountId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// Maximum depth of the account hierarchy (root = 1).
pub const MAX_HIERARCHY_DEPTH: i16 = 4;

/// Side on which an account's balance increases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalBalance {
    /// Balance increases on debit (assets, expenses).
    Debit,
    /// Balance increases on credit (liabilities, equity, revenue).
    Credit,
}

/// Account type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Resources owned (cash, receivables, inventory).
    Asset,
    /// Obligations owed (payables, loans, tax due).
    Liability,
    /// Owner's residual interest.
    Equity,
    /// Income from operations.
    Revenue,
    /// Costs of operations.
    Expense,
}

impl AccountType {
    /// All account types, in accounting-equation order.
    pub const ALL: [Self; 5] = [
        Self::Asset,
        Self::Liability,
        Self::Equity,
        Self::Revenue,
        Self::Expense,
    ];

    /// Returns the side on which this account type's balance increases.
    #[must_use]
    pub const fn normal_balance(self) -> NormalBalance {
        match self {
            Self::Asset | Self::Expense => NormalBalance::Debit,
            Self::Liability | Self::Equity | Self::Revenue => NormalBalance::Credit,
        }
    }

    /// Calculates the cached-balance change produced by a line.
    ///
    /// Debit-normal: `debit - credit`. Credit-normal: `credit - debit`.
    #[must_use]
    pub fn balance_change(self, debit: Decimal, credit: Decimal) -> Decimal {
        match self.normal_balance() {
            NormalBalance::Debit => debit - credit,
            NormalBalance::Credit => credit - debit,
        }
    }
}

/// Sub-classification used for report grouping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountCategory {
    /// Cash, receivables, inventory.
    CurrentAsset,
    /// Property and equipment.
    FixedAsset,
    /// Payables, accrued tax.
    CurrentLiability,
    /// Loans and other long-term obligations.
    LongTermLiability,
    /// Capital and retained earnings.
    OwnersEquity,
    /// Revenue from primary operations.
    OperatingRevenue,
    /// Interest and other income.
    OtherRevenue,
    /// Cost of goods sold.
    CostOfSales,
    /// Selling, general, administrative expense.
    OperatingExpense,
    /// Non-operating expense.
    OtherExpense,
}

/// A ledger account.
///
/// Header accounts are non-postable rollups; their cached balance is the sum
/// of their non-header descendants', maintained by the balance propagator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Hierarchical account code (e.g. "1101").
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type classification.
    pub account_type: AccountType,
    /// Report grouping sub-classification.
    pub category: Option<AccountCategory>,
    /// Whether this is a non-postable rollup account.
    pub is_header: bool,
    /// Parent account, if any. Aggregation traverses this relationship,
    /// never code prefixes.
    pub parent_id: Option<AccountId>,
    /// Depth in the hierarchy (root = 1).
    pub level: i16,
    /// Whether the account accepts new postings.
    pub is_active: bool,
    /// Cached balance, signed per the normal-balance convention.
    pub balance: Decimal,
    /// True when an external subledger owns this account's balance and the
    /// propagator must skip it to avoid double-counting.
    pub balance_owned_externally: bool,
}

impl Account {
    /// Returns true if journal lines may post to this account.
    #[must_use]
    pub fn is_postable(&self) -> bool {
        !self.is_header && self.is_active
    }

    /// Validates that this account can sit under `parent` in the hierarchy.
    ///
    /// # Errors
    ///
    /// Returns an error if the types differ or the depth bound is exceeded.
    pub fn validate_child_of(&self, parent: &Account) -> Result<(), LedgerError> {
        if self.account_type != parent.account_type {
            return Err(LedgerError::ParentTypeMismatch {
                child: self.code.clone(),
                parent: parent.code.clone(),
            });
        }
        if parent.level >= MAX_HIERARCHY_DEPTH {
            return Err(LedgerError::HierarchyTooDeep {
                code: self.code.clone(),
            });
        }
        Ok(())
    }
}
