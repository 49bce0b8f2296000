//! Balance validation and reconciliation.
//!
//! Posted journal lines are the ground truth; cached account balances are a
//! read optimization. The validator recomputes balances from the journal,
//! reports drift, repairs it on request, and checks the accounting equation.

use std::collections::HashSet;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use arca_shared::types::AccountId;

use crate::ledger::{Account, AccountType, LedgerError};

use super::posting::abort;
use super::propagation::recompute_header_balances;
use super::store::{LedgerStore, LedgerTxn};

/// Tolerance for the accounting equation check.
///
/// Per-account comparisons are exact; the equation check allows one cent of
/// accumulated rounding across the whole chart.
pub const EQUATION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Comparison of one account's cached balance against the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountValidation {
    /// The account.
    pub account_id: AccountId,
    /// Account code, for reporting.
    pub code: String,
    /// Cached balance at validation time.
    pub cached: Decimal,
    /// Balance derived from posted journal lines.
    pub derived: Decimal,
    /// `cached - derived`.
    pub difference: Decimal,
}

impl AccountValidation {
    /// Returns true if the cached balance matches the journal exactly.
    #[must_use]
    pub fn matches(&self) -> bool {
        self.difference == Decimal::ZERO
    }
}

/// Accounting equation check result.
///
/// The equation is `Assets = Liabilities + Equity + (Revenue - Expenses)`,
/// computed over postable accounts only; header rollups would double-count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EquationResult {
    /// Sum of asset account balances.
    pub assets: Decimal,
    /// Sum of liability account balances.
    pub liabilities: Decimal,
    /// Sum of equity account balances.
    pub equity: Decimal,
    /// Sum of revenue account balances.
    pub revenue: Decimal,
    /// Sum of expense account balances.
    pub expenses: Decimal,
    /// `assets - (liabilities + equity + revenue - expenses)`.
    pub difference: Decimal,
    /// True if the difference is within [`EQUATION_TOLERANCE`].
    pub holds: bool,
}

/// One row of the account balances view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalanceView {
    /// The account.
    pub account_id: AccountId,
    /// Account code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Account type classification.
    pub account_type: AccountType,
    /// Depth in the hierarchy.
    pub level: i16,
    /// Whether this row is a rollup.
    pub is_header: bool,
    /// Cached balance.
    pub balance: Decimal,
}

/// Validates cached balances against the journal and repairs drift.
#[derive(Debug, Clone)]
pub struct BalanceValidator<S> {
    store: Arc<S>,
}

impl<S: LedgerStore> BalanceValidator<S> {
    /// Creates a validator over a store.
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validates one account's cached balance against the journal.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::AccountNotFound`] or a storage error.
    pub async fn validate_account(
        &self,
        id: AccountId,
    ) -> Result<AccountValidation, LedgerError> {
        let mut txn = self.store.begin().await?;
        let result = async {
            let account = txn
                .account(id)
                .await?
                .ok_or(LedgerError::AccountNotFound(id))?;
            validate_one(txn.as_mut(), &account).await
        }
        .await;
        match result {
            Ok(validation) => {
                txn.rollback().await?;
                Ok(validation)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Validates every active postable account, one result per account;
    /// callers filter on [`AccountValidation::matches`].
    ///
    /// Inactive accounts and header accounts are skipped (headers have no
    /// posted lines) and so are accounts whose balance an external subledger
    /// owns.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn validate_all(&self) -> Result<Vec<AccountValidation>, LedgerError> {
        let mut txn = self.store.begin().await?;
        let result = validate_chart(txn.as_mut()).await;
        match result {
            Ok(validations) => {
                txn.rollback().await?;
                Ok(validations)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Repairs every drifted cached balance from the journal, then
    /// recomputes the affected headers. Returns the repaired discrepancies.
    ///
    /// # Errors
    ///
    /// Returns a storage error; on error no repair is committed.
    pub async fn sync_account_balances(&self) -> Result<Vec<AccountValidation>, LedgerError> {
        let mut txn = self.store.begin().await?;
        let result = sync_chart(txn.as_mut()).await;
        match result {
            Ok(repaired) => {
                txn.commit().await?;
                Ok(repaired)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Checks the accounting equation over the whole chart.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn validate_accounting_equation(&self) -> Result<EquationResult, LedgerError> {
        let mut txn = self.store.begin().await?;
        let result = equation_over(txn.as_mut()).await;
        match result {
            Ok(equation) => {
                txn.rollback().await?;
                Ok(equation)
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }

    /// Returns the chart with cached balances, ordered by code.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the chart cannot be read.
    pub async fn account_balances(&self) -> Result<Vec<AccountBalanceView>, LedgerError> {
        let mut txn = self.store.begin().await?;
        let result = txn.all_accounts().await;
        match result {
            Ok(accounts) => {
                txn.rollback().await?;
                Ok(accounts
                    .into_iter()
                    .map(|a| AccountBalanceView {
                        account_id: a.id,
                        code: a.code,
                        name: a.name,
                        account_type: a.account_type,
                        level: a.level,
                        is_header: a.is_header,
                        balance: a.balance,
                    })
                    .collect())
            }
            Err(err) => Err(abort(txn, err).await),
        }
    }
}

/// Derives one account's balance from its posted journal lines.
async fn balance_from_journal(
    txn: &mut dyn LedgerTxn,
    account: &Account,
) -> Result<Decimal, LedgerError> {
    let lines = txn.posted_lines_for_account(account.id).await?;
    Ok(lines
        .iter()
        .map(|l| account.account_type.balance_change(l.debit, l.credit))
        .sum())
}

async fn validate_one(
    txn: &mut dyn LedgerTxn,
    account: &Account,
) -> Result<AccountValidation, LedgerError> {
    let derived = balance_from_journal(txn, account).await?;
    Ok(AccountValidation {
        account_id: account.id,
        code: account.code.clone(),
        cached: account.balance,
        derived,
        difference: account.balance - derived,
    })
}

async fn validate_chart(
    txn: &mut dyn LedgerTxn,
) -> Result<Vec<AccountValidation>, LedgerError> {
    let accounts = txn.all_accounts().await?;
    let mut validations = Vec::new();
    for account in accounts
        .iter()
        .filter(|a| a.is_active && !a.is_header && !a.balance_owned_externally)
    {
        validations.push(validate_one(txn, account).await?);
    }
    Ok(validations)
}

async fn sync_chart(txn: &mut dyn LedgerTxn) -> Result<Vec<AccountValidation>, LedgerError> {
    let mut repaired = validate_chart(txn).await?;
    repaired.retain(|v| !v.matches());
    let mut parents = HashSet::new();
    for validation in &repaired {
        tracing::warn!(
            code = %validation.code,
            cached = %validation.cached,
            derived = %validation.derived,
            "repairing drifted account balance"
        );
        txn.set_balance(validation.account_id, validation.derived)
            .await?;
        let account = txn
            .account(validation.account_id)
            .await?
            .ok_or(LedgerError::AccountNotFound(validation.account_id))?;
        if let Some(parent_id) = account.parent_id {
            parents.insert(parent_id);
        }
    }
    recompute_header_balances(txn, parents).await?;
    Ok(repaired)
}

async fn equation_over(txn: &mut dyn LedgerTxn) -> Result<EquationResult, LedgerError> {
    let accounts = txn.all_accounts().await?;

    let mut totals = [Decimal::ZERO; 5];
    for account in accounts.iter().filter(|a| !a.is_header) {
        let slot = match account.account_type {
            AccountType::Asset => 0,
            AccountType::Liability => 1,
            AccountType::Equity => 2,
            AccountType::Revenue => 3,
            AccountType::Expense => 4,
        };
        totals[slot] += account.balance;
    }
    let [assets, liabilities, equity, revenue, expenses] = totals;

    let difference = assets - (liabilities + equity + revenue - expenses);
    Ok(EquationResult {
        assets,
        liabilities,
        equity,
        revenue,
        expenses,
        difference,
        holds: difference.abs() <= EQUATION_TOLERANCE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::memory::MemoryStore;
    use crate::engine::posting::PostingEngine;
    use crate::ledger::{EntryInput, LineInput, SourceType};
    use arca_shared::types::UserId;
    use rust_decimal_macros::dec;

    fn make_account(code: &str, account_type: AccountType) -> Account {
        Account {
            id: AccountId::new(),
            code: code.to_string(),
            name: format!("Account {code}"),
            account_type,
            category: None,
            is_header: false,
            parent_id: None,
            level: 1,
            is_active: true,
            balance: Decimal::ZERO,
            balance_owned_externally: false,
        }
    }

    fn sale_input(cash: AccountId, sales: AccountId, amount: Decimal) -> EntryInput {
        EntryInput {
            source_type: SourceType::Sale,
            source_id: None,
            reference: None,
            entry_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
            description: "Cash sale".to_string(),
            lines: vec![
                LineInput {
                    account_id: cash,
                    debit: amount,
                    credit: Decimal::ZERO,
                    memo: None,
                },
                LineInput {
                    account_id: sales,
                    debit: Decimal::ZERO,
                    credit: amount,
                    memo: None,
                },
            ],
            auto_post: true,
            reverses: None,
            created_by: UserId::new(),
        }
    }

    async fn post_sale(store: &Arc<MemoryStore>, cash: AccountId, sales: AccountId, amount: Decimal) {
        let engine = PostingEngine::new(Arc::clone(store));
        engine
            .submit_entry(sale_input(cash, sales, amount))
            .await
            .expect("submit");
    }

    #[tokio::test]
    async fn test_clean_ledger_validates_every_account() {
        let store = Arc::new(MemoryStore::new());
        let cash = make_account("1101", AccountType::Asset);
        let sales = make_account("4101", AccountType::Revenue);
        store.seed_account(cash.clone()).await;
        store.seed_account(sales.clone()).await;
        post_sale(&store, cash.id, sales.id, dec!(100)).await;

        // One result per active postable account, all consistent.
        let validator = BalanceValidator::new(store);
        let validations = validator.validate_all().await.expect("validate");
        assert_eq!(validations.len(), 2);
        assert!(validations.iter().all(AccountValidation::matches));
    }

    #[tokio::test]
    async fn test_inactive_accounts_skipped_consistent_ones_reported() {
        let store = Arc::new(MemoryStore::new());
        let cash = make_account("1101", AccountType::Asset);
        let mut dormant = make_account("1999", AccountType::Asset);
        dormant.is_active = false;
        dormant.balance = dec!(123); // drifted, but out of scope
        store.seed_account(cash.clone()).await;
        store.seed_account(dormant).await;

        let validator = BalanceValidator::new(store);
        let validations = validator.validate_all().await.expect("validate");
        assert_eq!(validations.len(), 1);
        assert_eq!(validations[0].code, "1101");
        assert!(validations[0].matches());
    }

    #[tokio::test]
    async fn test_drift_is_reported_and_repaired() {
        let store = Arc::new(MemoryStore::new());
        let mut cash = make_account("1101", AccountType::Asset);
        // Seed a corrupted cache: the journal says zero.
        cash.balance = dec!(999);
        let cash_id = cash.id;
        store.seed_account(cash).await;

        let validator = BalanceValidator::new(Arc::clone(&store));
        let validations = validator.validate_all().await.expect("validate");
        assert_eq!(validations.len(), 1);
        assert!(!validations[0].matches());
        assert_eq!(validations[0].cached, dec!(999));
        assert_eq!(validations[0].derived, Decimal::ZERO);

        let repaired = validator.sync_account_balances().await.expect("sync");
        assert_eq!(repaired.len(), 1);
        assert_eq!(store.account_balance(cash_id).await, Some(Decimal::ZERO));

        // Reconciliation is idempotent.
        let repaired = validator.sync_account_balances().await.expect("sync");
        assert!(repaired.is_empty());
    }

    #[tokio::test]
    async fn test_externally_owned_accounts_not_validated() {
        let store = Arc::new(MemoryStore::new());
        let mut inventory = make_account("1301", AccountType::Asset);
        inventory.balance_owned_externally = true;
        inventory.balance = dec!(5000);
        store.seed_account(inventory).await;

        let validator = BalanceValidator::new(store);
        let validations = validator.validate_all().await.expect("validate");
        assert!(validations.is_empty());
    }

    #[tokio::test]
    async fn test_accounting_equation_holds_after_postings() {
        let store = Arc::new(MemoryStore::new());
        let cash = make_account("1101", AccountType::Asset);
        let inventory = make_account("1301", AccountType::Asset);
        let sales = make_account("4101", AccountType::Revenue);
        let cogs = make_account("5101", AccountType::Expense);
        store.seed_account(cash.clone()).await;
        store.seed_account(inventory.clone()).await;
        store.seed_account(sales.clone()).await;
        store.seed_account(cogs.clone()).await;

        // Sale: cash up 1,000,000 against revenue; cost: expense up 600,000
        // against inventory.
        post_sale(&store, cash.id, sales.id, dec!(1000000)).await;
        post_sale(&store, cogs.id, inventory.id, dec!(600000)).await;

        let validator = BalanceValidator::new(Arc::clone(&store));
        let equation = validator
            .validate_accounting_equation()
            .await
            .expect("equation");

        assert_eq!(equation.assets, dec!(400000));
        assert_eq!(equation.revenue, dec!(1000000));
        assert_eq!(equation.expenses, dec!(600000));
        assert_eq!(equation.difference, Decimal::ZERO);
        assert!(equation.holds);
    }

    #[tokio::test]
    async fn test_equation_detects_corruption() {
        let store = Arc::new(MemoryStore::new());
        let cash = make_account("1101", AccountType::Asset);
        let sales = make_account("4101", AccountType::Revenue);
        let cash_id = cash.id;
        store.seed_account(cash).await;
        store.seed_account(sales.clone()).await;
        post_sale(&store, cash_id, sales.id, dec!(100)).await;

        // Corrupt the cache past the tolerance.
        {
            let mut txn = store.begin().await.expect("begin");
            txn.set_balance(cash_id, dec!(150)).await.expect("set");
            txn.commit().await.expect("commit");
        }

        let validator = BalanceValidator::new(store);
        let equation = validator
            .validate_accounting_equation()
            .await
            .expect("equation");
        assert!(!equation.holds);
        assert_eq!(equation.difference, dec!(50));
    }

    #[tokio::test]
    async fn test_account_balances_view_ordered_by_code() {
        let store = Arc::new(MemoryStore::new());
        let sales = make_account("4101", AccountType::Revenue);
        let cash = make_account("1101", AccountType::Asset);
        store.seed_account(sales).await;
        store.seed_account(cash).await;

        let validator = BalanceValidator::new(store);
        let view = validator.account_balances().await.expect("view");
        assert_eq!(view.len(), 2);
        assert_eq!(view[0].code, "1101");
        assert_eq!(view[1].code, "4101");
    }
}
