//! End-to-end scenarios exercising the engine, coordinator, propagator, and
//! reconciler together against the in-memory store.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use arca_shared::config::PostingConfig;
use arca_shared::types::{AccountId, ResourceId, UserId};

use crate::ledger::{Account, AccountType, EntryInput, EntryStatus, LineInput, SourceType};

use super::coordinator::{BalanceUpdateRequest, PostingCoordinator, ResourceDelta};
use super::memory::MemoryStore;
use super::posting::PostingEngine;
use super::reconcile::BalanceValidator;
use super::store::ResourceBalance;

struct Chart {
    store: Arc<MemoryStore>,
    assets_header: Account,
    cash: Account,
    inventory: Account,
    sales: Account,
    cogs: Account,
}

fn account(
    code: &str,
    account_type: AccountType,
    is_header: bool,
    parent_id: Option<AccountId>,
    level: i16,
) -> Account {
    Account {
        id: AccountId::new(),
        code: code.to_string(),
        name: format!("Account {code}"),
        account_type,
        category: None,
        is_header,
        parent_id,
        level,
        is_active: true,
        balance: Decimal::ZERO,
        balance_owned_externally: false,
    }
}

async fn seed_chart() -> Chart {
    let store = Arc::new(MemoryStore::new());
    let assets_header = account("1000", AccountType::Asset, true, None, 1);
    let cash = account("1101", AccountType::Asset, false, Some(assets_header.id), 2);
    let inventory = account("1301", AccountType::Asset, false, Some(assets_header.id), 2);
    let sales = account("4101", AccountType::Revenue, false, None, 1);
    let cogs = account("5101", AccountType::Expense, false, None, 1);
    for a in [&assets_header, &cash, &inventory, &sales, &cogs] {
        store.seed_account(a.clone()).await;
    }
    Chart {
        store,
        assets_header,
        cash,
        inventory,
        sales,
        cogs,
    }
}

fn two_line_entry(
    debit_account: AccountId,
    credit_account: AccountId,
    amount: Decimal,
    description: &str,
) -> EntryInput {
    EntryInput {
        source_type: SourceType::Sale,
        source_id: None,
        reference: None,
        entry_date: chrono::NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
        description: description.to_string(),
        lines: vec![
            LineInput {
                account_id: debit_account,
                debit: amount,
                credit: Decimal::ZERO,
                memo: None,
            },
            LineInput {
                account_id: credit_account,
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

/// A cash sale with cost of goods: two entries, equation intact, headers
/// aggregated from their children.
#[tokio::test]
async fn test_cash_sale_with_cost_of_goods() {
    let chart = seed_chart().await;
    let engine = PostingEngine::new(Arc::clone(&chart.store));

    engine
        .submit_entry(two_line_entry(
            chart.cash.id,
            chart.sales.id,
            dec!(1000000),
            "Cash sale",
        ))
        .await
        .expect("sale entry");
    engine
        .submit_entry(two_line_entry(
            chart.cogs.id,
            chart.inventory.id,
            dec!(600000),
            "Cost of goods sold",
        ))
        .await
        .expect("cogs entry");

    let store = &chart.store;
    assert_eq!(store.account_balance(chart.cash.id).await, Some(dec!(1000000)));
    assert_eq!(
        store.account_balance(chart.inventory.id).await,
        Some(dec!(-600000))
    );
    assert_eq!(store.account_balance(chart.sales.id).await, Some(dec!(1000000)));
    assert_eq!(store.account_balance(chart.cogs.id).await, Some(dec!(600000)));

    // Header aggregates its children through parent links.
    assert_eq!(
        store.account_balance(chart.assets_header.id).await,
        Some(dec!(400000))
    );

    let validator = BalanceValidator::new(Arc::clone(&chart.store));
    let equation = validator
        .validate_accounting_equation()
        .await
        .expect("equation");
    assert!(equation.holds);
    assert_eq!(equation.difference, Decimal::ZERO);
    let validations = validator.validate_all().await.expect("validate");
    assert_eq!(validations.len(), 4);
    assert!(validations.iter().all(|v| v.matches()));
}

/// N concurrent composite postings each succeed exactly once and leave the
/// cash account at N times the amount.
#[tokio::test]
async fn test_concurrent_postings_serialize() {
    let chart = seed_chart().await;
    let drawer = ResourceBalance {
        id: ResourceId::new(),
        name: "Main drawer".to_string(),
        balance: Decimal::ZERO,
    };
    chart.store.seed_resource(drawer.clone()).await;

    let coordinator = Arc::new(PostingCoordinator::new(
        Arc::clone(&chart.store),
        &PostingConfig::default(),
    ));

    let n = 10;
    let mut handles = Vec::new();
    for i in 0..n {
        let coordinator = Arc::clone(&coordinator);
        let entry = two_line_entry(chart.cash.id, chart.sales.id, dec!(50), "Cash sale");
        let resource_id = drawer.id;
        handles.push(tokio::spawn(async move {
            coordinator
                .post_balance_update(BalanceUpdateRequest {
                    transaction_id: format!("SALE-{i:03}"),
                    source_type: SourceType::Sale,
                    deltas: vec![ResourceDelta {
                        resource_id,
                        amount: dec!(50),
                    }],
                    entry: Some(entry),
                    allow_duplicate: false,
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("process");
    }

    let store = &chart.store;
    assert_eq!(store.account_balance(chart.cash.id).await, Some(dec!(500)));
    assert_eq!(store.resource_balance(drawer.id).await, Some(dec!(500)));
    assert_eq!(store.entry_count().await, n);
    assert_eq!(store.movement_count().await, n);
}

/// Concurrent submissions of the same transaction id: exactly one wins.
#[tokio::test]
async fn test_concurrent_duplicates_post_once() {
    let chart = seed_chart().await;
    let coordinator = Arc::new(PostingCoordinator::new(
        Arc::clone(&chart.store),
        &PostingConfig::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..5 {
        let coordinator = Arc::clone(&coordinator);
        let entry = two_line_entry(chart.cash.id, chart.sales.id, dec!(75), "Cash sale");
        handles.push(tokio::spawn(async move {
            coordinator
                .post_balance_update(BalanceUpdateRequest {
                    transaction_id: "SALE-DUP".to_string(),
                    source_type: SourceType::Sale,
                    deltas: Vec::new(),
                    entry: Some(entry),
                    allow_duplicate: false,
                })
                .await
        }));
    }

    let mut successes = 0;
    for handle in handles {
        if handle.await.expect("join").is_ok() {
            successes += 1;
        }
    }

    assert_eq!(successes, 1);
    assert_eq!(chart.store.entry_count().await, 1);
    assert_eq!(
        chart.store.account_balance(chart.cash.id).await,
        Some(dec!(75))
    );
}

/// Reversal returns every balance, header included, to its prior value.
#[tokio::test]
async fn test_reversal_round_trip() {
    let chart = seed_chart().await;
    let engine = PostingEngine::new(Arc::clone(&chart.store));

    let original = engine
        .submit_entry(two_line_entry(
            chart.cash.id,
            chart.sales.id,
            dec!(250),
            "Cash sale",
        ))
        .await
        .expect("submit");
    assert_eq!(
        chart.store.account_balance(chart.assets_header.id).await,
        Some(dec!(250))
    );

    let reversal = engine
        .reverse_entry(
            original.entry_id,
            "Keyed against the wrong customer",
            chrono::NaiveDate::from_ymd_opt(2026, 3, 2).expect("valid date"),
            UserId::new(),
        )
        .await
        .expect("reverse");
    assert_eq!(reversal.status, EntryStatus::Posted);

    for id in [
        chart.cash.id,
        chart.sales.id,
        chart.assets_header.id,
    ] {
        assert_eq!(chart.store.account_balance(id).await, Some(Decimal::ZERO));
    }

    // Both entries remain in the journal; the equation still holds.
    assert_eq!(chart.store.entry_count().await, 2);
    let validator = BalanceValidator::new(Arc::clone(&chart.store));
    assert!(
        validator
            .validate_accounting_equation()
            .await
            .expect("equation")
            .holds
    );
}

/// Drift injected into a cached balance is found and repaired, and the
/// repair propagates to the header.
#[tokio::test]
async fn test_reconciliation_repairs_headers_too() {
    let chart = seed_chart().await;
    let engine = PostingEngine::new(Arc::clone(&chart.store));
    engine
        .submit_entry(two_line_entry(
            chart.cash.id,
            chart.sales.id,
            dec!(300),
            "Cash sale",
        ))
        .await
        .expect("submit");

    // Corrupt the cash cache.
    {
        use super::store::LedgerStore;
        let mut txn = chart.store.begin().await.expect("begin");
        txn.set_balance(chart.cash.id, dec!(999)).await.expect("set");
        txn.commit().await.expect("commit");
    }

    let validator = BalanceValidator::new(Arc::clone(&chart.store));
    let repaired = validator.sync_account_balances().await.expect("sync");
    assert_eq!(repaired.len(), 1);
    assert_eq!(repaired[0].derived, dec!(300));

    assert_eq!(
        chart.store.account_balance(chart.cash.id).await,
        Some(dec!(300))
    );
    assert_eq!(
        chart.store.account_balance(chart.assets_header.id).await,
        Some(dec!(300))
    );
}
