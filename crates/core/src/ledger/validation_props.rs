//! Property tests for entry validation and reversal construction.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;

use arca_shared::types::{AccountId, UserId};

use super::entry::SourceType;
use super::error::LedgerError;
use super::types::{EntryInput, LineInput};
use super::validation::validate_entry;

/// Strategy for generating positive line amounts (2 decimal places).
fn amount_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for a set of debit amounts that is mirrored into matching credits.
fn balanced_lines_strategy() -> impl Strategy<Value = Vec<LineInput>> {
    prop::collection::vec(amount_strategy(), 1..=10).prop_map(|debits| {
        let total: Decimal = debits.iter().copied().sum();
        let mut lines: Vec<LineInput> = debits
            .into_iter()
            .map(|amount| LineInput {
                account_id: AccountId::new(),
                debit: amount,
                credit: Decimal::ZERO,
                memo: None,
            })
            .collect();
        lines.push(LineInput {
            account_id: AccountId::new(),
            debit: Decimal::ZERO,
            credit: total,
            memo: None,
        });
        lines
    })
}

fn make_input(lines: Vec<LineInput>) -> EntryInput {
    EntryInput {
        source_type: SourceType::Manual,
        source_id: None,
        reference: None,
        entry_date: NaiveDate::from_ymd_opt(2026, 3, 1).expect("valid date"),
        description: "Property test entry".to_string(),
        lines,
        auto_post: false,
        reverses: None,
        created_by: UserId::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any mirrored debit/credit set validates, and totals equal the sums.
    #[test]
    fn prop_balanced_entries_validate(lines in balanced_lines_strategy()) {
        let expected_total: Decimal = lines.iter().map(|l| l.debit).sum();
        let input = make_input(lines);

        let totals = validate_entry(&input).expect("balanced entry should validate");
        prop_assert!(totals.is_balanced);
        prop_assert_eq!(totals.total_debit, expected_total);
        prop_assert_eq!(totals.total_credit, expected_total);
        prop_assert_eq!(totals.difference(), Decimal::ZERO);
    }

    /// Perturbing any one line breaks the balance and is rejected.
    #[test]
    fn prop_perturbed_entries_rejected(
        lines in balanced_lines_strategy(),
        bump in amount_strategy(),
    ) {
        let mut lines = lines;
        lines[0].debit += bump;
        let input = make_input(lines);

        let rejected = matches!(
            validate_entry(&input),
            Err(LedgerError::Imbalance { .. })
        );
        prop_assert!(rejected, "perturbed entry must be rejected as imbalanced");
    }

    /// Validation totals are independent of line order.
    #[test]
    fn prop_validation_order_independent(lines in balanced_lines_strategy()) {
        let mut reversed = lines.clone();
        reversed.reverse();

        let forward = validate_entry(&make_input(lines)).expect("validates");
        let backward = validate_entry(&make_input(reversed)).expect("validates");

        prop_assert_eq!(forward.total_debit, backward.total_debit);
        prop_assert_eq!(forward.total_credit, backward.total_credit);
    }

    /// Swapping every line's sides preserves balance (reversal invariant).
    #[test]
    fn prop_side_swap_preserves_balance(lines in balanced_lines_strategy()) {
        let swapped: Vec<LineInput> = lines
            .iter()
            .map(|l| LineInput {
                account_id: l.account_id,
                debit: l.credit,
                credit: l.debit,
                memo: None,
            })
            .collect();

        let totals = validate_entry(&make_input(swapped)).expect("swap stays balanced");
        prop_assert!(totals.is_balanced);
    }
}
