//! Business rule validation for proposed entries.
//!
//! Runs before any persistence; a rejected input leaves no trace.

use rust_decimal::Decimal;

use super::error::LedgerError;
use super::types::{EntryInput, EntryTotals};

/// Validates a proposed entry's structural invariants.
///
/// Checks, in order: non-empty description; at least 2 lines; per line a
/// non-negative amount on exactly one side; exact decimal equality of the
/// debit and credit sums.
///
/// # Errors
///
/// Returns a typed validation error on the first violated rule.
pub fn validate_entry(input: &EntryInput) -> Result<EntryTotals, LedgerError> {
    if input.description.trim().is_empty() {
        return Err(LedgerError::EmptyDescription);
    }

    if input.lines.len() < 2 {
        return Err(LedgerError::InsufficientLines);
    }

    let mut total_debit = Decimal::ZERO;
    let mut total_credit = Decimal::ZERO;

    for (idx, line) in input.lines.iter().enumerate() {
        let line_number = i32::try_from(idx + 1).unwrap_or(i32::MAX);

        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line_number });
        }
        if line.debit > Decimal::ZERO && line.credit > Decimal::ZERO {
            return Err(LedgerError::BothSidesSet { line_number });
        }
        if line.debit == Decimal::ZERO && line.credit == Decimal::ZERO {
            return Err(LedgerError::NeitherSideSet { line_number });
        }

        total_debit += line.debit;
        total_credit += line.credit;
    }

    if total_debit != total_credit {
        return Err(LedgerError::Imbalance {
            debit: total_debit,
            credit: total_credit,
        });
    }

    Ok(EntryTotals::new(total_debit, total_credit))
}
