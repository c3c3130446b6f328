//! Property-based tests for journal line validation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::error::LedgerError;
use crate::ledger::types::PostingLine;
use crate::ledger::validation::validate_lines;

/// Strategy for positive amounts with two decimal places.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Debit lines for `amounts`, closed by one credit line for their sum.
fn balanced(amounts: &[Decimal]) -> Vec<PostingLine> {
    let total: Decimal = amounts.iter().copied().sum();
    let mut lines: Vec<PostingLine> = amounts
        .iter()
        .map(|&a| PostingLine::debit(Uuid::new_v4(), a))
        .collect();
    lines.push(PostingLine::credit(Uuid::new_v4(), total));
    lines
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any set of debits closed by a single credit of their exact sum is accepted.
    #[test]
    fn prop_balanced_lines_accepted(amounts in prop::collection::vec(arb_amount(), 1..8)) {
        let lines = balanced(&amounts);
        let totals = validate_lines(&lines).unwrap();

        prop_assert_eq!(totals.total_debit, totals.total_credit);
        prop_assert_eq!(totals.total_debit, amounts.iter().copied().sum::<Decimal>());
    }

    /// Shifting any single credit by one cent makes the entry unbalanced.
    #[test]
    fn prop_one_cent_off_rejected(
        amounts in prop::collection::vec(arb_amount(), 1..8),
        up in any::<bool>(),
    ) {
        let mut lines = balanced(&amounts);
        let last = lines.last_mut().unwrap();
        let cent = Decimal::new(1, 2);
        last.credit = if up { last.credit + cent } else { last.credit - cent };

        let result = validate_lines(&lines);
        let is_rejected = matches!(
            result,
            Err(LedgerError::UnbalancedEntry { .. } | LedgerError::InvalidLineSides { .. })
        );
        prop_assert!(is_rejected);
    }
}
