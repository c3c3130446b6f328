//! Property-based tests for reversal planning.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::ledger::reversal::{OriginalEntry, ReversalService};
use crate::ledger::types::{EntryStatus, NumberedLine, PostingLine, SourceType};

fn arb_line() -> impl Strategy<Value = PostingLine> {
    ((1i64..1_000_000_000i64), any::<bool>()).prop_map(|(n, is_debit)| {
        let amount = Decimal::new(n, 2);
        if is_debit {
            PostingLine::debit(Uuid::new_v4(), amount)
        } else {
            PostingLine::credit(Uuid::new_v4(), amount)
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Swapping twice gives back the original line.
    #[test]
    fn prop_swap_is_an_involution(line in arb_line()) {
        prop_assert_eq!(ReversalService::swap(&ReversalService::swap(&line)), line);
    }

    /// The reversal mirrors the original's totals and cancels every account.
    #[test]
    fn prop_reversal_cancels_original(lines in prop::collection::vec(arb_line(), 1..10)) {
        let original = OriginalEntry {
            id: Uuid::new_v4(),
            entry_number: "MAN-20261019-00000000".to_string(),
            source_type: SourceType::Manual,
            status: EntryStatus::Posted,
            lines: lines
                .into_iter()
                .enumerate()
                .map(|(i, line)| NumberedLine { line_number: i32::try_from(i).unwrap() + 1, line })
                .collect(),
        };

        let plan = ReversalService::plan(&original, None).unwrap();

        let debit: Decimal = original.lines.iter().map(|l| l.line.debit).sum();
        let credit: Decimal = original.lines.iter().map(|l| l.line.credit).sum();
        prop_assert_eq!(plan.totals.total_debit, credit);
        prop_assert_eq!(plan.totals.total_credit, debit);

        for l in &original.lines {
            prop_assert!(
                ReversalService::net_effect(&original.lines, &plan.lines, l.line.account_id).is_zero()
            );
        }
    }
}
