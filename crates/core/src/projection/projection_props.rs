//! Property-based tests for balance projection.

use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::coa::AccountType;
use crate::ledger::{EntryStatus, LedgerService, PostingAccount, PostingLine, PostingRequest, SourceType};
use crate::projection::balance::{BalanceProjector, ProjectedLine};
use crate::projection::trial::TrialBalance;

fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|n| Decimal::new(n, 2))
}

fn arb_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Asset),
        Just(AccountType::Liability),
        Just(AccountType::Equity),
        Just(AccountType::Revenue),
        Just(AccountType::Expense),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Any balanced two-line posting between any two account types keeps the equation.
    #[test]
    fn prop_balanced_postings_keep_accounting_equation(
        postings in prop::collection::vec((arb_type(), arb_type(), arb_amount()), 1..20)
    ) {
        let mut balances = Vec::new();

        for (debit_type, credit_type, amount) in postings {
            let (debit_acc, credit_acc) = (Uuid::new_v4(), Uuid::new_v4());
            let request = PostingRequest {
                source_type: SourceType::Manual,
                source_id: Uuid::new_v4(),
                entry_date: chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                description: String::new(),
                lines: vec![
                    PostingLine::debit(debit_acc, amount),
                    PostingLine::credit(credit_acc, amount),
                ],
                created_by: None,
            };
            let prepared = LedgerService::prepare_posting(&request, |id| {
                Some(PostingAccount {
                    id,
                    code: String::new(),
                    is_header: false,
                    is_active: true,
                    is_deleted: false,
                })
            })
            .unwrap();

            for (numbered, account_type) in prepared.lines.iter().zip([debit_type, credit_type]) {
                let projected = BalanceProjector::project(
                    account_type,
                    [ProjectedLine {
                        debit: numbered.line.debit,
                        credit: numbered.line.credit,
                        entry_status: EntryStatus::Posted,
                        entry_deleted: false,
                    }],
                );
                balances.push((account_type, projected.balance));
            }
        }

        prop_assert!(TrialBalance::from_balances(balances).is_balanced());
    }

    /// Splitting an account's lines across children and rolling them up gives the same balance.
    #[test]
    fn prop_rollup_equals_flat_projection(
        account_type in arb_type(),
        lines in prop::collection::vec((arb_amount(), any::<bool>(), 0usize..3), 1..30)
    ) {
        let as_projected = |(amount, is_debit, _): &(Decimal, bool, usize)| ProjectedLine {
            debit: if *is_debit { *amount } else { Decimal::ZERO },
            credit: if *is_debit { Decimal::ZERO } else { *amount },
            entry_status: EntryStatus::Posted,
            entry_deleted: false,
        };

        let flat = BalanceProjector::project(account_type, lines.iter().map(as_projected));

        let children = (0..3).map(|child| {
            BalanceProjector::project(
                account_type,
                lines.iter().filter(|l| l.2 == child).map(as_projected),
            )
            .totals
        });
        let rolled = BalanceProjector::rollup(account_type, children);

        prop_assert_eq!(flat, rolled);
    }
}
