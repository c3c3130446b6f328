//! Business rule validation for journal lines.

use rust_decimal::Decimal;
use tally_shared::types::{fits_money_range, fits_money_scale};
use uuid::Uuid;

use super::error::{InvalidAccountReason, LedgerError};
use super::types::{EntryTotals, PostingAccount, PostingLine};

/// Validates each line's shape and returns the entry totals.
///
/// Every line must have exactly one positive side, no negative amounts and
/// at most two decimal places. Amounts and running totals must fit the
/// `NUMERIC(16,2)` columns. The totals must balance and be positive.
///
/// # Errors
///
/// Returns the first violation found, in line order.
pub fn validate_lines(lines: &[PostingLine]) -> Result<EntryTotals, LedgerError> {
    if lines.is_empty() {
        return Err(LedgerError::NoLines);
    }

    let mut totals = EntryTotals::default();

    for (idx, line) in lines.iter().enumerate() {
        let line_number = line_number(idx);

        if line.debit < Decimal::ZERO || line.credit < Decimal::ZERO {
            return Err(LedgerError::NegativeAmount { line_number });
        }

        for amount in [line.debit, line.credit] {
            if !fits_money_scale(amount) {
                return Err(LedgerError::ExcessPrecision {
                    line_number,
                    amount,
                });
            }
            if !fits_money_range(amount) {
                return Err(LedgerError::AmountOutOfRange {
                    line_number,
                    amount,
                });
            }
        }

        let has_debit = line.debit > Decimal::ZERO;
        let has_credit = line.credit > Decimal::ZERO;
        if has_debit == has_credit {
            return Err(LedgerError::InvalidLineSides {
                line_number,
                debit: line.debit,
                credit: line.credit,
            });
        }

        totals.total_debit = accumulate(totals.total_debit, line.debit, line_number)?;
        totals.total_credit = accumulate(totals.total_credit, line.credit, line_number)?;
    }

    if !totals.is_balanced() {
        return Err(LedgerError::UnbalancedEntry {
            total_debit: totals.total_debit,
            total_credit: totals.total_credit,
        });
    }

    Ok(totals)
}

/// Checks that an account is a live, active leaf.
///
/// # Errors
///
/// Returns `InvalidPostingAccount` naming the first failed condition.
pub fn validate_posting_account(
    account_id: Uuid,
    account: Option<&PostingAccount>,
) -> Result<(), LedgerError> {
    let reason = match account {
        None => Some(InvalidAccountReason::NotFound),
        Some(a) if a.is_deleted => Some(InvalidAccountReason::Deleted),
        Some(a) if !a.is_active => Some(InvalidAccountReason::Inactive),
        Some(a) if a.is_header => Some(InvalidAccountReason::Header),
        Some(_) => None,
    };

    match reason {
        Some(reason) => Err(LedgerError::InvalidPostingAccount { account_id, reason }),
        None => Ok(()),
    }
}

fn accumulate(total: Decimal, amount: Decimal, line_number: i32) -> Result<Decimal, LedgerError> {
    total
        .checked_add(amount)
        .filter(|sum| fits_money_range(*sum))
        .ok_or(LedgerError::TotalOutOfRange { line_number })
}

/// 1-based line number for a slice index.
pub(crate) fn line_number(idx: usize) -> i32 {
    i32::try_from(idx + 1).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn leaf(id: Uuid) -> PostingAccount {
        PostingAccount {
            id,
            code: "1301".to_string(),
            is_header: false,
            is_active: true,
            is_deleted: false,
        }
    }

    #[test]
    fn test_purchase_with_tax_balances() {
        let (inventory, tax, payable) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let lines = vec![
            PostingLine::debit(inventory, dec!(5000000)),
            PostingLine::debit(tax, dec!(550000)),
            PostingLine::credit(payable, dec!(5550000)),
        ];

        let totals = validate_lines(&lines).unwrap();

        assert_eq!(totals.total_debit, dec!(5550000));
        assert_eq!(totals.total_credit, dec!(5550000));
    }

    #[test]
    fn test_unbalanced_lines_rejected() {
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), dec!(100)),
            PostingLine::credit(Uuid::new_v4(), dec!(90)),
        ];

        let result = validate_lines(&lines);

        assert!(matches!(
            result,
            Err(LedgerError::UnbalancedEntry { total_debit, total_credit })
                if total_debit == dec!(100) && total_credit == dec!(90)
        ));
    }

    #[test]
    fn test_empty_lines_rejected() {
        assert!(matches!(validate_lines(&[]), Err(LedgerError::NoLines)));
    }

    #[rstest]
    #[case(dec!(10), dec!(10))]
    #[case(dec!(0), dec!(0))]
    fn test_line_must_have_exactly_one_side(#[case] debit: Decimal, #[case] credit: Decimal) {
        let line = PostingLine {
            account_id: Uuid::new_v4(),
            debit,
            credit,
            description: None,
        };

        let result = validate_lines(&[line]);

        assert!(matches!(
            result,
            Err(LedgerError::InvalidLineSides { line_number: 1, .. })
        ));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), dec!(100)),
            PostingLine::debit(Uuid::new_v4(), dec!(-100)),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::NegativeAmount { line_number: 2 })
        ));
    }

    #[test]
    fn test_excess_precision_rejected() {
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), dec!(10.005)),
            PostingLine::credit(Uuid::new_v4(), dec!(10.005)),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::ExcessPrecision { line_number: 1, .. })
        ));
    }

    #[rstest]
    #[case::just_above_column(dec!(100000000000000.00))]
    #[case::decimal_max(Decimal::MAX)]
    fn test_amount_beyond_column_rejected(#[case] amount: Decimal) {
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), amount),
            PostingLine::credit(Uuid::new_v4(), amount),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::AmountOutOfRange { line_number: 1, .. })
        ));
    }

    #[test]
    fn test_running_total_beyond_column_rejected() {
        let big = dec!(60000000000000);
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), big),
            PostingLine::debit(Uuid::new_v4(), big),
            PostingLine::credit(Uuid::new_v4(), big),
            PostingLine::credit(Uuid::new_v4(), big),
        ];
        assert!(matches!(
            validate_lines(&lines),
            Err(LedgerError::TotalOutOfRange { line_number: 2 })
        ));
    }

    #[test]
    fn test_largest_storable_entry_accepted() {
        let max = tally_shared::types::MAX_MONEY;
        let lines = vec![
            PostingLine::debit(Uuid::new_v4(), max),
            PostingLine::credit(Uuid::new_v4(), max),
        ];
        assert_eq!(validate_lines(&lines).unwrap().total_debit, max);
    }

    #[test]
    fn test_leaf_account_accepted() {
        let id = Uuid::new_v4();
        assert!(validate_posting_account(id, Some(&leaf(id))).is_ok());
    }

    #[rstest]
    #[case::missing(None, InvalidAccountReason::NotFound)]
    #[case::header(Some((true, true, false)), InvalidAccountReason::Header)]
    #[case::inactive(Some((false, false, false)), InvalidAccountReason::Inactive)]
    #[case::deleted(Some((false, true, true)), InvalidAccountReason::Deleted)]
    fn test_invalid_posting_accounts(
        #[case] flags: Option<(bool, bool, bool)>,
        #[case] expected: InvalidAccountReason,
    ) {
        let id = Uuid::new_v4();
        let account = flags.map(|(is_header, is_active, is_deleted)| PostingAccount {
            is_header,
            is_active,
            is_deleted,
            ..leaf(id)
        });

        let result = validate_posting_account(id, account.as_ref());

        assert!(matches!(
            result,
            Err(LedgerError::InvalidPostingAccount { account_id, reason })
                if account_id == id && reason == expected
        ));
    }
}
