//! Reversing vouchers for posted vouchers.

use chrono::NaiveDate;

use super::types::{JournalLine, JournalVoucher};

/// A reversing voucher ready to be stored and posted.
#[derive(Debug, Clone)]
pub struct ReversalDraft {
    /// Accounting date of the reversal.
    pub date: NaiveDate,
    /// Description referencing the original voucher.
    pub description: String,
    /// Reference carried over from the original.
    pub reference: Option<String>,
    /// Mirrored lines.
    pub lines: Vec<JournalLine>,
}

/// Stateless service for creating reversing entries.
pub struct ReversalService;

impl ReversalService {
    /// Create reversing lines by swapping debits and credits.
    ///
    /// Rates and base amounts are carried over unchanged, so each account's
    /// net over original and reversal is exactly zero. Memos are prefixed
    /// with "Reversal: ".
    #[must_use]
    pub fn reversing_lines(original: &[JournalLine]) -> Vec<JournalLine> {
        original
            .iter()
            .map(|line| JournalLine {
                line_no: line.line_no,
                account_id: line.account_id,
                debit: line.credit,
                credit: line.debit,
                currency: line.currency,
                rate: line.rate,
                base_debit: line.base_credit,
                base_credit: line.base_debit,
                entity_id: line.entity_id,
                memo: Some(format!(
                    "Reversal: {}",
                    line.memo.clone().unwrap_or_default()
                )),
            })
            .collect()
    }

    /// Build the reversing voucher, dated `date` or the original's date.
    #[must_use]
    pub fn draft(original: &JournalVoucher, date: Option<NaiveDate>) -> ReversalDraft {
        ReversalDraft {
            date: date.unwrap_or(original.date),
            description: format!("Reversal of {}", original.voucher_number),
            reference: original.reference.clone(),
            lines: Self::reversing_lines(&original.lines),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use mizan_shared::{AccountId, Currency, EntityId, VoucherId};
    use rust_decimal_macros::dec;

    use crate::ledger::types::VoucherStatus;

    fn line(line_no: i32, debit: i64, credit: i64, base_debit: i64, base_credit: i64) -> JournalLine {
        JournalLine {
            line_no,
            account_id: AccountId::new(),
            debit,
            credit,
            currency: Currency::Sar,
            rate: dec!(140.25),
            base_debit,
            base_credit,
            entity_id: Some(EntityId::new()),
            memo: Some("order 77".to_string()),
        }
    }

    #[test]
    fn test_reversing_lines_swap_sides_and_keep_base() {
        let original = vec![line(1, 1_000, 0, 140_250, 0), line(2, 0, 1_000, 0, 140_250)];
        let reversed = ReversalService::reversing_lines(&original);

        assert_eq!(reversed[0].credit, 1_000);
        assert_eq!(reversed[0].debit, 0);
        assert_eq!(reversed[0].base_credit, 140_250);
        assert_eq!(reversed[0].rate, dec!(140.25));
        assert_eq!(reversed[0].entity_id, original[0].entity_id);
        assert_eq!(reversed[1].base_debit, 140_250);
        assert_eq!(reversed[1].memo.as_deref(), Some("Reversal: order 77"));
    }

    #[test]
    fn test_draft_defaults_to_original_date() {
        let original = JournalVoucher {
            id: VoucherId::new(),
            voucher_number: "JV-202603-000004".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 5).unwrap(),
            description: "Payout".to_string(),
            reference: Some("ORD-1".to_string()),
            status: VoucherStatus::Posted,
            reverses_voucher_id: None,
            settlement_id: None,
            lines: vec![line(1, 10, 0, 1_403, 0), line(2, 0, 10, 0, 1_403)],
            created_at: Utc::now(),
            posted_at: Some(Utc::now()),
            version: 2,
        };

        let draft = ReversalService::draft(&original, None);
        assert_eq!(draft.date, original.date);
        assert_eq!(draft.description, "Reversal of JV-202603-000004");
        assert_eq!(draft.reference.as_deref(), Some("ORD-1"));

        let later = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        assert_eq!(ReversalService::draft(&original, Some(later)).date, later);
    }
}
