//! Repayment ledger: append-only payments and the balance they imply.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{LendingError, Result, ValidationError};
use crate::loan::Loan;
use crate::types::{LoanId, PaymentId, UserId};

/// a recorded repayment; never edited or deleted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub loan_id: LoanId,
    pub user_id: UserId,
    pub amount: Money,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// a payment to record against an allocated loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// client-generated; resubmitting the same id is a no-op
    pub id: PaymentId,
    pub loan_id: LoanId,
    /// owner of the loan, denormalized onto the payment row
    pub user_id: UserId,
    pub amount: Money,
    pub date: DateTime<Utc>,
}

impl PaymentRequest {
    pub fn new(loan_id: LoanId, user_id: UserId, amount: Money, date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            loan_id,
            user_id,
            amount,
            date,
        }
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if !self.amount.is_positive() {
            return Err(ValidationError::NonPositivePayment { amount: self.amount });
        }
        Ok(())
    }

    /// same loan, owner and amount as an already recorded payment
    pub fn matches(&self, payment: &Payment) -> bool {
        self.id == payment.id
            && self.loan_id == payment.loan_id
            && self.user_id == payment.user_id
            && self.amount == payment.amount
    }

    pub fn into_payment(self, created_at: DateTime<Utc>) -> Payment {
        Payment {
            id: self.id,
            loan_id: self.loan_id,
            user_id: self.user_id,
            amount: self.amount,
            date: self.date,
            created_at,
        }
    }
}

/// balance after a payment; overpayment clamps to zero and is not carried
pub fn remaining_after(balance: Money, payment: Money) -> Money {
    balance.saturating_sub(payment)
}

pub fn total_paid(payments: &[Payment]) -> Money {
    payments.iter().map(|p| p.amount).sum()
}

/// remaining amount implied by the allocated total and the payment history;
/// `None` before allocation
pub fn derived_remaining(loan: &Loan, payments: &[Payment]) -> Option<Money> {
    loan.total_repayment
        .map(|total| remaining_after(total, total_paid(payments)))
}

/// newest first; recording order breaks ties
pub fn sort_for_display(payments: &mut [Payment]) {
    payments.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

/// stored balance checked against the balance derived from payments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reconciliation {
    pub loan_id: LoanId,
    pub stored: Money,
    pub derived: Money,
    pub payment_count: usize,
    pub in_sync: bool,
    /// a corrected balance was written back
    pub repaired: bool,
}

impl Reconciliation {
    pub fn drift(&self) -> Money {
        self.stored - self.derived
    }
}

pub fn reconcile(loan: &Loan, payments: &[Payment]) -> Result<Reconciliation> {
    let stored = loan.outstanding();
    let derived = derived_remaining(loan, payments).ok_or_else(|| {
        LendingError::calculation(format!("loan {} has no recorded total repayment", loan.id))
    })?;
    Ok(Reconciliation {
        loan_id: loan.id,
        stored,
        derived,
        payment_count: payments.len(),
        in_sync: stored == derived,
        repaired: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::loan::sample_application;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn rate() -> Rate {
        Rate::from_decimal(dec!(0.30))
    }

    fn allocated(amount: i64) -> Loan {
        let mut loan = Loan::pending(Uuid::new_v4(), sample_application(amount), start());
        loan.approve(Uuid::new_v4(), start()).unwrap();
        loan.allocate(rate(), start()).unwrap();
        loan
    }

    fn pay(loan: &mut Loan, history: &mut Vec<Payment>, minor: i64, at: DateTime<Utc>) {
        let request = PaymentRequest::new(loan.id, loan.user_id, Money::from_minor(minor), at);
        if loan.apply_payment(request.amount, at).is_ok() {
            history.push(request.into_payment(at));
        }
    }

    #[test]
    fn test_non_positive_payments_rejected() {
        let loan_id = Uuid::new_v4();
        let user_id = Uuid::new_v4();
        for amount in [Money::ZERO, Money::from_major(-50)] {
            let request = PaymentRequest::new(loan_id, user_id, amount, start());
            assert_eq!(request.validate(), Err(ValidationError::NonPositivePayment { amount }));
        }
        assert!(PaymentRequest::new(loan_id, user_id, Money::CENT, start()).validate().is_ok());
    }

    #[test]
    fn test_overpayment_clamps() {
        assert_eq!(remaining_after(Money::from_major(8_000), Money::from_major(9_000)), Money::ZERO);
        assert_eq!(remaining_after(Money::from_major(8_000), Money::from_major(8_000)), Money::ZERO);
        assert_eq!(
            remaining_after(Money::from_major(13_000), Money::from_major(5_000)),
            Money::from_major(8_000)
        );
    }

    #[test]
    fn test_reconcile_matches_worked_example() {
        let mut loan = allocated(10_000);
        let mut history = Vec::new();
        pay(&mut loan, &mut history, 500_000, start() + Duration::days(10));
        pay(&mut loan, &mut history, 900_000, start() + Duration::days(20));

        let report = reconcile(&loan, &history).unwrap();
        assert!(report.in_sync);
        assert_eq!(report.stored, Money::ZERO);
        assert_eq!(report.payment_count, 2);
        assert_eq!(total_paid(&history), Money::from_major(14_000));
    }

    #[test]
    fn test_reconcile_reports_drift() {
        let mut loan = allocated(10_000);
        let history = vec![PaymentRequest::new(loan.id, loan.user_id, Money::from_major(3_000), start())
            .into_payment(start())];

        // balance update lost after the payment row was written
        loan.remaining_amount = Some(Money::from_major(13_000));

        let report = reconcile(&loan, &history).unwrap();
        assert!(!report.in_sync);
        assert_eq!(report.derived, Money::from_major(10_000));
        assert_eq!(report.drift(), Money::from_major(3_000));
    }

    #[test]
    fn test_reconcile_uses_total_fixed_at_allocation() {
        let mut loan = Loan::pending(Uuid::new_v4(), sample_application(10_000), start());
        loan.approve(Uuid::new_v4(), start()).unwrap();
        loan.allocate(Rate::from_decimal(dec!(0.35)), start()).unwrap();

        let mut history = Vec::new();
        pay(&mut loan, &mut history, 1_350_000, start());
        assert_eq!(loan.status, crate::types::LoanStatus::Repaid);

        let report = reconcile(&loan, &history).unwrap();
        assert!(report.in_sync);
        assert_eq!(report.derived, Money::ZERO);
    }

    #[test]
    fn test_reconcile_needs_allocation_terms() {
        let mut loan = allocated(10_000);
        loan.total_repayment = None;
        assert!(matches!(reconcile(&loan, &[]), Err(LendingError::Calculation { .. })));
    }

    #[test]
    fn test_request_matches_only_identical_payment() {
        let loan = allocated(10_000);
        let request = PaymentRequest::new(loan.id, loan.user_id, Money::from_major(500), start());
        let recorded = request.clone().into_payment(start());
        assert!(request.matches(&recorded));

        let mut other_amount = request.clone();
        other_amount.amount = Money::from_major(600);
        assert!(!other_amount.matches(&recorded));

        let mut other_loan = request;
        other_loan.loan_id = Uuid::new_v4();
        assert!(!other_loan.matches(&recorded));
    }

    #[test]
    fn test_request_amount_is_rounded_on_decode() {
        let request = PaymentRequest::new(Uuid::new_v4(), Uuid::new_v4(), Money::CENT, start());
        let mut value = serde_json::to_value(&request).unwrap();
        value["amount"] = serde_json::json!("0.004");

        let decoded: PaymentRequest = serde_json::from_value(value).unwrap();
        assert_eq!(decoded.amount, Money::ZERO);
        assert_eq!(
            decoded.validate(),
            Err(ValidationError::NonPositivePayment { amount: Money::ZERO })
        );
    }

    #[test]
    fn test_display_order_is_newest_first() {
        let loan = allocated(10_000);
        let mut payments: Vec<Payment> = [3, 1, 2]
            .iter()
            .map(|day| {
                PaymentRequest::new(loan.id, loan.user_id, Money::from_major(100), start() + Duration::days(*day))
                    .into_payment(start())
            })
            .collect();

        sort_for_display(&mut payments);
        let days: Vec<i64> = payments.iter().map(|p| (p.date - start()).num_days()).collect();
        assert_eq!(days, vec![3, 2, 1]);
    }

    proptest! {
        #[test]
        fn prop_stored_balance_matches_history(
            principal in 1_000i64..=100_000,
            payments in prop::collection::vec(1i64..=5_000_000, 0..20),
        ) {
            let mut loan = allocated(principal);
            let mut history = Vec::new();
            for (i, minor) in payments.iter().enumerate() {
                pay(&mut loan, &mut history, *minor, start() + Duration::hours(i as i64));

                prop_assert!(!loan.outstanding().is_negative());
                prop_assert!(loan.check_invariants());
                prop_assert_eq!(Some(loan.outstanding()), derived_remaining(&loan, &history));
            }
        }
    }
}
