use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LendingConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result, ValidationError};
use crate::interest;
use crate::types::{LoanAction, LoanId, LoanStatus, UserId};

/// a borrower's request for funds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub amount: Money,
    pub purpose: String,
    pub repayment_period_days: u32,
    pub payment_method: String,
    pub payment_details: String,
}

impl LoanApplication {
    /// check the application against the product bounds (all inclusive)
    pub fn validate(&self, config: &LendingConfig) -> std::result::Result<(), ValidationError> {
        if self.amount < config.min_amount || self.amount > config.max_amount {
            return Err(ValidationError::AmountOutOfRange {
                amount: self.amount,
                min: config.min_amount,
                max: config.max_amount,
            });
        }

        let purpose_chars = self.purpose.chars().count();
        if purpose_chars < config.min_purpose_chars {
            return Err(ValidationError::PurposeTooShort {
                min: config.min_purpose_chars,
                actual: purpose_chars,
            });
        }

        let days = self.repayment_period_days;
        if days < config.min_repayment_days || days > config.max_repayment_days {
            return Err(ValidationError::RepaymentPeriodOutOfRange {
                days,
                min: config.min_repayment_days,
                max: config.max_repayment_days,
            });
        }

        if self.payment_method.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "payment_method" });
        }
        if self.payment_details.trim().is_empty() {
            return Err(ValidationError::MissingField { field: "payment_details" });
        }

        Ok(())
    }
}

/// a loan record and its position in the lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub amount: Money,
    pub purpose: String,
    pub repayment_period_days: u32,
    pub payment_method: String,
    pub payment_details: String,
    pub status: LoanStatus,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub allocated_at: Option<DateTime<Utc>>,
    /// rate in force when the loan was allocated
    #[serde(default)]
    pub interest_rate: Option<Rate>,
    /// principal plus interest fixed at allocation
    #[serde(default)]
    pub total_repayment: Option<Money>,
    /// outstanding balance; present only once allocated
    pub remaining_amount: Option<Money>,
    /// bumped on every write, compared on every update
    pub version: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loan {
    /// new pending loan; the application must already be validated
    pub fn pending(user_id: UserId, application: LoanApplication, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            amount: application.amount,
            purpose: application.purpose,
            repayment_period_days: application.repayment_period_days,
            payment_method: application.payment_method,
            payment_details: application.payment_details,
            status: LoanStatus::Pending,
            approved_by: None,
            approved_at: None,
            allocated_at: None,
            interest_rate: None,
            total_repayment: None,
            remaining_amount: None,
            version: 1,
            created_at: now,
            updated_at: now,
        }
    }

    /// pending -> approved
    pub fn approve(&mut self, staff_id: UserId, now: DateTime<Utc>) -> Result<()> {
        self.require(LoanStatus::Pending, LoanAction::Approve)?;
        self.status = LoanStatus::Approved;
        self.approved_by = Some(staff_id);
        self.approved_at = Some(now);
        self.touch(now);
        Ok(())
    }

    /// pending -> rejected
    pub fn reject(&mut self, now: DateTime<Utc>) -> Result<()> {
        self.require(LoanStatus::Pending, LoanAction::Reject)?;
        self.status = LoanStatus::Rejected;
        self.touch(now);
        Ok(())
    }

    /// approved -> allocated, opening the ledger at principal plus flat interest;
    /// the rate and total are fixed on the loan from here on
    pub fn allocate(&mut self, rate: Rate, now: DateTime<Utc>) -> Result<()> {
        self.require(LoanStatus::Approved, LoanAction::Allocate)?;
        let total = interest::total_repayment(self.amount, rate)?;
        self.status = LoanStatus::Allocated;
        self.allocated_at = Some(now);
        self.interest_rate = Some(rate);
        self.total_repayment = Some(total);
        self.remaining_amount = Some(total);
        self.touch(now);
        Ok(())
    }

    /// reduce the balance by `amount`, clamping at zero; closes the loan at zero
    pub fn apply_payment(&mut self, amount: Money, now: DateTime<Utc>) -> Result<Money> {
        self.require(LoanStatus::Allocated, LoanAction::RecordPayment)?;
        let remaining = crate::ledger::remaining_after(self.outstanding(), amount);
        self.remaining_amount = Some(remaining);
        if remaining.is_zero() {
            self.status = LoanStatus::Repaid;
        }
        self.touch(now);
        Ok(remaining)
    }

    /// overwrite the balance of an open loan with one derived from payment
    /// history; a repaid loan is never reopened
    pub(crate) fn restate_balance(&mut self, remaining: Money, now: DateTime<Utc>) -> Result<()> {
        self.require(LoanStatus::Allocated, LoanAction::Reconcile)?;
        self.remaining_amount = Some(remaining);
        if remaining.is_zero() {
            self.status = LoanStatus::Repaid;
        }
        self.touch(now);
        Ok(())
    }

    /// balance owed, zero before allocation
    pub fn outstanding(&self) -> Money {
        self.remaining_amount.unwrap_or(Money::ZERO)
    }

    pub fn is_open(&self) -> bool {
        self.status == LoanStatus::Allocated
    }

    /// remaining amount present iff allocated/repaid, zero once repaid
    pub fn check_invariants(&self) -> bool {
        match (self.status, self.remaining_amount) {
            (LoanStatus::Repaid, Some(remaining)) => remaining.is_zero(),
            (LoanStatus::Allocated, Some(remaining)) => !remaining.is_negative(),
            (status, None) => !status.has_balance(),
            (_, Some(_)) => false,
        }
    }

    fn require(&self, expected: LoanStatus, action: LoanAction) -> Result<()> {
        if self.status != expected {
            return Err(LendingError::InvalidTransition {
                loan_id: self.id,
                status: self.status,
                action,
            });
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}

#[cfg(test)]
pub(crate) fn sample_application(amount: i64) -> LoanApplication {
    LoanApplication {
        amount: Money::from_major(amount),
        purpose: "School fees for the term".to_string(),
        repayment_period_days: 90,
        payment_method: "M-Pesa".to_string(),
        payment_details: "0712345678".to_string(),
    }
}
