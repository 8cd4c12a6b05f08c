//! Flat interest: a single charge on the principal, not compounded and
//! not prorated by the repayment period.

use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};

/// interest owed on a principal
pub fn interest(amount: Money, rate: Rate) -> Result<Money> {
    amount
        .checked_apply(rate)
        .ok_or_else(|| LendingError::calculation(format!("interest on {amount} at {rate} overflows")))
}

/// principal plus interest; seeds the remaining amount at allocation
pub fn total_repayment(amount: Money, rate: Rate) -> Result<Money> {
    amount
        .checked_add(interest(amount, rate)?)
        .ok_or_else(|| LendingError::calculation(format!("total repayment on {amount} overflows")))
}

/// estimate shown to an applicant before submitting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentQuote {
    pub principal: Money,
    pub rate: Rate,
    pub interest: Money,
    pub total_repayment: Money,
    pub repayment_period_days: u32,
}

impl RepaymentQuote {
    pub fn new(principal: Money, rate: Rate, repayment_period_days: u32) -> Result<Self> {
        Ok(Self {
            principal,
            rate,
            interest: interest(principal, rate)?,
            total_repayment: total_repayment(principal, rate)?,
            repayment_period_days,
        })
    }
}
