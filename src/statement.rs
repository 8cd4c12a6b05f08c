//! Serializable views of a loan and its repayment history.

use serde::{Deserialize, Serialize};

use crate::config::LendingConfig;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::interest;
use crate::ledger::{self, Payment};
use crate::loan::Loan;
use crate::types::LoanStatus;

/// loan detail with repayment totals, as shown to borrower and staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanStatement {
    pub loan: Loan,
    pub payments: Vec<Payment>,
    pub totals: StatementTotals,
    pub currency: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementTotals {
    pub principal: Money,
    pub interest_rate: Rate,
    pub interest: Money,
    pub total_repayment: Money,
    pub total_paid: Money,
    /// outstanding balance; absent until allocation
    pub remaining_amount: Option<Money>,
    pub payment_count: usize,
}

impl LoanStatement {
    /// allocated loans show the terms fixed at allocation; earlier ones a
    /// quote at the configured rate
    pub fn new(loan: Loan, mut payments: Vec<Payment>, config: &LendingConfig) -> Result<Self> {
        ledger::sort_for_display(&mut payments);
        let rate = loan.interest_rate.unwrap_or(config.interest_rate);
        let total_repayment = match loan.total_repayment {
            Some(total) => total,
            None => interest::total_repayment(loan.amount, rate)?,
        };
        let totals = StatementTotals {
            principal: loan.amount,
            interest_rate: rate,
            interest: total_repayment.saturating_sub(loan.amount),
            total_repayment,
            total_paid: ledger::total_paid(&payments),
            remaining_amount: loan.remaining_amount,
            payment_count: payments.len(),
        };
        Ok(Self {
            loan,
            payments,
            totals,
            currency: config.currency.clone(),
        })
    }

    pub fn status(&self) -> LoanStatus {
        self.loan.status
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
