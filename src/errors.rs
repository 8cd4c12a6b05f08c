use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{LoanAction, LoanId, LoanStatus, PaymentId, UserId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LendingError {
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("cannot {action} loan {loan_id}: current status is {status}")]
    InvalidTransition {
        loan_id: LoanId,
        status: LoanStatus,
        action: LoanAction,
    },

    #[error("loan {loan_id} was modified concurrently: expected version {expected}, found {actual}")]
    Conflict {
        loan_id: LoanId,
        expected: u64,
        actual: u64,
    },

    #[error("persistence error: {message}")]
    Persistence {
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: Uuid,
    },

    #[error("user {user_id} is not allowed to {action}")]
    Unauthorized {
        user_id: UserId,
        action: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("calculation error: {message}")]
    Calculation {
        message: String,
    },
}

impl LendingError {
    pub fn persistence(message: impl Into<String>) -> Self {
        LendingError::Persistence {
            message: message.into(),
        }
    }

    pub fn calculation(message: impl Into<String>) -> Self {
        LendingError::Calculation {
            message: message.into(),
        }
    }

    /// backend failures and lost races may succeed on retry; nothing else will
    pub fn is_retryable(&self) -> bool {
        matches!(self, LendingError::Persistence { .. } | LendingError::Conflict { .. })
    }
}

/// input that violates a stated constraint
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("amount must be between {min} and {max}, got {amount}")]
    AmountOutOfRange {
        amount: Money,
        min: Money,
        max: Money,
    },

    #[error("purpose must be at least {min} characters, got {actual}")]
    PurposeTooShort {
        min: usize,
        actual: usize,
    },

    #[error("repayment period must be between {min} and {max} days, got {days}")]
    RepaymentPeriodOutOfRange {
        days: u32,
        min: u32,
        max: u32,
    },

    #[error("{field} is required")]
    MissingField {
        field: &'static str,
    },

    #[error("terms and conditions must be accepted")]
    TermsNotAccepted,

    #[error("payment amount must be greater than zero, got {amount}")]
    NonPositivePayment {
        amount: Money,
    },

    #[error("user {user_id} must create a profile before applying")]
    ProfileRequired {
        user_id: UserId,
    },

    #[error("user {user_id} already has a profile")]
    ProfileAlreadyExists {
        user_id: UserId,
    },

    #[error("payment user {given} does not own loan {loan_id}")]
    PaymentOwnerMismatch {
        loan_id: LoanId,
        given: UserId,
    },

    #[error("payment id {payment_id} was already used for a different payment")]
    PaymentIdReused {
        payment_id: PaymentId,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
