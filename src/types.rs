use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// identity provider user id
pub type UserId = Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a payment; generated by the client so resubmits dedupe
pub type PaymentId = Uuid;

/// unique identifier for a borrower profile
pub type ProfileId = Uuid;

/// the authenticated caller, as vouched for by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub is_admin: bool,
}

impl Principal {
    pub fn borrower(user_id: UserId) -> Self {
        Self { user_id, is_admin: false }
    }

    pub fn staff(user_id: UserId) -> Self {
        Self { user_id, is_admin: true }
    }

    /// admins see everything, borrowers only their own records
    pub fn can_view(&self, owner: UserId) -> bool {
        self.is_admin || self.user_id == owner
    }
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// submitted, awaiting staff review
    Pending,
    /// approved by staff, funds not yet disbursed
    Approved,
    /// funds disbursed, repayment ledger active
    Allocated,
    /// declined by staff
    Rejected,
    /// remaining amount reached zero
    Repaid,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 5] = [
        LoanStatus::Pending,
        LoanStatus::Approved,
        LoanStatus::Allocated,
        LoanStatus::Rejected,
        LoanStatus::Repaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Allocated => "allocated",
            LoanStatus::Rejected => "rejected",
            LoanStatus::Repaid => "repaid",
        }
    }

    /// no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Rejected | LoanStatus::Repaid)
    }

    /// statuses that carry a remaining amount
    pub fn has_balance(&self) -> bool {
        matches!(self, LoanStatus::Allocated | LoanStatus::Repaid)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LoanStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown loan status: {}", s))
    }
}

/// staff or ledger actions that move a loan through its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanAction {
    Approve,
    Reject,
    Allocate,
    RecordPayment,
    Reconcile,
}

impl fmt::Display for LoanAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoanAction::Approve => "approve",
            LoanAction::Reject => "reject",
            LoanAction::Allocate => "allocate",
            LoanAction::RecordPayment => "record payment",
            LoanAction::Reconcile => "reconcile",
        };
        f.write_str(name)
    }
}
