pub mod memory;

pub use memory::InMemoryStore;

use crate::errors::Result;
use crate::ledger::Payment;
use crate::loan::Loan;
use crate::profile::Profile;
use crate::types::{LoanId, PaymentId, UserId};

/// outcome of committing a payment
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentCommit {
    /// payment appended and loan written
    Applied { payment: Payment, loan: Loan },
    /// a payment with this id already exists; nothing was written
    Duplicate(Payment),
}

/// row storage backing the lending service
///
/// Implementations own the `user_profiles`, `loans` and `payments` tables.
/// Loan writes are compare-and-swap on [`Loan::version`]: a write whose
/// `expected_version` does not match the stored row fails with
/// `LendingError::Conflict` and changes nothing.
pub trait LendingStore: Send + Sync {
    /// insert a profile; at most one per user
    fn insert_profile(&self, profile: Profile) -> Result<Profile>;

    fn profile_for_user(&self, user_id: UserId) -> Result<Option<Profile>>;

    fn insert_loan(&self, loan: Loan) -> Result<Loan>;

    fn loan(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// every loan, newest first
    fn loans(&self) -> Result<Vec<Loan>>;

    /// one user's loans, newest first
    fn loans_for_user(&self, user_id: UserId) -> Result<Vec<Loan>>;

    /// replace the stored loan if its version is still `expected_version`
    fn update_loan(&self, loan: Loan, expected_version: u64) -> Result<Loan>;

    fn payment(&self, payment_id: PaymentId) -> Result<Option<Payment>>;

    /// a loan's payments, newest first
    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>>;

    /// append `payment` and write `loan` as one transaction
    ///
    /// A payment id that is already stored short-circuits to
    /// [`PaymentCommit::Duplicate`] before any version check.
    fn commit_payment(
        &self,
        payment: Payment,
        loan: Loan,
        expected_version: u64,
    ) -> Result<PaymentCommit>;
}
