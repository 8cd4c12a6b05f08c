use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::debug;

use super::{LendingStore, PaymentCommit};
use crate::errors::{LendingError, Result, ValidationError};
use crate::ledger::{self, Payment};
use crate::loan::Loan;
use crate::profile::Profile;
use crate::types::{LoanId, PaymentId, UserId};

#[derive(Debug, Default)]
struct Tables {
    profiles: HashMap<UserId, Profile>,
    loans: HashMap<LoanId, Loan>,
    payments: HashMap<PaymentId, Payment>,
}

impl Tables {
    fn check_version(&self, loan: &Loan, expected_version: u64) -> Result<()> {
        let stored = self.loans.get(&loan.id).ok_or(LendingError::NotFound {
            entity: "loan",
            id: loan.id,
        })?;
        if stored.version != expected_version {
            return Err(LendingError::Conflict {
                loan_id: loan.id,
                expected: expected_version,
                actual: stored.version,
            });
        }
        Ok(())
    }
}

/// in-process store; every method runs under a single lock, so multi-row
/// writes are atomic
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| LendingError::persistence("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| LendingError::persistence("store lock poisoned"))
    }
}

fn newest_first(mut loans: Vec<Loan>) -> Vec<Loan> {
    loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    loans
}

impl LendingStore for InMemoryStore {
    fn insert_profile(&self, profile: Profile) -> Result<Profile> {
        let mut tables = self.write()?;
        if tables.profiles.contains_key(&profile.user_id) {
            return Err(ValidationError::ProfileAlreadyExists {
                user_id: profile.user_id,
            }
            .into());
        }
        tables.profiles.insert(profile.user_id, profile.clone());
        Ok(profile)
    }

    fn profile_for_user(&self, user_id: UserId) -> Result<Option<Profile>> {
        Ok(self.read()?.profiles.get(&user_id).cloned())
    }

    fn insert_loan(&self, loan: Loan) -> Result<Loan> {
        let mut tables = self.write()?;
        if tables.loans.contains_key(&loan.id) {
            return Err(LendingError::persistence(format!("duplicate loan id {}", loan.id)));
        }
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    fn loan(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.read()?.loans.get(&loan_id).cloned())
    }

    fn loans(&self) -> Result<Vec<Loan>> {
        Ok(newest_first(self.read()?.loans.values().cloned().collect()))
    }

    fn loans_for_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let loans = self
            .read()?
            .loans
            .values()
            .filter(|loan| loan.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(loans))
    }

    fn update_loan(&self, loan: Loan, expected_version: u64) -> Result<Loan> {
        let mut tables = self.write()?;
        tables.check_version(&loan, expected_version)?;
        debug!("loan {} v{} -> v{}", loan.id, expected_version, loan.version);
        tables.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    fn payment(&self, payment_id: PaymentId) -> Result<Option<Payment>> {
        Ok(self.read()?.payments.get(&payment_id).cloned())
    }

    fn payments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Payment>> {
        let mut payments: Vec<Payment> = self
            .read()?
            .payments
            .values()
            .filter(|payment| payment.loan_id == loan_id)
            .cloned()
            .collect();
        ledger::sort_for_display(&mut payments);
        Ok(payments)
    }

    fn commit_payment(
        &self,
        payment: Payment,
        loan: Loan,
        expected_version: u64,
    ) -> Result<PaymentCommit> {
        let mut tables = self.write()?;
        if let Some(existing) = tables.payments.get(&payment.id) {
            return Ok(PaymentCommit::Duplicate(existing.clone()));
        }
        tables.check_version(&loan, expected_version)?;

        tables.payments.insert(payment.id, payment.clone());
        tables.loans.insert(loan.id, loan.clone());
        Ok(PaymentCommit::Applied { payment, loan })
    }
}
