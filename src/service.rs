use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hourglass_rs::SafeTimeProvider;
use log::{debug, info, warn};

use crate::config::LendingConfig;
use crate::decimal::Money;
use crate::errors::{LendingError, Result, ValidationError};
use crate::events::{Event, EventStore};
use crate::interest::RepaymentQuote;
use crate::ledger::{self, Payment, PaymentRequest, Reconciliation};
use crate::loan::{Loan, LoanApplication};
use crate::profile::{NewProfile, Profile};
use crate::statement::LoanStatement;
use crate::store::{LendingStore, PaymentCommit};
use crate::types::{LoanAction, LoanId, LoanStatus, Principal, UserId};

/// borrower and staff operations over a [`LendingStore`]
///
/// Every operation takes the caller's [`Principal`]; staff-only operations
/// fail with `Unauthorized` for borrowers. Loan transitions are optimistic:
/// the caller passes the version it last read and a concurrent change
/// surfaces as `Conflict` instead of being overwritten.
pub struct LendingService<'a, S: LendingStore> {
    store: S,
    config: LendingConfig,
    time: &'a SafeTimeProvider,
    events: Mutex<EventStore>,
}

impl<'a, S: LendingStore> LendingService<'a, S> {
    pub fn new(store: S, config: LendingConfig, time: &'a SafeTimeProvider) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            time,
            events: Mutex::new(EventStore::new()),
        })
    }

    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// hand back the store, e.g. to reopen it under a different config
    pub fn into_store(self) -> S {
        self.store
    }

    /// interest and total owed for a prospective loan
    pub fn quote(&self, amount: Money, repayment_period_days: u32) -> Result<RepaymentQuote> {
        RepaymentQuote::new(amount, self.config.interest_rate, repayment_period_days)
    }

    // profiles

    pub fn create_profile(&self, principal: &Principal, details: NewProfile) -> Result<Profile> {
        let user_id = principal.user_id;
        if self.store.profile_for_user(user_id)?.is_some() {
            return Err(ValidationError::ProfileAlreadyExists { user_id }.into());
        }

        let profile = Profile::create(user_id, details, self.now())?;
        let profile = self.store.insert_profile(profile)?;

        info!("profile {} created for user {}", profile.id, user_id);
        self.emit(Event::ProfileCreated {
            profile_id: profile.id,
            user_id,
            timestamp: profile.created_at,
        });
        Ok(profile)
    }

    pub fn get_profile(&self, principal: &Principal, user_id: UserId) -> Result<Profile> {
        authorize_view(principal, user_id, "view profile")?;
        self.store
            .profile_for_user(user_id)?
            .ok_or(LendingError::NotFound {
                entity: "profile",
                id: user_id,
            })
    }

    // loan intake

    /// validate and store a pending loan for the caller
    pub fn submit_loan(&self, principal: &Principal, application: LoanApplication) -> Result<Loan> {
        let user_id = principal.user_id;
        application.validate(&self.config)?;
        if self.store.profile_for_user(user_id)?.is_none() {
            return Err(ValidationError::ProfileRequired { user_id }.into());
        }

        let loan = self
            .store
            .insert_loan(Loan::pending(user_id, application, self.now()))?;

        info!(
            "loan {} submitted by {}: {}",
            loan.id,
            user_id,
            self.config.display_amount(loan.amount)
        );
        self.emit(Event::LoanSubmitted {
            loan_id: loan.id,
            user_id,
            amount: loan.amount,
            repayment_period_days: loan.repayment_period_days,
            timestamp: loan.created_at,
        });
        Ok(loan)
    }

    // staff decisions

    pub fn approve(&self, principal: &Principal, loan_id: LoanId, expected_version: u64) -> Result<Loan> {
        let staff_id = principal.user_id;
        let loan = self.transition(principal, loan_id, expected_version, LoanAction::Approve, |loan, now| {
            loan.approve(staff_id, now)
        })?;

        self.emit(Event::LoanApproved {
            loan_id,
            approved_by: staff_id,
            timestamp: loan.updated_at,
        });
        Ok(loan)
    }

    pub fn reject(&self, principal: &Principal, loan_id: LoanId, expected_version: u64) -> Result<Loan> {
        let loan = self.transition(principal, loan_id, expected_version, LoanAction::Reject, |loan, now| {
            loan.reject(now)
        })?;

        self.emit(Event::LoanRejected {
            loan_id,
            rejected_by: principal.user_id,
            timestamp: loan.updated_at,
        });
        Ok(loan)
    }

    /// disburse an approved loan and open its repayment ledger
    pub fn allocate(&self, principal: &Principal, loan_id: LoanId, expected_version: u64) -> Result<Loan> {
        let rate = self.config.interest_rate;
        let loan = self.transition(principal, loan_id, expected_version, LoanAction::Allocate, |loan, now| {
            loan.allocate(rate, now)
        })?;

        self.emit(Event::LoanAllocated {
            loan_id,
            principal: loan.amount,
            total_repayment: loan.outstanding(),
            timestamp: loan.updated_at,
        });
        Ok(loan)
    }

    fn transition<F>(
        &self,
        principal: &Principal,
        loan_id: LoanId,
        expected_version: u64,
        action: LoanAction,
        apply: F,
    ) -> Result<Loan>
    where
        F: FnOnce(&mut Loan, DateTime<Utc>) -> Result<()>,
    {
        require_staff(principal, action)?;

        let mut loan = self.load_loan(loan_id)?;
        if loan.version != expected_version {
            return Err(LendingError::Conflict {
                loan_id,
                expected: expected_version,
                actual: loan.version,
            });
        }

        let from = loan.status;
        apply(&mut loan, self.now())?;
        let loan = self.store.update_loan(loan, expected_version)?;

        info!(
            "loan {} {} -> {} by {} ({})",
            loan_id, from, loan.status, principal.user_id, action
        );
        Ok(loan)
    }

    // repayment ledger

    /// record a repayment against an allocated loan
    ///
    /// The payment row, the new balance and, at zero, the repaid status are
    /// committed together. Resubmitting a request with the same id returns
    /// the payment recorded the first time; reusing the id for a different
    /// payment is rejected.
    pub fn record_payment(&self, principal: &Principal, request: PaymentRequest) -> Result<Payment> {
        require_staff(principal, LoanAction::RecordPayment)?;
        request.validate()?;

        if let Some(existing) = self.store.payment(request.id)? {
            check_resubmission(&request, &existing)?;
            debug!("payment {} already recorded, skipping", existing.id);
            return Ok(existing);
        }

        let mut loan = self.load_loan(request.loan_id)?;
        if request.user_id != loan.user_id {
            return Err(ValidationError::PaymentOwnerMismatch {
                loan_id: loan.id,
                given: request.user_id,
            }
            .into());
        }

        let expected_version = loan.version;
        let now = self.now();
        let remaining = loan.apply_payment(request.amount, now)?;

        match self
            .store
            .commit_payment(request.clone().into_payment(now), loan, expected_version)?
        {
            PaymentCommit::Applied { payment, loan } => {
                info!(
                    "payment {} of {} on loan {}, remaining {}",
                    payment.id,
                    self.config.display_amount(payment.amount),
                    loan.id,
                    self.config.display_amount(remaining)
                );
                self.emit(Event::PaymentRecorded {
                    loan_id: loan.id,
                    payment_id: payment.id,
                    amount: payment.amount,
                    remaining_amount: remaining,
                    timestamp: now,
                });
                if loan.status == LoanStatus::Repaid {
                    info!("loan {} repaid", loan.id);
                    self.emit(Event::LoanRepaid {
                        loan_id: loan.id,
                        final_payment: payment.amount,
                        timestamp: now,
                    });
                }
                Ok(payment)
            }
            PaymentCommit::Duplicate(existing) => {
                check_resubmission(&request, &existing)?;
                debug!("payment {} committed concurrently, skipping", existing.id);
                Ok(existing)
            }
        }
    }

    /// recompute a loan's balance from its payments and repair drift
    ///
    /// Only open loans are repaired. Drift on a repaid loan is reported and
    /// logged but the loan stays closed.
    pub fn reconcile_loan(&self, principal: &Principal, loan_id: LoanId) -> Result<Reconciliation> {
        require_staff(principal, LoanAction::Reconcile)?;

        let mut loan = self.load_loan(loan_id)?;
        if !loan.status.has_balance() {
            return Err(LendingError::InvalidTransition {
                loan_id,
                status: loan.status,
                action: LoanAction::Reconcile,
            });
        }

        let payments = self.store.payments_for_loan(loan_id)?;
        let mut report = ledger::reconcile(&loan, &payments)?;
        if report.in_sync {
            return Ok(report);
        }

        warn!(
            "loan {} balance drift: stored {}, derived {} from {} payments",
            loan_id, report.stored, report.derived, report.payment_count
        );
        if loan.status == LoanStatus::Repaid {
            warn!("loan {} is repaid, leaving balance as stored", loan_id);
            return Ok(report);
        }

        let expected_version = loan.version;
        let now = self.now();
        loan.restate_balance(report.derived, now)?;
        self.store.update_loan(loan, expected_version)?;
        report.repaired = true;

        self.emit(Event::BalanceReconciled {
            loan_id,
            stored: report.stored,
            derived: report.derived,
            timestamp: now,
        });
        Ok(report)
    }

    // reads

    pub fn get_loan(&self, principal: &Principal, loan_id: LoanId) -> Result<Loan> {
        let loan = self.load_loan(loan_id)?;
        authorize_view(principal, loan.user_id, "view loan")?;
        Ok(loan)
    }

    /// staff see every loan, borrowers their own; newest first
    pub fn list_loans(&self, principal: &Principal) -> Result<Vec<Loan>> {
        if principal.is_admin {
            self.store.loans()
        } else {
            self.store.loans_for_user(principal.user_id)
        }
    }

    /// newest first
    pub fn payments_for_loan(&self, principal: &Principal, loan_id: LoanId) -> Result<Vec<Payment>> {
        let loan = self.get_loan(principal, loan_id)?;
        self.store.payments_for_loan(loan.id)
    }

    pub fn loan_statement(&self, principal: &Principal, loan_id: LoanId) -> Result<LoanStatement> {
        let loan = self.get_loan(principal, loan_id)?;
        let payments = self.store.payments_for_loan(loan.id)?;
        LoanStatement::new(loan, payments, &self.config)
    }

    // events

    pub fn take_events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(mut events) => events.take_events(),
            Err(poisoned) => poisoned.into_inner().take_events(),
        }
    }

    fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.emit(event),
            Err(poisoned) => poisoned.into_inner().emit(event),
        }
    }

    fn load_loan(&self, loan_id: LoanId) -> Result<Loan> {
        self.store.loan(loan_id)?.ok_or(LendingError::NotFound {
            entity: "loan",
            id: loan_id,
        })
    }

    fn now(&self) -> DateTime<Utc> {
        self.time.now()
    }
}

fn require_staff(principal: &Principal, action: LoanAction) -> Result<()> {
    if !principal.is_admin {
        return Err(LendingError::Unauthorized {
            user_id: principal.user_id,
            action: action.to_string(),
        });
    }
    Ok(())
}

/// a known payment id only resolves to the payment it was first used for
fn check_resubmission(request: &PaymentRequest, existing: &Payment) -> Result<()> {
    if !request.matches(existing) {
        return Err(ValidationError::PaymentIdReused {
            payment_id: request.id,
        }
        .into());
    }
    Ok(())
}

fn authorize_view(principal: &Principal, owner: UserId, action: &str) -> Result<()> {
    if !principal.can_view(owner) {
        return Err(LendingError::Unauthorized {
            user_id: principal.user_id,
            action: action.to_string(),
        });
    }
    Ok(())
}
