use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{LoanId, PaymentId, ProfileId, UserId};

/// all events that can be emitted by the lending service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // borrower events
    ProfileCreated {
        profile_id: ProfileId,
        user_id: UserId,
        timestamp: DateTime<Utc>,
    },
    LoanSubmitted {
        loan_id: LoanId,
        user_id: UserId,
        amount: Money,
        repayment_period_days: u32,
        timestamp: DateTime<Utc>,
    },

    // staff decisions
    LoanApproved {
        loan_id: LoanId,
        approved_by: UserId,
        timestamp: DateTime<Utc>,
    },
    LoanRejected {
        loan_id: LoanId,
        rejected_by: UserId,
        timestamp: DateTime<Utc>,
    },
    LoanAllocated {
        loan_id: LoanId,
        principal: Money,
        total_repayment: Money,
        timestamp: DateTime<Utc>,
    },

    // ledger events
    PaymentRecorded {
        loan_id: LoanId,
        payment_id: PaymentId,
        amount: Money,
        remaining_amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        final_payment: Money,
        timestamp: DateTime<Utc>,
    },
    BalanceReconciled {
        loan_id: LoanId,
        stored: Money,
        derived: Money,
        timestamp: DateTime<Utc>,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_take_events_drains() {
        let mut store = EventStore::new();
        store.emit(Event::LoanRepaid {
            loan_id: Uuid::new_v4(),
            final_payment: Money::from_major(9_000),
            timestamp: Utc::now(),
        });

        assert_eq!(store.events().len(), 1);
        let drained = store.take_events();
        assert_eq!(drained.len(), 1);
        assert!(store.events().is_empty());
    }
}
