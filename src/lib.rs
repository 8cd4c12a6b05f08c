pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod ledger;
pub mod loan;
pub mod profile;
pub mod service;
pub mod statement;
pub mod store;
pub mod types;

// re-export key types
pub use config::LendingConfig;
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result, ValidationError};
pub use events::{Event, EventStore};
pub use interest::{interest, total_repayment, RepaymentQuote};
pub use ledger::{Payment, PaymentRequest, Reconciliation};
pub use loan::{Loan, LoanApplication};
pub use profile::{NewProfile, NextOfKin, Profile};
pub use service::LendingService;
pub use statement::{LoanStatement, StatementTotals};
pub use store::{InMemoryStore, LendingStore, PaymentCommit};
pub use types::{LoanAction, LoanId, LoanStatus, PaymentId, Principal, ProfileId, UserId};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
