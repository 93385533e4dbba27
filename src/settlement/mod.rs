//! Settlement module: contract pricing and transaction lifecycle

pub mod finalizer;
pub mod pricing;
pub mod types;

pub use finalizer::TransactionFinalizer;
pub use types::{Financing, PricingMode, Transaction, TransactionDraft, TransactionStatus};
