//! Dealbook
//!
//! Deal negotiation and transaction finalization core for a property
//! brokerage:
//! - Offer / counter-offer exchange with server-enforced turn-taking
//! - Accept / decline / cancel deal lifecycle
//! - Contract pricing (total contract price, balance due) recomputed
//!   server-side on every mutation
//! - Transaction lifecycle with write-once status timestamps
//!
//! Listings and actor identity live behind collaborator traits; rows are
//! mutated through a compare-and-swap discipline so racing requests fail
//! with a conflict instead of clobbering each other.

pub mod cli;
pub mod directory;
pub mod error;
pub mod events;
pub mod negotiation;
pub mod settlement;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use error::{DealbookError, Result};
pub use events::Notification;
pub use negotiation::{Deal, DealStatus, NegotiationEngine, OfferMode};
pub use settlement::{
    Financing, PricingMode, Transaction, TransactionDraft, TransactionFinalizer, TransactionStatus,
};
pub use types::{ActorId, DealId, Listing, ListingId, PartySide, PropertyKind, TransactionId};
