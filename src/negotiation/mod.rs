//! Negotiation module: offer/counter-offer exchange over a listing

pub mod engine;
pub mod types;

pub use engine::NegotiationEngine;
pub use types::{Deal, DealStatus, OfferMode};
