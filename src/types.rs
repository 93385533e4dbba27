//! Core identifiers and shared types used throughout dealbook

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;

fn random_suffix() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Unique identifier for negotiation deals (timestamp-based)
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DealId(pub String);

impl DealId {
    /// Generate a new unique deal ID with timestamp and random suffix
    pub fn generate() -> Self {
        Self(format!(
            "deal_{}_{}",
            Utc::now().timestamp_millis(),
            random_suffix()
        ))
    }
}

impl fmt::Display for DealId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for finalized transaction records
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub String);

impl TransactionId {
    /// Generate a new unique transaction ID with timestamp and random suffix
    pub fn generate() -> Self {
        Self(format!(
            "txn_{}_{}",
            Utc::now().timestamp_millis(),
            random_suffix()
        ))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a property listing, issued by the listing collaborator
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingId(pub String);

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for an acting party (buyer, agent, broker), issued by the
/// identity collaborator
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub String);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of a deal an actor stands on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PartySide {
    /// The offering buyer
    Buyer,
    /// The listing-owning party: agent or broker responsible for the listing
    Seller,
}

/// Property type of a listing
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyKind {
    Land,
    House,
    Condo,
    Commercial,
}

/// Snapshot of a property listing as returned by the listing collaborator.
///
/// Monetary values are minor-unit integers. A listing without a published
/// price (`list_price = None`) can still be negotiated at a preferred amount.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub list_price: Option<i64>,
    pub kind: PropertyKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deal_id_generation() {
        let id1 = DealId::generate();
        let id2 = DealId::generate();

        assert!(id1.0.starts_with("deal_"));
        // Random suffix keeps same-millisecond IDs distinct
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_transaction_id_generation() {
        let id = TransactionId::generate();
        assert!(id.0.starts_with("txn_"));
    }

    #[test]
    fn test_serialization() {
        let id = DealId::generate();
        let serialized = serde_json::to_string(&id).unwrap();
        let deserialized: DealId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(id, deserialized);

        let listing = Listing {
            id: ListingId("lst_1".to_string()),
            list_price: Some(3_000_000),
            kind: PropertyKind::House,
        };
        let serialized = serde_json::to_string(&listing).unwrap();
        let deserialized: Listing = serde_json::from_str(&serialized).unwrap();
        assert_eq!(listing, deserialized);
    }

    #[test]
    fn test_party_side_roundtrip() {
        let side = PartySide::Seller;
        let serialized = serde_json::to_string(&side).unwrap();
        let deserialized: PartySide = serde_json::from_str(&serialized).unwrap();
        assert_eq!(side, deserialized);
    }
}
