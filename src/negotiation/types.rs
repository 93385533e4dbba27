//! Deal types and offer state machine

use crate::types::{ActorId, DealId, ListingId, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the proposed amount was chosen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferMode {
    /// Amount pinned to the listing's published price at proposal time
    ListPrice,
    /// Amount freely chosen by the proposer
    Preferred,
}

/// Deal lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DealStatus {
    /// Live proposal awaiting the counterpart's response
    Pending,
    /// Counterpart accepted the current proposal (terminal, spawns a transaction)
    Accepted,
    /// Counterpart declined the current proposal (terminal)
    Declined,
    /// Current proposer withdrew their own offer (terminal)
    Cancelled,
}

impl DealStatus {
    /// Check if the deal is in a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DealStatus::Pending)
    }
}

/// A negotiation thread over one listing between a buyer and the
/// listing's responsible party.
///
/// `last_updated_by` always names whoever proposed the current `amount`;
/// the turn-taking guards key off it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deal {
    pub id: DealId,
    pub listing_id: ListingId,
    pub buyer_id: ActorId,
    pub amount: i64,
    pub offer_mode: OfferMode,
    pub status: DealStatus,
    pub notes: Option<String>,
    pub decline_reason: Option<String>,
    pub last_updated_by: ActorId,
    pub last_updated_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// 1:1 linkage to the transaction spawned on acceptance
    pub transaction_id: Option<TransactionId>,
}

impl Deal {
    /// Create a freshly submitted deal: pending, with the buyer holding
    /// the current proposal.
    pub fn submitted(
        listing_id: ListingId,
        buyer_id: ActorId,
        amount: i64,
        offer_mode: OfferMode,
        notes: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: DealId::generate(),
            listing_id,
            buyer_id: buyer_id.clone(),
            amount,
            offer_mode,
            status: DealStatus::Pending,
            notes,
            decline_reason: None,
            last_updated_by: buyer_id,
            last_updated_at: now,
            created_at: now,
            transaction_id: None,
        }
    }

    /// Check if the deal is still open for proposals
    pub fn is_pending(&self) -> bool {
        self.status == DealStatus::Pending
    }

    /// Check if `actor` holds the current proposal
    pub fn is_current_proposer(&self, actor: &ActorId) -> bool {
        &self.last_updated_by == actor
    }
}
