//! Negotiation engine: owns every deal row and its offer state machine

use crate::directory::{ActorDirectory, ListingDirectory};
use crate::error::{DealbookError, Result};
use crate::events::{Notification, Outbox};
use crate::store::{Store, Versioned};
use crate::types::{ActorId, DealId, Listing, ListingId, PartySide, TransactionId};
use chrono::Utc;
use std::sync::Arc;

use super::types::{Deal, DealStatus, OfferMode};

/// Negotiation engine: validates and applies every offer transition.
///
/// Each operation is one read-validate-swap against the deal store; guards
/// are evaluated against the freshly read row, and the swap fails with a
/// conflict when a concurrent mutation landed first.
pub struct NegotiationEngine {
    deals: Store<DealId, Deal>,
    listings: Arc<dyn ListingDirectory>,
    actors: Arc<dyn ActorDirectory>,
    outbox: Arc<Outbox>,
}

impl NegotiationEngine {
    pub fn new(
        listings: Arc<dyn ListingDirectory>,
        actors: Arc<dyn ActorDirectory>,
        outbox: Arc<Outbox>,
    ) -> Self {
        Self {
            deals: Store::new(),
            listings,
            actors,
            outbox,
        }
    }

    /// Open a new deal with the buyer's initial offer
    pub fn submit_offer(
        &self,
        listing_id: &ListingId,
        buyer_id: &ActorId,
        offer_mode: OfferMode,
        amount: Option<i64>,
        notes: Option<String>,
    ) -> Result<Deal> {
        let listing = self.listings.listing(listing_id)?;

        match self.actors.side_of(listing_id, buyer_id) {
            Some(PartySide::Buyer) => {}
            _ => {
                return Err(DealbookError::UnknownParty {
                    actor: buyer_id.0.clone(),
                    listing: listing_id.0.clone(),
                })
            }
        }

        let amount = resolve_proposal_amount(&listing, offer_mode, amount)?;

        let deal = Deal::submitted(
            listing_id.clone(),
            buyer_id.clone(),
            amount,
            offer_mode,
            notes,
        );
        self.deals.insert(deal.id.clone(), deal.clone())?;

        self.outbox.push(Notification::OfferSubmitted {
            deal_id: deal.id.clone(),
            listing_id: listing_id.clone(),
            buyer_id: buyer_id.clone(),
            amount,
        });
        tracing::info!("Offer submitted on {} by {}: {}", listing_id, buyer_id, amount);

        Ok(deal)
    }

    /// Re-propose a new amount from the other side of the table.
    ///
    /// The party holding the current proposal cannot counter their own
    /// offer; the counterpart must respond first.
    pub fn counter_offer(
        &self,
        deal_id: &DealId,
        actor_id: &ActorId,
        offer_mode: OfferMode,
        amount: Option<i64>,
        notes: Option<String>,
    ) -> Result<Deal> {
        let Versioned {
            row: mut deal,
            revision,
        } = self.load(deal_id)?;

        self.ensure_pending(&deal, "counter-offer")?;
        self.authorize_party(&deal, actor_id)?;

        if deal.is_current_proposer(actor_id) {
            return Err(DealbookError::TurnViolation(format!(
                "{actor_id} already holds the current proposal"
            )));
        }

        // ListPrice proposals reload the listing's price as of now; any
        // typed amount is discarded.
        let listing = self.listings.listing(&deal.listing_id)?;
        let amount = resolve_proposal_amount(&listing, offer_mode, amount)?;

        deal.amount = amount;
        deal.offer_mode = offer_mode;
        if notes.is_some() {
            deal.notes = notes;
        }
        deal.last_updated_by = actor_id.clone();
        deal.last_updated_at = Utc::now();

        let deal = self.deals.compare_and_swap(deal_id, revision, deal)?.row;

        self.outbox.push(Notification::OfferCountered {
            deal_id: deal_id.clone(),
            actor_id: actor_id.clone(),
            amount,
        });
        tracing::info!("Counter-offer on {} by {}: {}", deal_id, actor_id, amount);

        Ok(deal)
    }

    /// Accept the counterpart's live proposal.
    ///
    /// Only the party who did not make the last proposal may accept it.
    /// Acceptance is terminal for the negotiation; the caller hands the
    /// deal to the transaction finalizer.
    pub fn accept(&self, deal_id: &DealId, actor_id: &ActorId) -> Result<Deal> {
        let Versioned {
            row: mut deal,
            revision,
        } = self.load(deal_id)?;

        self.ensure_pending(&deal, "accept")?;
        self.authorize_party(&deal, actor_id)?;
        self.ensure_counterpart_turn(&deal, actor_id)?;

        deal.status = DealStatus::Accepted;
        deal.last_updated_at = Utc::now();

        let deal = self.deals.compare_and_swap(deal_id, revision, deal)?.row;

        self.outbox.push(Notification::DealAccepted {
            deal_id: deal_id.clone(),
            actor_id: actor_id.clone(),
            amount: deal.amount,
        });
        tracing::info!("Deal {} accepted by {} at {}", deal_id, actor_id, deal.amount);

        Ok(deal)
    }

    /// Decline the counterpart's live proposal, with a required reason
    pub fn decline(&self, deal_id: &DealId, actor_id: &ActorId, reason: &str) -> Result<Deal> {
        if reason.trim().is_empty() {
            return Err(DealbookError::MissingReason(
                "declining an offer requires an explanatory reason".to_string(),
            ));
        }

        let Versioned {
            row: mut deal,
            revision,
        } = self.load(deal_id)?;

        self.ensure_pending(&deal, "decline")?;
        self.authorize_party(&deal, actor_id)?;
        self.ensure_counterpart_turn(&deal, actor_id)?;

        deal.status = DealStatus::Declined;
        deal.decline_reason = Some(reason.trim().to_string());
        deal.last_updated_at = Utc::now();

        let deal = self.deals.compare_and_swap(deal_id, revision, deal)?.row;

        self.outbox.push(Notification::DealDeclined {
            deal_id: deal_id.clone(),
            actor_id: actor_id.clone(),
            reason: reason.trim().to_string(),
        });
        tracing::info!("Deal {} declined by {}", deal_id, actor_id);

        Ok(deal)
    }

    /// Withdraw one's own live proposal.
    ///
    /// Only the current proposer may cancel; the counterpart's remedy is
    /// to decline instead.
    pub fn cancel(&self, deal_id: &DealId, actor_id: &ActorId) -> Result<Deal> {
        let Versioned {
            row: mut deal,
            revision,
        } = self.load(deal_id)?;

        self.ensure_pending(&deal, "cancel")?;
        self.authorize_party(&deal, actor_id)?;

        if !deal.is_current_proposer(actor_id) {
            return Err(DealbookError::TurnViolation(format!(
                "{actor_id} does not hold the current proposal"
            )));
        }

        deal.status = DealStatus::Cancelled;
        deal.last_updated_at = Utc::now();

        let deal = self.deals.compare_and_swap(deal_id, revision, deal)?.row;

        self.outbox.push(Notification::DealCancelled {
            deal_id: deal_id.clone(),
            actor_id: actor_id.clone(),
        });
        tracing::info!("Deal {} cancelled by {}", deal_id, actor_id);

        Ok(deal)
    }

    /// Record the 1:1 transaction linkage on an accepted deal, exactly once
    pub fn link_transaction(
        &self,
        deal_id: &DealId,
        transaction_id: &TransactionId,
    ) -> Result<Deal> {
        let Versioned {
            row: mut deal,
            revision,
        } = self.load(deal_id)?;

        if deal.status != DealStatus::Accepted {
            return Err(DealbookError::InvalidTransition(format!(
                "deal {deal_id} is not accepted"
            )));
        }
        if deal.transaction_id.is_some() {
            return Err(DealbookError::InvalidTransition(format!(
                "deal {deal_id} is already linked to a transaction"
            )));
        }

        deal.transaction_id = Some(transaction_id.clone());
        let deal = self.deals.compare_and_swap(deal_id, revision, deal)?.row;

        Ok(deal)
    }

    /// Get a deal snapshot
    pub fn deal(&self, deal_id: &DealId) -> Result<Deal> {
        Ok(self.load(deal_id)?.row)
    }

    /// All deals negotiated over a listing
    pub fn deals_for_listing(&self, listing_id: &ListingId) -> Vec<Deal> {
        self.deals.filter(|deal| &deal.listing_id == listing_id)
    }

    /// Snapshot every deal row (persistence export)
    pub fn all_deals(&self) -> Vec<Deal> {
        self.deals.filter(|_| true)
    }

    /// Load a previously persisted deal row
    pub fn restore(&self, deal: Deal) -> Result<()> {
        self.deals.insert(deal.id.clone(), deal)?;
        Ok(())
    }

    fn load(&self, deal_id: &DealId) -> Result<Versioned<Deal>> {
        self.deals
            .get(deal_id)
            .ok_or_else(|| DealbookError::DealNotFound(deal_id.0.clone()))
    }

    fn ensure_pending(&self, deal: &Deal, operation: &str) -> Result<()> {
        if !deal.is_pending() {
            return Err(DealbookError::InvalidTransition(format!(
                "cannot {operation} deal {} in status {:?}",
                deal.id, deal.status
            )));
        }
        Ok(())
    }

    /// The actor must be a party to this deal: its buyer, or an actor on
    /// the listing's selling side. Strangers are rejected before any turn
    /// state is revealed.
    fn authorize_party(&self, deal: &Deal, actor_id: &ActorId) -> Result<PartySide> {
        if actor_id == &deal.buyer_id {
            return Ok(PartySide::Buyer);
        }
        match self.actors.side_of(&deal.listing_id, actor_id) {
            Some(PartySide::Seller) => Ok(PartySide::Seller),
            _ => Err(DealbookError::UnknownParty {
                actor: actor_id.0.clone(),
                listing: deal.listing_id.0.clone(),
            }),
        }
    }

    fn ensure_counterpart_turn(&self, deal: &Deal, actor_id: &ActorId) -> Result<()> {
        if deal.is_current_proposer(actor_id) {
            return Err(DealbookError::TurnViolation(format!(
                "{actor_id} cannot respond to their own proposal"
            )));
        }
        Ok(())
    }
}

/// Resolve the amount of a proposal under the offer-amount policy:
/// `ListPrice` pins to the listing's current price, `Preferred` requires a
/// positive caller-chosen amount.
fn resolve_proposal_amount(
    listing: &Listing,
    offer_mode: OfferMode,
    amount: Option<i64>,
) -> Result<i64> {
    match offer_mode {
        OfferMode::ListPrice => listing
            .list_price
            .ok_or_else(|| DealbookError::InvalidAmount(0)),
        OfferMode::Preferred => match amount {
            Some(value) if value > 0 => Ok(value),
            Some(value) => Err(DealbookError::InvalidAmount(value)),
            None => Err(DealbookError::InvalidAmount(0)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::types::PropertyKind;

    fn engine() -> (NegotiationEngine, Arc<Outbox>) {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_listing("lst_1", Some(3_000_000), PropertyKind::House, &["agent_1"]);
        directory.add_listing("lst_np", None, PropertyKind::Land, &["agent_1"]);
        let outbox = Arc::new(Outbox::new());
        (
            NegotiationEngine::new(directory.clone(), directory, outbox.clone()),
            outbox,
        )
    }

    fn buyer() -> ActorId {
        ActorId("buyer_1".to_string())
    }

    fn agent() -> ActorId {
        ActorId("agent_1".to_string())
    }

    fn listing() -> ListingId {
        ListingId("lst_1".to_string())
    }

    #[test]
    fn test_submit_preferred_offer() {
        let (engine, outbox) = engine();

        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        assert_eq!(deal.status, DealStatus::Pending);
        assert_eq!(deal.amount, 2_500_000);
        assert_eq!(deal.last_updated_by, buyer());

        let events = outbox.take();
        assert!(matches!(
            events.as_slice(),
            [Notification::OfferSubmitted { amount: 2_500_000, .. }]
        ));
    }

    #[test]
    fn test_submit_list_price_pins_amount() {
        let (engine, _) = engine();

        // Typed amount is discarded in list-price mode
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::ListPrice, Some(1), None)
            .unwrap();
        assert_eq!(deal.amount, 3_000_000);
        assert_eq!(deal.offer_mode, OfferMode::ListPrice);
    }

    #[test]
    fn test_submit_list_price_without_published_price() {
        let (engine, _) = engine();
        let result = engine.submit_offer(
            &ListingId("lst_np".to_string()),
            &buyer(),
            OfferMode::ListPrice,
            None,
            None,
        );
        assert!(matches!(result.unwrap_err(), DealbookError::InvalidAmount(_)));
    }

    #[test]
    fn test_submit_non_positive_amount() {
        let (engine, _) = engine();
        let result =
            engine.submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(0), None);
        assert!(matches!(result.unwrap_err(), DealbookError::InvalidAmount(0)));
    }

    #[test]
    fn test_submit_on_unknown_listing() {
        let (engine, _) = engine();
        let result = engine.submit_offer(
            &ListingId("lst_x".to_string()),
            &buyer(),
            OfferMode::Preferred,
            Some(100),
            None,
        );
        assert!(matches!(
            result.unwrap_err(),
            DealbookError::ListingNotFound(_)
        ));
    }

    #[test]
    fn test_selling_party_cannot_open_offer() {
        let (engine, _) = engine();
        let result =
            engine.submit_offer(&listing(), &agent(), OfferMode::Preferred, Some(100), None);
        assert!(matches!(result.unwrap_err(), DealbookError::UnknownParty { .. }));
    }

    #[test]
    fn test_proposer_cannot_accept_own_offer() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        let result = engine.accept(&deal.id, &buyer());
        assert!(matches!(result.unwrap_err(), DealbookError::TurnViolation(_)));
    }

    #[test]
    fn test_counterpart_accepts() {
        let (engine, outbox) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();
        outbox.take();

        let accepted = engine.accept(&deal.id, &agent()).unwrap();
        assert_eq!(accepted.status, DealStatus::Accepted);
        assert_eq!(accepted.amount, 2_500_000);

        let events = outbox.take();
        assert!(matches!(
            events.as_slice(),
            [Notification::DealAccepted { amount: 2_500_000, .. }]
        ));
    }

    #[test]
    fn test_counter_offer_turn_taking() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        // Buyer holds the proposal; buyer cannot counter again
        let result =
            engine.counter_offer(&deal.id, &buyer(), OfferMode::Preferred, Some(2_600_000), None);
        assert!(matches!(result.unwrap_err(), DealbookError::TurnViolation(_)));

        // Agent counters to 2.8M, buyer counters back, and the agent may
        // then accept since the buyer is the last proposer again
        let deal = engine
            .counter_offer(&deal.id, &agent(), OfferMode::Preferred, Some(2_800_000), None)
            .unwrap();
        assert_eq!(deal.amount, 2_800_000);
        assert_eq!(deal.last_updated_by, agent());
        assert_eq!(deal.status, DealStatus::Pending);

        let deal = engine
            .counter_offer(&deal.id, &buyer(), OfferMode::Preferred, Some(2_650_000), None)
            .unwrap();
        assert_eq!(deal.last_updated_by, buyer());

        let accepted = engine.accept(&deal.id, &agent()).unwrap();
        assert_eq!(accepted.status, DealStatus::Accepted);
        assert_eq!(accepted.amount, 2_650_000);
    }

    #[test]
    fn test_counter_switch_to_list_price_reloads_listing() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_listing("lst_1", Some(3_000_000), PropertyKind::House, &["agent_1"]);
        let engine = NegotiationEngine::new(
            directory.clone(),
            directory.clone(),
            Arc::new(Outbox::new()),
        );

        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        // Listing is repriced mid-negotiation; a list-price counter pins
        // to the price as of proposal time
        directory.set_list_price("lst_1", Some(2_900_000));
        let deal = engine
            .counter_offer(&deal.id, &agent(), OfferMode::ListPrice, Some(1), None)
            .unwrap();

        assert_eq!(deal.amount, 2_900_000);
        assert_eq!(deal.offer_mode, OfferMode::ListPrice);
    }

    #[test]
    fn test_decline_requires_reason() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        let result = engine.decline(&deal.id, &agent(), "   ");
        assert!(matches!(result.unwrap_err(), DealbookError::MissingReason(_)));

        let declined = engine.decline(&deal.id, &agent(), "priced too low").unwrap();
        assert_eq!(declined.status, DealStatus::Declined);
        assert_eq!(declined.decline_reason.as_deref(), Some("priced too low"));

        // Terminal: no further proposals
        let result =
            engine.counter_offer(&deal.id, &buyer(), OfferMode::Preferred, Some(2_700_000), None);
        assert!(matches!(
            result.unwrap_err(),
            DealbookError::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_cancel_is_proposer_only() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        // The counterpart cannot withdraw an offer they do not hold
        let result = engine.cancel(&deal.id, &agent());
        assert!(matches!(result.unwrap_err(), DealbookError::TurnViolation(_)));

        let cancelled = engine.cancel(&deal.id, &buyer()).unwrap();
        assert_eq!(cancelled.status, DealStatus::Cancelled);

        let result = engine.accept(&deal.id, &agent());
        assert!(matches!(
            result.unwrap_err(),
            DealbookError::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_stranger_is_rejected() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        // Another would-be buyer is not a party to this deal
        let result = engine.accept(&deal.id, &ActorId("buyer_2".to_string()));
        assert!(matches!(result.unwrap_err(), DealbookError::UnknownParty { .. }));
    }

    #[test]
    fn test_link_transaction_once() {
        let (engine, _) = engine();
        let deal = engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();

        let txn_id = TransactionId("txn_1".to_string());
        let result = engine.link_transaction(&deal.id, &txn_id);
        assert!(matches!(
            result.unwrap_err(),
            DealbookError::InvalidTransition(_)
        ));

        engine.accept(&deal.id, &agent()).unwrap();
        let linked = engine.link_transaction(&deal.id, &txn_id).unwrap();
        assert_eq!(linked.transaction_id, Some(txn_id.clone()));

        let result = engine.link_transaction(&deal.id, &TransactionId("txn_2".to_string()));
        assert!(matches!(
            result.unwrap_err(),
            DealbookError::InvalidTransition(_)
        ));
    }

    #[test]
    fn test_deals_for_listing() {
        let (engine, _) = engine();
        engine
            .submit_offer(&listing(), &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .unwrap();
        engine
            .submit_offer(
                &listing(),
                &ActorId("buyer_2".to_string()),
                OfferMode::ListPrice,
                None,
                None,
            )
            .unwrap();

        assert_eq!(engine.deals_for_listing(&listing()).len(), 2);
        assert!(engine
            .deals_for_listing(&ListingId("lst_np".to_string()))
            .is_empty());
    }
}
