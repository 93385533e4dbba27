//! Dealbook application integrating all components
//!
//! `DealbookApp` is the request/response surface the surrounding web layer
//! calls: every method is one operation, returning the updated record or an
//! error carrying its natural HTTP mapping (`DealbookError::http_status`).

use crate::directory::{ActorDirectory, ListingDirectory};
use crate::error::{DealbookError, Result};
use crate::events::{Notification, Outbox};
use crate::negotiation::{Deal, DealStatus, NegotiationEngine, OfferMode};
use crate::settlement::{
    Transaction, TransactionDraft, TransactionFinalizer, TransactionStatus,
};
use crate::types::{ActorId, DealId, ListingId, TransactionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Result of accepting a deal: the terminal deal plus its draft transaction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AcceptOutcome {
    pub deal: Deal,
    pub transaction: Transaction,
}

/// Main dealbook application
#[derive(Clone)]
pub struct DealbookApp {
    listings: Arc<dyn ListingDirectory>,
    negotiation: Arc<NegotiationEngine>,
    finalizer: Arc<TransactionFinalizer>,
    outbox: Arc<Outbox>,
}

impl DealbookApp {
    /// Create a new dealbook application over the given collaborators
    pub fn new(listings: Arc<dyn ListingDirectory>, actors: Arc<dyn ActorDirectory>) -> Self {
        let outbox = Arc::new(Outbox::new());
        let negotiation = Arc::new(NegotiationEngine::new(
            listings.clone(),
            actors,
            outbox.clone(),
        ));
        let finalizer = Arc::new(TransactionFinalizer::new(outbox.clone()));

        Self {
            listings,
            negotiation,
            finalizer,
            outbox,
        }
    }

    /// Get the negotiation engine
    pub fn negotiation(&self) -> Arc<NegotiationEngine> {
        self.negotiation.clone()
    }

    /// Get the transaction finalizer
    pub fn finalizer(&self) -> Arc<TransactionFinalizer> {
        self.finalizer.clone()
    }

    /// Submit a buyer's initial offer on a listing
    pub async fn submit_offer(
        &self,
        listing_id: &ListingId,
        buyer_id: &ActorId,
        offer_mode: OfferMode,
        amount: Option<i64>,
        notes: Option<String>,
    ) -> Result<Deal> {
        self.negotiation
            .submit_offer(listing_id, buyer_id, offer_mode, amount, notes)
    }

    /// Counter the live proposal from the other side
    pub async fn counter_offer(
        &self,
        deal_id: &DealId,
        actor_id: &ActorId,
        offer_mode: OfferMode,
        amount: Option<i64>,
        notes: Option<String>,
    ) -> Result<Deal> {
        self.negotiation
            .counter_offer(deal_id, actor_id, offer_mode, amount, notes)
    }

    /// Accept the live proposal and open the draft transaction.
    ///
    /// Acceptance is the sole trigger for transaction creation: the deal
    /// goes terminal, the finalizer opens the draft seeded from the listing,
    /// and the deal records the 1:1 linkage.
    pub async fn accept(&self, deal_id: &DealId, actor_id: &ActorId) -> Result<AcceptOutcome> {
        let deal = self.negotiation.accept(deal_id, actor_id)?;

        let listing = self.listings.listing(&deal.listing_id)?;
        let transaction = self.finalizer.open_from_deal(&deal, &listing)?;
        let deal = self.negotiation.link_transaction(deal_id, &transaction.id)?;

        Ok(AcceptOutcome { deal, transaction })
    }

    /// Decline the live proposal with a reason
    pub async fn decline(
        &self,
        deal_id: &DealId,
        actor_id: &ActorId,
        reason: &str,
    ) -> Result<Deal> {
        self.negotiation.decline(deal_id, actor_id, reason)
    }

    /// Withdraw one's own live proposal
    pub async fn cancel(&self, deal_id: &DealId, actor_id: &ActorId) -> Result<Deal> {
        self.negotiation.cancel(deal_id, actor_id)
    }

    /// Edit and recompute the transaction belonging to an accepted deal.
    ///
    /// Fails with a lookup error when the deal does not exist, is not
    /// accepted, or has no transaction yet.
    pub async fn finalize_transaction(
        &self,
        deal_id: &DealId,
        draft: TransactionDraft,
    ) -> Result<Transaction> {
        let deal = self.negotiation.deal(deal_id)?;
        if deal.status != DealStatus::Accepted {
            return Err(DealbookError::DealNotAccepted(deal_id.0.clone()));
        }
        let transaction = self
            .finalizer
            .transaction_for_deal(deal_id)
            .ok_or_else(|| DealbookError::TransactionNotFound(deal_id.0.clone()))?;

        self.finalizer.save(&transaction.id, draft)
    }

    /// Edit a transaction's field snapshot directly
    pub async fn save_transaction(
        &self,
        transaction_id: &TransactionId,
        draft: TransactionDraft,
    ) -> Result<Transaction> {
        self.finalizer.save(transaction_id, draft)
    }

    /// Move a transaction to a chosen lifecycle status
    pub async fn set_transaction_status(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        cancel_reason: Option<&str>,
    ) -> Result<Transaction> {
        self.finalizer
            .set_status(transaction_id, status, cancel_reason)
    }

    /// Get a deal snapshot
    pub async fn deal(&self, deal_id: &DealId) -> Result<Deal> {
        self.negotiation.deal(deal_id)
    }

    /// Get a transaction snapshot
    pub async fn transaction(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        self.finalizer.transaction(transaction_id)
    }

    /// Drain the notifications emitted since the last drain, for the
    /// surrounding application to dispatch
    pub fn take_notifications(&self) -> Vec<Notification> {
        self.outbox.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryDirectory;
    use crate::settlement::PricingMode;
    use crate::types::PropertyKind;

    fn app() -> DealbookApp {
        let directory = Arc::new(InMemoryDirectory::new());
        directory.add_listing("lst_1", Some(3_000_000), PropertyKind::House, &["agent_1"]);
        directory.add_listing("lst_2", None, PropertyKind::Land, &["agent_1"]);
        DealbookApp::new(directory.clone(), directory)
    }

    fn buyer() -> ActorId {
        ActorId("buyer_1".to_string())
    }

    fn agent() -> ActorId {
        ActorId("agent_1".to_string())
    }

    #[tokio::test]
    async fn test_full_negotiation_and_finalization_flow() {
        let app = app();
        let listing_id = ListingId("lst_1".to_string());

        // Buyer opens below list price
        let deal = app
            .submit_offer(
                &listing_id,
                &buyer(),
                OfferMode::Preferred,
                Some(2_500_000),
                Some("initial offer".to_string()),
            )
            .await
            .unwrap();

        // Agent accepts; draft transaction is seeded from the listing
        let outcome = app.accept(&deal.id, &agent()).await.unwrap();
        assert_eq!(outcome.deal.status, DealStatus::Accepted);
        assert_eq!(outcome.deal.transaction_id, Some(outcome.transaction.id.clone()));
        assert_eq!(outcome.transaction.base_price, 3_000_000);
        assert_eq!(outcome.transaction.discount_amount, 500_000);
        assert_eq!(outcome.transaction.tcp, 2_500_000);

        // Responsible party enters the paperwork figures
        let txn = app
            .finalize_transaction(
                &deal.id,
                TransactionDraft {
                    reservation_amount: Some(50_000),
                    downpayment_amount: Some(200_000),
                    pricing_mode: Some(PricingMode::Full),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(txn.balance_amount, 2_250_000);

        // And walks it through to sale
        let txn = app
            .set_transaction_status(&txn.id, TransactionStatus::Reserved, None)
            .await
            .unwrap();
        let txn = app
            .set_transaction_status(&txn.id, TransactionStatus::Sold, None)
            .await
            .unwrap();
        assert!(txn.reserved_at.is_some());
        assert!(txn.closed_at.is_some());

        // Every transition emitted exactly one notification
        let events = app.take_notifications();
        assert_eq!(events.len(), 6);
    }

    #[tokio::test]
    async fn test_accept_is_turn_guarded_end_to_end() {
        let app = app();
        let listing_id = ListingId("lst_1".to_string());

        let deal = app
            .submit_offer(&listing_id, &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .await
            .unwrap();

        let err = app.accept(&deal.id, &buyer()).await.unwrap_err();
        assert_eq!(err.http_status(), 409);

        let outcome = app.accept(&deal.id, &agent()).await.unwrap();
        assert_eq!(outcome.deal.status, DealStatus::Accepted);
    }

    #[tokio::test]
    async fn test_finalize_requires_accepted_deal() {
        let app = app();
        let listing_id = ListingId("lst_1".to_string());

        let deal = app
            .submit_offer(&listing_id, &buyer(), OfferMode::Preferred, Some(2_500_000), None)
            .await
            .unwrap();

        let err = app
            .finalize_transaction(&deal.id, TransactionDraft::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DealbookError::DealNotAccepted(_)));
        assert_eq!(err.http_status(), 404);
    }

    #[tokio::test]
    async fn test_unpriced_land_listing_seeds_from_accepted_amount() {
        let app = app();
        let listing_id = ListingId("lst_2".to_string());

        let deal = app
            .submit_offer(&listing_id, &buyer(), OfferMode::Preferred, Some(800_000), None)
            .await
            .unwrap();
        let outcome = app.accept(&deal.id, &agent()).await.unwrap();

        assert_eq!(outcome.transaction.base_price, 800_000);
        assert_eq!(outcome.transaction.discount_amount, 0);
        assert_eq!(outcome.transaction.pricing_mode, PricingMode::Simple);
    }
}
