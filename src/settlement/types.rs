//! Transaction types and post-acceptance lifecycle

use crate::error::{DealbookError, Result};
use crate::negotiation::Deal;
use crate::types::{ActorId, DealId, Listing, ListingId, PropertyKind, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pricing;

/// Which pricing formula applies
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingMode {
    /// Base less discount; fees are not itemized
    Simple,
    /// Base less discount plus fees, with reservation/downpayment tracking
    Full,
}

/// How the buyer finances the purchase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Financing {
    Cash,
    Bank,
    InHouse,
    Other,
}

/// Transaction lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Draft,
    Reserved,
    Booked,
    Sold,
    Cancelled,
    Expired,
    Refunded,
}

impl TransactionStatus {
    /// Check if the transaction accepts no further transitions or edits
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TransactionStatus::Sold
                | TransactionStatus::Cancelled
                | TransactionStatus::Expired
                | TransactionStatus::Refunded
        )
    }
}

/// The binding contractual record created once a deal is accepted.
///
/// `tcp` and `balance_amount` are derived; they are recomputed from the
/// other monetary fields on every mutation and never written directly.
/// Status timestamps are an append-only audit trail: each is stamped the
/// first time its status is entered and never cleared.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub deal_id: DealId,
    pub property_id: ListingId,
    pub buyer_id: ActorId,
    pub primary_agent_id: Option<ActorId>,
    pub status: TransactionStatus,
    pub base_price: i64,
    pub discount_amount: i64,
    pub fees_amount: i64,
    pub pricing_mode: PricingMode,
    pub tcp: i64,
    pub reservation_amount: i64,
    pub downpayment_amount: i64,
    pub balance_amount: i64,
    pub financing: Financing,
    pub mode_of_payment: Option<String>,
    pub reference_no: Option<String>,
    pub remarks: Option<String>,
    pub reserved_at: Option<DateTime<Utc>>,
    pub booked_at: Option<DateTime<Utc>>,
    pub closed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancel_reason: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Open a draft transaction from an accepted deal.
    ///
    /// Pricing is seeded from the listing: base price from the published
    /// price (falling back to the accepted amount), discount as the gap the
    /// negotiation implied, and `Simple` mode pre-selected for land.
    pub fn opened(deal: &Deal, listing: &Listing) -> Self {
        let base_price = listing.list_price.unwrap_or(deal.amount);
        let discount_amount = pricing::implied_discount(listing.list_price, deal.amount);
        let pricing_mode = match listing.kind {
            PropertyKind::Land => PricingMode::Simple,
            _ => PricingMode::Full,
        };

        let now = Utc::now();
        let mut txn = Self {
            id: TransactionId::generate(),
            deal_id: deal.id.clone(),
            property_id: listing.id.clone(),
            buyer_id: deal.buyer_id.clone(),
            primary_agent_id: None,
            status: TransactionStatus::Draft,
            base_price,
            discount_amount,
            fees_amount: 0,
            pricing_mode,
            tcp: 0,
            reservation_amount: 0,
            downpayment_amount: 0,
            balance_amount: 0,
            financing: Financing::Cash,
            mode_of_payment: None,
            reference_no: None,
            remarks: None,
            reserved_at: None,
            booked_at: None,
            closed_at: None,
            cancelled_at: None,
            cancel_reason: None,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        txn.recompute();
        txn
    }

    /// Recompute the derived figures from the current field values
    pub fn recompute(&mut self) {
        self.tcp = pricing::total_contract_price(
            self.pricing_mode,
            self.base_price,
            self.discount_amount,
            self.fees_amount,
        );
        self.balance_amount =
            pricing::balance_due(self.tcp, self.reservation_amount, self.downpayment_amount);
    }

    /// Reject any monetary input below zero
    pub fn validate_monetary(&self) -> Result<()> {
        for (field, value) in [
            ("base_price", self.base_price),
            ("discount_amount", self.discount_amount),
            ("fees_amount", self.fees_amount),
            ("reservation_amount", self.reservation_amount),
            ("downpayment_amount", self.downpayment_amount),
        ] {
            if value < 0 {
                return Err(DealbookError::NegativeMonetaryField { field, value });
            }
        }
        Ok(())
    }

    /// Stamp the timestamp for a newly entered status, write-once
    pub fn stamp_status(&mut self, status: TransactionStatus, now: DateTime<Utc>) {
        let slot = match status {
            TransactionStatus::Reserved => &mut self.reserved_at,
            TransactionStatus::Booked => &mut self.booked_at,
            TransactionStatus::Sold => &mut self.closed_at,
            TransactionStatus::Cancelled => &mut self.cancelled_at,
            _ => return,
        };
        if slot.is_none() {
            *slot = Some(now);
        }
    }
}

/// Field patch applied by `save`: only the supplied fields change
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TransactionDraft {
    pub base_price: Option<i64>,
    pub discount_amount: Option<i64>,
    pub fees_amount: Option<i64>,
    pub pricing_mode: Option<PricingMode>,
    pub reservation_amount: Option<i64>,
    pub downpayment_amount: Option<i64>,
    pub financing: Option<Financing>,
    pub mode_of_payment: Option<String>,
    pub reference_no: Option<String>,
    pub remarks: Option<String>,
    pub primary_agent_id: Option<ActorId>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl TransactionDraft {
    /// Apply the patch; the caller re-validates and recomputes afterwards.
    ///
    /// Switching pricing mode deliberately leaves every entered field in
    /// place; fields are only zeroed when the caller sends a zero.
    pub fn apply(self, txn: &mut Transaction) {
        if let Some(value) = self.base_price {
            txn.base_price = value;
        }
        if let Some(value) = self.discount_amount {
            txn.discount_amount = value;
        }
        if let Some(value) = self.fees_amount {
            txn.fees_amount = value;
        }
        if let Some(mode) = self.pricing_mode {
            txn.pricing_mode = mode;
        }
        if let Some(value) = self.reservation_amount {
            txn.reservation_amount = value;
        }
        if let Some(value) = self.downpayment_amount {
            txn.downpayment_amount = value;
        }
        if let Some(financing) = self.financing {
            txn.financing = financing;
        }
        if self.mode_of_payment.is_some() {
            txn.mode_of_payment = self.mode_of_payment;
        }
        if self.reference_no.is_some() {
            txn.reference_no = self.reference_no;
        }
        if self.remarks.is_some() {
            txn.remarks = self.remarks;
        }
        if self.primary_agent_id.is_some() {
            txn.primary_agent_id = self.primary_agent_id;
        }
        if self.expires_at.is_some() {
            txn.expires_at = self.expires_at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::negotiation::OfferMode;

    fn accepted_deal(amount: i64) -> Deal {
        let mut deal = Deal::submitted(
            ListingId("lst_1".to_string()),
            ActorId("buyer_1".to_string()),
            amount,
            OfferMode::Preferred,
            None,
        );
        deal.status = crate::negotiation::DealStatus::Accepted;
        deal
    }

    fn listing(list_price: Option<i64>, kind: PropertyKind) -> Listing {
        Listing {
            id: ListingId("lst_1".to_string()),
            list_price,
            kind,
        }
    }

    #[test]
    fn test_opened_seeds_from_listing_price() {
        let deal = accepted_deal(2_500_000);
        let txn = Transaction::opened(&deal, &listing(Some(3_000_000), PropertyKind::House));

        assert_eq!(txn.status, TransactionStatus::Draft);
        assert_eq!(txn.base_price, 3_000_000);
        assert_eq!(txn.discount_amount, 500_000);
        assert_eq!(txn.pricing_mode, PricingMode::Full);
        assert_eq!(txn.tcp, 2_500_000);
        assert_eq!(txn.balance_amount, 2_500_000);
    }

    #[test]
    fn test_opened_without_listing_price() {
        let deal = accepted_deal(2_500_000);
        let txn = Transaction::opened(&deal, &listing(None, PropertyKind::Condo));

        assert_eq!(txn.base_price, 2_500_000);
        assert_eq!(txn.discount_amount, 0);
        assert_eq!(txn.tcp, 2_500_000);
    }

    #[test]
    fn test_land_defaults_to_simple_mode() {
        let deal = accepted_deal(800_000);
        let txn = Transaction::opened(&deal, &listing(Some(1_000_000), PropertyKind::Land));
        assert_eq!(txn.pricing_mode, PricingMode::Simple);
    }

    #[test]
    fn test_mode_switch_keeps_fees() {
        let deal = accepted_deal(900_000);
        let mut txn = Transaction::opened(&deal, &listing(Some(1_000_000), PropertyKind::House));

        TransactionDraft {
            fees_amount: Some(50_000),
            ..Default::default()
        }
        .apply(&mut txn);
        txn.recompute();
        assert_eq!(txn.tcp, 950_000);

        // Dropping to simple ignores the fees but does not erase them
        TransactionDraft {
            pricing_mode: Some(PricingMode::Simple),
            ..Default::default()
        }
        .apply(&mut txn);
        txn.recompute();
        assert_eq!(txn.fees_amount, 50_000);
        assert_eq!(txn.tcp, 900_000);

        // Switching back restores the fee-inclusive total
        TransactionDraft {
            pricing_mode: Some(PricingMode::Full),
            ..Default::default()
        }
        .apply(&mut txn);
        txn.recompute();
        assert_eq!(txn.tcp, 950_000);
    }

    #[test]
    fn test_validate_monetary() {
        let deal = accepted_deal(900_000);
        let mut txn = Transaction::opened(&deal, &listing(Some(1_000_000), PropertyKind::House));
        txn.discount_amount = -1;

        let err = txn.validate_monetary().unwrap_err();
        assert!(matches!(
            err,
            DealbookError::NegativeMonetaryField {
                field: "discount_amount",
                value: -1,
            }
        ));
    }

    #[test]
    fn test_stamp_status_is_write_once() {
        let deal = accepted_deal(900_000);
        let mut txn = Transaction::opened(&deal, &listing(Some(1_000_000), PropertyKind::House));

        let first = Utc::now();
        txn.stamp_status(TransactionStatus::Reserved, first);
        assert_eq!(txn.reserved_at, Some(first));

        let later = first + chrono::Duration::seconds(60);
        txn.stamp_status(TransactionStatus::Reserved, later);
        assert_eq!(txn.reserved_at, Some(first));

        // Draft has no timestamp slot
        txn.stamp_status(TransactionStatus::Draft, later);
        assert!(txn.booked_at.is_none());
    }

    #[test]
    fn test_status_wire_shape() {
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Draft).unwrap(),
            "\"DRAFT\""
        );
        assert_eq!(
            serde_json::to_string(&TransactionStatus::Reserved).unwrap(),
            "\"RESERVED\""
        );
        assert_eq!(
            serde_json::to_string(&Financing::InHouse).unwrap(),
            "\"in_house\""
        );
    }
}
