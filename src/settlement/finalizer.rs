//! Transaction finalizer: turns an accepted deal into a binding record
//! and manages its post-acceptance lifecycle

use crate::error::{DealbookError, Result};
use crate::events::{Notification, Outbox};
use crate::negotiation::{Deal, DealStatus};
use crate::store::{Store, Versioned};
use crate::types::{DealId, Listing, TransactionId};
use chrono::Utc;
use std::sync::Arc;

use super::types::{Transaction, TransactionDraft, TransactionStatus};

/// Transaction finalizer: owns every transaction row.
///
/// Mutations follow the same discipline as the negotiation engine: read,
/// validate everything, recompute the derived figures, then compare-and-swap.
/// No partial write ever lands.
pub struct TransactionFinalizer {
    transactions: Store<TransactionId, Transaction>,
    outbox: Arc<Outbox>,
}

impl TransactionFinalizer {
    pub fn new(outbox: Arc<Outbox>) -> Self {
        Self {
            transactions: Store::new(),
            outbox,
        }
    }

    /// Create the draft transaction for an accepted deal, seeding pricing
    /// from the listing and the negotiated amount. One transaction per deal.
    pub fn open_from_deal(&self, deal: &Deal, listing: &Listing) -> Result<Transaction> {
        if deal.status != DealStatus::Accepted {
            return Err(DealbookError::DealNotAccepted(deal.id.0.clone()));
        }
        if listing.id != deal.listing_id {
            return Err(DealbookError::ListingMismatch {
                deal: deal.id.0.clone(),
                listing: listing.id.0.clone(),
            });
        }
        if self.transaction_for_deal(&deal.id).is_some() {
            return Err(DealbookError::InvalidTransition(format!(
                "deal {} already has a transaction",
                deal.id
            )));
        }

        let txn = Transaction::opened(deal, listing);
        txn.validate_monetary()?;
        self.transactions.insert(txn.id.clone(), txn.clone())?;

        self.outbox.push(Notification::TransactionOpened {
            transaction_id: txn.id.clone(),
            deal_id: deal.id.clone(),
        });
        tracing::info!(
            "Transaction {} opened for deal {} (tcp {})",
            txn.id,
            deal.id,
            txn.tcp
        );

        Ok(txn)
    }

    /// Persist an edited field snapshot.
    ///
    /// Legal in any non-terminal status; may be called repeatedly while
    /// drafting. Derived figures are recomputed on every save.
    pub fn save(&self, transaction_id: &TransactionId, draft: TransactionDraft) -> Result<Transaction> {
        let Versioned {
            row: mut txn,
            revision,
        } = self.load(transaction_id)?;

        self.ensure_editable(&txn)?;

        draft.apply(&mut txn);
        txn.validate_monetary()?;
        txn.recompute();
        txn.updated_at = Utc::now();

        let txn = self
            .transactions
            .compare_and_swap(transaction_id, revision, txn)?
            .row;

        self.outbox.push(Notification::TransactionSaved {
            transaction_id: transaction_id.clone(),
            tcp: txn.tcp,
            balance_amount: txn.balance_amount,
        });
        tracing::info!(
            "Transaction {} saved: tcp {}, balance {}",
            transaction_id,
            txn.tcp,
            txn.balance_amount
        );

        Ok(txn)
    }

    /// Advance the transaction to a chosen status.
    ///
    /// The lifecycle is not strictly linear: any status may be selected
    /// from any non-terminal one. Entering `Cancelled` requires a reason.
    /// Status timestamps are stamped once, on first entry.
    pub fn set_status(
        &self,
        transaction_id: &TransactionId,
        status: TransactionStatus,
        cancel_reason: Option<&str>,
    ) -> Result<Transaction> {
        let Versioned {
            row: mut txn,
            revision,
        } = self.load(transaction_id)?;

        self.ensure_editable(&txn)?;

        if status == TransactionStatus::Cancelled {
            let reason = cancel_reason.map(str::trim).unwrap_or_default();
            if reason.is_empty() {
                return Err(DealbookError::MissingReason(
                    "cancelling a transaction requires an explanatory reason".to_string(),
                ));
            }
            txn.cancel_reason = Some(reason.to_string());
        }

        txn.validate_monetary()?;

        let now = Utc::now();
        txn.stamp_status(status, now);
        txn.status = status;
        txn.recompute();
        txn.updated_at = now;

        let txn = self
            .transactions
            .compare_and_swap(transaction_id, revision, txn)?
            .row;

        self.outbox.push(Notification::TransactionStatusChanged {
            transaction_id: transaction_id.clone(),
            status,
        });
        tracing::info!("Transaction {} moved to {:?}", transaction_id, status);

        Ok(txn)
    }

    /// Get a transaction snapshot
    pub fn transaction(&self, transaction_id: &TransactionId) -> Result<Transaction> {
        Ok(self.load(transaction_id)?.row)
    }

    /// The transaction spawned by a deal, if any
    pub fn transaction_for_deal(&self, deal_id: &DealId) -> Option<Transaction> {
        self.transactions
            .filter(|txn| &txn.deal_id == deal_id)
            .into_iter()
            .next()
    }

    /// Snapshot every transaction row (persistence export)
    pub fn all_transactions(&self) -> Vec<Transaction> {
        self.transactions.filter(|_| true)
    }

    /// Load a previously persisted transaction row
    pub fn restore(&self, txn: Transaction) -> Result<()> {
        self.transactions.insert(txn.id.clone(), txn)?;
        Ok(())
    }

    fn load(&self, transaction_id: &TransactionId) -> Result<Versioned<Transaction>> {
        self.transactions
            .get(transaction_id)
            .ok_or_else(|| DealbookError::TransactionNotFound(transaction_id.0.clone()))
    }

    fn ensure_editable(&self, txn: &Transaction) -> Result<()> {
        if txn.status.is_terminal() {
            return Err(DealbookError::InvalidTransition(format!(
                "transaction {} is terminal in status {:?}",
                txn.id, txn.status
            )));
        }
        Ok(())
    }
}
