//! Notification events emitted on every deal and transaction transition
//!
//! The core records what happened; delivery (mail, push, dashboards) is the
//! surrounding application's job. Components append to an internal outbox
//! which the caller drains after each operation.

use crate::types::{ActorId, DealId, ListingId, TransactionId};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

use crate::settlement::TransactionStatus;

/// One notification per state transition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    OfferSubmitted {
        deal_id: DealId,
        listing_id: ListingId,
        buyer_id: ActorId,
        amount: i64,
    },
    OfferCountered {
        deal_id: DealId,
        actor_id: ActorId,
        amount: i64,
    },
    DealAccepted {
        deal_id: DealId,
        actor_id: ActorId,
        amount: i64,
    },
    DealDeclined {
        deal_id: DealId,
        actor_id: ActorId,
        reason: String,
    },
    DealCancelled {
        deal_id: DealId,
        actor_id: ActorId,
    },
    TransactionOpened {
        transaction_id: TransactionId,
        deal_id: DealId,
    },
    TransactionSaved {
        transaction_id: TransactionId,
        tcp: i64,
        balance_amount: i64,
    },
    TransactionStatusChanged {
        transaction_id: TransactionId,
        status: TransactionStatus,
    },
}

/// Append-and-drain outbox shared by the engines
pub struct Outbox {
    pending: Mutex<Vec<Notification>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn push(&self, notification: Notification) {
        self.pending
            .lock()
            .expect("outbox mutex poisoned")
            .push(notification);
    }

    /// Drain all pending notifications for dispatch
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.pending.lock().expect("outbox mutex poisoned"))
    }
}

impl Default for Outbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_take() {
        let outbox = Outbox::new();
        outbox.push(Notification::DealCancelled {
            deal_id: DealId("deal_1".to_string()),
            actor_id: ActorId("buyer_1".to_string()),
        });

        let drained = outbox.take();
        assert_eq!(drained.len(), 1);

        // Draining empties the outbox
        assert!(outbox.take().is_empty());
    }

    #[test]
    fn test_notification_serialization() {
        let event = Notification::TransactionSaved {
            transaction_id: TransactionId("txn_1".to_string()),
            tcp: 950_000,
            balance_amount: 700_000,
        };

        let serialized = serde_json::to_string(&event).unwrap();
        let deserialized: Notification = serde_json::from_str(&serialized).unwrap();
        assert_eq!(event, deserialized);
    }
}
