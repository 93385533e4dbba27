//! JSON book file backing the CLI
//!
//! A book is a snapshot of listings, deals, and transactions. The CLI loads
//! it before an operation and writes it back afterwards, so successive
//! invocations act on the same negotiation state.

use crate::cli::DealbookApp;
use crate::directory::InMemoryDirectory;
use crate::error::Result;
use crate::negotiation::Deal;
use crate::settlement::Transaction;
use crate::types::{ActorId, Listing};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// One listing with its selling-side actors
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BookListing {
    pub listing: Listing,
    pub sellers: Vec<ActorId>,
}

/// Persisted snapshot of the whole book
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Book {
    pub listings: Vec<BookListing>,
    pub deals: Vec<Deal>,
    pub transactions: Vec<Transaction>,
}

impl Book {
    /// Load a book from disk; a missing file is an empty book
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the book back to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Build a directory and application holding this book's rows
    pub fn open(&self) -> Result<(Arc<InMemoryDirectory>, DealbookApp)> {
        let directory = Arc::new(InMemoryDirectory::new());
        for entry in &self.listings {
            directory.restore(entry.listing.clone(), entry.sellers.clone());
        }

        let app = DealbookApp::new(directory.clone(), directory.clone());
        for deal in &self.deals {
            app.negotiation().restore(deal.clone())?;
        }
        for txn in &self.transactions {
            app.finalizer().restore(txn.clone())?;
        }

        Ok((directory, app))
    }

    /// Capture the current rows back into a persistable snapshot
    pub fn capture(directory: &InMemoryDirectory, app: &DealbookApp) -> Self {
        let mut listings: Vec<BookListing> = directory
            .entries()
            .into_iter()
            .map(|(listing, sellers)| BookListing { listing, sellers })
            .collect();
        listings.sort_by(|a, b| a.listing.id.0.cmp(&b.listing.id.0));

        let mut deals = app.negotiation().all_deals();
        deals.sort_by(|a, b| a.id.0.cmp(&b.id.0));

        let mut transactions = app.finalizer().all_transactions();
        transactions.sort_by(|a, b| a.id.0.cmp(&b.id.0));

        Self {
            listings,
            deals,
            transactions,
        }
    }
}
