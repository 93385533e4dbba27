//! Collaborator lookup boundaries: listings and actor identity
//!
//! The core never owns listing or identity data. It reads the current
//! listing snapshot (price, property type) and resolves which side of a deal
//! an actor stands on; both concerns live behind traits so the surrounding
//! application can plug in its own backing services.

use crate::error::{DealbookError, Result};
use crate::types::{ActorId, Listing, ListingId, PartySide, PropertyKind};
use std::collections::HashMap;
use std::sync::Mutex;

/// Listing/Property lookup: current list price and type
pub trait ListingDirectory: Send + Sync {
    fn listing(&self, id: &ListingId) -> Result<Listing>;
}

/// Actor/Identity resolution: which side an actor represents on a listing
pub trait ActorDirectory: Send + Sync {
    fn side_of(&self, listing_id: &ListingId, actor_id: &ActorId) -> Option<PartySide>;
}

/// In-memory directory backing the CLI and tests
pub struct InMemoryDirectory {
    listings: Mutex<HashMap<ListingId, Listing>>,
    sellers: Mutex<HashMap<ListingId, Vec<ActorId>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            listings: Mutex::new(HashMap::new()),
            sellers: Mutex::new(HashMap::new()),
        }
    }

    /// Register a listing with its selling-side actors (agent/broker)
    pub fn add_listing(
        &self,
        id: &str,
        list_price: Option<i64>,
        kind: PropertyKind,
        sellers: &[&str],
    ) {
        let listing_id = ListingId(id.to_string());
        self.listings.lock().expect("directory mutex poisoned").insert(
            listing_id.clone(),
            Listing {
                id: listing_id.clone(),
                list_price,
                kind,
            },
        );
        self.sellers.lock().expect("directory mutex poisoned").insert(
            listing_id,
            sellers.iter().map(|s| ActorId(s.to_string())).collect(),
        );
    }

    /// Snapshot every listing with its selling-side actors (persistence export)
    pub fn entries(&self) -> Vec<(Listing, Vec<ActorId>)> {
        let listings = self.listings.lock().expect("directory mutex poisoned");
        let sellers = self.sellers.lock().expect("directory mutex poisoned");
        listings
            .values()
            .map(|listing| {
                (
                    listing.clone(),
                    sellers.get(&listing.id).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// Register a listing from a persisted entry
    pub fn restore(&self, listing: Listing, selling_actors: Vec<ActorId>) {
        self.sellers
            .lock()
            .expect("directory mutex poisoned")
            .insert(listing.id.clone(), selling_actors);
        self.listings
            .lock()
            .expect("directory mutex poisoned")
            .insert(listing.id.clone(), listing);
    }

    /// Update a listing's published price (repricing between proposals)
    pub fn set_list_price(&self, id: &str, list_price: Option<i64>) {
        let mut listings = self.listings.lock().expect("directory mutex poisoned");
        if let Some(listing) = listings.get_mut(&ListingId(id.to_string())) {
            listing.list_price = list_price;
        }
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingDirectory for InMemoryDirectory {
    fn listing(&self, id: &ListingId) -> Result<Listing> {
        self.listings
            .lock()
            .expect("directory mutex poisoned")
            .get(id)
            .cloned()
            .ok_or_else(|| DealbookError::ListingNotFound(id.0.clone()))
    }
}

impl ActorDirectory for InMemoryDirectory {
    fn side_of(&self, listing_id: &ListingId, actor_id: &ActorId) -> Option<PartySide> {
        let sellers = self.sellers.lock().expect("directory mutex poisoned");
        match sellers.get(listing_id) {
            Some(actors) if actors.contains(actor_id) => Some(PartySide::Seller),
            // Anyone not on the selling side may act as a buyer
            Some(_) => Some(PartySide::Buyer),
            None => None,
        }
    }
}
