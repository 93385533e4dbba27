//! Versioned in-memory row stores with compare-and-swap application
//!
//! Every deal and transaction is a single row mutated by short-lived
//! request/response operations. Each mutation is applied as a
//! read-validate-swap against the revision observed at read time; a swap
//! against a moved revision fails rather than clobbering the newer row.

use crate::error::{DealbookError, Result};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Mutex;

/// A stored row together with its revision counter
#[derive(Clone, Debug)]
pub struct Versioned<T> {
    pub row: T,
    pub revision: u64,
}

/// Keyed row store guarding each row with an optimistic revision
pub struct Store<K, T> {
    rows: Mutex<HashMap<K, Versioned<T>>>,
}

impl<K, T> Store<K, T>
where
    K: Eq + Hash + Clone + Display,
    T: Clone,
{
    pub fn new() -> Self {
        Self {
            rows: Mutex::new(HashMap::new()),
        }
    }

    /// Insert a freshly created row at revision 1.
    ///
    /// Keys are generated by the caller and unique by construction; inserting
    /// an existing key replaces nothing and reports a conflict.
    pub fn insert(&self, key: K, row: T) -> Result<Versioned<T>> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        if rows.contains_key(&key) {
            return Err(DealbookError::InvalidTransition(format!(
                "row already exists: {key}"
            )));
        }
        let versioned = Versioned { row, revision: 1 };
        rows.insert(key, versioned.clone());
        Ok(versioned)
    }

    /// Read a row snapshot together with its current revision
    pub fn get(&self, key: &K) -> Option<Versioned<T>> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .get(key)
            .cloned()
    }

    /// Swap in a mutated row, but only if the revision has not moved since
    /// the caller read it. A mismatch means another request landed first.
    pub fn compare_and_swap(&self, key: &K, expected: u64, row: T) -> Result<Versioned<T>> {
        let mut rows = self.rows.lock().expect("store mutex poisoned");
        let current = rows
            .get(key)
            .ok_or_else(|| DealbookError::InvalidTransition(format!("row vanished: {key}")))?;

        if current.revision != expected {
            return Err(DealbookError::StaleState {
                entity: key.to_string(),
                expected,
                found: current.revision,
            });
        }

        let versioned = Versioned {
            row,
            revision: expected + 1,
        };
        rows.insert(key.clone(), versioned.clone());
        Ok(versioned)
    }

    /// Snapshot all rows matching a predicate
    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> Vec<T> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .values()
            .filter(|v| pred(&v.row))
            .map(|v| v.row.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<K, T> Default for Store<K, T>
where
    K: Eq + Hash + Clone + Display,
    T: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
