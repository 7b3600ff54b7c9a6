//! sled-backed listing collection
//!
//! The database directory plays the role of a named database and each sled
//! tree is a named collection. Keys are ids from [`sled::Db::generate_id`]
//! stored big-endian, so iteration order is insertion order.

use crate::error::{PropsearchError, Result};
use crate::interpreter::filter::FilterExpression;
use crate::store::{Listing, ListingStore};

use sled::{Db, Tree};
use std::path::Path;

/// Listing collection persisted in a sled tree
pub struct SledListingStore {
    db: Db,
    tree: Tree,
    collection: String,
}

impl SledListingStore {
    /// Open (or create) a collection inside the database at `path`
    ///
    /// # Errors
    ///
    /// Returns error if the database or the collection cannot be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use propsearch::store::SledListingStore;
    ///
    /// # fn main() -> propsearch::error::Result<()> {
    /// let store = SledListingStore::open("data/listings.db", "Recommendation")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref();
        let db = sled::open(path).map_err(|e| {
            PropsearchError::Store(format!(
                "Failed to open database {}: {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Opened listing database at {}", path.display());
        Self::with_db(db, collection)
    }

    /// In-memory collection discarded on drop
    ///
    /// # Errors
    ///
    /// Returns error if the temporary database cannot be created
    pub fn temporary(collection: &str) -> Result<Self> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| PropsearchError::Store(format!("Failed to open database: {}", e)))?;
        Self::with_db(db, collection)
    }

    fn with_db(db: Db, collection: &str) -> Result<Self> {
        let tree = db.open_tree(collection).map_err(|e| {
            PropsearchError::Store(format!(
                "Failed to open collection {}: {}",
                collection, e
            ))
        })?;
        Ok(Self {
            db,
            tree,
            collection: collection.to_string(),
        })
    }

    fn decode(value: &[u8]) -> Result<Listing> {
        serde_json::from_slice(value)
            .map_err(|e| PropsearchError::Store(format!("Deserialization failed: {}", e)).into())
    }
}

impl ListingStore for SledListingStore {
    fn collection(&self) -> &str {
        &self.collection
    }

    fn find(&self, filter: &FilterExpression) -> Result<Vec<Listing>> {
        let mut matches = Vec::new();
        let mut scanned = 0usize;

        for entry in self.tree.iter() {
            let (_, value) =
                entry.map_err(|e| PropsearchError::Store(format!("Iteration failed: {}", e)))?;
            scanned += 1;
            let listing = Self::decode(&value)?;
            if listing.matches(filter) {
                matches.push(listing);
            }
        }

        tracing::debug!(
            "Scanned {} listings in {}, {} matched {}",
            scanned,
            self.collection,
            matches.len(),
            filter
        );
        Ok(matches)
    }

    fn insert_many(&self, listings: &[Listing]) -> Result<usize> {
        let mut batch = sled::Batch::default();
        for listing in listings {
            let id = self
                .db
                .generate_id()
                .map_err(|e| PropsearchError::Store(format!("Id generation failed: {}", e)))?;
            let value = serde_json::to_vec(listing)
                .map_err(|e| PropsearchError::Store(format!("Serialization failed: {}", e)))?;
            batch.insert(id.to_be_bytes().to_vec(), value);
        }

        self.tree
            .apply_batch(batch)
            .map_err(|e| PropsearchError::Store(format!("Insert failed: {}", e)))?;
        self.tree
            .flush()
            .map_err(|e| PropsearchError::Store(format!("Flush failed: {}", e)))?;

        tracing::info!("Inserted {} listings into {}", listings.len(), self.collection);
        Ok(listings.len())
    }

    fn clear(&self) -> Result<()> {
        self.tree
            .clear()
            .map_err(|e| PropsearchError::Store(format!("Clear failed: {}", e)))?;
        self.tree
            .flush()
            .map_err(|e| PropsearchError::Store(format!("Flush failed: {}", e)))?;
        tracing::info!("Cleared collection {}", self.collection);
        Ok(())
    }

    fn count(&self) -> Result<usize> {
        Ok(self.tree.len())
    }
}
