//! Listing repository access
//!
//! Listings are opaque JSON documents. The store executes a validated
//! [`FilterExpression`] against a named collection and returns every match in
//! the collection's natural order, without pagination or projection.

pub mod sled_store;

pub use sled_store::SledListingStore;

use crate::error::{PropsearchError, Result};
use crate::interpreter::filter::FilterExpression;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

/// Placeholder shown for an absent attribute
pub const MISSING_VALUE: &str = "N/A";

/// Listing name attribute
pub const PROPERTY_NAME: &str = "Property Name";
/// Unit type attribute
pub const FLAT_TYPE: &str = "flatType";
/// Locality attribute
pub const LOCALITY: &str = "locality";
/// Transaction type attribute
pub const RENT_OR_BUY: &str = "Rent/Buy";
/// Free-text description attribute
pub const DESCRIPTION: &str = "Description";
/// Price attribute
pub const PRICE: &str = "price";

/// Attributes shown for every listing, in display order
pub const DISPLAY_FIELDS: [&str; 6] = [
    PROPERTY_NAME,
    FLAT_TYPE,
    LOCALITY,
    RENT_OR_BUY,
    DESCRIPTION,
    PRICE,
];

/// A listing record
///
/// No schema is enforced; any attribute may be missing or carry any JSON type.
///
/// # Examples
///
/// ```
/// use propsearch::store::Listing;
/// use serde_json::json;
///
/// let listing = Listing::from_value(json!({"Property Name": "Lake View", "price": 18000})).unwrap();
/// assert_eq!(listing.display_value("Property Name"), "Lake View");
/// assert_eq!(listing.display_value("price"), "18000");
/// assert_eq!(listing.display_value("locality"), "N/A");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Listing(Map<String, Value>);

impl Listing {
    /// Wrap a JSON value, which must be an object
    ///
    /// # Errors
    ///
    /// Returns error if the value is not a JSON object
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(document) => Ok(Self(document)),
            other => Err(PropsearchError::Store(format!(
                "Listing must be a JSON object, got {}",
                json_type(&other)
            ))
            .into()),
        }
    }

    /// Attribute as display text; strings unquoted, absent or null as `N/A`
    pub fn display_value(&self, attribute: &str) -> String {
        match self.0.get(attribute) {
            None | Some(Value::Null) => MISSING_VALUE.to_string(),
            Some(Value::String(text)) => text.clone(),
            Some(other) => other.to_string(),
        }
    }

    /// Whether the listing satisfies a filter
    pub fn matches(&self, filter: &FilterExpression) -> bool {
        filter.matches(&self.0)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A named collection of listings
pub trait ListingStore: Send + Sync {
    /// Collection name
    fn collection(&self) -> &str;

    /// Every listing matching the filter, in natural order
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be read
    fn find(&self, filter: &FilterExpression) -> Result<Vec<Listing>>;

    /// Append listings, returning how many were stored
    ///
    /// # Errors
    ///
    /// Returns error if a listing cannot be written
    fn insert_many(&self, listings: &[Listing]) -> Result<usize>;

    /// Remove every listing
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be cleared
    fn clear(&self) -> Result<()>;

    /// Number of stored listings
    ///
    /// # Errors
    ///
    /// Returns error if the collection cannot be read
    fn count(&self) -> Result<usize>;
}

/// Read a JSON array of listing objects from a file
///
/// # Errors
///
/// Returns error if the file cannot be read, is not a JSON array, or holds
/// a non-object element
pub fn load_listings_file(path: impl AsRef<Path>) -> Result<Vec<Listing>> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|e| {
        PropsearchError::Store(format!("Failed to read {}: {}", path.display(), e))
    })?;

    let value: Value = serde_json::from_str(&contents)?;
    let Value::Array(items) = value else {
        return Err(PropsearchError::Store(format!(
            "{} must contain a JSON array of listings",
            path.display()
        ))
        .into());
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            Listing::from_value(item).map_err(|e| {
                anyhow::Error::from(PropsearchError::Store(format!(
                    "{} entry {}: {}",
                    path.display(),
                    index,
                    e
                )))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir};
    use serde_json::json;

    #[test]
    fn test_display_value_formats() {
        let listing = Listing::from_value(json!({
            "Property Name": "Lake View",
            "price": 18000,
            "Description": null,
            "flatType": 3
        }))
        .unwrap();

        assert_eq!(listing.display_value(PROPERTY_NAME), "Lake View");
        assert_eq!(listing.display_value(PRICE), "18000");
        assert_eq!(listing.display_value(DESCRIPTION), MISSING_VALUE);
        assert_eq!(listing.display_value(FLAT_TYPE), "3");
        assert_eq!(listing.display_value(RENT_OR_BUY), MISSING_VALUE);
    }

    #[test]
    fn test_from_value_rejects_non_object() {
        assert!(Listing::from_value(json!(["a"])).is_err());
    }

    #[test]
    fn test_listing_serializes_transparently() {
        let listing = Listing::from_value(json!({"price": 1})).unwrap();
        assert_eq!(serde_json::to_string(&listing).unwrap(), r#"{"price":1}"#);
    }

    #[test]
    fn test_load_listings_file() {
        let dir = temp_dir();
        let path = create_test_file(
            &dir,
            "listings.json",
            r#"[{"Property Name": "A"}, {"Property Name": "B", "price": 9000}]"#,
        );
        let listings = load_listings_file(&path).unwrap();
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].display_value(PRICE), "9000");
    }

    #[test]
    fn test_load_listings_file_rejects_object_root() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "listings.json", r#"{"Property Name": "A"}"#);
        assert!(load_listings_file(&path).is_err());
    }

    #[test]
    fn test_load_listings_file_rejects_scalar_entry() {
        let dir = temp_dir();
        let path = create_test_file(&dir, "listings.json", r#"[{"price": 1}, 42]"#);
        let err = load_listings_file(&path).unwrap_err();
        assert!(err.to_string().contains("entry 1"));
    }

    #[test]
    fn test_load_listings_file_missing() {
        assert!(load_listings_file("/nonexistent/listings.json").is_err());
    }
}
