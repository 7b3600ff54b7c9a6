//! Listing collection commands
//!
//! `import` seeds the collection from a JSON array file. `search` runs a
//! filter document straight against the store, bypassing the model, after
//! the same allow-list check the interpreter applies.

use crate::error::{PropsearchError, Result};
use crate::interpreter::filter::FilterExpression;
use crate::render::format_results;
use crate::store::{load_listings_file, ListingStore};

use colored::Colorize;
use std::path::Path;

/// Load listings from `file` into the collection
///
/// With `replace`, the collection is emptied first. Returns the number of
/// listings imported.
///
/// # Errors
///
/// Returns error if the file is unreadable or malformed, or the store fails
pub fn import_listings(store: &dyn ListingStore, file: &Path, replace: bool) -> Result<usize> {
    let listings = load_listings_file(file)?;

    if replace {
        store.clear()?;
    }
    let inserted = store.insert_many(&listings)?;

    println!(
        "Imported {} listings into {} ({} total)",
        inserted.to_string().green(),
        store.collection().cyan(),
        store.count()?
    );
    Ok(inserted)
}

/// Parse and validate a filter document given on the command line
///
/// # Errors
///
/// Returns [`PropsearchError::InvalidFilter`] for bad JSON or a rejected filter
pub fn parse_filter_argument(filter: &str) -> Result<FilterExpression> {
    let document: serde_json::Value = serde_json::from_str(filter)
        .map_err(|e| PropsearchError::InvalidFilter(format!("not valid JSON: {}", e)))?;
    let expression = FilterExpression::from_document(&document)
        .map_err(|e| PropsearchError::InvalidFilter(e.to_string()))?;
    Ok(expression)
}

/// Run a filter against the collection and print the results
///
/// # Errors
///
/// Returns error if the filter is rejected or the store fails
pub fn search_listings(store: &dyn ListingStore, filter: &str) -> Result<()> {
    let expression = parse_filter_argument(filter)?;
    let listings = store.find(&expression)?;

    tracing::info!("Filter {} matched {} listings", expression, listings.len());
    println!("{}", format_results(&listings));
    Ok(())
}
