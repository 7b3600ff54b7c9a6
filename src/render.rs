//! Text rendering of search results

use crate::store::{Listing, DISPLAY_FIELDS, PRICE};

/// Shown in place of an empty result set
pub const NO_RESULTS_MESSAGE: &str = "No properties found matching your criteria.";

/// Render one listing as labelled lines
///
/// Text attributes are quoted; the price is printed bare.
pub fn format_listing(listing: &Listing) -> String {
    let mut out = String::new();
    for field in DISPLAY_FIELDS {
        let value = listing.display_value(field);
        if field == PRICE {
            out.push_str(&format!("{} : {}\n", field, value));
        } else {
            out.push_str(&format!("{} : \"{}\"\n", field, value));
        }
    }
    out
}

/// Render a result set, one block per listing in store order
///
/// # Examples
///
/// ```
/// use propsearch::render::{format_results, NO_RESULTS_MESSAGE};
///
/// assert_eq!(format_results(&[]), NO_RESULTS_MESSAGE);
/// ```
pub fn format_results(listings: &[Listing]) -> String {
    if listings.is_empty() {
        return NO_RESULTS_MESSAGE.to_string();
    }

    listings
        .iter()
        .map(format_listing)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_listing_all_fields() {
        let listing = Listing::from_value(json!({
            "Property Name": "Lake View",
            "flatType": "3BHK",
            "locality": "Gachibowli",
            "Rent/Buy": "Rent",
            "Description": "Corner unit",
            "price": 18000
        }))
        .unwrap();

        assert_eq!(
            format_listing(&listing),
            "Property Name : \"Lake View\"\n\
             flatType : \"3BHK\"\n\
             locality : \"Gachibowli\"\n\
             Rent/Buy : \"Rent\"\n\
             Description : \"Corner unit\"\n\
             price : 18000\n"
        );
    }

    #[test]
    fn test_format_listing_missing_fields_default() {
        let listing = Listing::from_value(json!({"Property Name": "Bare"})).unwrap();
        let text = format_listing(&listing);
        assert!(text.contains("locality : \"N/A\"\n"));
        assert!(text.ends_with("price : N/A\n"));
    }

    #[test]
    fn test_format_results_joins_blocks() {
        let listings = vec![
            Listing::from_value(json!({"Property Name": "A"})).unwrap(),
            Listing::from_value(json!({"Property Name": "B"})).unwrap(),
        ];
        let text = format_results(&listings);
        assert!(text.starts_with("Property Name : \"A\"\n"));
        assert!(text.contains("price : N/A\n\nProperty Name : \"B\"\n"));
    }

    #[test]
    fn test_format_results_empty_is_exact_message() {
        assert_eq!(
            format_results(&[]),
            "No properties found matching your criteria."
        );
    }
}
