//! Search interpretation system prompt
//!
//! The instruction that defines the reply contract the interpreter parses:
//! a JSON object with a `status` discriminator and either a follow-up
//! `question` or a `filters` document.

use crate::interpreter::filter::FilterField;

/// Generates the system prompt for search interpretation
///
/// The allowed filter fields are listed from [`FilterField::ALL`] so the
/// instruction and the filter allow-list cannot drift apart.
///
/// # Examples
///
/// ```
/// use propsearch::prompts::search_prompt::generate_search_prompt;
///
/// let prompt = generate_search_prompt();
/// assert!(prompt.contains("flatType, locality, price"));
/// ```
pub fn generate_search_prompt() -> String {
    let fields = FilterField::ALL
        .iter()
        .map(|field| field.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an expert real estate assistant that converts search queries into database filters.

Your tasks:
1. Analyze if the query, together with the earlier conversation, has complete information for a property search
2. If incomplete, ask specific clarifying questions
3. If complete, convert it to a filter JSON object

Required fields for a complete search:
- Property type (flat, house, etc.) or BHK
- Location (area, city, etc.)
- Budget/price range

Rules for conversion:
1. Reply with a single JSON object and nothing else, with "status" set to "complete" or "incomplete"
2. If "incomplete", include "question" to ask for the missing information
3. If "complete", include "filters" with the query document
4. Use only these field names: {fields}
5. flatType and locality take a string, {{"$in": [..]}} or {{"$regex": "..", "$options": "i"}}
6. price takes a number or an object of "$lt", "$lte", "$gt", "$gte", "$eq" with numeric values
7. For numbers, ensure numeric values (not strings); expand shorthand such as 20k to 20000

Example outputs:
User: "I want a flat"
{{
  "status": "incomplete",
  "question": "What BHK configuration are you looking for, and in which area? Also, what's your budget range?"
}}

User: "3BHK in Gachibowli under 20k"
{{
  "status": "complete",
  "filters": {{
    "flatType": "3BHK",
    "locality": {{"$regex": "gachibowli", "$options": "i"}},
    "price": {{"$lte": 20000}}
  }}
}}

User: "luxury apartments"
{{
  "status": "incomplete",
  "question": "In which area are you looking for luxury apartments? What's your preferred BHK size and budget?"
}}
"#
    )
}
