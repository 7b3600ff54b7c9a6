//! HTML rendering for the search form
//!
//! The whole page is re-rendered on every interaction from the session
//! state plus an optional one-shot notice. Every piece of user or model text
//! goes through [`escape_html`].

use crate::conversation::Session;
use crate::render::NO_RESULTS_MESSAGE;
use crate::store::{Listing, DISPLAY_FIELDS, PROPERTY_NAME};

use std::fmt::Write;

/// Message shown above the raw reply when the model answered with non-JSON
pub const NOT_UNDERSTOOD_MESSAGE: &str = "Sorry, there was an error understanding your request.";

/// Banner shown for the interaction that produced it only
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Model reply was not JSON; the raw text is shown under the message
    NotUnderstood {
        /// Reply exactly as received
        raw: String,
    },
    /// Generic failure message
    Error(String),
}

/// Escape text for HTML element content and quoted attribute values
///
/// # Examples
///
/// ```
/// use propsearch::server::page::escape_html;
///
/// assert_eq!(escape_html("<b>\"3BHK\" & more</b>"), "&lt;b&gt;&quot;3BHK&quot; &amp; more&lt;/b&gt;");
/// ```
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

const STYLE: &str = "body{font-family:sans-serif;max-width:720px;margin:2rem auto;padding:0 1rem;color:#222}\
form{margin:1rem 0}input[type=text]{width:75%;padding:.4rem}button{padding:.4rem .8rem}\
.info{background:#e8f1fb;border-left:4px solid #2f6fb3;padding:.6rem}\
.error{background:#fbe9e9;border-left:4px solid #b32f2f;padding:.6rem}\
.warning{background:#fdf6e3;border-left:4px solid #c99a06;padding:.6rem}\
.raw{white-space:pre-wrap;background:#f4f4f4;padding:.6rem}\
.card{border-bottom:1px solid #ddd;padding:.6rem 0}";

fn render_listing(out: &mut String, listing: &Listing) {
    out.push_str("<div class=\"card\">");
    let _ = write!(
        out,
        "<p><strong>{}:</strong> {}</p>",
        PROPERTY_NAME,
        escape_html(&listing.display_value(PROPERTY_NAME))
    );
    for field in DISPLAY_FIELDS.iter().filter(|f| **f != PROPERTY_NAME) {
        let _ = write!(
            out,
            "<p>{}: {}</p>",
            escape_html(field),
            escape_html(&listing.display_value(field))
        );
    }
    out.push_str("</div>");
}

/// Render the page for a session
pub fn render_page(session: &Session, notice: Option<&Notice>) -> String {
    let mut out = String::new();
    out.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">");
    out.push_str("<title>Real Estate Property Search</title>");
    let _ = write!(out, "<style>{}</style></head><body>", STYLE);
    out.push_str("<h1>&#127968; Real Estate Property Search AI Agent</h1>");

    out.push_str("<p>Enter your property search query below:</p>");
    out.push_str(
        "<form method=\"post\" action=\"/search\">\
         <input type=\"text\" name=\"query\" aria-label=\"Your search query\" \
         placeholder=\"e.g. 3BHK in Gachibowli under 20k\"> \
         <button type=\"submit\">Search</button></form>",
    );

    match notice {
        Some(Notice::NotUnderstood { raw }) => {
            let _ = write!(
                out,
                "<div class=\"error\" id=\"notice\">{}</div><div class=\"raw\">{}</div>",
                escape_html(NOT_UNDERSTOOD_MESSAGE),
                escape_html(raw)
            );
        }
        Some(Notice::Error(message)) => {
            let _ = write!(
                out,
                "<div class=\"error\" id=\"notice\">{}</div>",
                escape_html(message)
            );
        }
        None => {}
    }

    if let Some(question) = session.pending_question() {
        let _ = write!(
            out,
            "<div class=\"info\" id=\"question\">{}</div>",
            escape_html(question)
        );
        out.push_str(
            "<form method=\"post\" action=\"/clarify\">\
             <input type=\"text\" name=\"clarification\" aria-label=\"Clarify your requirements\"> \
             <button type=\"submit\">Submit Clarification</button></form>",
        );
    }

    if let Some(results) = session.last_results() {
        out.push_str("<h2>Search Results</h2>");
        if results.is_empty() {
            let _ = write!(
                out,
                "<div class=\"warning\" id=\"no-results\">{}</div>",
                escape_html(NO_RESULTS_MESSAGE)
            );
        } else {
            for listing in results {
                render_listing(&mut out, listing);
            }
        }
    }

    out.push_str("</body></html>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::filter::FilterExpression;
    use serde_json::json;

    #[test]
    fn test_escape_html_passes_plain_text() {
        assert_eq!(escape_html("3BHK in Gachibowli"), "3BHK in Gachibowli");
        assert_eq!(escape_html("it's"), "it&#39;s");
    }

    #[test]
    fn test_fresh_page_has_search_box_only() {
        let page = render_page(&Session::default(), None);
        assert!(page.contains("action=\"/search\""));
        assert!(!page.contains("action=\"/clarify\""));
        assert!(!page.contains("Search Results"));
        assert!(!page.contains("id=\"notice\""));
    }

    #[test]
    fn test_pending_question_shows_clarification_box() {
        let mut session = Session::default();
        session.record_question("Which <area>?");
        let page = render_page(&session, None);
        assert!(page.contains("Which &lt;area&gt;?"));
        assert!(page.contains("name=\"clarification\""));
    }

    #[test]
    fn test_results_render_cards_with_defaults() {
        let mut session = Session::default();
        session.record_results(
            FilterExpression::default(),
            vec![Listing::from_value(json!({"Property Name": "Lake <View>", "price": 18000})).unwrap()],
        );
        let page = render_page(&session, None);
        assert!(page.contains("<strong>Property Name:</strong> Lake &lt;View&gt;"));
        assert!(page.contains("<p>price: 18000</p>"));
        assert!(page.contains("<p>locality: N/A</p>"));
        assert!(page.contains("<p>Rent/Buy: N/A</p>"));
    }

    #[test]
    fn test_empty_results_show_warning() {
        let mut session = Session::default();
        session.record_results(FilterExpression::default(), Vec::new());
        let page = render_page(&session, None);
        assert!(page.contains(NO_RESULTS_MESSAGE));
    }

    #[test]
    fn test_not_understood_notice_shows_raw_reply() {
        let notice = Notice::NotUnderstood {
            raw: "<script>alert(1)</script>".to_string(),
        };
        let page = render_page(&Session::default(), Some(&notice));
        assert!(page.contains(NOT_UNDERSTOOD_MESSAGE));
        assert!(page.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
