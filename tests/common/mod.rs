use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use propsearch::config::OpenAiConfig;
use propsearch::interpreter::Interpreter;
use propsearch::providers::{CompletionOptions, OpenAiProvider};
use propsearch::search::PropertySearch;
use propsearch::store::{Listing, ListingStore, SledListingStore};

#[allow(dead_code)]
pub const QUESTION_FLAT: &str = r#"{"status": "incomplete", "question": "What BHK configuration are you looking for, and in which area? Also, what's your budget range?"}"#;

#[allow(dead_code)]
pub const COMPLETE_GACHIBOWLI: &str = r#"{"status": "complete", "filters": {"flatType": "3BHK", "locality": {"$regex": "gachibowli", "$options": "i"}, "price": {"$lte": 20000}}}"#;

/// Listings used across the integration tests
#[allow(dead_code)]
pub fn sample_listings() -> Vec<Listing> {
    [
        json!({"Property Name": "Lake View Residency", "flatType": "3BHK", "locality": "Gachibowli", "Rent/Buy": "Rent", "Description": "Corner unit near the lake", "price": 18000}),
        json!({"Property Name": "Hill Crest", "flatType": "2BHK", "locality": "Kondapur", "Rent/Buy": "Rent", "Description": "Gated community", "price": 15000}),
        json!({"Property Name": "Palm Grove", "flatType": "3BHK", "locality": "Gachibowli", "Rent/Buy": "Rent", "price": 26000}),
        json!({"Property Name": "Skyline Towers", "flatType": "3BHK", "locality": "HITEC City", "Rent/Buy": "Buy", "price": 9500000}),
    ]
    .into_iter()
    .map(|value| Listing::from_value(value).expect("sample listing is an object"))
    .collect()
}

/// Temporary sled collection seeded with [`sample_listings`]
#[allow(dead_code)]
pub fn seeded_store() -> SledListingStore {
    let store = SledListingStore::temporary("Recommendation").expect("failed to open store");
    store
        .insert_many(&sample_listings())
        .expect("failed to seed store");
    store
}

/// Chat-completions response body carrying `content`
#[allow(dead_code)]
pub fn chat_completion_body(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
    })
}

/// Mount one chat-completions reply, used once
#[allow(dead_code)]
pub async fn mount_reply(server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_completion_body(content)))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

/// OpenAI-compatible provider pointed at the mock server
#[allow(dead_code)]
pub fn openai_provider(server: &MockServer) -> OpenAiProvider {
    OpenAiProvider::new(
        OpenAiConfig {
            api_base: server.uri(),
            api_key: Some("sk-test".to_string()),
            model: "gpt-4o-mini".to_string(),
        },
        10,
    )
    .expect("failed to create provider")
}

/// Search engine over the mock server and a seeded store
#[allow(dead_code)]
pub fn search_engine(server: &MockServer) -> PropertySearch {
    let interpreter = Interpreter::new(
        Arc::new(openai_provider(server)),
        CompletionOptions::default(),
    );
    PropertySearch::new(interpreter, Arc::new(seeded_store()))
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
