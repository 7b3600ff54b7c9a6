//! Form server routes exercised through the router

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;
use wiremock::MockServer;

use propsearch::server::{create_router, AppState, SESSION_COOKIE};

use common::{mount_reply, search_engine, COMPLETE_GACHIBOWLI, QUESTION_FLAT};

fn app(server: &MockServer) -> (Router, AppState) {
    let state = AppState::new(search_engine(server), 40);
    (create_router(state.clone()), state)
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn session_cookie(response: &axum::response::Response) -> String {
    let value = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .unwrap();
    value.split(';').next().unwrap().to_string()
}

fn form_post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

#[tokio::test]
async fn test_health() {
    let server = MockServer::start().await;
    let (router, _) = app(&server);

    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_index_renders_without_starting_session() {
    let server = MockServer::start().await;
    let (router, state) = app(&server);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = body_text(response).await;
    assert!(page.contains("Real Estate Property Search"));
    assert!(page.contains("name=\"query\""));
    assert_eq!(state.session_count(), 0);
}

#[tokio::test]
async fn test_repeated_page_views_leave_no_sessions() {
    let server = MockServer::start().await;
    let (router, state) = app(&server);

    for _ in 0..200 {
        let response = router
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
    }
    assert_eq!(state.session_count(), 0);
}

#[tokio::test]
async fn test_first_query_starts_session_and_page_view_keeps_it() {
    let server = MockServer::start().await;
    mount_reply(&server, QUESTION_FLAT).await;
    let (router, state) = app(&server);

    let response = router
        .clone()
        .oneshot(form_post("/search", None, "query=I+want+a+flat"))
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    assert!(cookie.starts_with(SESSION_COOKIE));
    assert_eq!(state.session_count(), 1);

    let response = router
        .oneshot(
            Request::get("/")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = body_text(response).await;
    assert!(page.contains("name=\"clarification\""));
    assert_eq!(state.session_count(), 1);
}

#[tokio::test]
async fn test_question_then_clarification_shows_results() {
    let server = MockServer::start().await;
    mount_reply(&server, QUESTION_FLAT).await;
    mount_reply(&server, COMPLETE_GACHIBOWLI).await;
    let (router, _) = app(&server);

    let response = router
        .clone()
        .oneshot(form_post("/search", None, "query=I+want+a+flat"))
        .await
        .unwrap();
    let cookie = session_cookie(&response);
    let page = body_text(response).await;
    assert!(page.contains("what&#39;s your budget range?"));
    assert!(page.contains("name=\"clarification\""));

    let response = router
        .oneshot(form_post(
            "/clarify",
            Some(&cookie),
            "clarification=3BHK+in+Gachibowli+under+20k",
        ))
        .await
        .unwrap();
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let page = body_text(response).await;
    assert!(page.contains("Search Results"));
    assert!(page.contains("Lake View Residency"));
    assert!(!page.contains("Palm Grove"));
    assert!(!page.contains("name=\"clarification\""));
}

#[tokio::test]
async fn test_blank_query_is_ignored() {
    let server = MockServer::start().await;
    let (router, state) = app(&server);

    let response = router
        .oneshot(form_post("/search", None, "query=+++"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(server.received_requests().await.unwrap().is_empty());
    assert_eq!(state.session_count(), 0);
}

#[tokio::test]
async fn test_malformed_reply_shows_raw_text_escaped() {
    let server = MockServer::start().await;
    mount_reply(&server, "<b>I am not JSON</b>").await;
    let (router, _) = app(&server);

    let response = router
        .oneshot(form_post("/search", None, "query=a+flat"))
        .await
        .unwrap();
    let page = body_text(response).await;
    assert!(page.contains("Sorry, there was an error understanding your request."));
    assert!(page.contains("&lt;b&gt;I am not JSON&lt;/b&gt;"));
}

#[tokio::test]
async fn test_provider_failure_shows_generic_message() {
    let server = MockServer::start().await;
    let (router, _) = app(&server);

    let response = router
        .oneshot(form_post("/search", None, "query=a+flat"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Sorry, I could not process your request. Please try again."));
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let server = MockServer::start().await;
    mount_reply(&server, QUESTION_FLAT).await;
    let (router, state) = app(&server);

    router
        .clone()
        .oneshot(form_post("/search", None, "query=I+want+a+flat"))
        .await
        .unwrap();

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let page = body_text(response).await;
    assert!(!page.contains("name=\"clarification\""));
    assert_eq!(state.session_count(), 1);
}
