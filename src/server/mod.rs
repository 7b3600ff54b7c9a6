//! Form-based search server
//!
//! Serves a single HTML page with a search box, a clarification box while a
//! follow-up question is pending, and a results panel. Each browser gets its
//! own [`Session`], keyed by a cookie and kept in memory. Sessions never
//! share state.
//!
//! A session is created by the first submitted query, not by page views, so
//! health checks and crawlers leave nothing behind. Sessions idle past the
//! configured timeout are discarded, and at the session cap the least
//! recently seen one makes room for the new one.

pub mod page;

use crate::config::Config;
use crate::conversation::Session;
use crate::error::{PropsearchError, Result};
use crate::search::{PropertySearch, TurnOutcome, UNPROCESSABLE_MESSAGE};

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use page::{render_page, Notice};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use uuid::Uuid;

/// Cookie carrying the session id
pub const SESSION_COOKIE: &str = "propsearch_session";

/// Default cap on live sessions
pub const DEFAULT_MAX_SESSIONS: usize = 1000;

/// Default idle time before a session is discarded
pub const DEFAULT_SESSION_IDLE: Duration = Duration::from_secs(3600);

type SharedSession = Arc<tokio::sync::Mutex<Session>>;

struct SessionEntry {
    session: SharedSession,
    last_seen: Instant,
}

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    /// Interpreter and store
    pub search: PropertySearch,
    /// Live sessions by id
    sessions: Arc<Mutex<HashMap<Uuid, SessionEntry>>>,
    /// History cap for new sessions
    max_history_turns: usize,
    max_sessions: usize,
    idle_timeout: Duration,
}

impl AppState {
    /// Create state with no sessions and the default session limits
    pub fn new(search: PropertySearch, max_history_turns: usize) -> Self {
        Self {
            search,
            sessions: Arc::new(Mutex::new(HashMap::new())),
            max_history_turns,
            max_sessions: DEFAULT_MAX_SESSIONS,
            idle_timeout: DEFAULT_SESSION_IDLE,
        }
    }

    /// Override the session cap and idle timeout
    pub fn with_session_limits(mut self, max_sessions: usize, idle_timeout: Duration) -> Self {
        self.max_sessions = max_sessions.max(1);
        self.idle_timeout = idle_timeout;
        self
    }

    /// Number of live sessions
    pub fn session_count(&self) -> usize {
        self.lock_sessions().len()
    }

    fn lock_sessions(&self) -> MutexGuard<'_, HashMap<Uuid, SessionEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn evict_idle(&self, sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
        let before = sessions.len();
        sessions.retain(|_, entry| now.duration_since(entry.last_seen) < self.idle_timeout);
        let evicted = before - sessions.len();
        if evicted > 0 {
            tracing::debug!("Evicted {} idle form sessions", evicted);
        }
    }

    /// Live session named by the request cookie, marked as seen
    fn existing_session(&self, headers: &HeaderMap) -> Option<(Uuid, SharedSession)> {
        let id = session_id_from_headers(headers)?;
        let now = Instant::now();
        let mut sessions = self.lock_sessions();
        self.evict_idle(&mut sessions, now);

        let entry = sessions.get_mut(&id)?;
        entry.last_seen = now;
        Some((id, entry.session.clone()))
    }

    /// Session for the request, creating one when the cookie is absent or unknown
    ///
    /// Returns the `Set-Cookie` value to send when a session was created.
    fn session_for(&self, headers: &HeaderMap) -> (Uuid, SharedSession, Option<String>) {
        if let Some((id, session)) = self.existing_session(headers) {
            return (id, session, None);
        }

        let mut sessions = self.lock_sessions();
        while sessions.len() >= self.max_sessions {
            let Some(oldest) = sessions
                .iter()
                .min_by_key(|(_, entry)| entry.last_seen)
                .map(|(id, _)| *id)
            else {
                break;
            };
            sessions.remove(&oldest);
            tracing::debug!("Session cap reached, dropped form session {}", oldest);
        }

        let id = Uuid::new_v4();
        let session = Arc::new(tokio::sync::Mutex::new(Session::new(
            self.max_history_turns,
        )));
        sessions.insert(
            id,
            SessionEntry {
                session: session.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("Created form session {}", id);

        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        (id, session, Some(cookie))
    }
}

/// Session id from the `Cookie` header, if present and well formed
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

/// Body of `POST /search`
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    /// Free-text query
    #[serde(default)]
    pub query: String,
}

/// Body of `POST /clarify`
#[derive(Debug, Deserialize)]
pub struct ClarifyForm {
    /// Answer to the pending question
    #[serde(default)]
    pub clarification: String,
}

fn page_response(cookie: Option<String>, body: String) -> Response {
    match cookie {
        Some(cookie) => ([(header::SET_COOKIE, cookie)], Html(body)).into_response(),
        None => Html(body).into_response(),
    }
}

/// Run one step and turn the outcome into a notice for this render
async fn run_step(state: &AppState, session: &mut Session, input: &str) -> Option<Notice> {
    match state.search.submit(session, input).await {
        Ok(TurnOutcome::NotUnderstood { raw, .. }) => Some(Notice::NotUnderstood { raw }),
        Ok(TurnOutcome::Unprocessable { .. }) => {
            Some(Notice::Error(UNPROCESSABLE_MESSAGE.to_string()))
        }
        Ok(TurnOutcome::Question(_)) | Ok(TurnOutcome::Results { .. }) => None,
        Err(e) => {
            tracing::error!("Search step failed: {:#}", e);
            Some(Notice::Error(UNPROCESSABLE_MESSAGE.to_string()))
        }
    }
}

/// Render the caller's page without creating a session
async fn render_current(state: &AppState, headers: &HeaderMap) -> Response {
    match state.existing_session(headers) {
        Some((_, session)) => {
            let session = session.lock().await;
            Html(render_page(&session, None)).into_response()
        }
        None => Html(render_page(&Session::new(state.max_history_turns), None)).into_response(),
    }
}

async fn submit_and_render(state: AppState, headers: HeaderMap, input: &str) -> Response {
    let input = input.trim();
    if input.is_empty() {
        return render_current(&state, &headers).await;
    }

    let (id, session, cookie) = state.session_for(&headers);
    let mut session = session.lock().await;

    tracing::info!("Session {}: {}", id, input);
    let notice = run_step(&state, &mut session, input).await;

    page_response(cookie, render_page(&session, notice.as_ref()))
}

/// GET / - render the page for the caller's session
pub async fn index(State(state): State<AppState>, headers: HeaderMap) -> Response {
    render_current(&state, &headers).await
}

/// POST /search - submit a new query
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    submit_and_render(state, headers, &form.query).await
}

/// POST /clarify - answer the pending question
pub async fn clarify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<ClarifyForm>,
) -> Response {
    submit_and_render(state, headers, &form.clarification).await
}

/// GET /health - liveness check
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create the router with all routes
///
/// Every request, including rejected form posts, is traced at info level.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/search", post(search))
        .route("/clarify", post(clarify))
        .route("/health", get(health))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Start the form server on the configured address
///
/// # Errors
///
/// Returns error if the provider or store cannot be initialized, or the
/// address cannot be bound
pub async fn run_server(config: Config) -> Result<()> {
    let search = crate::commands::build_search(&config)?;
    let state = AppState::new(search, config.search.max_history_turns).with_session_limits(
        config.server.max_sessions,
        Duration::from_secs(config.server.session_idle_seconds),
    );
    let router = create_router(state);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting search server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| PropsearchError::Config(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, router)
        .await
        .map_err(PropsearchError::Io)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interpreter::Interpreter;
    use crate::providers::CompletionOptions;
    use crate::store::SledListingStore;
    use crate::test_utils::ScriptedProvider;
    use axum::http::HeaderValue;

    fn state(replies: Vec<&str>) -> AppState {
        let provider = Arc::new(ScriptedProvider::new(replies));
        let interpreter = Interpreter::new(provider, CompletionOptions::default());
        let store = SledListingStore::temporary("Recommendation").unwrap();
        AppState::new(PropertySearch::new(interpreter, Arc::new(store)), 40)
    }

    fn cookie_headers(id: Uuid) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}={}", SESSION_COOKIE, id)).unwrap(),
        );
        headers
    }

    fn tick() {
        std::thread::sleep(Duration::from_millis(5));
    }

    #[test]
    fn test_session_id_from_headers() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {}={}", SESSION_COOKIE, id)).unwrap(),
        );
        assert_eq!(session_id_from_headers(&headers), Some(id));
    }

    #[test]
    fn test_session_id_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("propsearch_session=not-a-uuid"),
        );
        assert_eq!(session_id_from_headers(&headers), None);
        assert_eq!(session_id_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn test_session_for_reuses_known_cookie() {
        let state = state(vec![]);
        let (id, _, cookie) = state.session_for(&HeaderMap::new());
        assert!(cookie.unwrap().starts_with("propsearch_session="));

        let (again, _, cookie) = state.session_for(&cookie_headers(id));
        assert_eq!(again, id);
        assert!(cookie.is_none());
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn test_unknown_cookie_gets_fresh_session() {
        let state = state(vec![]);
        let (_, _, cookie) = state.session_for(&cookie_headers(Uuid::new_v4()));
        assert!(cookie.is_some());
    }

    #[test]
    fn test_existing_session_never_creates() {
        let state = state(vec![]);
        assert!(state.existing_session(&HeaderMap::new()).is_none());
        assert!(state
            .existing_session(&cookie_headers(Uuid::new_v4()))
            .is_none());
        assert_eq!(state.session_count(), 0);
    }

    #[test]
    fn test_idle_sessions_are_evicted() {
        let state = state(vec![]).with_session_limits(10, Duration::from_millis(1));
        let (id, _, _) = state.session_for(&HeaderMap::new());
        tick();

        assert!(state.existing_session(&cookie_headers(id)).is_none());
        assert_eq!(state.session_count(), 0);

        let (replacement, _, cookie) = state.session_for(&cookie_headers(id));
        assert_ne!(replacement, id);
        assert!(cookie.is_some());
        assert_eq!(state.session_count(), 1);
    }

    #[test]
    fn test_session_cap_drops_least_recently_seen() {
        let state = state(vec![]).with_session_limits(2, DEFAULT_SESSION_IDLE);
        let (first, _, _) = state.session_for(&HeaderMap::new());
        tick();
        let (second, _, _) = state.session_for(&HeaderMap::new());
        tick();
        assert!(state.existing_session(&cookie_headers(first)).is_some());
        tick();

        let (third, _, _) = state.session_for(&HeaderMap::new());
        assert_eq!(state.session_count(), 2);
        assert!(state.existing_session(&cookie_headers(first)).is_some());
        assert!(state.existing_session(&cookie_headers(third)).is_some());
        assert!(state.existing_session(&cookie_headers(second)).is_none());
    }

    #[tokio::test]
    async fn test_run_step_maps_provider_failure_to_generic_notice() {
        let provider = Arc::new(ScriptedProvider::failing("unreachable"));
        let interpreter = Interpreter::new(provider, CompletionOptions::default());
        let store = SledListingStore::temporary("Recommendation").unwrap();
        let state = AppState::new(PropertySearch::new(interpreter, Arc::new(store)), 40);

        let mut session = Session::default();
        let notice = run_step(&state, &mut session, "a flat").await;
        assert_eq!(notice, Some(Notice::Error(UNPROCESSABLE_MESSAGE.to_string())));
    }
}
