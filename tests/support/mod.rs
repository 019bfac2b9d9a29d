// shared helpers: fake openai and anthropic endpoints and a seeded sqlite file

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::post,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use estateql::config::{AgentConfig, LlmConfig};
use estateql::core::seed;
use estateql::{Agent, Ai, Db, Provider};

/// Maps (system prompt, last user message) to a reply text or an http status.
pub type Responder = Arc<dyn Fn(&str, &str) -> Result<String, u16> + Send + Sync>;

#[derive(Clone)]
struct MockState {
    responder: Responder,
    requests: Arc<Mutex<Vec<Value>>>,
    meta: Arc<Mutex<Vec<Value>>>,
}

pub struct MockLlm {
    pub url: String,
    pub requests: Arc<Mutex<Vec<Value>>>,
    meta: Arc<Mutex<Vec<Value>>>,
}

impl MockLlm {
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, i: usize) -> Value {
        self.requests.lock().unwrap()[i].clone()
    }

    /// Path and auth headers of the i-th call.
    pub fn meta(&self, i: usize) -> Value {
        self.meta.lock().unwrap()[i].clone()
    }
}

pub async fn mock_llm(
    responder: impl Fn(&str, &str) -> Result<String, u16> + Send + Sync + 'static,
) -> MockLlm {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let meta = Arc::new(Mutex::new(Vec::new()));
    let state = MockState {
        responder: Arc::new(responder),
        requests: requests.clone(),
        meta: meta.clone(),
    };

    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/v1/messages", post(messages))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockLlm {
        url: format!("http://{addr}/v1"),
        requests,
        meta,
    }
}

impl MockState {
    fn record(&self, uri: &Uri, headers: &HeaderMap, body: &Value) {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        self.meta.lock().unwrap().push(json!({
            "path": uri.path(),
            "authorization": header("authorization"),
            "x-api-key": header("x-api-key"),
            "anthropic-version": header("anthropic-version"),
        }));
        self.requests.lock().unwrap().push(body.clone());
    }
}

fn failure(code: u16) -> Response {
    (StatusCode::from_u16(code).unwrap(), "mock failure").into_response()
}

async fn completions(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&uri, &headers, &body);

    let messages = body["messages"].as_array().cloned().unwrap_or_default();
    let system = messages
        .first()
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();
    let user = messages
        .last()
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    match (state.responder)(&system, &user) {
        Ok(text) => Json(json!({
            "choices": [{ "message": { "role": "assistant", "content": text } }]
        }))
        .into_response(),
        Err(code) => failure(code),
    }
}

// anthropic keeps the system prompt outside the message list
async fn messages(
    State(state): State<MockState>,
    uri: Uri,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    state.record(&uri, &headers, &body);

    let system = body["system"].as_str().unwrap_or_default().to_string();
    let user = body["messages"]
        .as_array()
        .and_then(|m| m.last())
        .and_then(|m| m["content"].as_str())
        .unwrap_or_default()
        .to_string();

    match (state.responder)(&system, &user) {
        Ok(text) => Json(json!({
            "id": "msg_mock",
            "type": "message",
            "role": "assistant",
            "content": [{ "type": "text", "text": text }],
        }))
        .into_response(),
        Err(code) => failure(code),
    }
}

pub fn is_sql_prompt(system: &str) -> bool {
    system.contains("SQL query generator")
}

/// A sqlite file in a temp dir; keep the dir alive as long as the db.
pub struct TempDb {
    pub dir: TempDir,
    pub url: String,
}

pub fn temp_db() -> TempDb {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}?mode=rwc", dir.path().join("props.db").display());
    TempDb { dir, url }
}

pub async fn seeded_db(url: &str, rows: usize) -> Db {
    let db = Db::connect(url).await.unwrap();
    seed::populate(&db, rows, false, Some(7)).await.unwrap();
    db
}

pub fn llm_config(url: &str, max_retries: u32) -> LlmConfig {
    LlmConfig {
        provider: Provider::OpenAi,
        model: None,
        api_base: Some(url.to_string()),
        temperature: 0.0,
        timeout_seconds: 5,
        max_retries,
    }
}

pub async fn agent(db_url: &str, llm_url: &str, summarize: bool) -> Agent {
    agent_with(
        db_url,
        llm_url,
        AgentConfig {
            history_limit: 10,
            max_rows: 100,
            summarize,
        },
    )
    .await
}

pub async fn agent_with(db_url: &str, llm_url: &str, config: AgentConfig) -> Agent {
    let db = seeded_db(db_url, 200).await;
    let schema = db.schema().await.unwrap();
    let ai = Ai::new(&llm_config(llm_url, 0), Some("test-key".into())).unwrap();

    Agent::new(db, ai, schema, config)
}

/// Answers sql prompts with `canned_sql`; summaries are refused.
pub fn sql_only(system: &str, user: &str) -> Result<String, u16> {
    if is_sql_prompt(system) {
        Ok(canned_sql(user))
    } else {
        Err(400)
    }
}

pub const MARINA_SQL: &str = "```sql\nSELECT location, price, type, bedrooms, available, possession \
FROM properties WHERE id <= 15 AND location = 'Dubai Marina' AND type = 'Apartment' AND bedrooms = 2 LIMIT 5\n```";

pub const MARINA_ANSWER: &str =
    "Found 1 matching property:\n1. Apartment in Dubai Marina · 2 bedrooms · 2,450,000 AED · Ready";

/// SQL for the common test questions; anything else is treated as a write.
pub fn canned_sql(user: &str) -> String {
    let q = user.to_lowercase();
    if q.contains("marina") {
        MARINA_SQL.to_string()
    } else if q.contains("under 1 aed") {
        "SELECT * FROM properties WHERE price < 1 LIMIT 10".to_string()
    } else if q.contains("delete") {
        "DELETE FROM properties WHERE type = 'Villa'".to_string()
    } else if q.contains("count") {
        "SELECT COUNT(*) AS listings FROM properties".to_string()
    } else if q.contains("every") {
        "SELECT id, location FROM properties ORDER BY id LIMIT 50".to_string()
    } else {
        "BLOCKED".to_string()
    }
}
