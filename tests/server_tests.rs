// http api tests, driven through the router with a fake llm behind it

mod support;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use tower::ServiceExt;

use estateql::config::AgentConfig;
use estateql::core::OFF_TOPIC_REPLY;
use estateql::Server;

use support::{MARINA_ANSWER, is_sql_prompt, mock_llm, sql_only};

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(b) => request
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn ask(app: &Router, body: Value) -> (StatusCode, Value) {
    send(app, "POST", "/query", Some(body)).await
}

#[tokio::test]
async fn test_health() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "healthy", "db_connected": true }));
}

#[tokio::test]
async fn test_examples_and_schema() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = send(&app, "GET", "/examples", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["examples"].as_array().unwrap().len(), 6);

    let (status, body) = send(&app, "GET", "/schema", None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["schema"].as_str().unwrap().contains("TABLE properties"));
}

#[tokio::test]
async fn test_empty_query_rejected() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(&app, json!({ "query": "   " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "query field is required");

    let (status, _) = ask(&app, json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_off_topic_never_reaches_llm() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(&app, json!({ "query": "what's the weather in London?" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], OFF_TOPIC_REPLY);
    assert!(body["sql"].is_null());
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_listing_query() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(
        &app,
        json!({ "query": "2 bedroom apartments in Dubai Marina under 3 million AED" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], MARINA_ANSWER);

    // fences are stripped before execution
    let sql = body["sql"].as_str().unwrap();
    assert!(sql.starts_with("SELECT location"));
    assert!(!sql.contains("```"));

    assert_eq!(body["result"]["row_count"], 1);
    assert!(body.get("warning").is_none());
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_no_results_offers_follow_up() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, true).await, false);

    let (status, body) = ask(&app, json!({ "query": "villa under 1 AED" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "No matching properties found.\n\nWould you like to broaden the search criteria?"
    );

    // nothing to summarize
    assert_eq!(llm.calls(), 1);
}

#[tokio::test]
async fn test_write_sql_blocked() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(&app, json!({ "query": "delete all villas in Dubai" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "blocked: DELETE is not allowed, searches are read-only");
    assert_eq!(body["sql"], "DELETE FROM properties WHERE type = 'Villa'");

    // the table is untouched
    let (_, body) = ask(&app, json!({ "query": "count every property" })).await;
    assert_eq!(body["result"]["rows"][0][0], 200);
}

#[tokio::test]
async fn test_model_refusal_blocked() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(&app, json!({ "query": "make the villa in Meydan mine" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "blocked: the request asks to modify data");
    assert_eq!(body["sql"], "BLOCKED");
}

#[tokio::test]
async fn test_dry_run_skips_execution() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let (status, body) = ask(
        &app,
        json!({ "query": "count every property", "dry_run": true }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Generated SQL (not executed).");
    assert_eq!(body["sql"], "SELECT COUNT(*) AS listings FROM properties");
    assert!(body.get("result").is_none());
    assert!(body["warning"].as_str().unwrap().contains("LIMIT"));
}

#[tokio::test]
async fn test_rows_capped() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let agent = support::agent_with(
        &tmp.url,
        &llm.url,
        AgentConfig {
            history_limit: 10,
            max_rows: 5,
            summarize: false,
        },
    )
    .await;
    let app = Server::router(agent, false);

    let (status, body) = ask(&app, json!({ "query": "list every property" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["row_count"], 5);
    assert_eq!(body["warning"], "showing the first 5 rows");
    assert!(body["response"].as_str().unwrap().starts_with("Found 5 matching properties:"));
}

#[tokio::test]
async fn test_session_memory() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    let first = json!({ "query": "apartments in Dubai Marina", "session_id": "s1" });
    let second = json!({ "query": "same in Dubai Marina but cheaper", "session_id": "s1" });
    ask(&app, first).await;
    ask(&app, second).await;

    // system, user, assistant, user
    let messages = llm.request(1)["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "apartments in Dubai Marina");
    assert_eq!(messages[2]["role"], "assistant");
    assert_eq!(messages[2]["content"], MARINA_ANSWER);

    // other sessions start fresh
    ask(&app, json!({ "query": "Dubai Marina flats", "session_id": "s2" })).await;
    assert_eq!(llm.request(2)["messages"].as_array().unwrap().len(), 2);

    let (status, body) = send(&app, "DELETE", "/sessions/s1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["cleared"], true);

    let (_, body) = send(&app, "DELETE", "/sessions/s1", None).await;
    assert_eq!(body["cleared"], false);
}

#[tokio::test]
async fn test_explicit_history_wins() {
    let tmp = support::temp_db();
    let llm = mock_llm(sql_only).await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);

    ask(&app, json!({ "query": "Dubai Marina apartments" })).await;
    ask(
        &app,
        json!({
            "query": "Dubai Marina again",
            "history": [
                { "role": "user", "content": "villas in Meydan" },
                { "role": "assistant", "content": "No matching properties found." }
            ]
        }),
    )
    .await;

    let messages = llm.request(1)["messages"].as_array().unwrap().clone();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[1]["content"], "villas in Meydan");
}

#[tokio::test]
async fn test_llm_failure_hides_details() {
    let tmp = support::temp_db();
    let llm = mock_llm(|_: &str, _: &str| Err(401)).await;

    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, false);
    let (status, body) = ask(&app, json!({ "query": "villas in Meydan" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Sorry"));
    assert!(body.get("details").is_none());

    let tmp = support::temp_db();
    let app = Server::router(support::agent(&tmp.url, &llm.url, false).await, true);
    let (status, body) = ask(&app, json!({ "query": "villas in Meydan" })).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["details"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_summary_used_when_available() {
    let tmp = support::temp_db();
    let llm = mock_llm(|system: &str, user: &str| {
        if is_sql_prompt(system) {
            Ok(support::canned_sql(user))
        } else {
            Ok("There is one 2 bedroom apartment in Dubai Marina for 2,450,000 AED.".into())
        }
    })
    .await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, true).await, false);

    let (status, body) = ask(&app, json!({ "query": "2 bed in Dubai Marina" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["response"],
        "There is one 2 bedroom apartment in Dubai Marina for 2,450,000 AED."
    );
    assert_eq!(llm.calls(), 2);

    // the summary sees the rows
    let summary = llm.request(1);
    let content = summary["messages"][1]["content"].as_str().unwrap();
    assert!(content.contains("2450000"));
}

#[tokio::test]
async fn test_summary_failure_falls_back_to_listing() {
    let tmp = support::temp_db();
    let llm = mock_llm(|system: &str, user: &str| {
        if is_sql_prompt(system) {
            Ok(support::canned_sql(user))
        } else {
            Err(500)
        }
    })
    .await;
    let app = Server::router(support::agent(&tmp.url, &llm.url, true).await, false);

    let (status, body) = ask(&app, json!({ "query": "2 bed in Dubai Marina" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], MARINA_ANSWER);
}
