// http server mode - the property search api

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use std::sync::Arc;
use std::time::Instant;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::api::{
    DEFAULT_SESSION, EXAMPLES, ErrorResponse, ExamplesResponse, HealthResponse, QueryRequest,
    QueryResponse,
};
use crate::config::Config;
use crate::core::history::SessionStore;
use crate::core::seed;
use crate::{Agent, Ai, Db, Error};

const GENERIC_ERROR: &str = "Sorry, something went wrong while processing your request.";

struct AppState {
    agent: Agent,
    sessions: SessionStore,
    debug: bool,
}

pub struct Server;

impl Server {
    pub async fn run(db_url: &str, config: &Config, api_key: Option<String>) -> Result<(), Error> {
        // fail on a missing key before touching the database
        let ai = Ai::new(&config.llm, api_key)?;

        let db = Db::connect(db_url).await?;
        info!(dialect = db.dialect_name(), database = db.database(), "database connected");

        if config.seed.enabled {
            let report = seed::populate(&db, config.seed.rows, false, None).await?;
            info!(existing = report.existing, inserted = report.inserted, "properties ready");
        } else {
            seed::ensure_table(&db).await?;
        }

        let schema = db.schema().await?;
        info!(model = ai.model(), "llm ready");

        let agent = Agent::new(db, ai, schema, config.agent.clone());
        let app = Self::router(agent, config.server.debug);

        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!("server running at http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| Error::Server(e.to_string()))?;

        info!("server stopped");
        Ok(())
    }

    pub fn router(agent: Agent, debug: bool) -> Router {
        let sessions = SessionStore::new(agent.history_limit().max(2) * 2);
        let state = Arc::new(AppState {
            agent,
            sessions,
            debug,
        });

        Router::new()
            .route("/health", get(health))
            .route("/query", post(query))
            .route("/schema", get(get_schema))
            .route("/examples", get(examples))
            .route("/sessions/{id}", delete(clear_session))
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // no signal handler, run until killed
        std::future::pending::<()>().await;
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_connected = state.agent.db().ping().await;
    Json(HealthResponse {
        status: if db_connected { "healthy" } else { "degraded" }.to_string(),
        db_connected,
    })
}

async fn get_schema(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "schema": state.agent.schema() }))
}

async fn examples() -> Json<ExamplesResponse> {
    Json(ExamplesResponse {
        examples: EXAMPLES.iter().map(|e| e.to_string()).collect(),
    })
}

async fn clear_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let cleared = state.sessions.clear(&id).await;
    Json(serde_json::json!({ "cleared": cleared }))
}

async fn query(State(state): State<Arc<AppState>>, Json(req): Json<QueryRequest>) -> Response {
    let start = Instant::now();
    let session = req.session_id.as_deref().unwrap_or(DEFAULT_SESSION);

    info!(query = %req.query, session, "query received");

    let history = if req.history.is_empty() {
        state.sessions.get(session).await
    } else {
        req.history.clone()
    };

    match state.agent.ask(&req.query, &history, req.dry_run).await {
        Ok(reply) => {
            let elapsed_ms = start.elapsed().as_millis() as u64;
            info!(elapsed_ms, sql = ?reply.sql, "query processed");

            if reply.sql.is_some() && !req.dry_run {
                state
                    .sessions
                    .record(session, req.query.trim(), &reply.response)
                    .await;
            }

            Json(QueryResponse {
                response: reply.response,
                sql: reply.sql,
                result: reply.result,
                warning: reply.warning,
                elapsed_ms,
            })
            .into_response()
        }
        Err(Error::EmptyQuery) => failure(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: Error::EmptyQuery.to_string(),
                details: None,
                sql: None,
            },
        ),
        Err(Error::Blocked { sql, reason }) => failure(
            StatusCode::BAD_REQUEST,
            ErrorResponse {
                error: format!("blocked: {reason}"),
                details: None,
                sql: Some(sql),
            },
        ),
        Err(e) => {
            error!(error = %e, "error during query processing");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: GENERIC_ERROR.to_string(),
                    details: state.debug.then(|| e.to_string()),
                    sql: None,
                },
            )
        }
    }
}

fn failure(status: StatusCode, body: ErrorResponse) -> Response {
    (status, Json(body)).into_response()
}
