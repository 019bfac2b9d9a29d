// http wire types, shared by the server and the chat client

use serde::{Deserialize, Serialize};

use crate::core::QueryResult;
use crate::core::history::ChatMessage;

pub const EXAMPLES: &[&str] = &[
    "2 bedroom apartments in Dubai Marina under 3 million AED",
    "Luxury villas in Palm Jumeirah above 25 million",
    "3 bed townhouse ready possession Dubai Hills Estate",
    "Cheapest 1 bedroom in JVC",
    "Penthouses in Downtown Dubai",
    "Villas in Emirates Hills with 5+ bedrooms",
];

pub const DEFAULT_SESSION: &str = "default";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    /// Prior turns; when empty the server uses the session's memory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub history: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub response: String,
    pub sql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
    #[serde(default)]
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub db_connected: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExamplesResponse {
    pub examples: Vec<String>,
}
