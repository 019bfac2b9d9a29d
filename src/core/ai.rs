// llm integration - turns plain english into sql, and rows back into english

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Error;
use crate::config::LlmConfig;
use crate::core::QueryResult;
use crate::core::db::Dialect;
use crate::core::history::{ChatMessage, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[value(name = "openai")]
    OpenAi,
    Claude,
}

impl Provider {
    pub fn default_model(self) -> &'static str {
        match self {
            Provider::OpenAi => "gpt-4o-mini",
            Provider::Claude => "claude-sonnet-4-20250514",
        }
    }

    fn default_base(self) -> &'static str {
        match self {
            Provider::OpenAi => "https://api.openai.com/v1",
            Provider::Claude => "https://api.anthropic.com/v1",
        }
    }

    fn key_vars(self) -> &'static [&'static str] {
        match self {
            Provider::OpenAi => &["OPENAI_API_KEY"],
            Provider::Claude => &["ANTHROPIC_API_KEY", "CLAUDE_API_KEY", "CLAUDE_KEY"],
        }
    }

    fn key_hint(self) -> &'static str {
        match self {
            Provider::OpenAi => "OPENAI_API_KEY",
            Provider::Claude => "ANTHROPIC_API_KEY, CLAUDE_API_KEY, or CLAUDE_KEY",
        }
    }
}

pub struct Ai {
    client: reqwest::Client,
    provider: Provider,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_retries: u32,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

// openai chat completions
#[derive(Serialize)]
struct OpenAiRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

// anthropic messages
#[derive(Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    text: String,
}

// explicit key first, then the provider's usual env vars
fn resolve_key(
    provider: Provider,
    explicit: Option<String>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, Error> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(key);
    }
    provider
        .key_vars()
        .iter()
        .find_map(|var| lookup(var).filter(|k| !k.is_empty()))
        .ok_or(Error::MissingApiKey(provider.key_hint()))
}

// whether a failed call is worth repeating
enum Failure {
    Transient(Error),
    Fatal(Error),
}

impl Ai {
    pub fn new(config: &LlmConfig, api_key: Option<String>) -> Result<Self, Error> {
        let provider = config.provider;

        let api_key = resolve_key(provider, api_key, |var| std::env::var(var).ok())?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            provider,
            api_key,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| provider.default_model().to_string()),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| provider.default_base().to_string())
                .trim_end_matches('/')
                .to_string(),
            temperature: config.temperature,
            max_retries: config.max_retries,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_sql(
        &self,
        prompt: &str,
        schema: &str,
        dialect: Dialect,
        history: &[ChatMessage],
        max_rows: usize,
    ) -> Result<String, Error> {
        let system = sql_system_prompt(schema, dialect, max_rows);
        let sql = self.complete(&system, history, prompt).await?;
        Ok(strip_fences(&sql))
    }

    pub async fn summarize(
        &self,
        question: &str,
        sql: &str,
        result: &QueryResult,
    ) -> Result<String, Error> {
        let rows = serde_json::to_string(result)?;
        let content = format!("Question: {question}\n\nSQL: {sql}\n\nRows (JSON): {rows}");
        let answer = self.complete(SUMMARY_PROMPT, &[], &content).await?;
        Ok(answer.trim().to_string())
    }

    async fn complete(
        &self,
        system: &str,
        history: &[ChatMessage],
        prompt: &str,
    ) -> Result<String, Error> {
        let messages = build_messages(history, prompt);
        let mut attempt = 0;

        loop {
            match self.send(system, &messages).await {
                Ok(text) => return Ok(text),
                Err(Failure::Transient(e)) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(attempt, error = %e, "llm call failed, retrying");
                    tokio::time::sleep(Duration::from_millis(500 * attempt as u64)).await;
                }
                Err(Failure::Transient(e)) | Err(Failure::Fatal(e)) => return Err(e),
            }
        }
    }

    async fn send(&self, system: &str, messages: &[Message<'_>]) -> Result<String, Failure> {
        let request = match self.provider {
            Provider::OpenAi => {
                let mut all = Vec::with_capacity(messages.len() + 1);
                all.push(Message {
                    role: "system",
                    content: system,
                });
                all.extend(messages.iter().map(|m| Message {
                    role: m.role,
                    content: m.content,
                }));

                self.client
                    .post(format!("{}/chat/completions", self.base_url))
                    .bearer_auth(&self.api_key)
                    .json(&OpenAiRequest {
                        model: &self.model,
                        temperature: self.temperature,
                        max_tokens: 1024,
                        messages: all,
                    })
            }
            Provider::Claude => self
                .client
                .post(format!("{}/messages", self.base_url))
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&ClaudeRequest {
                    model: &self.model,
                    max_tokens: 1024,
                    temperature: self.temperature,
                    system,
                    messages: messages
                        .iter()
                        .map(|m| Message {
                            role: m.role,
                            content: m.content,
                        })
                        .collect(),
                }),
        };

        debug!(model = %self.model, "calling llm");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                Failure::Transient(e.into())
            } else {
                Failure::Fatal(e.into())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Error::Ai(format!("{status}: {body}"));
            return Err(if status.as_u16() == 429 || status.is_server_error() {
                Failure::Transient(err)
            } else {
                Failure::Fatal(err)
            });
        }

        let text = match self.provider {
            Provider::OpenAi => {
                let r: OpenAiResponse = response.json().await.map_err(|e| Failure::Fatal(e.into()))?;
                r.choices.into_iter().next().and_then(|c| c.message.content)
            }
            Provider::Claude => {
                let r: ClaudeResponse = response.json().await.map_err(|e| Failure::Fatal(e.into()))?;
                r.content.into_iter().next().map(|c| c.text)
            }
        };

        text.ok_or_else(|| Failure::Fatal(Error::Ai("empty response".into())))
    }
}

// history plus the new question; a conversation must open with the user
fn build_messages<'a>(history: &'a [ChatMessage], prompt: &'a str) -> Vec<Message<'a>> {
    history
        .iter()
        .skip_while(|m| m.role == Role::Assistant)
        .map(|m| Message {
            role: m.role.as_str(),
            content: &m.content,
        })
        .chain(std::iter::once(Message {
            role: "user",
            content: prompt,
        }))
        .collect()
}

// models sometimes wrap sql in markdown code blocks
pub fn strip_fences(text: &str) -> String {
    text.trim()
        .trim_start_matches("```sql")
        .trim_start_matches("```SQL")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim()
        .to_string()
}

const SUMMARY_PROMPT: &str = r#"You are a Dubai real estate assistant.
Answer the user's question using only the rows provided.
- Mention prices in AED with thousands separators
- List matching properties one per line with type, location, bedrooms, price and possession
- If there are no rows, say that no matching properties were found
- Never mention SQL, tables, or JSON"#;

fn sql_system_prompt(schema: &str, dialect: Dialect, max_rows: usize) -> String {
    let dialect = dialect.name();
    format!(
        r#"You are a SQL query generator for a Dubai real estate search. Given a natural language request, generate one valid {dialect} query.

Database schema:
{schema}

Rules:
- Output ONLY the SQL query, no explanations or markdown
- Generate exactly one read-only SELECT statement
- If the request asks to add, change, or delete data, output only the word BLOCKED
- Be precise with table and column names from the schema
- price is in AED: "3 million" or "3M" means 3000000
- Match location and type case-insensitively, e.g. LOWER(location) LIKE '%marina%'
- JVC is Jumeirah Village Circle, JBR is Jumeirah Beach Residence, JLT is Jumeirah Lake Towers
- "ready" means possession = 'Ready'
- For aggregates over price, cast the result to BIGINT
- Order listings by price unless another order is requested
- Add LIMIT {max_rows} if no smaller limit is requested"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markdown() {
        assert_eq!(strip_fences("```sql\nSELECT 1\n```"), "SELECT 1");
        assert_eq!(strip_fences("```\nSELECT 1\n```  "), "SELECT 1");
        assert_eq!(strip_fences("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn messages_open_with_user() {
        let history = vec![
            ChatMessage::assistant("welcome"),
            ChatMessage::user("villas in Meydan"),
            ChatMessage::assistant("Found 2 matching properties:"),
        ];
        let msgs = build_messages(&history, "only the cheaper one");
        let roles: Vec<_> = msgs.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
        assert_eq!(msgs[2].content, "only the cheaper one");
    }

    #[test]
    fn prompt_mentions_schema_and_limit() {
        let p = sql_system_prompt("TABLE properties (\n  id integer\n)", Dialect::Postgres, 50);
        assert!(p.contains("PostgreSQL"));
        assert!(p.contains("TABLE properties"));
        assert!(p.contains("LIMIT 50"));
    }

    #[test]
    fn explicit_key_and_overrides() {
        let config = LlmConfig {
            provider: Provider::Claude,
            model: None,
            api_base: Some("http://localhost:9999/v1/".into()),
            temperature: 0.0,
            timeout_seconds: 5,
            max_retries: 0,
        };
        let ai = Ai::new(&config, Some("k".into())).unwrap();
        assert_eq!(ai.model(), "claude-sonnet-4-20250514");
        assert_eq!(ai.base_url, "http://localhost:9999/v1");
    }

    #[test]
    fn key_lookup_order() {
        let none = |_: &str| None;
        let err = resolve_key(Provider::Claude, None, none).unwrap_err();
        assert!(matches!(err, Error::MissingApiKey(hint) if hint.contains("CLAUDE_KEY")));

        // empty values count as unset
        let err = resolve_key(Provider::OpenAi, Some(String::new()), |_| Some(String::new()));
        assert!(matches!(err, Err(Error::MissingApiKey("OPENAI_API_KEY"))));

        let env = |var: &str| (var == "CLAUDE_API_KEY").then(|| "from-env".to_string());
        assert_eq!(resolve_key(Provider::Claude, None, env).unwrap(), "from-env");
        assert_eq!(
            resolve_key(Provider::Claude, Some("flag".into()), env).unwrap(),
            "flag"
        );
        assert!(resolve_key(Provider::OpenAi, None, env).is_err());
    }
}
