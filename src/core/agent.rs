// question -> guard -> sql -> safety -> rows -> answer

use serde::Serialize;
use tracing::{info, warn};

use crate::Error;
use crate::config::AgentConfig;
use crate::core::answer;
use crate::core::history::{self, ChatMessage};
use crate::core::topic::{OFF_TOPIC_REPLY, Topic};
use crate::core::{Ai, Db, QueryResult, Safety};

pub struct Agent {
    db: Db,
    ai: Ai,
    schema: String,
    config: AgentConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub response: String,
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<QueryResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl Reply {
    fn off_topic() -> Self {
        Self {
            response: OFF_TOPIC_REPLY.to_string(),
            sql: None,
            result: None,
            warning: None,
        }
    }
}

impl Agent {
    pub fn new(db: Db, ai: Ai, schema: String, config: AgentConfig) -> Self {
        Self {
            db,
            ai,
            schema,
            config,
        }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn history_limit(&self) -> usize {
        self.config.history_limit
    }

    pub async fn ask(
        &self,
        query: &str,
        history: &[ChatMessage],
        dry_run: bool,
    ) -> Result<Reply, Error> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::EmptyQuery);
        }

        if !Topic::is_relevant(query) {
            info!(query, "off-topic query rejected");
            return Ok(Reply::off_topic());
        }

        let history = history::trim(history, self.config.history_limit);
        let sql = self
            .ai
            .generate_sql(
                query,
                &self.schema,
                self.db.dialect(),
                history,
                self.config.max_rows,
            )
            .await?;

        let safety = Safety::check(&sql, self.db.dialect());
        if safety.is_dangerous {
            warn!(sql = %sql, reason = %safety.reason, "generated sql blocked");
            return Err(Error::Blocked {
                sql,
                reason: safety.reason,
            });
        }

        if dry_run {
            return Ok(Reply {
                response: "Generated SQL (not executed).".to_string(),
                sql: Some(sql),
                result: None,
                warning: safety.warning,
            });
        }

        let mut result = self.db.execute(&sql).await?;
        let mut warning = safety.warning;
        if result.truncate(self.config.max_rows) {
            warning = Some(format!("showing the first {} rows", self.config.max_rows));
        }

        let response = if self.config.summarize && !result.rows.is_empty() {
            match self.ai.summarize(query, &sql, &result).await {
                Ok(text) if !text.is_empty() => text,
                Ok(_) => answer::compose(&result),
                Err(e) => {
                    warn!(error = %e, "summary failed, listing rows instead");
                    answer::compose(&result)
                }
            }
        } else {
            answer::compose(&result)
        };

        Ok(Reply {
            response: answer::with_follow_up(response),
            sql: Some(sql),
            result: Some(result),
            warning,
        })
    }
}
