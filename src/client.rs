// http client for the api, used by the chat ui

use std::time::Duration;

use crate::Error;
use crate::api::{ErrorResponse, ExamplesResponse, HealthResponse, QueryRequest, QueryResponse};

pub struct Backend {
    client: reqwest::Client,
    base_url: String,
}

impl Backend {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthResponse, Error> {
        let response = self
            .client
            .get(format!("{}/health", self.base_url))
            .timeout(Duration::from_secs(4))
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json().await?)
    }

    pub async fn examples(&self) -> Result<Vec<String>, Error> {
        let response: ExamplesResponse = self
            .client
            .get(format!("{}/examples", self.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(response.examples)
    }

    pub async fn query(&self, request: &QueryRequest) -> Result<QueryResponse, Error> {
        let response = self
            .client
            .post(format!("{}/query", self.base_url))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        // error bodies carry a message worth showing
        let status = response.status();
        let text = response.text().await?;
        let message = match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => match body.details {
                Some(details) => format!("{} ({details})", body.error),
                None => body.error,
            },
            Err(_) => format!("{status}: {text}"),
        };
        Err(Error::Server(message))
    }

    pub async fn clear_session(&self, id: &str) -> Result<(), Error> {
        self.client
            .delete(format!("{}/sessions/{id}", self.base_url))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
