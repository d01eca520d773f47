//! Pass-through HTTP calls to the deployed Crow and GraphQL services.

use crate::error::{DeployError, Result};
use crate::summary::tail_chars;
use reqwest::{Client, Url};
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const MALFORMED_EXCERPT_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayResponse {
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct HttpRelay {
    client: Client,
    crow_base: Url,
    graphql: Url,
}

impl HttpRelay {
    pub fn new(crow_base_url: &str, graphql_url: &str) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            crow_base: parse_url("Crow base URL", crow_base_url)?,
            graphql: parse_url("GraphQL URL", graphql_url)?,
        })
    }

    pub fn commit_url(&self) -> Result<Url> {
        self.crow_url(&["v1", "transactions", "commit"])
    }

    /// `<crow>/v1/transactions/<id>`; the id is encoded as a single path segment.
    pub fn transaction_url(&self, transaction_id: &str) -> Result<Url> {
        self.crow_url(&["v1", "transactions", transaction_id])
    }

    pub async fn commit_transaction(
        &self,
        transaction_id: &str,
        value: &str,
        cancel: &CancellationToken,
    ) -> Result<RelayResponse> {
        let payload = json!({ "id": transaction_id, "value": value });
        self.post_json(self.commit_url()?, &payload, cancel).await
    }

    pub async fn get_transaction(
        &self,
        transaction_id: &str,
        cancel: &CancellationToken,
    ) -> Result<RelayResponse> {
        self.get_json(self.transaction_url(transaction_id)?, cancel)
            .await
    }

    /// POST a GraphQL request; the body must be JSON.
    pub async fn graphql(
        &self,
        query: &str,
        variables: &Value,
        cancel: &CancellationToken,
    ) -> Result<(u16, Value)> {
        let payload = json!({ "query": query, "variables": variables });
        let response = self.post_json(self.graphql.clone(), &payload, cancel).await?;
        let parsed = serde_json::from_str(&response.body).map_err(|err| {
            DeployError::relay(format!(
                "malformed response (status {}): {err}; body: {}",
                response.status,
                tail_chars(&response.body, MALFORMED_EXCERPT_CHARS)
            ))
        })?;
        Ok((response.status, parsed))
    }

    pub async fn post_json(
        &self,
        url: Url,
        payload: &Value,
        cancel: &CancellationToken,
    ) -> Result<RelayResponse> {
        log::debug!("POST {url}");
        let request = self.client.post(url).json(payload);
        send(request, cancel).await
    }

    pub async fn get_json(&self, url: Url, cancel: &CancellationToken) -> Result<RelayResponse> {
        log::debug!("GET {url}");
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json");
        send(request, cancel).await
    }

    fn crow_url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.crow_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                DeployError::relay(format!("Crow base URL {} cannot carry a path", self.crow_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

async fn send(request: reqwest::RequestBuilder, cancel: &CancellationToken) -> Result<RelayResponse> {
    let exchange = async {
        let response = request.send().await.map_err(|err| relay_error(&err))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|err| relay_error(&err))?;
        Ok(RelayResponse { status, body })
    };
    tokio::select! {
        result = exchange => result,
        _ = cancel.cancelled() => Err(DeployError::relay("request cancelled by caller")),
    }
}

fn relay_error(err: &reqwest::Error) -> DeployError {
    // reqwest's Display omits the root cause ("error sending request"); include the chain.
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    DeployError::relay(message)
}

fn parse_url(label: &str, raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|err| DeployError::relay(format!("Invalid {label} {raw:?}: {err}")))
}
