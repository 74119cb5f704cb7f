//! HTTP client for the wallet node backend.
//!
//! This module provides:
//!
//! - `BackendClient`: reqwest wrapper configured once with the headers and
//!   cookie policy every request shares
//! - Deserialized response bodies for each backend route
//! - `FetchError`: the failure taxonomy (transport, protocol, decode)
//!
//! The two polling endpoints (`/status`, `/balance`) are what the dashboard
//! consumes; the remaining routes back the one-shot CLI commands.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::BackendConfig;

/// User agent for API requests
const USER_AGENT: &str = concat!("walletdash/", env!("CARGO_PKG_VERSION"));

/// Backend routes this client knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Status,
    Balance,
    Logs,
    ActiveNodes,
    Transaction,
    ConnectNode,
    Disconnect,
    ReconnectNode,
}

impl Endpoint {
    /// URL path relative to the base address
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Status => "/status",
            Endpoint::Balance => "/balance",
            Endpoint::Logs => "/logs",
            Endpoint::ActiveNodes => "/active_nodes",
            Endpoint::Transaction => "/transaction",
            Endpoint::ConnectNode => "/connect_node",
            Endpoint::Disconnect => "/disconnect",
            Endpoint::ReconnectNode => "/reconnect_node",
        }
    }

    /// Human-readable name used in error messages
    pub fn description(&self) -> &'static str {
        match self {
            Endpoint::Status => "node status",
            Endpoint::Balance => "balance data",
            Endpoint::Logs => "node logs",
            Endpoint::ActiveNodes => "active nodes",
            Endpoint::Transaction => "transaction",
            Endpoint::ConnectNode => "node connection",
            Endpoint::Disconnect => "disconnect",
            Endpoint::ReconnectNode => "node reconnection",
        }
    }
}

/// Broad category of a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Network unreachable, connection reset, timeout
    Transport,
    /// Server answered with a non-2xx status
    Protocol,
    /// Body was not valid JSON or lacked expected fields
    Decode,
    /// Rejected locally before anything was sent
    InvalidRequest,
}

/// Errors that can occur while talking to the backend
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to fetch {}: {source}", .endpoint.description())]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "Failed to fetch {}: {}{}",
        .endpoint.description(),
        .status.as_u16(),
        detail_suffix(.detail)
    )]
    Status {
        endpoint: Endpoint,
        status: StatusCode,
        detail: Option<String>,
    },

    #[error("Failed to decode {}: {source}", .endpoint.description())]
    Decode {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    match detail {
        Some(d) => format!(" ({})", d),
        None => String::new(),
    }
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Transport { .. } => FailureKind::Transport,
            FetchError::Status { .. } => FailureKind::Protocol,
            FetchError::Decode { .. } => FailureKind::Decode,
            FetchError::InvalidRequest(_) => FailureKind::InvalidRequest,
        }
    }

    /// True if the request never left (or never came back) because of a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Transport { source, .. } if source.is_timeout())
    }
}

/// `GET /status`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    pub active: bool,
}

/// `GET /balance`
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    pub balance: f64,
}

/// A peer as reported by the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    #[serde(rename = "IP")]
    pub ip: String,
    #[serde(rename = "Port")]
    pub port: u16,
}

#[derive(Debug, Deserialize)]
struct ActiveNodesResponse {
    active_nodes: Vec<NodeInfo>,
}

/// Transaction accepted by the node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionReceipt {
    pub amount: u64,
    pub payer: String,
    /// Recipient's receiver port
    pub payee: u16,
}

/// Generic `{ "message": ... }` acknowledgement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Serialize)]
struct TransactionRequest<'a> {
    recipient_ip: &'a str,
    amount: u64,
}

#[derive(Serialize)]
struct ConnectRequest<'a> {
    address: &'a str,
    port: u16,
}

/// Wallet node API client
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client for the backend described by `config`.
    ///
    /// Every request carries a JSON content type and, unless disabled, a
    /// `DNT: 1` header. Cookies set by the backend are stored and replayed.
    pub fn new(config: &BackendConfig) -> anyhow::Result<Self> {
        let client = Self::build(
            &config.base_url(),
            Duration::from_secs(config.request_timeout_secs),
            config.do_not_track,
        )?;
        Ok(client)
    }

    fn build(base_url: &str, timeout: Duration, do_not_track: bool) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if do_not_track {
            headers.insert("dnt", HeaderValue::from_static("1"));
        }

        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .cookie_store(true)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Client against an arbitrary base URL, for tests
    #[cfg(test)]
    pub fn for_url(base_url: &str, timeout: Duration) -> Self {
        Self::build(base_url, timeout, true).expect("Failed to create HTTP client")
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    /// Send a request and decode a successful body as `T`.
    async fn request<T, B>(
        &self,
        method: Method,
        endpoint: Endpoint,
        body: Option<&B>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let url = self.url(endpoint);
        tracing::debug!("{} {}", method, url);

        let mut builder = self.client.request(method, &url);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        let status = response.status();
        if !status.is_success() {
            // Body only adds detail; a broken body must not hide the status
            let detail = response
                .bytes()
                .await
                .ok()
                .and_then(|bytes| serde_json::from_slice::<ErrorBody>(&bytes).ok())
                .map(|b| b.error);
            return Err(FetchError::Status {
                endpoint,
                status,
                detail,
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|source| FetchError::Transport { endpoint, source })?;

        serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode { endpoint, source })
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: Endpoint) -> Result<T, FetchError> {
        self.request::<T, ()>(Method::GET, endpoint, None).await
    }

    /// Fetch node connectivity
    pub async fn get_status(&self) -> Result<StatusResponse, FetchError> {
        self.get(Endpoint::Status).await
    }

    /// Fetch account balance
    pub async fn get_balance(&self) -> Result<BalanceResponse, FetchError> {
        self.get(Endpoint::Balance).await
    }

    /// Fetch the backend's recent log lines
    pub async fn get_logs(&self) -> Result<Vec<String>, FetchError> {
        self.get(Endpoint::Logs).await
    }

    /// Fetch peers currently registered with the tracker
    pub async fn get_active_nodes(&self) -> Result<Vec<NodeInfo>, FetchError> {
        let response: ActiveNodesResponse = self.get(Endpoint::ActiveNodes).await?;
        Ok(response.active_nodes)
    }

    /// Submit a transfer to another node
    pub async fn send_transaction(
        &self,
        recipient_ip: &str,
        amount: u64,
    ) -> Result<TransactionReceipt, FetchError> {
        if amount == 0 {
            return Err(FetchError::InvalidRequest(
                "amount must be greater than zero".to_string(),
            ));
        }
        if recipient_ip.trim().is_empty() {
            return Err(FetchError::InvalidRequest(
                "recipient IP must not be empty".to_string(),
            ));
        }

        let body = TransactionRequest {
            recipient_ip,
            amount,
        };
        self.request(Method::POST, Endpoint::Transaction, Some(&body)).await
    }

    /// Ask the backend to register a node with the tracker
    pub async fn connect_node(
        &self,
        address: &str,
        port: u16,
    ) -> Result<MessageResponse, FetchError> {
        let body = ConnectRequest { address, port };
        self.request(Method::POST, Endpoint::ConnectNode, Some(&body)).await
    }

    /// Take the node offline
    pub async fn disconnect(&self) -> Result<MessageResponse, FetchError> {
        self.request::<_, ()>(Method::POST, Endpoint::Disconnect, None).await
    }

    /// Bring a disconnected node back online
    pub async fn reconnect(&self) -> Result<MessageResponse, FetchError> {
        self.request::<_, ()>(Method::POST, Endpoint::ReconnectNode, None).await
    }
}
