use crate::error::{classify_connection_error, ConnectionError};
use async_trait::async_trait;
use jsonrpsee::{
    core::{client::ClientT, params::ObjectParams, ClientError},
    http_client::{HttpClient, HttpClientBuilder},
    ws_client::{WsClient, WsClientBuilder},
};
use log::{debug, info, warn};
use serde_json::{Map, Value};
use std::{sync::Arc, time::Duration};
use tokio::sync::RwLock;
use url::Url;

/// A JSON-RPC connection to a node.
///
/// Every failure is returned already classified, so retry policies can match on the kind.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Call `method` with named `params` and return the raw `result`.
    async fn call(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ConnectionError>;
}

/// Classify a jsonrpsee error by its rendered text.
fn classify_client_error(e: ClientError) -> ConnectionError {
    classify_connection_error(&e.to_string())
}

/// Opens the clients held by a [`Reconnecting`] slot.
#[async_trait]
trait Connector: Send + Sync {
    /// Client handed out to callers.
    type Client: Send + Sync;

    /// Open a new client.
    async fn connect(&self) -> Result<Self::Client, ConnectionError>;

    /// Whether `client` can still serve requests.
    fn is_connected(&self, client: &Self::Client) -> bool;
}

/// Settings a WebSocket client is (re)built from.
struct WsConnector {
    /// `ws://` or `wss://` endpoint.
    url: Url,
    /// Connection and per-request timeout.
    timeout: Duration,
    /// Largest response accepted, in bytes.
    max_response_size: u32,
}

#[async_trait]
impl Connector for WsConnector {
    type Client = WsClient;

    async fn connect(&self) -> Result<WsClient, ConnectionError> {
        WsClientBuilder::default()
            .request_timeout(self.timeout)
            .connection_timeout(self.timeout)
            .max_response_size(self.max_response_size)
            .build(self.url.as_str())
            .await
            .map_err(classify_client_error)
    }

    fn is_connected(&self, client: &WsClient) -> bool {
        client.is_connected()
    }
}

/// A client slot that is rebuilt once its connection is gone.
///
/// A WebSocket client whose background task stopped fails every later request, so the slot
/// checks the client before handing it out and replaces a dead one.
struct Reconnecting<C: Connector> {
    /// Opens replacement clients.
    connector: C,
    /// The current client.
    client: RwLock<Arc<C::Client>>,
}

impl<C: Connector> Reconnecting<C> {
    /// Open the first client.
    async fn connect(connector: C) -> Result<Self, ConnectionError> {
        let client = connector.connect().await?;
        Ok(Reconnecting {
            connector,
            client: RwLock::new(Arc::new(client)),
        })
    }

    /// A connected client, reconnecting first if the current one is closed.
    async fn client(&self) -> Result<Arc<C::Client>, ConnectionError> {
        let current = self.client.read().await.clone();
        if self.connector.is_connected(&current) {
            return Ok(current);
        }

        let mut slot = self.client.write().await;
        if !self.connector.is_connected(&slot) {
            warn!("rpc connection closed, reconnecting");
            *slot = Arc::new(self.connector.connect().await?);
            info!("rpc connection re-established");
        }
        Ok(slot.clone())
    }
}

/// Client of a [`JsonRpcTransport`], by scheme.
enum Client {
    /// Stateless HTTP client.
    Http(HttpClient),
    /// WebSocket client, reopened when closed.
    Ws(Reconnecting<WsConnector>),
}

/// [`RpcTransport`] over jsonrpsee, speaking HTTP or WebSocket depending on the url scheme.
///
/// WebSocket connections that drop are reopened on the next call.
pub struct JsonRpcTransport {
    /// Underlying client.
    client: Client,
}

impl JsonRpcTransport {
    /// Connect to `url`, applying a per-request `timeout` and a response size limit in bytes.
    pub async fn connect(
        url: &Url,
        timeout: Duration,
        max_response_size: u32,
    ) -> Result<Self, ConnectionError> {
        let client = match url.scheme() {
            "http" | "https" => {
                let client = HttpClientBuilder::default()
                    .request_timeout(timeout)
                    .max_response_size(max_response_size)
                    .build(url.as_str())
                    .map_err(classify_client_error)?;
                Client::Http(client)
            }
            "ws" | "wss" => {
                let connector = WsConnector {
                    url: url.clone(),
                    timeout,
                    max_response_size,
                };
                Client::Ws(Reconnecting::connect(connector).await?)
            }
            scheme => {
                return Err(ConnectionError::Generic {
                    message: format!("unsupported rpc url scheme {scheme}"),
                })
            }
        };
        Ok(JsonRpcTransport { client })
    }
}

#[async_trait]
impl RpcTransport for JsonRpcTransport {
    async fn call(
        &self,
        method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ConnectionError> {
        let mut object_params = ObjectParams::new();
        for (name, value) in params {
            object_params
                .insert(&name, value)
                .map_err(|e| classify_connection_error(&e.to_string()))?;
        }

        debug!("calling {method}");
        let result = match &self.client {
            Client::Http(client) => client.request(method, object_params).await,
            Client::Ws(slot) => slot.client().await?.request(method, object_params).await,
        };
        result.map_err(classify_client_error)
    }
}
