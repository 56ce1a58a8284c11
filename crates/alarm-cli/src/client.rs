//! Cluster client for alarm operations.
//!
//! [`AlarmClient`] is the seam the dispatcher calls through. [`ClusterClient`]
//! implements it over a WebSocket connection speaking the `alarm-proto` JSON
//! frames. It connects lazily on the first request, so the dial and the
//! handshake count against that request's deadline.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//!
//! use alarm_cli::client::{AlarmClient, ClusterClient};
//! use alarm_cli::context::RequestContext;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), alarm_cli::client::ClientError> {
//! let mut client = ClusterClient::new("ws://127.0.0.1:2379", Duration::from_secs(2))?;
//! let ctx = RequestContext::with_deadline(&CancellationToken::new(), Duration::from_secs(5));
//! let alarms = client.list_alarms(&ctx).await?;
//! println!("{} active alarm(s)", alarms.alarms.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use alarm_proto::{
    AlarmMember, AlarmRequest, AlarmResponse, ClientMessage, ServerMessage,
    ALARM_PROTOCOL_VERSION,
};
use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace, warn};

use crate::context::RequestContext;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Errors surfaced by a cluster call.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Endpoint URL is not usable.
    #[error("invalid endpoint {0}: must start with ws:// or wss://")]
    InvalidEndpoint(String),

    /// Transport failure.
    #[error("connection error: {0}")]
    Connection(String),

    /// Unexpected or undecodable frame.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Cluster rejected the request.
    #[error("cluster error {code}: {message}")]
    Server {
        /// Error code reported by the cluster.
        code: u32,
        /// Error message reported by the cluster.
        message: String,
    },

    /// The request deadline passed before the cluster answered.
    #[error("context deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),

    /// The request was canceled.
    #[error("context canceled")]
    Canceled,
}

/// Alarm operations the dispatcher needs from a cluster.
///
/// Implementations must honour the deadline and cancellation carried by the
/// [`RequestContext`] they are handed.
pub trait AlarmClient: Send {
    /// Raise `member`'s alarm.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the context expires.
    fn arm_alarm(
        &mut self,
        ctx: &RequestContext,
        member: AlarmMember,
    ) -> impl Future<Output = Result<AlarmResponse, ClientError>> + Send;

    /// Clear `member`'s alarm. The default member clears every active alarm.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the context expires.
    fn disarm_alarm(
        &mut self,
        ctx: &RequestContext,
        member: AlarmMember,
    ) -> impl Future<Output = Result<AlarmResponse, ClientError>> + Send;

    /// List active alarms.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the context expires.
    fn list_alarms(
        &mut self,
        ctx: &RequestContext,
    ) -> impl Future<Output = Result<AlarmResponse, ClientError>> + Send;
}

/// WebSocket client for a cluster endpoint.
pub struct ClusterClient {
    endpoint: String,
    dial_timeout: Duration,
    /// Open stream and the server version it reported.
    conn: Option<(WsStream, String)>,
}

impl std::fmt::Debug for ClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClusterClient")
            .field("endpoint", &self.endpoint)
            .field("dial_timeout", &self.dial_timeout)
            .field("connected", &self.is_connected())
            .field("server_version", &self.server_version())
            .finish()
    }
}

impl ClusterClient {
    /// Create a client for `endpoint`. No connection is made yet.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidEndpoint`] unless the URL starts with
    /// `ws://` or `wss://`.
    pub fn new(endpoint: impl Into<String>, dial_timeout: Duration) -> Result<Self, ClientError> {
        let endpoint = endpoint.into();
        if !endpoint.starts_with("ws://") && !endpoint.starts_with("wss://") {
            return Err(ClientError::InvalidEndpoint(endpoint));
        }

        Ok(Self {
            endpoint,
            dial_timeout,
            conn: None,
        })
    }

    /// Server version reported during the handshake, once connected.
    #[must_use]
    pub fn server_version(&self) -> Option<&str> {
        self.conn.as_ref().map(|(_, version)| version.as_str())
    }

    /// Whether a connection is currently open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// Close the connection, if any. Gives up after the dial timeout.
    pub async fn close(mut self) {
        let Some((mut ws, _)) = self.conn.take() else {
            return;
        };
        match timeout(self.dial_timeout, ws.close(None)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "error closing connection"),
            Err(_) => debug!(timeout = ?self.dial_timeout, "close timed out"),
        }
    }

    async fn dial(&self) -> Result<(WsStream, String), ClientError> {
        debug!(endpoint = %self.endpoint, "connecting to cluster");

        let (mut ws, _response) = timeout(self.dial_timeout, connect_async(self.endpoint.as_str()))
            .await
            .map_err(|_| {
                ClientError::Connection(format!(
                    "dial {} timed out after {:?}",
                    self.endpoint, self.dial_timeout
                ))
            })?
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        match exchange(&mut ws, ClientMessage::hello(env!("CARGO_PKG_VERSION"))).await? {
            ServerMessage::Welcome {
                server_version,
                protocol_version,
            } => {
                if protocol_version != ALARM_PROTOCOL_VERSION {
                    warn!(
                        server = protocol_version,
                        client = ALARM_PROTOCOL_VERSION,
                        "protocol version mismatch"
                    );
                }
                debug!(version = %server_version, "handshake complete");
                Ok((ws, server_version))
            }
            ServerMessage::Error { code, message } => Err(ClientError::Server { code, message }),
            other => Err(ClientError::Protocol(format!(
                "unexpected response to hello: {other:?}"
            ))),
        }
    }

    /// Send one alarm request and wait for its response.
    ///
    /// The stream is taken out for the exchange and only put back once a
    /// full response has been read, so an abandoned request never leaves a
    /// half-read connection behind.
    async fn alarm(&mut self, request: AlarmRequest) -> Result<AlarmResponse, ClientError> {
        let (mut ws, version) = match self.conn.take() {
            Some(conn) => conn,
            None => self.dial().await?,
        };

        let response = exchange(&mut ws, ClientMessage::Alarm(request)).await?;
        self.conn = Some((ws, version));

        match response {
            ServerMessage::Alarm(response) => Ok(response),
            ServerMessage::Error { code, message } => Err(ClientError::Server { code, message }),
            other => Err(ClientError::Protocol(format!(
                "unexpected response: {other:?}"
            ))),
        }
    }

    /// Deactivate every active alarm, one request each.
    async fn disarm_all(&mut self) -> Result<AlarmResponse, ClientError> {
        let active = self.alarm(AlarmRequest::get()).await?;
        if active.is_empty() {
            return Ok(active);
        }

        let mut disarmed = AlarmResponse::new(active.header, Vec::with_capacity(active.alarms.len()));
        for member in active.alarms {
            let response = self.alarm(AlarmRequest::deactivate(member)).await?;
            disarmed.header = response.header;
            disarmed.alarms.extend(response.alarms);
        }
        Ok(disarmed)
    }
}

impl AlarmClient for ClusterClient {
    async fn arm_alarm(
        &mut self,
        ctx: &RequestContext,
        member: AlarmMember,
    ) -> Result<AlarmResponse, ClientError> {
        ctx.run(self.alarm(AlarmRequest::activate(member))).await
    }

    async fn disarm_alarm(
        &mut self,
        ctx: &RequestContext,
        member: AlarmMember,
    ) -> Result<AlarmResponse, ClientError> {
        if member.is_wildcard() {
            ctx.run(self.disarm_all()).await
        } else {
            ctx.run(self.alarm(AlarmRequest::deactivate(member))).await
        }
    }

    async fn list_alarms(&mut self, ctx: &RequestContext) -> Result<AlarmResponse, ClientError> {
        ctx.run(self.alarm(AlarmRequest::get())).await
    }
}

/// Write one frame and read the reply.
async fn exchange(ws: &mut WsStream, request: ClientMessage) -> Result<ServerMessage, ClientError> {
    let request_type = request.request_type();
    let json = request
        .to_json()
        .map_err(|e| ClientError::Protocol(e.to_string()))?;

    trace!(request_type, "sending request");
    ws.send(Message::Text(json.into()))
        .await
        .map_err(|e| ClientError::Connection(e.to_string()))?;

    loop {
        let frame = ws
            .next()
            .await
            .ok_or_else(|| ClientError::Connection("connection closed".into()))?
            .map_err(|e| ClientError::Connection(e.to_string()))?;

        match frame {
            Message::Text(text) => {
                let response = ServerMessage::from_json(&text)
                    .map_err(|e| ClientError::Protocol(e.to_string()))?;
                trace!(request_type, "received response");
                return Ok(response);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Binary(_) => {
                return Err(ClientError::Protocol("unexpected binary message".into()));
            }
            Message::Close(_) => {
                return Err(ClientError::Connection("connection closed by server".into()));
            }
            Message::Frame(_) => {
                return Err(ClientError::Protocol("unexpected raw frame".into()));
            }
        }
    }
}
