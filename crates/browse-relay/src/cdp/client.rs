//! CDP WebSocket client.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio::sync::{oneshot, watch};
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use super::error::CdpError;
use super::protocol::{BrowserVersion, CdpRequest, CdpResponse, TargetInfo};
use super::session::PageSession;
use crate::connection::{RelayBrowser, RelayConnector};
use crate::page::PageHandle;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Pending request waiting for response.
struct PendingRequest {
    tx: oneshot::Sender<Result<Value, CdpError>>,
}

/// Request/response plumbing shared by the client and its page sessions.
pub(crate) struct CdpChannel {
    ws_tx: tokio::sync::Mutex<WsSink>,
    request_id: AtomicU64,
    pending: Mutex<HashMap<u64, PendingRequest>>,
    connected: AtomicBool,
}

impl CdpChannel {
    fn new(ws_tx: WsSink) -> Self {
        Self {
            ws_tx: tokio::sync::Mutex::new(ws_tx),
            request_id: AtomicU64::new(1),
            pending: Mutex::new(HashMap::new()),
            connected: AtomicBool::new(true),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Send a CDP command and wait for response.
    pub(crate) async fn call(
        &self,
        method: &str,
        params: Option<Value>,
        session_id: Option<&str>,
    ) -> Result<Value, CdpError> {
        if !self.is_connected() {
            return Err(CdpError::SessionClosed);
        }

        let id = self.request_id.fetch_add(1, Ordering::SeqCst);

        let request = CdpRequest {
            id,
            method: method.to_string(),
            params,
            session_id: session_id.map(|s| s.to_string()),
        };

        let json = serde_json::to_string(&request)?;
        trace!("CDP send: {}", json);

        let (tx, rx) = oneshot::channel();
        self.pending.lock().insert(id, PendingRequest { tx });

        // The receive loop may have drained `pending` between the check above
        // and the insert.
        if !self.is_connected() {
            self.pending.lock().remove(&id);
            return Err(CdpError::SessionClosed);
        }

        let sent = {
            let mut ws = self.ws_tx.lock().await;
            ws.send(Message::Text(json.into())).await
        };
        if let Err(e) = sent {
            self.pending.lock().remove(&id);
            return Err(e.into());
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(CdpError::SessionClosed),
            Err(_) => {
                self.pending.lock().remove(&id);
                Err(CdpError::Timeout(format!("Request {} timed out", method)))
            }
        }
    }

    fn resolve(&self, resp: CdpResponse) {
        let Some(id) = resp.id else {
            if let Some(method) = resp.method {
                trace!("CDP event {} (session {:?})", method, resp.session_id);
            }
            return;
        };

        let Some(req) = self.pending.lock().remove(&id) else {
            debug!("Dropping response for unknown request {}", id);
            return;
        };

        let result = match resp.error {
            Some(error) => Err(CdpError::Protocol {
                code: error.code,
                message: error.message,
            }),
            None => Ok(resp.result.unwrap_or(Value::Null)),
        };
        let _ = req.tx.send(result);
    }

    /// Mark the channel dead and fail every in-flight request.
    fn shut_down(&self) {
        self.connected.store(false, Ordering::SeqCst);
        let drained: Vec<PendingRequest> = self.pending.lock().drain().map(|(_, r)| r).collect();
        for req in drained {
            let _ = req.tx.send(Err(CdpError::SessionClosed));
        }
    }
}

/// CDP client for one relay connection.
pub struct CdpClient {
    /// Browser WebSocket URL.
    browser_ws_url: String,
    channel: Arc<CdpChannel>,
    /// Attached page sessions by target id.
    sessions: tokio::sync::Mutex<HashMap<String, Arc<PageSession>>>,
    closed_rx: watch::Receiver<bool>,
    recv_task: tokio::task::JoinHandle<()>,
}

impl CdpClient {
    /// Connect to the relay at the given endpoint.
    ///
    /// `ws://` and `wss://` endpoints are used as-is; `http://` endpoints are
    /// resolved through `/json/version`.
    ///
    /// ```rust,ignore
    /// let client = CdpClient::connect("ws://127.0.0.1:19988").await?;
    /// ```
    pub async fn connect(endpoint: &str) -> Result<Self, CdpError> {
        let browser_ws_url = resolve_ws_url(endpoint).await?;

        let (ws_stream, _) = tokio_tungstenite::connect_async(browser_ws_url.as_str())
            .await
            .map_err(|e| classify_ws_error(&browser_ws_url, e))?;

        let (ws_sink, ws_source) = ws_stream.split();
        let channel = Arc::new(CdpChannel::new(ws_sink));
        let (closed_tx, closed_rx) = watch::channel(false);

        let recv_task = {
            let channel = channel.clone();
            tokio::spawn(async move {
                Self::receive_loop(ws_source, channel, closed_tx).await;
            })
        };

        info!("CDP client connected to {}", browser_ws_url);

        Ok(Self {
            browser_ws_url,
            channel,
            sessions: tokio::sync::Mutex::new(HashMap::new()),
            closed_rx,
            recv_task,
        })
    }

    /// WebSocket receive loop.
    async fn receive_loop(
        mut ws_source: WsSource,
        channel: Arc<CdpChannel>,
        closed_tx: watch::Sender<bool>,
    ) {
        while let Some(msg) = ws_source.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    trace!("CDP recv: {}", text);
                    match serde_json::from_str::<CdpResponse>(&text) {
                        Ok(resp) => channel.resolve(resp),
                        Err(e) => warn!("Failed to parse CDP message: {}", e),
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!("WebSocket closed: {:?}", frame);
                    break;
                }
                Err(e) => {
                    warn!("WebSocket error: {}", e);
                    break;
                }
                _ => {}
            }
        }

        channel.shut_down();
        let _ = closed_tx.send(true);
        info!("Relay connection lost");
    }

    /// Send a browser-level CDP command.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.channel.call(method, params, None).await
    }

    /// Get browser WebSocket URL.
    pub fn browser_ws_url(&self) -> &str {
        &self.browser_ws_url
    }

    /// Get all targets across all browser contexts.
    pub async fn get_targets(&self) -> Result<Vec<TargetInfo>, CdpError> {
        let result = self.call("Target.getTargets", None).await?;
        let targets: Vec<TargetInfo> = serde_json::from_value(result["targetInfos"].clone())?;
        Ok(targets)
    }

    /// Attach to an existing page.
    pub async fn attach_page(&self, target_id: &str) -> Result<PageSession, CdpError> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({
                    "targetId": target_id,
                    "flatten": true
                })),
            )
            .await?;

        let session_id = result["sessionId"]
            .as_str()
            .ok_or_else(|| CdpError::InvalidResponse("Missing sessionId".to_string()))?
            .to_string();

        let session = PageSession::new(target_id.to_string(), session_id, self.channel.clone());
        session.enable_domains().await?;

        Ok(session)
    }

    /// Attached sessions for every page target, attaching new tabs on the way.
    pub async fn page_sessions(&self) -> Result<Vec<Arc<PageSession>>, CdpError> {
        let targets: Vec<TargetInfo> = self
            .get_targets()
            .await?
            .into_iter()
            .filter(TargetInfo::is_page)
            .collect();

        let mut sessions = self.sessions.lock().await;
        sessions.retain(|id, _| targets.iter().any(|t| &t.target_id == id));

        let mut pages = Vec::with_capacity(targets.len());
        for target in &targets {
            if let Some(session) = sessions.get(&target.target_id) {
                pages.push(session.clone());
                continue;
            }
            match self.attach_page(&target.target_id).await {
                Ok(session) => {
                    debug!("Attached to {} ({})", target.target_id, target.url);
                    let session = Arc::new(session);
                    sessions.insert(target.target_id.clone(), session.clone());
                    pages.push(session);
                }
                Err(CdpError::SessionClosed) => return Err(CdpError::SessionClosed),
                Err(e) => warn!("Skipping tab {}: {}", target.target_id, e),
            }
        }

        Ok(pages)
    }
}

#[async_trait]
impl RelayBrowser for CdpClient {
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, CdpError> {
        let sessions = self.page_sessions().await?;
        Ok(sessions
            .into_iter()
            .map(|s| s as Arc<dyn PageHandle>)
            .collect())
    }

    fn is_connected(&self) -> bool {
        self.channel.is_connected()
    }

    fn closed(&self) -> watch::Receiver<bool> {
        self.closed_rx.clone()
    }

    async fn close(&self) {
        self.channel.shut_down();
        let mut ws = self.channel.ws_tx.lock().await;
        if let Err(e) = ws.close().await {
            debug!("Error closing relay socket: {}", e);
        }
    }
}

impl Drop for CdpClient {
    fn drop(&mut self) {
        self.recv_task.abort();
    }
}

/// Opens [`CdpClient`] connections for the connection manager.
#[derive(Debug, Default, Clone, Copy)]
pub struct CdpConnector;

#[async_trait]
impl RelayConnector for CdpConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn RelayBrowser>, CdpError> {
        let client = CdpClient::connect(endpoint).await?;
        Ok(Arc::new(client))
    }
}

/// Turn a relay endpoint into the browser WebSocket URL.
async fn resolve_ws_url(endpoint: &str) -> Result<String, CdpError> {
    let url = Url::parse(endpoint)?;
    match url.scheme() {
        "ws" | "wss" => Ok(endpoint.to_string()),
        "http" | "https" => {
            let version_url = url.join("/json/version")?;
            debug!("Fetching browser version from {}", version_url);

            let version: BrowserVersion = reqwest::get(version_url)
                .await?
                .error_for_status()?
                .json()
                .await?;

            if let Some(browser) = &version.browser {
                debug!("Relay reports browser: {}", browser);
            }
            Ok(version.web_socket_debugger_url)
        }
        other => Err(CdpError::ConnectionFailed(format!(
            "Unsupported relay scheme '{}' in {}",
            other, endpoint
        ))),
    }
}

fn classify_ws_error(url: &str, e: tungstenite::Error) -> CdpError {
    match &e {
        tungstenite::Error::Io(io) if io.kind() == std::io::ErrorKind::ConnectionRefused => {
            CdpError::ConnectionRefused(url.to_string())
        }
        _ => CdpError::ConnectionFailed(format!("WebSocket {}: {}", url, e)),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
