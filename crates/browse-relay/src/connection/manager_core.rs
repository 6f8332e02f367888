//! ConnectionManager core: struct definition, connect, disconnect, reconnect.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::retry::with_retry;
use super::transport::{RelayBrowser, RelayConnector};
use super::{ConnectionConfig, ConnectionState, RelayError, RelayErrorKind};
use crate::cdp::CdpConnector;

/// Owns the single relay connection and the current-tab index.
///
/// Connection is lazy: the first page request connects. Concurrent callers
/// share one attempt.
pub struct ConnectionManager {
    pub(super) inner: Arc<ManagerInner>,
}

pub(super) struct ManagerInner {
    pub(super) config: ConnectionConfig,
    connector: Arc<dyn RelayConnector>,
    browser: RwLock<Option<Arc<dyn RelayBrowser>>>,
    state: Mutex<ConnectionState>,
    pub(super) current_index: AtomicUsize,
    /// Serialises connection attempts.
    connect_lock: tokio::sync::Mutex<()>,
    /// Bumped whenever the browser slot changes hands; stale watchers compare
    /// against it.
    generation: AtomicU64,
    watcher: Mutex<Option<JoinHandle<()>>>,
    reconnect: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionManager {
    /// Create a manager with an explicit transport.
    pub fn new(config: ConnectionConfig, connector: Arc<dyn RelayConnector>) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config,
                connector,
                browser: RwLock::new(None),
                state: Mutex::new(ConnectionState::Disconnected),
                current_index: AtomicUsize::new(0),
                connect_lock: tokio::sync::Mutex::new(()),
                generation: AtomicU64::new(0),
                watcher: Mutex::new(None),
                reconnect: Mutex::new(None),
            }),
        }
    }

    /// Create a manager speaking CDP over WebSocket.
    pub fn with_cdp(config: ConnectionConfig) -> Self {
        Self::new(config, Arc::new(CdpConnector))
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.lock()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.live_browser().is_some()
    }

    /// Ensure a live connection, retrying refused connections with backoff.
    pub async fn connect(&self) -> Result<(), RelayError> {
        self.inner.ensure_connected().await.map(|_| ())
    }

    /// Tear down the connection. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        self.inner.disconnect().await;
    }

    pub(super) async fn browser(&self) -> Result<Arc<dyn RelayBrowser>, RelayError> {
        self.inner.ensure_connected().await
    }
}

impl ManagerInner {
    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    fn live_browser(&self) -> Option<Arc<dyn RelayBrowser>> {
        self.browser
            .read()
            .as_ref()
            .filter(|b| b.is_connected())
            .cloned()
    }

    /// Foreground connect. A timeout also clears any pending background
    /// reconnect so nothing connects behind the caller's back.
    async fn ensure_connected(self: &Arc<Self>) -> Result<Arc<dyn RelayBrowser>, RelayError> {
        let result = self.establish().await;
        if let Err(e) = &result {
            if e.kind() == RelayErrorKind::ConnectionTimeout {
                self.cancel_reconnect();
            }
        }
        result
    }

    async fn establish(self: &Arc<Self>) -> Result<Arc<dyn RelayBrowser>, RelayError> {
        if let Some(browser) = self.live_browser() {
            return Ok(browser);
        }

        let _guard = self.connect_lock.lock().await;

        // Another caller may have connected while we waited.
        if let Some(browser) = self.live_browser() {
            return Ok(browser);
        }

        self.set_state(ConnectionState::Connecting);
        info!("Connecting to relay at {}", self.config.endpoint);

        let result = with_retry(
            self.config.max_retries,
            self.config.initial_retry_delay,
            |e: &RelayError| e.kind() == RelayErrorKind::ConnectionRefused,
            |attempt| self.connect_once(attempt + 1),
        )
        .await;

        match result {
            Ok(browser) => {
                self.install(browser.clone());
                info!("Connected to relay at {}", self.config.endpoint);
                Ok(browser)
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                warn!("Relay connection failed: {}", e);
                Err(e)
            }
        }
    }

    async fn connect_once(&self, attempt: u32) -> Result<Arc<dyn RelayBrowser>, RelayError> {
        let endpoint = &self.config.endpoint;
        let timeout = self.config.connect_timeout;

        match tokio::time::timeout(timeout, self.connector.connect(endpoint)).await {
            Ok(Ok(browser)) => Ok(browser),
            Ok(Err(e)) => Err(RelayError::from_connect(e, endpoint, attempt)),
            Err(_) => Err(RelayError::ConnectionTimeout {
                endpoint: endpoint.clone(),
                timeout_ms: timeout.as_millis() as u64,
            }),
        }
    }

    /// Store a fresh connection and start watching it for loss.
    fn install(self: &Arc<Self>, browser: Arc<dyn RelayBrowser>) {
        let generation = {
            let mut slot = self.browser.write();
            *slot = Some(browser.clone());
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        self.set_state(ConnectionState::Connected);

        let mut closed = browser.closed();
        let weak: Weak<Self> = Arc::downgrade(self);
        let watcher = tokio::spawn(async move {
            // A dropped sender counts as a lost connection too.
            let _ = closed.wait_for(|closed| *closed).await;
            if let Some(inner) = weak.upgrade() {
                inner.on_transport_lost(generation);
            }
        });

        if let Some(old) = self.watcher.lock().replace(watcher) {
            old.abort();
        }
    }

    fn on_transport_lost(self: &Arc<Self>, generation: u64) {
        {
            let mut slot = self.browser.write();
            if self.generation.load(Ordering::SeqCst) != generation {
                return;
            }
            *slot = None;
        }

        self.current_index.store(0, Ordering::SeqCst);
        self.set_state(ConnectionState::Disconnected);
        warn!("Relay connection to {} lost", self.config.endpoint);

        if self.config.auto_reconnect {
            self.schedule_reconnect();
        }
    }

    fn schedule_reconnect(self: &Arc<Self>) {
        let delay = self.config.reconnect_delay;
        let weak: Weak<Self> = Arc::downgrade(self);
        info!("Reconnecting to relay in {:?}", delay);

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else {
                return;
            };
            match inner.establish().await {
                Ok(_) => info!("Reconnected to relay"),
                Err(e) => warn!("Background reconnect failed: {}", e),
            }
        });

        if let Some(old) = self.reconnect.lock().replace(task) {
            old.abort();
        }
    }

    fn cancel_reconnect(&self) {
        if let Some(task) = self.reconnect.lock().take() {
            debug!("Cancelled pending reconnect");
            task.abort();
        }
    }

    async fn disconnect(&self) {
        self.cancel_reconnect();
        if let Some(task) = self.watcher.lock().take() {
            task.abort();
        }

        let _guard = self.connect_lock.lock().await;

        let browser = {
            let mut slot = self.browser.write();
            self.generation.fetch_add(1, Ordering::SeqCst);
            slot.take()
        };

        if let Some(browser) = browser {
            browser.close().await;
            info!("Disconnected from relay at {}", self.config.endpoint);
        } else {
            debug!("Disconnect requested while not connected");
        }

        self.current_index.store(0, Ordering::SeqCst);
        self.set_state(ConnectionState::Disconnected);
    }
}

impl Drop for ManagerInner {
    fn drop(&mut self) {
        if let Some(task) = self.reconnect.get_mut().take() {
            task.abort();
        }
        if let Some(task) = self.watcher.get_mut().take() {
            task.abort();
        }
    }
}
