use super::*;

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::watch;

use crate::cdp::CdpError;
use crate::page::PageHandle;

struct FakePage {
    id: String,
}

#[async_trait]
impl PageHandle for FakePage {
    fn target_id(&self) -> &str {
        &self.id
    }

    async fn url(&self) -> Result<String, CdpError> {
        Ok(format!("https://example.com/{}", self.id))
    }

    async fn title(&self) -> Result<String, CdpError> {
        Ok(format!("Tab {}", self.id))
    }

    async fn evaluate(&self, _expression: &str) -> Result<Value, CdpError> {
        Ok(Value::Null)
    }

    async fn navigate(&self, _url: &str, _timeout: Duration) -> Result<(), CdpError> {
        Ok(())
    }

    async fn wait_for_selector(&self, _selector: &str, _timeout: Duration) -> Result<bool, CdpError> {
        Ok(true)
    }

    async fn screenshot(&self, _full_page: bool) -> Result<String, CdpError> {
        Ok(String::new())
    }
}

struct FakeBrowser {
    pages: Mutex<Vec<Arc<dyn PageHandle>>>,
    connected: AtomicBool,
    closed_tx: watch::Sender<bool>,
    close_calls: AtomicU32,
}

impl FakeBrowser {
    fn with_pages(count: usize) -> Arc<Self> {
        let pages = (0..count)
            .map(|i| Arc::new(FakePage { id: format!("p{}", i) }) as Arc<dyn PageHandle>)
            .collect();
        let (closed_tx, _) = watch::channel(false);
        Arc::new(Self {
            pages: Mutex::new(pages),
            connected: AtomicBool::new(true),
            closed_tx,
            close_calls: AtomicU32::new(0),
        })
    }

    /// Simulate the relay going away.
    fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.closed_tx.send_replace(true);
    }
}

#[async_trait]
impl RelayBrowser for FakeBrowser {
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, CdpError> {
        Ok(self.pages.lock().clone())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn closed(&self) -> watch::Receiver<bool> {
        self.closed_tx.subscribe()
    }

    async fn close(&self) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.connected.store(false, Ordering::SeqCst);
    }
}

#[derive(Clone, Copy)]
enum Behavior {
    Succeed,
    Refuse,
    Hang,
    Fail,
}

struct FakeConnector {
    script: Mutex<VecDeque<Behavior>>,
    fallback: Behavior,
    delay: Duration,
    page_count: usize,
    connects: AtomicU32,
    browsers: Mutex<Vec<Arc<FakeBrowser>>>,
}

impl FakeConnector {
    fn new(fallback: Behavior, page_count: usize) -> Arc<Self> {
        Self::scripted(Vec::new(), fallback, page_count)
    }

    fn scripted(script: Vec<Behavior>, fallback: Behavior, page_count: usize) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            fallback,
            delay: Duration::ZERO,
            page_count,
            connects: AtomicU32::new(0),
            browsers: Mutex::new(Vec::new()),
        })
    }

    fn slow(page_count: usize, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Behavior::Succeed,
            delay,
            page_count,
            connects: AtomicU32::new(0),
            browsers: Mutex::new(Vec::new()),
        })
    }

    fn connects(&self) -> u32 {
        self.connects.load(Ordering::SeqCst)
    }

    fn browser(&self, i: usize) -> Arc<FakeBrowser> {
        self.browsers.lock()[i].clone()
    }
}

#[async_trait]
impl RelayConnector for FakeConnector {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn RelayBrowser>, CdpError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let behavior = self.script.lock().pop_front().unwrap_or(self.fallback);
        match behavior {
            Behavior::Succeed => {
                let browser = FakeBrowser::with_pages(self.page_count);
                self.browsers.lock().push(browser.clone());
                Ok(browser)
            }
            Behavior::Refuse => Err(CdpError::ConnectionRefused(endpoint.to_string())),
            Behavior::Hang => std::future::pending().await,
            Behavior::Fail => Err(CdpError::ConnectionFailed("handshake rejected".to_string())),
        }
    }
}

fn test_config() -> ConnectionConfig {
    ConnectionConfig {
        endpoint: "ws://relay.test:19988".to_string(),
        connect_timeout: Duration::from_secs(1),
        max_retries: 3,
        initial_retry_delay: Duration::from_millis(100),
        auto_reconnect: true,
        reconnect_delay: Duration::from_millis(500),
    }
}

fn manager(connector: Arc<FakeConnector>) -> ConnectionManager {
    ConnectionManager::new(test_config(), connector)
}

#[test]
fn test_config_default() {
    let config = ConnectionConfig::default();
    assert_eq!(config.endpoint, "ws://127.0.0.1:19988");
    assert_eq!(config.connect_timeout, Duration::from_secs(30));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.initial_retry_delay, Duration::from_millis(100));
}

#[test]
fn test_invalid_page_index_message() {
    let err = RelayError::InvalidPageIndex { index: 5, len: 3 };
    assert_eq!(err.to_string(), "Invalid page index: 5. Available: 0-2");
    assert_eq!(err.kind(), RelayErrorKind::InvalidPageIndex);
}

#[test]
fn test_error_kinds() {
    assert_eq!(
        RelayError::from(CdpError::SessionClosed).kind(),
        RelayErrorKind::ConnectionFailed
    );
    assert_eq!(
        RelayError::from(CdpError::JavaScript("x".into())).kind(),
        RelayErrorKind::Protocol
    );
    let refused = RelayError::from_connect(CdpError::ConnectionRefused("x".into()), "ws://a", 2);
    assert!(matches!(refused, RelayError::ConnectionRefused { attempts: 2, .. }));
}

#[tokio::test]
async fn test_disconnect_without_connect() {
    let connector = FakeConnector::new(Behavior::Succeed, 1);
    let manager = manager(connector.clone());
    manager.disconnect().await;
    manager.disconnect().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(connector.connects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_connect() {
    let connector = FakeConnector::slow(2, Duration::from_millis(50));
    let manager = manager(connector.clone());

    let calls = (0..10).map(|_| manager.get_page());
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(connector.connects(), 1);
    assert_eq!(manager.state(), ConnectionState::Connected);
}

#[tokio::test(start_paused = true)]
async fn test_refused_retries_to_ceiling() {
    let connector = FakeConnector::new(Behavior::Refuse, 1);
    let manager = manager(connector.clone());

    let err = manager.connect().await.unwrap_err();
    assert_eq!(err.kind(), RelayErrorKind::ConnectionRefused);
    assert!(matches!(err, RelayError::ConnectionRefused { attempts: 3, .. }));
    assert_eq!(connector.connects(), 3);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_refused_then_success() {
    let connector =
        FakeConnector::scripted(vec![Behavior::Refuse, Behavior::Refuse], Behavior::Succeed, 1);
    let manager = manager(connector.clone());

    manager.connect().await.unwrap();
    assert_eq!(connector.connects(), 3);
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_timeout_is_not_retried() {
    let connector = FakeConnector::new(Behavior::Hang, 1);
    let manager = manager(connector.clone());

    let err = manager.connect().await.unwrap_err();
    assert_eq!(err.kind(), RelayErrorKind::ConnectionTimeout);
    assert_eq!(connector.connects(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_other_failure_is_not_retried() {
    let connector = FakeConnector::new(Behavior::Fail, 1);
    let manager = manager(connector.clone());

    let err = manager.connect().await.unwrap_err();
    assert_eq!(err.kind(), RelayErrorKind::ConnectionFailed);
    assert_eq!(connector.connects(), 1);
}

#[tokio::test]
async fn test_get_page_without_tabs() {
    let manager = manager(FakeConnector::new(Behavior::Succeed, 0));

    let err = manager.get_page().await.err().unwrap();
    assert!(matches!(err, RelayError::NoPagesAvailable));
    assert!(manager.get_pages().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_switch_page() {
    let manager = manager(FakeConnector::new(Behavior::Succeed, 3));

    let page = manager.switch_page(1).await.unwrap();
    assert_eq!(page.target_id(), "p1");
    assert_eq!(manager.current_index(), 1);
    assert_eq!(manager.get_page().await.unwrap().target_id(), "p1");

    let err = manager.switch_page(3).await.err().unwrap();
    assert!(matches!(err, RelayError::InvalidPageIndex { index: 3, len: 3 }));
    assert!(err.to_string().contains("0-2"));
    assert_eq!(manager.current_index(), 1);
}

#[tokio::test]
async fn test_get_page_heals_stale_index() {
    let connector = FakeConnector::new(Behavior::Succeed, 3);
    let manager = manager(connector.clone());

    manager.switch_page(2).await.unwrap();
    connector.browser(0).pages.lock().truncate(2);

    let page = manager.get_page().await.unwrap();
    assert_eq!(page.target_id(), "p1");
    assert_eq!(manager.current_index(), 1);
}

#[tokio::test]
async fn test_list_pages_marks_current() {
    let manager = manager(FakeConnector::new(Behavior::Succeed, 2));
    manager.switch_page(1).await.unwrap();

    let pages = manager.list_pages().await.unwrap();
    assert_eq!(pages.len(), 2);
    assert!(!pages[0].current);
    assert!(pages[1].current);
    assert_eq!(pages[1].url, "https://example.com/p1");
    assert_eq!(pages[1].title, "Tab p1");
}

#[tokio::test]
async fn test_page_info() {
    let manager = manager(FakeConnector::new(Behavior::Succeed, 1));
    let info = manager.page_info().await.unwrap();
    assert_eq!(info.url, "https://example.com/p0");
    assert_eq!(info.title, "Tab p0");
}

#[tokio::test]
async fn test_disconnect_is_idempotent() {
    let connector = FakeConnector::new(Behavior::Succeed, 2);
    let manager = manager(connector.clone());

    manager.switch_page(1).await.unwrap();
    manager.disconnect().await;
    manager.disconnect().await;

    assert_eq!(connector.browser(0).close_calls.load(Ordering::SeqCst), 1);
    assert!(!manager.is_connected());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(manager.current_index(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_reconnects_after_drop() {
    let connector = FakeConnector::new(Behavior::Succeed, 2);
    let manager = manager(connector.clone());

    manager.switch_page(1).await.unwrap();
    connector.browser(0).drop_connection();

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(manager.current_index(), 0);

    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(connector.connects(), 2);
    assert!(manager.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_no_background_reconnect_when_disabled() {
    let connector = FakeConnector::new(Behavior::Succeed, 1);
    let config = ConnectionConfig {
        auto_reconnect: false,
        ..test_config()
    };
    let manager = ConnectionManager::new(config, connector.clone());

    manager.connect().await.unwrap();
    connector.browser(0).drop_connection();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(connector.connects(), 1);
    assert!(!manager.is_connected());

    // The next caller connects again.
    manager.get_page().await.unwrap();
    assert_eq!(connector.connects(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_cancels_pending_reconnect() {
    let connector = FakeConnector::new(Behavior::Succeed, 1);
    let manager = manager(connector.clone());

    manager.connect().await.unwrap();
    connector.browser(0).drop_connection();
    tokio::time::sleep(Duration::from_millis(100)).await;

    manager.disconnect().await;
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert_eq!(connector.connects(), 1);
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_connect_timeout_clears_pending_reconnect() {
    let connector =
        FakeConnector::scripted(vec![Behavior::Succeed, Behavior::Hang], Behavior::Succeed, 1);
    let config = ConnectionConfig {
        reconnect_delay: Duration::from_secs(5),
        ..test_config()
    };
    let manager = ConnectionManager::new(config, connector.clone());

    manager.connect().await.unwrap();
    connector.browser(0).drop_connection();
    tokio::time::sleep(Duration::from_millis(100)).await;

    let err = manager.get_page().await.err().unwrap();
    assert_eq!(err.kind(), RelayErrorKind::ConnectionTimeout);
    assert_eq!(connector.connects(), 2);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(connector.connects(), 2);
    assert!(!manager.is_connected());
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test(start_paused = true)]
async fn test_background_reconnect_timeout_is_logged_only() {
    let connector =
        FakeConnector::scripted(vec![Behavior::Succeed, Behavior::Hang], Behavior::Succeed, 1);
    let manager = manager(connector.clone());

    manager.connect().await.unwrap();
    connector.browser(0).drop_connection();

    // Reconnect fires at 500ms and times out at 1.5s; the next caller connects.
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(connector.connects(), 2);
    assert!(!manager.is_connected());

    manager.get_page().await.unwrap();
    assert_eq!(connector.connects(), 3);
}
