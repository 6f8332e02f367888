//! End-to-end tests against an in-process relay speaking CDP over WebSocket.

use std::time::Duration;

use browse_relay::{
    CdpClient, CdpError, ConnectionConfig, ConnectionManager, ConnectionState, PageHandle,
    RelayBrowser,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio_tungstenite::tungstenite::Message;

struct Tab {
    id: &'static str,
    url: &'static str,
    title: &'static str,
}

const TABS: &[Tab] = &[
    Tab {
        id: "T1",
        url: "https://x.com/home",
        title: "Home / X",
    },
    Tab {
        id: "T2",
        url: "https://www.reddit.com/r/rust/",
        title: "r/rust",
    },
];

/// Start a relay on an ephemeral port. Sending on the returned channel makes
/// it close the socket.
async fn spawn_relay() -> (String, oneshot::Sender<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}", listener.local_addr().unwrap());
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => {
                    let _ = ws.close(None).await;
                    break;
                }
                msg = ws.next() => {
                    let Some(Ok(Message::Text(text))) = msg else { break };
                    let request: Value = serde_json::from_str(&text).unwrap();
                    let reply = respond(&request);
                    ws.send(Message::Text(reply.to_string().into())).await.unwrap();
                }
            }
        }
    });

    (endpoint, shutdown_tx)
}

fn tab_for_session(request: &Value) -> Option<&'static Tab> {
    let session = request["sessionId"].as_str()?;
    TABS.iter().find(|t| session == format!("S-{}", t.id))
}

fn respond(request: &Value) -> Value {
    let id = request["id"].clone();
    let params = &request["params"];

    let result = match request["method"].as_str().unwrap_or_default() {
        "Target.getTargets" => {
            let mut infos: Vec<Value> = TABS
                .iter()
                .map(|t| json!({"targetId": t.id, "type": "page", "title": t.title, "url": t.url}))
                .collect();
            infos.push(json!({"targetId": "SW", "type": "service_worker", "url": "https://x.com/sw.js"}));
            json!({ "targetInfos": infos })
        }
        "Target.attachToTarget" => {
            json!({ "sessionId": format!("S-{}", params["targetId"].as_str().unwrap_or_default()) })
        }
        "Runtime.evaluate" => {
            let tab = tab_for_session(request);
            match params["expression"].as_str().unwrap_or_default() {
                "window.location.href" => json!({"result": {"type": "string", "value": tab.map(|t| t.url)}}),
                "document.title" => json!({"result": {"type": "string", "value": tab.map(|t| t.title)}}),
                "document.readyState" => json!({"result": {"type": "string", "value": "complete"}}),
                "explode()" => {
                    return json!({
                        "id": id,
                        "result": {
                            "result": {"type": "object"},
                            "exceptionDetails": {
                                "text": "Uncaught",
                                "exception": {"type": "object", "description": "ReferenceError: explode is not defined"}
                            }
                        }
                    });
                }
                _ => json!({"result": {"type": "undefined"}}),
            }
        }
        "Page.navigate" => {
            if params["url"].as_str().unwrap_or_default().contains("unreachable") {
                json!({"frameId": "F1", "errorText": "net::ERR_NAME_NOT_RESOLVED"})
            } else {
                json!({"frameId": "F1"})
            }
        }
        "Page.captureScreenshot" => json!({"data": "iVBORw0KGgo="}),
        "Browser.crash" => {
            return json!({"id": id, "error": {"code": -32601, "message": "'Browser.crash' wasn't found"}});
        }
        _ => json!({}),
    };

    json!({ "id": id, "result": result })
}

fn config(endpoint: &str) -> ConnectionConfig {
    ConnectionConfig {
        endpoint: endpoint.to_string(),
        connect_timeout: Duration::from_secs(5),
        max_retries: 1,
        initial_retry_delay: Duration::from_millis(10),
        auto_reconnect: false,
        reconnect_delay: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn test_client_lists_only_page_targets() {
    let (endpoint, _shutdown) = spawn_relay().await;
    let client = CdpClient::connect(&endpoint).await.unwrap();

    let pages = client.pages().await.unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0].target_id(), "T1");
    assert_eq!(pages[1].url().await.unwrap(), "https://www.reddit.com/r/rust/");

    // Sessions are cached per target.
    let again = client.page_sessions().await.unwrap();
    assert_eq!(again[0].session_id(), "S-T1");
}

#[tokio::test]
async fn test_page_session_operations() {
    let (endpoint, _shutdown) = spawn_relay().await;
    let client = CdpClient::connect(&endpoint).await.unwrap();
    let page = client.attach_page("T1").await.unwrap();

    assert_eq!(page.get_title().await.unwrap(), "Home / X");
    assert_eq!(page.evaluate("1 + 1").await.unwrap(), Value::Null);

    let err = page.evaluate("explode()").await.unwrap_err();
    assert!(matches!(err, CdpError::JavaScript(ref m) if m.contains("explode is not defined")));

    page.navigate("https://x.com/rustlang", Duration::from_secs(5))
        .await
        .unwrap();
    let err = page
        .navigate("https://unreachable.invalid", Duration::from_secs(5))
        .await
        .unwrap_err();
    assert!(matches!(err, CdpError::NavigationFailed(_)));

    assert_eq!(page.screenshot(false).await.unwrap(), "iVBORw0KGgo=");
}

#[tokio::test]
async fn test_protocol_error_surfaces() {
    let (endpoint, _shutdown) = spawn_relay().await;
    let client = CdpClient::connect(&endpoint).await.unwrap();

    let err = client.call("Browser.crash", None).await.unwrap_err();
    assert!(matches!(err, CdpError::Protocol { code: -32601, .. }));
}

#[tokio::test]
async fn test_manager_over_real_socket() {
    let (endpoint, _shutdown) = spawn_relay().await;
    let manager = ConnectionManager::with_cdp(config(&endpoint));

    let pages = manager.list_pages().await.unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].current);
    assert_eq!(pages[0].title, "Home / X");

    manager.switch_page(1).await.unwrap();
    let info = manager.page_info().await.unwrap();
    assert_eq!(info.title, "r/rust");

    manager.disconnect().await;
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_manager_notices_relay_loss() {
    let (endpoint, shutdown) = spawn_relay().await;
    let manager = ConnectionManager::with_cdp(config(&endpoint));
    manager.connect().await.unwrap();
    assert!(manager.is_connected());

    shutdown.send(()).unwrap();

    let mut lost = false;
    for _ in 0..50 {
        if manager.state() == ConnectionState::Disconnected {
            lost = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(lost, "manager should observe the closed socket");
    assert!(!manager.is_connected());
}
