//! The whole path: `Store` → `Bridge` → channel → `CommandRouter` →
//! `LocalHost`, against a live echo server.
//!
//! Each test starts the mock server on a free port, writes an Express-style
//! source file that points at it, and drives the panel through its public
//! operations only.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use reqpanel_core::channel;
use reqpanel_core::{
    Action, Bridge, BridgeConfig, BridgeError, Command, KeyValue, Payload, PresetState, Selection,
    Store, StoreError, UrlDescriptor,
};
use reqpanel_host::{serve, CommandRouter, HostConfig, LocalHost};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::net::TcpListener;

struct Harness {
    store: Store,
    port: u16,
    dir: TempDir,
}

async fn start_echo_server() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(mock_server::run(listener));
    port
}

async fn harness_with(bridge_config: BridgeConfig) -> Harness {
    let port = start_echo_server().await;
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("server.js"),
        format!(
            "app.get('/echo/:id', show);\napp.post('/echo', create);\napp.listen({port});\n"
        ),
    )
    .unwrap();

    let config = HostConfig {
        root: dir.path().to_path_buf(),
        storage_path: Some(dir.path().join(".reqpanel/catalog.json")),
        editor_command: "true".to_string(),
        terminal_command: "true".to_string(),
        server_port: port,
        http_timeout: Duration::from_secs(5),
    };
    let host = LocalHost::open(config).await.unwrap();
    let router = Arc::new(CommandRouter::new(host));

    let (ui, endpoint) = channel::pair();
    tokio::spawn(serve(router, endpoint));

    let bridge = Bridge::new(ui.tx, bridge_config);
    let pump = bridge.clone();
    tokio::spawn(async move { pump.pump(ui.rx).await });

    Harness {
        store: Store::new(bridge),
        port,
        dir,
    }
}

async fn harness() -> Harness {
    harness_with(BridgeConfig::default()).await
}

impl Harness {
    async fn discover(&self) {
        let root = self.dir.path().to_string_lossy().into_owned();
        self.store
            .vsc_api(Payload::new(Command::ParseServer, Some(json!(root))))
            .await
            .unwrap();
    }

    /// Select a discovered url, pointed at 127.0.0.1 so the test does not
    /// depend on how `localhost` resolves.
    fn select(&self, id: &str) -> UrlDescriptor {
        let mut url = self
            .store
            .snapshot()
            .master_object
            .url(id)
            .cloned()
            .unwrap_or_else(|| panic!("{id} not discovered"));
        url.href = url.href.replace("localhost", "127.0.0.1");
        self.store.dispatch(Action::SetUrlState(Selection::Selected(url.clone())));
        url
    }
}

// --- discovery ---

#[tokio::test]
async fn startup_catalog_is_partial_until_the_server_is_parsed() {
    let h = harness().await;

    h.store.get_master_object().await.unwrap();
    let state = h.store.snapshot();
    assert!(state.loading);
    assert_eq!(state.master_object.server_paths.len(), 1);
    assert!(state.master_object.domains.is_empty());

    h.discover().await;
    let state = h.store.snapshot();
    assert!(!state.loading);
    let urls = &state.master_object.domains["echo"].urls;
    assert_eq!(urls.len(), 2);
    assert_eq!(
        urls["GET /echo/:id"].href,
        format!("http://localhost:{}/echo/:id", h.port)
    );

    // A later startup sees the stored catalog straight away.
    h.store.dispatch(Action::SetLoading(true));
    h.store.get_master_object().await.unwrap();
    assert!(!h.store.snapshot().loading);
}

// --- requests ---

#[tokio::test]
async fn get_with_path_param_headers_and_cookies() {
    let h = harness().await;
    h.discover().await;
    h.select("GET /echo/:id");

    h.store.dispatch(Action::SetParamState {
        name: "id".to_string(),
        value: "a b".to_string(),
    });
    h.store
        .dispatch(Action::SetHeaderState(vec![KeyValue::new("X-Role", "admin")]));
    h.store.dispatch(Action::SetCookieState(vec![
        KeyValue::new("session", "abc"),
        KeyValue::new("theme", ""),
    ]));

    h.store.make_request().await.unwrap();

    let state = h.store.snapshot();
    assert!(!state.waiting);
    let result = state.request_result.unwrap();
    assert_eq!(result["status"], 200);
    let echo = &result["data"];
    assert_eq!(echo["method"], "GET");
    assert_eq!(echo["path"], "/echo/a%20b");
    assert_eq!(echo["id"], "a b");
    assert_eq!(echo["headers"]["x-role"], "admin");
    assert_eq!(echo["cookie"], json!({ "session": "abc" }));
}

#[tokio::test]
async fn post_body_gets_a_json_content_type() {
    let h = harness().await;
    h.discover().await;
    h.select("POST /echo");

    h.store.dispatch(Action::SetMethodState("POST".to_string()));
    h.store
        .dispatch(Action::SetDataState(r#"{"name":"ada"}"#.to_string()));
    h.store.make_request().await.unwrap();

    let result = h.store.snapshot().request_result.unwrap();
    let echo = &result["data"];
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["headers"]["content-type"], "application/json");
    assert_eq!(echo["body"], json!({ "name": "ada" }));
}

#[tokio::test]
async fn unreachable_target_rejects_and_clears_waiting() {
    let h = harness().await;
    let closed = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    h.store.dispatch(Action::SetUrlState(Selection::Selected(UrlDescriptor {
        id: "GET /gone".to_string(),
        file_path: "/srv/gone.js".to_string(),
        href: format!("http://127.0.0.1:{closed}/gone"),
        ..UrlDescriptor::default()
    })));

    let err = h.store.make_request().await.unwrap_err();
    match err {
        StoreError::Bridge(BridgeError::Rejected(payload)) => {
            assert_eq!(payload["command"], "makeRequest");
            assert_eq!(payload["kind"], "http");
        }
        other => panic!("expected a rejection, got {other:?}"),
    }
    let state = h.store.snapshot();
    assert!(!state.waiting);
    assert!(state.request_result.is_none());
}

// --- presets ---

#[tokio::test]
async fn save_and_delete_a_preset() {
    let h = harness().await;
    h.discover().await;
    h.select("GET /echo/:id");
    h.store
        .dispatch(Action::SetHeaderState(vec![KeyValue::new("X-Role", "admin")]));

    h.store.save_preset("admin").await.unwrap();
    let state = h.store.snapshot();
    let preset = state.preset.selected().cloned().unwrap();
    assert_eq!(preset.name, "admin");
    assert_eq!(preset.header_state, vec![KeyValue::new("X-Role", "admin")]);
    assert!(state
        .master_object
        .url("GET /echo/:id")
        .unwrap()
        .presets
        .contains_key(&preset.id));
    assert!(h.dir.path().join(".reqpanel/catalog.json").exists());

    h.store
        .vsc_api(Payload::new(Command::DeletePreset, Some(json!(preset.id))))
        .await
        .unwrap();
    let state = h.store.snapshot();
    assert_eq!(state.preset, PresetState::Default);
    assert!(state.url.selected().unwrap().presets.is_empty());
    assert!(state
        .master_object
        .url("GET /echo/:id")
        .unwrap()
        .presets
        .is_empty());
}

#[tokio::test]
async fn wipe_returns_the_panel_to_loading() {
    let h = harness().await;
    h.discover().await;
    assert!(!h.store.snapshot().loading);

    h.store.wipe_storage_object().await.unwrap();
    assert!(h.store.snapshot().loading);
    assert!(!h.dir.path().join(".reqpanel/catalog.json").exists());

    h.store.get_master_object().await.unwrap();
    assert!(h.store.snapshot().loading);
}

// --- ports ---

#[tokio::test]
async fn validate_port_tracks_the_listener() {
    let h = harness().await;

    h.store.validate_port(h.port).await.unwrap();
    assert!(h.store.snapshot().valid_port);

    h.store.validate_port(0).await.unwrap();
    assert!(!h.store.snapshot().valid_port);
}

// --- correlation ---

#[tokio::test]
async fn concurrent_calls_settle_independently() {
    let h = harness().await;
    h.discover().await;
    h.select("GET /echo/:id");
    h.store.dispatch(Action::SetParamState {
        name: "id".to_string(),
        value: "7".to_string(),
    });

    let (request, port, catalog) = tokio::join!(
        h.store.make_request(),
        h.store.validate_port(h.port),
        h.store.get_master_object(),
    );
    request.unwrap();
    port.unwrap();
    catalog.unwrap();

    let state = h.store.snapshot();
    assert!(state.valid_port);
    assert_eq!(state.request_result.unwrap()["data"]["id"], "7");
    assert_eq!(h.store.bridge().pending_len(), 0);
}

#[tokio::test]
async fn unknown_command_times_out_instead_of_hanging() {
    let h = harness_with(BridgeConfig::with_timeout(Duration::from_millis(200))).await;

    let err = h
        .store
        .bridge()
        .call(Payload {
            command: "formatDisk".to_string(),
            data: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, BridgeError::Timeout { .. }));
    assert_eq!(h.store.bridge().pending_len(), 0);

    // The host is still serving after ignoring it.
    let value: Value = h
        .store
        .bridge()
        .call(Payload::new(Command::ValidatePort, Some(json!(h.port))))
        .await
        .unwrap();
    assert_eq!(value["data"], true);
}

#[tokio::test]
async fn fire_and_forget_through_vsc_api_does_not_wait() {
    let h = harness_with(BridgeConfig::with_timeout(Duration::from_millis(300))).await;

    h.store
        .vsc_api(Payload::bare(Command::OpenTerminal))
        .await
        .unwrap();
    assert_eq!(h.store.bridge().pending_len(), 0);
}
