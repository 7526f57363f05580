//! A small HTTP target for exercising the request panel end to end.
//!
//! `/echo` and `/echo/{id}` accept any method and answer with what they
//! received, so a test can assert on the exact request the host sent.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, Method, Uri},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Echo {
    pub request_id: Uuid,
    pub method: String,
    pub path: String,
    pub id: Option<String>,
    pub headers: BTreeMap<String, String>,
    pub cookie: BTreeMap<String, String>,
    pub body: Value,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub served: u64,
}

pub type Counter = Arc<AtomicU64>;

pub fn app() -> Router {
    let served: Counter = Arc::new(AtomicU64::new(0));
    Router::new()
        .route("/health", get(health))
        .route("/echo", any(echo))
        .route("/echo/{id}", any(echo_id))
        .with_state(served)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn health(State(served): State<Counter>) -> Json<Health> {
    Json(Health {
        status: "ok".to_string(),
        served: served.load(Ordering::Relaxed),
    })
}

async fn echo(
    State(served): State<Counter>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    Json(record(&served, method, uri, None, &headers, &body))
}

async fn echo_id(
    State(served): State<Counter>,
    Path(id): Path<String>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<Echo> {
    Json(record(&served, method, uri, Some(id), &headers, &body))
}

fn record(
    served: &Counter,
    method: Method,
    uri: Uri,
    id: Option<String>,
    headers: &HeaderMap,
    body: &[u8],
) -> Echo {
    served.fetch_add(1, Ordering::Relaxed);
    Echo {
        request_id: Uuid::new_v4(),
        method: method.to_string(),
        path: uri.path().to_string(),
        id,
        headers: headers
            .iter()
            .filter(|(name, _)| **name != header::COOKIE)
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect(),
        cookie: headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(parse_cookies)
            .collect(),
        body: parse_body(body),
    }
}

/// `a=1; b=2` into pairs. Pieces without `=` are dropped.
pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

fn parse_body(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cookies_split_on_semicolons() {
        assert_eq!(
            parse_cookies("session=abc; theme = dark;broken"),
            vec![
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn body_is_json_text_or_null() {
        assert_eq!(parse_body(br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body(b"hello"), json!("hello"));
        assert_eq!(parse_body(b""), Value::Null);
    }

    #[test]
    fn echo_uses_camel_case() {
        let echo = Echo {
            request_id: Uuid::nil(),
            method: "GET".to_string(),
            path: "/echo".to_string(),
            id: None,
            headers: BTreeMap::new(),
            cookie: BTreeMap::new(),
            body: Value::Null,
        };
        let json = serde_json::to_value(&echo).unwrap();
        assert_eq!(json["requestId"], "00000000-0000-0000-0000-000000000000");
        assert!(json["id"].is_null());
    }
}
