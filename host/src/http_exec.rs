//! Executes a `RequestDescriptor` with ureq.
//!
//! Blocking; callers run it on a blocking task. Status codes are returned
//! as data, so a 404 or 500 is a response, not an error.

use std::collections::BTreeMap;
use std::time::Duration;

use reqpanel_core::{HttpResponse, RequestDescriptor};
use serde_json::Value;
use ureq::http;

use crate::error::HostError;

pub fn execute(request: &RequestDescriptor, timeout: Duration) -> Result<HttpResponse, HostError> {
    let agent = ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(Some(timeout))
        .build()
        .new_agent();

    let mut builder = http::Request::builder()
        .method(request.method.to_ascii_uppercase().as_str())
        .uri(request.base_url.as_str());
    for (key, value) in &request.headers.values {
        builder = builder.header(key.as_str(), value.as_str());
    }
    if let Some(cookies) = &request.headers.cookie {
        builder = builder.header("cookie", cookie_header(cookies));
    }

    let result = if request.data.is_empty() {
        agent.run(builder.body(()).map_err(http_error)?)
    } else {
        agent.run(builder.body(request.data.clone()).map_err(http_error)?)
    };
    let mut response = result.map_err(http_error)?;

    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response.body_mut().read_to_string().map_err(http_error)?;

    Ok(HttpResponse {
        status,
        headers,
        data: parse_body(body),
    })
}

/// `"a = 1"` rows become `a=1; b=2`.
pub fn cookie_header(cookies: &[String]) -> String {
    cookies
        .iter()
        .map(|cookie| match cookie.split_once('=') {
            Some((key, value)) => format!("{}={}", key.trim(), value.trim()),
            None => cookie.trim().to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// JSON bodies are handed back parsed; anything else as a string.
fn parse_body(body: String) -> Value {
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

fn http_error(err: impl std::fmt::Display) -> HostError {
    HostError::Http(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn cookie_rows_are_joined() {
        let cookies = vec!["a = 1".to_string(), "b = x=y".to_string()];
        assert_eq!(cookie_header(&cookies), "a=1; b=x=y");
    }

    #[test]
    fn body_parses_json_or_falls_back_to_text() {
        assert_eq!(parse_body(r#"{"ok":true}"#.to_string()), json!({"ok": true}));
        assert_eq!(parse_body("plain".to_string()), json!("plain"));
    }
}
