//! HTTP request and response described as plain data.
//!
//! # Design
//! The panel never performs HTTP. It builds a `RequestDescriptor`, ships it
//! to the host inside a `makeRequest` envelope, and gets back whatever the
//! host produced. `HttpResponse` is the shape the bundled host uses for
//! that answer; the panel itself stores the reply as an opaque value.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Header map for an outbound request. `cookie` is present only when at
/// least one cookie row survived filtering; the downstream HTTP layer
/// treats "no cookie field" and "empty cookie header" differently.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestHeaders {
    #[serde(flatten)]
    pub values: BTreeMap<String, String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "cookie_rows"
    )]
    pub cookie: Option<Vec<String>>,
}

/// A plain `cookie` header row arrives as a single string.
fn cookie_rows<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Rows {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<Rows>::deserialize(deserializer)?.map(|rows| match rows {
        Rows::One(row) => vec![row],
        Rows::Many(rows) => rows,
    }))
}

/// A fully assembled request, ready for the host to execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestDescriptor {
    pub headers: RequestHeaders,
    #[serde(rename = "baseURL")]
    pub base_url: String,
    pub method: String,
    pub data: String,
}

/// An HTTP response as reported back by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub data: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn descriptor_serializes_with_base_url_and_flat_headers() {
        let descriptor = RequestDescriptor {
            headers: RequestHeaders {
                values: BTreeMap::from([("accept".to_string(), "*/*".to_string())]),
                cookie: Some(vec!["a = b".to_string()]),
            },
            base_url: "http://localhost:3000/users/7".to_string(),
            method: "GET".to_string(),
            data: String::new(),
        };
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["baseURL"], "http://localhost:3000/users/7");
        assert_eq!(value["headers"]["accept"], "*/*");
        assert_eq!(value["headers"]["cookie"], json!(["a = b"]));
    }

    #[test]
    fn plain_cookie_header_decodes_as_one_row() {
        let headers: RequestHeaders =
            serde_json::from_value(json!({"accept": "*/*", "cookie": "a=1; b=2"})).unwrap();
        assert_eq!(headers.cookie, Some(vec!["a=1; b=2".to_string()]));
        assert_eq!(headers.values.len(), 1);
    }

    #[test]
    fn missing_cookie_field_stays_missing() {
        let value = serde_json::to_value(RequestHeaders::default()).unwrap();
        assert_eq!(value, json!({}));
    }
}
