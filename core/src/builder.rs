//! Turns panel state into an outbound `RequestDescriptor`.
//!
//! # Design
//! Pure functions only; nothing here touches the bridge or the network.
//! `build` runs the steps in a fixed order: path substitution, cookie
//! assembly, header assembly, then the merge into one descriptor. Each step
//! is exposed on its own so it can be tested in isolation.

use std::collections::BTreeMap;

use crate::http::{RequestDescriptor, RequestHeaders};
use crate::state::PanelState;
use crate::types::KeyValue;

/// Build the descriptor for the selected url, or `None` if no url is
/// selected.
pub fn build(state: &PanelState) -> Option<RequestDescriptor> {
    let url = state.url.selected()?;

    let base_url = substitute_path(&url.href, &state.path_params);
    let cookies = assemble_cookies(&state.cookies);
    let mut values = assemble_headers(&state.headers);

    let cookie = if cookies.is_empty() {
        None
    } else {
        values.retain(|key, _| !key.eq_ignore_ascii_case("cookie"));
        Some(cookies)
    };

    Some(RequestDescriptor {
        headers: RequestHeaders { values, cookie },
        base_url,
        method: state.method.clone(),
        data: state.body.clone(),
    })
}

/// Replace each `:name` token in the path component of `href` with the
/// percent-encoded value of a non-empty param. Tokens with no value are left
/// as they are.
pub fn substitute_path(href: &str, params: &BTreeMap<String, String>) -> String {
    let (start, end) = path_bounds(href);
    let mut path = href[start..end].to_string();

    for (name, value) in params {
        if name.is_empty() || value.is_empty() {
            continue;
        }
        path = replace_token(&path, name, &urlencoding::encode(value));
    }

    format!("{}{}{}", &href[..start], path, &href[end..])
}

/// Names of the `:name` placeholders in the path component of `href`, in
/// order of appearance, without duplicates.
pub fn path_placeholders(href: &str) -> Vec<String> {
    let (start, end) = path_bounds(href);
    let path = &href[start..end];

    let mut names: Vec<String> = Vec::new();
    for segment in path.split(':').skip(1) {
        let name: String = segment.chars().take_while(|c| is_ident(*c)).collect();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Complete cookie rows as `"key = value"`, in input order.
pub fn assemble_cookies(cookies: &[KeyValue]) -> Vec<String> {
    cookies
        .iter()
        .filter(|cookie| cookie.is_complete())
        .map(|cookie| format!("{} = {}", cookie.key, cookie.value))
        .collect()
}

/// Complete header rows folded into a map; a later duplicate key wins.
pub fn assemble_headers(headers: &[KeyValue]) -> BTreeMap<String, String> {
    headers
        .iter()
        .filter(|header| header.is_complete())
        .map(|header| (header.key.clone(), header.value.clone()))
        .collect()
}

/// Byte range of the path component: after `scheme://authority`, before
/// any `?` or `#`. Relative hrefs are all path up to the query.
fn path_bounds(href: &str) -> (usize, usize) {
    let start = match href.find("://") {
        Some(scheme_end) => {
            let authority = scheme_end + 3;
            href[authority..]
                .find(['/', '?', '#'])
                .map_or(href.len(), |offset| authority + offset)
        }
        None => 0,
    };
    let end = href[start..]
        .find(['?', '#'])
        .map_or(href.len(), |offset| start + offset);
    (start, end)
}

fn replace_token(path: &str, name: &str, value: &str) -> String {
    let token = format!(":{name}");
    let mut out = String::with_capacity(path.len());
    let mut rest = path;

    while let Some(pos) = rest.find(&token) {
        let after = &rest[pos + token.len()..];
        out.push_str(&rest[..pos]);
        // `:id` must not match the front of `:idx`.
        if after.chars().next().is_some_and(is_ident) {
            out.push_str(&token);
        } else {
            out.push_str(value);
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

fn is_ident(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
