//! Finds Express-style route declarations in server source.
//!
//! Matches calls like `app.get('/users/:id', …)` or `router.post("/x", …)`
//! line by line. Anything built dynamically (template strings with
//! interpolation, mounted sub-routers with prefixes) is not resolved.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use reqpanel_core::{DiscoveryPhase, Domain, MasterObject, UrlDescriptor};
use serde_json::{json, Value};

const SOURCE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts"];
const SKIPPED_DIRS: &[&str] = &["node_modules", "dist", "build", "target"];

static ROUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\b[A-Za-z_$][\w$]*\.(get|post|put|patch|delete|head|options|all)\(\s*['"`](/[^'"`]*)['"`]"#,
    )
    .expect("route pattern is valid")
});

static LISTEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.listen\(").expect("listen pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    pub method: String,
    pub path: String,
    /// 1-based.
    pub line: usize,
}

/// Route declarations in one source file.
pub fn scan_source(source: &str) -> Vec<RouteMatch> {
    source
        .lines()
        .enumerate()
        .flat_map(|(index, line)| {
            ROUTE.captures_iter(line).map(move |caps| {
                let method = match &caps[1] {
                    "all" => "GET".to_string(),
                    other => other.to_ascii_uppercase(),
                };
                RouteMatch {
                    method,
                    path: caps[2].to_string(),
                    line: index + 1,
                }
            })
        })
        .collect()
}

/// Source files under `root`, sorted. Dot-directories and build/dependency
/// directories are skipped.
pub fn source_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut dirs = vec![root.to_path_buf()];

    while let Some(dir) = dirs.pop() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();

            if entry.file_type()?.is_dir() {
                if !name.starts_with('.') && !SKIPPED_DIRS.contains(&name.as_str()) {
                    dirs.push(path);
                }
            } else if path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
            {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}

/// Source text of `file`. Bytes that are not UTF-8 (legacy Latin-1
/// sources) are replaced rather than failing the whole scan.
pub fn read_source(file: &Path) -> io::Result<String> {
    let bytes = fs::read(file)?;
    match String::from_utf8(bytes) {
        Ok(source) => Ok(source),
        Err(err) => {
            tracing::warn!(file = %file.display(), "source is not valid UTF-8; reading lossily");
            Ok(String::from_utf8_lossy(err.as_bytes()).into_owned())
        }
    }
}

/// Whether a source starts a server (calls `.listen(`).
pub fn starts_server(source: &str) -> bool {
    LISTEN.is_match(source)
}

/// Files that start a server.
pub fn server_paths(files: &[PathBuf]) -> io::Result<Vec<String>> {
    let mut paths = Vec::new();
    for file in files {
        if starts_server(&read_source(file)?) {
            paths.push(file.to_string_lossy().into_owned());
        }
    }
    Ok(paths)
}

/// Server metadata only; what `dataObjects` answers before discovery ran.
pub fn partial_catalog(root: &Path) -> io::Result<Value> {
    let files = source_files(root)?;
    Ok(json!({
        "serverPaths": server_paths(&files)?,
        "rootDirectory": root.to_string_lossy(),
        "phase": DiscoveryPhase::Pending,
    }))
}

/// Scan `root` and build a complete catalog. Urls are grouped into domains
/// by their first path segment and keyed by `"METHOD /path"`.
pub fn build_catalog(root: &Path, port: u16) -> io::Result<MasterObject> {
    let files = source_files(root)?;
    let mut domains: BTreeMap<String, Domain> = BTreeMap::new();
    let mut server_paths = Vec::new();

    for file in &files {
        let source = read_source(file)?;
        if starts_server(&source) {
            server_paths.push(file.to_string_lossy().into_owned());
        }
        for route in scan_source(&source) {
            let id = format!("{} {}", route.method, route.path);
            let url = UrlDescriptor {
                id: id.clone(),
                file_path: file.to_string_lossy().into_owned(),
                href: format!("http://localhost:{port}{}", route.path),
                method: Some(route.method),
                path: Some(route.path.clone()),
                extra: serde_json::Map::from_iter([("line".to_string(), json!(route.line))]),
                ..UrlDescriptor::default()
            };
            domains
                .entry(domain_of(&route.path))
                .or_default()
                .urls
                .insert(id, url);
        }
    }

    Ok(MasterObject {
        domains,
        server_paths,
        root_directory: root.to_string_lossy().into_owned(),
        phase: DiscoveryPhase::Complete,
    })
}

/// Copy saved presets from `previous` onto urls of `next` with the same id.
pub fn carry_presets(previous: &MasterObject, next: &mut MasterObject) {
    for domain in next.domains.values_mut() {
        for (id, url) in domain.urls.iter_mut() {
            if let Some(old) = previous.url(id) {
                url.presets = old.presets.clone();
            }
        }
    }
}

fn domain_of(path: &str) -> String {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .unwrap_or("/")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqpanel_core::Preset;

    const SERVER: &str = r#"
const express = require('express');
const app = express();

app.get('/users', listUsers);
app.post("/users", createUser);
router.delete(`/users/:id`, removeUser); app.all('/health', ok);

app.listen(3000);
"#;

    #[test]
    fn scans_methods_paths_and_lines() {
        let routes = scan_source(SERVER);
        let summary: Vec<_> = routes
            .iter()
            .map(|r| (r.method.as_str(), r.path.as_str(), r.line))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("GET", "/users", 5),
                ("POST", "/users", 6),
                ("DELETE", "/users/:id", 7),
                ("GET", "/health", 7),
            ]
        );
    }

    #[test]
    fn ignores_non_route_calls() {
        assert!(scan_source("map.get(key); fetch('/users'); app.get(path, h);").is_empty());
    }

    #[test]
    fn domain_is_first_segment() {
        assert_eq!(domain_of("/users/:id"), "users");
        assert_eq!(domain_of("/"), "/");
    }

    #[test]
    fn builds_catalog_from_a_tree() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.js"), SERVER).unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();
        fs::write(dir.path().join("node_modules/lib.js"), "app.get('/hidden', h);").unwrap();
        fs::write(dir.path().join("README.md"), "app.get('/docs', h);").unwrap();

        let catalog = build_catalog(dir.path(), 4000).unwrap();
        assert_eq!(catalog.phase, DiscoveryPhase::Complete);
        assert_eq!(catalog.domains.len(), 2);

        let users = &catalog.domains["users"].urls;
        assert_eq!(users.len(), 3);
        let remove = &users["DELETE /users/:id"];
        assert_eq!(remove.href, "http://localhost:4000/users/:id");
        assert!(remove.file_path.ends_with("server.js"));
        assert_eq!(remove.extra["line"], 7);

        assert_eq!(catalog.server_paths.len(), 1);
        assert!(catalog.url("GET /hidden").is_none());
    }

    #[test]
    fn non_utf8_source_does_not_fail_the_scan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.js"), SERVER).unwrap();
        let mut legacy = b"// caf\xe9\n".to_vec();
        legacy.extend_from_slice(b"app.get('/legacy', h);\napp.listen(4000);\n");
        fs::write(dir.path().join("legacy.js"), legacy).unwrap();

        let catalog = build_catalog(dir.path(), 3000).unwrap();
        assert!(catalog.url("GET /users").is_some());
        assert!(catalog.url("GET /legacy").is_some());
        assert_eq!(catalog.server_paths.len(), 2);

        let partial = partial_catalog(dir.path()).unwrap();
        assert_eq!(partial["serverPaths"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn partial_catalog_has_no_domains() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.ts"), "app.listen(8080)").unwrap();

        let partial = partial_catalog(dir.path()).unwrap();
        assert!(partial.get("domains").is_none());
        assert_eq!(partial["phase"], "pending");
        assert_eq!(partial["serverPaths"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn presets_survive_a_rescan() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("server.js"), SERVER).unwrap();

        let mut previous = build_catalog(dir.path(), 3000).unwrap();
        previous
            .url_mut("GET /users")
            .unwrap()
            .presets
            .insert("p1".to_string(), Preset::default());

        let mut next = build_catalog(dir.path(), 3000).unwrap();
        carry_presets(&previous, &mut next);
        assert!(next.url("GET /users").unwrap().presets.contains_key("p1"));
        assert!(next.url("POST /users").unwrap().presets.is_empty());
    }
}
