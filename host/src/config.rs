//! Host settings, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

pub const ROOT_ENV: &str = "REQPANEL_ROOT";
pub const STORAGE_ENV: &str = "REQPANEL_STORAGE";
pub const EDITOR_ENV: &str = "REQPANEL_EDITOR";
pub const TERMINAL_ENV: &str = "REQPANEL_TERMINAL";
pub const PORT_ENV: &str = "REQPANEL_PORT";
pub const HTTP_TIMEOUT_ENV: &str = "REQPANEL_HTTP_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConfig {
    /// Directory scanned for server source.
    pub root: PathBuf,
    /// Where the catalog and presets are kept. `None` keeps them in memory.
    pub storage_path: Option<PathBuf>,
    pub editor_command: String,
    pub terminal_command: String,
    /// Port used when building hrefs for discovered routes.
    pub server_port: u16,
    pub http_timeout: Duration,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            storage_path: None,
            editor_command: "code".to_string(),
            terminal_command: "x-terminal-emulator".to_string(),
            server_port: 3000,
            http_timeout: Duration::from_secs(30),
        }
    }
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            root: non_empty(ROOT_ENV).map(PathBuf::from).unwrap_or(defaults.root),
            storage_path: non_empty(STORAGE_ENV).map(PathBuf::from),
            editor_command: non_empty(EDITOR_ENV).unwrap_or(defaults.editor_command),
            terminal_command: non_empty(TERMINAL_ENV).unwrap_or(defaults.terminal_command),
            server_port: non_empty(PORT_ENV)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.server_port),
            http_timeout: non_empty(HTTP_TIMEOUT_ENV)
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.http_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(HostConfig::from_lookup(lookup(&[])), HostConfig::default());
    }

    #[test]
    fn values_are_read_and_blank_ones_ignored() {
        let config = HostConfig::from_lookup(lookup(&[
            (ROOT_ENV, "/srv/api"),
            (STORAGE_ENV, "/tmp/reqpanel.json"),
            (EDITOR_ENV, "  "),
            (PORT_ENV, "8080"),
            (HTTP_TIMEOUT_ENV, "1500"),
        ]));
        assert_eq!(config.root, PathBuf::from("/srv/api"));
        assert_eq!(config.storage_path, Some(PathBuf::from("/tmp/reqpanel.json")));
        assert_eq!(config.editor_command, "code");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.http_timeout, Duration::from_millis(1500));
    }

    #[test]
    fn bad_port_falls_back() {
        let config = HostConfig::from_lookup(lookup(&[(PORT_ENV, "http")]));
        assert_eq!(config.server_port, 3000);
    }
}
