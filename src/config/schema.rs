use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_FRONTEND_PORT: u16 = 5173;
pub const DEFAULT_CONVEX_PORT: u16 = 3210;
pub const DEFAULT_DOCKER_HOST_IP: &str = "172.17.0.1";
pub const DEFAULT_TRAEFIK_CONFIG_DIR: &str = "/infra/traefik/dynamic";

/// Persistent zdev state, stored as `config.json` under the zdev home.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ZdevConfig {
    pub next_frontend_port: u16,
    pub next_convex_port: u16,
    /// Files copied from the main checkout into each new worktree
    pub copy_patterns: Vec<String>,
    /// How Traefik (in Docker) reaches services on the host
    pub docker_host_ip: String,
    /// Public dev domain, e.g. `dev.example.com`; empty disables public URLs
    pub dev_domain: String,
    /// Traefik dynamic config directory
    pub traefik_config_dir: PathBuf,
    /// Active features keyed by `<repo>-<feature>`
    pub allocations: BTreeMap<String, WorktreeAllocation>,
}

impl Default for ZdevConfig {
    fn default() -> Self {
        Self {
            next_frontend_port: DEFAULT_FRONTEND_PORT,
            next_convex_port: DEFAULT_CONVEX_PORT,
            copy_patterns: vec![
                ".env.local".to_string(),
                ".env.development".to_string(),
                ".env.development.local".to_string(),
            ],
            docker_host_ip: DEFAULT_DOCKER_HOST_IP.to_string(),
            dev_domain: String::new(),
            traefik_config_dir: PathBuf::from(DEFAULT_TRAEFIK_CONFIG_DIR),
            allocations: BTreeMap::new(),
        }
    }
}

/// One running (or stopped but tracked) feature environment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorktreeAllocation {
    pub project: String,
    pub project_path: PathBuf,
    pub branch: String,
    /// Sub-directory holding package.json, `.` for the worktree root
    #[serde(default = "default_web_dir")]
    pub web_dir: String,
    pub frontend_port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convex_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devtools_port: Option<u16>,
    /// Traefik route file name, when a public route was set up
    #[serde(default, alias = "funnelPath", skip_serializing_if = "Option::is_none")]
    pub route_name: Option<String>,
    #[serde(default)]
    pub pids: ProcessIds,
    pub started: DateTime<Utc>,
}

fn default_web_dir() -> String {
    ".".to_string()
}

impl WorktreeAllocation {
    /// Route name, ignoring the empty string older stores used for "none".
    pub fn route(&self) -> Option<&str> {
        self.route_name.as_deref().filter(|name| !name.is_empty())
    }

    pub fn convex(&self) -> Option<u16> {
        self.convex_port.filter(|port| *port != 0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frontend: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub convex: Option<u32>,
}

/// Scalar keys settable through `zdev config --set key=value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    DevDomain,
    DockerHostIp,
    TraefikConfigDir,
}

impl ConfigKey {
    pub const ALL: [ConfigKey; 3] = [
        ConfigKey::DevDomain,
        ConfigKey::DockerHostIp,
        ConfigKey::TraefikConfigDir,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConfigKey::DevDomain => "devDomain",
            ConfigKey::DockerHostIp => "dockerHostIp",
            ConfigKey::TraefikConfigDir => "traefikConfigDir",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ConfigKey::DevDomain => "Dev domain for public URLs",
            ConfigKey::DockerHostIp => "Docker host IP for Traefik",
            ConfigKey::TraefikConfigDir => "Traefik dynamic config directory",
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownConfigKey(pub String);

impl fmt::Display for UnknownConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown config key: {}", self.0)
    }
}

impl std::error::Error for UnknownConfigKey {}

impl FromStr for ConfigKey {
    type Err = UnknownConfigKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| UnknownConfigKey(s.to_string()))
    }
}

impl ZdevConfig {
    pub fn set(&mut self, key: ConfigKey, value: &str) {
        match key {
            ConfigKey::DevDomain => self.dev_domain = value.to_string(),
            ConfigKey::DockerHostIp => self.docker_host_ip = value.to_string(),
            ConfigKey::TraefikConfigDir => self.traefik_config_dir = PathBuf::from(value),
        }
    }

    pub fn get(&self, key: ConfigKey) -> String {
        match key {
            ConfigKey::DevDomain => self.dev_domain.clone(),
            ConfigKey::DockerHostIp => self.docker_host_ip.clone(),
            ConfigKey::TraefikConfigDir => self.traefik_config_dir.display().to_string(),
        }
    }

    /// Returns false when the pattern was already configured.
    pub fn add_copy_pattern(&mut self, pattern: &str) -> bool {
        if self.copy_patterns.iter().any(|p| p == pattern) {
            return false;
        }
        self.copy_patterns.push(pattern.to_string());
        true
    }

    /// Returns false when the pattern was not configured.
    pub fn remove_copy_pattern(&mut self, pattern: &str) -> bool {
        let before = self.copy_patterns.len();
        self.copy_patterns.retain(|p| p != pattern);
        self.copy_patterns.len() != before
    }

    /// The configured dev domain, if any.
    pub fn domain(&self) -> Option<&str> {
        Some(self.dev_domain.trim()).filter(|d| !d.is_empty())
    }

    /// Find a feature's allocation.
    ///
    /// With a repo name the key must be exactly `<repo>-<feature>`; without
    /// one the first key ending in `-<feature>` wins.
    pub fn find_allocation(
        &self,
        feature: &str,
        repo: Option<&str>,
    ) -> Option<(&str, &WorktreeAllocation)> {
        match repo {
            Some(repo) => {
                let key = worktree_name(repo, feature);
                self.allocations
                    .get_key_value(&key)
                    .map(|(k, v)| (k.as_str(), v))
            }
            None => {
                let suffix = format!("-{feature}");
                self.allocations
                    .iter()
                    .find(|(name, _)| name.ends_with(&suffix))
                    .map(|(k, v)| (k.as_str(), v))
            }
        }
    }
}

/// Allocation key and worktree directory name for a feature.
pub fn worktree_name(repo: &str, feature: &str) -> String {
    format!("{repo}-{feature}")
}

/// Branch created for a feature.
pub fn feature_branch(feature: &str) -> String {
    format!("feature/{feature}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allocation(project: &str) -> WorktreeAllocation {
        WorktreeAllocation {
            project: project.to_string(),
            project_path: PathBuf::from(format!("/src/{project}")),
            branch: "feature/login".to_string(),
            web_dir: "web".to_string(),
            frontend_port: 5173,
            convex_port: None,
            devtools_port: Some(42173),
            route_name: None,
            pids: ProcessIds::default(),
            started: Utc::now(),
        }
    }

    #[test]
    fn test_missing_keys_take_defaults() {
        let config: ZdevConfig = serde_json::from_str(r#"{"devDomain": "dev.example.com"}"#).unwrap();
        assert_eq!(config.dev_domain, "dev.example.com");
        assert_eq!(config.next_frontend_port, DEFAULT_FRONTEND_PORT);
        assert_eq!(config.copy_patterns.len(), 3);
        assert!(config.allocations.is_empty());
    }

    #[test]
    fn test_reads_legacy_allocation() {
        let json = r#"{
            "allocations": {
                "shop-login": {
                    "project": "shop",
                    "projectPath": "/src/shop",
                    "branch": "feature/login",
                    "webDir": "web",
                    "frontendPort": 5174,
                    "convexPort": 0,
                    "funnelPath": "",
                    "pids": { "frontend": 4242 },
                    "started": "2026-01-02T03:04:05.000Z"
                }
            }
        }"#;
        let config: ZdevConfig = serde_json::from_str(json).unwrap();
        let alloc = &config.allocations["shop-login"];
        assert_eq!(alloc.frontend_port, 5174);
        assert_eq!(alloc.convex(), None);
        assert_eq!(alloc.route(), None);
        assert_eq!(alloc.pids.frontend, Some(4242));
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_string(&ZdevConfig::default()).unwrap();
        assert!(json.contains("\"nextFrontendPort\":5173"));
        assert!(json.contains("\"traefikConfigDir\""));
    }

    #[test]
    fn test_config_key_parse() {
        assert_eq!("devDomain".parse::<ConfigKey>(), Ok(ConfigKey::DevDomain));
        assert_eq!(
            "nope".parse::<ConfigKey>(),
            Err(UnknownConfigKey("nope".to_string()))
        );
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ZdevConfig::default();
        config.set(ConfigKey::TraefikConfigDir, "/etc/traefik");
        assert_eq!(config.get(ConfigKey::TraefikConfigDir), "/etc/traefik");
        config.set(ConfigKey::DevDomain, "dev.example.com");
        assert_eq!(config.domain(), Some("dev.example.com"));
    }

    #[test]
    fn test_copy_patterns() {
        let mut config = ZdevConfig::default();
        assert!(!config.add_copy_pattern(".env.local"));
        assert!(config.add_copy_pattern(".npmrc"));
        assert!(config.remove_copy_pattern(".npmrc"));
        assert!(!config.remove_copy_pattern(".npmrc"));
    }

    #[test]
    fn test_find_allocation() {
        let mut config = ZdevConfig::default();
        config
            .allocations
            .insert("shop-login".to_string(), allocation("shop"));
        config
            .allocations
            .insert("blog-search".to_string(), allocation("blog"));

        let (name, _) = config.find_allocation("login", None).unwrap();
        assert_eq!(name, "shop-login");
        assert!(config.find_allocation("login", Some("blog")).is_none());
        assert!(config.find_allocation("search", Some("blog")).is_some());
        assert!(config.find_allocation("checkout", None).is_none());
    }
}
