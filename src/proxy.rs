//! Traefik dynamic-config routes for public feature URLs.

use crate::edit::atomic_write;
use crate::process::run_capture;
use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const TRAEFIK_API: &str = "http://localhost:8080/api/overview";

/// Route file for `name` inside the Traefik config dir.
pub fn route_path(config_dir: &Path, name: &str) -> PathBuf {
    config_dir.join(format!("{name}.yml"))
}

/// Public URL served by a route.
pub fn public_url(name: &str, dev_domain: &str) -> String {
    format!("https://{name}.{dev_domain}")
}

/// Traefik dynamic configuration for one feature.
pub fn render_route(name: &str, port: u16, dev_domain: &str, docker_host_ip: &str) -> String {
    format!(
        r#"# zdev auto-generated config for {name}
http:
  routers:
    {name}:
      rule: "Host(`{name}.{dev_domain}`)"
      entrypoints:
        - websecure
      service: {name}
      tls:
        certResolver: myresolver

  services:
    {name}:
      loadBalancer:
        servers:
          - url: "http://{docker_host_ip}:{port}"
"#
    )
}

pub fn add_route(
    config_dir: &Path,
    name: &str,
    port: u16,
    dev_domain: &str,
    docker_host_ip: &str,
) -> Result<PathBuf> {
    let path = route_path(config_dir, name);
    let yaml = render_route(name, port, dev_domain, docker_host_ip);
    atomic_write(&path, yaml.as_bytes())
        .with_context(|| format!("failed to write route {}", path.display()))?;
    tracing::debug!(route = %path.display(), "added traefik route");
    Ok(path)
}

/// Remove a route file. A route that is already gone counts as removed.
pub fn remove_route(config_dir: &Path, name: &str) -> Result<()> {
    let path = route_path(config_dir, name);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            Err(err).with_context(|| format!("failed to remove route {}", path.display()))
        }
    }
}

/// Whether the Traefik API answers with HTTP 200.
pub fn traefik_running() -> bool {
    run_capture(
        "curl",
        &["-s", "-o", "/dev/null", "-w", "%{http_code}", TRAEFIK_API],
        None,
    )
    .map(|output| output.success() && output.stdout.trim() == "200")
    .unwrap_or(false)
}
