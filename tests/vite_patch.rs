//! Integration tests for the vite config patcher
//!
//! Drives the on-disk entry points against config shapes seen in real
//! TanStack / Vite projects.

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zdev::vite::{find_vite_config, patch_vite_config, PatchOptions};

const DEV_DOMAIN: &str = "dev.example.com";
const DOMAIN_PATTERN: &str = ".dev.example.com";

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("vite.config.ts");
    fs::write(&path, content).unwrap();
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn domain() -> PatchOptions {
    PatchOptions::new().dev_domain(DEV_DOMAIN)
}

fn hosts_entry() -> String {
    format!("allowedHosts: [\"{DOMAIN_PATTERN}\"]")
}

// ── Skip conditions ─────────────────────────────────────────────

#[test]
fn test_blank_domain_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");

    let result = patch_vite_config(&path, &PatchOptions::new().dev_domain(""));
    assert!(!result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: no devDomain configured"]);
}

#[test]
fn test_unreadable_file() {
    let result = patch_vite_config("/nonexistent/vite.config.ts", &domain());
    assert!(!result.patched);
    assert_eq!(result.actions, vec!["could not read vite config"]);
}

#[test]
fn test_domain_already_present() {
    let dir = TempDir::new().unwrap();
    let source = format!(
        "export default defineConfig({{\n  server: {{\n    allowedHosts: [\"{DOMAIN_PATTERN}\"],\n  }},\n  plugins: [],\n}})"
    );
    let path = write_config(&dir, &source);

    let result = patch_vite_config(&path, &domain());
    assert!(!result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: domain already present"]);
    assert_eq!(read(&path), source);
}

#[test]
fn test_allow_all_true_is_kept() {
    let dir = TempDir::new().unwrap();
    let source = "export default defineConfig({\n  server: { allowedHosts: true },\n  plugins: [],\n})";
    let path = write_config(&dir, source);

    let result = patch_vite_config(&path, &domain());
    assert!(!result.patched);
    assert!(result.actions[0].ends_with("already allows all (true)"));
    assert_eq!(read(&path), source);
}

#[test]
fn test_allow_all_string_is_kept() {
    let dir = TempDir::new().unwrap();
    let source = "export default defineConfig({\n  server: {\n    allowedHosts: \"all\",\n  },\n})";
    let path = write_config(&dir, source);

    let result = patch_vite_config(&path, &domain());
    assert!(!result.patched);
    assert_eq!(
        result.actions,
        vec![r#"allowedHosts: already allows all ("all")"#]
    );
}

#[test]
fn test_unrecognized_format() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "// just a comment, no config object");

    let result = patch_vite_config(&path, &domain());
    assert!(!result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: unrecognized config format"]);
}

// ── Config idioms ───────────────────────────────────────────────

#[test]
fn test_inline_define_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: created server block"]);

    let output = read(&path);
    assert!(output.contains("server: {"));
    assert!(output.contains(&hosts_entry()));
    assert!(output.contains("plugins: []"));
}

#[test]
fn test_variable_assigned_define_config() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "import { defineConfig } from 'vite'
import viteReact from '@vitejs/plugin-react'

const config = defineConfig({
  plugins: [
    viteReact(),
  ],
})

export default config",
    );

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    let output = read(&path);
    assert!(output.contains("server: {"));
    assert!(output.contains(&hosts_entry()));
    assert!(output.ends_with("export default config"));
}

#[test]
fn test_plain_export_default_object() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default {\n  plugins: [],\n}");

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    let output = read(&path);
    assert!(output.contains("server: {"));
    assert!(output.contains(&hosts_entry()));
}

#[test]
fn test_merge_into_existing_server_block() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "export default defineConfig({\n  server: {\n    port: 3000,\n    host: \"0.0.0.0\",\n  },\n  plugins: [],\n})",
    );

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: added to server block"]);

    let output = read(&path);
    assert!(output.contains(&hosts_entry()));
    assert!(output.contains("port: 3000"));
    assert!(output.contains("host: \"0.0.0.0\""));
    assert_eq!(output.matches("server:").count(), 1);
}

#[test]
fn test_append_keeps_existing_entries_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "export default defineConfig({\n  server: {\n    allowedHosts: [\"a.test\", \"b.test\"],\n  },\n})",
    );

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    assert_eq!(result.actions, vec!["allowedHosts: appended domain"]);

    let output = read(&path);
    let a = output.find("\"a.test\"").unwrap();
    let b = output.find("\"b.test\"").unwrap();
    assert!(output.contains(&format!("\"{DOMAIN_PATTERN}\"")));
    assert!(a < b);
}

#[test]
fn test_real_world_config_keeps_sections() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "import { defineConfig } from 'vite'
import viteReact from '@vitejs/plugin-react'

const config = defineConfig({
  plugins: [
    viteReact(),
  ],
  optimizeDeps: {
    include: ['@raydium-io/raydium-sdk-v2'],
  },
  ssr: {
    external: ['lodash'],
  },
})

export default config",
    );
    let before = read(&path);

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);

    let output = read(&path);
    let plugins = output.find("plugins:").unwrap();
    let optimize = output.find("optimizeDeps:").unwrap();
    let ssr = output.find("ssr:").unwrap();
    assert!(plugins < optimize && optimize < ssr);
    assert!(output.contains("include: ['@raydium-io/raydium-sdk-v2'],"));
    assert!(output.len() > before.len());
}

// ── Ports ───────────────────────────────────────────────────────

#[test]
fn test_server_port_replaced() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "export default defineConfig({\n  server: { port: 3000, host: \"0.0.0.0\" },\n})",
    );

    let result = patch_vite_config(&path, &PatchOptions::new().server_port(5188));
    assert!(result.patched);
    assert_eq!(result.actions, vec!["server.port: replaced with 5188"]);

    let output = read(&path);
    assert!(output.contains("port: 5188"));
    assert!(!output.contains("3000"));
    assert!(output.contains("host: \"0.0.0.0\""));
}

#[test]
fn test_server_port_only_leaves_hosts_alone() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");

    let result = patch_vite_config(&path, &PatchOptions::new().server_port(5174));
    assert!(result.patched);
    let output = read(&path);
    assert!(output.contains("port: 5174,"));
    assert!(!output.contains("allowedHosts"));
}

#[test]
fn test_devtools_port_injected() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "import { devtools } from '@tanstack/devtools-vite'\n\nexport default defineConfig({\n  plugins: [devtools(), viteReact()],\n})",
    );

    let result = patch_vite_config(&path, &PatchOptions::new().devtools_port(42188));
    assert!(result.patched);
    assert!(read(&path).contains("devtools({ eventBusConfig: { port: 42188 } })"));
}

#[test]
fn test_devtools_missing_is_skipped() {
    let dir = TempDir::new().unwrap();
    let source = "export default defineConfig({ plugins: [] })";
    let path = write_config(&dir, source);

    let result = patch_vite_config(&path, &PatchOptions::new().devtools_port(42188));
    assert!(!result.patched);
    assert!(result
        .actions
        .contains(&"devtools: not found, skipped".to_string()));
    assert_eq!(read(&path), source);
}

#[test]
fn test_devtools_missing_with_other_settings() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");

    let options = PatchOptions::new().server_port(5188).devtools_port(42188);
    let result = patch_vite_config(&path, &options);
    assert!(result.patched);
    assert_eq!(
        result.actions,
        vec![
            "server.port: created server block with port 5188",
            "devtools: not found, skipped",
        ]
    );
}

#[test]
fn test_all_settings_in_order() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "export default defineConfig({\n  plugins: [devtools({ consolePiping: true })],\n})",
    );

    let options = PatchOptions::new()
        .dev_domain(DEV_DOMAIN)
        .server_port(5188)
        .devtools_port(42188);
    let result = patch_vite_config(&path, &options);
    assert!(result.patched);
    assert_eq!(
        result.actions,
        vec![
            "allowedHosts: created server block",
            "server.port: injected 5188",
            "devtools: added eventBusConfig.port 42188",
        ]
    );

    let output = read(&path);
    assert_eq!(output.matches("server:").count(), 1);
    assert!(output.contains("devtools({ eventBusConfig: { port: 42188 }, consolePiping: true })"));
}

// ── Idempotence ─────────────────────────────────────────────────

#[test]
fn test_second_run_is_a_noop() {
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        "export default defineConfig({\n  plugins: [devtools()],\n})",
    );
    let options = PatchOptions::new()
        .dev_domain(DEV_DOMAIN)
        .server_port(5188)
        .devtools_port(42188);

    let first = patch_vite_config(&path, &options);
    assert!(first.patched);
    let after_first = read(&path);

    let second = patch_vite_config(&path, &options);
    assert!(!second.patched);
    assert_eq!(read(&path), after_first);
    assert_eq!(
        second.actions,
        vec![
            "allowedHosts: domain already present",
            "server.port: already 5188",
            "devtools: eventBusConfig.port already 42188",
        ]
    );
}

// ── Discovery and the legacy wrapper ────────────────────────────

#[test]
fn test_find_vite_config_prefers_ts() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("vite.config.js"), "").unwrap();
    fs::write(dir.path().join("vite.config.ts"), "").unwrap();

    assert_eq!(
        find_vite_config(dir.path()),
        Some(dir.path().join("vite.config.ts"))
    );
    assert_eq!(find_vite_config(&dir.path().join("missing")), None);
}

#[test]
#[allow(deprecated)]
fn test_legacy_allowed_hosts_wrapper() {
    use zdev::vite::patch_vite_allowed_hosts;

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");

    let result = patch_vite_allowed_hosts(&path, DEV_DOMAIN);
    assert!(result.patched);
    assert_eq!(result.reason, "allowedHosts: created server block");

    let again = patch_vite_allowed_hosts(&path, DEV_DOMAIN);
    assert!(!again.patched);
    assert_eq!(again.reason, "allowedHosts: domain already present");
}

#[cfg(unix)]
#[test]
fn test_patch_keeps_permissions() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "export default defineConfig({ plugins: [] })");
    fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
    assert_eq!(mode, 0o640);
}

#[cfg(unix)]
#[test]
fn test_write_failure_is_reported() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let locked = dir.path().join("locked");
    fs::create_dir(&locked).unwrap();
    let source = "export default defineConfig({ plugins: [] })";
    let path = locked.join("vite.config.ts");
    fs::write(&path, source).unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o555)).unwrap();

    // root ignores directory permissions
    if fs::write(locked.join("canary"), "").is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let result = patch_vite_config(&path, &domain());
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

    assert!(!result.patched);
    assert_eq!(
        result.actions,
        vec!["allowedHosts: created server block", "could not write vite config"]
    );
    assert_eq!(read(&path), source);
}

#[cfg(unix)]
#[test]
fn test_patch_replaces_file_and_detaches_hard_links() {
    let dir = TempDir::new().unwrap();
    let source = "export default defineConfig({ plugins: [] })";
    let path = write_config(&dir, source);
    let link = dir.path().join("linked.config.ts");
    fs::hard_link(&path, &link).unwrap();

    let result = patch_vite_config(&path, &domain());
    assert!(result.patched);
    assert!(read(&path).contains(&hosts_entry()));
    assert_eq!(read(&link), source);
}
