//! `zdev start` - worktree, ports, dev servers, vite patch, public route

use crate::commands::{separator, Project, Server};
use crate::config::{
    self as store, explicit_ports, feature_branch, worktree_name, PortAllocation, ProcessIds,
    WorktreeAllocation, ZdevConfig,
};
use crate::git;
use crate::paths::ZdevHome;
use crate::process::{run_capture, spawn_background};
use crate::proxy;
use crate::vite::{find_vite_config, patch_vite_config, PatchOptions};
use anyhow::{bail, Result};
use chrono::Utc;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

/// Sub-directories searched for the frontend's package.json, in order.
const WEB_DIR_CANDIDATES: &[&str] = &["web", "frontend", "app", "client", "packages/web", "apps/web"];

const SETUP_SCRIPT: &str = ".zdev/setup.sh";

/// Grace period for a dev server to bind before dependents use it.
const STARTUP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
pub struct StartOptions {
    pub project: PathBuf,
    pub port: Option<u16>,
    /// Skip public URL setup
    pub local: bool,
    pub seed: bool,
    pub base_branch: String,
    pub web_dir: Option<String>,
}

impl Default for StartOptions {
    fn default() -> Self {
        Self {
            project: PathBuf::from("."),
            port: None,
            local: false,
            seed: false,
            base_branch: "origin/main".to_string(),
            web_dir: None,
        }
    }
}

/// Frontend directory inside a checkout: the first candidate with a
/// package.json, then the root, then `web`.
pub fn detect_web_dir(worktree: &Path) -> String {
    WEB_DIR_CANDIDATES
        .iter()
        .find(|dir| worktree.join(dir).join("package.json").is_file())
        .map(|dir| dir.to_string())
        .or_else(|| {
            worktree
                .join("package.json")
                .is_file()
                .then(|| ".".to_string())
        })
        .unwrap_or_else(|| "web".to_string())
}

fn web_path(root: &Path, web_dir: &str) -> PathBuf {
    if web_dir == "." {
        root.to_path_buf()
    } else {
        root.join(web_dir)
    }
}

/// Copy configured files (env files etc.) that the worktree lacks.
/// Returns the patterns that were copied.
pub fn copy_patterns(patterns: &[String], from: &Path, to: &Path) -> Vec<String> {
    let mut copied = Vec::new();
    for pattern in patterns {
        let src = from.join(pattern);
        let dest = to.join(pattern);
        if !src.is_file() || dest.exists() {
            continue;
        }
        match fs::copy(&src, &dest) {
            Ok(_) => copied.push(pattern.clone()),
            Err(err) => tracing::warn!(pattern = %pattern, "could not copy: {err}"),
        }
    }
    copied
}

pub fn has_convex(worktree: &Path, web: &Path) -> bool {
    web.join("convex").exists() || worktree.join("convex").exists()
}

fn start_server(
    home: &ZdevHome,
    worktree: &str,
    server: Server,
    program: &str,
    args: &[&str],
    cwd: &Path,
) -> Option<u32> {
    let log = home.log_path(worktree, server.log_name());
    match spawn_background(program, args, cwd, &log) {
        Ok(pid) => {
            println!("  {} PID: {pid} (log: {})", server.label(), log.display());
            Some(pid)
        }
        Err(err) => {
            eprintln!("  {} Failed to start {}: {err:#}", "✗".red(), server.label());
            None
        }
    }
}

fn patch_vite(web: &Path, options: &PatchOptions) {
    let Some(vite_config) = find_vite_config(web) else {
        tracing::debug!(dir = %web.display(), "no vite config found");
        return;
    };

    let result = patch_vite_config(&vite_config, options);
    for action in &result.actions {
        println!("  {action}");
    }
    if !result.patched {
        return;
    }

    let file_name = vite_config
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    println!("  {} Patched {file_name}", "✓".green());

    // keep the worktree-local patch out of commits
    if let Err(err) = git::skip_worktree(web, &file_name) {
        tracing::warn!("could not mark {file_name} skip-worktree: {err:#}");
    }
}

fn print_ports(ports: &PortAllocation) {
    println!("\nAllocated ports:");
    println!("  Frontend: {}", ports.frontend);
    if let Some(convex) = ports.convex {
        println!("  Convex:   {convex}");
    }
    if let Some(devtools) = ports.devtools {
        println!("  Devtools: {devtools}");
    }
}

pub fn run(home: &ZdevHome, feature: &str, options: &StartOptions) -> Result<()> {
    let project = Project::open(&options.project)?;
    let name = worktree_name(&project.name, feature);
    let worktree = home.worktree_path(&name);
    let branch = feature_branch(feature);

    println!("{} {}", "Starting feature:".bold(), feature);
    println!("  Project: {}", project.name);
    println!("  Branch:  {branch}");

    let mut config: ZdevConfig = store::load(home)?;

    if config.allocations.contains_key(&name) {
        bail!(
            "Feature \"{feature}\" already exists for {}\n  Run: zdev stop {feature} --project {}",
            project.name,
            project.path.display()
        );
    }

    println!("\nFetching latest from origin...");
    if let Err(err) = git::fetch(&project.path) {
        eprintln!("  {} {err:#}, continuing anyway", "⊙".yellow());
    }

    println!("\nCreating worktree...");
    if worktree.exists() {
        bail!("Worktree path already exists: {}", worktree.display());
    }
    git::create_worktree(&project.path, &worktree, &branch, &options.base_branch)?;
    println!("  {} Created {}", "✓".green(), worktree.display());

    let web_dir = options
        .web_dir
        .clone()
        .unwrap_or_else(|| detect_web_dir(&worktree));
    let web = web_path(&worktree, &web_dir);
    println!(
        "\nWeb directory: {}",
        if web_dir == "." { "(root)" } else { web_dir.as_str() }
    );

    if !config.copy_patterns.is_empty() {
        println!("\nCopying config files...");
        let main_web = web_path(&project.path, &web_dir);
        for pattern in copy_patterns(&config.copy_patterns, &main_web, &web) {
            println!("  Copied {pattern}");
        }
    }

    let setup_script = worktree.join(SETUP_SCRIPT);
    if setup_script.is_file() {
        println!("\nRunning setup script...");
        let script = git::path_to_str(&setup_script)?;
        match run_capture("bash", &[script], Some(&web)) {
            Ok(output) if output.success() => println!("  {} Setup complete", "✓".green()),
            Ok(output) => eprintln!("  {} Setup script failed: {}", "✗".red(), output.stderr.trim()),
            Err(err) => eprintln!("  {} {err:#}", "✗".red()),
        }
    } else {
        println!(
            "\n{} No {SETUP_SCRIPT} found, skipping setup",
            "⊘".cyan()
        );
    }

    let uses_convex = has_convex(&worktree, &web);

    let seed_path = home.seed_path(&project.name);
    if options.seed && uses_convex && seed_path.is_file() {
        println!("\nImporting seed data...");
        let seed = git::path_to_str(&seed_path)?;
        match run_capture("bunx", &["convex", "import", seed], Some(&web)) {
            Ok(output) if output.success() => println!("  {} Seed data imported", "✓".green()),
            Ok(output) => eprintln!("  {} Failed to import seed: {}", "✗".red(), output.stderr.trim()),
            Err(err) => eprintln!("  {} {err:#}", "✗".red()),
        }
    }

    let ports = match options.port {
        Some(port) => explicit_ports(port, uses_convex),
        None => config.allocate_ports(uses_convex),
    };
    print_ports(&ports);

    let mut pids = ProcessIds::default();
    if uses_convex {
        println!("\nStarting Convex dev server...");
        pids.convex = start_server(
            home,
            &name,
            Server::Convex,
            "bunx",
            &["convex", "dev", "--tail-logs", "disable"],
            &web,
        );
        thread::sleep(STARTUP_GRACE);
    }

    let dev_domain = config.domain().filter(|_| !options.local);
    let mut patch_options = PatchOptions::new().server_port(ports.frontend);
    if let Some(domain) = dev_domain {
        patch_options = patch_options.dev_domain(domain);
    }
    if let Some(devtools) = ports.devtools {
        patch_options = patch_options.devtools_port(devtools);
    }
    println!("\nPatching vite config...");
    patch_vite(&web, &patch_options);

    println!("\nStarting frontend dev server...");
    let frontend_port = ports.frontend.to_string();
    pids.frontend = start_server(
        home,
        &name,
        Server::Frontend,
        "bun",
        &["dev", "--port", &frontend_port, "--host", "0.0.0.0"],
        &web,
    );

    let mut route_name = None;
    let mut public_url = None;
    if !options.local {
        match dev_domain {
            Some(domain) if proxy::traefik_running() => {
                println!("\nSetting up Traefik route...");
                thread::sleep(STARTUP_GRACE);
                match proxy::add_route(
                    &config.traefik_config_dir,
                    &name,
                    ports.frontend,
                    domain,
                    &config.docker_host_ip,
                ) {
                    Ok(_) => {
                        let url = proxy::public_url(&name, domain);
                        println!("  {} Public URL: {url}", "✓".green());
                        route_name = Some(name.clone());
                        public_url = Some(url);
                    }
                    Err(err) => eprintln!("  {} {err:#}", "✗".red()),
                }
            }
            _ => {
                println!(
                    "\n{} Traefik not running or devDomain not set, skipping public URL",
                    "⊘".cyan()
                );
                println!("  Run: zdev config --set devDomain=dev.yourdomain.com");
            }
        }
    }

    let allocation = WorktreeAllocation {
        project: project.name.clone(),
        project_path: project.path.clone(),
        branch,
        web_dir,
        frontend_port: ports.frontend,
        convex_port: ports.convex,
        devtools_port: ports.devtools,
        route_name,
        pids,
        started: Utc::now(),
    };
    config.allocations.insert(name.clone(), allocation);
    store::save(home, &config)?;
    tracing::info!(worktree = %name, "feature started");

    println!("\n{}", separator(50));
    println!("{} Feature \"{feature}\" is ready!\n", "✓".green());
    println!("Worktree: {}", worktree.display());
    println!("Local:    http://localhost:{}", ports.frontend);
    if let Some(url) = public_url {
        println!("Public:   {url}");
    }
    println!("\nCommands:");
    println!("  cd {}", worktree.display());
    println!("  zdev stop {feature} --project {}", project.path.display());
    println!("{}", separator(50));

    Ok(())
}
