use crate::commands::{home_summary, separator};
use crate::config as store;
use crate::paths::ZdevHome;
use crate::process::is_process_running;
use crate::proxy;
use anyhow::Result;
use chrono::Local;
use colored::Colorize;

pub fn run(home: &ZdevHome, json: bool) -> Result<()> {
    let config = store::load(home)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("{}\n", "zdev Status".bold());
    home_summary(home);

    let traefik = proxy::traefik_running();
    match (traefik, config.domain()) {
        (true, Some(domain)) => println!("Traefik:   running (*.{domain})"),
        (true, None) => println!("Traefik:   running (no devDomain set)"),
        (false, _) => println!("Traefik:   not running"),
    }

    println!("\n{}", separator(60));

    if config.allocations.is_empty() {
        println!("\nNo active features.\n");
        println!("Start one with: zdev start <feature-name> --project <path>");
        return Ok(());
    }

    println!("\nActive Features ({}):\n", config.allocations.len());

    for (name, alloc) in &config.allocations {
        let worktree = home.worktree_path(name);
        let running = |pid: Option<u32>| pid.is_some_and(is_process_running);
        let frontend_running = running(alloc.pids.frontend);
        let convex_running = running(alloc.pids.convex);
        let expects_convex = alloc.convex().is_some();

        let status = match (frontend_running, convex_running || !expects_convex) {
            (true, true) => "●".green(),
            (false, false) => "●".red(),
            _ => "●".yellow(),
        };

        println!("{status} {}", name.bold());
        println!("   Project:  {}", alloc.project);
        println!("   Branch:   {}", alloc.branch);
        println!(
            "   Path:     {}{}",
            worktree.display(),
            if worktree.exists() { "" } else { " (missing)" }
        );
        println!("   Local:    http://localhost:{}", alloc.frontend_port);
        if let (Some(route), Some(domain)) = (alloc.route(), config.domain()) {
            println!("   Public:   {}", proxy::public_url(route, domain));
        }
        match alloc.pids.frontend.filter(|_| frontend_running) {
            Some(pid) => println!("   Frontend: running (PID: {pid})"),
            None => println!("   Frontend: stopped"),
        }
        if expects_convex {
            match alloc.pids.convex.filter(|_| convex_running) {
                Some(pid) => println!("   Convex:   running (PID: {pid})"),
                None => println!("   Convex:   stopped"),
            }
        }
        println!(
            "   Started:  {}",
            alloc.started.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
        );
        println!();
    }

    println!("{}", separator(60));
    println!("\nCommands:");
    println!("   zdev stop <feature>    Stop servers for a feature");
    println!("   zdev clean <feature>   Remove worktree after merge");

    Ok(())
}
