use crate::config::{self as store, ConfigKey, ZdevConfig};
use crate::paths::ZdevHome;
use anyhow::{bail, Result};
use colored::Colorize;

/// What `zdev config` should do; with nothing set it lists.
#[derive(Debug, Default, Clone)]
pub struct ConfigArgs {
    pub add: Option<String>,
    pub remove: Option<String>,
    pub set: Option<String>,
    pub list: bool,
}

/// Split `key=value`; the value may itself contain `=`.
pub fn parse_assignment(assignment: &str) -> Option<(&str, &str)> {
    let (key, value) = assignment.split_once('=')?;
    if value.is_empty() {
        return None;
    }
    Some((key.trim(), value))
}

pub fn run(home: &ZdevHome, args: &ConfigArgs) -> Result<()> {
    let mut config = store::load(home)?;

    if let Some(assignment) = &args.set {
        let Some((key, value)) = parse_assignment(assignment) else {
            let mut usage = String::from("Usage: zdev config --set key=value\n\nConfigurable keys:");
            for key in ConfigKey::ALL {
                usage.push_str(&format!("\n  {:<17}{}", key.as_str(), key.description()));
            }
            bail!(usage);
        };
        let key: ConfigKey = key.parse()?;
        config.set(key, value);
        store::save(home, &config)?;
        println!("{} Set {key} = {value}", "✓".green());
        return Ok(());
    }

    if args.list || (args.add.is_none() && args.remove.is_none()) {
        print_config(home, &config);
        return Ok(());
    }

    if let Some(pattern) = &args.add {
        if config.add_copy_pattern(pattern) {
            store::save(home, &config)?;
            println!("{} Added copy pattern: {pattern}", "✓".green());
        } else {
            println!("Pattern \"{pattern}\" already exists");
        }
    }

    if let Some(pattern) = &args.remove {
        if config.remove_copy_pattern(pattern) {
            store::save(home, &config)?;
            println!("{} Removed copy pattern: {pattern}", "✓".green());
        } else {
            println!("Pattern \"{pattern}\" not found");
        }
    }

    Ok(())
}

fn print_config(home: &ZdevHome, config: &ZdevConfig) {
    println!("{}\n", "zdev Configuration".bold());
    println!("Config file: {}", home.config_path().display());

    println!("\n{}", "Traefik / Public URLs:".bold());
    for key in ConfigKey::ALL {
        println!("  {:<17}{}", key.as_str(), config.get(key));
    }

    println!("\n{}", "Copy patterns (files auto-copied to worktrees):".bold());
    if config.copy_patterns.is_empty() {
        println!("  (none)");
    }
    for pattern in &config.copy_patterns {
        println!("  - {pattern}");
    }

    println!("\n{}", "Port allocation:".bold());
    println!("  Next frontend port: {}", config.next_frontend_port);
    println!("  Next Convex port:   {}", config.next_convex_port);

    println!("\nCommands:");
    println!("  zdev config --set devDomain=dev.example.com");
    println!("  zdev config --add \".env.local\"");
    println!("  zdev config --remove \".env.local\"");
}
