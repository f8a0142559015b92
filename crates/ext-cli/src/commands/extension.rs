//! Extension command implementations.
//!
//! Handlers for every `extmgr` subcommand. Each takes an already configured
//! [`ExtensionManager`] and prints human-readable output, or JSON where the
//! command supports `--json`.

use colored::Colorize;
use ext_manager::{ExtensionManager, ExtensionMetadata, Hook};
use ext_store::Extension;
use serde_json::{Value, json};

use crate::cli::ListScope;
use crate::error::{CliError, Result};

/// Handle `extmgr prepare`
pub fn run_prepare(manager: &ExtensionManager) -> Result<()> {
    manager.prepare()?;

    println!(
        "{} Extension ledger ready at {}",
        "=>".blue().bold(),
        manager.config().store.path.display()
    );
    print_started(manager);
    Ok(())
}

/// Handle `extmgr list [--installed|--enabled|--disabled|--uninstalled] [--json]`
pub fn run_list(manager: &ExtensionManager, scope: ListScope, json: bool) -> Result<()> {
    let (records, uninstalled) = match scope {
        ListScope::All => (manager.installed(None)?, manager.uninstalled(None)?),
        ListScope::Installed => (manager.installed(None)?, Vec::new()),
        ListScope::Enabled => (manager.enabled(None)?, Vec::new()),
        ListScope::Disabled => (manager.disabled(None)?, Vec::new()),
        ListScope::Uninstalled => (Vec::new(), manager.uninstalled(None)?),
    };

    if json {
        let mut rows: Vec<Value> = Vec::with_capacity(records.len() + uninstalled.len());
        for record in &records {
            let mut row = serde_json::to_value(record)?;
            row["installed"] = json!(true);
            rows.push(row);
        }
        rows.extend(
            uninstalled
                .iter()
                .map(|slug| json!({ "slug": slug, "installed": false })),
        );
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if records.is_empty() && uninstalled.is_empty() {
        println!("{}", "No extensions found.".dimmed());
        return Ok(());
    }

    for record in &records {
        println!(
            "{:>4}  {:<20} {:<10} {}",
            record.id.to_string().dimmed(),
            record.slug.cyan(),
            record.version,
            state_label(record)
        );
    }
    for slug in &uninstalled {
        println!(
            "{:>4}  {:<20} {:<10} {}",
            "-".dimmed(),
            slug.cyan(),
            "",
            "not installed".dimmed()
        );
    }
    Ok(())
}

fn state_label(record: &Extension) -> colored::ColoredString {
    if record.enabled {
        "enabled".green()
    } else {
        "disabled".yellow()
    }
}

/// Handle `extmgr info <slug> [--json]`
pub fn run_info(manager: &ExtensionManager, slug: &str, json: bool) -> Result<()> {
    let meta = manager.info(slug)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&metadata_json(&meta))?);
        return Ok(());
    }

    let info = &meta.info;
    println!(
        "{} {} {}",
        "=>".blue().bold(),
        info.name.as_deref().unwrap_or(&meta.slug).cyan(),
        info.version.as_deref().unwrap_or("").dimmed()
    );
    println!("   {} {}", "Descriptor:".dimmed(), meta.path.display());
    if let Some(author) = &info.author {
        println!("   {} {}", "Author:".dimmed(), author);
    }
    if let Some(description) = &info.description {
        println!("   {} {}", "Description:".dimmed(), description);
    }
    if info.is_core == Some(true) {
        println!("   {} yes", "Core:".dimmed());
    }
    if !meta.dependency_slugs().is_empty() {
        println!(
            "   {} {}",
            "Depends on:".dimmed(),
            meta.dependency_slugs().join(", ").yellow()
        );
    }
    for (name, hook) in [
        ("global_routes", &meta.global_routes),
        ("listeners", &meta.listeners),
    ] {
        if let Some(hook) = hook {
            println!("   {} {}", format!("{name}:").dimmed(), describe_hook(hook));
        }
    }
    Ok(())
}

fn describe_hook(hook: &Hook) -> String {
    match hook {
        Hook::Callback { name, .. } => format!("callback {name}"),
        Hook::Command { command, args } if args.is_empty() => format!("command {command}"),
        Hook::Command { command, args } => format!("command {command} {}", args.join(" ")),
        Hook::NotInvokable { found } => format!("{} ({found})", "not invokable".red()),
    }
}

fn metadata_json(meta: &ExtensionMetadata) -> Value {
    json!({
        "slug": meta.slug,
        "path": meta.path.display().to_string(),
        "info": meta.info,
        "dependencies": meta.dependencies,
        "has_bundles": meta.bundles.is_some(),
        "global_routes": meta.global_routes.as_ref().map(describe_hook_plain),
        "listeners": meta.listeners.as_ref().map(describe_hook_plain),
    })
}

fn describe_hook_plain(hook: &Hook) -> Value {
    match hook {
        Hook::Callback { name, .. } => json!({ "callback": name }),
        Hook::Command { command, args } => json!({ "command": command, "args": args }),
        Hook::NotInvokable { found } => json!({ "invalid": found }),
    }
}

/// Handle `extmgr install <slug> [--enable]`
pub fn run_install(manager: &ExtensionManager, slug: &str, enable: bool) -> Result<()> {
    if slug.trim().is_empty() {
        return Err(CliError::user("Extension slug must not be empty"));
    }
    let record = manager.install(slug, enable)?;

    println!(
        "{} Installed '{}' as #{} ({})",
        "=>".blue().bold(),
        record.slug.cyan(),
        record.id,
        state_label(&record)
    );
    if !record.enabled {
        println!(
            "   {} Run {} to start it at boot",
            "Next:".dimmed(),
            format!("extmgr enable {}", record.id).bold()
        );
    }
    Ok(())
}

/// Handle `extmgr enable <id>`
pub fn run_enable(manager: &ExtensionManager, id: i64) -> Result<()> {
    let record = manager.enable(id)?;
    println!("{} Enabled '{}'", "=>".blue().bold(), record.slug.cyan());
    Ok(())
}

/// Handle `extmgr disable <id>`
pub fn run_disable(manager: &ExtensionManager, id: i64) -> Result<()> {
    let record = manager.disable(id)?;
    println!("{} Disabled '{}'", "=>".blue().bold(), record.slug.cyan());
    Ok(())
}

/// Handle `extmgr start [slug]`
pub fn run_start(manager: &ExtensionManager, slug: Option<&str>) -> Result<()> {
    match slug {
        Some(slug) => {
            manager.start(slug)?;
        }
        None => {
            manager.start_extensions()?;
        }
    }
    print_started(manager);
    Ok(())
}

/// Handle `extmgr sort <slug>...`
pub fn run_sort(manager: &ExtensionManager, slugs: &[String]) -> Result<()> {
    for slug in manager.sort_dependencies(slugs)? {
        println!("{slug}");
    }
    Ok(())
}

fn print_started(manager: &ExtensionManager) {
    let started = manager.started();
    if started.is_empty() {
        println!("   {}", "No extensions started.".dimmed());
    } else {
        println!("   {} {}", "Started:".dimmed(), started.join(", ").green());
    }
}
