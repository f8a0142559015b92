//! Extension Manager CLI
//!
//! Administrative commands over the extension ledger of a project.

mod cli;
mod commands;
mod error;

use clap::Parser;
use colored::Colorize;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use cli::{Cli, Commands, ListScope};
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e.with_hint());
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let result = if verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };
    if let Err(e) = result {
        eprintln!("{}: {}", "warning".yellow().bold(), e);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    tracing::debug!(root = %cli.root.display(), config = ?cli.config, "Verbose mode enabled");

    let Some(command) = cli.command else {
        println!("{} Extension Manager CLI", "extmgr".green().bold());
        println!();
        println!("Run {} for available commands.", "extmgr --help".cyan());
        return Ok(());
    };

    let manager = commands::open_manager(&cli.root, cli.config.as_deref())?;

    match command {
        Commands::Prepare => commands::run_prepare(&manager),
        Commands::List {
            installed,
            enabled,
            disabled,
            uninstalled,
            json,
        } => commands::run_list(
            &manager,
            ListScope::from_flags(installed, enabled, disabled, uninstalled),
            json,
        ),
        Commands::Info { slug, json } => commands::run_info(&manager, &slug, json),
        Commands::Install { slug, enable } => commands::run_install(&manager, &slug, enable),
        Commands::Enable { id } => commands::run_enable(&manager, id),
        Commands::Disable { id } => commands::run_disable(&manager, id),
        Commands::Start { slug } => commands::run_start(&manager, slug.as_deref()),
        Commands::Sort { slugs } => commands::run_sort(&manager, &slugs),
    }
}
