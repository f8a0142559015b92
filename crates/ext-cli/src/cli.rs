//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Extension Manager - discover, install and start extensions
#[derive(Parser, Debug)]
#[command(name = "extmgr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file applied on top of the global and project config
    #[arg(long, global = true, env = "EXTMGR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Project root containing extmgr.toml and the extension roots
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create the extension ledger if missing and start enabled extensions
    Prepare,

    /// List extensions
    ///
    /// Without a filter, every discovered or installed extension is shown
    /// with its state.
    ///
    /// Examples:
    ///   extmgr list                 # Everything, with state
    ///   extmgr list --uninstalled   # Discovered but not installed
    ///   extmgr list --enabled --json
    List {
        /// Only installed extensions
        #[arg(long, group = "scope")]
        installed: bool,

        /// Only enabled extensions
        #[arg(long, group = "scope")]
        enabled: bool,

        /// Only installed but disabled extensions
        #[arg(long, group = "scope")]
        disabled: bool,

        /// Only extensions found on disk that are not installed
        #[arg(long, group = "scope")]
        uninstalled: bool,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show the descriptor of an extension
    Info {
        /// Extension slug
        slug: String,

        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Install an extension found on disk
    ///
    /// Creates its record, starts it and runs its migrations.
    Install {
        /// Extension slug (directory name)
        slug: String,

        /// Enable the extension right away
        #[arg(long)]
        enable: bool,
    },

    /// Enable an installed extension by id
    Enable {
        /// Record id, as shown by `extmgr list`
        id: i64,
    },

    /// Disable an installed extension by id
    Disable {
        /// Record id, as shown by `extmgr list`
        id: i64,
    },

    /// Start one extension, or every enabled extension when no slug is given
    Start {
        /// Extension slug
        slug: Option<String>,
    },

    /// Print slugs in dependency order
    Sort {
        /// Extension slugs to order
        #[arg(required = true)]
        slugs: Vec<String>,
    },
}

/// Which extensions `list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    All,
    Installed,
    Enabled,
    Disabled,
    Uninstalled,
}

impl ListScope {
    pub fn from_flags(installed: bool, enabled: bool, disabled: bool, uninstalled: bool) -> Self {
        match (installed, enabled, disabled, uninstalled) {
            (true, _, _, _) => ListScope::Installed,
            (_, true, _, _) => ListScope::Enabled,
            (_, _, true, _) => ListScope::Disabled,
            (_, _, _, true) => ListScope::Uninstalled,
            _ => ListScope::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["extmgr", "list", "--root", "/srv/app", "-v"]).unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.root, PathBuf::from("/srv/app"));
    }

    #[test]
    fn list_scopes_are_exclusive() {
        let err = Cli::try_parse_from(["extmgr", "list", "--enabled", "--disabled"]);
        assert!(err.is_err());
    }

    #[test]
    fn install_takes_enable_flag() {
        let cli = Cli::try_parse_from(["extmgr", "install", "menus", "--enable"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Commands::Install {
                slug: "menus".into(),
                enable: true
            })
        );
    }

    #[test]
    fn sort_requires_slugs() {
        assert!(Cli::try_parse_from(["extmgr", "sort"]).is_err());
    }

    #[test]
    fn scope_defaults_to_all() {
        assert_eq!(ListScope::from_flags(false, false, false, false), ListScope::All);
        assert_eq!(ListScope::from_flags(false, false, false, true), ListScope::Uninstalled);
    }
}
