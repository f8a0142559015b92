//! Schema migration collaborator
//!
//! The manager runs migrations once per install, after the extension has been
//! started, and asks the runner to bootstrap itself during `prepare`. What a
//! migration does is up to the runner.

use std::path::{Path, PathBuf};
use std::process::Command;

/// Failure reported by a [`MigrationRunner`].
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    /// Migration command ran and exited unsuccessfully
    #[error("Migrations for '{slug}' failed: {message}")]
    Failed { slug: String, message: String },

    /// Bootstrap command ran and exited unsuccessfully
    #[error("Migration bootstrap failed: {message}")]
    Prepare { message: String },

    /// Command could not be spawned
    #[error("Failed to run migration command '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Runs per-extension migrations.
pub trait MigrationRunner: Send + Sync {
    /// Create whatever bookkeeping the runner needs. Must tolerate being
    /// called when that bookkeeping already exists.
    fn prepare(&self) -> Result<(), MigrationError> {
        Ok(())
    }

    /// Apply all pending migrations of `slug`.
    fn run_migrations(&self, slug: &str) -> Result<(), MigrationError>;
}

/// Runner for hosts without migrations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMigrations;

impl MigrationRunner for NoMigrations {
    fn run_migrations(&self, slug: &str) -> Result<(), MigrationError> {
        tracing::debug!(slug, "No migration runner configured");
        Ok(())
    }
}

/// Runner that shells out to a configured command.
///
/// The extension slug is exported as `EXTENSION_SLUG`, and `{slug}` in the
/// command is replaced by a quoted reference to that variable. Commands run from `workdir` with their output
/// captured; stdout is logged at debug level and stderr is included in the
/// error when the command fails.
#[derive(Debug, Clone)]
pub struct CommandMigrations {
    command: String,
    prepare: Option<String>,
    workdir: PathBuf,
}

impl CommandMigrations {
    pub fn new(command: impl Into<String>, workdir: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            prepare: None,
            workdir: workdir.into(),
        }
    }

    /// Command run once by [`MigrationRunner::prepare`].
    pub fn with_prepare(mut self, command: impl Into<String>) -> Self {
        self.prepare = Some(command.into());
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}

impl MigrationRunner for CommandMigrations {
    fn prepare(&self) -> Result<(), MigrationError> {
        let Some(cmd) = &self.prepare else {
            return Ok(());
        };
        run_shell(cmd, None, &self.workdir)
            .map_err(|e| match e {
                ShellFailure::Spawn(source) => MigrationError::Spawn {
                    command: cmd.clone(),
                    source,
                },
                ShellFailure::Exit(message) => MigrationError::Prepare { message },
            })
    }

    fn run_migrations(&self, slug: &str) -> Result<(), MigrationError> {
        let cmd = self.command.replace("{slug}", SLUG_REFERENCE);
        tracing::info!(slug, command = %cmd, "Running extension migrations");
        run_shell(&cmd, Some(slug), &self.workdir).map_err(|e| match e {
            ShellFailure::Spawn(source) => MigrationError::Spawn {
                command: cmd.clone(),
                source,
            },
            ShellFailure::Exit(message) => MigrationError::Failed {
                slug: slug.to_string(),
                message,
            },
        })
    }
}

/// `{slug}` expands to the exported variable, so the shell never parses the
/// slug itself.
#[cfg(windows)]
const SLUG_REFERENCE: &str = "\"%EXTENSION_SLUG%\"";
#[cfg(not(windows))]
const SLUG_REFERENCE: &str = "\"$EXTENSION_SLUG\"";

enum ShellFailure {
    Spawn(std::io::Error),
    Exit(String),
}

fn shell_command(cmd_str: &str) -> Command {
    #[cfg(windows)]
    {
        let mut c = Command::new("cmd");
        c.args(["/C", cmd_str]);
        c
    }
    #[cfg(not(windows))]
    {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd_str);
        c
    }
}

fn run_shell(cmd: &str, slug: Option<&str>, workdir: &Path) -> Result<(), ShellFailure> {
    let mut command = shell_command(cmd);
    command.current_dir(workdir);
    if let Some(slug) = slug {
        command.env("EXTENSION_SLUG", slug);
    }

    let output = command.output().map_err(ShellFailure::Spawn)?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!(command = cmd, "{}", stdout.trim());
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(ShellFailure::Exit(if stderr.is_empty() {
        format!("exited with status {:?}", output.status.code())
    } else {
        format!("exited with status {:?}: {}", output.status.code(), stderr)
    }))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn slug_is_substituted_and_exported() {
        let dir = tempdir().unwrap();
        let runner = CommandMigrations::new(
            "echo {slug} > migrated && echo $EXTENSION_SLUG >> migrated",
            dir.path(),
        );

        runner.run_migrations("menus").unwrap();

        let out = std::fs::read_to_string(dir.path().join("migrated")).unwrap();
        assert_eq!(out, "menus\nmenus\n");
    }

    #[test]
    fn slug_is_not_interpreted_by_the_shell() {
        let dir = tempdir().unwrap();
        let runner = CommandMigrations::new("echo {slug} > migrated", dir.path());

        runner.run_migrations("a; touch injected $(id)").unwrap();

        assert!(!dir.path().join("injected").exists());
        let out = std::fs::read_to_string(dir.path().join("migrated")).unwrap();
        assert_eq!(out, "a; touch injected $(id)\n");
    }

    #[test]
    fn failure_carries_stderr() {
        let dir = tempdir().unwrap();
        let runner = CommandMigrations::new("echo 'no such table' >&2; exit 1", dir.path());

        let err = runner.run_migrations("menus").unwrap_err();
        match err {
            MigrationError::Failed { slug, message } => {
                assert_eq!(slug, "menus");
                assert!(message.contains("no such table"), "message: {message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn prepare_without_command_is_noop() {
        let dir = tempdir().unwrap();
        CommandMigrations::new("true", dir.path()).prepare().unwrap();
    }

    #[test]
    fn prepare_runs_bootstrap_command() {
        let dir = tempdir().unwrap();
        let runner = CommandMigrations::new("true", dir.path()).with_prepare("touch bootstrapped");

        runner.prepare().unwrap();
        runner.prepare().unwrap();
        assert!(dir.path().join("bootstrapped").exists());
    }

    #[test]
    fn failing_bootstrap_is_reported() {
        let dir = tempdir().unwrap();
        let runner = CommandMigrations::new("true", dir.path()).with_prepare("exit 2");

        assert!(matches!(runner.prepare(), Err(MigrationError::Prepare { .. })));
    }
}
