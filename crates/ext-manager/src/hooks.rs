//! Start-time hooks
//!
//! Descriptors may declare `global_routes` and `listeners` hooks. A hook is
//! either the name of a callback the host registered in a [`HookRegistry`],
//! or a command table executed inside the extension directory:
//!
//! ```toml
//! global_routes = "menus.routes"
//! listeners = { command = "sh", args = ["-c", "echo ready"] }
//! ```
//!
//! Values of any other shape resolve to [`Hook::NotInvokable`]; the manager
//! reports them when it reaches the hook during start.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use crate::{Error, Result};

/// A zero-argument host callback.
pub type HookFn = Arc<dyn Fn() + Send + Sync>;

/// Named callbacks that descriptors can refer to.
#[derive(Clone, Default)]
pub struct HookRegistry {
    callbacks: HashMap<String, HookFn>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: impl Into<String>, callback: F) -> &mut Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.insert(name.into(), Arc::new(callback));
        self
    }

    pub fn with<F>(mut self, name: impl Into<String>, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.register(name, callback);
        self
    }

    pub fn get(&self, name: &str) -> Option<HookFn> {
        self.callbacks.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.callbacks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("callbacks", &self.names())
            .finish()
    }
}

/// A hook declared by a descriptor, resolved at load time.
#[derive(Clone)]
pub enum Hook {
    /// Host callback looked up by name.
    Callback { name: String, callback: HookFn },
    /// Subprocess run in the extension directory.
    Command { command: String, args: Vec<String> },
    /// Declared, but with a value that cannot be called.
    NotInvokable { found: String },
}

impl Hook {
    /// Interpret a descriptor value against the registered callbacks.
    pub fn resolve(value: &toml::Value, registry: &HookRegistry) -> Self {
        match value {
            toml::Value::String(name) => match registry.get(name) {
                Some(callback) => Hook::Callback {
                    name: name.clone(),
                    callback,
                },
                None => Hook::NotInvokable {
                    found: format!("unregistered callback '{name}'"),
                },
            },
            toml::Value::Table(table) => {
                let Some(command) = table.get("command").and_then(|c| c.as_str()) else {
                    return Hook::NotInvokable {
                        found: "table without a `command` string".to_string(),
                    };
                };
                let args = match table.get("args") {
                    None => Vec::new(),
                    Some(toml::Value::Array(items)) => {
                        let strings: Option<Vec<String>> = items
                            .iter()
                            .map(|a| a.as_str().map(str::to_string))
                            .collect();
                        match strings {
                            Some(args) => args,
                            None => {
                                return Hook::NotInvokable {
                                    found: "command with non-string args".to_string(),
                                };
                            }
                        }
                    }
                    Some(other) => {
                        return Hook::NotInvokable {
                            found: format!("command with {} args", other.type_str()),
                        };
                    }
                };
                Hook::Command {
                    command: command.to_string(),
                    args,
                }
            }
            other => Hook::NotInvokable {
                found: other.type_str().to_string(),
            },
        }
    }

    pub fn is_invokable(&self) -> bool {
        !matches!(self, Hook::NotInvokable { .. })
    }

    /// Run the hook for `slug`. `dir` is the extension directory.
    pub fn invoke(&self, slug: &str, hook: &'static str, dir: &Path) -> Result<()> {
        match self {
            Hook::Callback { name, callback } => {
                tracing::debug!(slug, hook, callback = %name, "Invoking hook callback");
                callback();
                Ok(())
            }
            Hook::Command { command, args } => run_command(slug, hook, command, args, dir),
            Hook::NotInvokable { found } => Err(Error::InvalidHookType {
                slug: slug.to_string(),
                hook,
                found: found.clone(),
            }),
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Callback { name, .. } => f.debug_struct("Callback").field("name", name).finish(),
            Hook::Command { command, args } => f
                .debug_struct("Command")
                .field("command", command)
                .field("args", args)
                .finish(),
            Hook::NotInvokable { found } => {
                f.debug_struct("NotInvokable").field("found", found).finish()
            }
        }
    }
}

fn run_command(
    slug: &str,
    hook: &'static str,
    command: &str,
    args: &[String],
    dir: &Path,
) -> Result<()> {
    tracing::debug!(slug, hook, command, ?args, dir = %dir.display(), "Running hook command");

    let output = Command::new(command)
        .args(args)
        .current_dir(dir)
        .env("EXTENSION_SLUG", slug)
        .output()
        .map_err(|e| Error::HookFailed {
            slug: slug.to_string(),
            hook,
            message: format!("failed to spawn '{command}': {e}"),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if !stdout.trim().is_empty() {
        tracing::debug!(slug, hook, "{}", stdout.trim());
    }

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    let message = if stderr.is_empty() {
        format!("exited with status {:?}", output.status.code())
    } else {
        format!("exited with status {:?}: {}", output.status.code(), stderr)
    };
    Err(Error::HookFailed {
        slug: slug.to_string(),
        hook,
        message,
    })
}
