//! # Out-of-process plugins.
//!
//! [`ExecLoader`] treats every plugin source as an executable (or a script
//! run through a configured interpreter) speaking a tiny line protocol:
//!
//! ```text
//! load   : <plugin> --describe              stdout: ["on_focus","heartbeat"]
//! invoke : <plugin> <function>              stdin : <payload JSON>\n
//!                                           stdout: one window-manager command per line
//! ```
//!
//! Both run with the plugin's own directory as working directory, so the
//! plugin finds its siblings without the daemon touching its own cwd or
//! environment. `--describe` is the unit's load step and runs once per
//! source. A non-zero exit from an invocation is a handler failure. Children
//! are killed when the invoking unit is cancelled (the future is dropped).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::handler::{Handler, HandlerContext, SharedHandler};
use super::loader::{LoadContext, Loader, Module};
use crate::error::{HandlerError, ResolveError};

/// Tracing target for plugin process operations.
const PLUGIN_TARGET: &str = "sway_dispatch::plugins::exec";

/// File extension of executable plugins.
pub const EXEC_EXTENSION: &str = "sh";

/// Argument asking a plugin to list its functions.
const DESCRIBE_ARG: &str = "--describe";

/// How to start a plugin process.
#[derive(Debug, Clone)]
struct Launcher {
    interpreter: Option<PathBuf>,
    source: PathBuf,
    dir: PathBuf,
}

impl Launcher {
    fn command(&self, arg: &str) -> Command {
        let mut cmd = match &self.interpreter {
            Some(interpreter) => {
                let mut cmd = Command::new(interpreter);
                cmd.arg(&self.source);
                cmd
            }
            None => Command::new(&self.source),
        };
        cmd.arg(arg).current_dir(&self.dir).kill_on_drop(true);
        cmd
    }
}

/// Loader for executable plugins.
#[derive(Debug, Clone)]
pub struct ExecLoader {
    interpreter: Option<PathBuf>,
}

impl Default for ExecLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecLoader {
    /// Runs plugins directly; extension [`EXEC_EXTENSION`].
    pub fn new() -> Self {
        Self { interpreter: None }
    }

    /// Runs plugins through `interpreter` (e.g. `sh`), so they need no exec bit.
    pub fn with_interpreter(mut self, interpreter: impl Into<PathBuf>) -> Self {
        self.interpreter = Some(interpreter.into());
        self
    }
}

#[async_trait]
impl Loader for ExecLoader {
    fn extension(&self) -> &str {
        EXEC_EXTENSION
    }

    async fn load(&self, ctx: LoadContext<'_>) -> Result<Arc<dyn Module>, ResolveError> {
        let launcher = Launcher {
            interpreter: self.interpreter.clone(),
            source: ctx.source.to_path_buf(),
            dir: ctx.sibling_dir.to_path_buf(),
        };
        let load_err = |reason: String| ResolveError::Load {
            path: ctx.source.to_path_buf(),
            reason,
        };

        debug!(target: PLUGIN_TARGET, source = %ctx.source.display(), "describing plugin");
        let output = launcher
            .command(DESCRIBE_ARG)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|err| load_err(format!("spawn failed: {err}")))?;

        if !output.status.success() {
            return Err(load_err(format!(
                "{DESCRIBE_ARG} exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let functions: Vec<String> = serde_json::from_slice(&output.stdout)
            .map_err(|err| load_err(format!("invalid {DESCRIBE_ARG} output: {err}")))?;
        debug!(
            target: PLUGIN_TARGET,
            source = %ctx.source.display(),
            functions = functions.len(),
            "plugin described"
        );

        Ok(Arc::new(ExecModule {
            launcher,
            functions: functions.into_iter().collect(),
        }))
    }
}

struct ExecModule {
    launcher: Launcher,
    functions: HashSet<String>,
}

impl Module for ExecModule {
    fn symbol(&self, name: &str) -> Option<SharedHandler> {
        if !self.functions.contains(name) {
            return None;
        }
        let handler: SharedHandler = Arc::new(ExecHandler {
            name: format!("{}:{name}", self.launcher.source.display()),
            function: name.to_string(),
            launcher: self.launcher.clone(),
        });
        Some(handler)
    }
}

/// One exported function of an executable plugin.
struct ExecHandler {
    name: String,
    function: String,
    launcher: Launcher,
}

impl ExecHandler {
    fn source(&self) -> &Path {
        &self.launcher.source
    }
}

#[async_trait]
impl Handler for ExecHandler {
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, ctx: HandlerContext, payload: Value) -> Result<(), HandlerError> {
        let mut child = self
            .launcher
            .command(&self.function)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|err| HandlerError::fail(format!("{}: spawn failed: {err}", self.name)))?;

        if let Some(mut stdin) = child.stdin.take() {
            let mut line = serde_json::to_vec(&payload)
                .map_err(|err| HandlerError::fail(format!("payload: {err}")))?;
            line.push(b'\n');
            // A plugin that ignores its input may exit before reading it.
            if let Err(err) = stdin.write_all(&line).await {
                debug!(
                    target: PLUGIN_TARGET,
                    handler = %self.name,
                    error = %err,
                    "payload not consumed"
                );
            }
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HandlerError::fail(format!("{}: stdout not captured", self.name)))?;
        let mut lines = BufReader::new(stdout).lines();
        while let Some(line) = lines
            .next_line()
            .await
            .map_err(|err| HandlerError::fail(format!("{}: {err}", self.name)))?
        {
            let command = line.trim();
            if command.is_empty() {
                continue;
            }
            debug!(
                target: PLUGIN_TARGET,
                handler = %self.name,
                command,
                "forwarding plugin command"
            );
            ctx.command(command).await?;
        }

        let status = child
            .wait()
            .await
            .map_err(|err| HandlerError::fail(format!("{}: {err}", self.name)))?;
        if status.success() {
            Ok(())
        } else {
            warn!(
                target: PLUGIN_TARGET,
                source = %self.source().display(),
                function = %self.function,
                %status,
                "plugin invocation failed"
            );
            Err(HandlerError::fail(format!("{} exited with {status}", self.name)))
        }
    }
}
