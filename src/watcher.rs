//! Supervises the external review tool and streams its report lines.
//!
//! One watcher per project owns at most one live child process. The child
//! runs in watch mode and re-emits a full JSON report on its stdout
//! whenever it re-analyzes; a single reader task decodes each line and
//! fans the batch out on the watcher's bus.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::bus::DiagnosticBus;
use crate::protocol;
use crate::types::{Batch, WatchConfig};

/// Name of the review tool's executable.
pub const TOOL_NAME: &str = "elm-review";

/// Resolves the review tool's executable for a project.
///
/// Toolchain configuration itself lives with the embedding editor; the
/// watcher only needs the answer.
pub trait Toolchain: Send + Sync {
    fn resolve(&self, project_root: &Path) -> Option<PathBuf>;
}

/// Default resolver: look the tool up on PATH.
pub struct PathToolchain;

impl Toolchain for PathToolchain {
    fn resolve(&self, _project_root: &Path) -> Option<PathBuf> {
        which::which(TOOL_NAME).ok()
    }
}

/// Failures the embedding editor surfaces to the user, once, with no
/// automatic retry. Calling [`ReviewWatcher::start`] again is the retry.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("{TOOL_NAME} executable not found for {}", project_root.display())]
    ToolUnavailable { project_root: PathBuf },
    #[error("failed to spawn {}", tool.display())]
    Spawn {
        tool: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Owns one project's watch process and its reader task.
pub struct ReviewWatcher {
    project_root: PathBuf,
    config: WatchConfig,
    bus: Arc<DiagnosticBus>,
    running: Option<RunningTool>,
}

struct RunningTool {
    child: Child,
    reader: JoinHandle<()>,
}

impl ReviewWatcher {
    #[must_use]
    pub fn new(project_root: PathBuf, config: WatchConfig) -> Self {
        Self {
            project_root,
            config,
            bus: Arc::new(DiagnosticBus::new()),
            running: None,
        }
    }

    #[must_use]
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// The bus this watcher publishes on. Subscribe before `start()` to
    /// catch the first report.
    #[must_use]
    pub fn bus(&self) -> &Arc<DiagnosticBus> {
        &self.bus
    }

    /// Spawn the tool in watch mode and launch the reader task.
    ///
    /// Idempotent: while a child is live this is a no-op and no second
    /// process is spawned. After the child exits (the reader just ends, no
    /// auto-restart), calling `start()` again spawns a fresh one.
    pub fn start(&mut self, toolchain: &dyn Toolchain) -> Result<(), WatchError> {
        if self.is_running() {
            return Ok(());
        }

        let tool = self
            .config
            .tool
            .clone()
            .or_else(|| toolchain.resolve(&self.project_root))
            .ok_or_else(|| WatchError::ToolUnavailable {
                project_root: self.project_root.clone(),
            })?;

        let mut cmd = Command::new(&tool);
        cmd.arg("--watch")
            .arg("--report=json")
            .arg(format!("--namespace={}", self.config.namespace));
        if let Some(path) = &self.config.config_path {
            cmd.arg(format!("--config={}", path.display()));
        }
        if let Some(path) = &self.config.compiler_path {
            cmd.arg(format!("--compiler={}", path.display()));
        }
        cmd.current_dir(&self.project_root)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|source| WatchError::Spawn {
            tool: tool.clone(),
            source,
        })?;
        let stdout = child.stdout.take().ok_or_else(|| WatchError::Spawn {
            tool: tool.clone(),
            source: io::Error::other("child stdout was not captured"),
        })?;

        tracing::info!(
            tool = %tool.display(),
            root = %self.project_root.display(),
            "review watch started"
        );

        let reader = tokio::spawn(reader_loop(
            stdout,
            Arc::from(self.project_root.as_path()),
            Arc::clone(&self.bus),
        ));
        self.running = Some(RunningTool { child, reader });
        Ok(())
    }

    /// Whether the child is still live; reaps an exited child as a side
    /// effect.
    pub fn is_running(&mut self) -> bool {
        let Some(run) = &mut self.running else {
            return false;
        };
        match run.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::info!(
                    root = %self.project_root.display(),
                    %status,
                    "review tool exited"
                );
                self.running = None;
                false
            }
            Err(e) => {
                tracing::warn!("failed to poll review tool: {e}");
                self.running = None;
                false
            }
        }
    }

    /// Kill the child and end the reader. Further publishes stop here;
    /// dropping the watcher has the same effect.
    pub async fn stop(&mut self) {
        if let Some(mut run) = self.running.take() {
            run.reader.abort();
            if let Err(e) = run.child.kill().await {
                tracing::debug!("review tool already gone: {e}");
            }
            tracing::info!(root = %self.project_root.display(), "review watch stopped");
        }
    }
}

/// Read one JSON report per line, decode it, and fan the batch out.
///
/// Runs until stdout closes (tool exited or killed). Decode failures skip
/// the line — never publish for an unusable line, since an empty batch
/// would wrongly clear diagnostics.
pub(crate) async fn reader_loop<R>(stdout: R, base_dir: Arc<Path>, bus: Arc<DiagnosticBus>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stdout).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match protocol::decode(line) {
                    Ok(records) => bus.publish(&Batch::new(Arc::clone(&base_dir), records)),
                    Err(e) => tracing::warn!("undecodable report line: {e}"),
                }
            }
            Ok(None) => {
                tracing::info!(base_dir = %base_dir.display(), "review tool closed stdout");
                break;
            }
            Err(e) => {
                tracing::warn!("review stdout read error: {e}");
                break;
            }
        }
    }
}
