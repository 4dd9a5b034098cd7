// ── External player process sink ──
//
// One player process per item. The process exit status is the playback
// outcome. With IPC enabled (Unix), pause and resume go over mpv's JSON IPC
// socket.

use std::path::PathBuf;
use std::process::Stdio;

use tokio::process::Command;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};
use url::Url;

use crate::config::PlayerCommand;
use crate::player::{MediaSink, SinkError, SinkEvent, SinkEventKind, SourceId};

/// Spawns the configured player for every loaded source.
#[derive(Debug)]
pub struct ProcessSink {
    command: PlayerCommand,
    events: mpsc::UnboundedSender<SinkEvent>,
    current: Option<Running>,
}

#[derive(Debug)]
struct Running {
    source: SourceId,
    /// Dropping this kills the child.
    _kill: oneshot::Sender<()>,
    ipc_path: Option<PathBuf>,
}

impl ProcessSink {
    /// Create the sink and the receiver its playback outcomes arrive on.
    pub fn new(command: PlayerCommand) -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let sink = Self {
            command,
            events,
            current: None,
        };
        (sink, rx)
    }

    fn ipc_path(&self, source: SourceId) -> Option<PathBuf> {
        (self.command.ipc && cfg!(unix)).then(|| {
            std::env::temp_dir().join(format!(
                "adloop-{}-{}.sock",
                std::process::id(),
                source.get()
            ))
        })
    }

    fn set_paused(&self, paused: bool) -> Result<(), SinkError> {
        let Some(running) = &self.current else {
            return Ok(());
        };
        let Some(path) = running.ipc_path.clone() else {
            return Err(SinkError::Control("player IPC is disabled".into()));
        };
        send_ipc(path, paused)
    }
}

impl MediaSink for ProcessSink {
    fn load(&mut self, source: SourceId, url: &Url) -> Result<(), SinkError> {
        self.unload();

        let ipc_path = self.ipc_path(source);
        let mut cmd = Command::new(&self.command.program);
        cmd.args(&self.command.args);
        if let Some(path) = &ipc_path {
            cmd.arg(format!("--input-ipc-server={}", path.display()));
        }
        cmd.arg(url.as_str())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|e| SinkError::Start(format!("{}: {e}", self.command.program)))?;
        debug!(source = %source, url = %url, pid = ?child.id(), "player started");

        let (kill_tx, kill_rx) = oneshot::channel::<()>();
        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::select! {
                status = child.wait() => {
                    let kind = match status {
                        Ok(status) if status.success() => SinkEventKind::Ended,
                        Ok(status) => SinkEventKind::Failed(format!("player exited with {status}")),
                        Err(e) => SinkEventKind::Failed(e.to_string()),
                    };
                    let _ = events.send(SinkEvent { source, kind });
                }
                _ = kill_rx => {
                    if let Err(e) = child.kill().await {
                        debug!(source = %source, error = %e, "player already gone");
                    }
                }
            }
        });

        self.current = Some(Running {
            source,
            _kill: kill_tx,
            ipc_path,
        });
        Ok(())
    }

    fn resume(&mut self) -> Result<(), SinkError> {
        self.set_paused(false)
    }

    fn pause(&mut self) -> Result<(), SinkError> {
        self.set_paused(true)
    }

    fn unload(&mut self) {
        if let Some(running) = self.current.take() {
            debug!(source = %running.source, "stopping player");
            if let Some(path) = running.ipc_path {
                let _ = std::fs::remove_file(path);
            }
        }
    }

    fn has_source(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for ProcessSink {
    fn drop(&mut self) {
        self.unload();
    }
}

#[cfg(unix)]
fn send_ipc(path: PathBuf, paused: bool) -> Result<(), SinkError> {
    use tokio::io::AsyncWriteExt;

    let mut line = serde_json::to_vec(&serde_json::json!({
        "command": ["set_property", "pause", paused]
    }))
    .map_err(|e| SinkError::Control(e.to_string()))?;
    line.push(b'\n');

    tokio::spawn(async move {
        let result = async {
            let mut stream = tokio::net::UnixStream::connect(&path).await?;
            stream.write_all(&line).await
        }
        .await;
        if let Err(e) = result {
            warn!(path = %path.display(), error = %e, "player IPC command failed");
        }
    });
    Ok(())
}

#[cfg(not(unix))]
fn send_ipc(_path: PathBuf, _paused: bool) -> Result<(), SinkError> {
    Err(SinkError::Control("pause/resume needs a Unix IPC socket".into()))
}
