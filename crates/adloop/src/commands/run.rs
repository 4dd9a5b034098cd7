//! Long-running signage session.
//!
//! Drives a [`Controller`] until SIGINT/SIGTERM, rendering each screen change
//! to the terminal. The branch picker is answered from `--branch`, or with an
//! interactive prompt when stdin is a terminal. SIGUSR1 counts as the display
//! becoming visible again and triggers an immediate branch check.

use std::io::IsTerminal;

use adloop_core::{Controller, ControllerSnapshot, Picker, PickerStatus, Screen, VideoItem};
use dialoguer::{Confirm, Select};
use owo_colors::OwoColorize;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cli::{GlobalOpts, OutputFormat, RunArgs};
use crate::config;
use crate::error::{CliError, exit_code};
use crate::output;

// ── Picker prompt ───────────────────────────────────────────────────

#[derive(Debug)]
enum PromptOutcome {
    Select(String),
    Reload,
    Dismissed,
}

type PromptTask = JoinHandle<Result<PromptOutcome, CliError>>;

fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Blocking prompt for the current picker contents.
fn prompt_picker(picker: &Picker) -> Result<PromptOutcome, CliError> {
    if picker.status.is_selectable() {
        let items: Vec<String> = picker
            .branches
            .iter()
            .map(|b| match b.description_text() {
                Some(desc) => format!("{}  ({} videos) {desc}", b.label(), b.video_count),
                None => format!("{}  ({} videos)", b.label(), b.video_count),
            })
            .collect();
        let choice = Select::new()
            .with_prompt(picker.status.to_string())
            .items(&items)
            .default(0)
            .interact_opt()
            .map_err(prompt_err)?;
        return Ok(choice
            .and_then(|i| picker.branches.get(i))
            .map_or(PromptOutcome::Dismissed, |b| {
                PromptOutcome::Select(b.id.clone())
            }));
    }

    let reload = Confirm::new()
        .with_prompt(format!("{} Reload the branch list?", picker.status))
        .default(true)
        .interact_opt()
        .map_err(prompt_err)?;
    Ok(if reload == Some(true) {
        PromptOutcome::Reload
    } else {
        PromptOutcome::Dismissed
    })
}

fn wants_prompt(status: &PickerStatus) -> bool {
    matches!(
        status,
        PickerStatus::Ready
            | PickerStatus::AssignFailed(_)
            | PickerStatus::Empty
            | PickerStatus::Failed(_)
    )
}

/// Await the pending prompt, or pend forever when there is none.
async fn join_prompt(task: &mut Option<PromptTask>) -> Result<PromptOutcome, CliError> {
    match task.as_mut() {
        Some(handle) => {
            let joined = handle.await;
            *task = None;
            joined.map_err(|e| CliError::Internal(format!("prompt task failed: {e}")))?
        }
        None => std::future::pending().await,
    }
}

// ── Rendering ───────────────────────────────────────────────────────

struct Renderer {
    format: OutputFormat,
    color: bool,
    quiet: bool,
}

impl Renderer {
    fn screen(&self, screen: &Screen) -> Result<(), CliError> {
        let out = match self.format {
            OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(screen)?,
            OutputFormat::Plain => screen.name().to_owned(),
            OutputFormat::Table => self.screen_text(screen),
        };
        output::print_output(&out, self.quiet);
        Ok(())
    }

    fn screen_text(&self, screen: &Screen) -> String {
        match screen {
            Screen::BranchPicker(picker) => {
                let mut out = self.heading("Branch picker");
                out.push('\n');
                out.push_str(&picker.status.to_string());
                for b in &picker.branches {
                    out.push_str(&format!("\n  {}  {} ({} videos)", b.id, b.label(), b.video_count));
                }
                out
            }
            Screen::Message { title, subtitle } => {
                format!("{}\n{}", self.heading(title), self.dim(subtitle))
            }
            Screen::Video => self.heading("Playing"),
        }
    }

    fn now_playing(&self, video: &VideoItem, index: Option<usize>, total: usize) {
        if self.quiet || !matches!(self.format, OutputFormat::Table) {
            return;
        }
        let position = index.map_or_else(String::new, |i| format!("[{}/{total}] ", i + 1));
        let line = format!("{position}{}  {}", video.id, video.file_url);
        if self.color {
            println!("  {} {}", "\u{25b6}".green(), line);
        } else {
            println!("  > {line}");
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_owned()
        }
    }

    fn dim(&self, text: &str) -> String {
        if self.color {
            text.dimmed().to_string()
        } else {
            text.to_owned()
        }
    }
}

// ── Signals ─────────────────────────────────────────────────────────

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = term.recv() => {}
                }
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Stream of "display visible again" notifications.
struct Visibility {
    #[cfg(unix)]
    signal: Option<tokio::signal::unix::Signal>,
}

impl Visibility {
    fn new() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{SignalKind, signal};
            let signal = signal(SignalKind::user_defined1())
                .inspect_err(|e| warn!(error = %e, "SIGUSR1 handler unavailable"))
                .ok();
            Self { signal }
        }
        #[cfg(not(unix))]
        {
            Self {}
        }
    }

    async fn recv(&mut self) {
        #[cfg(unix)]
        {
            if let Some(signal) = self.signal.as_mut() {
                if signal.recv().await.is_some() {
                    return;
                }
                self.signal = None;
            }
        }
        std::future::pending::<()>().await;
    }
}

// ── Handler ─────────────────────────────────────────────────────────

fn playlist_position(snapshot: &ControllerSnapshot) -> (Option<usize>, usize) {
    let videos = &snapshot.state.current_videos;
    let index = snapshot
        .now_playing
        .as_ref()
        .and_then(|now| videos.iter().position(|v| v.id == now.id));
    (index, videos.len())
}

pub async fn handle(args: RunArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::controller_config(global)?;
    let controller = Controller::launch(cfg)?;
    info!(device_id = %controller.device_id(), "signage session started");
    if !global.quiet {
        eprintln!(
            "Device {} ({})",
            controller.device_id(),
            controller.identity().source
        );
    }

    let renderer = Renderer {
        format: global.output.clone(),
        color: output::should_color(&global.color),
        quiet: global.quiet,
    };
    let interactive = !args.no_interactive && std::io::stdin().is_terminal();
    let mut auto_branch = args.branch;

    let mut screens = controller.screen();
    let mut snapshots = controller.snapshot();
    let mut prompt: Option<PromptTask> = None;
    let mut now_playing: Option<VideoItem> = None;
    let mut visibility = Visibility::new();
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let result = loop {
        tokio::select! {
            () = &mut shutdown => {
                debug!("shutdown requested");
                break Ok(());
            }

            () = visibility.recv() => {
                if let Err(e) = controller.visibility_regained() {
                    break Err(e.into());
                }
            }

            changed = screens.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let screen = screens.borrow_and_update().clone();
                if let Err(e) = renderer.screen(&screen) {
                    break Err(e);
                }
                let Screen::BranchPicker(picker) = screen else {
                    continue;
                };
                if picker.status.is_selectable() {
                    if let Some(id) = auto_branch.take() {
                        info!(branch_id = %id, "assigning branch from --branch");
                        if let Err(e) = controller.select_branch(id) {
                            break Err(e.into());
                        }
                        continue;
                    }
                }
                if interactive && prompt.is_none() && wants_prompt(&picker.status) {
                    prompt = Some(tokio::task::spawn_blocking(move || prompt_picker(&picker)));
                }
            }

            changed = snapshots.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.now_playing != now_playing {
                    if let Some(video) = &snapshot.now_playing {
                        let (index, total) = playlist_position(&snapshot);
                        renderer.now_playing(video, index, total);
                    }
                    now_playing = snapshot.now_playing;
                }
            }

            outcome = join_prompt(&mut prompt) => {
                let sent = match outcome {
                    Ok(PromptOutcome::Select(id)) => controller.select_branch(id),
                    Ok(PromptOutcome::Reload) => controller.reload_branch_list(),
                    Ok(PromptOutcome::Dismissed) => {
                        if !global.quiet {
                            eprintln!("Picker dismissed; send SIGUSR1 to check the assignment again.");
                        }
                        Ok(())
                    }
                    Err(e) => {
                        debug!(error = %e, "picker prompt ended");
                        break Ok(());
                    }
                };
                if let Err(e) = sent {
                    break Err(e.into());
                }
            }
        }
    };

    controller.shutdown().await;

    // A blocking prompt cannot be cancelled; exit without waiting for it.
    if prompt.is_some() && result.is_ok() {
        std::process::exit(exit_code::SUCCESS);
    }
    result
}
