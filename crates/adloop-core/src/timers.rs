// ── Recurring timers ──
//
// Heartbeat and branch-check run as a pair: started together, stopped
// together, and every start stops the previous pair first. Each tick is
// tagged with the pair's generation so ticks queued by a stopped pair can be
// told apart from live ones.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::controller::ControlEvent;

const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    Heartbeat,
    BranchCheck,
}

#[derive(Debug, Default)]
pub(crate) struct TimerPair {
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl TimerPair {
    /// (Re)start both timers.
    pub(crate) fn start(
        &mut self,
        heartbeat: Duration,
        branch_check: Duration,
        tx: &mpsc::UnboundedSender<ControlEvent>,
    ) {
        self.stop();
        self.generation += 1;
        let cancel = CancellationToken::new();

        for (kind, period) in [
            (TimerKind::Heartbeat, heartbeat),
            (TimerKind::BranchCheck, branch_check),
        ] {
            tokio::spawn(tick_task(
                kind,
                period.max(MIN_PERIOD),
                self.generation,
                tx.clone(),
                cancel.clone(),
            ));
        }

        debug!(generation = self.generation, "timers started");
        self.cancel = Some(cancel);
    }

    pub(crate) fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            debug!(generation = self.generation, "timers stopped");
        }
    }

    pub(crate) fn is_running(&self) -> bool {
        self.cancel.is_some()
    }

    /// Whether a tick tagged `generation` belongs to the running pair.
    pub(crate) fn is_current(&self, generation: u64) -> bool {
        self.is_running() && generation == self.generation
    }
}

impl Drop for TimerPair {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn tick_task(
    kind: TimerKind,
    period: Duration,
    generation: u64,
    tx: mpsc::UnboundedSender<ControlEvent>,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if tx.send(ControlEvent::Tick { kind, generation }).is_err() {
                    break;
                }
            }
        }
    }
}
