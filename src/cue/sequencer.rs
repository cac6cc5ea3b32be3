//! Cue Sequencer: plays queued cues one at a time.
//!
//! States: `Idle` (nothing queued, no timer) and `Draining` (one cue active,
//! its hold timer running). Each hold timer is a spawned Tokio task that
//! captures the generation it was scheduled under; `clear` bumps the
//! generation and aborts the task, so a late expiry can never touch a
//! cleared queue.

use super::{Cue, DurationTable};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Draining,
}

struct SequencerState {
    queue: VecDeque<Cue>,
    current: Cue,
    phase: Phase,
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

impl SequencerState {
    fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            current: Cue::Idle,
            phase: Phase::Idle,
            generation: 0,
            timer: None,
        }
    }

    fn cancel_timer(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

struct Shared {
    state: Mutex<SequencerState>,
    durations: DurationTable,
    changes: watch::Sender<Cue>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, SequencerState> {
        // No code path leaves the state half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Show a freshly popped cue. Always notifies, even for a repeat.
    fn activate(&self, state: &mut SequencerState, cue: Cue) {
        tracing::debug!(target: "cue", "[Sequencer] {} -> {}", state.current, cue);
        state.current = cue;
        self.changes.send_replace(cue);
    }

    /// Fall back to idle. Notifies only if something else was showing.
    fn settle_idle(&self, state: &mut SequencerState) {
        if state.current != Cue::Idle {
            tracing::debug!(target: "cue", "[Sequencer] {} -> idle", state.current);
        }
        state.current = Cue::Idle;
        self.changes.send_if_modified(|shown| {
            let changed = *shown != Cue::Idle;
            *shown = Cue::Idle;
            changed
        });
    }

    /// Pop the next cue and start its hold timer, or fall back to idle.
    fn advance(self: &Arc<Self>, state: &mut SequencerState) {
        match state.queue.pop_front() {
            Some(cue) => {
                state.phase = Phase::Draining;
                self.activate(state, cue);
                self.schedule(state, cue);
            }
            None => {
                state.phase = Phase::Idle;
                state.timer = None;
                self.settle_idle(state);
            }
        }
    }

    fn schedule(self: &Arc<Self>, state: &mut SequencerState, cue: Cue) {
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;
        let hold = self.durations.hold(cue);
        let shared = Arc::clone(self);
        state.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            shared.on_hold_expired(generation);
        }));
    }

    fn on_hold_expired(self: &Arc<Self>, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation || state.phase != Phase::Draining {
            tracing::trace!(target: "cue", "[Sequencer] Ignoring stale timer {}", generation);
            return;
        }
        self.advance(&mut state);
    }
}

/// Snapshot of the sequencer for renderers and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SequencerSnapshot {
    pub current: Cue,
    pub pending: Vec<Cue>,
    pub draining: bool,
}

/// Serializes cue playback for one session.
///
/// Must be used from within a Tokio runtime: hold timers are spawned tasks.
/// Dropping the sequencer aborts any pending timer.
pub struct CueSequencer {
    shared: Arc<Shared>,
}

impl Default for CueSequencer {
    fn default() -> Self {
        Self::new(DurationTable::default())
    }
}

impl CueSequencer {
    pub fn new(durations: DurationTable) -> Self {
        let (changes, _) = watch::channel(Cue::Idle);
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(SequencerState::new()),
                durations,
                changes,
            }),
        }
    }

    /// Append a cue. Starts draining immediately when idle; never
    /// interrupts the active cue.
    pub fn enqueue(&self, cue: Cue) {
        let mut state = self.shared.lock();
        state.queue.push_back(cue);
        if state.phase == Phase::Idle {
            self.shared.advance(&mut state);
        } else {
            tracing::trace!(
                target: "cue",
                "[Sequencer] Queued {} behind {} ({} pending)",
                cue,
                state.current,
                state.queue.len()
            );
        }
    }

    /// Drop everything queued, cancel the hold timer and show idle.
    pub fn clear(&self) {
        let mut state = self.shared.lock();
        state.queue.clear();
        state.cancel_timer();
        state.phase = Phase::Idle;
        self.shared.settle_idle(&mut state);
    }

    /// The active cue. Never blocks on a timer.
    pub fn current(&self) -> Cue {
        self.shared.lock().current
    }

    /// Follow the active cue. The receiver holds the latest value only:
    /// changes made between two polls coalesce, so a renderer that lags
    /// sees where playback is now, not every cue it missed.
    pub fn subscribe(&self) -> watch::Receiver<Cue> {
        self.shared.changes.subscribe()
    }

    pub fn is_draining(&self) -> bool {
        self.shared.lock().phase == Phase::Draining
    }

    pub fn pending_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    pub fn snapshot(&self) -> SequencerSnapshot {
        let state = self.shared.lock();
        SequencerSnapshot {
            current: state.current,
            pending: state.queue.iter().copied().collect(),
            draining: state.phase == Phase::Draining,
        }
    }

    pub fn durations(&self) -> &DurationTable {
        &self.shared.durations
    }
}

impl Drop for CueSequencer {
    fn drop(&mut self) {
        self.shared.lock().cancel_timer();
    }
}
