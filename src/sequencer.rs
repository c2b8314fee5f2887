// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Plays ordered segment sequences, advancing from one segment to the next with deferred
//! continuations.

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tokio::{runtime::Handle, sync::watch, time::Instant};
use tracing::{error, info, span, warn, Instrument, Level, Span};

use crate::{
    actuator::{Device, HapticsError, PatternPlayer},
    engine::EngineLifecycle,
    player::SegmentPlayer,
    playsync::ContinuationFlag,
    sampler::SamplerConfig,
    segment::SegmentSpec,
};

/// The states a playback session moves through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Nothing has been played yet.
    Idle,
    /// The engine is being started.
    Starting,
    /// The segment at the given index is the most recently started one.
    Playing(usize),
    /// Every segment was played.
    Completed,
    /// Playback ended early: stopped, superseded, or failed.
    Stopped,
}

impl SessionState {
    /// Returns true if the session can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Stopped)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::Starting => write!(f, "starting"),
            SessionState::Playing(index) => write!(f, "playing segment {}", index),
            SessionState::Completed => write!(f, "completed"),
            SessionState::Stopped => write!(f, "stopped"),
        }
    }
}

/// The parts of a session that are reachable from outside of its continuation.
struct SessionShared {
    id: u64,
    flag: ContinuationFlag,
    state: watch::Sender<SessionState>,
    player: Mutex<Option<Box<dyn PatternPlayer>>>,
}

impl SessionShared {
    fn new(id: u64) -> SessionShared {
        SessionShared {
            id,
            flag: ContinuationFlag::new(),
            state: watch::Sender::new(SessionState::Idle),
            player: Mutex::new(None),
        }
    }

    fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Moves to the given state unless the session has already ended.
    fn transition(&self, next: SessionState) {
        self.state.send_if_modified(|state| {
            if state.is_terminal() || *state == next {
                return false;
            }
            *state = next;
            true
        });
    }

    /// Stops the active player, if any, and releases it.
    fn halt(&self) {
        if let Some(mut player) = self.player.lock().take() {
            if let Err(e) = player.stop() {
                warn!(session = self.id, err = %e, "Error stopping haptic player.");
            }
        }
    }
}

/// A handle to a sequence that was submitted for playback.
#[derive(Clone)]
pub struct SequenceHandle {
    shared: Arc<SessionShared>,
}

impl SequenceHandle {
    /// The id of the session playing the sequence.
    pub fn id(&self) -> u64 {
        self.shared.id
    }

    /// The current state of the session.
    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Waits until the session has completed or stopped.
    pub async fn finished(&self) -> SessionState {
        let mut receiver = self.shared.state.subscribe();
        let result = receiver.wait_for(SessionState::is_terminal).await.map(|state| *state);
        // The sender lives as long as this handle, so the wait can't fail.
        result.unwrap_or_else(|_| self.state())
    }
}

/// One top-level sequence request. Owned by its continuation once playback has started.
struct PlaybackSession {
    shared: Arc<SessionShared>,
    segments: Vec<SegmentSpec>,
    index: usize,
    lifecycle: EngineLifecycle,
    player: SegmentPlayer,
}

impl PlaybackSession {
    /// Idle to Starting to Playing(0). Returns the deadline of the first continuation, or None if
    /// the session already ended.
    fn begin(&mut self) -> Option<Instant> {
        if self.segments.is_empty() {
            info!(session = self.shared.id, "Empty haptic sequence, nothing to play.");
            self.finish(SessionState::Completed);
            return None;
        }

        self.shared.transition(SessionState::Starting);
        match self.lifecycle.ensure_started() {
            Ok(_) => self.play_current(),
            Err(HapticsError::Unsupported) => {
                info!(
                    session = self.shared.id,
                    "Device doesn't support haptics, skipping sequence."
                );
                self.finish(SessionState::Stopped);
                None
            }
            Err(e) => {
                error!(session = self.shared.id, err = %e, "Error starting the haptic engine.");
                self.finish(SessionState::Stopped);
                None
            }
        }
    }

    /// Runs at a segment's deadline: Playing(i) to Playing(i + 1) or one of the final states.
    fn advance(&mut self) -> Option<Instant> {
        if !self.shared.flag.is_set() {
            info!(
                session = self.shared.id,
                index = self.index,
                "Haptic sequence stopped."
            );
            self.finish(SessionState::Stopped);
            return None;
        }

        self.index += 1;
        if self.index >= self.segments.len() {
            info!(session = self.shared.id, "Haptic sequence completed.");
            self.finish(SessionState::Completed);
            return None;
        }

        self.play_current()
    }

    fn play_current(&mut self) -> Option<Instant> {
        let segment = self.segments[self.index];
        let played = self
            .lifecycle
            .ensure_started()
            .and_then(|engine| self.player.play_segment(&segment, engine.as_ref()));

        let played = match played {
            Ok(played) => played,
            Err(e) => {
                error!(
                    session = self.shared.id,
                    index = self.index,
                    err = %e,
                    "Error playing haptic segment, abandoning sequence."
                );
                self.finish(SessionState::Stopped);
                return None;
            }
        };

        {
            // The previous segment's handle is released here, not stopped, so its overlap window
            // keeps playing.
            let mut player = self.shared.player.lock();
            *player = Some(played.player);

            // A stop that raced with this segment's start won't have seen the new player.
            if !self.shared.flag.is_set() {
                drop(player);
                self.shared.halt();
                self.finish(SessionState::Stopped);
                return None;
            }
        }

        info!(
            session = self.shared.id,
            index = self.index,
            segment = %segment,
            "Haptic segment started."
        );
        self.shared.transition(SessionState::Playing(self.index));
        Some(played.deadline)
    }

    /// Ends the session, releasing the engine and player handles.
    fn finish(&mut self, state: SessionState) {
        self.shared.flag.clear();
        self.shared.player.lock().take();
        self.lifecycle.release();
        self.shared.transition(state);
    }

    /// Drives the session's deferred continuations until it ends.
    async fn run(mut self, mut deadline: Instant) {
        loop {
            tokio::time::sleep_until(deadline).await;
            match self.advance() {
                Some(next) => deadline = next,
                None => return,
            }
        }
    }
}

/// Schedules haptic sequences. At most one session is current; starting a new sequence
/// supersedes the previous one.
pub struct Sequencer {
    device: Arc<dyn Device>,
    config: SamplerConfig,
    current: Mutex<Option<Arc<SessionShared>>>,
    next_id: AtomicU64,
    span: Span,
}

impl Sequencer {
    /// Creates a new sequencer that plays through the given device.
    pub fn new(device: Arc<dyn Device>, config: SamplerConfig) -> Sequencer {
        Sequencer {
            device,
            config,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
            span: span!(Level::INFO, "sequencer"),
        }
    }

    /// The sampler configuration used for every segment.
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Starts playing the sequence and returns once the first segment has started. The rest of the
    /// sequence is played by a deferred continuation on the current tokio runtime. Any sequence
    /// that is already playing is superseded: it won't advance any further, but whatever it has
    /// already handed to the hardware is left to play out.
    pub fn play_sequence(&self, segments: Vec<SegmentSpec>) -> SequenceHandle {
        let _enter = self.span.enter();

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::new(SessionShared::new(id));
        let handle = SequenceHandle {
            shared: shared.clone(),
        };

        let mut current = self.current.lock();
        if let Some(previous) = current.replace(shared.clone()) {
            if previous.flag.clear() {
                info!(
                    previous = previous.id,
                    session = id,
                    "Superseding haptic sequence."
                );
            }
        }

        let runtime = match Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                error!(session = id, err = %e, "No async runtime available for haptic playback.");
                shared.flag.clear();
                shared.transition(SessionState::Stopped);
                return handle;
            }
        };

        info!(session = id, segments = segments.len(), "Playing haptic sequence.");
        let mut session = PlaybackSession {
            shared,
            segments,
            index: 0,
            lifecycle: EngineLifecycle::new(self.device.clone()),
            player: SegmentPlayer::new(self.config),
        };

        if let Some(deadline) = session.begin() {
            let span = span!(Level::INFO, "haptic sequence", session = id);
            runtime.spawn(session.run(deadline).instrument(span));
        }

        handle
    }

    /// Stops the current sequence, if any. The active pattern is halted right away and the pending
    /// continuation will end the session when it wakes.
    pub fn stop_sequence(&self) {
        let _enter = self.span.enter();

        let current = self.current.lock();
        let shared = match current.as_ref() {
            Some(shared) => shared,
            None => {
                info!("No haptic sequence to stop.");
                return;
            }
        };

        if shared.flag.clear() {
            info!(session = shared.id, "Stopping haptic sequence.");
        }
        shared.halt();
        shared.transition(SessionState::Stopped);
    }

    /// The state of the current session, or idle if nothing has been played.
    pub fn state(&self) -> SessionState {
        self.current
            .lock()
            .as_ref()
            .map_or(SessionState::Idle, |shared| shared.state())
    }
}
