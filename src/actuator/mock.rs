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
use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{info, span, Level};

use crate::feedback::Cue;

use super::{HapticsError, Pattern};

/// A pattern that was handed to a mock engine.
#[derive(Clone, Debug)]
pub struct PlayedPattern {
    /// The engine that played the pattern, numbered from 0 in creation order.
    pub engine: usize,
    /// When the pattern was started.
    pub started_at: Instant,
    pub pattern: Pattern,
}

type Hook = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct State {
    engines_created: usize,
    played: Vec<PlayedPattern>,
    stopped: Vec<usize>,
    cues: Vec<Cue>,
    on_play: Option<(usize, Hook)>,
}

/// A mock device. Doesn't actually actuate anything, but records everything it's asked to do.
#[derive(Clone)]
pub struct Device {
    name: String,
    supported: bool,
    fail_engine_start: bool,
    reject_pattern_at: Option<usize>,
    fail_stop: bool,
    state: Arc<Mutex<State>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            supported: true,
            fail_engine_start: false,
            reject_pattern_at: None,
            fail_stop: false,
            state: Arc::new(Mutex::new(State::default())),
        }
    }

    /// Makes the device report that it cannot render haptics.
    pub fn unsupported(mut self) -> Device {
        self.supported = false;
        self
    }

    /// Makes every engine created by the device fail to start.
    pub fn failing_engine(mut self) -> Device {
        self.fail_engine_start = true;
        self
    }

    /// Makes the nth pattern played on the device (counting from 0) fail.
    pub fn rejecting_pattern(mut self, index: usize) -> Device {
        self.reject_pattern_at = Some(index);
        self
    }

    /// Makes every player created by the device fail to stop. The stop is still recorded.
    pub fn failing_stop(mut self) -> Device {
        self.fail_stop = true;
        self
    }

    /// Runs the hook once, while the nth pattern (counting from 0) is being submitted and before
    /// the engine hands back its player.
    pub fn on_play(&self, index: usize, hook: impl FnOnce() + Send + 'static) {
        self.state.lock().on_play = Some((index, Box::new(hook)));
    }

    /// Returns the number of engines created so far.
    pub fn engines_created(&self) -> usize {
        self.state.lock().engines_created
    }

    /// Returns every pattern played so far, in order.
    pub fn played(&self) -> Vec<PlayedPattern> {
        self.state.lock().played.clone()
    }

    /// Returns the number of players that have been stopped.
    pub fn stop_count(&self) -> usize {
        self.state.lock().stopped.len()
    }

    /// Returns every cue fired so far, in order.
    pub fn cues(&self) -> Vec<Cue> {
        self.state.lock().cues.clone()
    }

    /// Returns true if the most recently played pattern is still running.
    pub fn is_playing(&self) -> bool {
        let state = self.state.lock();
        match state.played.last() {
            Some(played) => {
                let index = state.played.len() - 1;
                !state.stopped.contains(&index)
                    && Instant::now() < played.started_at + played.pattern.duration()
            }
            None => false,
        }
    }
}

impl super::Device for Device {
    fn supports_haptics(&self) -> bool {
        self.supported
    }

    fn create_engine(&self) -> Result<Arc<dyn super::Engine>, HapticsError> {
        let mut state = self.state.lock();
        let id = state.engines_created;
        state.engines_created += 1;

        Ok(Arc::new(Engine {
            id,
            fail_start: self.fail_engine_start,
            reject_pattern_at: self.reject_pattern_at,
            fail_stop: self.fail_stop,
            started: AtomicBool::new(false),
            state: self.state.clone(),
        }))
    }

    fn fire(&self, cue: Cue) -> Result<(), HapticsError> {
        info!(device = self.name, cue = %cue, "Firing cue.");
        self.state.lock().cues.push(cue);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

struct Engine {
    id: usize,
    fail_start: bool,
    reject_pattern_at: Option<usize>,
    fail_stop: bool,
    started: AtomicBool,
    state: Arc<Mutex<State>>,
}

impl super::Engine for Engine {
    fn start(&self) -> Result<(), HapticsError> {
        if self.fail_start {
            return Err(HapticsError::Engine("mock engine refused to start".into()));
        }
        self.started.store(true, Ordering::Relaxed);
        Ok(())
    }

    fn play(&self, pattern: Pattern) -> Result<Box<dyn super::PatternPlayer>, HapticsError> {
        let span = span!(Level::INFO, "play pattern (mock)");
        let _enter = span.enter();

        if !self.started.load(Ordering::Relaxed) {
            return Err(HapticsError::Engine("engine has not been started".into()));
        }

        // The hook runs without the state lock so it can call back into the device.
        let hook = {
            let mut state = self.state.lock();
            let index = state.played.len();
            match state.on_play.take() {
                Some((at, hook)) if at == index => Some(hook),
                other => {
                    state.on_play = other;
                    None
                }
            }
        };
        if let Some(hook) = hook {
            hook();
        }

        let mut state = self.state.lock();
        let index = state.played.len();
        if self.reject_pattern_at == Some(index) {
            return Err(HapticsError::Pattern(format!(
                "mock engine rejected pattern {}",
                index
            )));
        }

        info!(
            engine = self.id,
            keyframes = pattern.keyframes().len(),
            duration = ?pattern.duration(),
            "Playing pattern."
        );
        state.played.push(PlayedPattern {
            engine: self.id,
            started_at: Instant::now(),
            pattern,
        });

        Ok(Box::new(Player {
            index,
            fail_stop: self.fail_stop,
            state: self.state.clone(),
        }))
    }
}

struct Player {
    index: usize,
    fail_stop: bool,
    state: Arc<Mutex<State>>,
}

impl super::PatternPlayer for Player {
    fn stop(&mut self) -> Result<(), HapticsError> {
        let mut state = self.state.lock();
        if !state.stopped.contains(&self.index) {
            state.stopped.push(self.index);
        }
        if self.fail_stop {
            return Err(HapticsError::Stop(format!(
                "mock player {} refused to stop",
                self.index
            )));
        }
        Ok(())
    }
}
