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

//! A simulated actuator that renders patterns as log output in real time.

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
};

use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::{debug, info};

use crate::feedback::Cue;

use super::{HapticsError, Pattern};

pub const DEFAULT_NAME: &str = "simulator";

/// A device that logs keyframes as it would have rendered them.
pub struct Device {
    name: String,
    engines: AtomicUsize,
}

impl Device {
    pub fn new(name: &str) -> Device {
        Device {
            name: name.to_string(),
            engines: AtomicUsize::new(0),
        }
    }
}

impl super::Device for Device {
    fn supports_haptics(&self) -> bool {
        true
    }

    fn create_engine(&self) -> Result<Arc<dyn super::Engine>, HapticsError> {
        let id = self.engines.fetch_add(1, Ordering::Relaxed);
        debug!(device = self.name, engine = id, "Created engine.");
        Ok(Arc::new(Engine {
            id,
            started: AtomicBool::new(false),
        }))
    }

    fn fire(&self, cue: Cue) -> Result<(), HapticsError> {
        info!(device = self.name, cue = %cue, "Cue.");
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Simulated)", self.name)
    }
}

struct Engine {
    id: usize,
    started: AtomicBool,
}

impl super::Engine for Engine {
    fn start(&self) -> Result<(), HapticsError> {
        self.started.store(true, Ordering::Relaxed);
        info!(engine = self.id, "Engine started.");
        Ok(())
    }

    fn play(&self, pattern: Pattern) -> Result<Box<dyn super::PatternPlayer>, HapticsError> {
        if !self.started.load(Ordering::Relaxed) {
            return Err(HapticsError::Engine("engine has not been started".into()));
        }
        let handle = Handle::try_current()
            .map_err(|e| HapticsError::Engine(format!("no runtime to render on: {}", e)))?;

        let engine = self.id;
        let start = Instant::now();
        let join = handle.spawn(async move {
            for keyframe in pattern.keyframes() {
                tokio::time::sleep_until(start + keyframe.relative_time).await;
                info!(
                    engine,
                    at = format!("{:.3}s", keyframe.relative_time.as_secs_f64()),
                    intensity = format!("{:.3}", keyframe.intensity),
                    sharpness = format!("{:.3}", keyframe.sharpness),
                    "{}",
                    meter(keyframe.intensity),
                );
            }
            tokio::time::sleep_until(start + pattern.duration()).await;
            debug!(engine, "Pattern finished.");
        });

        Ok(Box::new(Player { engine, join }))
    }
}

struct Player {
    engine: usize,
    join: JoinHandle<()>,
}

impl super::PatternPlayer for Player {
    fn stop(&mut self) -> Result<(), HapticsError> {
        self.join.abort();
        info!(engine = self.engine, "Pattern stopped.");
        Ok(())
    }
}

/// Renders an intensity as a bar of up to 20 characters.
fn meter(intensity: f32) -> String {
    let width = (intensity.clamp(0.0, 1.0) * 20.0).round() as usize;
    format!("[{:<20}]", "#".repeat(width))
}
