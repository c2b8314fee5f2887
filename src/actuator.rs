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
use std::{error::Error, fmt, sync::Arc};

use crate::feedback::Cue;

pub mod mock;
mod pattern;
pub mod simulator;

pub use pattern::Pattern;

/// Failures reported by haptic actuators and the layers that drive them.
#[derive(Debug, thiserror::Error)]
pub enum HapticsError {
    /// The device exists but cannot render haptics.
    #[error("device does not support haptics")]
    Unsupported,
    /// No actuator implementation is present for the requested operation.
    #[error("{operation} is unavailable: no haptic actuator is present")]
    Unavailable { operation: &'static str },
    #[error("haptic engine failure: {0}")]
    Engine(String),
    #[error("unable to build haptic pattern: {0}")]
    Pattern(String),
    #[error("unable to stop haptic player: {0}")]
    Stop(String),
}

/// A haptic actuator device.
pub trait Device: fmt::Display + Send + Sync {
    /// Returns true if the device can render haptics at all.
    fn supports_haptics(&self) -> bool;

    /// Creates a new, not yet started, engine.
    fn create_engine(&self) -> Result<Arc<dyn Engine>, HapticsError>;

    /// Fires a single one-shot cue immediately.
    fn fire(&self, cue: Cue) -> Result<(), HapticsError>;
}

/// A haptic engine created by a device. Patterns can only be played once the engine is started.
pub trait Engine: Send + Sync {
    /// Starts the engine.
    fn start(&self) -> Result<(), HapticsError>;

    /// Starts playing the pattern immediately. The returned player can stop it early. Dropping the
    /// player releases the handle but lets the pattern play out.
    fn play(&self, pattern: Pattern) -> Result<Box<dyn PatternPlayer>, HapticsError>;
}

/// A handle to a pattern that is playing on an engine.
pub trait PatternPlayer: Send {
    /// Stops playback immediately.
    fn stop(&mut self) -> Result<(), HapticsError>;
}

/// Lists the actuators that can be created by name.
pub fn list_devices() -> Vec<Box<dyn Device>> {
    vec![Box::new(simulator::Device::new(simulator::DEFAULT_NAME))]
}

/// Gets a device with the given name.
pub fn get_device(name: &str) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    if name.starts_with("mock") {
        return Ok(Arc::new(mock::Device::get(name)));
    }
    if name.starts_with(simulator::DEFAULT_NAME) {
        return Ok(Arc::new(simulator::Device::new(name)));
    }

    Err(format!("unknown haptic device '{}'", name).into())
}
