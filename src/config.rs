// Copyright (C) 2024 Michael Wilson <mike@mdwn.dev>
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
use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::actuator;

pub mod error;
mod haptics;

pub use self::error::ConfigError;
pub use self::haptics::Haptics;

/// Parses a sequence file. Sequence files are YAML lists of segments; the segments themselves are
/// validated when the sequence is played.
pub fn parse_sequence(file: &Path) -> Result<Value, ConfigError> {
    Ok(serde_yml::from_str(&fs::read_to_string(file)?)?)
}

/// Initializes the haptics facade from the given config file.
pub fn init_haptics(config_path: &Path) -> Result<crate::haptics::Haptics, Box<dyn Error>> {
    let config = Haptics::deserialize(config_path)?;
    let device = actuator::get_device(config.device())?;
    let sampler = config.sampler()?;

    info!(
        device = %device,
        steps = sampler.steps(),
        overlap = ?sampler.overlap(),
        "Haptics initialized."
    );
    Ok(crate::haptics::Haptics::new(
        device,
        sampler,
        config.cues().clone(),
    ))
}

/// Initializes the haptics facade and a keyboard controller from the given config file and returns
/// the controller. Realistically, the controller is not expected to exit.
pub fn init_haptics_and_controller(
    config_path: &Path,
) -> Result<crate::controller::Controller, Box<dyn Error>> {
    let haptics = Arc::new(init_haptics(config_path)?);
    crate::controller::Controller::new(
        haptics,
        Arc::new(crate::controller::keyboard::Driver::new()),
    )
}
