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
use std::{path::Path, time::Duration};

use config::{Config, File};
use duration_string::DurationString;
use serde::Deserialize;

use crate::{
    actuator::simulator,
    feedback::CueTable,
    sampler::{SamplerConfig, DEFAULT_OVERLAP, DEFAULT_STEPS},
};

use super::error::ConfigError;

/// The configuration for the haptics engine.
#[derive(Deserialize, Default)]
pub struct Haptics {
    /// The actuator to play through. Defaults to the simulator.
    device: Option<String>,
    /// The number of interpolation steps per segment.
    steps: Option<u32>,
    /// How far consecutive segments overlap, e.g. "100ms".
    overlap: Option<String>,
    /// Maps logical feedback requests to hardware cues.
    #[serde(default)]
    cues: CueTable,
}

impl Haptics {
    /// Parses the haptics configuration from a YAML file.
    pub fn deserialize(path: &Path) -> Result<Haptics, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<Haptics>()?)
    }

    /// The name of the actuator to play through.
    pub fn device(&self) -> &str {
        self.device.as_deref().unwrap_or(simulator::DEFAULT_NAME)
    }

    /// The overlap between consecutive segments.
    pub fn overlap(&self) -> Result<Duration, ConfigError> {
        match &self.overlap {
            Some(overlap) => Ok(DurationString::from_string(overlap.clone())
                .map_err(|e| ConfigError::Duration {
                    value: overlap.clone(),
                    reason: e.to_string(),
                })?
                .into()),
            None => Ok(DEFAULT_OVERLAP),
        }
    }

    /// The sampler settings described by the configuration.
    pub fn sampler(&self) -> Result<SamplerConfig, ConfigError> {
        Ok(SamplerConfig::new(
            self.steps.unwrap_or(DEFAULT_STEPS),
            self.overlap()?,
        )?)
    }

    /// The cue table.
    pub fn cues(&self) -> &CueTable {
        &self.cues
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, io::Write, time::Duration};

    use crate::{
        config::error::ConfigError,
        feedback::{Cue, ImpactStyle, NotificationKind},
        sampler::SamplerError,
    };

    use super::Haptics;

    fn write_config(contents: &str) -> Result<tempfile::NamedTempFile, Box<dyn Error>> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;
        Ok(file)
    }

    #[test]
    fn test_full_config() -> Result<(), Box<dyn Error>> {
        let file = write_config(
            r#"
device: mock-actuator
steps: 10
overlap: 50ms
cues:
  notifications:
    warning: notification_error
  impacts:
    heavy: impact_medium
"#,
        )?;

        let config = Haptics::deserialize(file.path())?;
        assert_eq!("mock-actuator", config.device());

        let sampler = config.sampler()?;
        assert_eq!(10, sampler.steps());
        assert_eq!(Duration::from_millis(50), sampler.overlap());

        assert_eq!(
            Cue::NotificationError,
            config.cues().notification(NotificationKind::Warning)
        );
        assert_eq!(
            Cue::NotificationSuccess,
            config.cues().notification(NotificationKind::Success)
        );
        assert_eq!(Cue::ImpactMedium, config.cues().impact(ImpactStyle::Heavy));
        Ok(())
    }

    #[test]
    fn test_defaults() -> Result<(), Box<dyn Error>> {
        let file = write_config("device: simulator\n")?;

        let config = Haptics::deserialize(file.path())?;
        assert_eq!("simulator", config.device());

        let sampler = config.sampler()?;
        assert_eq!(30, sampler.steps());
        assert_eq!(Duration::from_millis(100), sampler.overlap());
        assert_eq!(Cue::ImpactLight, config.cues().impact(ImpactStyle::Light));
        Ok(())
    }

    #[test]
    fn test_invalid_settings() -> Result<(), Box<dyn Error>> {
        let file = write_config("overlap: soon\n")?;
        assert!(matches!(
            Haptics::deserialize(file.path())?.sampler(),
            Err(ConfigError::Duration { .. })
        ));

        let file = write_config("steps: 0\n")?;
        assert!(matches!(
            Haptics::deserialize(file.path())?.sampler(),
            Err(ConfigError::Sampler(SamplerError::ZeroSteps))
        ));
        Ok(())
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Haptics::deserialize(std::path::Path::new("assets/does-not-exist.yaml")),
            Err(ConfigError::Load(_))
        ));
    }
}
