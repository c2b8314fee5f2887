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
use std::time::Duration;

use crate::sampler::Sample;

use super::HapticsError;

/// A continuous haptic pattern made of parameter keyframes. The hardware smooths between
/// keyframes, so a whole segment is submitted as a single pattern.
#[derive(Clone, Debug, PartialEq)]
pub struct Pattern {
    keyframes: Vec<Sample>,
}

impl Pattern {
    /// Builds a pattern from ordered keyframes.
    pub fn new(keyframes: Vec<Sample>) -> Result<Pattern, HapticsError> {
        if keyframes.is_empty() {
            return Err(HapticsError::Pattern("pattern has no keyframes".into()));
        }

        for (i, keyframe) in keyframes.iter().enumerate() {
            for (name, value) in [
                ("intensity", keyframe.intensity),
                ("sharpness", keyframe.sharpness),
            ] {
                if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                    return Err(HapticsError::Pattern(format!(
                        "keyframe {} has {} {} outside of 0.0 to 1.0",
                        i, name, value
                    )));
                }
            }
            if keyframe.duration.is_zero() {
                return Err(HapticsError::Pattern(format!(
                    "keyframe {} has no duration",
                    i
                )));
            }
        }

        if keyframes
            .windows(2)
            .any(|pair| pair[1].relative_time < pair[0].relative_time)
        {
            return Err(HapticsError::Pattern(
                "keyframes are not in time order".into(),
            ));
        }

        Ok(Pattern { keyframes })
    }

    /// The keyframes of this pattern, in time order.
    pub fn keyframes(&self) -> &[Sample] {
        &self.keyframes
    }

    /// The time from the start of the pattern to the start of its last keyframe.
    pub fn span(&self) -> Duration {
        self.keyframes
            .last()
            .map_or(Duration::ZERO, |keyframe| keyframe.relative_time)
    }

    /// The total time the pattern drives the actuator, including the last keyframe.
    pub fn duration(&self) -> Duration {
        self.keyframes
            .last()
            .map_or(Duration::ZERO, |keyframe| {
                keyframe.relative_time + keyframe.duration
            })
    }
}
