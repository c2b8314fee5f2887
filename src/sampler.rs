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

//! Expands sparse segment specs into dense keyframe timelines.

use std::{fmt, time::Duration};

use crate::segment::{SegmentError, SegmentSpec};

/// The default number of interpolation steps per segment.
pub const DEFAULT_STEPS: u32 = 30;

/// The default trailing overlap between consecutive segments.
pub const DEFAULT_OVERLAP: Duration = Duration::from_millis(100);

#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SamplerError {
    #[error("the number of interpolation steps must be at least 1")]
    ZeroSteps,
}

/// Controls how finely segments are sampled and how far they overlap. More steps give smoother
/// ramps at the cost of more keyframes per pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SamplerConfig {
    steps: u32,
    overlap: Duration,
}

impl SamplerConfig {
    /// Creates a new sampler configuration.
    pub fn new(steps: u32, overlap: Duration) -> Result<SamplerConfig, SamplerError> {
        if steps == 0 {
            return Err(SamplerError::ZeroSteps);
        }
        Ok(SamplerConfig { steps, overlap })
    }

    /// The number of interpolation steps. A segment expands to steps + 1 samples.
    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// The trailing overlap window added to every segment.
    pub fn overlap(&self) -> Duration {
        self.overlap
    }

    /// The segment duration once the overlap window has been added.
    pub fn adjusted_duration(&self, segment: &SegmentSpec) -> Duration {
        segment.duration().saturating_add(self.overlap)
    }

    /// Checks that the segment can be sampled with these settings: every keyframe has to last at
    /// least a nanosecond, and the whole timeline has to fit in u64 nanoseconds.
    pub fn check(&self, segment: &SegmentSpec) -> Result<(), SegmentError> {
        let adjusted = self.adjusted_duration(segment);
        let nanos = adjusted.as_nanos();
        if nanos > u128::from(u64::MAX) {
            return Err(SegmentError::DurationTooLong(adjusted.as_secs_f64()));
        }
        if nanos < u128::from(self.steps) {
            return Err(SegmentError::TooShortToSample {
                seconds: adjusted.as_secs_f64(),
                steps: self.steps,
            });
        }
        Ok(())
    }
}

impl Default for SamplerConfig {
    fn default() -> Self {
        SamplerConfig {
            steps: DEFAULT_STEPS,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// A single keyframe within a sampled segment.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    /// Offset from the start of the segment's pattern.
    pub relative_time: Duration,
    pub intensity: f32,
    pub sharpness: f32,
    /// How long the keyframe lasts.
    pub duration: Duration,
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:>8.3}s +{:.3}s intensity {:.3} sharpness {:.3}",
            self.relative_time.as_secs_f64(),
            self.duration.as_secs_f64(),
            self.intensity,
            self.sharpness,
        )
    }
}

/// Samples the segment into steps + 1 keyframes that approximate a linear ramp over the segment's
/// duration plus the overlap window. Every keyframe lasts adjusted / steps, so the last one runs
/// slightly past the adjusted duration. Segments that fail [SamplerConfig::check] produce
/// keyframes that no engine will accept.
pub fn sample(segment: &SegmentSpec, config: &SamplerConfig) -> Vec<Sample> {
    let adjusted = config.adjusted_duration(segment);
    let steps = config.steps;
    let sample_duration = adjusted / steps;
    let adjusted_nanos = adjusted.as_nanos();

    (0..=steps)
        .map(|i| {
            let fraction = i as f32 / steps as f32;
            // Integer math keeps the times exact and strictly increasing.
            let nanos = adjusted_nanos * u128::from(i) / u128::from(steps);
            Sample {
                relative_time: Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)),
                intensity: lerp(segment.start_intensity(), segment.end_intensity(), fraction),
                sharpness: lerp(segment.start_sharpness(), segment.end_sharpness(), fraction),
                duration: sample_duration,
            }
        })
        .collect()
}

/// Linear interpolation that lands exactly on both endpoints.
#[inline]
fn lerp(start: f32, end: f32, fraction: f32) -> f32 {
    start * (1.0 - fraction) + end * fraction
}
