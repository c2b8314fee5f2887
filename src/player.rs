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
use tokio::time::Instant;
use tracing::{debug, span, Level, Span};

use crate::{
    actuator::{Engine, HapticsError, Pattern, PatternPlayer},
    sampler::{self, SamplerConfig},
    segment::SegmentSpec,
};

/// A segment that has started playing.
pub struct PlayedSegment {
    /// The handle to the playing pattern.
    pub player: Box<dyn PatternPlayer>,
    /// When the next segment should be started. This is the overlap window ahead of the end of
    /// this segment's pattern, so the two patterns overlap on the hardware.
    pub deadline: Instant,
}

/// Plays sampled segments as single continuous patterns.
pub struct SegmentPlayer {
    config: SamplerConfig,
    span: Span,
}

impl SegmentPlayer {
    /// Creates a new segment player.
    pub fn new(config: SamplerConfig) -> SegmentPlayer {
        SegmentPlayer {
            config,
            span: span!(Level::INFO, "segment player"),
        }
    }

    /// Samples the segment and plays it on the engine.
    pub fn play_segment(
        &self,
        segment: &SegmentSpec,
        engine: &dyn Engine,
    ) -> Result<PlayedSegment, HapticsError> {
        self.play(sampler::sample(segment, &self.config), engine)
    }

    /// Plays the samples on the engine as one pattern, starting immediately.
    pub fn play(
        &self,
        samples: Vec<sampler::Sample>,
        engine: &dyn Engine,
    ) -> Result<PlayedSegment, HapticsError> {
        let _enter = self.span.enter();

        let pattern = Pattern::new(samples)?;
        // The last keyframe starts at the adjusted duration.
        let adjusted = pattern.span();
        let keyframes = pattern.keyframes().len();

        let started = Instant::now();
        let player = engine.play(pattern)?;
        let deadline = started + adjusted.saturating_sub(self.config.overlap());

        debug!(
            keyframes,
            adjusted = ?adjusted,
            next_in = ?deadline.saturating_duration_since(started),
            "Segment started."
        );

        Ok(PlayedSegment { player, deadline })
    }
}
