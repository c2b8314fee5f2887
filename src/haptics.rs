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
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, span, Level, Span};

use crate::{
    actuator::{Device, HapticsError},
    feedback::{Cue, CueTable, ImpactStyle, NotificationKind},
    sampler::SamplerConfig,
    segment::{self, SequenceError},
    sequencer::{SequenceHandle, Sequencer, SessionState},
};

/// Errors returned when a sequence can't be dispatched.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error(transparent)]
    Haptics(#[from] HapticsError),
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// The entry point for callers. Routes feedback requests to whichever actuator is present.
pub struct Haptics {
    device: Option<Arc<dyn Device>>,
    sequencer: Option<Sequencer>,
    cues: CueTable,
    span: Span,
}

impl Haptics {
    /// Creates a facade that plays through the given device.
    pub fn new(device: Arc<dyn Device>, config: SamplerConfig, cues: CueTable) -> Haptics {
        Haptics {
            device: Some(device.clone()),
            sequencer: Some(Sequencer::new(device, config)),
            cues,
            span: span!(Level::INFO, "haptics"),
        }
    }

    /// Creates a facade with no actuator behind it. Every request fails as unavailable.
    pub fn unavailable() -> Haptics {
        Haptics {
            device: None,
            sequencer: None,
            cues: CueTable::default(),
            span: span!(Level::INFO, "haptics"),
        }
    }

    /// Fires a notification cue.
    pub fn notification(&self, kind: NotificationKind) -> Result<(), HapticsError> {
        self.fire("notification", self.cues.notification(kind))
    }

    /// Fires an impact cue.
    pub fn impact(&self, style: ImpactStyle) -> Result<(), HapticsError> {
        self.fire("impact", self.cues.impact(style))
    }

    /// Fires a selection cue.
    pub fn selection(&self) -> Result<(), HapticsError> {
        self.fire("selection", self.cues.selection())
    }

    fn fire(&self, operation: &'static str, cue: Cue) -> Result<(), HapticsError> {
        let _enter = self.span.enter();

        let device = self
            .device
            .as_ref()
            .ok_or(HapticsError::Unavailable { operation })?;
        if !device.supports_haptics() {
            info!(device = %device, cue = %cue, "Device doesn't support haptics, skipping cue.");
            return Ok(());
        }

        device.fire(cue)
    }

    /// Validates the sequence and starts playing it. Nothing reaches the hardware if any element
    /// is invalid.
    pub fn play_sequence(&self, sequence: &Value) -> Result<SequenceHandle, DispatchError> {
        let sequencer = self.sequencer.as_ref().ok_or(HapticsError::Unavailable {
            operation: "play_sequence",
        })?;
        let config = sequencer.config();
        let segments = segment::parse_sequence_with(sequence, |segment| config.check(segment))?;
        Ok(sequencer.play_sequence(segments))
    }

    /// Stops the current sequence, if any.
    pub fn stop_sequence(&self) -> Result<(), HapticsError> {
        let sequencer = self.sequencer.as_ref().ok_or(HapticsError::Unavailable {
            operation: "stop_sequence",
        })?;
        sequencer.stop_sequence();
        Ok(())
    }

    /// The state of the current sequence.
    pub fn state(&self) -> SessionState {
        self.sequencer
            .as_ref()
            .map_or(SessionState::Idle, |sequencer| sequencer.state())
    }
}

#[cfg(test)]
mod test {
    use std::{error::Error, sync::Arc, time::Duration};

    use serde_json::json;

    use crate::{
        actuator::{mock, HapticsError},
        feedback::{Cue, CueTable, ImpactStyle, NotificationKind},
        sampler::SamplerConfig,
        segment::{SegmentError, SequenceError},
        sequencer::SessionState,
    };

    use super::{DispatchError, Haptics};

    fn haptics(device: &mock::Device) -> Haptics {
        Haptics::new(
            Arc::new(device.clone()),
            SamplerConfig::default(),
            CueTable::default(),
        )
    }

    #[test]
    fn test_one_shot_cues() -> Result<(), HapticsError> {
        let device = mock::Device::get("mock-actuator");
        let haptics = haptics(&device);

        haptics.notification(NotificationKind::default())?;
        haptics.notification(NotificationKind::Error)?;
        haptics.impact(ImpactStyle::default())?;
        haptics.impact(ImpactStyle::Heavy)?;
        haptics.selection()?;

        assert_eq!(
            vec![
                Cue::NotificationSuccess,
                Cue::NotificationError,
                Cue::ImpactMedium,
                Cue::ImpactHeavy,
                Cue::Selection,
            ],
            device.cues()
        );
        Ok(())
    }

    #[test]
    fn test_cue_table_remaps() -> Result<(), HapticsError> {
        let device = mock::Device::get("mock-actuator");
        let cues = CueTable::default()
            .with_notification(NotificationKind::Success, Cue::NotificationError)
            .with_impact(ImpactStyle::Light, Cue::Selection);
        let haptics = Haptics::new(Arc::new(device.clone()), SamplerConfig::default(), cues);

        haptics.notification(NotificationKind::Success)?;
        haptics.impact(ImpactStyle::Light)?;
        assert_eq!(vec![Cue::NotificationError, Cue::Selection], device.cues());
        Ok(())
    }

    #[test]
    fn test_unsupported_device_skips_cues() -> Result<(), HapticsError> {
        let device = mock::Device::get("mock-actuator").unsupported();
        let haptics = haptics(&device);

        haptics.selection()?;
        haptics.impact(ImpactStyle::Light)?;
        assert!(device.cues().is_empty());
        Ok(())
    }

    #[test]
    fn test_unavailable() {
        let haptics = Haptics::unavailable();

        assert!(matches!(
            haptics.notification(NotificationKind::Warning),
            Err(HapticsError::Unavailable {
                operation: "notification"
            })
        ));
        assert!(matches!(
            haptics.impact(ImpactStyle::Medium),
            Err(HapticsError::Unavailable { operation: "impact" })
        ));
        assert!(matches!(
            haptics.selection(),
            Err(HapticsError::Unavailable {
                operation: "selection"
            })
        ));
        assert!(matches!(
            haptics.play_sequence(&json!([])),
            Err(DispatchError::Haptics(HapticsError::Unavailable {
                operation: "play_sequence"
            }))
        ));
        assert!(matches!(
            haptics.stop_sequence(),
            Err(HapticsError::Unavailable {
                operation: "stop_sequence"
            })
        ));
        assert_eq!(SessionState::Idle, haptics.state());
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_sequence() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock-actuator");
        let haptics = haptics(&device);

        let handle = haptics.play_sequence(&json!([
            {
                "startIntensity": 0.2,
                "endIntensity": 1.0,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 1.0,
            },
            {
                "startIntensity": 1.0,
                "endIntensity": 0.0,
                "startSharpness": 0.5,
                "endSharpness": 0.1,
                "duration": 0.5,
            },
        ]))?;

        assert_eq!(SessionState::Completed, handle.finished().await);
        let played = device.played();
        assert_eq!(2, played.len());
        let gap = played[1].started_at - played[0].started_at;
        assert!(gap >= Duration::from_secs(1), "gap was {:?}", gap);
        assert!(gap < Duration::from_millis(1010), "gap was {:?}", gap);
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_sequence_never_reaches_hardware() {
        let device = mock::Device::get("mock-actuator");
        let haptics = haptics(&device);

        let result = haptics.play_sequence(&json!([
            {
                "startIntensity": 0.2,
                "endIntensity": 1.0,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 1.0,
            },
            {
                "startIntensity": 0.2,
                "endIntensity": 1.0,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 0.0,
            },
            {
                "startIntensity": 0.2,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 1.0,
            },
        ]));

        match result {
            Err(DispatchError::Sequence(SequenceError::Invalid(errors))) => {
                let indices: Vec<usize> = errors.iter().map(|error| error.index).collect();
                assert_eq!(vec![1, 2], indices);
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("invalid sequence was accepted"),
        }
        assert_eq!(0, device.engines_created());
        assert!(device.played().is_empty());

        assert!(matches!(
            haptics.play_sequence(&json!({"duration": 1.0})),
            Err(DispatchError::Sequence(SequenceError::NotAList))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsamplable_sequence_is_rejected() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock-actuator");
        let haptics = Haptics::new(
            Arc::new(device.clone()),
            SamplerConfig::new(30, Duration::ZERO)?,
            CueTable::default(),
        );

        let result = haptics.play_sequence(&json!([
            {
                "startIntensity": 0.5,
                "endIntensity": 0.5,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 1.0e-8,
            },
            {
                "startIntensity": 0.5,
                "endIntensity": 0.5,
                "startSharpness": 0.5,
                "endSharpness": 0.5,
                "duration": 2.0e10,
            },
        ]));

        match result {
            Err(DispatchError::Sequence(SequenceError::Invalid(errors))) => {
                assert_eq!(2, errors.len());
                assert!(matches!(
                    errors[0].error,
                    SegmentError::TooShortToSample { steps: 30, .. }
                ));
                assert!(matches!(errors[1].error, SegmentError::DurationTooLong(_)));
            }
            Err(e) => panic!("unexpected error: {}", e),
            Ok(_) => panic!("unsamplable sequence was accepted"),
        }
        assert_eq!(0, device.engines_created());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_sequence() -> Result<(), Box<dyn Error>> {
        let device = mock::Device::get("mock-actuator");
        let haptics = haptics(&device);

        // Stopping with nothing playing is fine.
        haptics.stop_sequence()?;

        let segment = json!({
            "startIntensity": 0.5,
            "endIntensity": 0.5,
            "startSharpness": 0.5,
            "endSharpness": 0.5,
            "duration": 0.5,
        });
        let handle = haptics.play_sequence(&json!([segment.clone(), segment]))?;
        tokio::time::sleep(Duration::from_millis(100)).await;

        haptics.stop_sequence()?;
        haptics.stop_sequence()?;
        assert_eq!(SessionState::Stopped, handle.finished().await);
        assert_eq!(SessionState::Stopped, haptics.state());

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(1, device.played().len());
        assert_eq!(1, device.stop_count());
        Ok(())
    }
}
