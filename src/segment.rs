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
use std::{fmt, time::Duration};

use serde_json::Value;

pub const START_INTENSITY: &str = "startIntensity";
pub const END_INTENSITY: &str = "endIntensity";
pub const START_SHARPNESS: &str = "startSharpness";
pub const END_SHARPNESS: &str = "endSharpness";
pub const DURATION: &str = "duration";

/// Why a single sequence element was rejected.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SegmentError {
    #[error("element is not an object")]
    NotAnObject,
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
    #[error("field `{0}` must be a number")]
    NotANumber(&'static str),
    #[error("field `{field}` must be within 0.0 and 1.0, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
    #[error("duration must be greater than zero, got {0}")]
    NonPositiveDuration(f64),
    #[error("duration of {0}s is too long to schedule")]
    DurationTooLong(f64),
    #[error("duration of {seconds}s is too short to sample into {steps} steps")]
    TooShortToSample { seconds: f64, steps: u32 },
}

/// A rejected sequence element along with its position in the sequence.
#[derive(Debug, PartialEq, thiserror::Error)]
#[error("invalid sequence element at index {index}: {error}")]
pub struct ValidationError {
    pub index: usize,
    pub error: SegmentError,
}

/// Errors reported to the caller of a sequence request. Nothing is played when one of these is
/// returned.
#[derive(Debug, thiserror::Error)]
pub enum SequenceError {
    #[error("a sequence must be a list of segments")]
    NotAList,
    #[error("{}", describe_all(.0))]
    Invalid(Vec<ValidationError>),
}

fn describe_all(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<String>>()
        .join("; ")
}

/// One interpolated intensity/sharpness ramp. Values can only be built through validation, so a
/// segment spec always has parameters within 0.0 and 1.0 and a non-zero duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SegmentSpec {
    start_intensity: f32,
    end_intensity: f32,
    start_sharpness: f32,
    end_sharpness: f32,
    duration: Duration,
}

impl SegmentSpec {
    /// Creates a new segment. Intensity and sharpness are given as (start, end) pairs.
    pub fn new(
        intensity: (f32, f32),
        sharpness: (f32, f32),
        duration: Duration,
    ) -> Result<SegmentSpec, SegmentError> {
        if duration.is_zero() {
            return Err(SegmentError::NonPositiveDuration(0.0));
        }
        if duration.as_nanos() > u128::from(u64::MAX) {
            return Err(SegmentError::DurationTooLong(duration.as_secs_f64()));
        }

        Ok(SegmentSpec {
            start_intensity: unit(START_INTENSITY, intensity.0.into())?,
            end_intensity: unit(END_INTENSITY, intensity.1.into())?,
            start_sharpness: unit(START_SHARPNESS, sharpness.0.into())?,
            end_sharpness: unit(END_SHARPNESS, sharpness.1.into())?,
            duration,
        })
    }

    /// Parses a segment from a loosely typed element, e.g. one decoded from JSON or YAML. The
    /// duration is given in seconds.
    pub fn from_value(value: &Value) -> Result<SegmentSpec, SegmentError> {
        let object = value.as_object().ok_or(SegmentError::NotAnObject)?;
        let number = |field: &'static str| -> Result<f64, SegmentError> {
            object
                .get(field)
                .ok_or(SegmentError::MissingField(field))?
                .as_f64()
                .ok_or(SegmentError::NotANumber(field))
        };

        let start_sharpness = unit(START_SHARPNESS, number(START_SHARPNESS)?)?;
        let start_intensity = unit(START_INTENSITY, number(START_INTENSITY)?)?;
        let end_sharpness = unit(END_SHARPNESS, number(END_SHARPNESS)?)?;
        let end_intensity = unit(END_INTENSITY, number(END_INTENSITY)?)?;
        let seconds = number(DURATION)?;

        // Durations too small to be represented in nanoseconds count as zero.
        let duration = match Duration::try_from_secs_f64(seconds) {
            Ok(duration) if seconds > 0.0 && !duration.is_zero() => duration,
            _ => return Err(SegmentError::NonPositiveDuration(seconds)),
        };
        if duration.as_nanos() > u128::from(u64::MAX) {
            return Err(SegmentError::DurationTooLong(seconds));
        }

        Ok(SegmentSpec {
            start_intensity,
            end_intensity,
            start_sharpness,
            end_sharpness,
            duration,
        })
    }

    pub fn start_intensity(&self) -> f32 {
        self.start_intensity
    }

    pub fn end_intensity(&self) -> f32 {
        self.end_intensity
    }

    pub fn start_sharpness(&self) -> f32 {
        self.start_sharpness
    }

    pub fn end_sharpness(&self) -> f32 {
        self.end_sharpness
    }

    /// The nominal duration of the segment, not including any overlap window.
    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl fmt::Display for SegmentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "intensity {:.2} -> {:.2}, sharpness {:.2} -> {:.2} over {:.3}s",
            self.start_intensity,
            self.end_intensity,
            self.start_sharpness,
            self.end_sharpness,
            self.duration.as_secs_f64(),
        )
    }
}

/// Checks that the value is a finite number within 0.0 and 1.0.
fn unit(field: &'static str, value: f64) -> Result<f32, SegmentError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(SegmentError::OutOfRange { field, value });
    }
    Ok(value as f32)
}

/// Parses an ordered list of segments. Every element is checked before anything is returned, and
/// all offending elements are reported together.
pub fn parse_sequence(value: &Value) -> Result<Vec<SegmentSpec>, SequenceError> {
    parse_sequence_with(value, |_| Ok(()))
}

/// Parses an ordered list of segments, applying an extra check to every segment that parses.
pub fn parse_sequence_with<F>(value: &Value, check: F) -> Result<Vec<SegmentSpec>, SequenceError>
where
    F: Fn(&SegmentSpec) -> Result<(), SegmentError>,
{
    let elements = value.as_array().ok_or(SequenceError::NotAList)?;

    let mut segments = Vec::with_capacity(elements.len());
    let mut errors = Vec::new();
    for (index, element) in elements.iter().enumerate() {
        match SegmentSpec::from_value(element).and_then(|segment| check(&segment).map(|_| segment)) {
            Ok(segment) => segments.push(segment),
            Err(error) => errors.push(ValidationError { index, error }),
        }
    }

    if !errors.is_empty() {
        return Err(SequenceError::Invalid(errors));
    }
    Ok(segments)
}

#[cfg(test)]
mod test {
    use std::time::Duration;

    use serde_json::json;

    use super::*;

    #[test]
    fn test_parse_sequence() -> Result<(), SequenceError> {
        let segments = parse_sequence(&json!([
            {
                "startSharpness": 0.1,
                "startIntensity": 0.2,
                "endSharpness": 0.3,
                "endIntensity": 0.4,
                "duration": 1.5,
            },
            {
                "startSharpness": 0,
                "startIntensity": 1,
                "endSharpness": 1,
                "endIntensity": 0,
                "duration": 2,
            },
        ]))?;

        assert_eq!(2, segments.len());
        assert_eq!(0.1, segments[0].start_sharpness());
        assert_eq!(0.2, segments[0].start_intensity());
        assert_eq!(0.3, segments[0].end_sharpness());
        assert_eq!(0.4, segments[0].end_intensity());
        assert_eq!(Duration::from_millis(1500), segments[0].duration());
        assert_eq!(1.0, segments[1].start_intensity());
        assert_eq!(Duration::from_secs(2), segments[1].duration());
        Ok(())
    }

    #[test]
    fn test_parse_empty_sequence() -> Result<(), SequenceError> {
        assert!(parse_sequence(&json!([]))?.is_empty());
        Ok(())
    }

    #[test]
    fn test_not_a_list() {
        assert!(matches!(
            parse_sequence(&json!({"duration": 1.0})),
            Err(SequenceError::NotAList)
        ));
    }

    #[test]
    fn test_errors_are_reported_per_element() {
        let result = parse_sequence(&json!([
            {
                "startSharpness": 0.1,
                "startIntensity": 0.2,
                "endSharpness": 0.3,
                "endIntensity": 0.4,
                "duration": 1.0,
            },
            {
                "startSharpness": 0.1,
                "startIntensity": 0.2,
                "endSharpness": 0.3,
                "duration": 1.0,
            },
            {
                "startSharpness": "sharp",
                "startIntensity": 0.2,
                "endSharpness": 0.3,
                "endIntensity": 0.4,
                "duration": 1.0,
            },
            {
                "startSharpness": 0.1,
                "startIntensity": 0.2,
                "endSharpness": 0.3,
                "endIntensity": 0.4,
                "duration": 0,
            },
            "segment",
        ]));

        let errors = match result {
            Err(SequenceError::Invalid(errors)) => errors,
            other => panic!("expected validation errors, got {:?}", other),
        };
        assert_eq!(
            vec![
                ValidationError {
                    index: 1,
                    error: SegmentError::MissingField(END_INTENSITY),
                },
                ValidationError {
                    index: 2,
                    error: SegmentError::NotANumber(START_SHARPNESS),
                },
                ValidationError {
                    index: 3,
                    error: SegmentError::NonPositiveDuration(0.0),
                },
                ValidationError {
                    index: 4,
                    error: SegmentError::NotAnObject,
                },
            ],
            errors
        );
    }

    #[test]
    fn test_out_of_range() {
        let result = SegmentSpec::from_value(&json!({
            "startSharpness": 0.1,
            "startIntensity": 1.5,
            "endSharpness": 0.3,
            "endIntensity": 0.4,
            "duration": 1.0,
        }));
        assert_eq!(
            Err(SegmentError::OutOfRange {
                field: START_INTENSITY,
                value: 1.5
            }),
            result
        );

        let result = SegmentSpec::from_value(&json!({
            "startSharpness": 0.1,
            "startIntensity": 0.5,
            "endSharpness": 0.3,
            "endIntensity": 0.4,
            "duration": -1.0,
        }));
        assert_eq!(Err(SegmentError::NonPositiveDuration(-1.0)), result);
    }

    #[test]
    fn test_new() {
        assert!(SegmentSpec::new((0.0, 1.0), (0.5, 0.5), Duration::from_millis(10)).is_ok());
        assert_eq!(
            Err(SegmentError::NonPositiveDuration(0.0)),
            SegmentSpec::new((0.0, 1.0), (0.5, 0.5), Duration::ZERO)
        );
        assert_eq!(
            Err(SegmentError::OutOfRange {
                field: END_SHARPNESS,
                value: -0.5
            }),
            SegmentSpec::new((0.0, 1.0), (0.5, -0.5), Duration::from_secs(1))
        );
        assert!(matches!(
            SegmentSpec::new((f32::NAN, 1.0), (0.5, 0.5), Duration::from_secs(1)),
            Err(SegmentError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_duration_too_long() {
        // About 634 years, past what a nanosecond timeline can address.
        let result = SegmentSpec::from_value(&json!({
            "startSharpness": 0.1,
            "startIntensity": 0.5,
            "endSharpness": 0.3,
            "endIntensity": 0.4,
            "duration": 2.0e10,
        }));
        assert_eq!(Err(SegmentError::DurationTooLong(2.0e10)), result);

        assert!(matches!(
            SegmentSpec::new((0.0, 1.0), (0.5, 0.5), Duration::MAX),
            Err(SegmentError::DurationTooLong(_))
        ));
    }

    #[test]
    fn test_parse_sequence_with_check() {
        let segment = json!({
            "startSharpness": 0.1,
            "startIntensity": 0.5,
            "endSharpness": 0.3,
            "endIntensity": 0.4,
            "duration": 1.0,
        });
        let result = parse_sequence_with(&json!([segment.clone(), segment]), |segment| {
            Err(SegmentError::TooShortToSample {
                seconds: segment.duration().as_secs_f64(),
                steps: 30,
            })
        });

        match result {
            Err(SequenceError::Invalid(errors)) => {
                assert_eq!(2, errors.len());
                assert_eq!(1, errors[1].index);
                assert_eq!(
                    SegmentError::TooShortToSample {
                        seconds: 1.0,
                        steps: 30
                    },
                    errors[1].error
                );
            }
            _ => panic!("check was not applied"),
        }
    }

    #[test]
    fn test_display() {
        let segment = SegmentSpec::new((0.25, 1.0), (0.5, 0.0), Duration::from_millis(250))
            .expect("valid segment");
        assert_eq!(
            "intensity 0.25 -> 1.00, sharpness 0.50 -> 0.00 over 0.250s",
            segment.to_string()
        );
    }
}
