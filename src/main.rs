// Copyright (C) 2025 Michael Wilson <mike@mdwn.dev>
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
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use hapseq::config::{self, init_haptics, init_haptics_and_controller};
use hapseq::sampler::{self, SamplerConfig, DEFAULT_STEPS};
use hapseq::segment::{self, SequenceError};
use hapseq::util::{duration_seconds_millis, filename_display};
use hapseq::{actuator, sequencer::SessionState};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A haptic sequence player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the available haptic actuators.
    Devices {},
    /// Prints the keyframes each segment of a sequence file is sampled into.
    Sample {
        /// The path to the sequence file.
        sequence_path: String,
        /// The number of interpolation steps per segment.
        #[arg[short, long]]
        steps: Option<u32>,
        /// The overlap between consecutive segments, e.g. 100ms.
        #[arg[short, long]]
        overlap: Option<String>,
    },
    /// Verifies a sequence file.
    Verify {
        /// The path to the sequence file.
        sequence_path: String,
    },
    /// Plays a sequence file and waits for it to finish.
    Play {
        /// The path to the haptics config.
        config_path: String,
        /// The path to the sequence file.
        sequence_path: String,
    },
    /// Start will start the keyboard controller.
    Start {
        /// The path to the haptics config.
        config_path: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Devices {} => {
            let devices = actuator::list_devices();

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Sample {
            sequence_path,
            steps,
            overlap,
        } => {
            let overlap: Duration = match overlap {
                Some(overlap) => DurationString::from_string(overlap)?.into(),
                None => sampler::DEFAULT_OVERLAP,
            };
            let config = SamplerConfig::new(steps.unwrap_or(DEFAULT_STEPS), overlap)?;
            let segments = parse_segments(&PathBuf::from(&sequence_path), &config)?;

            for (index, segment) in segments.iter().enumerate() {
                println!(
                    "Segment {} ({}, adjusted {}):",
                    index,
                    segment,
                    duration_seconds_millis(config.adjusted_duration(segment))
                );
                for sample in sampler::sample(segment, &config) {
                    println!("  {}", sample);
                }
            }
        }
        Commands::Verify { sequence_path } => {
            let path = PathBuf::from(&sequence_path);
            let segments = parse_segments(&path, &SamplerConfig::default())?;

            let total: Duration = segments.iter().map(|segment| segment.duration()).sum();
            println!(
                "{} (segments: {}, duration: {}):",
                filename_display(&path),
                segments.len(),
                duration_seconds_millis(total)
            );
            for segment in segments {
                println!("- {}", segment);
            }
        }
        Commands::Play {
            config_path,
            sequence_path,
        } => {
            let haptics = init_haptics(&PathBuf::from(config_path))?;
            let sequence = config::parse_sequence(&PathBuf::from(sequence_path))?;
            let handle = haptics.play_sequence(&sequence)?;

            match handle.finished().await {
                SessionState::Completed => println!("Sequence completed."),
                state => return Err(format!("sequence ended early: {}", state).into()),
            }
        }
        Commands::Start { config_path } => {
            init_haptics_and_controller(&PathBuf::from(config_path))?
                .join()
                .await?;
        }
    }

    Ok(())
}

/// Reads and validates a sequence file, printing every invalid element.
fn parse_segments(
    path: &Path,
    sampler: &SamplerConfig,
) -> Result<Vec<segment::SegmentSpec>, Box<dyn Error>> {
    let sequence = config::parse_sequence(path)?;
    match segment::parse_sequence_with(&sequence, |segment| sampler.check(segment)) {
        Ok(segments) => Ok(segments),
        Err(SequenceError::Invalid(errors)) => {
            println!("{} is invalid:", filename_display(path));
            for error in errors.iter() {
                println!("- {}", error);
            }
            Err(format!("{} invalid segment(s)", errors.len()).into())
        }
        Err(e) => Err(e.into()),
    }
}
