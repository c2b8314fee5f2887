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
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinError;
use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{error, info, span, Instrument, Level};

use crate::feedback::{ImpactStyle, NotificationKind};
use crate::haptics::Haptics;

pub mod keyboard;

/// Controller events that will trigger haptic feedback.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// Plays the sequence in the given file, superseding anything already playing.
    PlaySequence(PathBuf),

    /// Stops the current sequence. If nothing is playing, does nothing.
    Stop,

    /// Fires a notification cue.
    Notification(NotificationKind),

    /// Fires an impact cue.
    Impact(ImpactStyle),

    /// Fires a selection cue.
    Selection,
}

pub trait Driver: Send + Sync + 'static {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>>;
}

/// Drives the haptics facade from a stream of events.
pub struct Controller {
    handle: JoinHandle<()>,
}

impl Controller {
    /// Creates a new controller with the given driver.
    pub fn new(
        haptics: Arc<Haptics>,
        driver: Arc<dyn Driver>,
    ) -> Result<Controller, Box<dyn Error>> {
        let span = span!(Level::INFO, "controller");
        Ok(Controller {
            handle: tokio::spawn(Controller::trigger_events(haptics, driver).instrument(span)),
        })
    }

    /// Join will block until the controller finishes.
    pub async fn join(&mut self) -> Result<(), JoinError> {
        (&mut self.handle).await
    }

    /// Triggers haptic feedback by watching the driver and getting events from it.
    async fn trigger_events(haptics: Arc<Haptics>, driver: Arc<dyn Driver>) {
        let (events_tx, mut events_rx) = mpsc::channel(1);
        let join_handle = driver.monitor_events(events_tx);

        info!("Controller started.");

        loop {
            if let Some(event) = events_rx.recv().await {
                info!(event = format!("{:?}", event), "Received event.");

                if let Err(e) = Controller::dispatch(&haptics, event) {
                    error!("Error talking to haptics: {}", e);
                }
            } else {
                info!("Controller closing.");
                if let Err(e) = join_handle.await {
                    error!("Error waiting for event monitor to stop: {}", e);
                }
                return;
            }
        }
    }

    fn dispatch(haptics: &Haptics, event: Event) -> Result<(), Box<dyn Error>> {
        match event {
            Event::PlaySequence(path) => {
                let sequence = crate::config::parse_sequence(&path)?;
                let handle = haptics.play_sequence(&sequence)?;
                info!(
                    session = handle.id(),
                    file = crate::util::filename_display(&path),
                    "Sequence submitted."
                );
            }
            Event::Stop => haptics.stop_sequence()?,
            Event::Notification(kind) => haptics.notification(kind)?,
            Event::Impact(style) => haptics.impact(style)?,
            Event::Selection => haptics.selection()?,
        }
        Ok(())
    }
}
