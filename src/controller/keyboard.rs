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
use std::{io, path::PathBuf, str::FromStr};

use tokio::{sync::mpsc::Sender, task::JoinHandle};
use tracing::{info, span, warn, Level};

use crate::feedback::{ImpactStyle, NotificationKind};

use super::Event;

const PLAY: &str = "play";
const STOP: &str = "stop";
const NOTIFY: &str = "notify";
const IMPACT: &str = "impact";
const SELECT: &str = "select";

/// A controller that drives haptics using the keyboard.
pub struct Driver {}

impl Driver {
    pub fn new() -> Driver {
        Driver {}
    }

    /// Parses a single command line. Notification and impact arguments are optional and fall back
    /// to their defaults.
    fn parse_command(input: &str) -> Result<Event, String> {
        let mut parts = input.split_whitespace();
        let command = parts.next().unwrap_or_default().to_lowercase();
        let argument = parts.next();

        match command.as_str() {
            PLAY => argument
                .map(|path| Event::PlaySequence(PathBuf::from(path)))
                .ok_or_else(|| "play needs a sequence file".to_string()),
            STOP => Ok(Event::Stop),
            NOTIFY => Ok(Event::Notification(
                argument
                    .map(NotificationKind::from_str)
                    .transpose()?
                    .unwrap_or_default(),
            )),
            IMPACT => Ok(Event::Impact(
                argument
                    .map(ImpactStyle::from_str)
                    .transpose()?
                    .unwrap_or_default(),
            )),
            SELECT => Ok(Event::Selection),
            _ => Err(format!("unrecognized command '{}'", command)),
        }
    }

    fn monitor_io<R, W>(
        events_tx: &Sender<Event>,
        mut reader: R,
        mut writer: W,
    ) -> Result<(), io::Error>
    where
        R: io::BufRead,
        W: io::Write,
    {
        write!(
            writer,
            "Command ({} <file>, {}, {} [kind], {} [style], {}): ",
            PLAY, STOP, NOTIFY, IMPACT, SELECT,
        )?;
        writer.flush()?;
        let mut input: String = String::default();
        if reader.read_line(&mut input)? == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "input closed"));
        }

        match Self::parse_command(input.trim()) {
            Ok(event) => events_tx
                .blocking_send(event)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?,
            Err(reason) => warn!(input = input.trim(), reason = %reason, "Unrecognized input"),
        }
        Ok(())
    }
}

impl super::Driver for Driver {
    fn monitor_events(&self, events_tx: Sender<Event>) -> JoinHandle<Result<(), io::Error>> {
        tokio::task::spawn_blocking(move || {
            let span = span!(Level::INFO, "keyboard driver");
            let _enter = span.enter();

            info!("Keyboard driver started.");

            loop {
                Self::monitor_io(&events_tx, io::stdin().lock(), io::stdout())?;
            }
        })
    }
}
