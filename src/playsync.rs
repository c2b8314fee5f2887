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
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A continuation flag is shared between a playback session and whoever may want to end it. It
/// starts out set, and once cleared it stays cleared. Each deferred continuation checks it before
/// doing anything, so clearing it suppresses the next segment transition.
#[derive(Clone, Debug)]
pub struct ContinuationFlag {
    keep_playing: Arc<AtomicBool>,
}

impl ContinuationFlag {
    /// Creates a new, set, continuation flag.
    pub fn new() -> ContinuationFlag {
        ContinuationFlag {
            keep_playing: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Returns true if playback should continue.
    pub fn is_set(&self) -> bool {
        self.keep_playing.load(Ordering::Acquire)
    }

    /// Clears the flag. Returns true if this call is the one that cleared it.
    pub fn clear(&self) -> bool {
        self.keep_playing.swap(false, Ordering::AcqRel)
    }
}

impl Default for ContinuationFlag {
    fn default() -> Self {
        ContinuationFlag::new()
    }
}
