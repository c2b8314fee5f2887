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

use tracing::info;

use crate::actuator::{Device, Engine, HapticsError};

/// Owns the engine for one playback session. The engine is created and started the first time it's
/// needed and reused until the lifecycle is released.
pub struct EngineLifecycle {
    device: Arc<dyn Device>,
    engine: Option<Arc<dyn Engine>>,
}

impl EngineLifecycle {
    pub fn new(device: Arc<dyn Device>) -> EngineLifecycle {
        EngineLifecycle {
            device,
            engine: None,
        }
    }

    /// Returns the started engine, creating and starting it if needed.
    pub fn ensure_started(&mut self) -> Result<Arc<dyn Engine>, HapticsError> {
        if let Some(engine) = &self.engine {
            return Ok(engine.clone());
        }

        if !self.device.supports_haptics() {
            return Err(HapticsError::Unsupported);
        }

        let engine = self.device.create_engine()?;
        engine.start()?;
        info!(device = %self.device, "Haptic engine started.");

        self.engine = Some(engine.clone());
        Ok(engine)
    }

    /// Releases the engine handle. The next call to ensure_started creates a fresh engine.
    pub fn release(&mut self) {
        self.engine = None;
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use crate::actuator::{mock, HapticsError};

    use super::EngineLifecycle;

    #[test]
    fn test_ensure_started_is_idempotent() -> Result<(), HapticsError> {
        let device = mock::Device::get("mock-actuator");
        let mut lifecycle = EngineLifecycle::new(Arc::new(device.clone()));

        let first = lifecycle.ensure_started()?;
        let second = lifecycle.ensure_started()?;
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(1, device.engines_created());

        lifecycle.release();
        lifecycle.ensure_started()?;
        assert_eq!(2, device.engines_created());
        Ok(())
    }

    #[test]
    fn test_unsupported_device() {
        let device = mock::Device::get("mock-actuator").unsupported();
        let mut lifecycle = EngineLifecycle::new(Arc::new(device.clone()));

        assert!(matches!(
            lifecycle.ensure_started(),
            Err(HapticsError::Unsupported)
        ));
        assert_eq!(0, device.engines_created());
    }

    #[test]
    fn test_engine_failure() {
        let device = mock::Device::get("mock-actuator").failing_engine();
        let mut lifecycle = EngineLifecycle::new(Arc::new(device.clone()));

        assert!(matches!(
            lifecycle.ensure_started(),
            Err(HapticsError::Engine(_))
        ));
        // A failed engine isn't kept around.
        assert!(lifecycle.ensure_started().is_err());
        assert_eq!(2, device.engines_created());
    }
}
