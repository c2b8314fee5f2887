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
use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// The logical kinds of notification feedback a caller can request.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    #[default]
    Success,
    Warning,
    Error,
}

/// The logical impact strengths a caller can request.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ImpactStyle {
    Light,
    #[default]
    Medium,
    Heavy,
}

/// A one-shot cue as rendered by the actuator hardware.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    NotificationSuccess,
    NotificationWarning,
    NotificationError,
    ImpactLight,
    ImpactMedium,
    ImpactHeavy,
    Selection,
}

impl fmt::Display for Cue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Cue::NotificationSuccess => "notification (success)",
            Cue::NotificationWarning => "notification (warning)",
            Cue::NotificationError => "notification (error)",
            Cue::ImpactLight => "impact (light)",
            Cue::ImpactMedium => "impact (medium)",
            Cue::ImpactHeavy => "impact (heavy)",
            Cue::Selection => "selection",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "success" => Ok(NotificationKind::Success),
            "warning" => Ok(NotificationKind::Warning),
            "error" => Ok(NotificationKind::Error),
            _ => Err(format!("unknown notification kind '{}'", s)),
        }
    }
}

impl FromStr for ImpactStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(ImpactStyle::Light),
            "medium" => Ok(ImpactStyle::Medium),
            "heavy" => Ok(ImpactStyle::Heavy),
            _ => Err(format!("unknown impact style '{}'", s)),
        }
    }
}

/// Maps logical feedback requests to hardware cues. Entries that are not configured fall back to
/// the cue of the same name.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct CueTable {
    #[serde(default)]
    notifications: NotificationCues,
    #[serde(default)]
    impacts: ImpactCues,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
struct NotificationCues {
    success: Option<Cue>,
    warning: Option<Cue>,
    error: Option<Cue>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
struct ImpactCues {
    light: Option<Cue>,
    medium: Option<Cue>,
    heavy: Option<Cue>,
}

impl CueTable {
    /// Overrides the cue used for a notification kind.
    pub fn with_notification(mut self, kind: NotificationKind, cue: Cue) -> CueTable {
        let entry = match kind {
            NotificationKind::Success => &mut self.notifications.success,
            NotificationKind::Warning => &mut self.notifications.warning,
            NotificationKind::Error => &mut self.notifications.error,
        };
        *entry = Some(cue);
        self
    }

    /// Overrides the cue used for an impact style.
    pub fn with_impact(mut self, style: ImpactStyle, cue: Cue) -> CueTable {
        let entry = match style {
            ImpactStyle::Light => &mut self.impacts.light,
            ImpactStyle::Medium => &mut self.impacts.medium,
            ImpactStyle::Heavy => &mut self.impacts.heavy,
        };
        *entry = Some(cue);
        self
    }

    /// Gets the cue for the given notification kind.
    pub fn notification(&self, kind: NotificationKind) -> Cue {
        let (configured, fallback) = match kind {
            NotificationKind::Success => (self.notifications.success, Cue::NotificationSuccess),
            NotificationKind::Warning => (self.notifications.warning, Cue::NotificationWarning),
            NotificationKind::Error => (self.notifications.error, Cue::NotificationError),
        };
        configured.unwrap_or(fallback)
    }

    /// Gets the cue for the given impact style.
    pub fn impact(&self, style: ImpactStyle) -> Cue {
        let (configured, fallback) = match style {
            ImpactStyle::Light => (self.impacts.light, Cue::ImpactLight),
            ImpactStyle::Medium => (self.impacts.medium, Cue::ImpactMedium),
            ImpactStyle::Heavy => (self.impacts.heavy, Cue::ImpactHeavy),
        };
        configured.unwrap_or(fallback)
    }

    /// Selection feedback has a single cue.
    pub fn selection(&self) -> Cue {
        Cue::Selection
    }
}
