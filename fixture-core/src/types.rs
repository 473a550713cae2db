//! Core Types für die Leuchten-Steuerung
//!
//! Datenstrukturen ohne Hardware-Dependencies

use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::FixtureError;

/// Persistierter Zustand der Leuchte
///
/// Single Source of Truth für "was soll die Hardware gerade anzeigen".
/// Default: aus, Farbe schwarz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixtureState {
    pub power_on: bool,
    pub color: RGB8,
}

impl FixtureState {
    pub fn new(power_on: bool, color: RGB8) -> Self {
        Self { power_on, color }
    }
}

/// Zustand für die Index-Ansicht
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixtureStatus {
    /// Hardware-Kanäle sind belegt (Controller im Zustand `On`)
    pub powered: bool,
    /// Persistierter Datensatz (Default beim ersten Start)
    pub state: FixtureState,
}

/// Farb-Anfrage wie sie vom Client kommt (`{"red":..,"green":..,"blue":..}`)
///
/// Die Kanäle sind absichtlich breiter als `u8`: Werte außerhalb von
/// [0, 255] werden abgelehnt, nicht geclampt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ColorRequest {
    pub red: i64,
    pub green: i64,
    pub blue: i64,
}

impl ColorRequest {
    pub fn new(red: i64, green: i64, blue: i64) -> Self {
        Self { red, green, blue }
    }

    /// Prüft alle drei Kanäle und liefert die Farbe
    ///
    /// # Fehlerbehandlung
    /// `FixtureError::InvalidColor` wenn ein Kanal außerhalb von [0, 255] liegt
    pub fn validate(self) -> Result<RGB8, FixtureError> {
        Ok(RGB8 {
            r: channel(self.red)?,
            g: channel(self.green)?,
            b: channel(self.blue)?,
        })
    }
}

impl From<RGB8> for ColorRequest {
    fn from(color: RGB8) -> Self {
        Self::new(color.r.into(), color.g.into(), color.b.into())
    }
}

/// Vollständiger Zustand zum Importieren (`/save_data`)
///
/// Gleiche Form wie die gespeicherte Datei, aber mit breiten Kanälen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SnapshotRequest {
    #[serde(rename = "isOn")]
    pub is_on: bool,
    #[serde(rename = "currColor")]
    pub curr_color: [i64; 3],
}

impl SnapshotRequest {
    pub fn validate(self) -> Result<FixtureState, FixtureError> {
        let [red, green, blue] = self.curr_color;
        let color = ColorRequest::new(red, green, blue).validate()?;
        Ok(FixtureState::new(self.is_on, color))
    }
}

fn channel(value: i64) -> Result<u8, FixtureError> {
    u8::try_from(value).map_err(|_| FixtureError::InvalidColor)
}

/// Farb-Presets der Leuchte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    Sunset,
    Ocean,
    Forest,
    Lavender,
    Amber,
    Off,
}

impl Preset {
    pub const ALL: [Preset; 6] = [
        Preset::Sunset,
        Preset::Ocean,
        Preset::Forest,
        Preset::Lavender,
        Preset::Amber,
        Preset::Off,
    ];

    pub fn color(self) -> RGB8 {
        match self {
            Preset::Sunset => RGB8 { r: 255, g: 94, b: 19 },
            Preset::Ocean => RGB8 { r: 0, g: 128, b: 255 },
            Preset::Forest => RGB8 { r: 34, g: 139, b: 34 },
            Preset::Lavender => RGB8 { r: 230, g: 230, b: 250 },
            Preset::Amber => RGB8 { r: 255, g: 69, b: 0 },
            Preset::Off => RGB8 { r: 0, g: 0, b: 0 },
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Preset::Sunset => "sunset",
            Preset::Ocean => "ocean",
            Preset::Forest => "forest",
            Preset::Lavender => "lavender",
            Preset::Amber => "amber",
            Preset::Off => "off",
        }
    }
}

// ============================================================================
// defmt::Format Implementations (optional feature)
// ============================================================================

#[cfg(feature = "defmt")]
impl defmt::Format for FixtureState {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "FixtureState {{ on: {}, rgb: ({}, {}, {}) }}",
            self.power_on,
            self.color.r,
            self.color.g,
            self.color.b
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ColorRequest {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(
            fmt,
            "ColorRequest {{ rgb: ({}, {}, {}) }}",
            self.red,
            self.green,
            self.blue
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Preset {
    fn format(&self, fmt: defmt::Formatter) {
        defmt::write!(fmt, "{}", self.name())
    }
}
