// HTTP-Protokoll-Definitionen
// Definiert die JSON-Bodies für Client ↔ Server Kommunikation
//
// Anfragen für Farbe und Import (`ColorRequest`, `SnapshotRequest`) liegen in
// fixture-core, weil der Controller sie direkt prüft.

use serde::{Deserialize, Serialize};

use fixture_core::{FixtureStatus, Preset};

/// Body von POST /preset: `{"preset":"ocean"}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PresetRequest {
    pub preset: Preset,
}

/// Erfolgsmeldung von /control, /preset und /reset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Antwort von /save_data: der Browser navigiert danach zu /shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SaveDataResponse {
    pub redirect: bool,
    pub redirect_url: &'static str,
}

/// Antwort von GET /state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusResponse {
    /// Hardware belegt (Controller `On`)
    pub powered: bool,
    #[serde(rename = "isOn")]
    pub is_on: bool,
    #[serde(rename = "currColor")]
    pub curr_color: [u8; 3],
}

impl From<FixtureStatus> for StatusResponse {
    fn from(status: FixtureStatus) -> Self {
        let color = status.state.color;
        Self {
            powered: status.powered,
            is_on: status.state.power_on,
            curr_color: [color.r, color.g, color.b],
        }
    }
}

/// Fehler-Body: `{"error":"not_powered_on","message":"..."}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ErrorResponse<'a> {
    pub error: &'static str,
    pub message: &'a str,
}
