//! Speicherformat des persistierten Zustands
//!
//! Die Datei hat exakt die Form `{"isOn":true,"currColor":[255,0,0]}`.
//! Externe Tools lesen genau diese beiden Keys.

use rgb::RGB8;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::types::FixtureState;

/// Maximale Länge eines kodierten Datensatzes in Bytes
///
/// Der längste Datensatz `{"isOn":false,"currColor":[255,255,255]}` hat 40 Bytes.
pub const RECORD_CAPACITY: usize = 64;

/// Maximale Länge eines lesbaren Datensatzes in Bytes
///
/// Größer als `RECORD_CAPACITY`, damit auch eingerückt geschriebene Dateien
/// (z.B. von Hand gepflegt) gelesen werden können.
pub const READ_CAPACITY: usize = 256;

#[derive(Serialize, Deserialize)]
struct StateRecord {
    #[serde(rename = "isOn")]
    is_on: bool,
    #[serde(rename = "currColor")]
    curr_color: [u8; 3],
}

impl From<&FixtureState> for StateRecord {
    fn from(state: &FixtureState) -> Self {
        Self {
            is_on: state.power_on,
            curr_color: [state.color.r, state.color.g, state.color.b],
        }
    }
}

impl From<StateRecord> for FixtureState {
    fn from(record: StateRecord) -> Self {
        let [r, g, b] = record.curr_color;
        FixtureState::new(record.is_on, RGB8 { r, g, b })
    }
}

/// Kodiert den Zustand als JSON nach `buffer`, gibt die Länge zurück
pub fn encode(state: &FixtureState, buffer: &mut [u8]) -> Result<usize, StoreError> {
    serde_json_core::to_slice(&StateRecord::from(state), buffer).map_err(|_| StoreError::IoFailure)
}

/// Dekodiert einen Datensatz
///
/// Fehlende Keys, Kanäle außerhalb von [0, 255] und Müll hinter dem
/// JSON-Objekt gelten als `StoreError::Corrupt`.
pub fn decode(bytes: &[u8]) -> Result<FixtureState, StoreError> {
    let (record, consumed) =
        serde_json_core::from_slice::<StateRecord>(bytes).map_err(|_| StoreError::Corrupt)?;

    let trailing = &bytes[consumed..];
    if !trailing.iter().all(u8::is_ascii_whitespace) {
        return Err(StoreError::Corrupt);
    }

    Ok(record.into())
}
