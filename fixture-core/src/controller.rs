//! Fixture Controller - Zustandsmaschine der Leuchte
//!
//! Einziger Einstiegspunkt für Aufrufer. Verbindet Output Driver und
//! Persisted State Store:
//!
//! ```text
//! Off ──power_on()──▶ On ──power_off()──▶ Off
//! ```
//!
//! Reihenfolge: der Datensatz wird immer NACH dem Hardware-Kommando
//! geschrieben, das er beschreibt. Schlägt die Hardware fehl, bleibt der
//! Datensatz unverändert.

use rgb::RGB8;

use crate::driver::{HardwareChannelSet, OutputDriver};
use crate::error::{FixtureError, StoreError};
use crate::store::StateStore;
use crate::traits::{PwmBackend, PwmChannel, RecordStorage};
use crate::types::{ColorRequest, FixtureState, FixtureStatus, Preset, SnapshotRequest};

/// Betriebszustand der Leuchte
///
/// `On` besitzt die belegten Kanäle; `Off` hat keine Hardware.
pub enum Power<C: PwmChannel> {
    Off,
    On(HardwareChannelSet<C>),
}

impl<C: PwmChannel> Power<C> {
    pub fn is_on(&self) -> bool {
        matches!(self, Power::On(_))
    }
}

/// Fixture Controller über PWM-Hardware `B` und Speicher `S`
pub struct FixtureController<B: PwmBackend, S: RecordStorage> {
    driver: OutputDriver<B>,
    store: StateStore<S>,
    power: Power<B::Channel>,
}

impl<B: PwmBackend, S: RecordStorage> FixtureController<B, S> {
    /// Erstellt einen Controller im Zustand `Off`
    pub fn new(driver: OutputDriver<B>, store: StateStore<S>) -> Self {
        Self {
            driver,
            store,
            power: Power::Off,
        }
    }

    pub fn is_on(&self) -> bool {
        self.power.is_on()
    }

    /// Aktuelle Duty-Cycles (R, G, B)
    pub fn levels(&self) -> [u8; 3] {
        self.driver.levels()
    }

    pub fn driver(&self) -> &OutputDriver<B> {
        &self.driver
    }

    pub fn store(&self) -> &StateStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut StateStore<S> {
        &mut self.store
    }

    /// Schaltet die Leuchte ein
    ///
    /// Belegt die Hardware, lädt den persistierten Zustand (Default beim
    /// ersten Start), stellt dessen Farbe ein und setzt `power_on` im
    /// Datensatz auf `true`.
    ///
    /// Schlägt Laden oder Ansteuern fehl, wird die Hardware wieder
    /// freigegeben und der Controller bleibt `Off`. Schlägt erst das
    /// Persistieren fehl, bleibt die Leuchte an (Hardware ist bereits
    /// geschaltet) und der Fehler wird trotzdem gemeldet.
    pub fn power_on(&mut self) -> Result<FixtureState, FixtureError> {
        if self.power.is_on() {
            return Err(FixtureError::AlreadyOn);
        }

        let mut channels = self.driver.acquire()?;

        let persisted = match self.load_or_default() {
            Ok(state) => state,
            Err(error) => {
                self.driver.release(channels);
                return Err(error.into());
            }
        };

        if let Err(error) = self.driver.drive(&mut channels, persisted.color) {
            self.driver.release(channels);
            return Err(error.into());
        }

        self.power = Power::On(channels);
        let state = self.store.update(|state| FixtureState {
            power_on: true,
            ..state
        })?;
        Ok(state)
    }

    /// Stellt eine neue Farbe ein und persistiert sie
    ///
    /// # Fehlerbehandlung
    /// - `NotPoweredOn` im Zustand `Off` (weder Hardware noch Datensatz ändern sich)
    /// - `InvalidColor` wenn ein Kanal außerhalb von [0, 255] liegt
    pub fn set_color(&mut self, request: ColorRequest) -> Result<FixtureState, FixtureError> {
        if !self.power.is_on() {
            return Err(FixtureError::NotPoweredOn);
        }

        let color = request.validate()?;
        self.drive_and_record(color)
    }

    /// Stellt eine Preset-Farbe ein (wie `set_color`)
    pub fn apply_preset(&mut self, preset: Preset) -> Result<FixtureState, FixtureError> {
        self.set_color(preset.color().into())
    }

    /// Schaltet die Leuchte aus
    ///
    /// Im Zustand `Off` ein No-op, der den persistierten Zustand zurückgibt.
    /// Die Farbe im Datensatz bleibt erhalten; nur `power_on` wird `false`.
    pub fn power_off(&mut self) -> Result<FixtureState, FixtureError> {
        match core::mem::replace(&mut self.power, Power::Off) {
            Power::Off => Ok(self.load_or_default()?),
            Power::On(channels) => {
                self.driver.release(channels);
                let state = self.store.update(|state| FixtureState {
                    power_on: false,
                    ..state
                })?;
                Ok(state)
            }
        }
    }

    /// Überschreibt den kompletten Datensatz mit `snapshot`
    ///
    /// Unabhängig vom Betriebszustand, die Hardware wird nicht angefasst.
    /// Das nächste `power_on()` übernimmt die importierte Farbe.
    pub fn import_snapshot(&mut self, snapshot: FixtureState) -> Result<FixtureState, FixtureError> {
        self.store.replace(&snapshot)?;
        Ok(snapshot)
    }

    /// Wie `import_snapshot`, aber mit Prüfung der Kanäle
    pub fn import_request(
        &mut self,
        request: SnapshotRequest,
    ) -> Result<FixtureState, FixtureError> {
        let snapshot = request.validate()?;
        self.import_snapshot(snapshot)
    }

    /// Zustand für die Index-Ansicht
    pub fn status(&mut self) -> Result<FixtureStatus, FixtureError> {
        Ok(FixtureStatus {
            powered: self.power.is_on(),
            state: self.load_or_default()?,
        })
    }

    /// Verwirft den Datensatz (z.B. nach `Corrupt`) und schreibt den Default
    ///
    /// Die Hardware wird nicht angefasst.
    pub fn restore_defaults(&mut self) -> Result<FixtureState, FixtureError> {
        Ok(self.store.restore_defaults()?)
    }

    fn drive_and_record(&mut self, color: RGB8) -> Result<FixtureState, FixtureError> {
        let Power::On(channels) = &mut self.power else {
            return Err(FixtureError::NotPoweredOn);
        };

        self.driver.drive(channels, color)?;
        let state = self.store.update(|state| FixtureState { color, ..state })?;
        Ok(state)
    }

    /// `NotFound` wird zum Default, `Corrupt` wird gemeldet
    fn load_or_default(&mut self) -> Result<FixtureState, StoreError> {
        match self.store.load() {
            Err(StoreError::NotFound) => Ok(FixtureState::default()),
            result => result,
        }
    }
}
