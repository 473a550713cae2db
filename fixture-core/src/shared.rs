//! Geteilter Fixture Controller
//!
//! Mehrere HTTP-Tasks greifen auf dieselbe Leuchte zu. Jede Operation läuft
//! komplett (prüfen → ansteuern → persistieren) innerhalb EINES Locks, es
//! läuft also höchstens eine Operation gleichzeitig.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::controller::FixtureController;
use crate::error::FixtureError;
use crate::traits::{PwmBackend, RecordStorage};
use crate::types::{ColorRequest, FixtureState, FixtureStatus, Preset, SnapshotRequest};

/// Fixture Controller hinter einem Mutex
///
/// - Firmware: `NoopRawMutex` (alle Tasks auf einem Executor)
/// - Threads: `CriticalSectionRawMutex`
pub struct SharedFixture<M: RawMutex, B: PwmBackend, S: RecordStorage> {
    inner: Mutex<M, RefCell<FixtureController<B, S>>>,
}

impl<M: RawMutex, B: PwmBackend, S: RecordStorage> SharedFixture<M, B, S> {
    pub fn new(controller: FixtureController<B, S>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(controller)),
        }
    }

    /// Führt `f` exklusiv auf dem Controller aus
    ///
    /// `f` darf nicht erneut auf dieselbe `SharedFixture` zugreifen.
    pub fn with<R>(&self, f: impl FnOnce(&mut FixtureController<B, S>) -> R) -> R {
        self.inner.lock(|controller| f(&mut controller.borrow_mut()))
    }

    pub fn power_on(&self) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.power_on())
    }

    pub fn set_color(&self, request: ColorRequest) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.set_color(request))
    }

    pub fn apply_preset(&self, preset: Preset) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.apply_preset(preset))
    }

    pub fn power_off(&self) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.power_off())
    }

    pub fn import_snapshot(&self, snapshot: FixtureState) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.import_snapshot(snapshot))
    }

    pub fn import_request(&self, request: SnapshotRequest) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.import_request(request))
    }

    pub fn status(&self) -> Result<FixtureStatus, FixtureError> {
        self.with(|controller| controller.status())
    }

    pub fn restore_defaults(&self) -> Result<FixtureState, FixtureError> {
        self.with(|controller| controller.restore_defaults())
    }

    pub fn into_inner(self) -> FixtureController<B, S> {
        self.inner.into_inner().into_inner()
    }
}
