//! Test-Hilfen für die Host-Tests
//!
//! - `MockPwmBackend`: PWM-Hardware im Speicher, beobachtbar über `PwmProbe`
//! - `RamFlash`: NOR-Flash im Speicher mit echter Erase/Write-Semantik

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_storage::nor_flash::{
    ErrorType, NorFlash, NorFlashError, NorFlashErrorKind, ReadNorFlash,
};
use fixture_core::{
    DEFAULT_MAX_DUTY, DriverError, FixtureController, NorFlashStorage, OutputDriver, PwmBackend,
    PwmChannel, StateStore,
};

// Linkt die std-Implementierung von critical-section (CriticalSectionRawMutex)
use critical_section as _;

// ============================================================================
// Mock PWM Backend
// ============================================================================

#[derive(Debug, Default)]
pub struct ProbeState {
    /// Aktuelle Duty-Cycles (R, G, B) wie sie an der "Hardware" anliegen
    pub duties: [u8; 3],
    /// Anzahl erfolgreicher set_duty() Aufrufe
    pub write_count: usize,
    pub acquire_count: usize,
    pub release_count: usize,
    /// Kanal-Index, dessen set_duty() für Werte > 0 fehlschlägt
    /// (Ausschalten auf 0 klappt weiterhin)
    pub fail_channel: Option<usize>,
    pub fail_acquire: bool,
}

/// Beobachtet die Mock-Hardware, auch nachdem die Kanäle verschoben wurden
#[derive(Debug, Clone, Default)]
pub struct PwmProbe {
    state: Arc<Mutex<ProbeState>>,
}

impl PwmProbe {
    fn lock(&self) -> MutexGuard<'_, ProbeState> {
        self.state.lock().unwrap()
    }

    pub fn duties(&self) -> [u8; 3] {
        self.lock().duties
    }

    pub fn write_count(&self) -> usize {
        self.lock().write_count
    }

    pub fn acquire_count(&self) -> usize {
        self.lock().acquire_count
    }

    pub fn release_count(&self) -> usize {
        self.lock().release_count
    }

    pub fn fail_channel(&self, channel: Option<usize>) {
        self.lock().fail_channel = channel;
    }

    pub fn fail_acquire(&self, fail: bool) {
        self.lock().fail_acquire = fail;
    }
}

pub struct MockPwmChannel {
    index: usize,
    probe: PwmProbe,
}

impl PwmChannel for MockPwmChannel {
    fn set_duty(&mut self, duty: u8) -> Result<(), DriverError> {
        let mut state = self.probe.lock();
        if duty > 0 && state.fail_channel == Some(self.index) {
            return Err(DriverError::DriveFailed);
        }

        state.duties[self.index] = duty;
        state.write_count += 1;
        Ok(())
    }
}

pub struct MockPwmBackend {
    probe: PwmProbe,
}

impl MockPwmBackend {
    pub fn new() -> (Self, PwmProbe) {
        let probe = PwmProbe::default();
        (
            Self {
                probe: probe.clone(),
            },
            probe,
        )
    }
}

impl PwmBackend for MockPwmBackend {
    type Channel = MockPwmChannel;

    fn acquire(&mut self) -> Result<[Self::Channel; 3], DriverError> {
        {
            let mut state = self.probe.lock();
            if state.fail_acquire {
                return Err(DriverError::HardwareUnavailable);
            }
            state.acquire_count += 1;
        }

        Ok([0, 1, 2].map(|index| MockPwmChannel {
            index,
            probe: self.probe.clone(),
        }))
    }

    fn release(&mut self, _channels: [Self::Channel; 3]) {
        self.probe.lock().release_count += 1;
    }
}

// ============================================================================
// RAM NOR-Flash
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RamFlashError {
    NotAligned,
    OutOfBounds,
    Injected,
}

impl NorFlashError for RamFlashError {
    fn kind(&self) -> NorFlashErrorKind {
        match self {
            RamFlashError::NotAligned => NorFlashErrorKind::NotAligned,
            RamFlashError::OutOfBounds => NorFlashErrorKind::OutOfBounds,
            RamFlashError::Injected => NorFlashErrorKind::Other,
        }
    }
}

/// NOR-Flash im Speicher
///
/// Wie echter NOR-Flash kann `write()` nur Bits löschen (1 → 0). Ohne
/// vorheriges `erase()` entsteht also Datenmüll.
pub struct RamFlash {
    bytes: Vec<u8>,
    pub fail_writes: bool,
    pub erase_count: usize,
}

impl RamFlash {
    pub const SECTOR_SIZE: usize = 4096;

    /// Gelöschter Flash mit `sectors` Sektoren
    pub fn new(sectors: usize) -> Self {
        Self {
            bytes: vec![0xFF; sectors * Self::SECTOR_SIZE],
            fail_writes: false,
            erase_count: 0,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Schreibt Rohdaten ohne Alignment-Prüfung (Test-Setup)
    pub fn poke(&mut self, offset: usize, data: &[u8]) {
        self.bytes[offset..offset + data.len()].copy_from_slice(data);
    }

    fn check(&self, offset: u32, len: usize, align: usize) -> Result<usize, RamFlashError> {
        let start = offset as usize;
        if start % align != 0 || len % align != 0 {
            return Err(RamFlashError::NotAligned);
        }
        if start + len > self.bytes.len() {
            return Err(RamFlashError::OutOfBounds);
        }
        Ok(start)
    }
}

impl ErrorType for RamFlash {
    type Error = RamFlashError;
}

impl ReadNorFlash for RamFlash {
    const READ_SIZE: usize = 4;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        let start = self.check(offset, bytes.len(), Self::READ_SIZE)?;
        bytes.copy_from_slice(&self.bytes[start..start + bytes.len()]);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.bytes.len()
    }
}

impl NorFlash for RamFlash {
    const WRITE_SIZE: usize = 4;
    const ERASE_SIZE: usize = Self::SECTOR_SIZE;

    fn erase(&mut self, from: u32, to: u32) -> Result<(), Self::Error> {
        if to < from {
            return Err(RamFlashError::OutOfBounds);
        }
        let start = self.check(from, (to - from) as usize, Self::ERASE_SIZE)?;
        self.bytes[start..to as usize].fill(0xFF);
        self.erase_count += 1;
        Ok(())
    }

    fn write(&mut self, offset: u32, bytes: &[u8]) -> Result<(), Self::Error> {
        if self.fail_writes {
            return Err(RamFlashError::Injected);
        }
        let start = self.check(offset, bytes.len(), Self::WRITE_SIZE)?;
        for (cell, byte) in self.bytes[start..start + bytes.len()].iter_mut().zip(bytes) {
            *cell &= *byte;
        }
        Ok(())
    }
}

// ============================================================================
// Fixture Aufbau
// ============================================================================

/// Controller wie er in der Firmware verdrahtet ist, aber mit Mocks
pub type TestFixture = FixtureController<MockPwmBackend, NorFlashStorage<RamFlash>>;

/// Leerer Flash (erster Start), Duty in Prozent
///
/// Sektor 0 bleibt frei, die Slots A/B liegen in Sektor 1 und 2.
pub fn fixture() -> (TestFixture, PwmProbe) {
    fixture_with_flash(RamFlash::new(3))
}

pub fn fixture_with_flash(flash: RamFlash) -> (TestFixture, PwmProbe) {
    let (backend, probe) = MockPwmBackend::new();
    let storage = NorFlashStorage::new(flash, RamFlash::SECTOR_SIZE as u32).unwrap();
    let controller = FixtureController::new(
        OutputDriver::new(backend, DEFAULT_MAX_DUTY),
        StateStore::new(storage),
    );
    (controller, probe)
}

/// Roher Frame wie ihn NorFlashStorage schreibt (Header + JSON)
pub fn raw_frame(seq: u16, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u16;
    let mut frame = Vec::new();
    frame.extend_from_slice(&0xBEEFu16.to_le_bytes());
    frame.extend_from_slice(&seq.to_le_bytes());
    frame.extend_from_slice(&len.to_le_bytes());
    frame.extend_from_slice(&(!len).to_le_bytes());
    frame.extend_from_slice(payload);
    frame
}

/// Raw-Flash-Inhalt des Slots mit dem aktuellen Datensatz
pub fn record_slot(controller: &mut TestFixture) -> Vec<u8> {
    let storage = controller.store_mut().storage_mut();
    let offset = storage.active_slot().unwrap().expect("no record committed") as usize;
    storage.flash().bytes()[offset..offset + RamFlash::SECTOR_SIZE].to_vec()
}
