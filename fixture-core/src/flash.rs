//! NOR-Flash Backend für den Persisted State Store
//!
//! Zwei aufeinanderfolgende Erase-Sektoren bilden die Slots A und B. Jeder
//! Slot hält höchstens einen Frame:
//!
//! ```text
//! | magic u16 LE (0xBEEF) | seq u16 LE | len u16 LE | !len u16 LE | JSON (len Bytes) | 0xFF Padding |
//! ```
//!
//! Ein Schreibvorgang löscht den *inaktiven* Slot, schreibt Länge und JSON
//! und erst zum Schluss das Commit-Wort (Magic + Sequenznummer). Ein
//! abgebrochener Schreibvorgang hinterlässt also nie einen gültigen Frame,
//! und der bisherige Datensatz im anderen Slot bleibt lesbar. Beim Lesen
//! gewinnt der gültige Frame mit der neueren Sequenznummer.

use embedded_storage::nor_flash::NorFlash;

use crate::error::StoreError;
use crate::record::RECORD_CAPACITY;
use crate::traits::RecordStorage;

const MAGIC_HEADER: u16 = 0xBEEF;
/// Magic + Sequenznummer, wird als letztes geschrieben
const COMMIT_SIZE: usize = 4;
const HEADER_SIZE: usize = COMMIT_SIZE + 4;
const SLOT_COUNT: u32 = 2;

/// Größe eines Frames (Header + Payload), Vielfaches von 4
pub const FRAME_SIZE: usize = HEADER_SIZE + RECORD_CAPACITY;

/// Inhalt eines Slots laut Header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// Nie committet (gelöscht oder abgebrochener Schreibvorgang)
    Empty,
    Valid { seq: u16, len: usize },
    /// Commit-Wort oder Länge passen nicht zusammen
    Invalid,
}

impl Slot {
    fn parse(header: &[u8]) -> Self {
        if header[..COMMIT_SIZE].iter().all(|&byte| byte == 0xFF) {
            return Slot::Empty;
        }

        let word = |at: usize| u16::from_le_bytes([header[at], header[at + 1]]);
        let len = word(4);
        if word(0) != MAGIC_HEADER || word(6) != !len || usize::from(len) > RECORD_CAPACITY {
            return Slot::Invalid;
        }

        Slot::Valid {
            seq: word(2),
            len: usize::from(len),
        }
    }
}

/// `a` ist neuer als `b` (Sequenznummern laufen über)
fn is_newer(a: u16, b: u16) -> bool {
    (a.wrapping_sub(b) as i16) > 0
}

/// Index, Sequenznummer und Länge des neuesten gültigen Slots
fn newest(slots: [Slot; 2]) -> Option<(u32, u16, usize)> {
    match slots {
        [Slot::Valid { seq: a, len: a_len }, Slot::Valid { seq: b, len: b_len }] => {
            if is_newer(b, a) {
                Some((1, b, b_len))
            } else {
                Some((0, a, a_len))
            }
        }
        [Slot::Valid { seq, len }, _] => Some((0, seq, len)),
        [_, Slot::Valid { seq, len }] => Some((1, seq, len)),
        _ => None,
    }
}

/// Datensatz in zwei Sektoren eines `NorFlash` (A/B)
pub struct NorFlashStorage<F: NorFlash> {
    flash: F,
    offset: u32,
}

impl<F: NorFlash> NorFlashStorage<F> {
    /// Erstellt ein Backend für die beiden Sektoren ab `offset`
    ///
    /// # Fehlerbehandlung
    /// `StoreError::IoFailure` wenn `offset` nicht auf einen Sektor zeigt,
    /// die zwei Sektoren nicht in den Flash passen oder die Frame-Größe nicht
    /// zur Lese-/Schreib-Granularität des Flash passt.
    pub fn new(flash: F, offset: u32) -> Result<Self, StoreError> {
        let start = offset as usize;
        let aligned = start % F::ERASE_SIZE == 0
            && HEADER_SIZE % F::READ_SIZE == 0
            && FRAME_SIZE % F::READ_SIZE == 0
            && COMMIT_SIZE % F::WRITE_SIZE == 0
            && FRAME_SIZE % F::WRITE_SIZE == 0
            && FRAME_SIZE <= F::ERASE_SIZE;
        let end = start + SLOT_COUNT as usize * F::ERASE_SIZE;
        if !aligned || end > flash.capacity() {
            return Err(StoreError::IoFailure);
        }

        Ok(Self { flash, offset })
    }

    pub fn flash(&self) -> &F {
        &self.flash
    }

    pub fn flash_mut(&mut self) -> &mut F {
        &mut self.flash
    }

    pub fn into_inner(self) -> F {
        self.flash
    }

    /// Flash-Offset des Slots mit dem aktuellen Datensatz (`None` wenn
    /// noch nie ein Frame committet wurde)
    pub fn active_slot(&mut self) -> Result<Option<u32>, StoreError> {
        let slots = self.scan()?;
        Ok(newest(slots).map(|(index, _, _)| self.slot_offset(index)))
    }

    fn slot_offset(&self, index: u32) -> u32 {
        self.offset + index * F::ERASE_SIZE as u32
    }

    fn read_header(&mut self, index: u32) -> Result<Slot, StoreError> {
        let mut header = [0u8; HEADER_SIZE];
        self.flash
            .read(self.slot_offset(index), &mut header)
            .map_err(|_| StoreError::IoFailure)?;
        Ok(Slot::parse(&header))
    }

    fn scan(&mut self) -> Result<[Slot; 2], StoreError> {
        Ok([self.read_header(0)?, self.read_header(1)?])
    }
}

impl<F: NorFlash> RecordStorage for NorFlashStorage<F> {
    fn read_record(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, StoreError> {
        let slots = self.scan()?;
        let Some((index, _, len)) = newest(slots) else {
            // Kaputte Header ohne gültige Alternative sind kein leerer Flash
            if slots.contains(&Slot::Invalid) {
                return Err(StoreError::Corrupt);
            }
            return Ok(None);
        };

        if len > buffer.len() {
            return Err(StoreError::Corrupt);
        }

        let mut frame = [0u8; FRAME_SIZE];
        self.flash
            .read(self.slot_offset(index), &mut frame)
            .map_err(|_| StoreError::IoFailure)?;
        buffer[..len].copy_from_slice(&frame[HEADER_SIZE..HEADER_SIZE + len]);
        Ok(Some(len))
    }

    fn write_record(&mut self, record: &[u8]) -> Result<(), StoreError> {
        if record.len() > RECORD_CAPACITY {
            return Err(StoreError::IoFailure);
        }

        let (target, seq) = match newest(self.scan()?) {
            Some((active, seq, _)) => (1 - active, seq.wrapping_add(1)),
            None => (0, 0),
        };

        let len = record.len() as u16;
        let mut frame = [0xFFu8; FRAME_SIZE];
        frame[0..2].copy_from_slice(&MAGIC_HEADER.to_le_bytes());
        frame[2..4].copy_from_slice(&seq.to_le_bytes());
        frame[4..6].copy_from_slice(&len.to_le_bytes());
        frame[6..8].copy_from_slice(&(!len).to_le_bytes());
        frame[HEADER_SIZE..HEADER_SIZE + record.len()].copy_from_slice(record);

        let start = self.slot_offset(target);
        self.flash
            .erase(start, start + F::ERASE_SIZE as u32)
            .map_err(|_| StoreError::IoFailure)?;
        self.flash
            .write(start + COMMIT_SIZE as u32, &frame[COMMIT_SIZE..])
            .map_err(|_| StoreError::IoFailure)?;
        self.flash
            .write(start, &frame[..COMMIT_SIZE])
            .map_err(|_| StoreError::IoFailure)
    }
}
