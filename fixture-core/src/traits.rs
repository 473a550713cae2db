//! Hardware Abstraction Traits
//!
//! Diese Traits definieren Schnittstellen für Hardware-Zugriff
//! ohne konkrete Implementierung.

use crate::error::{DriverError, StoreError};

/// Ein einzelner PWM-Ausgang (ein Farbkanal)
pub trait PwmChannel {
    /// Setzt den Duty-Cycle des Kanals
    ///
    /// `duty` liegt im Bereich `0..=max_duty` des Output Drivers.
    ///
    /// # Fehlerbehandlung
    /// Gibt `DriverError::DriveFailed` zurück wenn Hardware-Zugriff fehlschlägt
    fn set_duty(&mut self, duty: u8) -> Result<(), DriverError>;
}

/// Trait für die PWM-Hardware der Leuchte
///
/// Liefert beim Belegen genau drei Kanäle in der Reihenfolge Rot, Grün, Blau
/// und nimmt sie beim Freigeben wieder zurück.
///
/// # Implementierungen
/// - **Production:** LedcBackend (ESP32 LEDC Peripheral)
/// - **Testing:** MockPwmBackend (in-memory Mock)
pub trait PwmBackend {
    type Channel: PwmChannel;

    /// Konfiguriert die drei Kanäle als Ausgänge
    ///
    /// # Fehlerbehandlung
    /// Gibt `DriverError::HardwareUnavailable` zurück wenn die Kanäle nicht
    /// konfiguriert werden können
    fn acquire(&mut self) -> Result<[Self::Channel; 3], DriverError>;

    /// Gibt die Kanäle zurück an die Hardware
    fn release(&mut self, channels: [Self::Channel; 3]);
}

/// Byte-Speicher für genau einen Datensatz
///
/// # Implementierungen
/// - **Production:** NorFlashStorage (zwei Flash-Sektoren, A/B)
/// - **Host:** FileStorage (JSON-Datei, Feature `std`)
/// - **Testing:** RAM-Flash in fixture-tests
pub trait RecordStorage {
    /// Liest den gespeicherten Datensatz nach `buffer`
    ///
    /// Gibt `Ok(None)` zurück wenn noch nichts gespeichert wurde, sonst die
    /// Länge des Datensatzes.
    fn read_record(&mut self, buffer: &mut [u8]) -> Result<Option<usize>, StoreError>;

    /// Ersetzt den gespeicherten Datensatz vollständig durch `record`
    ///
    /// Nach erfolgreichem Schreiben darf kein Byte eines älteren, längeren
    /// Datensatzes mehr lesbar sein.
    fn write_record(&mut self, record: &[u8]) -> Result<(), StoreError>;
}
