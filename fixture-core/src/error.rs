//! Fehler-Typen der Leuchten-Steuerung
//!
//! Jede Schicht hat ihren eigenen Fehler-Typ. `FixtureError` ist der Typ,
//! den Aufrufer (HTTP-Schicht) sehen; die Schicht-Fehler werden via `From`
//! eingepackt, damit `?` überall funktioniert.

use core::fmt;

/// Fehler des Output Drivers (PWM-Hardware)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriverError {
    /// Kanäle konnten nicht als Ausgänge konfiguriert werden
    HardwareUnavailable,
    /// `acquire()` obwohl die Kanäle bereits belegt sind
    AlreadyAcquired,
    /// Kanal-Set gehört nicht zur aktiven Belegung
    NotAcquired,
    /// Schreiben eines Duty-Cycles ist fehlgeschlagen
    DriveFailed,
}

/// Fehler des persistenten Speichers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StoreError {
    /// Noch kein Datensatz vorhanden (erster Start)
    NotFound,
    /// Datensatz vorhanden, aber nicht lesbar
    Corrupt,
    /// Lesen oder Schreiben des Speichermediums ist fehlgeschlagen
    IoFailure,
}

/// Fehler-Typ für alle Operationen des Fixture Controllers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FixtureError {
    /// Mindestens ein Kanal liegt außerhalb von [0, 255]
    InvalidColor,
    /// Operation braucht eingeschaltete Hardware
    NotPoweredOn,
    /// `power_on()` im Zustand `On`
    AlreadyOn,
    Driver(DriverError),
    Store(StoreError),
}

impl FixtureError {
    /// Stabiler Bezeichner für JSON-Antworten
    pub fn kind(self) -> &'static str {
        match self {
            FixtureError::InvalidColor => "invalid_color",
            FixtureError::NotPoweredOn => "not_powered_on",
            FixtureError::AlreadyOn => "already_on",
            FixtureError::Driver(DriverError::HardwareUnavailable) => "hardware_unavailable",
            FixtureError::Driver(DriverError::AlreadyAcquired) => "already_acquired",
            FixtureError::Driver(DriverError::NotAcquired) => "not_acquired",
            FixtureError::Driver(DriverError::DriveFailed) => "drive_failed",
            FixtureError::Store(StoreError::NotFound) => "not_found",
            FixtureError::Store(StoreError::Corrupt) => "corrupt",
            FixtureError::Store(StoreError::IoFailure) => "io_failure",
        }
    }

    /// Client-Fehler: der Aufrufer hat etwas Ungültiges verlangt
    pub fn is_client_error(self) -> bool {
        matches!(
            self,
            FixtureError::InvalidColor | FixtureError::NotPoweredOn | FixtureError::AlreadyOn
        )
    }

    /// HTTP Status-Code für die Control Surface
    pub fn status_code(self) -> u16 {
        match self {
            FixtureError::InvalidColor => 400,
            FixtureError::NotPoweredOn | FixtureError::AlreadyOn => 409,
            FixtureError::Driver(DriverError::HardwareUnavailable | DriverError::DriveFailed) => {
                503
            }
            FixtureError::Driver(_) | FixtureError::Store(_) => 500,
        }
    }
}

impl From<DriverError> for FixtureError {
    fn from(error: DriverError) -> Self {
        FixtureError::Driver(error)
    }
}

impl From<StoreError> for FixtureError {
    fn from(error: StoreError) -> Self {
        FixtureError::Store(error)
    }
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriverError::HardwareUnavailable => write!(f, "PWM hardware unavailable"),
            DriverError::AlreadyAcquired => write!(f, "PWM channels already acquired"),
            DriverError::NotAcquired => write!(f, "PWM channels not acquired"),
            DriverError::DriveFailed => write!(f, "failed to drive PWM channel"),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound => write!(f, "no persisted fixture state"),
            StoreError::Corrupt => write!(f, "persisted fixture state is corrupt"),
            StoreError::IoFailure => write!(f, "storage I/O failure"),
        }
    }
}

impl fmt::Display for FixtureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixtureError::InvalidColor => write!(f, "color channel outside 0..=255"),
            FixtureError::NotPoweredOn => write!(f, "fixture is not powered on"),
            FixtureError::AlreadyOn => write!(f, "fixture is already powered on"),
            FixtureError::Driver(error) => write!(f, "driver error: {}", error),
            FixtureError::Store(error) => write!(f, "store error: {}", error),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DriverError {}

#[cfg(feature = "std")]
impl std::error::Error for StoreError {}

#[cfg(feature = "std")]
impl std::error::Error for FixtureError {}
