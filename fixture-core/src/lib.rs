//! Fixture Core - Platform-agnostic Logic and Traits
//!
//! Diese Crate enthält KEINE Hardware-Dependencies.
//! Sie definiert die Hardware-Traits, die Zustandsmaschine der Leuchte
//! und das persistente Speicherformat (`{"isOn":..,"currColor":[..]}`).

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod controller;
pub mod driver;
pub mod error;
#[cfg(feature = "std")]
pub mod file;
pub mod flash;
pub mod logic;
pub mod record;
pub mod shared;
pub mod store;
pub mod traits;
pub mod types;

// Re-exports für einfachen Zugriff
pub use controller::{FixtureController, Power};
pub use driver::{DEFAULT_MAX_DUTY, HardwareChannelSet, OutputDriver};
pub use error::{DriverError, FixtureError, StoreError};
#[cfg(feature = "std")]
pub use file::FileStorage;
pub use flash::NorFlashStorage;
pub use logic::{duty_for, duty_levels};
pub use record::RECORD_CAPACITY;
pub use shared::SharedFixture;
pub use store::StateStore;
pub use traits::{PwmBackend, PwmChannel, RecordStorage};
pub use types::{ColorRequest, FixtureState, FixtureStatus, Preset, SnapshotRequest};

/// Farb-Typ der Leuchte: drei 8-Bit Kanäle (Rot, Grün, Blau)
pub use rgb::RGB8;
