// Hardware Abstraction Layer (HAL) Module
//
// Implementiert die Hardware-Traits aus fixture-core für den ESP32-C6.
// Die Logik darüber (Output Driver, State Store) ist mit Mocks getestet.

pub mod flash_storage;
pub mod ledc_backend;

pub use flash_storage::{StateFlash, state_storage};
pub use ledc_backend::{LedcBackend, LedcChannel};
