// Library-Root: Wiederverwendbare Logik und Module
// Keine Standard-Bibliothek (Embedded System)
#![no_std]

// Module
pub mod config;
pub mod hal;
pub mod tasks;
pub mod web;

// Re-exports von fixture-core
pub use fixture_core::{
    ColorRequest, FixtureController, FixtureError, FixtureState, FixtureStatus, OutputDriver,
    Preset, SharedFixture, SnapshotRequest, StateStore,
};

use embassy_sync::blocking_mutex::raw::NoopRawMutex;

use crate::hal::{LedcBackend, StateFlash};

// ============================================================================
// Type-Aliase
// ============================================================================

/// Die Leuchte, wie sie von allen HTTP-Tasks geteilt wird
///
/// `NoopRawMutex` reicht: alle Tasks laufen auf demselben Executor, und
/// jede Operation läuft ohne `.await` komplett im Lock.
pub type Fixture = SharedFixture<NoopRawMutex, LedcBackend, StateFlash>;

/// Controller ohne Mutex (Aufbau in main)
pub type Controller = FixtureController<LedcBackend, StateFlash>;
