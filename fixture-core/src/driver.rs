//! Output Driver - besitzt die drei PWM-Kanäle
//!
//! Übersetzt eine logische Farbe in Duty-Cycles und verwaltet den
//! Lebenszyklus der Hardware (belegen → ansteuern → freigeben).
//!
//! Es gibt keinen globalen Hardware-Zustand: `acquire()` liefert ein
//! `HardwareChannelSet`, das explizit an `drive()` und `release()`
//! übergeben wird.

use core::sync::atomic::{AtomicU32, Ordering};

use rgb::RGB8;

use crate::error::DriverError;
use crate::logic::duty_levels;
use crate::traits::{PwmBackend, PwmChannel};

/// Auflösung der PWM-Ausgänge: Duty-Cycle in Prozent
pub const DEFAULT_MAX_DUTY: u8 = 100;

/// Lease-Zähler über alle Driver hinweg: ein Set passt nie zu einem fremden Driver
static NEXT_LEASE: AtomicU32 = AtomicU32::new(0);

/// Die drei belegten Kanäle der Leuchte
///
/// Kann nur von `OutputDriver::acquire()` erzeugt werden. Die Lease-Nummer
/// bindet das Set an genau eine Belegung genau eines Drivers.
pub struct HardwareChannelSet<C: PwmChannel> {
    red: C,
    green: C,
    blue: C,
    lease: u32,
}

impl<C: PwmChannel> HardwareChannelSet<C> {
    pub fn lease(&self) -> u32 {
        self.lease
    }

    /// Schreibt Rot, Grün, Blau in dieser Reihenfolge, bricht beim ersten Fehler ab
    fn apply(&mut self, levels: [u8; 3]) -> Result<(), DriverError> {
        self.red.set_duty(levels[0])?;
        self.green.set_duty(levels[1])?;
        self.blue.set_duty(levels[2])?;
        Ok(())
    }

    /// Best-effort: versucht jeden Kanal, auch wenn ein vorheriger fehlschlägt
    fn force(&mut self, levels: [u8; 3]) {
        let _ = self.red.set_duty(levels[0]);
        let _ = self.green.set_duty(levels[1]);
        let _ = self.blue.set_duty(levels[2]);
    }

    fn into_channels(self) -> [C; 3] {
        [self.red, self.green, self.blue]
    }
}

/// Output Driver über einer PWM-Hardware
pub struct OutputDriver<B: PwmBackend> {
    backend: B,
    max_duty: u8,
    active_lease: Option<u32>,
    /// Zuletzt erfolgreich angelegte Duty-Cycles (R, G, B)
    levels: [u8; 3],
}

impl<B: PwmBackend> OutputDriver<B> {
    /// Erstellt einen neuen Driver
    ///
    /// # Parameter
    /// - `backend`: PWM-Hardware (LEDC oder Mock)
    /// - `max_duty`: Duty-Cycle für Farbwert 255 (z.B. `DEFAULT_MAX_DUTY`)
    pub fn new(backend: B, max_duty: u8) -> Self {
        Self {
            backend,
            max_duty,
            active_lease: None,
            levels: [0; 3],
        }
    }

    pub fn max_duty(&self) -> u8 {
        self.max_duty
    }

    pub fn is_acquired(&self) -> bool {
        self.active_lease.is_some()
    }

    /// Aktuelle Duty-Cycles (R, G, B); alle 0 wenn nicht belegt
    pub fn levels(&self) -> [u8; 3] {
        self.levels
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Belegt die drei Kanäle und startet sie mit Duty-Cycle 0
    ///
    /// # Fehlerbehandlung
    /// - `AlreadyAcquired` wenn bereits ein Set aktiv ist
    /// - `HardwareUnavailable` wenn die Kanäle nicht konfiguriert werden können
    pub fn acquire(&mut self) -> Result<HardwareChannelSet<B::Channel>, DriverError> {
        if self.active_lease.is_some() {
            return Err(DriverError::AlreadyAcquired);
        }

        let [red, green, blue] = self.backend.acquire()?;
        let lease = NEXT_LEASE.fetch_add(1, Ordering::Relaxed);
        let mut channels = HardwareChannelSet {
            red,
            green,
            blue,
            lease,
        };

        if channels.apply([0; 3]).is_err() {
            self.backend.release(channels.into_channels());
            return Err(DriverError::HardwareUnavailable);
        }

        self.active_lease = Some(lease);
        self.levels = [0; 3];
        Ok(channels)
    }

    /// Steuert die Kanäle auf `color`
    ///
    /// Duty-Cycle pro Kanal: `value * max_duty / 255`, abgeschnitten.
    /// Die Kanäle werden nacheinander (R, G, B) geschrieben. Schlägt ein Kanal
    /// fehl, werden die vorherigen Werte wieder angelegt: der Aufrufer sieht
    /// entweder die alte oder die neue Farbe, nie eine Mischung.
    ///
    /// # Fehlerbehandlung
    /// - `NotAcquired` wenn `channels` nicht zur aktiven Belegung gehört
    /// - `DriveFailed` wenn die Hardware einen Kanal nicht setzen konnte
    pub fn drive(
        &mut self,
        channels: &mut HardwareChannelSet<B::Channel>,
        color: RGB8,
    ) -> Result<(), DriverError> {
        if self.active_lease != Some(channels.lease) {
            return Err(DriverError::NotAcquired);
        }

        let target = duty_levels(color, self.max_duty);
        if let Err(error) = channels.apply(target) {
            channels.force(self.levels);
            return Err(error);
        }

        self.levels = target;
        Ok(())
    }

    /// Setzt alle Kanäle auf 0 und gibt die Hardware frei
    ///
    /// Funktioniert auch nach einem teilweise fehlgeschlagenen `drive()`.
    /// Ein Set, das nicht zur aktiven Belegung gehört, wird ignoriert.
    pub fn release(&mut self, mut channels: HardwareChannelSet<B::Channel>) {
        if self.active_lease != Some(channels.lease) {
            return;
        }

        channels.force([0; 3]);
        self.active_lease = None;
        self.levels = [0; 3];
        self.backend.release(channels.into_channels());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    // Kanäle schreiben in einen gemeinsamen Slot-Array, damit der Test die
    // Hardware-Werte nach dem Verschieben der Kanäle noch sieht.
    struct SlotChannel<'a> {
        slot: &'a Cell<u8>,
        fail: &'a Cell<bool>,
    }

    impl PwmChannel for SlotChannel<'_> {
        fn set_duty(&mut self, duty: u8) -> Result<(), DriverError> {
            if self.fail.get() {
                return Err(DriverError::DriveFailed);
            }
            self.slot.set(duty);
            Ok(())
        }
    }

    struct SlotBackend<'a> {
        slots: &'a [Cell<u8>; 3],
        fail_green: &'a Cell<bool>,
        never: &'a Cell<bool>,
        released: usize,
    }

    impl<'a> PwmBackend for SlotBackend<'a> {
        type Channel = SlotChannel<'a>;

        fn acquire(&mut self) -> Result<[Self::Channel; 3], DriverError> {
            let slots: &'a [Cell<u8>; 3] = self.slots;
            Ok([
                SlotChannel {
                    slot: &slots[0],
                    fail: self.never,
                },
                SlotChannel {
                    slot: &slots[1],
                    fail: self.fail_green,
                },
                SlotChannel {
                    slot: &slots[2],
                    fail: self.never,
                },
            ])
        }

        fn release(&mut self, _channels: [Self::Channel; 3]) {
            self.released += 1;
        }
    }

    fn slot_backend<'a>(
        slots: &'a [Cell<u8>; 3],
        fail_green: &'a Cell<bool>,
        never: &'a Cell<bool>,
    ) -> SlotBackend<'a> {
        SlotBackend {
            slots,
            fail_green,
            never,
            released: 0,
        }
    }

    fn slot_values(slots: &[Cell<u8>; 3]) -> [u8; 3] {
        [slots[0].get(), slots[1].get(), slots[2].get()]
    }

    #[test]
    fn test_acquire_drive_release() {
        let slots = [Cell::new(7), Cell::new(7), Cell::new(7)];
        let fail_green = Cell::new(false);
        let never = Cell::new(false);
        let backend = SlotBackend {
            slots: &slots,
            fail_green: &fail_green,
            never: &never,
            released: 0,
        };
        let mut driver = OutputDriver::new(backend, DEFAULT_MAX_DUTY);

        let mut channels = driver.acquire().unwrap();
        assert_eq!(slot_values(&slots), [0, 0, 0]);

        driver.drive(&mut channels, RGB8 { r: 255, g: 0, b: 128 }).unwrap();
        assert_eq!(slot_values(&slots), [100, 0, 50]);
        assert_eq!(driver.levels(), [100, 0, 50]);

        driver.release(channels);
        assert_eq!(slot_values(&slots), [0, 0, 0]);
        assert!(!driver.is_acquired());
        assert_eq!(driver.backend().released, 1);
    }

    #[test]
    fn test_acquire_twice_is_error() {
        let slots = [Cell::new(0), Cell::new(0), Cell::new(0)];
        let fail_green = Cell::new(false);
        let never = Cell::new(false);
        let backend = SlotBackend {
            slots: &slots,
            fail_green: &fail_green,
            never: &never,
            released: 0,
        };
        let mut driver = OutputDriver::new(backend, DEFAULT_MAX_DUTY);

        let channels = driver.acquire().unwrap();
        assert!(matches!(driver.acquire(), Err(DriverError::AlreadyAcquired)));

        driver.release(channels);
        assert!(driver.acquire().is_ok());
    }

    #[test]
    fn test_failed_drive_restores_previous_levels() {
        let slots = [Cell::new(0), Cell::new(0), Cell::new(0)];
        let fail_green = Cell::new(false);
        let never = Cell::new(false);
        let backend = SlotBackend {
            slots: &slots,
            fail_green: &fail_green,
            never: &never,
            released: 0,
        };
        let mut driver = OutputDriver::new(backend, DEFAULT_MAX_DUTY);
        let mut channels = driver.acquire().unwrap();
        driver.drive(&mut channels, RGB8 { r: 51, g: 51, b: 51 }).unwrap();

        fail_green.set(true);
        let result = driver.drive(&mut channels, RGB8 { r: 255, g: 255, b: 255 });
        assert_eq!(result, Err(DriverError::DriveFailed));
        // Rot wurde kurz auf 100 gesetzt und wieder zurückgenommen
        assert_eq!(slot_values(&slots), [20, 20, 20]);
        assert_eq!(driver.levels(), [20, 20, 20]);

        // Freigeben nach teilweisem Fehler setzt alle erreichbaren Kanäle auf 0
        driver.release(channels);
        assert_eq!(slots[0].get(), 0);
        assert_eq!(slots[2].get(), 0);
        assert!(!driver.is_acquired());
    }

    #[test]
    fn test_foreign_channel_set_is_rejected() {
        let fail_green = Cell::new(false);
        let never = Cell::new(false);
        let slots_a = [Cell::new(0), Cell::new(0), Cell::new(0)];
        let slots_b = [Cell::new(0), Cell::new(0), Cell::new(0)];
        let mut driver_a =
            OutputDriver::new(slot_backend(&slots_a, &fail_green, &never), DEFAULT_MAX_DUTY);
        let mut driver_b =
            OutputDriver::new(slot_backend(&slots_b, &fail_green, &never), DEFAULT_MAX_DUTY);

        let mut channels_a = driver_a.acquire().unwrap();
        let channels_b = driver_b.acquire().unwrap();
        assert_ne!(channels_a.lease(), channels_b.lease());

        // Set von Driver A an Driver B: keine Hardware wird angefasst
        let result = driver_b.drive(&mut channels_a, RGB8 { r: 255, g: 255, b: 255 });
        assert_eq!(result, Err(DriverError::NotAcquired));
        assert_eq!(slot_values(&slots_a), [0, 0, 0]);
        assert_eq!(driver_b.levels(), [0, 0, 0]);

        // Fremdes Set wird beim Freigeben ignoriert
        driver_b.release(channels_a);
        assert!(driver_b.is_acquired());
        assert_eq!(driver_b.backend().released, 0);

        driver_b.release(channels_b);
        assert!(!driver_b.is_acquired());
        // Driver A hält seine Belegung weiter
        assert!(driver_a.is_acquired());
    }
}
