// Flash-Speicher für den persistierten Leuchten-Zustand
//
// esp-storage stellt den SPI-Flash als `NorFlash` bereit; Frame-Format und
// A/B-Slots kommen aus fixture-core.

use defmt::{error, info};
use esp_hal::peripherals::FLASH;
use esp_storage::FlashStorage;

use fixture_core::{NorFlashStorage, StoreError};

use crate::config::STATE_FLASH_OFFSET;

/// Record-Speicher der Firmware
pub type StateFlash = NorFlashStorage<FlashStorage<'static>>;

/// Öffnet die beiden Zustands-Sektoren ab `STATE_FLASH_OFFSET`
pub fn state_storage(flash: FLASH<'static>) -> Result<StateFlash, StoreError> {
    match NorFlashStorage::new(FlashStorage::new(flash), STATE_FLASH_OFFSET) {
        Ok(storage) => {
            info!("Flash: State slots at {=u32:#x}", STATE_FLASH_OFFSET);
            Ok(storage)
        }
        Err(e) => {
            error!(
                "Flash: Slots at {=u32:#x} not usable (outside flash or misaligned)",
                STATE_FLASH_OFFSET
            );
            Err(e)
        }
    }
}
