// LEDC PWM Backend für den Output Driver
//
// Drei Low-Speed Kanäle an einem gemeinsamen Timer. Die Kanäle existieren
// die ganze Laufzeit; `acquire()` konfiguriert sie neu und übergibt sie dem
// Output Driver, `release()` nimmt sie zurück.

use defmt::{Debug2Format, info, warn};
use esp_hal::gpio::DriveMode;
use esp_hal::gpio::interconnect::PeripheralOutput;
use esp_hal::ledc::channel::{self, Channel, ChannelIFace};
use esp_hal::ledc::timer::{self, Timer, TimerIFace};
use esp_hal::ledc::{LSGlobalClkSource, Ledc, LowSpeed};
use esp_hal::peripherals::LEDC;
use esp_hal::time::Rate;
use static_cell::StaticCell;

use fixture_core::{DriverError, PwmBackend, PwmChannel};

use crate::config::PWM_FREQUENCY_KHZ;

type LowSpeedChannel = Channel<'static, LowSpeed>;

// Die Kanäle referenzieren den Timer, beide müssen also 'static sein
static LEDC_DRIVER: StaticCell<Ledc<'static>> = StaticCell::new();
static PWM_TIMER: StaticCell<Timer<'static, LowSpeed>> = StaticCell::new();

/// Ein LEDC-Kanal im Besitz des Output Drivers
pub struct LedcChannel {
    channel: LowSpeedChannel,
}

impl PwmChannel for LedcChannel {
    fn set_duty(&mut self, duty: u8) -> Result<(), DriverError> {
        // LEDC erwartet den Duty-Cycle in Prozent (0..=100)
        self.channel.set_duty(duty).map_err(|e| {
            warn!("LEDC: set_duty({}) failed: {}", duty, Debug2Format(&e));
            DriverError::DriveFailed
        })
    }
}

/// PWM-Hardware der Leuchte (Rot, Grün, Blau)
pub struct LedcBackend {
    timer: &'static Timer<'static, LowSpeed>,
    /// Kanäle, solange der Output Driver sie nicht belegt hat
    parked: Option<[LowSpeedChannel; 3]>,
}

impl LedcBackend {
    /// Richtet Timer und Kanäle ein (Duty-Cycle 0 bis zum ersten `acquire()`)
    ///
    /// # Parameter
    /// - `ledc`: LEDC Peripheral
    /// - `red`, `green`, `blue`: GPIO-Pins der drei Kanäle
    ///
    /// # Fehlerbehandlung
    /// `DriverError::HardwareUnavailable` wenn der Timer nicht konfiguriert
    /// werden kann oder `new()` ein zweites Mal aufgerufen wird
    pub fn new(
        ledc: LEDC<'static>,
        red: impl PeripheralOutput<'static>,
        green: impl PeripheralOutput<'static>,
        blue: impl PeripheralOutput<'static>,
    ) -> Result<Self, DriverError> {
        let ledc = LEDC_DRIVER
            .try_init(Ledc::new(ledc))
            .ok_or(DriverError::HardwareUnavailable)?;
        ledc.set_global_slow_clock(LSGlobalClkSource::APBClk);

        let mut pwm_timer = ledc.timer::<LowSpeed>(timer::Number::Timer0);
        pwm_timer
            .configure(timer::config::Config {
                duty: timer::config::Duty::Duty10Bit,
                clock_source: timer::LSClockSource::APBClk,
                frequency: Rate::from_khz(PWM_FREQUENCY_KHZ),
            })
            .map_err(|e| {
                warn!("LEDC: Timer configuration failed: {}", Debug2Format(&e));
                DriverError::HardwareUnavailable
            })?;

        let pwm_timer: &'static Timer<'static, LowSpeed> = PWM_TIMER
            .try_init(pwm_timer)
            .ok_or(DriverError::HardwareUnavailable)?;

        let channels = [
            ledc.channel::<LowSpeed>(channel::Number::Channel0, red),
            ledc.channel::<LowSpeed>(channel::Number::Channel1, green),
            ledc.channel::<LowSpeed>(channel::Number::Channel2, blue),
        ];

        info!("LEDC: Timer ready ({} kHz, 10 bit)", PWM_FREQUENCY_KHZ);

        Ok(Self {
            timer: pwm_timer,
            parked: Some(channels),
        })
    }
}

impl PwmBackend for LedcBackend {
    type Channel = LedcChannel;

    fn acquire(&mut self) -> Result<[Self::Channel; 3], DriverError> {
        let Some(mut channels) = self.parked.take() else {
            return Err(DriverError::HardwareUnavailable);
        };

        let pwm_timer = self.timer;
        let configured = channels.iter_mut().try_for_each(|output| {
            output.configure(channel::config::Config {
                timer: pwm_timer,
                duty_pct: 0,
                drive_mode: DriveMode::PushPull,
            })
        });

        if let Err(e) = configured {
            warn!("LEDC: Channel configuration failed: {}", Debug2Format(&e));
            self.parked = Some(channels);
            return Err(DriverError::HardwareUnavailable);
        }

        Ok(channels.map(|output| LedcChannel { channel: output }))
    }

    fn release(&mut self, channels: [Self::Channel; 3]) {
        // Duty-Cycle ist bereits 0 (Output Driver), Kanäle bleiben konfiguriert
        self.parked = Some(channels.map(|output| output.channel));
    }
}
