// Keine Standard-Bibliothek verwenden (Embedded System)
#![no_std]
// Kein normaler main() Einstiegspunkt (wird von esp_rtos bereitgestellt)
#![no_main]
// Verbiete mem::forget - gefährlich bei ESP HAL Types mit DMA-Buffern
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]
// Verbiete große Stack-Frames (Stack ist auf Embedded Systemen begrenzt)
#![deny(clippy::large_stack_frames)]

// Heap Allocator (WiFi benötigt dynamischen Speicher)
extern crate alloc;

// Embassy Async Runtime
use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_net::{Config as NetConfig, Stack, StackResources};
use embassy_time::{Duration, Timer};

// ESP32-C6 HAL
use esp_hal::clock::CpuClock;
use esp_hal::rng::Rng;
use esp_hal::timer::timg::TimerGroup;

// Backtrace bei Panic und println!() Support
use {esp_backtrace as _, esp_println as _};

// Projekt-Module und Konfiguration
use fixture_core::DEFAULT_MAX_DUTY;
use fixture_firmware::config::{
    BLUE_GPIO_PIN, EXTRA_HEAP_SIZE, GREEN_GPIO_PIN, HTTP_TASK_COUNT, RED_GPIO_PIN, WIFI_HEAP_SIZE,
};
use fixture_firmware::hal::{LedcBackend, state_storage};
use fixture_firmware::tasks::{connection_task, dhcp_task, http_server_task, net_task};
use fixture_firmware::{Controller, Fixture, OutputDriver, StateStore};

// ESP-IDF App Descriptor - erforderlich für den Bootloader!
// Ohne diesen schlägt das Flashen mit "ESP-IDF App Descriptor missing" fehl
esp_bootloader_esp_idf::esp_app_desc!();

/// Main Entry Point
///
/// Initialisiert PWM, Flash und WiFi, baut die Leuchte auf und spawnt die
/// Tasks. Die Leuchte startet ausgeschaltet; erst `GET /startup` belegt
/// die Hardware und stellt die gespeicherte Farbe her.
#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    // ESP32-C6 Konfiguration: CPU auf maximale Taktfrequenz (160 MHz)
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);

    // Heap Allocator initialisieren (WiFi braucht dynamischen Speicher!)
    esp_alloc::heap_allocator!(
        #[esp_hal::ram(reclaimed)]
        size: WIFI_HEAP_SIZE
    );
    esp_alloc::heap_allocator!(size: EXTRA_HEAP_SIZE);

    // Embassy Runtime initialisieren (Timer + Software Interrupt)
    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_interrupt =
        esp_hal::interrupt::software::SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_interrupt.software_interrupt0);

    // Leuchte aufbauen: LEDC-Kanäle (R, G, B) + Zustands-Slots im Flash
    info!(
        "Fixture: PWM on GPIO{} (R), GPIO{} (G), GPIO{} (B)",
        RED_GPIO_PIN, GREEN_GPIO_PIN, BLUE_GPIO_PIN
    );
    let backend = LedcBackend::new(
        peripherals.LEDC,
        peripherals.GPIO19,
        peripherals.GPIO18,
        peripherals.GPIO5,
    )
    .expect("Failed to initialize LEDC PWM");
    let storage = state_storage(peripherals.FLASH).expect("Failed to open state flash slots");

    let controller = Controller::new(
        OutputDriver::new(backend, DEFAULT_MAX_DUTY),
        StateStore::new(storage),
    );

    static FIXTURE: static_cell::StaticCell<Fixture> = static_cell::StaticCell::new();
    let fixture = &*FIXTURE.init(Fixture::new(controller));

    match fixture.status() {
        Ok(status) => info!("Fixture: Ready (off), persisted {}", status.state),
        // Corrupt wird nicht still ersetzt, POST /reset setzt zurück
        Err(e) => warn!("Fixture: Persisted state unusable: {}", e),
    }

    // WiFi Hardware initialisieren
    static RADIO_INIT: static_cell::StaticCell<esp_radio::Controller> =
        static_cell::StaticCell::new();
    let radio_init =
        RADIO_INIT.init(esp_radio::init().expect("Failed to initialize Wi-Fi/BLE controller"));

    let (wifi_controller, wifi_interface) =
        esp_radio::wifi::new(radio_init, peripherals.WIFI, Default::default())
            .expect("Failed to initialize Wi-Fi");

    // Random seed für TCP/IP Stack (von Hardware RNG)
    let rng = Rng::new();
    let seed = (rng.random() as u64) << 32 | rng.random() as u64;

    // Static resources für embassy-net: ein Socket pro HTTP-Task + DHCP/DNS
    static RESOURCES: static_cell::StaticCell<StackResources<6>> = static_cell::StaticCell::new();
    let resources = RESOURCES.init(StackResources::new());

    let (stack, runner) = embassy_net::new(
        wifi_interface.sta,
        NetConfig::dhcpv4(Default::default()),
        resources,
        seed,
    );

    // Stack muss 'static sein für Tasks
    static STACK: static_cell::StaticCell<Stack<'static>> = static_cell::StaticCell::new();
    let stack = &*STACK.init(stack);

    // Spawn WiFi Tasks
    spawner.spawn(connection_task(wifi_controller)).unwrap();
    spawner.spawn(net_task(runner)).unwrap();
    spawner.spawn(dhcp_task(stack)).unwrap();

    // Spawn HTTP Server Tasks (eine Connection pro Task)
    for task_id in 0..HTTP_TASK_COUNT {
        spawner
            .spawn(http_server_task(task_id, stack, fixture))
            .unwrap();
    }

    // Main-Loop: schläft (alle Arbeit läuft in Tasks)
    loop {
        Timer::after(Duration::from_secs(3600)).await;
    }
}
