//! Integration Tests für den Fixture Controller
//!
//! Diese Tests laufen auf dem Host (x86_64) und nutzen MockPwmBackend + RamFlash

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, NoopRawMutex};
use fixture_core::{
    ColorRequest, DriverError, FixtureError, FixtureState, FixtureStatus, Preset, SharedFixture,
    SnapshotRequest, StoreError,
};
use fixture_tests::{RamFlash, fixture, fixture_with_flash, raw_frame, record_slot};
use rgb::RGB8;

const RED: RGB8 = RGB8 { r: 255, g: 0, b: 0 };
const BLACK: RGB8 = RGB8 { r: 0, g: 0, b: 0 };

fn persisted(controller: &mut fixture_tests::TestFixture) -> Result<FixtureState, StoreError> {
    controller.store_mut().load()
}

/// Schreibt einen Frame mit gültigem Header, aber kaputtem JSON
fn corrupt_flash() -> RamFlash {
    let mut flash = RamFlash::new(3);
    flash.poke(RamFlash::SECTOR_SIZE, &raw_frame(0, b"{\"isOn\":tr"));
    flash
}

// ============================================================================
// Tests: Lebenszyklus
// ============================================================================

#[test]
fn test_power_cycle_scenario() {
    let (mut controller, probe) = fixture();
    assert_eq!(persisted(&mut controller), Err(StoreError::NotFound));

    // Erster Start: Default wird angelegt, alle Kanäle auf 0
    let state = controller.power_on().unwrap();
    assert_eq!(state, FixtureState::new(true, BLACK));
    assert_eq!(probe.duties(), [0, 0, 0]);
    assert!(controller.is_on());

    let state = controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();
    assert_eq!(state, FixtureState::new(true, RED));
    assert_eq!(probe.duties(), [100, 0, 0]);
    assert_eq!(persisted(&mut controller), Ok(state));

    // Ausschalten: Kanäle auf 0, Farbe bleibt im Datensatz
    let state = controller.power_off().unwrap();
    assert_eq!(state, FixtureState::new(false, RED));
    assert_eq!(probe.duties(), [0, 0, 0]);
    assert!(!controller.is_on());
    assert_eq!(probe.release_count(), 1);

    // Wieder einschalten stellt die letzte Farbe her
    let state = controller.power_on().unwrap();
    assert_eq!(state, FixtureState::new(true, RED));
    assert_eq!(probe.duties(), [100, 0, 0]);
    assert_eq!(probe.acquire_count(), 2);
}

#[test]
fn test_power_on_after_restart_restores_color() {
    let (mut controller, _probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(0, 128, 255)).unwrap();
    controller.power_off().unwrap();

    // "Neustart": neuer Controller über demselben Flash
    let mut restarted = RamFlash::new(3);
    restarted.poke(0, controller.store().storage().flash().bytes());
    let (mut controller, probe) = fixture_with_flash(restarted);

    assert!(!controller.is_on());
    let state = controller.power_on().unwrap();
    assert_eq!(state.color, RGB8 { r: 0, g: 128, b: 255 });
    assert_eq!(probe.duties(), [0, 50, 100]);
}

#[test]
fn test_power_on_twice_is_already_on() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();

    assert_eq!(controller.power_on(), Err(FixtureError::AlreadyOn));
    // Hardware wurde nicht erneut belegt
    assert_eq!(probe.acquire_count(), 1);
    assert!(controller.is_on());
}

#[test]
fn test_power_off_when_off_is_noop() {
    let (mut controller, probe) = fixture();

    // Erster Start ohne Datensatz: Default, aber nichts wird geschrieben
    assert_eq!(controller.power_off(), Ok(FixtureState::default()));
    assert_eq!(persisted(&mut controller), Err(StoreError::NotFound));

    controller
        .import_snapshot(FixtureState::new(false, RED))
        .unwrap();
    assert_eq!(controller.power_off(), Ok(FixtureState::new(false, RED)));
    assert_eq!(probe.release_count(), 0);
    assert_eq!(probe.write_count(), 0);
}

// ============================================================================
// Tests: Farbe
// ============================================================================

#[test]
fn test_set_color_is_idempotent() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();

    let first = controller.set_color(ColorRequest::new(12, 34, 56)).unwrap();
    let levels = probe.duties();
    let second = controller.set_color(ColorRequest::new(12, 34, 56)).unwrap();

    assert_eq!(first, second);
    assert_eq!(probe.duties(), levels);
    assert_eq!(probe.duties(), [4, 13, 21]);
    assert_eq!(persisted(&mut controller), Ok(second));
}

#[test]
fn test_set_color_while_off_is_rejected() {
    let (mut controller, probe) = fixture();
    controller
        .import_snapshot(FixtureState::new(false, RED))
        .unwrap();

    let result = controller.set_color(ColorRequest::new(0, 0, 255));
    assert_eq!(result, Err(FixtureError::NotPoweredOn));
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(false, RED)));
    assert_eq!(probe.write_count(), 0);
    assert_eq!(probe.acquire_count(), 0);

    // Auch eine ungültige Farbe meldet zuerst den Betriebszustand
    let result = controller.set_color(ColorRequest::new(300, 0, 0));
    assert_eq!(result, Err(FixtureError::NotPoweredOn));
}

#[test]
fn test_set_color_rejects_out_of_range() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();
    let writes = probe.write_count();

    for request in [
        ColorRequest::new(256, 0, 0),
        ColorRequest::new(0, -1, 0),
        ColorRequest::new(0, 0, i64::MAX),
    ] {
        assert_eq!(controller.set_color(request), Err(FixtureError::InvalidColor));
    }

    // Weder Hardware noch Datensatz wurden angefasst
    assert_eq!(probe.write_count(), writes);
    assert_eq!(probe.duties(), [100, 0, 0]);
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(true, RED)));
}

#[test]
fn test_apply_preset() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();

    let state = controller.apply_preset(Preset::Ocean).unwrap();
    assert_eq!(state.color, Preset::Ocean.color());
    assert_eq!(probe.duties(), [0, 50, 100]);

    let state = controller.apply_preset(Preset::Off).unwrap();
    assert_eq!(state, FixtureState::new(true, BLACK));
    // Preset "off" ist eine Farbe, kein Ausschalten
    assert!(controller.is_on());
}

#[test]
fn test_apply_preset_while_off_is_rejected() {
    let (mut controller, _probe) = fixture();
    assert_eq!(
        controller.apply_preset(Preset::Sunset),
        Err(FixtureError::NotPoweredOn)
    );
}

// ============================================================================
// Tests: Import / Status
// ============================================================================

#[test]
fn test_import_snapshot_round_trip() {
    let (mut controller, _probe) = fixture();

    for snapshot in [
        FixtureState::new(true, RGB8 { r: 1, g: 2, b: 3 }),
        FixtureState::new(false, RGB8 { r: 255, g: 255, b: 255 }),
        FixtureState::new(false, BLACK),
    ] {
        assert_eq!(controller.import_snapshot(snapshot), Ok(snapshot));
        assert_eq!(persisted(&mut controller), Ok(snapshot));
    }
}

#[test]
fn test_import_while_on_does_not_touch_hardware() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();
    let writes = probe.write_count();

    let snapshot = FixtureState::new(false, RGB8 { r: 0, g: 0, b: 255 });
    controller.import_snapshot(snapshot).unwrap();

    assert_eq!(probe.write_count(), writes);
    assert_eq!(probe.duties(), [100, 0, 0]);
    assert!(controller.is_on());

    // Der nächste Zyklus übernimmt die importierte Farbe
    controller.power_off().unwrap();
    let state = controller.power_on().unwrap();
    assert_eq!(state, FixtureState::new(true, RGB8 { r: 0, g: 0, b: 255 }));
    assert_eq!(probe.duties(), [0, 0, 100]);
}

#[test]
fn test_import_request_validates_channels() {
    let (mut controller, _probe) = fixture();
    controller
        .import_snapshot(FixtureState::new(false, RED))
        .unwrap();

    let request = SnapshotRequest {
        is_on: true,
        curr_color: [0, 256, 0],
    };
    assert_eq!(
        controller.import_request(request),
        Err(FixtureError::InvalidColor)
    );
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(false, RED)));

    let (request, _) =
        serde_json_core::from_str::<SnapshotRequest>(r#"{"isOn":true,"currColor":[9,8,7]}"#)
            .unwrap();
    assert_eq!(
        controller.import_request(request),
        Ok(FixtureState::new(true, RGB8 { r: 9, g: 8, b: 7 }))
    );
}

#[test]
fn test_status_reports_power_and_record() {
    let (mut controller, _probe) = fixture();
    assert_eq!(
        controller.status(),
        Ok(FixtureStatus {
            powered: false,
            state: FixtureState::default(),
        })
    );

    controller.power_on().unwrap();
    controller.apply_preset(Preset::Forest).unwrap();
    assert_eq!(
        controller.status(),
        Ok(FixtureStatus {
            powered: true,
            state: FixtureState::new(true, Preset::Forest.color()),
        })
    );
}

// ============================================================================
// Tests: Fehlerpfade
// ============================================================================

#[test]
fn test_acquire_failure_keeps_controller_off() {
    let (mut controller, probe) = fixture();
    probe.fail_acquire(true);

    assert_eq!(
        controller.power_on(),
        Err(FixtureError::Driver(DriverError::HardwareUnavailable))
    );
    assert!(!controller.is_on());
    assert_eq!(persisted(&mut controller), Err(StoreError::NotFound));

    probe.fail_acquire(false);
    assert!(controller.power_on().is_ok());
}

#[test]
fn test_drive_failure_leaves_record_unchanged() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(51, 51, 51)).unwrap();

    probe.fail_channel(Some(1));
    let result = controller.set_color(ColorRequest::new(255, 255, 255));
    assert_eq!(result, Err(FixtureError::Driver(DriverError::DriveFailed)));

    // Hardware zeigt weiter die alte Farbe, Datensatz ebenso
    assert_eq!(probe.duties(), [20, 20, 20]);
    assert_eq!(controller.levels(), [20, 20, 20]);
    assert_eq!(
        persisted(&mut controller),
        Ok(FixtureState::new(true, RGB8 { r: 51, g: 51, b: 51 }))
    );
    assert!(controller.is_on());

    probe.fail_channel(None);
    assert!(controller.set_color(ColorRequest::new(255, 255, 255)).is_ok());
    assert_eq!(probe.duties(), [100, 100, 100]);
}

#[test]
fn test_power_on_drive_failure_releases_hardware() {
    let (mut controller, probe) = fixture();
    controller
        .import_snapshot(FixtureState::new(false, RED))
        .unwrap();
    probe.fail_channel(Some(0));

    assert_eq!(
        controller.power_on(),
        Err(FixtureError::Driver(DriverError::DriveFailed))
    );
    assert!(!controller.is_on());
    assert!(!controller.driver().is_acquired());
    assert_eq!(probe.release_count(), 1);
    assert_eq!(probe.duties(), [0, 0, 0]);
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(false, RED)));

    // Nach Behebung ist ein neues power_on möglich
    probe.fail_channel(None);
    assert_eq!(controller.power_on(), Ok(FixtureState::new(true, RED)));
}

#[test]
fn test_corrupt_record_is_surfaced_then_restored() {
    let (mut controller, probe) = fixture_with_flash(corrupt_flash());

    assert_eq!(
        controller.power_on(),
        Err(FixtureError::Store(StoreError::Corrupt))
    );
    assert!(!controller.is_on());
    assert!(!controller.driver().is_acquired());
    assert_eq!(probe.release_count(), 1);
    assert_eq!(
        controller.status(),
        Err(FixtureError::Store(StoreError::Corrupt))
    );

    // Erst der explizite Reset verwirft den Datensatz
    assert_eq!(controller.restore_defaults(), Ok(FixtureState::default()));
    assert_eq!(controller.power_on(), Ok(FixtureState::new(true, BLACK)));
}

#[test]
fn test_power_off_with_corrupt_record_still_releases_hardware() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();

    // Datensatz geht während des Betriebs kaputt
    let storage = controller.store_mut().storage_mut();
    let active = storage.active_slot().unwrap().unwrap() as usize;
    storage.flash_mut().poke(active + 8, b"????");

    assert_eq!(
        controller.power_off(),
        Err(FixtureError::Store(StoreError::Corrupt))
    );
    assert!(!controller.is_on());
    assert_eq!(probe.duties(), [0, 0, 0]);
}

#[test]
fn test_persist_failure_after_drive_is_divergence() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller
        .store_mut()
        .storage_mut()
        .flash_mut()
        .fail_writes = true;

    let result = controller.set_color(ColorRequest::new(255, 0, 0));
    assert_eq!(result, Err(FixtureError::Store(StoreError::IoFailure)));

    // Hardware ist bereits umgeschaltet, kein Rollback
    assert_eq!(probe.duties(), [100, 0, 0]);
    assert!(controller.is_on());
    // Der Datensatz ist veraltet, aber noch vorhanden
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(true, BLACK)));

    // Der nächste erfolgreiche Schreibvorgang löst die Abweichung auf
    controller
        .store_mut()
        .storage_mut()
        .flash_mut()
        .fail_writes = false;
    let state = controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();
    assert_eq!(persisted(&mut controller), Ok(state));
}

#[test]
fn test_record_on_flash_is_exact_schema() {
    let (mut controller, _probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(255, 255, 255)).unwrap();
    controller.set_color(ColorRequest::new(0, 0, 0)).unwrap();

    // Drei Schreibvorgänge: Slot A, B, dann wieder A mit Sequenz 2
    let slot = record_slot(&mut controller);
    let expected = br#"{"isOn":true,"currColor":[0,0,0]}"#;
    assert_eq!(&slot[..8], &raw_frame(2, expected)[..8]);
    assert_eq!(&slot[8..8 + expected.len()], expected);
    // Rest des Slots ist gelöscht
    assert!(slot[8 + expected.len()..].iter().all(|&byte| byte == 0xFF));
}

#[test]
fn test_failed_write_keeps_previous_record() {
    let (mut controller, probe) = fixture();
    controller.power_on().unwrap();
    controller.set_color(ColorRequest::new(255, 0, 0)).unwrap();
    controller.power_off().unwrap();

    controller
        .store_mut()
        .storage_mut()
        .flash_mut()
        .fail_writes = true;
    assert_eq!(
        controller.import_snapshot(FixtureState::new(false, RGB8 { r: 0, g: 0, b: 255 })),
        Err(FixtureError::Store(StoreError::IoFailure))
    );

    // Der letzte gültige Datensatz überlebt den Fehler
    assert_eq!(persisted(&mut controller), Ok(FixtureState::new(false, RED)));

    controller
        .store_mut()
        .storage_mut()
        .flash_mut()
        .fail_writes = false;
    assert_eq!(controller.power_on(), Ok(FixtureState::new(true, RED)));
    assert_eq!(probe.duties(), [100, 0, 0]);
}

// ============================================================================
// Tests: SharedFixture
// ============================================================================

#[test]
fn test_shared_fixture_delegates() {
    let (controller, probe) = fixture();
    let shared: SharedFixture<NoopRawMutex, _, _> = SharedFixture::new(controller);

    shared.power_on().unwrap();
    shared.apply_preset(Preset::Amber).unwrap();
    assert_eq!(probe.duties(), [100, 27, 0]);
    assert!(shared.with(|controller| controller.is_on()));

    let state = shared.power_off().unwrap();
    assert_eq!(state, FixtureState::new(false, Preset::Amber.color()));

    let mut controller = shared.into_inner();
    assert_eq!(controller.store_mut().load(), Ok(state));
}

#[test]
fn test_shared_fixture_serializes_threads() {
    let (controller, probe) = fixture();
    let shared: SharedFixture<CriticalSectionRawMutex, _, _> = SharedFixture::new(controller);
    shared.power_on().unwrap();

    std::thread::scope(|scope| {
        for worker in 0..4u8 {
            let shared = &shared;
            scope.spawn(move || {
                for step in 0..25u8 {
                    let value = i64::from(worker * 50 + step);
                    shared
                        .set_color(ColorRequest::new(value, value, value))
                        .unwrap();
                }
            });
        }
    });

    // Hardware und Datensatz gehören zur selben (letzten) Operation
    let status = shared.status().unwrap();
    assert!(status.powered);
    let color = status.state.color;
    assert_eq!(color.r, color.g);
    assert_eq!(color.g, color.b);
    let level = (u16::from(color.r) * 100 / 255) as u8;
    assert_eq!(probe.duties(), [level, level, level]);
    // acquire (3) + power_on (3) + 100 Farben à 3 Kanäle
    assert_eq!(probe.write_count(), 6 + 3 * 100);
}
