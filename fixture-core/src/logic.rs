//! Pure Business Logic Functions
//!
//! Funktionen ohne Hardware-Dependencies (testbar!)

use rgb::RGB8;

/// Rechnet einen 8-Bit Farbwert in einen Duty-Cycle um
///
/// Lineare Abbildung `value * max_duty / 255`. Die Division schneidet ab
/// (Rundung Richtung Null), es ist der einzige Umrechnungsweg zur Hardware.
///
/// # Beispiele
///
/// ```
/// # use fixture_core::duty_for;
/// assert_eq!(duty_for(0, 100), 0);
/// assert_eq!(duty_for(128, 100), 50); // 50.19 → 50
/// assert_eq!(duty_for(255, 100), 100);
/// ```
pub fn duty_for(value: u8, max_duty: u8) -> u8 {
    // 255 * 255 passt in u16, das Ergebnis ist immer <= max_duty
    (u16::from(value) * u16::from(max_duty) / 255) as u8
}

/// Duty-Cycles für alle drei Kanäle (Reihenfolge Rot, Grün, Blau)
pub fn duty_levels(color: RGB8, max_duty: u8) -> [u8; 3] {
    [
        duty_for(color.r, max_duty),
        duty_for(color.g, max_duty),
        duty_for(color.b, max_duty),
    ]
}
