//! Wires: explizite Punkt-zu-Punkt-Verbindungen zwischen zwei Pins.

use glam::Vec2;

use crate::core::PinId;

/// Verbindung zwischen zwei Pins.
///
/// Für die Konnektivität ist das Paar ungeordnet; die Reihenfolge bleibt
/// fürs Rendering erhalten. Die Existenz eines Wires impliziert, dass beide
/// Pins gegenseitig attached sind.
#[derive(Debug, Clone)]
pub struct Wire {
    /// Erster Endpunkt
    pub pin1: PinId,
    /// Zweiter Endpunkt
    pub pin2: PinId,
    /// Routing-Wegpunkte, rein kosmetisch — die Propagation ignoriert sie
    pub points: Vec<Vec2>,
}

impl Wire {
    /// Erstellt ein neues Wire
    pub fn new(pin1: PinId, pin2: PinId, points: Vec<Vec2>) -> Self {
        Self { pin1, pin2, points }
    }

    /// Prüft ob das Wire genau diese beiden Pins verbindet (ungeordnet)
    pub fn connects(&self, a: PinId, b: PinId) -> bool {
        (self.pin1 == a && self.pin2 == b) || (self.pin1 == b && self.pin2 == a)
    }

    /// Prüft ob der Pin ein Endpunkt dieses Wires ist
    pub fn touches(&self, pin: PinId) -> bool {
        self.pin1 == pin || self.pin2 == pin
    }
}
