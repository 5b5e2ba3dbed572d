//! Core-Domänentypen: Pins, Gatter, Wires, Busse, Chips, Schaltung, Engine.

pub mod bus;
pub mod chip;
pub mod circuit;
mod engine;
/// Core-Datenmodelle des Logik-Simulators
///
/// Dieses Modul definiert die Haupt-Datenstrukturen:
/// - Gate: Schaltungsknoten mit Variante, Geometrie und Pins
/// - GateKind: geschlossenes Varianten-Enum samt Zusatzzustand
pub mod gate;
pub mod geometry;
pub mod pin;
pub mod spatial;
pub mod wire;

pub use bus::BusId;
pub use chip::{ChipLibrary, ChipPort, ChipState};
pub use circuit::Circuit;
pub use gate::{Gate, GateId, GateKind, PIN_SIZE};
pub use geometry::{Color, Rect};
pub use pin::{Pin, PinAllocator, PinDirection, PinId};
pub use spatial::{SpatialIndex, SpatialMatch};
pub use wire::Wire;
