//! Logik-Simulator Library.
//! Core-Funktionalität als Library exportiert für Tests und Wiederverwendung.

pub mod core;
pub mod json;

pub use core::{
    BusId, ChipLibrary, ChipPort, ChipState, Circuit, Color, Gate, GateId, GateKind, Pin,
    PinDirection, PinId, Rect, Wire,
};
pub use core::{SpatialIndex, SpatialMatch};
pub use json::{instantiate_chip, read_circuit, write_chip, write_circuit, LoadError};
