//! JSON Import/Export für Schaltungs-Dokumente.
//!
//! Dieses Modul implementiert das Laden und Schreiben des
//! Interchange-Formats (gates/wires, optionaler Chip-Header).

pub mod reader;
pub mod schema;
pub mod writer;

pub use reader::{instantiate_chip, read_circuit, IdPolicy, LoadError};
pub use writer::{write_chip, write_circuit};
