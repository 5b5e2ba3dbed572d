//! Chips: eine gespeicherte Schaltung als Black-Box-Gatter.
//!
//! Ein Chip besitzt eine private, aus einer benannten Definition geladene
//! Teilschaltung. Seine externen Pins sind eine Projektion der inneren
//! Switches (werden Chip-Inputs) und Lights (werden Chip-Outputs) in der
//! Reihenfolge der inneren Definition — nie von Hand editiert.

use std::collections::HashMap;

use glam::Vec2;

use crate::core::gate::{GateId, GateKind, PIN_SIZE};
use crate::core::{Circuit, Pin, PinAllocator, PinDirection, Rect};

/// Breite eines Chip-Gatters
pub const CHIP_WIDTH: f32 = 125.0;
/// Vertikaler Abstand zwischen Chip-Pins
const PIN_SPACING: f32 = 20.0;

/// Auflöst Chip-Definitionsnamen zu ihrem gespeicherten Dokumenttext.
///
/// Die Dateimechanik (Upload, Verzeichnisse) liegt beim Host; der Core
/// fragt nur nach `fileName` → Inhalt.
pub trait ChipLibrary {
    /// Gibt den Dokumenttext zur Definition zurück, falls vorhanden
    fn resolve(&self, file_name: &str) -> Option<String>;
}

impl ChipLibrary for HashMap<String, String> {
    fn resolve(&self, file_name: &str) -> Option<String> {
        self.get(file_name).cloned()
    }
}

/// Ein externer Anschluss eines Chips: inneres Grenz-Gatter plus Label
#[derive(Debug, Clone)]
pub struct ChipPort {
    /// Handle des inneren Switch- bzw. Light-Gatters
    pub gate: GateId,
    /// Label des inneren Gatters (für Tooltips am externen Pin)
    pub label: String,
}

/// Zustand eines Chip-Gatters: eingebettete Schaltung und Port-Zuordnung.
#[derive(Debug, Clone)]
pub struct ChipState {
    /// Name der referenzierten Definition (`fileName` im Dokument)
    pub file_name: String,
    /// Anzeigename aus dem `chipName`-Feld der Definition
    pub chip_name: String,
    /// Die private Teilschaltung
    pub inner: Circuit,
    /// Input-Ports in innerer Reihenfolge; Port i ↔ externer Pin i
    pub inputs: Vec<ChipPort>,
    /// Output-Ports; Port j ↔ externer Pin `inputs.len() + j`
    pub outputs: Vec<ChipPort>,
}

impl ChipState {
    /// Baut den Chip-Zustand aus einer geladenen Teilschaltung und leitet
    /// die Port-Listen aus deren Switches und Lights ab
    pub fn from_inner(file_name: String, chip_name: String, inner: Circuit) -> Self {
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();

        for gate in inner.gates() {
            match &gate.kind {
                GateKind::Switch { .. } => inputs.push(ChipPort {
                    gate: gate.id,
                    label: gate.label.clone(),
                }),
                GateKind::Light => outputs.push(ChipPort {
                    gate: gate.id,
                    label: gate.label.clone(),
                }),
                _ => {}
            }
        }

        Self {
            file_name,
            chip_name,
            inner,
            inputs,
            outputs,
        }
    }

    /// Anzahl externer Pins laut Projektion
    pub fn pin_count(&self) -> usize {
        self.inputs.len() + self.outputs.len()
    }

    /// Label des externen Pins an Position `index` (Inputs vor Outputs)
    pub fn pin_label(&self, index: usize) -> Option<&str> {
        if index < self.inputs.len() {
            self.inputs.get(index).map(|p| p.label.as_str())
        } else {
            self.outputs
                .get(index - self.inputs.len())
                .map(|p| p.label.as_str())
        }
    }
}

/// Gatter-Rechteck eines Chips mit `rows` Pin-Reihen
pub(crate) fn chip_rect(origin: Vec2, rows: usize) -> Rect {
    let height = rows.max(1) as f32 * PIN_SPACING + PIN_SPACING;
    Rect::new(origin.x, origin.y, CHIP_WIDTH, height)
}

/// Erzeugt frische externe Pins: Inputs entlang der linken, Outputs
/// entlang der rechten Kante, in Projektion-Reihenfolge
pub(crate) fn external_pins(
    rect: Rect,
    n_inputs: usize,
    n_outputs: usize,
    alloc: &mut PinAllocator,
) -> Vec<Pin> {
    let mut pins = Vec::with_capacity(n_inputs + n_outputs);

    for row in 0..n_inputs {
        pins.push(Pin::new(
            alloc.allocate(),
            Rect::new(
                rect.x - 7.0,
                rect.y + 10.0 + row as f32 * PIN_SPACING,
                PIN_SIZE,
                PIN_SIZE,
            ),
            PinDirection::Input,
        ));
    }

    for row in 0..n_outputs {
        pins.push(Pin::new(
            alloc.allocate(),
            Rect::new(
                rect.max_x() - 7.0,
                rect.y + 10.0 + row as f32 * PIN_SPACING,
                PIN_SIZE,
                PIN_SIZE,
            ),
            PinDirection::Output,
        ));
    }

    pins
}
