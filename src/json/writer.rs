//! Writer für das JSON-Interchange-Format.
//!
//! Die Ausgabe ist deterministisch: Gatter, Pins und Attachments erscheinen
//! in Einfüge-Reihenfolge, damit Speichern ohne Edit byte-stabil bleibt.

use anyhow::{Context, Result};

use crate::core::gate::{Gate, GateKind};
use crate::core::{Circuit, Color};
use crate::json::schema::{CircuitDoc, GateDoc, PinDoc, PointDoc, WireDoc};

/// Serialisiert eine Schaltung als normales Dokument
pub fn write_circuit(circuit: &Circuit) -> Result<String> {
    let doc = document(circuit, None);
    serde_json::to_string_pretty(&doc).context("Schaltung konnte nicht serialisiert werden")
}

/// Serialisiert eine Schaltung als Chip-Definition mit Name und Farbe
pub fn write_chip(circuit: &Circuit, name: &str, color: Color) -> Result<String> {
    let doc = document(circuit, Some((name, color)));
    serde_json::to_string_pretty(&doc).context("Chip-Definition konnte nicht serialisiert werden")
}

fn document(circuit: &Circuit, chip_header: Option<(&str, Color)>) -> CircuitDoc {
    CircuitDoc {
        gates: circuit.gates().iter().map(gate_doc).collect(),
        wires: circuit
            .wires()
            .iter()
            .map(|wire| WireDoc {
                pin1: wire.pin1,
                pin2: wire.pin2,
                points: wire
                    .points
                    .iter()
                    .map(|p| PointDoc {
                        x: p.x as f64,
                        y: p.y as f64,
                    })
                    .collect(),
            })
            .collect(),
        chip_name: chip_header.map(|(name, _)| name.to_string()),
        color: chip_header.map(|(_, color)| color.into()),
    }
}

fn gate_doc(gate: &Gate) -> GateDoc {
    let (file_name, bus_id, connections) = match &gate.kind {
        GateKind::Chip(state) => (Some(state.file_name.clone()), None, None),
        GateKind::Bus {
            bus_id,
            connections,
        } => (
            None,
            Some(*bus_id),
            Some(connections.iter().copied().collect()),
        ),
        _ => (None, None, None),
    };

    // Schalter tragen ihre Zustandsfarbe; wie der Zustand selbst gehört
    // sie nicht ins Dokument — gespeichert wird die Aus-Farbe
    let color = match &gate.kind {
        GateKind::Switch { .. } => Color::RED,
        _ => gate.color,
    };

    GateDoc {
        name: gate.kind.name().to_string(),
        rect: gate.rect.into(),
        color: Some(color.into()),
        label: gate.label.clone(),
        file_name,
        id: bus_id,
        connections,
        pins: gate
            .pins
            .iter()
            .map(|pin| PinDoc {
                id: pin.id,
                rect: pin.rect.into(),
                do_input: pin.direction.is_input(),
                attached: pin.attached.iter().copied().collect(),
            })
            .collect(),
    }
}
