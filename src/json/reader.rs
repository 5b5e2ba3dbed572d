//! Loader für das JSON-Interchange-Format.
//!
//! Der Aufbau läuft zweiphasig: erst werden alle Gatter samt Pins
//! konstruiert, dann Attachments, Wires und Bus-Verbindungen über die
//! Pin-ID-Tabelle aufgelöst. Schlägt irgendein Teil fehl, kommt gar
//! keine Schaltung zurück — die Host-Schaltung bleibt unberührt.

use std::collections::HashMap;

use glam::Vec2;
use indexmap::IndexSet;
use thiserror::Error;

use crate::core::bus;
use crate::core::gate::{Gate, GateId, GateKind};
use crate::core::{
    BusId, ChipLibrary, ChipState, Circuit, Color, Pin, PinAllocator, PinDirection, PinId, Wire,
};
use crate::json::schema::{CircuitDoc, GateDoc};

/// Fehler beim Laden eines Dokuments
#[derive(Debug, Error)]
pub enum LoadError {
    /// Kein gültiges JSON oder Schema-Verstoß
    #[error("Dokument ist kein gültiges JSON: {0}")]
    Schema(#[from] serde_json::Error),
    /// Ein CHIP referenziert eine Definition, die die Library nicht kennt
    #[error("fehlende Abhängigkeit: {0}")]
    MissingDependency(String),
    /// Eine Chip-Definition bettet sich (transitiv) selbst ein
    #[error("rekursive Chip-Einbettung: {0}")]
    RecursiveChip(String),
    /// Attachment oder Wire verweist auf eine unbekannte Pin-ID
    #[error("Verweis auf unbekannten Pin {0}")]
    MalformedPinReference(PinId),
    /// Bus-Verbindung verweist auf eine unbekannte Bus-ID
    #[error("Verweis auf unbekannten Bus {0}")]
    MalformedBusReference(BusId),
    /// Unbekannter Wert im `name`-Feld eines Gatters
    #[error("unbekannter Gatter-Typ: {0}")]
    UnknownGateKind(String),
    /// BUS-Eintrag ohne `id`-Feld
    #[error("BUS-Eintrag ohne id-Feld")]
    MissingBusId,
    /// CHIP-Eintrag ohne `fileName`-Feld
    #[error("CHIP-Eintrag ohne fileName-Feld")]
    MissingChipFile,
    /// Zwei Pins im selben Dokument tragen dieselbe ID
    #[error("doppelte Pin-ID {0}")]
    DuplicatePinId(PinId),
    /// Pin-Anzahl eines Gatters passt nicht zu seiner Variante
    #[error("Gatter {name} hat {got} Pins statt {expected}")]
    PinCountMismatch {
        name: String,
        expected: usize,
        got: usize,
    },
}

/// Umgang mit den Pin-IDs eines Dokuments
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdPolicy {
    /// Dokument-IDs unverändert übernehmen (Laden einer ganzen Datei)
    Preserve,
    /// Frische IDs aus dem Allocator des Aufrufers vergeben (eingebettete
    /// Chip-Schaltungen teilen sich den ID-Raum des Ladevorgangs)
    Renumber,
}

/// Lädt eine Schaltung aus einem Dokumenttext; Chip-Abhängigkeiten werden
/// über die Library aufgelöst
pub fn read_circuit(text: &str, library: &dyn ChipLibrary) -> Result<Circuit, LoadError> {
    let doc: CircuitDoc = serde_json::from_str(text)?;
    let mut alloc = PinAllocator::new();
    let mut stack = Vec::new();
    build_circuit(&doc, library, IdPolicy::Preserve, &mut alloc, &mut stack)
}

/// Platziert einen Chip in einer bestehenden Schaltung.
///
/// Die eingebettete Schaltung wird frisch geladen und umnummeriert, damit
/// ihre Pin-IDs mit keinem späteren Edit der Zielschaltung kollidieren.
pub fn instantiate_chip(
    circuit: &mut Circuit,
    file_name: &str,
    origin: Vec2,
    library: &dyn ChipLibrary,
) -> Result<GateId, LoadError> {
    let text = library
        .resolve(file_name)
        .ok_or_else(|| LoadError::MissingDependency(file_name.to_string()))?;
    let doc: CircuitDoc = serde_json::from_str(&text)?;

    let mut stack = vec![file_name.to_string()];
    let inner = build_circuit(
        &doc,
        library,
        IdPolicy::Renumber,
        &mut circuit.pin_alloc,
        &mut stack,
    )?;

    let chip_name = doc
        .chip_name
        .clone()
        .unwrap_or_else(|| file_name.to_string());
    let color = doc.color.map(Color::from);
    let state = ChipState::from_inner(file_name.to_string(), chip_name, inner);

    let id = circuit.next_gate_id;
    circuit.next_gate_id += 1;
    let mut gate = Gate::chip(id, origin, state, &mut circuit.pin_alloc);
    if let Some(color) = color {
        gate.color = color;
    }
    log::info!("Chip '{}' platziert als Gatter {}", file_name, id);
    Ok(circuit.insert_gate(gate))
}

/// Erwartete Pin-Anzahl einer Variante; `None` für dynamische Pin-Sätze
fn expected_pins(kind: &GateKind) -> Option<usize> {
    match kind {
        GateKind::Switch { .. } | GateKind::Light => Some(1),
        GateKind::Not => Some(2),
        GateKind::And { .. } | GateKind::TriStateBuffer { .. } => Some(3),
        GateKind::Display7 => Some(8),
        GateKind::Bus { .. } => None,
        GateKind::Chip(state) => Some(state.pin_count()),
    }
}

/// Standard-Farbe einer Variante, falls das Dokument keine mitbringt
fn default_color(kind: &GateKind) -> Color {
    match kind {
        GateKind::Switch { .. } => Color::RED,
        GateKind::Light | GateKind::Display7 => Color::DARK_GRAY,
        GateKind::Not => Color::ORANGE,
        GateKind::And { .. } => Color::BLUE,
        GateKind::TriStateBuffer { .. } | GateKind::Bus { .. } | GateKind::Chip(_) => Color::GRAY,
    }
}

fn resolve_kind(
    gate_doc: &GateDoc,
    library: &dyn ChipLibrary,
    alloc: &mut PinAllocator,
    stack: &mut Vec<String>,
) -> Result<GateKind, LoadError> {
    match gate_doc.name.as_str() {
        "SWITCH" => Ok(GateKind::Switch { on: false }),
        "LIGHT" => Ok(GateKind::Light),
        "NOT" => Ok(GateKind::Not),
        "AND" => Ok(GateKind::And { last_value: false }),
        "3SBUFFER" => Ok(GateKind::TriStateBuffer { last_value: false }),
        "DISPLAY7" => Ok(GateKind::Display7),
        "BUS" => {
            let bus_id = gate_doc.id.ok_or(LoadError::MissingBusId)?;
            Ok(GateKind::Bus {
                bus_id,
                connections: IndexSet::new(),
            })
        }
        "CHIP" => {
            let file_name = gate_doc
                .file_name
                .as_deref()
                .ok_or(LoadError::MissingChipFile)?;
            if stack.iter().any(|name| name == file_name) {
                return Err(LoadError::RecursiveChip(file_name.to_string()));
            }
            let text = library
                .resolve(file_name)
                .ok_or_else(|| LoadError::MissingDependency(file_name.to_string()))?;
            let inner_doc: CircuitDoc = serde_json::from_str(&text)?;

            stack.push(file_name.to_string());
            let inner = build_circuit(&inner_doc, library, IdPolicy::Renumber, alloc, stack)?;
            stack.pop();

            let chip_name = inner_doc
                .chip_name
                .clone()
                .unwrap_or_else(|| file_name.to_string());
            Ok(GateKind::Chip(Box::new(ChipState::from_inner(
                file_name.to_string(),
                chip_name,
                inner,
            ))))
        }
        other => Err(LoadError::UnknownGateKind(other.to_string())),
    }
}

/// Baut eine Schaltung aus einem Dokument (beide Phasen)
fn build_circuit(
    doc: &CircuitDoc,
    library: &dyn ChipLibrary,
    policy: IdPolicy,
    alloc: &mut PinAllocator,
    stack: &mut Vec<String>,
) -> Result<Circuit, LoadError> {
    let mut circuit = Circuit::new();
    let mut pin_map: HashMap<u32, PinId> = HashMap::new();

    // Unter Preserve zuerst alle Dokument-IDs reservieren: eingebettete
    // Chip-Schaltungen ziehen frische IDs aus demselben Allocator und
    // dürfen nicht mit erst später gelesenen Außen-Pins kollidieren
    if policy == IdPolicy::Preserve {
        for gate_doc in &doc.gates {
            for pin_doc in &gate_doc.pins {
                alloc.bump_past(pin_doc.id);
            }
        }
    }

    // Phase 1: Gatter und Pins konstruieren
    for (index, gate_doc) in doc.gates.iter().enumerate() {
        let kind = resolve_kind(gate_doc, library, alloc, stack)?;

        if let Some(expected) = expected_pins(&kind) {
            if gate_doc.pins.len() != expected {
                return Err(LoadError::PinCountMismatch {
                    name: gate_doc.name.clone(),
                    expected,
                    got: gate_doc.pins.len(),
                });
            }
        }

        let mut pins = Vec::with_capacity(gate_doc.pins.len());
        for pin_doc in &gate_doc.pins {
            let id = match policy {
                IdPolicy::Preserve => pin_doc.id,
                IdPolicy::Renumber => alloc.allocate(),
            };
            if pin_map.insert(pin_doc.id, id).is_some() {
                return Err(LoadError::DuplicatePinId(pin_doc.id));
            }
            let direction = if pin_doc.do_input {
                PinDirection::Input
            } else {
                PinDirection::Output
            };
            pins.push(Pin::new(id, pin_doc.rect.into(), direction));
        }

        // Schalterfarbe ist Zustandsfarbe; der Zustand wird nicht
        // serialisiert, also startet der Schalter in der Aus-Farbe
        let color = match &kind {
            GateKind::Switch { .. } => Color::RED,
            _ => gate_doc
                .color
                .map(Color::from)
                .unwrap_or_else(|| default_color(&kind)),
        };
        let gate = Gate {
            id: index as GateId,
            rect: gate_doc.rect.into(),
            color,
            label: gate_doc.label.clone(),
            pins,
            kind,
        };
        circuit.insert_gate(gate);
    }

    // Phase 2a: Attachments auflösen
    for gate_doc in &doc.gates {
        for pin_doc in &gate_doc.pins {
            let pin_id = pin_map[&pin_doc.id];
            for &attached_doc_id in &pin_doc.attached {
                let target = *pin_map
                    .get(&attached_doc_id)
                    .ok_or(LoadError::MalformedPinReference(attached_doc_id))?;
                if let Some(pin) = circuit.find_pin_mut(pin_id) {
                    pin.attach(target);
                }
            }
        }
    }

    // Phase 2b: Wires auflösen
    for wire_doc in &doc.wires {
        let pin1 = *pin_map
            .get(&wire_doc.pin1)
            .ok_or(LoadError::MalformedPinReference(wire_doc.pin1))?;
        let pin2 = *pin_map
            .get(&wire_doc.pin2)
            .ok_or(LoadError::MalformedPinReference(wire_doc.pin2))?;
        let points = wire_doc
            .points
            .iter()
            .map(|p| Vec2::new(p.x as f32, p.y as f32))
            .collect();
        circuit.wires.push(Wire::new(pin1, pin2, points));
    }

    // Phase 2c: Bus-Verbindungen knüpfen (Bus-IDs bleiben Dokument-IDs)
    for gate_doc in &doc.gates {
        let (Some(own_id), Some(connections)) = (gate_doc.id, gate_doc.connections.as_ref())
        else {
            continue;
        };
        if gate_doc.name != "BUS" {
            continue;
        }
        for &other in connections {
            if other == own_id {
                continue;
            }
            if bus::find_bus(&circuit.gates, other).is_none() {
                return Err(LoadError::MalformedBusReference(other));
            }
            bus::connect(&mut circuit.gates, own_id, other);
        }
    }

    circuit.rebuild_spatial_index();
    log::debug!(
        "Schaltung geladen: {} Gatter, {} Wires ({:?})",
        circuit.gates.len(),
        circuit.wires.len(),
        policy
    );
    Ok(circuit)
}
