//! Bus-Verbindungen: transitive Zusammenschaltung mehrerer Schienen.
//!
//! Verbundene Busse bilden eine Äquivalenzklasse mit einem gemeinsamen
//! effektiven Signal. Die Klasse wird bei Bedarf aus den symmetrischen
//! Verbindungsmengen neu berechnet — kein gecachter Union-Find-Zustand,
//! der mit Edits synchron gehalten werden müsste.

use indexmap::IndexSet;

use crate::core::gate::{Gate, GateKind};

/// ID eines Busses im Interchange-Format (pro Schaltung eindeutig)
pub type BusId = u32;

/// Index des Gatters mit dieser Bus-ID
pub(crate) fn find_bus(gates: &[Gate], bus: BusId) -> Option<usize> {
    gates.iter().position(|g| g.bus_id() == Some(bus))
}

/// Berechnet die Verbindungs-Hülle eines Busses (inklusive Startbus).
///
/// Kanten werden ungerichtet gelesen, damit auch einseitig notierte
/// Verbindungen aus älteren Dokumenten die Klasse nicht zerreißen.
pub fn closure(gates: &[Gate], start: BusId) -> IndexSet<BusId> {
    let mut class: IndexSet<BusId> = IndexSet::new();
    if find_bus(gates, start).is_none() {
        return class;
    }

    let mut queue = vec![start];
    class.insert(start);

    while let Some(current) = queue.pop() {
        for gate in gates {
            let GateKind::Bus { bus_id, connections } = &gate.kind else {
                continue;
            };

            let neighbor = if *bus_id == current {
                None
            } else if connections.contains(&current) {
                Some(*bus_id)
            } else {
                None
            };

            if let Some(neighbor) = neighbor {
                if class.insert(neighbor) {
                    queue.push(neighbor);
                }
            }

            if *bus_id == current {
                for &other in connections {
                    if find_bus(gates, other).is_some() && class.insert(other) {
                        queue.push(other);
                    }
                }
            }
        }
    }

    class
}

/// Verbindet zwei Busse symmetrisch; No-op bei Selbstverbindung oder
/// unbekannten IDs
pub(crate) fn connect(gates: &mut [Gate], a: BusId, b: BusId) -> bool {
    if a == b || find_bus(gates, a).is_none() || find_bus(gates, b).is_none() {
        return false;
    }

    for gate in gates.iter_mut() {
        if let GateKind::Bus { bus_id, connections } = &mut gate.kind {
            if *bus_id == a {
                connections.insert(b);
            } else if *bus_id == b {
                connections.insert(a);
            }
        }
    }
    true
}

/// Löst alle Verbindungen eines Busses (beidseitig)
pub(crate) fn clear_connections(gates: &mut [Gate], bus: BusId) -> bool {
    if find_bus(gates, bus).is_none() {
        return false;
    }

    for gate in gates.iter_mut() {
        if let GateKind::Bus { bus_id, connections } = &mut gate.kind {
            if *bus_id == bus {
                connections.clear();
            } else {
                connections.shift_remove(&bus);
            }
        }
    }
    true
}

/// Entfernt die Bus-ID aus den Verbindungsmengen aller übrigen Busse
/// (Aufräumen nach Gatter-Löschung)
pub(crate) fn forget(gates: &mut [Gate], bus: BusId) {
    for gate in gates.iter_mut() {
        if let GateKind::Bus { connections, .. } = &mut gate.kind {
            connections.shift_remove(&bus);
        }
    }
}
