//! Schaltung: das zentrale Aggregat aus Gattern, Wires und Power-Zustand.
//!
//! Alle strukturellen Edits laufen über diese Schnittstelle, damit die
//! Invarianten (Wire ⇒ beidseitiges Attachment, keine hängenden Pin-IDs,
//! aktueller Spatial-Index) an einer Stelle durchgesetzt werden.

use glam::Vec2;

use crate::core::bus;
use crate::core::gate::{Gate, GateId, GateKind, PIN_SIZE};
use crate::core::spatial::SpatialIndex;
use crate::core::{BusId, Color, Pin, PinAllocator, PinDirection, PinId, Rect, Wire};

/// Mindestabstand eines Bus-Pins von den Schmalseiten der Schiene
const BUS_PIN_MARGIN: f32 = 30.0;

/// Eine editierbare Logikschaltung.
///
/// Gatter stehen in Einfüge-Reihenfolge; die Engine wertet sie in genau
/// dieser Reihenfolge aus. Alle Querverweise (Wires, Attachments) laufen
/// über Pin-IDs.
#[derive(Debug, Clone)]
pub struct Circuit {
    pub(crate) gates: Vec<Gate>,
    pub(crate) wires: Vec<Wire>,
    pub(crate) power: bool,
    pub(crate) pin_alloc: PinAllocator,
    pub(crate) next_bus_id: BusId,
    pub(crate) next_gate_id: GateId,
    pub(crate) spatial: SpatialIndex,
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

impl Circuit {
    /// Erstellt eine leere Schaltung (Power an)
    pub fn new() -> Self {
        Self {
            gates: Vec::new(),
            wires: Vec::new(),
            power: true,
            pin_alloc: PinAllocator::new(),
            next_bus_id: 0,
            next_gate_id: 0,
            spatial: SpatialIndex::empty(),
        }
    }

    // ─── Zugriff ─────────────────────────────────────────────────────────

    /// Alle Gatter in Einfüge-Reihenfolge
    pub fn gates(&self) -> &[Gate] {
        &self.gates
    }

    /// Alle Wires
    pub fn wires(&self) -> &[Wire] {
        &self.wires
    }

    /// Gatter nach Handle
    pub fn gate(&self, id: GateId) -> Option<&Gate> {
        self.gates.iter().find(|g| g.id == id)
    }

    /// Gatter nach Handle (mutabel)
    pub fn gate_mut(&mut self, id: GateId) -> Option<&mut Gate> {
        self.gates.iter_mut().find(|g| g.id == id)
    }

    /// Globaler Power-Zustand
    pub fn power(&self) -> bool {
        self.power
    }

    // ─── Gatter platzieren ───────────────────────────────────────────────

    /// Platziert einen Switch
    pub fn place_switch(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::switch(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert eine Lampe
    pub fn place_light(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::light(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert ein NOT-Gatter
    pub fn place_not(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::not(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert ein AND-Gatter
    pub fn place_and(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::and(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert einen Tri-State-Puffer
    pub fn place_tri_state_buffer(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::tri_state_buffer(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert eine 7-Segment-Anzeige
    pub fn place_display7(&mut self, origin: Vec2) -> GateId {
        let id = self.next_gate_id();
        let gate = Gate::display7(id, origin, &mut self.pin_alloc);
        self.push_gate(gate)
    }

    /// Platziert einen Bus mit frischer Bus-ID; startet ohne Pins
    pub fn place_bus(&mut self, rect: Rect) -> GateId {
        let id = self.next_gate_id();
        let bus_id = self.next_bus_id;
        self.next_bus_id += 1;
        let gate = Gate::bus(id, rect, bus_id);
        self.push_gate(gate)
    }

    /// Fügt ein fertig konstruiertes Gatter ein (Loader-Pfad).
    ///
    /// Zieht die ID-Vergabe über alle enthaltenen Pin- und Bus-IDs hoch,
    /// damit spätere Platzierungen nicht kollidieren.
    pub(crate) fn insert_gate(&mut self, gate: Gate) -> GateId {
        for pin in &gate.pins {
            self.pin_alloc.bump_past(pin.id);
        }
        if let Some(bus_id) = gate.bus_id() {
            self.next_bus_id = self.next_bus_id.max(bus_id + 1);
        }
        self.next_gate_id = self.next_gate_id.max(gate.id + 1);
        let id = gate.id;
        self.gates.push(gate);
        self.rebuild_spatial_index();
        id
    }

    fn next_gate_id(&mut self) -> GateId {
        let id = self.next_gate_id;
        self.next_gate_id += 1;
        id
    }

    fn push_gate(&mut self, gate: Gate) -> GateId {
        let id = gate.id;
        self.gates.push(gate);
        self.rebuild_spatial_index();
        id
    }

    /// Entfernt ein Gatter mitsamt allen Wires und Attachments auf seine
    /// Pins. Die Pin-ID-Wasserlinie wird auf das verbleibende Maximum
    /// zurückgesetzt.
    pub fn remove_gate(&mut self, id: GateId) -> bool {
        let Some(index) = self.gates.iter().position(|g| g.id == id) else {
            return false;
        };

        let removed = self.gates.remove(index);
        let pin_ids: Vec<PinId> = removed.pins.iter().map(|p| p.id).collect();

        self.wires.retain(|w| !pin_ids.iter().any(|&p| w.touches(p)));
        for gate in &mut self.gates {
            for pin in &mut gate.pins {
                for &removed_pin in &pin_ids {
                    pin.detach(removed_pin);
                }
            }
        }

        if let Some(bus_id) = removed.bus_id() {
            bus::forget(&mut self.gates, bus_id);
        }

        let max_pin = self
            .gates
            .iter()
            .flat_map(|g| g.pins.iter())
            .map(|p| p.id)
            .max();
        self.pin_alloc
            .reset_to(max_pin.map(|id| id + 1).unwrap_or(0));

        log::debug!("Gatter {} ({}) entfernt", id, removed.kind.name());
        self.rebuild_spatial_index();
        true
    }

    // ─── Wires ───────────────────────────────────────────────────────────

    /// Verbindet zwei Pins mit einem Wire.
    ///
    /// Selbstverbindungen, unbekannte Pins und Duplikate werden still
    /// abgelehnt — ein fehlgeschlagener Drag ist kein Fehlerzustand.
    pub fn add_wire(&mut self, a: PinId, b: PinId, points: Vec<Vec2>) -> bool {
        if a == b
            || self.find_pin(a).is_none()
            || self.find_pin(b).is_none()
            || self.wires.iter().any(|w| w.connects(a, b))
        {
            return false;
        }

        if let Some(pin) = self.find_pin_mut(a) {
            pin.attach(b);
        }
        if let Some(pin) = self.find_pin_mut(b) {
            pin.attach(a);
        }
        self.wires.push(Wire::new(a, b, points));
        true
    }

    /// Entfernt das Wire zwischen zwei Pins und löst beide Attachments
    pub fn remove_wire(&mut self, a: PinId, b: PinId) -> bool {
        let Some(index) = self.wires.iter().position(|w| w.connects(a, b)) else {
            return false;
        };
        self.wires.remove(index);

        if let Some(pin) = self.find_pin_mut(a) {
            pin.detach(b);
        }
        if let Some(pin) = self.find_pin_mut(b) {
            pin.detach(a);
        }
        true
    }

    // ─── Bus-Operationen ─────────────────────────────────────────────────

    /// Fügt einer Bus-Schiene einen Pin hinzu.
    ///
    /// Der Punkt muss im Schienen-Rechteck liegen und entlang der langen
    /// Kante mindestens 30 Einheiten von beiden Enden entfernt sein.
    pub fn add_bus_pin(
        &mut self,
        gate: GateId,
        point: Vec2,
        direction: PinDirection,
    ) -> Option<PinId> {
        let index = self
            .gates
            .iter()
            .position(|g| g.id == gate && matches!(g.kind, GateKind::Bus { .. }))?;
        let rect = self.gates[index].rect;

        if !rect.contains(point) {
            return None;
        }
        let along_long_edge = if rect.w >= rect.h {
            point.x >= rect.x + BUS_PIN_MARGIN && point.x <= rect.max_x() - BUS_PIN_MARGIN
        } else {
            point.y >= rect.y + BUS_PIN_MARGIN && point.y <= rect.max_y() - BUS_PIN_MARGIN
        };
        if !along_long_edge {
            return None;
        }

        let id = self.pin_alloc.allocate();
        self.gates[index].pins.push(Pin::new(
            id,
            Rect::new(
                point.x - PIN_SIZE * 0.5,
                point.y - PIN_SIZE * 0.5,
                PIN_SIZE,
                PIN_SIZE,
            ),
            direction,
        ));
        self.rebuild_spatial_index();
        Some(id)
    }

    /// Entfernt einen Bus-Pin mitsamt anhängenden Wires.
    ///
    /// Nur Bus-Pins sind einzeln löschbar; die Pins der übrigen Gatter
    /// stehen per Variante fest.
    pub fn remove_pin(&mut self, pin: PinId) -> bool {
        let owns = self.gates.iter().any(|g| {
            matches!(g.kind, GateKind::Bus { .. }) && g.pins.iter().any(|p| p.id == pin)
        });
        if !owns {
            return false;
        }

        self.wires.retain(|w| !w.touches(pin));
        for gate in &mut self.gates {
            for p in &mut gate.pins {
                p.detach(pin);
            }
            if matches!(gate.kind, GateKind::Bus { .. }) {
                gate.pins.retain(|p| p.id != pin);
            }
        }
        self.pin_alloc.release_if_latest(pin);
        self.rebuild_spatial_index();
        true
    }

    /// Verbindet zwei Bus-Schienen (transitiv wirksam)
    pub fn connect_buses(&mut self, a: GateId, b: GateId) -> bool {
        let Some(bus_a) = self.gate(a).and_then(Gate::bus_id) else {
            return false;
        };
        let Some(bus_b) = self.gate(b).and_then(Gate::bus_id) else {
            return false;
        };
        bus::connect(&mut self.gates, bus_a, bus_b)
    }

    /// Löst alle Verbindungen einer Bus-Schiene
    pub fn clear_bus_connections(&mut self, gate: GateId) -> bool {
        let Some(bus_id) = self.gate(gate).and_then(Gate::bus_id) else {
            return false;
        };
        bus::clear_connections(&mut self.gates, bus_id)
    }

    // ─── Zustand und Edits ───────────────────────────────────────────────

    /// Kippt den Zustand eines Switch; gibt den neuen Zustand zurück
    pub fn toggle_switch(&mut self, id: GateId) -> Option<bool> {
        let gate = self.gate_mut(id)?;
        let next = !gate.switch_is_on()?;
        gate.set_switch(next);
        Some(next)
    }

    /// Setzt den Zustand eines Switch direkt
    pub fn set_switch(&mut self, id: GateId, on: bool) -> bool {
        self.gate_mut(id).map(|g| g.set_switch(on)).unwrap_or(false)
    }

    /// Setzt das Label eines Gatters
    pub fn set_label(&mut self, id: GateId, label: &str) -> bool {
        match self.gate_mut(id) {
            Some(gate) => {
                gate.label = label.to_string();
                true
            }
            None => false,
        }
    }

    /// Verschiebt ein Gatter samt Pins um ein Delta
    pub fn move_gate(&mut self, id: GateId, delta: Vec2) -> bool {
        let moved = match self.gate_mut(id) {
            Some(gate) => {
                gate.move_by(delta);
                true
            }
            None => false,
        };
        if moved {
            self.rebuild_spatial_index();
        }
        moved
    }

    /// Schaltet die Versorgung um
    pub fn toggle_power(&mut self) -> bool {
        self.set_power(!self.power);
        self.power
    }

    /// Setzt die Versorgung.
    ///
    /// Ausschalten zwingt sämtliche Signale auf low und löscht auch den
    /// gespeicherten Zustand (Switch-Stellung, Ein-Tick-Gedächtnis der
    /// verzögerten Gatter) — nach einem Power-Zyklus startet die Schaltung
    /// neutral, kein Signal kehrt von selbst zurück. Wirkt rekursiv in
    /// eingebettete Chips.
    pub fn set_power(&mut self, on: bool) {
        self.power = on;
        if on {
            return;
        }

        log::debug!("Power aus: {} Gatter werden entladen", self.gates.len());
        for gate in &mut self.gates {
            for pin in &mut gate.pins {
                pin.force_low();
            }
            match &mut gate.kind {
                GateKind::And { last_value } | GateKind::TriStateBuffer { last_value } => {
                    *last_value = false;
                }
                GateKind::Switch { on } => {
                    *on = false;
                    gate.color = Color::RED;
                }
                GateKind::Chip(state) => {
                    state.inner.set_power(false);
                }
                _ => {}
            }
        }
    }

    /// Entfernt alles und setzt sämtliche ID-Vergaben zurück
    pub fn clear(&mut self) {
        log::debug!(
            "Schaltung geleert ({} Gatter, {} Wires)",
            self.gates.len(),
            self.wires.len()
        );
        self.gates.clear();
        self.wires.clear();
        self.power = true;
        self.pin_alloc = PinAllocator::new();
        self.next_bus_id = 0;
        self.next_gate_id = 0;
        self.spatial = SpatialIndex::empty();
    }

    /// Führt einen Propagationsschritt aus
    pub fn step(&mut self) {
        crate::core::engine::step(self);
    }

    // ─── Abfragen ────────────────────────────────────────────────────────

    /// Hit-Test: Pin unter dem Punkt (über den Spatial-Index)
    pub fn pin_at(&self, point: Vec2) -> Option<PinId> {
        self.spatial.pin_at(point)
    }

    /// Hit-Test: Gatter unter dem Punkt; bei Überlappung gewinnt das
    /// zuletzt platzierte
    pub fn gate_at(&self, point: Vec2) -> Option<GateId> {
        self.gates
            .iter()
            .rev()
            .find(|g| g.rect.contains(point))
            .map(|g| g.id)
    }

    /// Sucht einen Pin über alle Gatter
    pub fn find_pin(&self, id: PinId) -> Option<&Pin> {
        self.gates.iter().find_map(|g| g.pin(id))
    }

    /// Sucht einen Pin über alle Gatter (mutabel)
    pub fn find_pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.gates.iter_mut().find_map(|g| g.pin_mut(id))
    }

    /// Gatter, dem der Pin gehört
    pub fn pin_owner(&self, pin: PinId) -> Option<GateId> {
        self.gates
            .iter()
            .find(|g| g.pin(pin).is_some())
            .map(|g| g.id)
    }

    /// Leuchtet die Lampe? `None` für Nicht-Lampen
    pub fn is_lit(&self, id: GateId) -> Option<bool> {
        let gate = self.gate(id)?;
        match gate.kind {
            GateKind::Light => Some(gate.pins.first().map(Pin::signal).unwrap_or(false)),
            _ => None,
        }
    }

    /// Segmentzustände a–g plus Dezimalpunkt einer 7-Segment-Anzeige
    pub fn segments(&self, id: GateId) -> Option<[bool; 8]> {
        let gate = self.gate(id)?;
        match gate.kind {
            GateKind::Display7 => {
                let mut segments = [false; 8];
                for (slot, pin) in segments.iter_mut().zip(&gate.pins) {
                    *slot = pin.signal();
                }
                Some(segments)
            }
            _ => None,
        }
    }

    /// Tooltip-Label eines Pins: bei Chip-Pins das Label des inneren
    /// Grenz-Gatters, sonst keins
    pub fn pin_label(&self, pin: PinId) -> Option<&str> {
        let gate = self.gates.iter().find(|g| g.pin(pin).is_some())?;
        let GateKind::Chip(state) = &gate.kind else {
            return None;
        };
        let index = gate.pins.iter().position(|p| p.id == pin)?;
        state.pin_label(index)
    }

    /// Baut den Pin-Spatial-Index neu (nach jedem strukturellen Edit)
    pub(crate) fn rebuild_spatial_index(&mut self) {
        self.spatial = SpatialIndex::from_gates(&self.gates);
    }
}
