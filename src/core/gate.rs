//! Gatter: Schaltungsknoten mit fester Funktion und Pin-Satz.
//!
//! Die Varianten sind als geschlossenes `GateKind`-Enum modelliert und
//! werden zentral in der Engine ausgewertet; Bus und Chip tragen ihren
//! Zusatzzustand (Verbindungsmenge bzw. eingebettete Schaltung) inline.

use glam::Vec2;
use indexmap::IndexSet;

use crate::core::bus::BusId;
use crate::core::chip::ChipState;
use crate::core::{Color, Pin, PinAllocator, PinDirection, PinId, Rect};

/// Laufzeit-Handle eines Gatters; wird nie serialisiert
pub type GateId = u32;

/// Kantenlänge der Pin-Rechtecke
pub const PIN_SIZE: f32 = 15.0;

/// Variante eines Gatters samt variantenspezifischem Zustand
#[derive(Debug, Clone)]
pub enum GateKind {
    /// Umschaltbare Signalquelle; der Zustand wird von außen gesetzt,
    /// nicht durch Propagation
    Switch { on: bool },
    /// Reine Senke mit einem Input-Pin
    Light,
    /// Invertierer
    Not,
    /// UND-Verknüpfung; `last_value` hält den zuletzt berechneten Output
    /// fest, damit Rückkopplungen über Schritte konvergieren statt in einem
    /// Durchlauf zu rekursieren
    And { last_value: bool },
    /// Tri-State-Puffer: Control-Pin low trennt den Output ab (high-Z)
    TriStateBuffer { last_value: bool },
    /// 7-Segment-Anzeige (Segmente a–g plus Dezimalpunkt), reine Senke
    Display7,
    /// Verteilerschiene mit dynamischen Pins; `connections` verbindet
    /// Busse transitiv zu einer gemeinsamen Signaldomäne
    Bus {
        bus_id: BusId,
        connections: IndexSet<BusId>,
    },
    /// Black-Box um eine eingebettete Schaltung
    Chip(Box<ChipState>),
}

impl GateKind {
    /// Name der Variante im Interchange-Format
    pub fn name(&self) -> &'static str {
        match self {
            GateKind::Switch { .. } => "SWITCH",
            GateKind::Light => "LIGHT",
            GateKind::Not => "NOT",
            GateKind::And { .. } => "AND",
            GateKind::TriStateBuffer { .. } => "3SBUFFER",
            GateKind::Display7 => "DISPLAY7",
            GateKind::Bus { .. } => "BUS",
            GateKind::Chip(_) => "CHIP",
        }
    }
}

/// Ein Schaltungsknoten: Variante, Geometrie, Label und Pins.
///
/// Pin-Anzahl und Richtungs-Layout stehen pro Variante bei Konstruktion
/// fest; nur Busse wachsen und schrumpfen dynamisch.
#[derive(Debug, Clone)]
pub struct Gate {
    /// Laufzeit-Handle (nicht serialisiert)
    pub id: GateId,
    /// Lage und Ausdehnung
    pub rect: Rect,
    /// Anzeigefarbe; Switches spiegeln ihren Schaltzustand
    pub color: Color,
    /// Frei editierbares Label
    pub label: String,
    /// Pins in fester Reihenfolge
    pub pins: Vec<Pin>,
    /// Variante samt Zusatzzustand
    pub kind: GateKind,
}

impl Gate {
    /// Schalter: 50×50, ein Output-Pin rechts
    pub fn switch(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 50.0, 50.0);
        let pins = vec![Pin::new(
            alloc.allocate(),
            Rect::new(rect.max_x() - 7.0, rect.y + 7.0, PIN_SIZE, PIN_SIZE),
            PinDirection::Output,
        )];
        Self {
            id,
            rect,
            color: Color::RED,
            label: "Switch".to_string(),
            pins,
            kind: GateKind::Switch { on: false },
        }
    }

    /// Lampe: 50×50, ein Input-Pin links
    pub fn light(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 50.0, 50.0);
        let pins = vec![Pin::new(
            alloc.allocate(),
            Rect::new(rect.x - 7.0, rect.y + 7.0, PIN_SIZE, PIN_SIZE),
            PinDirection::Input,
        )];
        Self {
            id,
            rect,
            color: Color::DARK_GRAY,
            label: "Light".to_string(),
            pins,
            kind: GateKind::Light,
        }
    }

    /// NOT-Gatter: 100×50, Input links, Output rechts
    pub fn not(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 100.0, 50.0);
        let pins = vec![
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.x - 7.0, rect.y + 15.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Input,
            ),
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.max_x() - 7.0, rect.y + 15.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Output,
            ),
        ];
        Self {
            id,
            rect,
            color: Color::ORANGE,
            label: "Not gate".to_string(),
            pins,
            kind: GateKind::Not,
        }
    }

    /// AND-Gatter: 100×50, zwei Inputs links, Output rechts
    pub fn and(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 100.0, 50.0);
        let pins = vec![
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.x - 7.0, rect.y + 5.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Input,
            ),
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.x - 7.0, rect.y + 25.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Input,
            ),
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.max_x() - 7.0, rect.y + 15.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Output,
            ),
        ];
        Self {
            id,
            rect,
            color: Color::BLUE,
            label: "And gate".to_string(),
            pins,
            kind: GateKind::And { last_value: false },
        }
    }

    /// Tri-State-Puffer: 100×50, Input links, Control oben, Output rechts
    pub fn tri_state_buffer(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 100.0, 50.0);
        let pins = vec![
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.x - 7.0, rect.y + 15.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Input,
            ),
            Pin::new(
                alloc.allocate(),
                Rect::new(
                    rect.x + rect.w * 0.5 - PIN_SIZE * 0.5,
                    rect.y - 7.0,
                    PIN_SIZE,
                    PIN_SIZE,
                ),
                PinDirection::Input,
            ),
            Pin::new(
                alloc.allocate(),
                Rect::new(rect.max_x() - 7.0, rect.y + 15.0, PIN_SIZE, PIN_SIZE),
                PinDirection::Output,
            ),
        ];
        Self {
            id,
            rect,
            color: Color::GRAY,
            label: "Tri-state buffer".to_string(),
            pins,
            kind: GateKind::TriStateBuffer { last_value: false },
        }
    }

    /// 7-Segment-Anzeige: 100×170, acht Input-Pins entlang der linken Kante
    pub fn display7(id: GateId, origin: Vec2, alloc: &mut PinAllocator) -> Self {
        let rect = Rect::new(origin.x, origin.y, 100.0, 170.0);
        let pins = (0..8)
            .map(|segment| {
                Pin::new(
                    alloc.allocate(),
                    Rect::new(
                        rect.x - 7.0,
                        rect.y + 5.0 + segment as f32 * 20.0,
                        PIN_SIZE,
                        PIN_SIZE,
                    ),
                    PinDirection::Input,
                )
            })
            .collect();
        Self {
            id,
            rect,
            color: Color::DARK_GRAY,
            label: "7-segment display".to_string(),
            pins,
            kind: GateKind::Display7,
        }
    }

    /// Chip: Black-Box um eine geladene Teilschaltung; externe Pins folgen
    /// der Port-Projektion des Chip-Zustands
    pub fn chip(id: GateId, origin: Vec2, state: ChipState, alloc: &mut PinAllocator) -> Self {
        let rows = state.inputs.len().max(state.outputs.len());
        let rect = crate::core::chip::chip_rect(origin, rows);
        let pins =
            crate::core::chip::external_pins(rect, state.inputs.len(), state.outputs.len(), alloc);
        let label = state.chip_name.clone();
        Self {
            id,
            rect,
            color: Color::GRAY,
            label,
            pins,
            kind: GateKind::Chip(Box::new(state)),
        }
    }

    /// Bus: frei dimensionierte Schiene, startet ohne Pins
    pub fn bus(id: GateId, rect: Rect, bus_id: BusId) -> Self {
        Self {
            id,
            rect,
            color: Color::GRAY,
            label: "Bus".to_string(),
            pins: Vec::new(),
            kind: GateKind::Bus {
                bus_id,
                connections: IndexSet::new(),
            },
        }
    }

    /// Setzt den Schaltzustand eines Switch; die Farbe folgt dem Zustand
    pub fn set_switch(&mut self, value: bool) -> bool {
        if let GateKind::Switch { on } = &mut self.kind {
            *on = value;
            self.color = if value { Color::GREEN } else { Color::RED };
            true
        } else {
            false
        }
    }

    /// Schaltzustand, falls das Gatter ein Switch ist
    pub fn switch_is_on(&self) -> Option<bool> {
        match &self.kind {
            GateKind::Switch { on } => Some(*on),
            _ => None,
        }
    }

    /// Bus-ID, falls das Gatter ein Bus ist
    pub fn bus_id(&self) -> Option<BusId> {
        match &self.kind {
            GateKind::Bus { bus_id, .. } => Some(*bus_id),
            _ => None,
        }
    }

    /// Verbindungsmenge, falls das Gatter ein Bus ist
    pub fn bus_connections(&self) -> Option<&IndexSet<BusId>> {
        match &self.kind {
            GateKind::Bus { connections, .. } => Some(connections),
            _ => None,
        }
    }

    /// Sucht einen Pin nach ID
    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.iter().find(|p| p.id == id)
    }

    /// Sucht einen Pin nach ID (mutabel)
    pub fn pin_mut(&mut self, id: PinId) -> Option<&mut Pin> {
        self.pins.iter_mut().find(|p| p.id == id)
    }

    /// Hit-Test: Pin unter dem Punkt
    pub fn pin_at(&self, point: Vec2) -> Option<PinId> {
        self.pins
            .iter()
            .find(|p| p.rect.contains(point))
            .map(|p| p.id)
    }

    /// Verschiebt Gatter und alle Pins um dasselbe Delta
    pub fn move_by(&mut self, delta: Vec2) {
        self.rect.translate(delta);
        for pin in &mut self.pins {
            pin.rect.translate(delta);
        }
    }
}
