//! Propagations-Engine: ein diskreter Simulationsschritt.
//!
//! Pro Schritt wird jedes Gatter genau einmal besucht, in
//! Einfüge-Reihenfolge. Je Gatter laufen zwei Phasen: erst schieben seine
//! Output-Pins ihre Pegel zu allen angehängten Pins, dann wertet die
//! Variante ihre Funktion aus. Signale wandern so höchstens ein Gatter
//! pro Schritt weiter; stabile Schaltungen erreichen nach endlich vielen
//! Schritten einen Fixpunkt, Rückkopplungen oszillieren kontrolliert
//! statt endlos zu rekursieren.

use crate::core::bus;
use crate::core::gate::{Gate, GateKind};
use crate::core::{Circuit, Pin, PinId};

/// Führt einen Simulationsschritt über die ganze Schaltung aus
pub(crate) fn step(circuit: &mut Circuit) {
    for index in 0..circuit.gates.len() {
        propagate_outputs(circuit, index);
        evaluate(circuit, index);
    }
}

/// Phase 1: Output-Pins des Gatters treiben ihre angehängten Pins.
///
/// High gewinnt immer; low überschreibt nur, wenn kein anderer aktiver
/// Output-Pin am Ziel hängt (ODER-Mischung bei Fan-in). Die
/// Verbundenheit wird mitkopiert, damit ein high-Z-Ausgang seine
/// Abnehmer ebenfalls floaten lässt.
fn propagate_outputs(circuit: &mut Circuit, index: usize) {
    let power = circuit.power;
    let sources: Vec<(bool, bool, Vec<PinId>)> = circuit.gates[index]
        .pins
        .iter()
        .filter(|p| !p.direction.is_input())
        .map(|p| {
            (
                p.signal(),
                p.is_connected(),
                p.attached.iter().copied().collect(),
            )
        })
        .collect();

    for (signal, connected, attached) in sources {
        for target in attached {
            let held_high = !signal && has_live_driver(circuit, target);
            let Some(pin) = circuit.find_pin_mut(target) else {
                continue;
            };
            if signal {
                pin.set_signal(true, power);
            } else if !held_high {
                pin.set_signal(false, power);
            }
            pin.set_connected(connected, power);
        }
    }
}

/// Hängt am Ziel-Pin noch ein anderer Output-Pin mit high?
fn has_live_driver(circuit: &Circuit, target: PinId) -> bool {
    let Some(pin) = circuit.find_pin(target) else {
        return false;
    };
    pin.attached.iter().any(|&other| {
        circuit
            .find_pin(other)
            .is_some_and(|p| p.signal() && !p.direction.is_input())
    })
}

/// Phase 2: variantenspezifische Auswertung
fn evaluate(circuit: &mut Circuit, index: usize) {
    let power = circuit.power;

    if matches!(circuit.gates[index].kind, GateKind::Bus { .. }) {
        evaluate_bus(circuit, index);
        return;
    }

    let Gate { pins, kind, .. } = &mut circuit.gates[index];
    match kind {
        GateKind::Switch { on } => {
            let on = *on;
            if let Some(out) = pins.first_mut() {
                out.set_signal(on, power);
            }
        }
        // Reine Senken; ihr Zustand ist das Signal ihrer Input-Pins
        GateKind::Light | GateKind::Display7 => {}
        GateKind::Not => {
            let v = !pins[0].signal();
            if let Some(out) = pins.get_mut(1) {
                out.set_signal(v, power);
            }
        }
        GateKind::And { last_value } => {
            // Inputs tragen die Werte, die bis zu diesem Gatter propagiert
            // wurden; der Output wird genau einmal pro Schritt geschrieben
            let v = pins[0].signal() && pins[1].signal();
            if let Some(out) = pins.get_mut(2) {
                out.set_signal(v, power);
            }
            *last_value = v;
        }
        GateKind::TriStateBuffer { last_value } => {
            let input = pins[0].signal();
            let control = pins[1].signal();
            let v = input && control;
            if let Some(out) = pins.get_mut(2) {
                // Control low trennt den Output ab (high-Z, zwingt low)
                out.set_connected(control, power);
                out.set_signal(v, power);
            }
            *last_value = v;
        }
        GateKind::Chip(state) => {
            if state.inner.power() != power {
                state.inner.set_power(power);
            }

            // Außen → innen: externe Inputs stellen die inneren Switches
            let input_values: Vec<bool> = pins
                .iter()
                .take(state.inputs.len())
                .map(|p| p.signal())
                .collect();
            for (port, value) in state.inputs.iter().zip(input_values) {
                if let Some(gate) = state.inner.gate_mut(port.gate) {
                    gate.set_switch(value);
                }
            }

            step(&mut state.inner);

            // Innen → außen: innere Lampen treiben die externen Outputs
            let output_values: Vec<bool> = state
                .outputs
                .iter()
                .map(|port| {
                    state
                        .inner
                        .gate(port.gate)
                        .and_then(|g| g.pins.first())
                        .map(|p| p.signal())
                        .unwrap_or(false)
                })
                .collect();
            let n_inputs = state.inputs.len();
            for (offset, value) in output_values.into_iter().enumerate() {
                if let Some(out) = pins.get_mut(n_inputs + offset) {
                    out.set_signal(value, power);
                }
            }
        }
        GateKind::Bus { .. } => unreachable!("oben behandelt"),
    }
}

/// Bus-Auswertung: einmal pro Äquivalenzklasse.
///
/// Das in Einfüge-Reihenfolge erste Klassenmitglied mischt per ODER,
/// was von außen in die Klasse getrieben wird, und treibt das Ergebnis
/// auf alle Pins der Klasse. Gemischt wird nur externe Evidenz: ein
/// Klassen-Pin zählt, wenn ein angehängter fremder Output-Pin ihn aktiv
/// high hält. Die vom Bus selbst gesetzten Pegel fließen nicht zurück in
/// das ODER, sonst käme die Klasse nach dem ersten High nie wieder auf
/// low. Abgetrennte Pins tragen nichts bei, werden aber mitgetrieben,
/// soweit ihr Zustand das zulässt.
fn evaluate_bus(circuit: &mut Circuit, index: usize) {
    let power = circuit.power;
    let Some(bus_id) = circuit.gates[index].bus_id() else {
        return;
    };
    let class = bus::closure(&circuit.gates, bus_id);

    let first = circuit
        .gates
        .iter()
        .position(|g| g.bus_id().is_some_and(|b| class.contains(&b)));
    if first != Some(index) {
        return;
    }

    let merged = circuit
        .gates
        .iter()
        .filter(|g| g.bus_id().is_some_and(|b| class.contains(&b)))
        .flat_map(|g| g.pins.iter())
        .any(|p| p.is_connected() && has_external_high(circuit, p));

    for gate in &mut circuit.gates {
        if gate.bus_id().is_some_and(|b| class.contains(&b)) {
            for pin in &mut gate.pins {
                pin.set_signal(merged, power);
            }
        }
    }
}

/// Hält ein angehängter fremder Output-Pin diesen Bus-Pin aktiv high?
fn has_external_high(circuit: &Circuit, pin: &Pin) -> bool {
    pin.attached.iter().any(|&other| {
        circuit
            .find_pin(other)
            .is_some_and(|p| p.signal() && p.is_connected() && !p.direction.is_input())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{PinDirection, Rect};
    use glam::Vec2;

    /// Schritte bis zum sicheren Fixpunkt einer kleinen Schaltung
    const SETTLE: usize = 8;

    fn settle(circuit: &mut Circuit) {
        for _ in 0..SETTLE {
            circuit.step();
        }
    }

    #[test]
    fn signal_reaches_light_through_not_chain() {
        let mut circuit = Circuit::new();
        let switch = circuit.place_switch(Vec2::new(0.0, 0.0));
        let not = circuit.place_not(Vec2::new(200.0, 0.0));
        let light = circuit.place_light(Vec2::new(400.0, 0.0));
        let s_out = circuit.gate(switch).unwrap().pins[0].id;
        let n_in = circuit.gate(not).unwrap().pins[0].id;
        let n_out = circuit.gate(not).unwrap().pins[1].id;
        let l_in = circuit.gate(light).unwrap().pins[0].id;
        circuit.add_wire(s_out, n_in, Vec::new());
        circuit.add_wire(n_out, l_in, Vec::new());

        // Switch aus: NOT invertiert low zu high
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));

        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));
    }

    #[test]
    fn and_gate_needs_both_inputs() {
        let mut circuit = Circuit::new();
        let a = circuit.place_switch(Vec2::new(0.0, 0.0));
        let b = circuit.place_switch(Vec2::new(0.0, 100.0));
        let and = circuit.place_and(Vec2::new(200.0, 50.0));
        let light = circuit.place_light(Vec2::new(400.0, 50.0));
        circuit.add_wire(
            circuit.gate(a).unwrap().pins[0].id,
            circuit.gate(and).unwrap().pins[0].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(b).unwrap().pins[0].id,
            circuit.gate(and).unwrap().pins[1].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(and).unwrap().pins[2].id,
            circuit.gate(light).unwrap().pins[0].id,
            Vec::new(),
        );

        circuit.toggle_switch(a);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false), "Ein Input reicht nicht");

        circuit.toggle_switch(b);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.toggle_switch(a);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }

    #[test]
    fn tri_state_buffer_floats_without_control() {
        let mut circuit = Circuit::new();
        let data = circuit.place_switch(Vec2::new(0.0, 0.0));
        let ctrl = circuit.place_switch(Vec2::new(0.0, 100.0));
        let buffer = circuit.place_tri_state_buffer(Vec2::new(200.0, 0.0));
        let light = circuit.place_light(Vec2::new(400.0, 0.0));
        circuit.add_wire(
            circuit.gate(data).unwrap().pins[0].id,
            circuit.gate(buffer).unwrap().pins[0].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(ctrl).unwrap().pins[0].id,
            circuit.gate(buffer).unwrap().pins[1].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(buffer).unwrap().pins[2].id,
            circuit.gate(light).unwrap().pins[0].id,
            Vec::new(),
        );

        circuit.toggle_switch(data);
        settle(&mut circuit);
        assert_eq!(
            circuit.is_lit(light),
            Some(false),
            "Ohne Control bleibt der Output high-Z"
        );

        circuit.toggle_switch(ctrl);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.toggle_switch(ctrl);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }

    #[test]
    fn fan_in_merges_as_or() {
        let mut circuit = Circuit::new();
        let a = circuit.place_switch(Vec2::new(0.0, 0.0));
        let b = circuit.place_switch(Vec2::new(0.0, 100.0));
        let light = circuit.place_light(Vec2::new(200.0, 50.0));
        let l_in = circuit.gate(light).unwrap().pins[0].id;
        circuit.add_wire(circuit.gate(a).unwrap().pins[0].id, l_in, Vec::new());
        circuit.add_wire(circuit.gate(b).unwrap().pins[0].id, l_in, Vec::new());

        circuit.toggle_switch(a);
        circuit.toggle_switch(b);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        // Ein Treiber faellt weg, der andere haelt die Leitung high
        circuit.toggle_switch(a);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.toggle_switch(b);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }

    #[test]
    fn connected_buses_share_their_signal() {
        let mut circuit = Circuit::new();
        let bus_a = circuit.place_bus(Rect::new(0.0, 0.0, 300.0, 10.0));
        let bus_b = circuit.place_bus(Rect::new(0.0, 50.0, 300.0, 10.0));
        let bus_c = circuit.place_bus(Rect::new(0.0, 100.0, 300.0, 10.0));
        let switch = circuit.place_switch(Vec2::new(0.0, 200.0));
        let light = circuit.place_light(Vec2::new(400.0, 200.0));

        let feed = circuit
            .add_bus_pin(bus_a, Vec2::new(100.0, 5.0), PinDirection::Input)
            .unwrap();
        let tap = circuit
            .add_bus_pin(bus_c, Vec2::new(200.0, 105.0), PinDirection::Output)
            .unwrap();
        circuit.add_wire(circuit.gate(switch).unwrap().pins[0].id, feed, Vec::new());
        circuit.add_wire(tap, circuit.gate(light).unwrap().pins[0].id, Vec::new());

        // A–B und B–C: Signal muss transitiv von A nach C gelangen
        circuit.connect_buses(bus_a, bus_b);
        circuit.connect_buses(bus_b, bus_c);

        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));

        // Verbindung kappen: Signal endet bei A
        circuit.clear_bus_connections(bus_b);
        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }

    #[test]
    fn bus_releases_when_its_driver_drops() {
        let mut circuit = Circuit::new();
        let bus = circuit.place_bus(Rect::new(0.0, 0.0, 300.0, 10.0));
        let switch = circuit.place_switch(Vec2::new(0.0, 100.0));
        let light = circuit.place_light(Vec2::new(400.0, 100.0));
        let feed = circuit
            .add_bus_pin(bus, Vec2::new(100.0, 5.0), PinDirection::Input)
            .unwrap();
        let tap = circuit
            .add_bus_pin(bus, Vec2::new(200.0, 5.0), PinDirection::Output)
            .unwrap();
        circuit.add_wire(circuit.gate(switch).unwrap().pins[0].id, feed, Vec::new());
        circuit.add_wire(tap, circuit.gate(light).unwrap().pins[0].id, Vec::new());

        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        // Der einzige Treiber fällt weg: die Schiene muss wieder low werden,
        // die eigenen getriebenen Pegel dürfen sie nicht festhalten
        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }

    #[test]
    fn step_reaches_fixed_point() {
        let mut circuit = Circuit::new();
        let switch = circuit.place_switch(Vec2::new(0.0, 0.0));
        let and = circuit.place_and(Vec2::new(200.0, 0.0));
        let light = circuit.place_light(Vec2::new(400.0, 0.0));
        circuit.add_wire(
            circuit.gate(switch).unwrap().pins[0].id,
            circuit.gate(and).unwrap().pins[0].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(switch).unwrap().pins[0].id,
            circuit.gate(and).unwrap().pins[1].id,
            Vec::new(),
        );
        circuit.add_wire(
            circuit.gate(and).unwrap().pins[2].id,
            circuit.gate(light).unwrap().pins[0].id,
            Vec::new(),
        );
        circuit.toggle_switch(switch);
        settle(&mut circuit);

        let before: Vec<bool> = circuit
            .gates()
            .iter()
            .flat_map(|g| g.pins.iter())
            .map(|p| p.signal())
            .collect();
        circuit.step();
        let after: Vec<bool> = circuit
            .gates()
            .iter()
            .flat_map(|g| g.pins.iter())
            .map(|p| p.signal())
            .collect();
        assert_eq!(before, after, "Eingeschwungen darf sich nichts mehr ändern");
    }

    #[test]
    fn power_off_drains_every_signal() {
        let mut circuit = Circuit::new();
        let switch = circuit.place_switch(Vec2::new(0.0, 0.0));
        let light = circuit.place_light(Vec2::new(200.0, 0.0));
        circuit.add_wire(
            circuit.gate(switch).unwrap().pins[0].id,
            circuit.gate(light).unwrap().pins[0].id,
            Vec::new(),
        );
        circuit.toggle_switch(switch);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(true));

        circuit.set_power(false);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));

        // Power-Zyklus: nichts kehrt von allein zurück
        circuit.set_power(true);
        settle(&mut circuit);
        assert_eq!(circuit.is_lit(light), Some(false));
    }
}
