//! Integrationstests für Chips:
//! - Definition speichern, einbetten, durchsimulieren
//! - fehlende und rekursive Abhängigkeiten
//! - ID-Vergabe beim Einbetten

use std::collections::HashMap;

use glam::Vec2;
use logicsim::core::PinId;
use logicsim::{instantiate_chip, read_circuit, write_chip, Circuit, Color, GateKind, LoadError};

/// Chips verdoppeln die Laufzeit pro Ebene, darum großzügig einschwingen
const SETTLE: usize = 24;

fn settle(circuit: &mut Circuit) {
    for _ in 0..SETTLE {
        circuit.step();
    }
}

/// Baut eine Inverter-Definition: Switch "IN" → NOT → Light "OUT"
fn inverter_definition() -> String {
    let mut inner = Circuit::new();
    let switch = inner.place_switch(Vec2::new(0.0, 0.0));
    let not = inner.place_not(Vec2::new(200.0, 0.0));
    let light = inner.place_light(Vec2::new(400.0, 0.0));
    inner.set_label(switch, "IN");
    inner.set_label(light, "OUT");

    let s_out = inner.gate(switch).unwrap().pins[0].id;
    let n_in = inner.gate(not).unwrap().pins[0].id;
    let n_out = inner.gate(not).unwrap().pins[1].id;
    let l_in = inner.gate(light).unwrap().pins[0].id;
    inner.add_wire(s_out, n_in, Vec::new());
    inner.add_wire(n_out, l_in, Vec::new());

    write_chip(&inner, "Inverter", Color::YELLOW).expect("Definition serialisierbar")
}

fn library_with_inverter() -> HashMap<String, String> {
    let mut library = HashMap::new();
    library.insert("inverter.lsim".to_string(), inverter_definition());
    library
}

// ─── Einbetten und Simulieren ────────────────────────────────────────────────

#[test]
fn test_chip_invertiert_durch_die_blackbox() {
    let library = library_with_inverter();
    let mut host = Circuit::new();
    let switch = host.place_switch(Vec2::new(0.0, 0.0));
    let light = host.place_light(Vec2::new(600.0, 0.0));

    let chip = instantiate_chip(&mut host, "inverter.lsim", Vec2::new(250.0, 0.0), &library)
        .expect("Definition vorhanden");

    let chip_gate = host.gate(chip).unwrap();
    assert_eq!(chip_gate.pins.len(), 2, "1 Input + 1 Output projiziert");
    assert_eq!(chip_gate.label, "Inverter");
    let chip_in = chip_gate.pins[0].id;
    let chip_out = chip_gate.pins[1].id;

    let s_out = host.gate(switch).unwrap().pins[0].id;
    let l_in = host.gate(light).unwrap().pins[0].id;
    host.add_wire(s_out, chip_in, Vec::new());
    host.add_wire(chip_out, l_in, Vec::new());

    // Host-Switch aus: der Inverter liefert high
    settle(&mut host);
    assert_eq!(host.is_lit(light), Some(true));

    host.toggle_switch(switch);
    settle(&mut host);
    assert_eq!(host.is_lit(light), Some(false));

    host.toggle_switch(switch);
    settle(&mut host);
    assert_eq!(host.is_lit(light), Some(true));
}

#[test]
fn test_chip_pins_tragen_die_inneren_labels() {
    let library = library_with_inverter();
    let mut host = Circuit::new();
    let chip = instantiate_chip(&mut host, "inverter.lsim", Vec2::ZERO, &library).unwrap();

    let pins: Vec<PinId> = host.gate(chip).unwrap().pins.iter().map(|p| p.id).collect();
    assert_eq!(host.pin_label(pins[0]), Some("IN"));
    assert_eq!(host.pin_label(pins[1]), Some("OUT"));
}

#[test]
fn test_power_aus_entlaedt_auch_den_chip() {
    let library = library_with_inverter();
    let mut host = Circuit::new();
    let light = host.place_light(Vec2::new(600.0, 0.0));
    let chip = instantiate_chip(&mut host, "inverter.lsim", Vec2::new(250.0, 0.0), &library)
        .expect("Definition vorhanden");
    let chip_out = host.gate(chip).unwrap().pins[1].id;
    let l_in = host.gate(light).unwrap().pins[0].id;
    host.add_wire(chip_out, l_in, Vec::new());

    settle(&mut host);
    assert_eq!(host.is_lit(light), Some(true));

    host.set_power(false);
    settle(&mut host);
    assert_eq!(host.is_lit(light), Some(false));

    let GateKind::Chip(state) = &host.gate(chip).unwrap().kind else {
        panic!("Chip erwartet");
    };
    assert!(
        state
            .inner
            .gates()
            .iter()
            .flat_map(|g| g.pins.iter())
            .all(|p| !p.signal()),
        "Auch innere Pins müssen stromlos low sein"
    );
}

// ─── Abhängigkeiten ──────────────────────────────────────────────────────────

#[test]
fn test_fehlende_abhaengigkeit_bricht_den_ganzen_ladevorgang_ab() {
    let doc = r#"{"gates": [
        {"name": "SWITCH", "rect": {"x": 0, "y": 0, "w": 50, "h": 50}, "label": "Switch",
         "pins": [{"id": 0, "rect": {"x": 43, "y": 7, "w": 15, "h": 15}, "doInput": false, "attached": []}]},
        {"name": "CHIP", "rect": {"x": 200, "y": 0, "w": 125, "h": 40}, "label": "",
         "fileName": "missing.lsim", "pins": []}
    ], "wires": []}"#;

    let err = read_circuit(doc, &HashMap::new()).unwrap_err();
    assert!(matches!(err, LoadError::MissingDependency(name) if name == "missing.lsim"));
}

#[test]
fn test_selbsteinbettung_wird_erkannt() {
    let mut library = HashMap::new();
    library.insert(
        "a.lsim".to_string(),
        r#"{"gates": [{"name": "CHIP", "rect": {"x": 0, "y": 0, "w": 125, "h": 40},
            "label": "", "fileName": "a.lsim", "pins": []}], "wires": []}"#
            .to_string(),
    );

    let mut host = Circuit::new();
    let err = instantiate_chip(&mut host, "a.lsim", Vec2::ZERO, &library).unwrap_err();
    assert!(matches!(err, LoadError::RecursiveChip(name) if name == "a.lsim"));
    assert!(host.gates().is_empty(), "Host bleibt unberührt");
}

#[test]
fn test_wechselseitige_einbettung_wird_erkannt() {
    let mut library = HashMap::new();
    library.insert(
        "a.lsim".to_string(),
        r#"{"gates": [{"name": "CHIP", "rect": {"x": 0, "y": 0, "w": 125, "h": 40},
            "label": "", "fileName": "b.lsim", "pins": []}], "wires": []}"#
            .to_string(),
    );
    library.insert(
        "b.lsim".to_string(),
        r#"{"gates": [{"name": "CHIP", "rect": {"x": 0, "y": 0, "w": 125, "h": 40},
            "label": "", "fileName": "a.lsim", "pins": []}], "wires": []}"#
            .to_string(),
    );

    let mut host = Circuit::new();
    let err = instantiate_chip(&mut host, "a.lsim", Vec2::ZERO, &library).unwrap_err();
    assert!(matches!(err, LoadError::RecursiveChip(name) if name == "a.lsim"));
}

// ─── ID-Vergabe ──────────────────────────────────────────────────────────────

#[test]
fn test_einbetten_vergibt_kollisionsfreie_pin_ids() {
    let library = library_with_inverter();
    let mut host = Circuit::new();
    host.place_switch(Vec2::new(0.0, 0.0));
    host.place_and(Vec2::new(0.0, 100.0));

    let chip = instantiate_chip(&mut host, "inverter.lsim", Vec2::new(250.0, 0.0), &library)
        .expect("Definition vorhanden");

    let mut seen: Vec<PinId> = host
        .gates()
        .iter()
        .flat_map(|g| g.pins.iter())
        .map(|p| p.id)
        .collect();
    let GateKind::Chip(state) = &host.gate(chip).unwrap().kind else {
        panic!("Chip erwartet");
    };
    seen.extend(
        state
            .inner
            .gates()
            .iter()
            .flat_map(|g| g.pins.iter())
            .map(|p| p.id),
    );

    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), total, "Keine Pin-ID darf doppelt vergeben sein");

    // Nach dem Einbetten platzierte Gatter kollidieren ebenfalls nicht
    let late = host.place_switch(Vec2::new(0.0, 300.0));
    let late_pin = host.gate(late).unwrap().pins[0].id;
    assert!(!seen.contains(&late_pin));
}

#[test]
fn test_dokument_chip_kollidiert_nicht_mit_aussen_pins() {
    // CHIP mit niedrigen, übernommenen Außen-Pin-IDs: die eingebettete
    // Schaltung darf beim Umnummerieren nicht dieselben IDs erhalten
    let doc = r#"{"gates": [
        {"name": "CHIP", "rect": {"x": 200, "y": 0, "w": 125, "h": 40}, "label": "Inverter",
         "fileName": "inverter.lsim", "pins": [
            {"id": 0, "rect": {"x": 193, "y": 10, "w": 15, "h": 15}, "doInput": true, "attached": []},
            {"id": 1, "rect": {"x": 318, "y": 10, "w": 15, "h": 15}, "doInput": false, "attached": []}
         ]}
    ], "wires": []}"#;

    let circuit = read_circuit(doc, &library_with_inverter()).expect("ladbar");

    let mut seen: Vec<PinId> = circuit
        .gates()
        .iter()
        .flat_map(|g| g.pins.iter())
        .map(|p| p.id)
        .collect();
    let GateKind::Chip(state) = &circuit.gates()[0].kind else {
        panic!("Chip erwartet");
    };
    seen.extend(
        state
            .inner
            .gates()
            .iter()
            .flat_map(|g| g.pins.iter())
            .map(|p| p.id),
    );

    let total = seen.len();
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(
        seen.len(),
        total,
        "Pin-IDs müssen über die Verschachtelung hinweg eindeutig sein"
    );
}
