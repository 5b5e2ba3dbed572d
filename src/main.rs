//! Logik-Simulator CLI.
//!
//! Lädt eine Schaltungs-Datei, lässt die Propagation einschwingen und
//! gibt den Zustand aller Senken (Lampen, 7-Segment-Anzeigen) aus.
//! Chip-Abhängigkeiten werden im Verzeichnis der Schaltung (oder einem
//! explizit angegebenen Verzeichnis) aufgelöst.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use logicsim::core::GateKind;
use logicsim::{read_circuit, ChipLibrary};

/// Chip-Library über einem Verzeichnis: `fileName` → Dateiinhalt
struct DirLibrary {
    dir: PathBuf,
}

impl ChipLibrary for DirLibrary {
    fn resolve(&self, file_name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.join(file_name)).ok()
    }
}

fn main() -> Result<()> {
    // Logger initialisieren
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let mut args = std::env::args().skip(1);
    let Some(file) = args.next() else {
        bail!("Aufruf: logicsim <schaltung.json> [chip-verzeichnis] [schritte]");
    };
    let file = PathBuf::from(file);
    let deps_dir = args
        .next()
        .map(PathBuf::from)
        .or_else(|| file.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let steps: usize = match args.next() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("ungültige Schrittzahl: {raw}"))?,
        None => 64,
    };

    log::info!(
        "logicsim v{}: lade {}",
        env!("CARGO_PKG_VERSION"),
        file.display()
    );

    let text = std::fs::read_to_string(&file)
        .with_context(|| format!("Schaltung {} nicht lesbar", file.display()))?;
    let library = DirLibrary { dir: deps_dir };
    let mut circuit = read_circuit(&text, &library)
        .with_context(|| format!("Schaltung {} nicht ladbar", file.display()))?;

    for _ in 0..steps {
        circuit.step();
    }

    let gate_ids: Vec<_> = circuit.gates().iter().map(|g| g.id).collect();
    for id in gate_ids {
        let Some(gate) = circuit.gate(id) else {
            continue;
        };
        match &gate.kind {
            GateKind::Light => {
                let lit = circuit.is_lit(id).unwrap_or(false);
                println!("{}: {}", gate.label, if lit { "an" } else { "aus" });
            }
            GateKind::Display7 => {
                let segments = circuit.segments(id).unwrap_or_default();
                let rendered: String = segments
                    .iter()
                    .zip(["a", "b", "c", "d", "e", "f", "g", "dp"])
                    .filter(|(on, _)| **on)
                    .map(|(_, name)| name)
                    .collect::<Vec<_>>()
                    .join("+");
                println!("{}: [{}]", gate.label, rendered);
            }
            _ => {}
        }
    }

    Ok(())
}
