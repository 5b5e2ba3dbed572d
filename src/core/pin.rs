//! Pins: gerichtete Signal-Anschlüsse eines Gatters.
//!
//! Alle Querverweise zwischen Pins laufen über numerische IDs, nie über
//! Referenzen — das Löschen eines Gatters kann so keine hängenden Zeiger
//! hinterlassen.

use glam::Vec2;
use indexmap::IndexSet;

use crate::core::Rect;

/// Prozessweit eindeutige Pin-ID (innerhalb eines ID-Raums, siehe [`PinAllocator`])
pub type PinId = u32;

/// Richtung eines Pins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    /// Empfängt Signale von angehängten Output-Pins
    Input,
    /// Treibt angehängte Pins (nur Output-Pins initiieren Propagation)
    Output,
}

impl PinDirection {
    /// `true` für Input-Pins (entspricht `doInput` im Interchange-Format)
    pub fn is_input(&self) -> bool {
        matches!(self, PinDirection::Input)
    }
}

/// Ein Signal-Anschluss eines Gatters.
///
/// Das Signal eines Output-Pins bestimmt sich allein aus der
/// Auswertungsfunktion des Gatters; das eines Input-Pins aus dem ODER aller
/// angehängten aktiven Output-Pins.
#[derive(Debug, Clone)]
pub struct Pin {
    /// Eindeutige ID für Querverweise (Wires, Attachments)
    pub id: PinId,
    /// Lage und Ausdehnung (15×15 im Original-Layout)
    pub rect: Rect,
    /// Input oder Output
    pub direction: PinDirection,
    /// IDs aller direkt verbundenen Pins (in Einfüge-Reihenfolge, für
    /// deterministische Serialisierung)
    pub attached: IndexSet<PinId>,
    signal: bool,
    connected: bool,
}

impl Pin {
    /// Erstellt einen neuen Pin (Signal low, verbunden)
    pub fn new(id: PinId, rect: Rect, direction: PinDirection) -> Self {
        Self {
            id,
            rect,
            direction,
            attached: IndexSet::new(),
            signal: false,
            connected: true,
        }
    }

    /// Aktueller Signalpegel
    pub fn signal(&self) -> bool {
        self.signal
    }

    /// `false` modelliert einen abgetrennten Pin (z.B. Tri-State high-Z)
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Setzt den Signalpegel.
    ///
    /// Anheben wird verweigert, wenn die Schaltung stromlos oder der Pin
    /// abgetrennt ist — das ist reguläres Verhalten, kein Fehler. Absenken
    /// ist immer erlaubt.
    pub fn set_signal(&mut self, on: bool, power: bool) {
        if on && (!power || !self.connected) {
            return;
        }
        self.signal = on;
    }

    /// Setzt die Verbundenheit; Abtrennen zwingt das Signal auf low
    pub fn set_connected(&mut self, connected: bool, power: bool) {
        self.connected = connected;
        if !self.connected {
            self.set_signal(false, power);
        }
    }

    /// Zwingt das Signal auf low, unabhängig von Power/Verbundenheit
    pub fn force_low(&mut self) {
        self.signal = false;
    }

    /// Hängt einen Pin an (idempotent, nur diese Seite)
    pub fn attach(&mut self, other: PinId) -> bool {
        self.attached.insert(other)
    }

    /// Löst einen angehängten Pin (nur diese Seite)
    pub fn detach(&mut self, other: PinId) -> bool {
        self.attached.shift_remove(&other)
    }

    /// Mittelpunkt des Pin-Rechtecks
    pub fn center(&self) -> Vec2 {
        self.rect.center()
    }
}

/// Monoton wachsende Pin-ID-Vergabe.
///
/// IDs werden nur für die jeweils zuletzt vergebene ID wiederverwendet
/// (Löschen des neuesten Pins gibt dessen ID frei); nach dem Entfernen
/// ganzer Gatter setzt der Aufrufer die Wasserlinie per [`Self::bump_past`]
/// auf das verbleibende Maximum.
#[derive(Debug, Clone, Default)]
pub struct PinAllocator {
    next: PinId,
}

impl PinAllocator {
    /// Erstellt einen Allocator, der bei 0 beginnt
    pub fn new() -> Self {
        Self { next: 0 }
    }

    /// Vergibt die nächste freie ID
    pub fn allocate(&mut self) -> PinId {
        let id = self.next;
        self.next += 1;
        id
    }

    /// Die nächste ID, die vergeben würde
    pub fn peek(&self) -> PinId {
        self.next
    }

    /// Stellt sicher, dass `id` nicht erneut vergeben wird
    pub fn bump_past(&mut self, id: PinId) {
        self.next = self.next.max(id + 1);
    }

    /// Setzt die Wasserlinie direkt (nach Gatter-Entfernung: max+1)
    pub fn reset_to(&mut self, next: PinId) {
        self.next = next;
    }

    /// Gibt `id` frei, falls sie die zuletzt vergebene war
    pub fn release_if_latest(&mut self, id: PinId) -> bool {
        if self.next > 0 && id == self.next - 1 {
            self.next -= 1;
            true
        } else {
            false
        }
    }
}
