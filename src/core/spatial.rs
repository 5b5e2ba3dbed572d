//! Spatial-Index (KD-Tree) für schnelle Pin-Abfragen.

use std::collections::HashMap;

use glam::Vec2;
use kiddo::{KdTree, SquaredEuclidean};

use crate::core::gate::{Gate, PIN_SIZE};
use crate::core::{PinId, Rect};

/// Ergebnis einer Distanzabfrage gegen den Spatial-Index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpatialMatch {
    /// ID des gefundenen Pins
    pub pin_id: PinId,
    /// Euklidische Distanz des Suchpunkts zum Pin-Mittelpunkt
    pub distance: f32,
}

/// Read-only Spatial-Index über allen Pins einer Schaltung.
///
/// Wird nach strukturellen Edits (Gatter/Pins hinzufügen, entfernen,
/// verschieben) komplett neu gebaut; Abfragen zwischen Edits sind billig.
#[derive(Debug, Clone)]
pub struct SpatialIndex {
    tree: KdTree<f64, 2>,
    pin_ids: Vec<PinId>,
    rects: HashMap<PinId, Rect>,
}

impl SpatialIndex {
    /// Erstellt einen leeren Spatial-Index.
    pub fn empty() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            pin_ids: Vec::new(),
            rects: HashMap::new(),
        }
    }

    /// Baut einen neuen Index über die Pins aller übergebenen Gatter.
    pub fn from_gates(gates: &[Gate]) -> Self {
        let mut pin_ids = Vec::new();
        let mut entries: Vec<[f64; 2]> = Vec::new();
        let mut rects = HashMap::new();

        for gate in gates {
            for pin in &gate.pins {
                let center = pin.center();
                pin_ids.push(pin.id);
                entries.push([center.x as f64, center.y as f64]);
                rects.insert(pin.id, pin.rect);
            }
        }

        let tree: KdTree<f64, 2> = (&entries).into();

        Self {
            tree,
            pin_ids,
            rects,
        }
    }

    /// Gibt die Anzahl indexierter Pins zurück.
    pub fn len(&self) -> usize {
        self.pin_ids.len()
    }

    /// Gibt `true` zurück, wenn keine Pins im Index liegen.
    pub fn is_empty(&self) -> bool {
        self.pin_ids.is_empty()
    }

    /// Findet den nächsten Pin zur gegebenen Weltposition.
    pub fn nearest(&self, query: Vec2) -> Option<SpatialMatch> {
        if self.is_empty() {
            return None;
        }

        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[query.x as f64, query.y as f64]);
        let pin_id = *self.pin_ids.get(result.item as usize)?;

        Some(SpatialMatch {
            pin_id,
            distance: (result.distance as f32).sqrt(),
        })
    }

    /// Findet alle Pins innerhalb eines Radius um die Query-Position.
    pub fn within_radius(&self, query: Vec2, radius: f32) -> Vec<SpatialMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }

        let mut results = self
            .tree
            .within::<SquaredEuclidean>(&[query.x as f64, query.y as f64], (radius * radius) as f64)
            .into_iter()
            .filter_map(|entry| {
                let pin_id = *self.pin_ids.get(entry.item as usize)?;
                Some(SpatialMatch {
                    pin_id,
                    distance: (entry.distance as f32).sqrt(),
                })
            })
            .collect::<Vec<_>>();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results
    }

    /// Hit-Test: Pin, dessen Rechteck den Punkt enthält.
    ///
    /// KD-Tree-Vorfilter über die Mittelpunkte, danach exakte
    /// Rechteck-Prüfung; bei knapp überlappenden Pins gewinnt der
    /// nächstgelegene Treffer.
    pub fn pin_at(&self, point: Vec2) -> Option<PinId> {
        self.within_radius(point, PIN_SIZE)
            .into_iter()
            .find(|m| {
                self.rects
                    .get(&m.pin_id)
                    .is_some_and(|rect| rect.contains(point))
            })
            .map(|m| m.pin_id)
    }
}
