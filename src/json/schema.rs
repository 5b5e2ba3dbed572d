//! Serde-Dokumenttypen des Interchange-Formats.
//!
//! Die Structs bilden das JSON-Schema 1:1 ab (camelCase-Feldnamen wie
//! `doInput` inklusive); die Umsetzung in Laufzeittypen übernehmen
//! Reader und Writer.

use serde::{Deserialize, Serialize};

use crate::core::{Color, Rect};

/// `rect`-Objekt: Position und Ausdehnung
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RectDoc {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl From<Rect> for RectDoc {
    fn from(rect: Rect) -> Self {
        Self {
            x: rect.x as f64,
            y: rect.y as f64,
            w: rect.w as f64,
            h: rect.h as f64,
        }
    }
}

impl From<RectDoc> for Rect {
    fn from(doc: RectDoc) -> Self {
        Rect::new(doc.x as f32, doc.y as f32, doc.w as f32, doc.h as f32)
    }
}

/// `color`-Objekt: RGB-Komponenten in 0.0..=1.0
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ColorDoc {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl From<Color> for ColorDoc {
    fn from(color: Color) -> Self {
        Self {
            red: color.red,
            green: color.green,
            blue: color.blue,
        }
    }
}

impl From<ColorDoc> for Color {
    fn from(doc: ColorDoc) -> Self {
        Color::new(doc.red, doc.green, doc.blue)
    }
}

/// Ein Pin innerhalb eines Gatter-Eintrags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinDoc {
    pub id: u32,
    pub rect: RectDoc,
    #[serde(rename = "doInput")]
    pub do_input: bool,
    #[serde(default)]
    pub attached: Vec<u32>,
}

/// Ein Gatter-Eintrag; variantenspezifische Felder sind optional
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateDoc {
    pub name: String,
    pub rect: RectDoc,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorDoc>,
    #[serde(default)]
    pub label: String,
    /// Nur CHIP: Name der referenzierten Definition
    #[serde(
        rename = "fileName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub file_name: Option<String>,
    /// Nur BUS: Bus-ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    /// Nur BUS: IDs der verbundenen Busse
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connections: Option<Vec<u32>>,
    #[serde(default)]
    pub pins: Vec<PinDoc>,
}

/// Routing-Wegpunkt eines Wires
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PointDoc {
    pub x: f64,
    pub y: f64,
}

/// Ein Wire-Eintrag
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireDoc {
    pub pin1: u32,
    pub pin2: u32,
    #[serde(default)]
    pub points: Vec<PointDoc>,
}

/// Das Gesamtdokument; `chipName` und `color` existieren nur bei
/// Chip-Definitionen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitDoc {
    #[serde(default)]
    pub gates: Vec<GateDoc>,
    #[serde(default)]
    pub wires: Vec<WireDoc>,
    #[serde(
        rename = "chipName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub chip_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorDoc>,
}
