//! Geometrie-Grundtypen: Rechtecke und Farben.
//!
//! Das Rendering selbst liegt außerhalb des Cores — hier stehen nur die
//! Daten und die Hit-Test-Prädikate, die der Host abfragt.

use glam::Vec2;

/// Achsenparalleles Rechteck in Welt-Koordinaten.
///
/// Entspricht dem `rect`-Objekt des Interchange-Formats (x, y, w, h).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    /// Linke Kante
    pub x: f32,
    /// Obere Kante
    pub y: f32,
    /// Breite
    pub w: f32,
    /// Höhe
    pub h: f32,
}

impl Rect {
    /// Erstellt ein neues Rechteck
    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Rechte Kante
    pub fn max_x(&self) -> f32 {
        self.x + self.w
    }

    /// Untere Kante
    pub fn max_y(&self) -> f32 {
        self.y + self.h
    }

    /// Mittelpunkt des Rechtecks
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Prüft ob ein Punkt im Rechteck liegt (Kanten inklusive)
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// Verschiebt das Rechteck um ein Delta
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// RGB-Farbe mit Komponenten in 0.0..=1.0, wie im Interchange-Format.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub red: f64,
    pub green: f64,
    pub blue: f64,
}

impl Color {
    pub const RED: Color = Color::new(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0);
    pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0);
    pub const ORANGE: Color = Color::new(1.0, 0.65, 0.0);
    pub const GRAY: Color = Color::new(0.5, 0.5, 0.5);
    pub const DARK_GRAY: Color = Color::new(0.25, 0.25, 0.25);

    /// Erstellt eine Farbe aus RGB-Komponenten
    pub const fn new(red: f64, green: f64, blue: f64) -> Self {
        Self { red, green, blue }
    }
}
