use std::fmt;

use crate::math::{Point3, Vector3};

use super::entity::EntityId;

slotmap::new_key_type! {
    /// Unique identifier for a representation item in the document.
    pub struct ItemId;
}

/// A packed `0xrrggbb` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color(pub u32);

impl Color {
    /// Creates a color from its red, green and blue channels.
    #[must_use]
    pub fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self((u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b))
    }

    /// Parses a six-digit hex string, with or without a leading `#`.
    #[must_use]
    pub fn parse_hex(text: &str) -> Option<Self> {
        let digits = text.strip_prefix('#').unwrap_or(text);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(digits, 16).ok().map(Self)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06x}", self.0 & 0x00ff_ffff)
    }
}

/// A closed planar boundary of a face.
#[derive(Debug, Clone)]
pub enum BoundaryLoop {
    /// Polygon vertices in order; the closing edge is implicit.
    Polygon(Vec<Point3>),
    /// A full circle in the plane normal to `normal`.
    Circle {
        center: Point3,
        normal: Vector3,
        radius: f64,
    },
}

/// A planar face bounded by one outer loop and any number of holes.
#[derive(Debug, Clone)]
pub struct BrepFace {
    pub entity_id: EntityId,
    pub color: Option<Color>,
    /// Outer boundary, counter-clockwise around the outward normal.
    pub outer: BoundaryLoop,
    /// Hole boundaries.
    pub inner: Vec<BoundaryLoop>,
}

/// A boundary representation: a set of faces forming a solid or open shell.
#[derive(Debug, Clone, Default)]
pub struct Brep {
    pub faces: Vec<BrepFace>,
}

impl Brep {
    /// Returns `true` if the B-rep has no faces to mesh.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        self.faces.is_empty()
    }
}

/// A bounded curve used by annotations and constructive geometry.
#[derive(Debug, Clone)]
pub enum Curve {
    Polyline(Vec<Point3>),
    Circle {
        center: Point3,
        normal: Vector3,
        radius: f64,
    },
}

/// The closed set of item variants a shape can hold.
#[derive(Debug, Clone)]
pub enum ItemKind {
    /// A manifold solid.
    Solid(Brep),
    /// An open or closed shell without solid semantics.
    Shell(Brep),
    /// A standalone bounded curve.
    Curve(Curve),
    /// A set of curves drawn together.
    GeometricSet(Vec<Curve>),
    /// A plane carrying draughting items.
    AnnotationPlane(Vec<ItemId>),
    /// A placement axis; carries no drawable geometry.
    Placement,
}

impl ItemKind {
    /// Short variant name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Solid(_) => "solid",
            Self::Shell(_) => "shell",
            Self::Curve(_) => "curve",
            Self::GeometricSet(_) => "geometric set",
            Self::AnnotationPlane(_) => "annotation plane",
            Self::Placement => "placement",
        }
    }
}

/// A representation item inside a shape.
#[derive(Debug, Clone)]
pub struct ItemData {
    pub entity_id: EntityId,
    pub name: Option<String>,
    pub color: Option<Color>,
    pub kind: ItemKind,
}

impl ItemData {
    /// Returns the B-rep if this item is a solid or a shell.
    #[must_use]
    pub fn brep(&self) -> Option<&Brep> {
        match &self.kind {
            ItemKind::Solid(brep) | ItemKind::Shell(brep) => Some(brep),
            _ => None,
        }
    }

    /// Returns `true` if the item can be handed to a tessellator.
    #[must_use]
    pub fn is_tessellable(&self) -> bool {
        self.brep().is_some()
    }

    /// Returns `true` if the item carries drawable curve geometry.
    #[must_use]
    pub fn is_curve(&self) -> bool {
        matches!(self.kind, ItemKind::Curve(_) | ItemKind::GeometricSet(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_hex_round_trip() {
        let c = Color::parse_hex("#0a1B2c").unwrap_or(Color(0));
        assert_eq!(c, Color::from_rgb(0x0a, 0x1b, 0x2c));
        assert_eq!(c.to_string(), "0a1b2c");
    }

    #[test]
    fn malformed_colors_are_rejected() {
        assert!(Color::parse_hex("12345").is_none());
        assert!(Color::parse_hex("gg0000").is_none());
        assert!(Color::parse_hex("+12345").is_none());
    }

    #[test]
    fn capability_queries_follow_the_variant() {
        let solid = ItemData {
            entity_id: EntityId::from_raw(1),
            name: None,
            color: None,
            kind: ItemKind::Solid(Brep::default()),
        };
        assert!(solid.is_tessellable());
        assert!(!solid.is_curve());

        let set = ItemData {
            kind: ItemKind::GeometricSet(Vec::new()),
            ..solid.clone()
        };
        assert!(!set.is_tessellable());
        assert!(set.is_curve());
    }
}
