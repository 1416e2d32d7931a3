//! # Geometry Primitives
//!
//! The three primitive shapes a cross-section is assembled from:
//!
//! - **Rectangle** - width constant over the depth
//! - **Trapezoid** - width linear over the depth, b(z) = m·z + c
//! - **Circle** - treated as a point mass at its centroid (reinforcement
//!   bars are small against the beam depth, so the disk is never integrated)
//!
//! All shapes share the vertical coordinate z growing downward from the top
//! of the cross-section. Composed shapes (I-profiles, channel profiles,
//! rebar layers) are plain collections of these primitives and are built by
//! the caller.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::geometry::{Geometry, Rectangle};
//!
//! // a 200 mm wide, 15 mm thick flange starting at the section top
//! let flange = Rectangle::new(0.0, 15.0, 200.0).unwrap();
//! assert_eq!(flange.area(), 3000.0);
//! assert_eq!(flange.centroid(), 7.5);
//!
//! let geometry = Geometry::Rectangle(flange);
//! assert_eq!(geometry.width_at(10.0), 200.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::strain::{interpolation, StrainPosition};
use crate::width::EffectiveWidths;

/// Rectangle, constant width over its height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rectangle {
    top_edge: f64,
    bottom_edge: f64,
    left_edge: f64,
    right_edge: f64,
}

impl Rectangle {
    /// Rectangle centred about z = 0 in horizontal direction.
    pub fn new(top_edge: f64, bottom_edge: f64, width: f64) -> CalcResult<Self> {
        Self::with_edges(top_edge, bottom_edge, -0.5 * width, 0.5 * width)
    }

    /// Rectangle with explicit horizontal edges.
    pub fn with_edges(
        top_edge: f64,
        bottom_edge: f64,
        left_edge: f64,
        right_edge: f64,
    ) -> CalcResult<Self> {
        if bottom_edge < top_edge {
            return Err(CalcError::invalid_input(
                "bottom_edge",
                bottom_edge.to_string(),
                "bottom_edge must not lie above top_edge (z grows downward)",
            ));
        }
        if right_edge < left_edge {
            return Err(CalcError::invalid_input(
                "right_edge",
                right_edge.to_string(),
                "right_edge must not lie left of left_edge",
            ));
        }
        Ok(Self {
            top_edge,
            bottom_edge,
            left_edge,
            right_edge,
        })
    }

    pub fn top_edge(&self) -> f64 {
        self.top_edge
    }

    pub fn bottom_edge(&self) -> f64 {
        self.bottom_edge
    }

    pub fn left_edge(&self) -> f64 {
        self.left_edge
    }

    pub fn right_edge(&self) -> f64 {
        self.right_edge
    }

    pub fn width(&self) -> f64 {
        self.right_edge - self.left_edge
    }

    pub fn height(&self) -> f64 {
        self.bottom_edge - self.top_edge
    }

    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    pub fn centroid(&self) -> f64 {
        self.top_edge + 0.5 * self.height()
    }

    /// Horizontal edges clamped to the effective width for the given point.
    ///
    /// Effective widths are half-widths measured from the web centre-line
    /// (z = 0 horizontally), so the clamp is symmetric.
    fn effective_edges(
        &self,
        point: &StrainPosition,
        widths: Option<&EffectiveWidths>,
    ) -> (f64, f64) {
        match widths {
            Some(widths) => {
                let effective = widths.width(point.material, point.strain);
                (
                    self.left_edge.max(-effective),
                    self.right_edge.min(effective),
                )
            }
            None => (self.left_edge, self.right_edge),
        }
    }
}

/// Trapezoid, width linear over its height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trapezoid {
    top_edge: f64,
    bottom_edge: f64,
    top_left_edge: f64,
    top_right_edge: f64,
    bottom_left_edge: f64,
    bottom_right_edge: f64,
}

impl Trapezoid {
    /// Trapezoid centred about z = 0 in horizontal direction.
    pub fn new(
        top_edge: f64,
        bottom_edge: f64,
        top_width: f64,
        bottom_width: f64,
    ) -> CalcResult<Self> {
        Self::with_edges(
            top_edge,
            bottom_edge,
            -0.5 * top_width,
            top_width,
            -0.5 * bottom_width,
            bottom_width,
        )
    }

    /// Trapezoid with explicit left edges and widths at top and bottom.
    pub fn with_edges(
        top_edge: f64,
        bottom_edge: f64,
        top_left_edge: f64,
        top_width: f64,
        bottom_left_edge: f64,
        bottom_width: f64,
    ) -> CalcResult<Self> {
        if bottom_edge < top_edge {
            return Err(CalcError::invalid_input(
                "bottom_edge",
                bottom_edge.to_string(),
                "bottom_edge must not lie above top_edge (z grows downward)",
            ));
        }
        if top_width < 0.0 || bottom_width < 0.0 {
            return Err(CalcError::invalid_input(
                "width",
                format!("top {top_width}, bottom {bottom_width}"),
                "widths must be non-negative",
            ));
        }
        Ok(Self {
            top_edge,
            bottom_edge,
            top_left_edge,
            top_right_edge: top_left_edge + top_width,
            bottom_left_edge,
            bottom_right_edge: bottom_left_edge + bottom_width,
        })
    }

    pub fn top_edge(&self) -> f64 {
        self.top_edge
    }

    pub fn bottom_edge(&self) -> f64 {
        self.bottom_edge
    }

    pub fn top_width(&self) -> f64 {
        self.top_right_edge - self.top_left_edge
    }

    pub fn bottom_width(&self) -> f64 {
        self.bottom_right_edge - self.bottom_left_edge
    }

    pub fn height(&self) -> f64 {
        self.bottom_edge - self.top_edge
    }

    pub fn area(&self) -> f64 {
        0.5 * self.height() * (self.top_width() + self.bottom_width())
    }

    pub fn centroid(&self) -> f64 {
        self.top_edge + self.height()
            - self.height() / 3.0 * (self.bottom_width() + 2.0 * self.top_width())
                / (self.bottom_width() + self.top_width())
    }

    /// width at the given vertical position (0 outside the shape)
    pub fn width_at(&self, vertical_position: f64) -> f64 {
        if self.top_edge <= vertical_position && vertical_position <= self.bottom_edge {
            interpolation(
                vertical_position,
                (self.top_edge, self.top_width()),
                (self.bottom_edge, self.bottom_width()),
            )
        } else {
            0.0
        }
    }

    fn left_edge_at(&self, vertical_position: f64) -> f64 {
        interpolation(
            vertical_position,
            (self.top_edge, self.top_left_edge),
            (self.bottom_edge, self.bottom_left_edge),
        )
    }

    /// slope m of the width function b(z) = m·z + c
    pub fn width_slope(&self) -> f64 {
        (self.bottom_width() - self.top_width()) / self.height()
    }

    /// interception c of the width function b(z) = m·z + c
    pub fn width_interception(&self) -> f64 {
        self.top_width() - self.top_edge * self.width_slope()
    }
}

/// Circle, treated as a point mass at its centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    diameter: f64,
    centroid_y: f64,
    centroid_z: f64,
}

impl Circle {
    pub fn new(diameter: f64, centroid_y: f64, centroid_z: f64) -> CalcResult<Self> {
        if diameter <= 0.0 {
            return Err(CalcError::invalid_input(
                "diameter",
                diameter.to_string(),
                "diameter must be positive",
            ));
        }
        Ok(Self {
            diameter,
            centroid_y,
            centroid_z,
        })
    }

    pub fn diameter(&self) -> f64 {
        self.diameter
    }

    /// vertical position of the centroid
    pub fn centroid_y(&self) -> f64 {
        self.centroid_y
    }

    /// horizontal position of the centroid
    pub fn centroid_z(&self) -> f64 {
        self.centroid_z
    }

    pub fn area(&self) -> f64 {
        std::f64::consts::PI * (0.5 * self.diameter).powi(2)
    }
}

/// Tagged union over the geometry primitives.
///
/// Integration dispatches on the variant: rectangles and trapezoids take
/// the analytic path, circles the point-mass path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Rectangle(Rectangle),
    Trapezoid(Trapezoid),
    Circle(Circle),
}

impl Geometry {
    pub fn top_edge(&self) -> f64 {
        match self {
            Geometry::Rectangle(r) => r.top_edge(),
            Geometry::Trapezoid(t) => t.top_edge(),
            Geometry::Circle(c) => c.centroid_y(),
        }
    }

    pub fn bottom_edge(&self) -> f64 {
        match self {
            Geometry::Rectangle(r) => r.bottom_edge(),
            Geometry::Trapezoid(t) => t.bottom_edge(),
            Geometry::Circle(c) => c.centroid_y(),
        }
    }

    pub fn height(&self) -> f64 {
        self.bottom_edge() - self.top_edge()
    }

    pub fn area(&self) -> f64 {
        match self {
            Geometry::Rectangle(r) => r.area(),
            Geometry::Trapezoid(t) => t.area(),
            Geometry::Circle(c) => c.area(),
        }
    }

    pub fn centroid(&self) -> f64 {
        match self {
            Geometry::Rectangle(r) => r.centroid(),
            Geometry::Trapezoid(t) => t.centroid(),
            Geometry::Circle(c) => c.centroid_y(),
        }
    }

    /// `true` for shapes integrated as a point mass
    pub fn is_point(&self) -> bool {
        matches!(self, Geometry::Circle(_))
    }

    /// vertical edges; a single entry for point shapes
    pub fn edges(&self) -> Vec<f64> {
        match self {
            Geometry::Circle(c) => vec![c.centroid_y()],
            _ => vec![self.top_edge(), self.bottom_edge()],
        }
    }

    /// width at the given vertical position
    pub fn width_at(&self, vertical_position: f64) -> f64 {
        match self {
            Geometry::Rectangle(r) => {
                if r.top_edge() <= vertical_position && vertical_position <= r.bottom_edge() {
                    r.width()
                } else {
                    0.0
                }
            }
            Geometry::Trapezoid(t) => t.width_at(vertical_position),
            Geometry::Circle(_) => 0.0,
        }
    }

    /// slope m of the width function b(z) = m·z + c
    pub fn width_slope(&self) -> f64 {
        match self {
            Geometry::Rectangle(_) | Geometry::Circle(_) => 0.0,
            Geometry::Trapezoid(t) => t.width_slope(),
        }
    }

    /// interception c of the width function b(z) = m·z + c
    pub fn width_interception(&self) -> f64 {
        match self {
            Geometry::Rectangle(r) => r.width(),
            Geometry::Trapezoid(t) => t.width_interception(),
            Geometry::Circle(_) => 0.0,
        }
    }

    /// horizontal extent (left-most, right-most) of the shape
    pub fn horizontal_extent(&self) -> (f64, f64) {
        match self {
            Geometry::Rectangle(r) => (r.left_edge(), r.right_edge()),
            Geometry::Trapezoid(t) => (
                t.top_left_edge.min(t.bottom_left_edge),
                t.top_right_edge.max(t.bottom_right_edge),
            ),
            Geometry::Circle(c) => (c.centroid_z(), c.centroid_z()),
        }
    }

    /// Split the shape horizontally at the given points.
    ///
    /// Points outside the shape's vertical extent are ignored. For
    /// rectangles the optional effective widths clamp the horizontal edges
    /// of each slice depending on whether the slice is in tension or
    /// compression; trapezoids are split without clamping; circles are kept
    /// whole (or dropped when they fall outside the effective width).
    pub fn split(
        &self,
        at_points: &[StrainPosition],
        widths: Option<&EffectiveWidths>,
    ) -> Vec<Geometry> {
        let mut points: Vec<StrainPosition> = at_points.to_vec();
        points.sort_by(|a, b| a.position.total_cmp(&b.position));
        match self {
            Geometry::Rectangle(rectangle) => split_rectangle(rectangle, &points, widths),
            Geometry::Trapezoid(trapezoid) => split_trapezoid(trapezoid, &points),
            Geometry::Circle(circle) => split_circle(circle, &points, widths),
        }
    }
}

fn split_rectangle(
    rectangle: &Rectangle,
    points: &[StrainPosition],
    widths: Option<&EffectiveWidths>,
) -> Vec<Geometry> {
    if points.is_empty() {
        return vec![Geometry::Rectangle(*rectangle)];
    }
    let mut rectangles = Vec::new();
    let mut top = StrainPosition::new(points[0].strain, rectangle.top_edge(), points[0].material);
    for bottom in points {
        if rectangle.top_edge() < bottom.position && bottom.position < rectangle.bottom_edge() {
            // the slice is governed by its edge with non-zero strain
            let edge = if bottom.strain == 0.0 { &top } else { bottom };
            let (left, right) = rectangle.effective_edges(edge, widths);
            if let Ok(slice) =
                Rectangle::with_edges(top.position, bottom.position, left, right)
            {
                rectangles.push(Geometry::Rectangle(slice));
            }
            top = *bottom;
        }
    }
    let edge = if top.strain == 0.0 {
        StrainPosition::new(
            points[points.len() - 1].strain,
            rectangle.bottom_edge(),
            points[points.len() - 1].material,
        )
    } else {
        top
    };
    let (left, right) = rectangle.effective_edges(&edge, widths);
    if let Ok(slice) = Rectangle::with_edges(top.position, rectangle.bottom_edge(), left, right) {
        rectangles.push(Geometry::Rectangle(slice));
    }
    rectangles
}

fn split_trapezoid(trapezoid: &Trapezoid, points: &[StrainPosition]) -> Vec<Geometry> {
    let mut trapezoids = Vec::new();
    let mut top = trapezoid.top_edge();
    for point in points {
        if trapezoid.top_edge() < point.position && point.position < trapezoid.bottom_edge() {
            if let Ok(slice) = Trapezoid::with_edges(
                top,
                point.position,
                trapezoid.left_edge_at(top),
                trapezoid.width_at(top),
                trapezoid.left_edge_at(point.position),
                trapezoid.width_at(point.position),
            ) {
                trapezoids.push(Geometry::Trapezoid(slice));
            }
            top = point.position;
        }
    }
    if let Ok(slice) = Trapezoid::with_edges(
        top,
        trapezoid.bottom_edge(),
        trapezoid.left_edge_at(top),
        trapezoid.width_at(top),
        trapezoid.bottom_left_edge,
        trapezoid.bottom_width(),
    ) {
        trapezoids.push(Geometry::Trapezoid(slice));
    }
    trapezoids
}

fn split_circle(
    circle: &Circle,
    points: &[StrainPosition],
    widths: Option<&EffectiveWidths>,
) -> Vec<Geometry> {
    let Some(widths) = widths else {
        return vec![Geometry::Circle(*circle)];
    };
    // keep the bar when its centroid lies within the effective width that
    // applies to the strain at its depth
    for pair in points.windows(2) {
        let (above, below) = (&pair[0], &pair[1]);
        if above.position <= circle.centroid_y() && circle.centroid_y() <= below.position {
            let strain_at_bar = 0.5 * (above.strain + below.strain);
            let width = widths.width(above.material, strain_at_bar);
            if circle.centroid_z().abs() <= width {
                return vec![Geometry::Circle(*circle)];
            }
            return vec![];
        }
    }
    vec![Geometry::Circle(*circle)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::materials::MaterialKind;
    use approx::assert_relative_eq;

    #[test]
    fn test_rectangle_properties() {
        let r = Rectangle::new(0.0, 10.0, 10.0).unwrap();
        assert_relative_eq!(r.area(), 100.0);
        assert_relative_eq!(r.centroid(), 5.0);
        assert_relative_eq!(r.left_edge(), -5.0);
        assert_relative_eq!(r.right_edge(), 5.0);
    }

    #[test]
    fn test_rectangle_rejects_inverted_edges() {
        assert!(Rectangle::new(10.0, 0.0, 10.0).is_err());
        assert!(Rectangle::with_edges(0.0, 10.0, 5.0, -5.0).is_err());
    }

    #[test]
    fn test_trapezoid_properties() {
        let t = Trapezoid::new(0.0, 10.0, 20.0, 10.0).unwrap();
        assert_relative_eq!(t.area(), 150.0);
        // centroid: 10 − 10/3·(10 + 40)/30 = 10 − 50/9
        assert_relative_eq!(t.centroid(), 10.0 - 50.0 / 9.0);
        assert_relative_eq!(t.width_at(5.0), 15.0);
        assert_relative_eq!(t.width_slope(), -1.0);
        assert_relative_eq!(t.width_interception(), 20.0);
    }

    #[test]
    fn test_circle_is_point() {
        let c = Circle::new(12.0, 50.0, 0.0).unwrap();
        let g = Geometry::Circle(c);
        assert!(g.is_point());
        assert_relative_eq!(g.area(), std::f64::consts::PI * 36.0);
        assert_eq!(g.edges(), vec![50.0]);
    }

    #[test]
    fn test_rectangle_split() {
        let r = Geometry::Rectangle(Rectangle::new(0.0, 30.0, 10.0).unwrap());
        let points = vec![
            StrainPosition::new(-0.001, 10.0, MaterialKind::Steel),
            StrainPosition::new(0.001, 20.0, MaterialKind::Steel),
        ];
        let slices = r.split(&points, None);
        assert_eq!(slices.len(), 3);
        assert_relative_eq!(slices[0].top_edge(), 0.0);
        assert_relative_eq!(slices[0].bottom_edge(), 10.0);
        assert_relative_eq!(slices[2].bottom_edge(), 30.0);
        let total: f64 = slices.iter().map(|s| s.area()).sum();
        assert_relative_eq!(total, 300.0);
    }

    #[test]
    fn test_rectangle_split_ignores_outside_points() {
        let r = Geometry::Rectangle(Rectangle::new(0.0, 30.0, 10.0).unwrap());
        let points = vec![
            StrainPosition::new(-0.002, -5.0, MaterialKind::Steel),
            StrainPosition::new(0.002, 45.0, MaterialKind::Steel),
        ];
        let slices = r.split(&points, None);
        assert_eq!(slices.len(), 1);
        assert_relative_eq!(slices[0].area(), 300.0);
    }

    #[test]
    fn test_trapezoid_split_conserves_area() {
        let t = Geometry::Trapezoid(Trapezoid::new(0.0, 12.0, 24.0, 12.0).unwrap());
        let points = vec![
            StrainPosition::new(-0.001, 4.0, MaterialKind::Concrete),
            StrainPosition::new(0.001, 8.0, MaterialKind::Concrete),
        ];
        let slices = t.split(&points, None);
        assert_eq!(slices.len(), 3);
        let total: f64 = slices.iter().map(|s| s.area()).sum();
        assert_relative_eq!(total, t.area(), epsilon = 1e-9);
    }

    #[test]
    fn test_geometry_serialization() {
        let g = Geometry::Rectangle(Rectangle::new(0.0, 10.0, 10.0).unwrap());
        let json = serde_json::to_string(&g).unwrap();
        assert!(json.contains("\"type\":\"Rectangle\""));
        let roundtrip: Geometry = serde_json::from_str(&json).unwrap();
        assert_eq!(g, roundtrip);
    }
}
