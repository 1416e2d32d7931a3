//! # Sections and Stress Integration
//!
//! A [`Section`] pairs one geometry with one material. Under a strain field
//! the stresses over the section are integrated analytically:
//!
//! 1. determine the strains at the section edges,
//! 2. split the geometry at every depth where the material curve has a
//!    breakpoint - inside each slice both the stress σ(z) and the width
//!    b(z) are then linear,
//! 3. integrate σ(z)·b(z) and σ(z)·b(z)·z in closed form (cubic and quartic
//!    antiderivatives) per slice.
//!
//! Circles are integrated as point masses: N = A·σ(ε at centroid), lever
//! arm at the centroid.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::geometry::{Geometry, Rectangle};
//! use bend_core::materials::steel::Steel;
//! use bend_core::section::Section;
//!
//! let steel = Steel::new(355.0).unwrap();
//! let rectangle = Rectangle::new(0.0, 10.0, 10.0).unwrap();
//! let section = Section::new(Geometry::Rectangle(rectangle), steel.material());
//!
//! let computed = section.under_constant_strain(0.001).unwrap();
//! assert_eq!(computed.axial_force(), 21_000.0);
//! assert_eq!(computed.lever_arm(), 5.0);
//! assert_eq!(computed.moment(), 105_000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::geometry::Geometry;
use crate::materials::{Material, MaterialKind, SectionKind};
use crate::strain::{position, strain, StrainPosition};
use crate::width::EffectiveWidths;

/// Geometry paired with a material.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub geometry: Geometry,
    pub material: Material,
}

impl Section {
    pub fn new(geometry: Geometry, material: Material) -> Self {
        Self { geometry, material }
    }

    pub fn section_kind(&self) -> SectionKind {
        self.material.section_kind()
    }

    pub fn material_kind(&self) -> MaterialKind {
        self.material.kind()
    }

    /// maximum material strain anchored at the top edge
    pub fn top_edge_maximum_strain(&self) -> StrainPosition {
        StrainPosition::new(
            self.material.maximum_strain(),
            self.geometry.top_edge(),
            self.material_kind(),
        )
    }

    /// minimum material strain anchored at the top edge
    pub fn top_edge_minimum_strain(&self) -> StrainPosition {
        StrainPosition::new(
            self.material.minimum_strain(),
            self.geometry.top_edge(),
            self.material_kind(),
        )
    }

    /// maximum material strain anchored at the bottom edge
    pub fn bottom_edge_maximum_strain(&self) -> StrainPosition {
        StrainPosition::new(
            self.material.maximum_strain(),
            self.geometry.bottom_edge(),
            self.material_kind(),
        )
    }

    /// minimum material strain anchored at the bottom edge
    pub fn bottom_edge_minimum_strain(&self) -> StrainPosition {
        StrainPosition::new(
            self.material.minimum_strain(),
            self.geometry.bottom_edge(),
            self.material_kind(),
        )
    }

    /// Breakpoint strains of the material attached to every vertical edge
    /// of the geometry, optionally limited to `[lower, upper]`.
    pub fn strain_positions(&self, limits: Option<(f64, f64)>) -> Vec<StrainPosition> {
        let strains: Vec<f64> = match limits {
            Some((lower, upper)) => self
                .material
                .strains_between(lower, upper)
                .filter(|s| *s != 0.0)
                .collect(),
            None => self.material.strains().filter(|s| *s != 0.0).collect(),
        };
        let mut positions = Vec::new();
        for edge in self.geometry.edges() {
            for strain_value in &strains {
                positions.push(StrainPosition::new(
                    *strain_value,
                    edge,
                    self.material_kind(),
                ));
            }
        }
        positions
    }

    /// Integrate the section under a uniform strain (the κ = 0 path).
    pub fn under_constant_strain(&self, strain_value: f64) -> CalcResult<ComputedSection> {
        ComputedSection::compute(
            self.geometry,
            &self.material,
            StrainField::Constant(strain_value),
        )
    }

    /// Integrate the section under the strain field ε(z) = κ·(z − z_n).
    ///
    /// Returns one computed slice per material segment the field crosses.
    /// `widths` clamps slab slices to the effective width; the caller only
    /// passes it when it applies to this section's kind.
    pub fn under_curvature(
        &self,
        curvature: f64,
        neutral_axis: f64,
        widths: Option<&EffectiveWidths>,
    ) -> CalcResult<Vec<ComputedSection>> {
        if curvature == 0.0 {
            return Err(CalcError::invalid_input(
                "curvature",
                "0",
                "zero curvature takes the constant-strain path",
            ));
        }
        let field = StrainField::Curvature {
            curvature,
            neutral_axis,
        };
        if self.geometry.is_point() {
            let computed = ComputedSection::compute(self.geometry, &self.material, field)?;
            if let (Some(widths), Geometry::Circle(circle)) = (widths, &self.geometry) {
                let strain_at_bar = field.strain_at(circle.centroid_y());
                if circle.centroid_z().abs() > widths.width(self.material_kind(), strain_at_bar) {
                    return Ok(vec![]);
                }
            }
            return Ok(vec![computed]);
        }
        let break_positions = self.breakpoint_positions(curvature, neutral_axis);
        let mut computed = Vec::new();
        for sub_geometry in self.geometry.split(&break_positions, widths) {
            if sub_geometry.height() == 0.0 {
                continue;
            }
            computed.push(ComputedSection::compute(
                sub_geometry,
                &self.material,
                field,
            )?);
        }
        Ok(computed)
    }

    /// Material breakpoints lying between zero strain and the strain the
    /// field induces at the governing edge, anchored at that edge.
    ///
    /// Under positive curvature the bottom edge governs tension and the top
    /// edge compression; under negative curvature the roles swap.
    pub(crate) fn material_points_inside_curvature(
        &self,
        curvature: f64,
        neutral_axis: f64,
    ) -> Vec<StrainPosition> {
        let field = StrainField::Curvature {
            curvature,
            neutral_axis,
        };
        let edges = self.geometry.edges();
        let mut points = Vec::new();
        for (index, edge) in edges.iter().enumerate() {
            let edge_strain = field.strain_at(*edge);
            let governing_index = if (curvature > 0.0) == (edge_strain > 0.0) {
                edges.len() - 1 // bottom edge
            } else {
                0 // top edge
            };
            if index == governing_index {
                for intermediate in self.material.intermediate_strains(edge_strain) {
                    points.push(StrainPosition::new(intermediate, *edge, self.material_kind()));
                }
            }
        }
        points
    }

    /// map every material breakpoint strain to its depth z = ε/κ + z_n
    fn breakpoint_positions(&self, curvature: f64, neutral_axis: f64) -> Vec<StrainPosition> {
        self.material
            .strains()
            .map(|strain_value| {
                StrainPosition::new(
                    strain_value,
                    position(strain_value, neutral_axis, curvature),
                    self.material_kind(),
                )
            })
            .collect()
    }
}

/// The strain field a section is evaluated under.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum StrainField {
    Constant(f64),
    Curvature { curvature: f64, neutral_axis: f64 },
}

impl StrainField {
    pub(crate) fn strain_at(&self, vertical_position: f64) -> f64 {
        match self {
            StrainField::Constant(value) => *value,
            StrainField::Curvature {
                curvature,
                neutral_axis,
            } => strain(*neutral_axis, *curvature, vertical_position),
        }
    }
}

/// A section (or slice of one) integrated under a strain field.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputedSection {
    geometry: Geometry,
    section_kind: SectionKind,
    material_kind: MaterialKind,
    axial_force: f64,
    moment: f64,
}

impl ComputedSection {
    fn compute(geometry: Geometry, material: &Material, field: StrainField) -> CalcResult<Self> {
        let (axial_force, moment) = if geometry.is_point() {
            let stress = material.stress_at(field.strain_at(geometry.centroid()))?;
            let axial_force = geometry.area() * stress;
            (axial_force, axial_force * geometry.centroid())
        } else {
            let top = geometry.top_edge();
            let bottom = geometry.bottom_edge();
            let stress_top = material.stress_at(field.strain_at(top))?;
            let stress_bottom = material.stress_at(field.strain_at(bottom))?;
            let height = geometry.height();
            let stress_slope = if height == 0.0 {
                0.0
            } else {
                (stress_bottom - stress_top) / height
            };
            let stress_interception = stress_top - top * stress_slope;
            let width_slope = geometry.width_slope();
            let width_interception = geometry.width_interception();
            let axial_force = integrated_axial_force(
                width_slope,
                width_interception,
                stress_slope,
                stress_interception,
                bottom,
            ) - integrated_axial_force(
                width_slope,
                width_interception,
                stress_slope,
                stress_interception,
                top,
            );
            let moment = integrated_moment(
                width_slope,
                width_interception,
                stress_slope,
                stress_interception,
                bottom,
            ) - integrated_moment(
                width_slope,
                width_interception,
                stress_slope,
                stress_interception,
                top,
            );
            (axial_force, moment)
        };
        Ok(Self {
            geometry,
            section_kind: material.section_kind(),
            material_kind: material.kind(),
            axial_force,
            moment,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn section_kind(&self) -> SectionKind {
        self.section_kind
    }

    pub fn material_kind(&self) -> MaterialKind {
        self.material_kind
    }

    /// axial force N_i = ∫ σ(z)·b(z) dz over the slice
    pub fn axial_force(&self) -> f64 {
        self.axial_force
    }

    /// moment M_i = ∫ σ(z)·b(z)·z dz over the slice
    pub fn moment(&self) -> f64 {
        self.moment
    }

    /// lever arm r_i = M_i / N_i (zero for a force-free slice)
    pub fn lever_arm(&self) -> f64 {
        if self.axial_force == 0.0 {
            0.0
        } else {
            self.moment / self.axial_force
        }
    }
}

/// antiderivative of σ(z)·b(z) with b(z) = m_b·z + c_b, σ(z) = m_σ·z + c_σ
fn integrated_axial_force(m_b: f64, c_b: f64, m_s: f64, c_s: f64, z: f64) -> f64 {
    (1.0 / 3.0) * m_b * m_s * z.powi(3) + 0.5 * (c_s * m_b + c_b * m_s) * z.powi(2) + c_b * c_s * z
}

/// antiderivative of σ(z)·b(z)·z
fn integrated_moment(m_b: f64, c_b: f64, m_s: f64, c_s: f64, z: f64) -> f64 {
    0.25 * m_b * m_s * z.powi(4)
        + (1.0 / 3.0) * (c_s * m_b + c_b * m_s) * z.powi(3)
        + 0.5 * c_b * c_s * z.powi(2)
}

/// sum of axial forces over computed sections
pub fn axial_force(sections: &[ComputedSection]) -> f64 {
    sections.iter().map(|s| s.axial_force()).sum()
}

/// sum of moments over computed sections
pub fn moment(sections: &[ComputedSection]) -> f64 {
    sections.iter().map(|s| s.moment()).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Circle, Rectangle, Trapezoid};
    use crate::materials::steel::Steel;
    use approx::assert_relative_eq;

    fn steel_rectangle(top: f64, bottom: f64, width: f64) -> Section {
        Section::new(
            Geometry::Rectangle(Rectangle::new(top, bottom, width).unwrap()),
            Steel::new(355.0).unwrap().material(),
        )
    }

    #[test]
    fn test_constant_strain_rectangle() {
        let section = steel_rectangle(0.0, 10.0, 10.0);
        let computed = section.under_constant_strain(0.001).unwrap();
        // sigma = 210 N/mm2 over 100 mm2
        assert_relative_eq!(computed.axial_force(), 21_000.0);
        assert_relative_eq!(computed.lever_arm(), 5.0);
        assert_relative_eq!(computed.moment(), 105_000.0);
    }

    #[test]
    fn test_curvature_rectangle() {
        let section = steel_rectangle(0.0, 10.0, 10.0);
        let computed = section.under_curvature(0.0001, 10.0, None).unwrap();
        let n = axial_force(&computed);
        let m = moment(&computed);
        // strains 0 at bottom, -0.001 at top: triangular compression block
        assert_relative_eq!(n, -10_500.0, epsilon = 1e-6);
        assert_relative_eq!(m, -35_000.0, epsilon = 1e-6);
        assert_relative_eq!(m / n, 10.0 / 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_trapezoid_integration_is_exact() {
        // elastic steel, kappa = 1e-5, z_n = 0: sigma(z) = 2.1 z
        // b(z) = 20 - z on [0, 10]
        // N = int 2.1 z (20 - z) dz = 1400, M = int 2.1 z^2 (20 - z) dz = 8750
        let section = Section::new(
            Geometry::Trapezoid(Trapezoid::new(0.0, 10.0, 20.0, 10.0).unwrap()),
            Steel::new(355.0).unwrap().material(),
        );
        let computed = section.under_curvature(1e-5, 0.0, None).unwrap();
        assert_relative_eq!(axial_force(&computed), 1400.0, epsilon = 1e-9);
        assert_relative_eq!(moment(&computed), 8750.0, epsilon = 1e-9);
    }

    #[test]
    fn test_elastic_plastic_rectangle() {
        // 10 x 20 rectangle, ideal-plastic steel, neutral axis at mid-depth
        let section = Section::new(
            Geometry::Rectangle(Rectangle::new(0.0, 20.0, 10.0).unwrap()),
            Steel::new(355.0)
                .unwrap()
                .with_failure_strain(0.15)
                .material(),
        );
        let computed = section.under_curvature(0.001, 10.0, None).unwrap();
        // symmetric: axial force vanishes
        assert_relative_eq!(axial_force(&computed), 0.0, epsilon = 1e-6);
        // elastic core to u_y = eps_y/kappa, plastic blocks outside:
        // M = b*f_y*(h^2/4 - u_y^2/3)
        let u_y = (355.0 / 210_000.0) / 0.001;
        let expected = 10.0 * 355.0 * (100.0 - u_y * u_y / 3.0);
        assert_relative_eq!(moment(&computed), expected, epsilon = 1.0);
        // three material segments on each side of the neutral axis pair up
        // into distinct slices
        assert!(computed.len() >= 3);
    }

    #[test]
    fn test_circle_point_mass() {
        let section = Section::new(
            Geometry::Circle(Circle::new(12.0, 50.0, 0.0).unwrap()),
            Steel::new(500.0).unwrap().material(),
        );
        let computed = section.under_curvature(1e-5, 0.0, None).unwrap();
        assert_eq!(computed.len(), 1);
        let area = std::f64::consts::PI * 36.0;
        // strain at centroid: 5e-4 -> sigma = 105 N/mm2
        assert_relative_eq!(computed[0].axial_force(), area * 105.0, epsilon = 1e-9);
        assert_relative_eq!(computed[0].lever_arm(), 50.0);
    }

    #[test]
    fn test_zero_curvature_rejected() {
        let section = steel_rectangle(0.0, 10.0, 10.0);
        assert!(section.under_curvature(0.0, 5.0, None).is_err());
    }

    #[test]
    fn test_material_points_inside_curvature() {
        let section = Section::new(
            Geometry::Rectangle(Rectangle::new(0.0, 20.0, 10.0).unwrap()),
            Steel::new(355.0)
                .unwrap()
                .with_failure_strain(0.15)
                .material(),
        );
        // strains -0.002 at top, +0.002 at bottom: the yield breakpoint
        // +/-eps_y lies inside on both edges
        let points = section.material_points_inside_curvature(0.0002, 10.0);
        assert_eq!(points.len(), 2);
        let strains: Vec<f64> = points.iter().map(|p| p.strain).collect();
        let eps_y = 355.0 / 210_000.0;
        assert!(strains.contains(&eps_y));
        assert!(strains.contains(&-eps_y));
        // tensile breakpoint is anchored at the bottom, compressive at top
        for point in &points {
            if point.strain > 0.0 {
                assert_relative_eq!(point.position, 20.0);
            } else {
                assert_relative_eq!(point.position, 0.0);
            }
        }
    }
}
