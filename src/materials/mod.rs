//! # Material Models
//!
//! Every material is reduced to a piecewise-linear stress-strain curve: an
//! ascending sequence of [`StressStrain`] points that always contains the
//! origin. Between adjacent points the stress interpolates linearly; outside
//! the first/last point the material has failed.
//!
//! Ready-made curve builders:
//!
//! - [`Concrete`](concrete::Concrete) - EN 1992-1-1 compression laws
//!   (nonlinear / parabola-rectangle / bi-linear) and a tension branch with
//!   optional fracture-energy crack-opening softening
//! - [`Steel`](steel::Steel) - structural steel, linear-elastic to
//!   bi-linear plastic
//! - [`Reinforcement`](steel::Reinforcement) - reinforcement bars, same
//!   forms with slab role and E = 200 000 N/mm²
//!
//! ## Example
//!
//! ```rust
//! use bend_core::materials::steel::Steel;
//!
//! let steel = Steel::new(355.0).unwrap().with_failure_strain(0.15);
//! let material = steel.material();
//! // yield strain f_y / E_a
//! let yield_strain = 355.0 / 210_000.0;
//! assert!((material.stress_at(yield_strain).unwrap() - 355.0).abs() < 1e-9);
//! assert_eq!(material.maximum_strain(), 0.15);
//! ```

pub mod concrete;
pub mod steel;

pub use concrete::{Concrete, ConcreteCompressionModel, ConcreteTensionModel};
pub use steel::{Reinforcement, Steel};

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::strain::{interpolation, round_strain};

/// A single point of a stress-strain curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StressStrain {
    pub strain: f64,
    pub stress: f64,
}

impl StressStrain {
    pub fn new(strain: f64, stress: f64) -> Self {
        Self { strain, stress }
    }
}

/// Which part of a composite cross-section a material belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectionKind {
    /// steel girder
    Girder,
    /// concrete slab including its reinforcement
    Slab,
}

/// Material family tag, carried through strain positions and curve points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialKind {
    Concrete,
    Steel,
    Reinforcement,
    Custom,
}

/// Piecewise-linear material curve with a section role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    kind: MaterialKind,
    section_kind: SectionKind,
    /// points sorted by strain ascending, containing the origin
    stress_strain: Vec<StressStrain>,
}

impl Material {
    /// Build a material from raw curve points.
    ///
    /// The points are sorted by strain; the curve must contain the origin
    /// (0, 0) and must not repeat a strain value.
    pub fn from_points(
        kind: MaterialKind,
        section_kind: SectionKind,
        points: Vec<StressStrain>,
    ) -> CalcResult<Self> {
        let mut stress_strain = points;
        stress_strain.sort_by(|a, b| a.strain.total_cmp(&b.strain));
        stress_strain.dedup_by(|a, b| a.strain == b.strain && a.stress == b.stress);
        if stress_strain.len() < 2 {
            return Err(CalcError::invalid_material_curve(
                "curve needs at least two points",
            ));
        }
        if !stress_strain
            .iter()
            .any(|p| p.strain == 0.0 && p.stress == 0.0)
        {
            return Err(CalcError::invalid_material_curve(
                "curve must contain the origin (0, 0)",
            ));
        }
        if stress_strain
            .windows(2)
            .any(|pair| pair[0].strain >= pair[1].strain)
        {
            return Err(CalcError::invalid_material_curve(
                "strains must be strictly ascending",
            ));
        }
        Ok(Self {
            kind,
            section_kind,
            stress_strain,
        })
    }

    pub fn kind(&self) -> MaterialKind {
        self.kind
    }

    pub fn section_kind(&self) -> SectionKind {
        self.section_kind
    }

    /// the curve points, strain ascending
    pub fn stress_strain(&self) -> &[StressStrain] {
        &self.stress_strain
    }

    /// all breakpoint strains, ascending
    pub fn strains(&self) -> impl Iterator<Item = f64> + '_ {
        self.stress_strain.iter().map(|p| p.strain)
    }

    /// largest admissible strain; beyond it the material has failed
    pub fn maximum_strain(&self) -> f64 {
        self.stress_strain[self.stress_strain.len() - 1].strain
    }

    /// smallest admissible strain; beyond it the material has failed
    pub fn minimum_strain(&self) -> f64 {
        self.stress_strain[0].strain
    }

    /// Stress at the given strain by linear interpolation between the
    /// adjacent curve points.
    ///
    /// Strains outside the admissible range are an error (the material has
    /// failed there). The query strain is rounded to 7 decimals first to
    /// absorb float noise from breakpoint depth inversion.
    pub fn stress_at(&self, strain_value: f64) -> CalcResult<f64> {
        let strain_value = round_strain(strain_value);
        let index = self.segment_index(strain_value)?;
        let first = &self.stress_strain[index];
        let second = &self.stress_strain[index + 1];
        Ok(interpolation(
            strain_value,
            (first.strain, first.stress),
            (second.strain, second.stress),
        ))
    }

    /// All breakpoint strains within `[lower, upper]`, endpoints inclusive,
    /// produced lazily in ascending order.
    pub fn strains_between(&self, lower: f64, upper: f64) -> impl Iterator<Item = f64> + '_ {
        let (lower, upper) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };
        self.stress_strain
            .iter()
            .map(|p| p.strain)
            .filter(move |s| lower <= *s && *s <= upper)
    }

    /// Breakpoint strains strictly between `strain_value` and zero, the
    /// zero strain itself excluded.
    ///
    /// These are the anchors a moment-curvature curve visits between the
    /// unloaded state and a strain limit.
    pub fn intermediate_strains(&self, strain_value: f64) -> Vec<f64> {
        let (lower, upper) = if strain_value < 0.0 {
            (strain_value, 0.0)
        } else {
            (0.0, strain_value)
        };
        self.stress_strain
            .iter()
            .map(|p| p.strain)
            .filter(|s| lower < *s && *s < upper && *s != 0.0)
            .collect()
    }

    fn segment_index(&self, strain_value: f64) -> CalcResult<usize> {
        let minimum = self.minimum_strain();
        let maximum = self.maximum_strain();
        if strain_value < minimum || strain_value > maximum {
            return Err(CalcError::StrainOutOfRange {
                strain: strain_value,
                minimum,
                maximum,
            });
        }
        if strain_value == maximum {
            return Ok(self.stress_strain.len() - 2);
        }
        for index in 0..self.stress_strain.len() - 1 {
            if self.stress_strain[index].strain <= strain_value
                && strain_value < self.stress_strain[index + 1].strain
            {
                return Ok(index);
            }
        }
        Err(CalcError::Internal {
            message: format!("no curve segment found for strain {strain_value}"),
        })
    }
}
