//! # Structural Steel and Reinforcement
//!
//! Both materials share the same symmetric curve forms:
//!
//! 1. no `failure_strain` - linear-elastic,
//! 2. `failure_strain` without `f_u` - ideal-plastic plateau at f_y,
//! 3. `failure_strain` and `f_u` - bi-linear hardening to (ε_u, f_u).
//!
//! The yield strain is f_y / E. Steel belongs to the girder, reinforcement
//! to the slab.

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::{Material, MaterialKind, SectionKind, StressStrain};

/// Structural steel configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Steel {
    /// yield strength f_y (N/mm²)
    pub f_y: f64,
    /// tensile strength f_u; f_y is used when omitted
    pub f_u: Option<f64>,
    /// strain at failure; omitting it selects linear-elastic behaviour
    pub failure_strain: Option<f64>,
    /// modulus of elasticity E_a (N/mm²)
    pub e_a: f64,
}

impl Steel {
    pub fn new(f_y: f64) -> CalcResult<Self> {
        if f_y <= 0.0 {
            return Err(CalcError::invalid_input(
                "f_y",
                f_y.to_string(),
                "yield strength must be positive",
            ));
        }
        Ok(Self {
            f_y,
            f_u: None,
            failure_strain: None,
            e_a: 210_000.0,
        })
    }

    pub fn with_f_u(mut self, f_u: f64) -> Self {
        self.f_u = Some(f_u);
        self
    }

    pub fn with_failure_strain(mut self, failure_strain: f64) -> Self {
        self.failure_strain = Some(failure_strain);
        self
    }

    pub fn with_modulus(mut self, e_a: f64) -> Self {
        self.e_a = e_a;
        self
    }

    /// yield strain ε_y = f_y / E_a
    pub fn yield_strain(&self) -> f64 {
        self.f_y / self.e_a
    }

    /// Assemble the symmetric piecewise-linear curve.
    pub fn material(&self) -> Material {
        build_material(
            MaterialKind::Steel,
            SectionKind::Girder,
            self.f_y,
            self.f_u,
            self.failure_strain,
            self.e_a,
        )
    }
}

/// Reinforcement configuration; the curve forms match [`Steel`], the
/// defaults differ (E_s = 200 000 N/mm²) and the bars belong to the slab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reinforcement {
    /// yield strength f_s (N/mm²)
    pub f_s: f64,
    /// tensile strength f_su; f_s is used when omitted
    pub f_su: Option<f64>,
    /// strain at failure; omitting it selects linear-elastic behaviour
    pub failure_strain: Option<f64>,
    /// modulus of elasticity E_s (N/mm²)
    pub e_s: f64,
}

impl Reinforcement {
    pub fn new(f_s: f64) -> CalcResult<Self> {
        if f_s <= 0.0 {
            return Err(CalcError::invalid_input(
                "f_s",
                f_s.to_string(),
                "yield strength must be positive",
            ));
        }
        Ok(Self {
            f_s,
            f_su: None,
            failure_strain: None,
            e_s: 200_000.0,
        })
    }

    pub fn with_f_su(mut self, f_su: f64) -> Self {
        self.f_su = Some(f_su);
        self
    }

    pub fn with_failure_strain(mut self, failure_strain: f64) -> Self {
        self.failure_strain = Some(failure_strain);
        self
    }

    pub fn with_modulus(mut self, e_s: f64) -> Self {
        self.e_s = e_s;
        self
    }

    pub fn yield_strain(&self) -> f64 {
        self.f_s / self.e_s
    }

    pub fn material(&self) -> Material {
        build_material(
            MaterialKind::Reinforcement,
            SectionKind::Slab,
            self.f_s,
            self.f_su,
            self.failure_strain,
            self.e_s,
        )
    }
}

fn build_material(
    kind: MaterialKind,
    section_kind: SectionKind,
    f_y: f64,
    f_u: Option<f64>,
    failure_strain: Option<f64>,
    modulus: f64,
) -> Material {
    let mut half = vec![StressStrain::new(0.0, 0.0)];
    match failure_strain {
        None => {
            // elastic: stress at unit strain is the modulus itself
            half.push(StressStrain::new(1.0, modulus));
        }
        Some(failure) => {
            half.push(StressStrain::new(f_y / modulus, f_y));
            half.push(StressStrain::new(failure, f_u.unwrap_or(f_y)));
        }
    }
    let mut points: Vec<StressStrain> = half
        .iter()
        .skip(1)
        .map(|p| StressStrain::new(-p.strain, -p.stress))
        .collect();
    points.extend(half);
    // the assembled curve is valid by construction
    Material::from_points(kind, section_kind, points)
        .expect("symmetric steel curve is always valid")
}
