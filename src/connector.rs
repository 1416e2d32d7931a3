//! # Shear Connectors
//!
//! Headed studs transfer shear between the sub-cross-sections of a
//! composite beam. The resistance is the smaller of the steel shank
//! capacity and the concrete bearing capacity; the load-slip behaviour is
//! bilinear: linear up to 0.5 mm slip, plateau up to 6 mm, failed beyond.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::connector::HeadedStud;
//!
//! let stud = HeadedStud::new(19.0, 100.0, 450.0, 30.0).unwrap();
//! // full resistance from 0.5 mm slip on
//! assert_eq!(stud.load(1.0), stud.resistance());
//! // rising branch below
//! assert_eq!(stud.load(0.25), 0.5 * stud.resistance());
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// slip at which the rising branch reaches the full resistance (mm)
pub const ELASTIC_SLIP: f64 = 0.5;
/// slip at which the stud fails (mm)
pub const MAXIMUM_SLIP: f64 = 6.0;

/// A load-slip pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadSlip {
    pub load: f64,
    pub slip: f64,
}

/// Headed stud shear connector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadedStud {
    /// shank diameter d (mm)
    pub d: f64,
    /// stud height h_sc (mm)
    pub h_sc: f64,
    /// tensile strength of the stud material f_u (N/mm²)
    pub f_u: f64,
    /// mean compressive strength of the surrounding concrete (N/mm²)
    pub f_cm: f64,
    /// position along the beam (mm from the left support)
    pub position: f64,
}

impl HeadedStud {
    pub fn new(d: f64, h_sc: f64, f_u: f64, f_cm: f64) -> CalcResult<Self> {
        if d <= 0.0 || h_sc <= 0.0 || f_u <= 0.0 || f_cm <= 0.0 {
            return Err(CalcError::invalid_input(
                "headed stud",
                format!("d={d}, h_sc={h_sc}, f_u={f_u}, f_cm={f_cm}"),
                "all stud parameters must be positive",
            ));
        }
        Ok(Self {
            d,
            h_sc,
            f_u,
            f_cm,
            position: 0.0,
        })
    }

    pub fn at_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// height factor α: 1 for h_sc/d ≥ 4, else 0.2·(h_sc/d + 1)
    pub fn alpha(&self) -> f64 {
        let ratio = self.h_sc / self.d;
        if ratio >= 4.0 {
            1.0
        } else {
            0.2 * (ratio + 1.0)
        }
    }

    fn e_cm(&self) -> f64 {
        22_000.0 * (self.f_cm / 10.0).powf(0.3)
    }

    /// steel shank capacity f_u·π·d²/4
    pub fn p_steel(&self) -> f64 {
        self.f_u * std::f64::consts::PI * self.d.powi(2) / 4.0
    }

    /// concrete bearing capacity 0.374·d²·α·√(f_cm·E_cm)
    pub fn p_concrete(&self) -> f64 {
        0.374 * self.d.powi(2) * self.alpha() * (self.f_cm * self.e_cm()).sqrt()
    }

    /// stud resistance P_R = min(P_steel, P_concrete)
    pub fn resistance(&self) -> f64 {
        self.p_steel().min(self.p_concrete())
    }

    /// Transferred shear at the given slip (odd in the slip sign).
    ///
    /// Rising linearly to the resistance at 0.5 mm, plateau to 6 mm, zero
    /// beyond (the stud has sheared off).
    pub fn load(&self, slip: f64) -> f64 {
        let magnitude = slip.abs();
        let value = if magnitude <= ELASTIC_SLIP {
            self.resistance() * magnitude / ELASTIC_SLIP
        } else if magnitude <= MAXIMUM_SLIP {
            self.resistance()
        } else {
            0.0
        };
        value * slip.signum()
    }

    /// Slip on the rising branch carrying the given load.
    pub fn slip_by(&self, load: f64) -> f64 {
        load / self.resistance() * ELASTIC_SLIP
    }

    /// load-slip curve breakpoints
    pub fn load_slips(&self) -> Vec<LoadSlip> {
        vec![
            LoadSlip {
                load: 0.0,
                slip: 0.0,
            },
            LoadSlip {
                load: self.resistance(),
                slip: ELASTIC_SLIP,
            },
            LoadSlip {
                load: self.resistance(),
                slip: MAXIMUM_SLIP,
            },
        ]
    }
}

/// Studs of one type spread at equal longitudinal distance over the beam,
/// starting at the left support.
pub fn equal_distanced_shear_connectors(
    connector: HeadedStud,
    longitudinal_distance: f64,
    beam_length: f64,
) -> Vec<HeadedStud> {
    let count = (beam_length / longitudinal_distance).floor() as usize;
    (0..=count)
        .map(|index| connector.at_position(index as f64 * longitudinal_distance))
        .collect()
}
