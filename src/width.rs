//! # Effective Widths
//!
//! A wide concrete slab does not carry load over its full width; shear lag
//! reduces it to an effective width that depends on the slab-width-to-span
//! ratio, the position along the beam and whether the slab acts in bending
//! or membrane (axial) state. This module provides
//!
//! - [`EffectiveWidths`], the container handed to the cross-section: one
//!   half-width for membrane action, one for bending action, plus flags
//!   selecting which of the two applies to concrete/reinforcement in
//!   tension/compression, and
//! - the closed-form width ratios for a slab over a single web under
//!   harmonic, line and single loading (membrane and bending state).
//!
//! The position-dependent ratios are Fourier-series solutions; ten series
//! terms are ample for engineering accuracy.
//!
//! All widths here are *half*-widths measured from the web centre-line,
//! which is how the rectangle split clamps its horizontal edges.

use serde::{Deserialize, Serialize};

use crate::materials::MaterialKind;
use crate::materials::SectionKind;

/// Effective half-widths for the slab of a composite cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveWidths {
    /// effective half-width under axial (membrane) loading
    pub membran: f64,
    /// effective half-width under bending
    pub bending: f64,
    /// section kind the widths apply to
    pub for_section_kind: SectionKind,
    /// reinforcement in tension uses the membrane width (else bending)
    pub reinforcement_under_tension_uses_membran: bool,
    /// reinforcement in compression uses the membrane width (else bending)
    pub reinforcement_under_compression_uses_membran: bool,
    /// concrete in tension uses the membrane width (else bending)
    pub concrete_under_tension_uses_membran: bool,
    /// concrete in compression uses the membrane width (else bending)
    pub concrete_under_compression_uses_membran: bool,
}

impl EffectiveWidths {
    /// Widths for a slab with the customary usage flags: concrete in
    /// compression uses the membrane width, everything else the bending
    /// width.
    pub fn new(membran: f64, bending: f64) -> Self {
        Self {
            membran,
            bending,
            for_section_kind: SectionKind::Slab,
            reinforcement_under_tension_uses_membran: false,
            reinforcement_under_compression_uses_membran: false,
            concrete_under_tension_uses_membran: false,
            concrete_under_compression_uses_membran: true,
        }
    }

    /// Same width for membrane and bending action.
    pub fn uniform(width: f64) -> Self {
        Self::new(width, width)
    }

    /// Effective half-width for the given material under the given strain.
    ///
    /// Materials the widths do not apply to are unclamped.
    pub fn width(&self, material: MaterialKind, strain_value: f64) -> f64 {
        let uses_membran = match material {
            MaterialKind::Concrete => {
                if strain_value > 0.0 {
                    self.concrete_under_tension_uses_membran
                } else {
                    self.concrete_under_compression_uses_membran
                }
            }
            MaterialKind::Reinforcement => {
                if strain_value > 0.0 {
                    self.reinforcement_under_tension_uses_membran
                } else {
                    self.reinforcement_under_compression_uses_membran
                }
            }
            _ => return f64::INFINITY,
        };
        if uses_membran {
            self.membran
        } else {
            self.bending
        }
    }
}

/// default number of Fourier terms for the position-dependent ratios
pub const DEFAULT_SEQUENCES: usize = 10;

fn alpha_k(sequence: usize, span: f64) -> f64 {
    (2.0 * sequence as f64 - 1.0) * std::f64::consts::PI / span
}

/// The position coordinate of the series solutions is measured from
/// mid-span; every term carries cos(α_k·x), which vanishes for all k
/// exactly at the supports (x = ±L/2). Nudge the evaluation point inward
/// to stay on the smooth limit.
fn regularized(position: f64, span: f64) -> f64 {
    let support = 0.5 * span;
    if (position.abs() - support).abs() < 1e-9 * span {
        position.signum() * support * (1.0 - 1e-9)
    } else {
        position
    }
}

/// Membrane-state width ratio b_eff/b, one web, harmonic loading.
pub fn membran_ratio_harmonic(slab_width: f64, span: f64, mu: f64) -> f64 {
    let pi = std::f64::consts::PI;
    let b_over_l = slab_width / span;
    let alpha = pi * b_over_l;
    let denominator = alpha + alpha.sinh() * alpha.cosh();
    let a = ((1.0 + mu) * alpha.sinh().powi(2) + (1.0 - mu) * alpha.powi(2)) / denominator;
    let b = ((1.0 + mu) + (1.0 - mu) * alpha.cosh().powi(2)) / denominator;
    (2.0 / pi) * (1.0 / b_over_l) * (1.0 / (a + 2.0 * b))
}

/// Bending-state width ratio b_eff/b, one web, harmonic loading.
pub fn bending_ratio_harmonic(slab_width: f64, span: f64, mu: f64) -> f64 {
    let pi = std::f64::consts::PI;
    let b_over_l = slab_width / span;
    let alpha = pi * b_over_l;
    (2.0 / pi)
        * (1.0 / b_over_l)
        * ((1.0 - mu) * alpha + (1.0 + mu) * alpha.sinh() * alpha.cosh())
        / alpha.sinh().powi(2)
}

/// Membrane-state width ratio b_eff/b, one web, line loading, at `position`
/// (measured from mid-span).
pub fn membran_ratio_line(
    slab_width: f64,
    span: f64,
    mu: f64,
    sequences: usize,
    position: f64,
) -> f64 {
    let pi = std::f64::consts::PI;
    let position = regularized(position, span);
    let b_over_l = slab_width / span;
    let mut nominator = 0.0;
    let mut denominator = 0.0;
    for k in 1..=sequences {
        let m = 2.0 * k as f64 - 1.0;
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let cos = (alpha_k(k, span) * position).cos();
        let ab = alpha_k(k, span) * slab_width;
        let divisor = ab + ab.sinh() * ab.cosh();
        let a = ((1.0 - mu) * ab.sinh().powi(2) + (1.0 + mu) * ab.powi(2)) / divisor;
        let b = ((1.0 - mu) + (1.0 + mu) * ab.cosh().powi(2)) / divisor;
        nominator += sign / m.powi(3) * cos;
        denominator += sign / m.powi(2) * cos * (a + 2.0 * b);
    }
    (2.0 / pi) * (1.0 / b_over_l) * nominator / denominator
}

/// Bending-state width ratio b_eff/b, one web, line loading, at `position`
/// (measured from mid-span).
pub fn bending_ratio_line(
    slab_width: f64,
    span: f64,
    mu: f64,
    sequences: usize,
    position: f64,
) -> f64 {
    let pi = std::f64::consts::PI;
    let position = regularized(position, span);
    let b_over_l = slab_width / span;
    let mut nominator = 0.0;
    let mut denominator = 0.0;
    for k in 1..=sequences {
        let m = 2.0 * k as f64 - 1.0;
        let sign = if k % 2 == 1 { 1.0 } else { -1.0 };
        let cos = (alpha_k(k, span) * position).cos();
        let ab = alpha_k(k, span) * slab_width;
        let divisor_a = (1.0 - mu) * ab - (3.0 + mu) * ab.sinh() * ab.cosh();
        let a = (1.0 / (1.0 - mu))
            * ((3.0 + mu) * (1.0 - mu) * ab.cosh().powi(2)
                + (1.0 + mu).powi(2)
                + (1.0 - mu).powi(2) * ab.powi(2))
            / divisor_a;
        let divisor_b = (1.0 + mu) * ab - (3.0 + mu) * ab.sinh() * ab.cosh();
        let b = ((3.0 + mu) * ab.cosh() - (1.0 + mu)) / divisor_b;
        nominator += sign / m.powi(3) * cos;
        denominator += sign / m.powi(2) * cos * ((1.0 - mu) * a + 2.0 * mu * b);
    }
    -(2.0 / pi) * (1.0 / b_over_l) * nominator / denominator
}

/// Membrane-state width ratio b_eff/b, one web, single load at mid-span,
/// evaluated at `position` (measured from mid-span).
pub fn membran_ratio_single(
    slab_width: f64,
    span: f64,
    mu: f64,
    sequences: usize,
    position: f64,
) -> f64 {
    let pi = std::f64::consts::PI;
    let position = regularized(position, span);
    let b_over_l = slab_width / span;
    let mut nominator = 0.0;
    let mut denominator = 0.0;
    for k in 1..=sequences {
        let m = 2.0 * k as f64 - 1.0;
        let cos = (alpha_k(k, span) * position).cos();
        let ab = alpha_k(k, span) * slab_width;
        let divisor = ab + ab.sinh() * ab.cosh();
        let a = ((1.0 - mu) * ab.sinh().powi(2) + (1.0 + mu) * ab.powi(2)) / divisor;
        let b = ((1.0 - mu) + (1.0 + mu) * ab.cosh().powi(2)) / divisor;
        nominator += 1.0 / m.powi(2) * cos;
        denominator += 1.0 / m * cos * (a + 2.0 * b);
    }
    (1.0 / pi) * (1.0 / b_over_l) * (nominator / denominator).abs()
}

/// Bending-state width ratio b_eff/b, one web, single load at mid-span,
/// evaluated at `position` (measured from mid-span).
pub fn bending_ratio_single(
    slab_width: f64,
    span: f64,
    mu: f64,
    sequences: usize,
    position: f64,
) -> f64 {
    let pi = std::f64::consts::PI;
    let position = regularized(position, span);
    let b_over_l = slab_width / span;
    let mut nominator = 0.0;
    let mut denominator = 0.0;
    for k in 1..=sequences {
        let m = 2.0 * k as f64 - 1.0;
        let cos = (alpha_k(k, span) * position).cos();
        let ab = alpha_k(k, span) * slab_width;
        let divisor = (1.0 - mu) * ab - (3.0 + mu) * ab.sinh() * ab.cosh();
        let a = (1.0 / (1.0 - mu))
            * (4.0
                + (3.0 + mu) * (1.0 - mu) * ab.sinh().powi(2)
                + (1.0 - mu).powi(2) * ab.powi(2))
            / divisor;
        let b = (-(1.0 + mu) + (3.0 + mu) * ab.cosh().powi(2)) / divisor;
        nominator += 1.0 / m.powi(2) * cos;
        denominator += 1.0 / m * cos * ((1.0 - mu) * a + 2.0 * mu * b);
    }
    -(2.0 / pi) * (1.0 / b_over_l) * nominator / denominator
}

#[cfg(test)]
mod tests {
    use super::*;

    const MU: f64 = 0.2;

    #[test]
    fn test_width_selection() {
        let widths = EffectiveWidths::new(800.0, 600.0);
        // concrete in compression -> membrane width
        assert_eq!(widths.width(MaterialKind::Concrete, -0.001), 800.0);
        // concrete in tension -> bending width
        assert_eq!(widths.width(MaterialKind::Concrete, 0.001), 600.0);
        // reinforcement always bending with default flags
        assert_eq!(widths.width(MaterialKind::Reinforcement, 0.001), 600.0);
        assert_eq!(widths.width(MaterialKind::Reinforcement, -0.001), 600.0);
        // steel never clamped
        assert!(widths.width(MaterialKind::Steel, 0.001).is_infinite());
    }

    #[test]
    fn test_harmonic_ratios_bounded() {
        // slender slab: almost fully effective
        let wide = membran_ratio_harmonic(500.0, 8000.0, MU);
        assert!(wide > 0.9 && wide <= 1.01, "ratio = {wide}");
        // stocky slab: strong shear lag
        let narrow = membran_ratio_harmonic(4000.0, 8000.0, MU);
        assert!(narrow < wide);
        assert!(narrow > 0.0);

        let bending = bending_ratio_harmonic(2000.0, 8000.0, MU);
        assert!(bending > 0.0 && bending < 1.5, "ratio = {bending}");
    }

    #[test]
    fn test_line_ratio_finite_along_span() {
        // position is measured from mid-span
        let at_midspan = membran_ratio_line(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 0.0);
        let at_quarter = membran_ratio_line(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 2000.0);
        assert!(at_midspan.is_finite());
        assert!(at_quarter.is_finite());
        assert!(at_midspan > 0.0);
        assert!(at_quarter > 0.0);
    }

    #[test]
    fn test_support_regularization() {
        // exactly at the support every cosine term vanishes; the nudged
        // evaluation must stay finite
        let at_support = bending_ratio_line(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 4000.0);
        let near_support = bending_ratio_line(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 3999.0);
        assert!(at_support.is_finite());
        assert!(near_support.is_finite());
    }

    #[test]
    fn test_single_load_ratios_finite() {
        let membran = membran_ratio_single(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 1000.0);
        let bending = bending_ratio_single(2000.0, 8000.0, MU, DEFAULT_SEQUENCES, 1000.0);
        assert!(membran.is_finite() && membran > 0.0);
        assert!(bending.is_finite());
    }

    #[test]
    fn test_serialization_roundtrip() {
        let widths = EffectiveWidths::uniform(700.0);
        let json = serde_json::to_string(&widths).unwrap();
        let roundtrip: EffectiveWidths = serde_json::from_str(&json).unwrap();
        assert_eq!(widths, roundtrip);
    }
}
