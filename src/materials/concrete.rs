//! # Concrete
//!
//! Concrete stress-strain curves per EN 1992-1-1. Three compression laws are
//! available; the tension branch either drops to zero right after the
//! tensile strength (default) or softens along the fracture-energy
//! crack-opening law of the fib Model Code.
//!
//! All strengths are mean values in N/mm². Compression strains and stresses
//! come out negative, tension positive.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::materials::Concrete;
//!
//! let concrete = Concrete::new(38.0).unwrap();
//! let material = concrete.material().unwrap();
//! // peak compressive stress is -f_cm for the nonlinear law
//! assert!((material.minimum_strain() + 0.0035).abs() < 1e-4);
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::materials::{Material, MaterialKind, SectionKind, StressStrain};

/// Compression stress-strain law selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConcreteCompressionModel {
    /// EN 1992-1-1 Formula 3.14, sampled adaptively
    #[default]
    Nonlinear,
    /// parabola up to the peak strain, rectangle to failure
    Parabola,
    /// linear up to the peak strain, plateau to failure
    Bilinear,
}

/// Tension stress-strain law selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConcreteTensionModel {
    /// stress drops to zero right after the tensile strength
    #[default]
    Default,
    /// fracture-energy crack-opening softening
    ConsiderOpeningBehaviour,
}

/// Concrete configuration; turns into a [`Material`] via
/// [`material`](Concrete::material).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Concrete {
    /// mean cylinder compressive strength f_cm (N/mm²)
    pub f_cm: f64,
    /// mean tensile strength f_ctm; derived from f_cm when omitted
    pub f_ctm: Option<f64>,
    /// compute a tension branch at all
    pub use_tension: bool,
    pub compression_model: ConcreteCompressionModel,
    pub tension_model: ConcreteTensionModel,
}

impl Concrete {
    /// Concrete with the default models (nonlinear compression, tension
    /// dropping after the tensile strength).
    pub fn new(f_cm: f64) -> CalcResult<Self> {
        if f_cm <= 8.0 {
            return Err(CalcError::invalid_input(
                "f_cm",
                f_cm.to_string(),
                "mean compressive strength must exceed 8 N/mm2 (f_ck = f_cm - 8)",
            ));
        }
        Ok(Self {
            f_cm,
            f_ctm: None,
            use_tension: true,
            compression_model: ConcreteCompressionModel::default(),
            tension_model: ConcreteTensionModel::default(),
        })
    }

    pub fn with_f_ctm(mut self, f_ctm: f64) -> Self {
        self.f_ctm = Some(f_ctm);
        self
    }

    pub fn with_compression_model(mut self, model: ConcreteCompressionModel) -> Self {
        self.compression_model = model;
        self
    }

    pub fn with_tension_model(mut self, model: ConcreteTensionModel) -> Self {
        self.tension_model = model;
        self
    }

    pub fn without_tension(mut self) -> Self {
        self.use_tension = false;
        self
    }

    /// characteristic compressive strength f_ck = f_cm − 8
    pub fn f_ck(&self) -> f64 {
        self.f_cm - 8.0
    }

    /// mean modulus of elasticity E_cm = 22000·(f_cm/10)^0.3
    pub fn e_cm(&self) -> f64 {
        22_000.0 * (self.f_cm / 10.0).powf(0.3)
    }

    /// strain up to which compression is assumed linear-elastic
    pub fn yield_strain(&self) -> f64 {
        0.4 * self.f_cm / self.e_cm()
    }

    /// mean tensile strength, derived from f_cm when not set explicitly
    pub fn f_ctm(&self) -> f64 {
        match self.f_ctm {
            Some(value) => value,
            None => {
                if self.f_ck() <= 50.0 {
                    0.3 * self.f_cm
                } else {
                    2.12 * (1.0 + 0.1 * self.f_cm).ln()
                }
            }
        }
    }

    /// fracture energy G_F = 73·f_cm^0.18 N/m, returned in N/mm
    pub fn fracture_energy(&self) -> f64 {
        0.073 * self.f_cm.powf(0.18)
    }

    /// Assemble the piecewise-linear material curve.
    pub fn material(&self) -> CalcResult<Material> {
        let mut points = self.compression_points();
        points.push(StressStrain::new(0.0, 0.0));
        points.extend(self.tension_points());
        Material::from_points(MaterialKind::Concrete, SectionKind::Slab, points)
    }

    fn compression_points(&self) -> Vec<StressStrain> {
        let magnitudes = match self.compression_model {
            ConcreteCompressionModel::Nonlinear => self.nonlinear_points(),
            ConcreteCompressionModel::Parabola => self.parabola_points(),
            ConcreteCompressionModel::Bilinear => self.bilinear_points(),
        };
        magnitudes
            .into_iter()
            .map(|p| StressStrain::new(-p.strain, -p.stress))
            .collect()
    }

    /// strain at peak stress for the nonlinear law, ε_c1 = 0.7·f_cm^0.31
    /// (per mille, capped at 2.8)
    fn nonlinear_peak_strain(&self) -> f64 {
        (0.7 * self.f_cm.powf(0.31)).min(2.8) * 1e-3
    }

    /// failure strain for the nonlinear law,
    /// ε_cu1 = 2.8 + 27·((98 − f_cm)/100)⁴ (per mille, capped at 3.5)
    fn nonlinear_failure_strain(&self) -> f64 {
        (2.8 + 27.0 * ((98.0 - self.f_cm) / 100.0).powi(4)).min(3.5) * 1e-3
    }

    /// σ_c(ε) = f_cm·(k·η − η²)/(1 + (k − 2)·η), all values as magnitudes
    fn nonlinear_stress(&self, strain: f64) -> f64 {
        let c = self.nonlinear_peak_strain();
        let eta = strain / c;
        let k = 1.05 * self.e_cm() * c / self.f_cm;
        self.f_cm * (k * eta - eta * eta) / (1.0 + (k - 2.0) * eta)
    }

    /// Sample the continuous nonlinear law by monotone refinement: split
    /// every chord whose midpoint misses the curve by more than 1 % of
    /// f_cm. Deterministic and independent of the strain range.
    fn nonlinear_points(&self) -> Vec<StressStrain> {
        let tolerance = 0.01 * self.f_cm;
        let mut strains = vec![
            self.yield_strain(),
            self.nonlinear_peak_strain(),
            self.nonlinear_failure_strain(),
        ];
        loop {
            let mut refined = Vec::with_capacity(strains.len() * 2);
            let mut inserted = false;
            for pair in strains.windows(2) {
                refined.push(pair[0]);
                let mid = 0.5 * (pair[0] + pair[1]);
                let chord = 0.5 * (self.nonlinear_stress(pair[0]) + self.nonlinear_stress(pair[1]));
                if (self.nonlinear_stress(mid) - chord).abs() > tolerance {
                    refined.push(mid);
                    inserted = true;
                }
            }
            refined.push(strains[strains.len() - 1]);
            strains = refined;
            if !inserted {
                break;
            }
        }
        strains
            .into_iter()
            .map(|s| StressStrain::new(s, self.nonlinear_stress(s)))
            .collect()
    }

    fn parabola_points(&self) -> Vec<StressStrain> {
        let f_ck = self.f_ck();
        let c = if f_ck <= 50.0 {
            2.0e-3
        } else {
            (2.0 + 0.085 * (f_ck - 50.0).powf(0.53)) * 1e-3
        };
        let cu = ((2.6 + 35.0 * ((90.0 - f_ck) / 100.0).powi(4)) * 1e-3).min(3.5e-3);
        let n = (1.4 + 23.4 * ((90.0 - f_ck) / 100.0).powi(4)).min(2.0);
        let stress = |strain: f64| {
            if strain <= c {
                f_ck * (1.0 - (1.0 - strain / c).powf(n))
            } else {
                f_ck
            }
        };
        [0.25 * c, 0.5 * c, 0.75 * c, c, cu]
            .into_iter()
            .map(|s| StressStrain::new(s, stress(s)))
            .collect()
    }

    fn bilinear_points(&self) -> Vec<StressStrain> {
        let f_ck = self.f_ck();
        let c = ((1.75 + 0.55 * (f_ck - 50.0) / 40.0) * 1e-3).max(1.75e-3);
        let cu = ((2.6 + 35.0 * ((90.0 - f_ck) / 100.0).powi(4)) * 1e-3).min(3.5e-3);
        vec![StressStrain::new(c, f_ck), StressStrain::new(cu, f_ck)]
    }

    fn tension_points(&self) -> Vec<StressStrain> {
        // far zero point so the material never "fails" in tension once the
        // stress has dropped; strain 10 is beyond any section strain
        let far = StressStrain::new(10.0, 0.0);
        if !self.use_tension {
            return vec![StressStrain::new(1e-10, 0.0), far];
        }
        let f_ctm = self.f_ctm();
        let yield_strain = f_ctm / self.e_cm();
        let mut points = vec![StressStrain::new(yield_strain, f_ctm)];
        match self.tension_model {
            ConcreteTensionModel::Default => {
                points.push(StressStrain::new(yield_strain + 1e-6, 0.0));
            }
            ConcreteTensionModel::ConsiderOpeningBehaviour => {
                let g_f = self.fracture_energy();
                points.push(StressStrain::new(g_f / f_ctm, 0.2 * f_ctm));
                points.push(StressStrain::new(5.0 * g_f / f_ctm, 0.0));
            }
        }
        points.push(far);
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_elastic_modulus() {
        let concrete = Concrete::new(38.0).unwrap();
        // E_cm = 22000·3.8^0.3
        assert_relative_eq!(concrete.e_cm(), 22_000.0 * 3.8f64.powf(0.3), epsilon = 1e-9);
    }

    #[test]
    fn test_rejects_low_strength() {
        assert!(Concrete::new(8.0).is_err());
        assert!(Concrete::new(-30.0).is_err());
    }

    #[test]
    fn test_nonlinear_curve_hits_peak() {
        let concrete = Concrete::new(30.0).unwrap();
        let material = concrete.material().unwrap();
        // peak compressive stress must reach -f_cm at the peak strain
        let peak_strain = -concrete.nonlinear_peak_strain();
        assert_relative_eq!(material.stress_at(peak_strain).unwrap(), -30.0, epsilon = 0.3);
        // failure strain for f_cm = 30: 2.8 + 27·0.68^4 per mille
        let expected_cu = (2.8 + 27.0 * 0.68f64.powi(4)) * 1e-3;
        assert_relative_eq!(material.minimum_strain(), -expected_cu.min(3.5e-3));
    }

    #[test]
    fn test_nonlinear_sampling_within_chord_tolerance() {
        let concrete = Concrete::new(30.0).unwrap();
        let points = concrete.nonlinear_points();
        let tolerance = 0.01 * concrete.f_cm;
        for pair in points.windows(2) {
            let mid = 0.5 * (pair[0].strain + pair[1].strain);
            let chord = 0.5 * (pair[0].stress + pair[1].stress);
            assert!(
                (concrete.nonlinear_stress(mid) - chord).abs() <= tolerance,
                "chord error above 1% of f_cm between {} and {}",
                pair[0].strain,
                pair[1].strain
            );
        }
    }

    #[test]
    fn test_parabola_curve() {
        let concrete = Concrete::new(30.0)
            .unwrap()
            .with_compression_model(ConcreteCompressionModel::Parabola);
        let material = concrete.material().unwrap();
        // plateau at -f_ck between peak and failure strain
        assert_relative_eq!(material.stress_at(-0.002).unwrap(), -22.0, epsilon = 1e-9);
        assert_relative_eq!(material.stress_at(-0.0035).unwrap(), -22.0, epsilon = 1e-9);
        // parabola: at 0.5·c the stress is f_ck·(1 − 0.5²) = 0.75·f_ck
        assert_relative_eq!(material.stress_at(-0.001).unwrap(), -16.5, epsilon = 1e-9);
    }

    #[test]
    fn test_bilinear_curve() {
        let concrete = Concrete::new(30.0)
            .unwrap()
            .with_compression_model(ConcreteCompressionModel::Bilinear);
        let material = concrete.material().unwrap();
        assert_relative_eq!(material.stress_at(-0.00175).unwrap(), -22.0, epsilon = 1e-9);
        assert_relative_eq!(material.stress_at(-0.0035).unwrap(), -22.0, epsilon = 1e-9);
        // linear up to the peak strain
        assert_relative_eq!(material.stress_at(-0.000875).unwrap(), -11.0, epsilon = 1e-9);
    }

    #[test]
    fn test_tension_default_drops_after_strength() {
        let concrete = Concrete::new(38.0).unwrap();
        let material = concrete.material().unwrap();
        let f_ctm = concrete.f_ctm();
        let yield_strain = f_ctm / concrete.e_cm();
        assert_relative_eq!(material.stress_at(yield_strain).unwrap(), f_ctm, epsilon = 1e-6);
        assert_relative_eq!(material.stress_at(2.0 * yield_strain).unwrap(), 0.0, epsilon = 1e-9);
        // far point keeps the material alive in tension
        assert_relative_eq!(material.maximum_strain(), 10.0);
    }

    #[test]
    fn test_tension_opening_behaviour() {
        let concrete = Concrete::new(38.0)
            .unwrap()
            .with_tension_model(ConcreteTensionModel::ConsiderOpeningBehaviour);
        let material = concrete.material().unwrap();
        let f_ctm = concrete.f_ctm();
        let w_1 = concrete.fracture_energy() / f_ctm;
        assert_relative_eq!(material.stress_at(w_1).unwrap(), 0.2 * f_ctm, epsilon = 1e-6);
        assert_relative_eq!(material.stress_at(5.0 * w_1).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_without_tension_sentinel() {
        let concrete = Concrete::new(38.0).unwrap().without_tension();
        let material = concrete.material().unwrap();
        assert_relative_eq!(material.stress_at(0.001).unwrap(), 0.0, epsilon = 1e-12);
        assert_relative_eq!(material.stress_at(5.0).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_explicit_f_ctm_wins() {
        let concrete = Concrete::new(38.0).unwrap().with_f_ctm(2.9);
        assert_relative_eq!(concrete.f_ctm(), 2.9);
    }
}
