//! # Single-Span Loading
//!
//! Internal forces of a simply supported single-span beam under either a
//! uniform line load or a set of single loads. Sign convention: positive
//! moment sags the beam (top fibre in compression), positive shear acts
//! left side up.
//!
//! ## Example
//!
//! ```rust
//! use bend_core::loading::{Loading, SingleSpanUniformLoad};
//!
//! let loading = Loading::uniform(8000.0, 10.0);
//! assert_eq!(loading.maximum_moment(), 8.0e7);
//! assert_eq!(loading.transversal_shear(0.0), 40_000.0);
//! assert_eq!(loading.moment(2000.0), 6.0e7);
//! ```

use serde::{Deserialize, Serialize};

/// A single load on the beam.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleLoad {
    /// position along the beam, measured from the left support
    pub position_in_beam: f64,
    /// load value
    pub value: f64,
}

impl SingleLoad {
    pub fn new(position_in_beam: f64, value: f64) -> Self {
        Self {
            position_in_beam,
            value,
        }
    }

    /// moment of the load about the left support
    pub fn moment(&self) -> f64 {
        self.position_in_beam * self.value
    }
}

/// Single span under a uniform line load.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SingleSpanUniformLoad {
    pub length: f64,
    pub load: f64,
}

impl SingleSpanUniformLoad {
    pub fn new(length: f64, load: f64) -> Self {
        Self { length, load }
    }

    pub fn loading(&self) -> f64 {
        self.length * self.load
    }

    pub fn maximum_moment(&self) -> f64 {
        self.load * self.length.powi(2) / 8.0
    }

    fn support_shear(&self) -> f64 {
        0.5 * self.loading()
    }

    pub fn moment(&self, at_position: f64) -> f64 {
        self.support_shear() * at_position - 0.5 * self.load * at_position.powi(2)
    }

    pub fn transversal_shear(&self, at_position: f64) -> f64 {
        self.support_shear() - self.load * at_position
    }

    /// load that produces `moment` at `at_position`
    pub fn load_by(&self, moment: f64, at_position: f64) -> Self {
        let load = moment / (0.5 * (self.length * at_position - at_position.powi(2)));
        Self::new(self.length, load)
    }
}

/// Single span under a set of single loads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleSpanSingleLoads {
    pub length: f64,
    pub loads: Vec<SingleLoad>,
}

impl SingleSpanSingleLoads {
    pub fn new(length: f64, loads: Vec<SingleLoad>) -> Self {
        Self { length, loads }
    }

    pub fn loading(&self) -> f64 {
        self.loads.iter().map(|load| load.value).sum()
    }

    fn support_shear_right(&self) -> f64 {
        -self.loads.iter().map(|load| load.moment()).sum::<f64>() / self.length
    }

    fn support_shear_left(&self) -> f64 {
        self.loading() + self.support_shear_right()
    }

    pub fn moment(&self, at_position: f64) -> f64 {
        let mut moment = self.support_shear_left() * at_position;
        for load in &self.loads {
            if load.position_in_beam < at_position {
                moment -= load.value * (at_position - load.position_in_beam);
            }
        }
        moment
    }

    pub fn maximum_moment(&self) -> f64 {
        self.load_moments()
            .into_iter()
            .map(|(_, moment)| moment)
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn transversal_shear(&self, at_position: f64) -> f64 {
        let mut shear = self.support_shear_left();
        for load in &self.loads {
            if load.position_in_beam < at_position {
                shear -= load.value;
            }
        }
        shear
    }

    /// positions where the moment attains its maximum (the moment diagram
    /// is piecewise linear, so only load positions are candidates)
    pub fn positions_of_maximum_moment(&self) -> Vec<f64> {
        let load_moments = self.load_moments();
        let maximum = load_moments
            .iter()
            .map(|(_, moment)| *moment)
            .fold(f64::NEG_INFINITY, f64::max);
        let mut positions: Vec<f64> = load_moments
            .into_iter()
            .filter(|(_, moment)| (moment - maximum).abs() < 1e-5 * maximum.abs().max(1.0))
            .map(|(position, _)| position)
            .collect();
        positions.sort_by(|a, b| a.total_cmp(b));
        positions
    }

    /// scaled copy producing `moment` at `at_position`
    pub fn load_by(&self, moment: f64, at_position: f64) -> Self {
        let current = self.moment(at_position);
        let factor = if current == 0.0 { 1.0 } else { moment / current };
        self.with_factor(factor)
    }

    pub fn with_factor(&self, factor: f64) -> Self {
        Self::new(
            self.length,
            self.loads
                .iter()
                .map(|load| SingleLoad::new(load.position_in_beam, load.value * factor))
                .collect(),
        )
    }

    fn load_moments(&self) -> Vec<(f64, f64)> {
        self.loads
            .iter()
            .map(|load| (load.position_in_beam, self.moment(load.position_in_beam)))
            .collect()
    }
}

/// Loading of a single-span beam.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Loading {
    UniformLoad(SingleSpanUniformLoad),
    SingleLoads(SingleSpanSingleLoads),
}

impl Loading {
    pub fn uniform(length: f64, load: f64) -> Self {
        Loading::UniformLoad(SingleSpanUniformLoad::new(length, load))
    }

    pub fn single_loads(length: f64, loads: Vec<SingleLoad>) -> Self {
        Loading::SingleLoads(SingleSpanSingleLoads::new(length, loads))
    }

    pub fn length(&self) -> f64 {
        match self {
            Loading::UniformLoad(beam) => beam.length,
            Loading::SingleLoads(beam) => beam.length,
        }
    }

    /// sum of the applied vertical loads
    pub fn loading(&self) -> f64 {
        match self {
            Loading::UniformLoad(beam) => beam.loading(),
            Loading::SingleLoads(beam) => beam.loading(),
        }
    }

    pub fn maximum_moment(&self) -> f64 {
        match self {
            Loading::UniformLoad(beam) => beam.maximum_moment(),
            Loading::SingleLoads(beam) => beam.maximum_moment(),
        }
    }

    pub fn moment(&self, at_position: f64) -> f64 {
        match self {
            Loading::UniformLoad(beam) => beam.moment(at_position),
            Loading::SingleLoads(beam) => beam.moment(at_position),
        }
    }

    pub fn transversal_shear(&self, at_position: f64) -> f64 {
        match self {
            Loading::UniformLoad(beam) => beam.transversal_shear(at_position),
            Loading::SingleLoads(beam) => beam.transversal_shear(at_position),
        }
    }

    pub fn positions_of_maximum_moment(&self) -> Vec<f64> {
        match self {
            Loading::UniformLoad(beam) => vec![0.5 * beam.length],
            Loading::SingleLoads(beam) => beam.positions_of_maximum_moment(),
        }
    }

    /// mean of the maximum-moment positions; where the largest deflection
    /// is expected
    pub fn position_of_maximum_deformation(&self) -> f64 {
        let positions = self.positions_of_maximum_moment();
        positions.iter().sum::<f64>() / positions.len() as f64
    }

    /// scaled copy of this loading producing `moment` at `at_position`
    pub fn load_by(&self, moment: f64, at_position: f64) -> Loading {
        match self {
            Loading::UniformLoad(beam) => {
                Loading::UniformLoad(beam.load_by(moment, at_position))
            }
            Loading::SingleLoads(beam) => {
                Loading::SingleLoads(beam.load_by(moment, at_position))
            }
        }
    }

    /// Share of the span over which the bending moment is distributed.
    ///
    /// 2/3 for a uniform load, 1/2 for a central single load; for a
    /// symmetric pair of loads the lever of the shear span governs.
    pub fn load_distribution_factor(&self) -> f64 {
        match self {
            Loading::UniformLoad(_) => 2.0 / 3.0,
            Loading::SingleLoads(beam) => {
                let loads = &beam.loads;
                if loads.len() == 1 && loads[0].position_in_beam == 0.5 * beam.length {
                    0.5
                } else if loads.len() > 1
                    && (beam.length - loads[loads.len() - 1].position_in_beam
                        - loads[0].position_in_beam)
                        .abs()
                        < 1e-9
                {
                    let distance =
                        (loads[0].position_in_beam - loads[loads.len() - 1].position_in_beam).abs();
                    let shear_span = -0.5 * (distance - beam.length);
                    1.0 - shear_span / beam.length
                } else {
                    0.5
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_uniform_load() {
        let loading = Loading::uniform(8000.0, 10.0);
        assert_relative_eq!(loading.loading(), 80_000.0);
        assert_relative_eq!(loading.maximum_moment(), 8.0e7);
        assert_relative_eq!(loading.transversal_shear(0.0), 40_000.0);
        assert_relative_eq!(loading.transversal_shear(8000.0), -40_000.0);
        assert_relative_eq!(loading.moment(2000.0), 6.0e7);
        assert_relative_eq!(loading.transversal_shear(4000.0), 0.0);
        assert_eq!(loading.positions_of_maximum_moment(), vec![4000.0]);
    }

    #[test]
    fn test_single_load_at_midspan() {
        let loading = Loading::single_loads(8000.0, vec![SingleLoad::new(4000.0, 10.0)]);
        assert_relative_eq!(loading.maximum_moment(), 20_000.0);
        assert_relative_eq!(loading.transversal_shear(0.0), 5.0);
        assert_relative_eq!(loading.transversal_shear(8000.0), -5.0);
        assert_relative_eq!(loading.moment(2000.0), 10_000.0);
        assert_eq!(loading.positions_of_maximum_moment(), vec![4000.0]);
        assert_relative_eq!(loading.position_of_maximum_deformation(), 4000.0);
    }

    #[test]
    fn test_symmetric_load_pair() {
        let loading = Loading::single_loads(
            6000.0,
            vec![SingleLoad::new(2000.0, 10.0), SingleLoad::new(4000.0, 10.0)],
        );
        // constant moment between the loads
        assert_relative_eq!(loading.moment(2000.0), 20_000.0);
        assert_relative_eq!(loading.moment(3000.0), 20_000.0);
        assert_relative_eq!(loading.moment(4000.0), 20_000.0);
        assert_eq!(
            loading.positions_of_maximum_moment(),
            vec![2000.0, 4000.0]
        );
        assert_relative_eq!(loading.position_of_maximum_deformation(), 3000.0);
        // shear span a = 2000: factor 1 - a/L
        assert_relative_eq!(loading.load_distribution_factor(), 1.0 - 2000.0 / 6000.0);
    }

    #[test]
    fn test_load_by_moment() {
        let loading = Loading::uniform(8000.0, 10.0);
        let scaled = loading.load_by(4.0e7, 4000.0);
        assert_relative_eq!(scaled.maximum_moment(), 4.0e7);

        let single = Loading::single_loads(8000.0, vec![SingleLoad::new(4000.0, 10.0)]);
        let scaled = single.load_by(40_000.0, 4000.0);
        assert_relative_eq!(scaled.maximum_moment(), 40_000.0);
    }

    #[test]
    fn test_distribution_factors() {
        assert_relative_eq!(
            Loading::uniform(8000.0, 1.0).load_distribution_factor(),
            2.0 / 3.0
        );
        assert_relative_eq!(
            Loading::single_loads(8000.0, vec![SingleLoad::new(4000.0, 1.0)])
                .load_distribution_factor(),
            0.5
        );
    }

    #[test]
    fn test_serialization_roundtrip() {
        let loading = Loading::single_loads(8000.0, vec![SingleLoad::new(4000.0, 10.0)]);
        let json = serde_json::to_string(&loading).unwrap();
        assert!(json.contains("\"type\":\"SingleLoads\""));
        let roundtrip: Loading = serde_json::from_str(&json).unwrap();
        assert_eq!(loading, roundtrip);
    }
}
