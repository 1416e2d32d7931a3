//! # Beams
//!
//! A single-span beam is discretised into equal elements. Every node
//! carries a cross-section scaled to the effective widths at its position
//! and the resistance curve computed from it:
//!
//! - [`Beam`] - full interaction: one M-κ curve per node; the deflection
//!   at a position is the virtual-force integral of κ(x)·M̄(x) over the
//!   node grid (trapezoidal),
//! - [`CompositeBeam`] - two sub-cross-sections joined by shear
//!   connectors: one M-N-κ-εΔ surface per node; the slip distribution is
//!   iterated with the damped Gauss-Newton scheme until the resisting
//!   moment matches the external moment at every node.
//!
//! Node curves are independent of each other and are computed on a thread
//! pool. A load step whose equilibrium cannot be found is reported as a
//! failed step; earlier steps stay valid.

use rayon::prelude::*;

use crate::connector::HeadedStud;
use crate::crosssection::Crosssection;
use crate::curves::m_kappa::{MKappaCurve, MKappaCurvePoints};
use crate::curves::m_n_kappa::{MNKappaCurve, MNKappaCurvePoints};
use crate::errors::{CalcResult, FailureReason, NotSuccessful};
use crate::fitting::LevenbergMarquardt;
use crate::loading::{Loading, SingleLoad, SingleSpanSingleLoads};
use crate::materials::SectionKind;
use crate::strain::interpolation;
use crate::width::{
    bending_ratio_line, bending_ratio_single, membran_ratio_line, membran_ratio_single,
    EffectiveWidths, DEFAULT_SEQUENCES,
};

/// Poisson's ratio of the slab used for the effective-width ratios
const SLAB_POISSON_RATIO: f64 = 0.2;

/// A beam node: position, width-adjusted cross-section and its
/// moment-curvature curve.
#[derive(Debug, Clone)]
pub struct Node {
    position: f64,
    cross_section: Crosssection,
    curve: MKappaCurvePoints,
}

impl Node {
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn cross_section(&self) -> &Crosssection {
        &self.cross_section
    }

    pub fn curve(&self) -> &MKappaCurvePoints {
        &self.curve
    }

    /// curvature at this node under the given moment
    pub fn curvature_by(&self, moment: f64) -> CalcResult<f64> {
        self.curve.curvature_by(moment)
    }
}

/// Single-span beam under full interaction.
#[derive(Debug, Clone)]
pub struct Beam {
    loading: Loading,
    nodes: Vec<Node>,
}

impl Beam {
    /// Discretise the beam and compute one M-κ curve per node.
    ///
    /// With `consider_widths` the slab sections of every node are clamped
    /// to the effective widths at the node position.
    pub fn new(
        cross_section: Crosssection,
        loading: Loading,
        element_number: usize,
        consider_widths: bool,
    ) -> CalcResult<Self> {
        validate_element_number(element_number)?;
        let positions = node_positions(&loading, element_number);
        let nodes: Vec<CalcResult<Node>> = positions
            .par_iter()
            .map(|position| {
                let node_cross_section =
                    scaled_cross_section(&cross_section, &loading, *position, consider_widths)?;
                let curve = MKappaCurve::new(&node_cross_section).compute()?;
                Ok(Node {
                    position: *position,
                    cross_section: node_cross_section,
                    curve: curve.points,
                })
            })
            .collect();
        let nodes = nodes.into_iter().collect::<CalcResult<Vec<Node>>>()?;
        Ok(Self { loading, nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn loading(&self) -> &Loading {
        &self.loading
    }

    pub fn length(&self) -> f64 {
        self.loading.length()
    }

    /// Deflection at `at_position` under `load` by the principle of
    /// virtual forces: ∫ κ(x)·M̄(x) dx over the node grid, with a unit
    /// load placed at `at_position`.
    pub fn deformation(&self, at_position: f64, load: &Loading) -> CalcResult<f64> {
        if at_position <= 0.0 || at_position >= self.length() {
            return Ok(0.0);
        }
        let curvatures = self
            .nodes
            .iter()
            .map(|node| node.curvature_by(load.moment(node.position)))
            .collect::<CalcResult<Vec<f64>>>()?;
        Ok(self.integrate_virtual(at_position, &curvatures))
    }

    /// Load steps visiting every moment breakpoint of the decisive node
    /// (the node at the position of maximum deformation).
    pub fn load_steps(&self) -> Vec<Loading> {
        let decisive = self.decisive_node();
        let mut moments: Vec<f64> = decisive
            .curve
            .points()
            .iter()
            .filter(|p| p.curvature > 0.0 && p.moment > 0.0)
            .map(|p| p.moment)
            .collect();
        moments.sort_by(|a, b| a.total_cmp(b));
        moments.dedup();
        moments
            .into_iter()
            .map(|moment| self.loading.load_by(moment, decisive.position))
            .collect()
    }

    /// Load-deflection pairs at the position of maximum deformation over
    /// all load steps; a failed step is recorded, not fatal.
    pub fn deformations_over_load_steps(&self) -> Vec<LoadStepResult> {
        let position = self.loading.position_of_maximum_deformation();
        self.load_steps()
            .into_iter()
            .map(|step| {
                let deformation = self.deformation(position, &step);
                LoadStepResult {
                    loading: step,
                    deformation,
                }
            })
            .collect()
    }

    fn decisive_node(&self) -> &Node {
        let reference = self.loading.position_of_maximum_deformation();
        self.nodes
            .iter()
            .min_by(|a, b| {
                (a.position - reference)
                    .abs()
                    .total_cmp(&(b.position - reference).abs())
            })
            .expect("beam has nodes")
    }

    fn integrate_virtual(&self, at_position: f64, curvatures: &[f64]) -> f64 {
        integrate_virtual(&self.node_positions_vec(), curvatures, self.length(), at_position)
    }

    fn node_positions_vec(&self) -> Vec<f64> {
        self.nodes.iter().map(|node| node.position).collect()
    }
}

/// One load step and the deflection it produced.
#[derive(Debug, Clone)]
pub struct LoadStepResult {
    pub loading: Loading,
    pub deformation: CalcResult<f64>,
}

/// A composite-beam node carrying the M-N-κ-εΔ surface.
#[derive(Debug, Clone)]
pub struct CompositeNode {
    position: f64,
    surface: MNKappaCurvePoints,
}

impl CompositeNode {
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn surface(&self) -> &MNKappaCurvePoints {
        &self.surface
    }
}

/// Converged slip state of one load step.
#[derive(Debug, Clone)]
pub struct SlipSolution {
    /// slip per node (slab against girder)
    pub slip: Vec<f64>,
    /// axial force transferred into the slab per node
    pub axial_forces: Vec<f64>,
    /// strain difference per node
    pub strain_differences: Vec<f64>,
    /// curvature per node, read off the surface
    pub curvatures: Vec<f64>,
    /// ‖M_R − M_E‖∞ at the solution
    pub residual_norm: f64,
}

/// Result of one composite load step.
#[derive(Debug, Clone)]
pub struct CompositeStepResult {
    pub loading: Loading,
    pub outcome: Result<CompositeStepState, NotSuccessful>,
}

/// Converged state of one composite load step.
#[derive(Debug, Clone)]
pub struct CompositeStepState {
    pub slip: SlipSolution,
    /// deflection at the position of maximum deformation
    pub deformation: f64,
}

/// Single-span composite beam with a shear joint between slab and girder.
#[derive(Debug, Clone)]
pub struct CompositeBeam {
    loading: Loading,
    connectors: Vec<HeadedStud>,
    nodes: Vec<CompositeNode>,
    fitting: LevenbergMarquardt,
}

impl CompositeBeam {
    /// Discretise the beam and compute one M-N-κ-εΔ surface per node.
    ///
    /// The cross-section is split into its slab and girder sub-cross-
    /// sections; both kinds must be present.
    pub fn new(
        cross_section: &Crosssection,
        loading: Loading,
        element_number: usize,
        connectors: Vec<HeadedStud>,
        consider_widths: bool,
    ) -> CalcResult<Self> {
        validate_element_number(element_number)?;
        let girder = cross_section.sub_cross_section(SectionKind::Girder)?;
        let positions = node_positions(&loading, element_number);
        let nodes: Vec<CalcResult<CompositeNode>> = positions
            .par_iter()
            .map(|position| {
                let slab = scaled_cross_section(
                    &cross_section.sub_cross_section(SectionKind::Slab)?,
                    &loading,
                    *position,
                    consider_widths,
                )?;
                let surface = MNKappaCurve::new((&slab, &girder)).compute()?;
                Ok(CompositeNode {
                    position: *position,
                    surface: surface.points,
                })
            })
            .collect();
        let nodes = nodes
            .into_iter()
            .collect::<CalcResult<Vec<CompositeNode>>>()?;
        Ok(Self {
            loading,
            connectors,
            nodes,
            // moment residuals in N·mm, slip steps in mm
            fitting: LevenbergMarquardt::new().with_tolerances(100.0, 0.01),
        })
    }

    pub fn nodes(&self) -> &[CompositeNode] {
        &self.nodes
    }

    pub fn length(&self) -> f64 {
        self.loading.length()
    }

    pub fn with_fitting(mut self, fitting: LevenbergMarquardt) -> Self {
        self.fitting = fitting;
        self
    }

    /// Solve the slip distribution under `load`.
    ///
    /// `initial_slip` seeds the iteration (the previous step's solution);
    /// zero slip otherwise.
    pub fn solve_step(
        &self,
        load: &Loading,
        initial_slip: Option<&[f64]>,
    ) -> Result<SlipSolution, NotSuccessful> {
        let start = match initial_slip {
            Some(slip) => slip.to_vec(),
            None => vec![0.0; self.nodes.len()],
        };
        let external: Vec<f64> = self
            .nodes
            .iter()
            .map(|node| load.moment(node.position))
            .collect();
        let fit = self.fitting.solve(&start, |slip| {
            let (_, strain_differences, axial_forces) = self.joint_state(slip);
            let mut residuals = Vec::with_capacity(self.nodes.len());
            for (index, node) in self.nodes.iter().enumerate() {
                let (resisting, _) = node
                    .surface
                    .state_by(axial_forces[index], strain_differences[index])?;
                residuals.push(resisting - external[index]);
            }
            Ok(residuals)
        })?;
        let (_, strain_differences, axial_forces) = self.joint_state(&fit.solution);
        let mut curvatures = Vec::with_capacity(self.nodes.len());
        for (index, node) in self.nodes.iter().enumerate() {
            let (_, curvature) = node
                .surface
                .state_by(axial_forces[index], strain_differences[index])
                .map_err(|_| {
                    NotSuccessful::new(FailureReason::OutsideCurveRange {
                        value: axial_forces[index],
                    })
                })?;
            curvatures.push(curvature);
        }
        Ok(SlipSolution {
            slip: fit.solution,
            axial_forces,
            strain_differences,
            curvatures,
            residual_norm: fit.residual_norm,
        })
    }

    /// Deflection at `at_position` for a solved slip state.
    pub fn deformation(&self, at_position: f64, solution: &SlipSolution) -> f64 {
        if at_position <= 0.0 || at_position >= self.length() {
            return 0.0;
        }
        let positions: Vec<f64> = self.nodes.iter().map(|node| node.position).collect();
        integrate_virtual(&positions, &solution.curvatures, self.length(), at_position)
    }

    /// Load steps from the decisive node's surface moments.
    pub fn load_steps(&self) -> Vec<Loading> {
        let reference = self.loading.position_of_maximum_deformation();
        let decisive = self
            .nodes
            .iter()
            .min_by(|a, b| {
                (a.position - reference)
                    .abs()
                    .total_cmp(&(b.position - reference).abs())
            })
            .expect("beam has nodes");
        let mut moments: Vec<f64> = decisive
            .surface
            .points()
            .iter()
            .filter(|p| p.moment > 0.0)
            .map(|p| p.moment)
            .collect();
        moments.sort_by(|a, b| a.total_cmp(b));
        moments.dedup();
        moments
            .into_iter()
            .map(|moment| self.loading.load_by(moment, reference))
            .collect()
    }

    /// Walk the load steps, reusing each converged slip distribution as
    /// the seed of the next step. Failed steps are recorded; the walk
    /// continues with the last good seed.
    pub fn analyze(&self) -> Vec<CompositeStepResult> {
        let position = self.loading.position_of_maximum_deformation();
        let mut results = Vec::new();
        let mut seed: Option<Vec<f64>> = None;
        for step in self.load_steps() {
            let outcome = self.solve_step(&step, seed.as_deref());
            let outcome = match outcome {
                Ok(solution) => {
                    seed = Some(solution.slip.clone());
                    let deformation = self.deformation(position, &solution);
                    Ok(CompositeStepState {
                        slip: solution,
                        deformation,
                    })
                }
                Err(reason) => Err(reason),
            };
            results.push(CompositeStepResult {
                loading: step,
                outcome,
            });
        }
        results
    }

    /// Slip-zero crossing, strain differences and axial forces for a slip
    /// distribution.
    ///
    /// εΔ_i = s_i / (x_i − x_{s=0}) per the joint kinematics; the axial
    /// force accumulates the connector shear from the nearest support so
    /// the free ends carry no axial force.
    fn joint_state(&self, slip: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        let positions: Vec<f64> = self.nodes.iter().map(|node| node.position).collect();
        let crossing = self.slip_zero_crossing(&positions, slip);
        let length = self.length();
        let strain_differences: Vec<f64> = positions
            .iter()
            .enumerate()
            .map(|(index, x)| {
                let lever = x - crossing;
                if lever.abs() < 1e-6 * length {
                    slip_slope(&positions, slip, index)
                } else {
                    slip[index] / lever
                }
            })
            .collect();
        let axial_forces: Vec<f64> = positions
            .iter()
            .map(|x| {
                if *x <= crossing {
                    self.connectors
                        .iter()
                        .filter(|c| c.position <= *x)
                        .map(|c| c.load(slip_at(&positions, slip, c.position)))
                        .sum::<f64>()
                } else {
                    -self
                        .connectors
                        .iter()
                        .filter(|c| c.position >= *x)
                        .map(|c| c.load(slip_at(&positions, slip, c.position)))
                        .sum::<f64>()
                }
            })
            .collect();
        (crossing, strain_differences, axial_forces)
    }

    fn slip_zero_crossing(&self, positions: &[f64], slip: &[f64]) -> f64 {
        let reference = self.loading.position_of_maximum_deformation();
        let mut crossings = Vec::new();
        for index in 0..slip.len() - 1 {
            let (a, b) = (slip[index], slip[index + 1]);
            if a == 0.0 && b == 0.0 {
                continue;
            }
            if a == 0.0 {
                crossings.push(positions[index]);
            } else if a * b < 0.0 {
                crossings.push(interpolation(
                    0.0,
                    (a, positions[index]),
                    (b, positions[index + 1]),
                ));
            }
        }
        if slip.last() == Some(&0.0) && slip.iter().any(|s| *s != 0.0) {
            crossings.push(*positions.last().expect("beam has nodes"));
        }
        crossings
            .into_iter()
            .min_by(|a, b| {
                (a - reference).abs().total_cmp(&(b - reference).abs())
            })
            .unwrap_or(reference)
    }
}

fn validate_element_number(element_number: usize) -> CalcResult<()> {
    if element_number == 0 {
        return Err(crate::errors::CalcError::invalid_input(
            "element_number",
            "0",
            "a beam needs at least one element",
        ));
    }
    Ok(())
}

/// node positions: equal spacing plus the position of maximum deformation
fn node_positions(loading: &Loading, element_number: usize) -> Vec<f64> {
    let length = loading.length();
    let mut positions: Vec<f64> = (0..=element_number)
        .map(|index| index as f64 * length / element_number as f64)
        .collect();
    positions.push(loading.position_of_maximum_deformation());
    positions.sort_by(|a, b| a.total_cmp(b));
    positions.dedup_by(|a, b| (*a - *b).abs() < 1e-9 * length);
    positions
}

/// cross-section of a node, slab sections clamped to the effective widths
/// at the node position
fn scaled_cross_section(
    cross_section: &Crosssection,
    loading: &Loading,
    position: f64,
    consider_widths: bool,
) -> CalcResult<Crosssection> {
    if !consider_widths {
        return Ok(cross_section.clone());
    }
    let slab_sections = cross_section.sections_of_kind(SectionKind::Slab);
    if slab_sections.is_empty() {
        return Ok(cross_section.clone());
    }
    // half-width of the slab measured from the web centre-line
    let half_width = slab_sections
        .iter()
        .map(|section| {
            let (left, right) = section.geometry.horizontal_extent();
            left.abs().max(right.abs())
        })
        .fold(0.0, f64::max);
    let length = loading.length();
    let from_midspan = position - 0.5 * length;
    let (membran_ratio, bending_ratio) = match loading {
        Loading::UniformLoad(_) => (
            membran_ratio_line(half_width, length, SLAB_POISSON_RATIO, DEFAULT_SEQUENCES, from_midspan),
            bending_ratio_line(half_width, length, SLAB_POISSON_RATIO, DEFAULT_SEQUENCES, from_midspan),
        ),
        Loading::SingleLoads(_) => (
            membran_ratio_single(half_width, length, SLAB_POISSON_RATIO, DEFAULT_SEQUENCES, from_midspan),
            bending_ratio_single(half_width, length, SLAB_POISSON_RATIO, DEFAULT_SEQUENCES, from_midspan),
        ),
    };
    let widths = EffectiveWidths::new(
        membran_ratio.clamp(0.0, 1.0) * half_width,
        bending_ratio.clamp(0.0, 1.0) * half_width,
    );
    Crosssection::with_effective_widths(cross_section.sections().to_vec(), widths)
}

/// trapezoidal virtual-force integration of κ(x)·M̄(x) with a unit load at
/// `at_position`
fn integrate_virtual(
    positions: &[f64],
    curvatures: &[f64],
    length: f64,
    at_position: f64,
) -> f64 {
    let virtual_load = SingleSpanSingleLoads::new(
        length,
        vec![SingleLoad::new(at_position, 1.0)],
    );
    let products: Vec<f64> = positions
        .iter()
        .zip(curvatures)
        .map(|(x, kappa)| kappa * virtual_load.moment(*x))
        .collect();
    positions
        .windows(2)
        .zip(products.windows(2))
        .map(|(x, g)| 0.5 * (g[0] + g[1]) * (x[1] - x[0]))
        .sum()
}

/// linear interpolation of the slip at an arbitrary position
fn slip_at(positions: &[f64], slip: &[f64], at: f64) -> f64 {
    if at <= positions[0] {
        return slip[0];
    }
    for index in 0..positions.len() - 1 {
        if positions[index] <= at && at <= positions[index + 1] {
            return interpolation(
                at,
                (positions[index], slip[index]),
                (positions[index + 1], slip[index + 1]),
            );
        }
    }
    slip[slip.len() - 1]
}

/// slope of the slip distribution at a node (one-sided at the ends)
fn slip_slope(positions: &[f64], slip: &[f64], index: usize) -> f64 {
    let last = positions.len() - 1;
    let (a, b) = if index == 0 {
        (0, 1)
    } else if index == last {
        (last - 1, last)
    } else {
        (index - 1, index + 1)
    };
    (slip[b] - slip[a]) / (positions[b] - positions[a])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::equal_distanced_shear_connectors;
    use crate::geometry::{Geometry, Rectangle};
    use crate::materials::concrete::Concrete;
    use crate::materials::steel::Steel;
    use crate::section::Section;
    use approx::assert_relative_eq;

    /// concrete slab 2000x100 on a HEB-200-like profile
    fn composite_cross_section() -> Crosssection {
        let concrete = Concrete::new(38.0).unwrap();
        let steel = Steel::new(355.0)
            .unwrap()
            .with_f_u(400.0)
            .with_failure_strain(0.15);
        Crosssection::new(vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 100.0, 2000.0).unwrap()),
                concrete.material().unwrap(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(100.0, 115.0, 200.0).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(115.0, 285.0, 9.5).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(285.0, 300.0, 200.0).unwrap()),
                steel.material(),
            ),
        ])
        .unwrap()
    }

    /// small composite pair for the slip solver
    fn small_composite() -> Crosssection {
        let concrete = Concrete::new(30.0).unwrap();
        let steel = Steel::new(355.0)
            .unwrap()
            .with_failure_strain(0.15);
        Crosssection::new(vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 60.0, 300.0).unwrap()),
                concrete.material().unwrap(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(60.0, 160.0, 20.0).unwrap()),
                steel.material(),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_beam_deformation_midspan() {
        let beam = Beam::new(
            composite_cross_section(),
            Loading::uniform(8000.0, 1.0),
            10,
            false,
        )
        .unwrap();
        assert_eq!(beam.nodes().len(), 11);
        let load = Loading::uniform(8000.0, 10.0);
        let deflection = beam.deformation(4000.0, &load).unwrap();
        assert!(deflection > 0.0, "deflection {deflection}");
        // supports do not deflect
        assert_relative_eq!(beam.deformation(0.0, &load).unwrap(), 0.0);
        assert_relative_eq!(beam.deformation(8000.0, &load).unwrap(), 0.0);
    }

    #[test]
    fn test_beam_deformation_monotone_with_load() {
        let beam = Beam::new(
            composite_cross_section(),
            Loading::uniform(8000.0, 1.0),
            10,
            false,
        )
        .unwrap();
        let mut previous = 0.0;
        for load in [2.0, 5.0, 10.0, 20.0] {
            let deflection = beam
                .deformation(4000.0, &Loading::uniform(8000.0, load))
                .unwrap();
            assert!(
                deflection > previous,
                "deflection {deflection} at load {load} not above {previous}"
            );
            previous = deflection;
        }
    }

    #[test]
    fn test_beam_elastic_deflection_against_closed_form() {
        // steel-only beam in its elastic range: 5wL^4/(384 EI)
        let steel = Steel::new(355.0)
            .unwrap()
            .with_f_u(400.0)
            .with_failure_strain(0.15);
        let cs = Crosssection::new(vec![
            Section::new(
                Geometry::Rectangle(Rectangle::new(0.0, 15.0, 200.0).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(15.0, 185.0, 9.5).unwrap()),
                steel.material(),
            ),
            Section::new(
                Geometry::Rectangle(Rectangle::new(185.0, 200.0, 200.0).unwrap()),
                steel.material(),
            ),
        ])
        .unwrap();
        let beam = Beam::new(cs, Loading::uniform(8000.0, 1.0), 10, false).unwrap();
        let load = 5.0;
        let deflection = beam
            .deformation(4000.0, &Loading::uniform(8000.0, load))
            .unwrap();
        let inertia = 2.0 * (200.0 * 15.0f64.powi(3) / 12.0 + 200.0 * 15.0 * 92.5 * 92.5)
            + 9.5 * 170.0f64.powi(3) / 12.0;
        let expected = 5.0 * load * 8000.0f64.powi(4) / (384.0 * 210_000.0 * inertia);
        // the 10-element trapezoidal grid carries a small discretisation error
        assert_relative_eq!(deflection, expected, epsilon = 0.02 * expected);
    }

    #[test]
    fn test_beam_load_steps_ascend() {
        let beam = Beam::new(
            composite_cross_section(),
            Loading::uniform(8000.0, 1.0),
            4,
            false,
        )
        .unwrap();
        let steps = beam.load_steps();
        assert!(steps.len() > 2);
        for pair in steps.windows(2) {
            assert!(pair[0].maximum_moment() < pair[1].maximum_moment());
        }
    }

    #[test]
    fn test_effective_widths_reduce_resistance() {
        let full = Beam::new(
            composite_cross_section(),
            Loading::uniform(8000.0, 1.0),
            2,
            false,
        )
        .unwrap();
        let reduced = Beam::new(
            composite_cross_section(),
            Loading::uniform(8000.0, 1.0),
            2,
            true,
        )
        .unwrap();
        let full_maximum = full.nodes()[1].curve().maximum_moment();
        let reduced_maximum = reduced.nodes()[1].curve().maximum_moment();
        assert!(
            reduced_maximum <= full_maximum,
            "widths must not raise the resistance ({reduced_maximum} > {full_maximum})"
        );
    }

    #[test]
    fn test_composite_beam_slip_solver() {
        let cross_section = small_composite();
        let length = 4000.0;
        let connectors = equal_distanced_shear_connectors(
            HeadedStud::new(19.0, 50.0, 450.0, 30.0).unwrap(),
            250.0,
            length,
        );
        let beam = CompositeBeam::new(
            &cross_section,
            Loading::uniform(length, 1.0),
            4,
            connectors,
            false,
        )
        .unwrap()
        .with_fitting(
            LevenbergMarquardt::new()
                .with_tolerances(100.0, 0.01)
                .with_max_iterations(60),
        );
        // a modest load step
        let load = Loading::uniform(length, 0.5);
        let solution = beam.solve_step(&load, None).unwrap();
        // internal and external moments agree at every node
        assert!(
            solution.residual_norm < 1.0e3,
            "residual {}",
            solution.residual_norm
        );
        // slip vanishes at mid-span by symmetry of the loading
        let positions: Vec<f64> = beam.nodes().iter().map(|n| n.position()).collect();
        let mid_index = positions
            .iter()
            .position(|x| (*x - 0.5 * length).abs() < 1e-9)
            .unwrap();
        let maximum_slip = solution
            .slip
            .iter()
            .map(|s| s.abs())
            .fold(0.0, f64::max);
        assert!(
            solution.slip[mid_index].abs() <= 0.05 * maximum_slip.max(1e-9),
            "slip at mid-span {} vs maximum {maximum_slip}",
            solution.slip[mid_index]
        );
        // the deflection under the converged state is downward
        let deflection = beam.deformation(0.5 * length, &solution);
        assert!(deflection >= 0.0);
    }

    #[test]
    fn test_composite_step_walk_reports_failures() {
        let cross_section = small_composite();
        let length = 4000.0;
        let connectors = equal_distanced_shear_connectors(
            HeadedStud::new(19.0, 50.0, 450.0, 30.0).unwrap(),
            500.0,
            length,
        );
        let beam = CompositeBeam::new(
            &cross_section,
            Loading::uniform(length, 1.0),
            4,
            connectors,
            false,
        )
        .unwrap();
        let results = beam.analyze();
        assert!(!results.is_empty());
        // deflection grows monotonically over the successful steps
        let mut previous = 0.0;
        for result in results.iter().filter_map(|r| r.outcome.as_ref().ok()) {
            assert!(result.deformation >= previous - 1e-9);
            previous = result.deformation;
        }
        // an absurd load cannot be equilibrated and must come back as a
        // failed step, not a panic
        let absurd = Loading::uniform(length, 1.0e4);
        assert!(beam.solve_step(&absurd, None).is_err());
    }
}
