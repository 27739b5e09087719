use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::energy::term::EnergyTerm;
use crate::core::models::chain::Chain;
use crate::core::models::ids::TermId;
use crate::core::profile::NodeProfile;
use crate::core::surface::grid::Surface;
use crate::core::surface::interpolation::{InterpolationMethod, Interpolator};
use nalgebra::Point2;
use slotmap::SlotMap;
use tracing::{debug, instrument, trace};

/// Relative overshoot past the grid edge still treated as on the grid.
const GRID_SNAP_TOLERANCE: f64 = 1e-9;

/// Grid-search relaxation of a path on a free-energy surface.
///
/// The relaxer owns the surface, an optional interpolator built from it, the
/// node chain and a registry of external energy terms. Registered terms are
/// only attached to the nodes by [`PathRelaxer::refresh_external_terms`].
#[derive(Debug)]
pub struct PathRelaxer {
    surface: Surface,
    interpolator: Option<Interpolator>,
    chain: Chain,
    terms: SlotMap<TermId, EnergyTerm>,
    term_order: Vec<TermId>,
    step_x: f64,
    step_y: f64,
    positions: Vec<Point2<f64>>,
}

impl PathRelaxer {
    /// Builds the chain along `positions`, with zero search steps and no terms.
    ///
    /// Until a step size is set, [`PathRelaxer::minimize`] leaves every node in place.
    ///
    /// # Errors
    ///
    /// Fails when the interpolator cannot be built for this grid, or when the
    /// path is empty or leaves the surface.
    #[instrument(skip_all, fields(nodes = positions.len(), method = ?method))]
    pub fn new(
        surface: Surface,
        positions: &[Point2<f64>],
        method: Option<InterpolationMethod>,
    ) -> Result<Self, EngineError> {
        let interpolator = method
            .map(|method| surface.build_interpolator(method))
            .transpose()?;
        let chain = Chain::build(positions, &surface, interpolator.as_ref())?;
        let positions = chain.positions();

        debug!(
            nodes = chain.len(),
            pmf_energy = chain.total_pmf_energy(),
            "Path initialized."
        );

        Ok(Self {
            surface,
            interpolator,
            chain,
            terms: SlotMap::with_key(),
            term_order: Vec::new(),
            step_x: 0.0,
            step_y: 0.0,
            positions,
        })
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn interpolator(&self) -> Option<&Interpolator> {
        self.interpolator.as_ref()
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    // --- Search steps ---

    pub fn step_size(&self) -> (f64, f64) {
        (self.step_x, self.step_y)
    }

    pub fn set_dx(&mut self, dx: f64) -> Result<(), EngineError> {
        self.set_step_size(dx, self.step_y)
    }

    pub fn set_dy(&mut self, dy: f64) -> Result<(), EngineError> {
        self.set_step_size(self.step_x, dy)
    }

    /// Sets both search steps. A zero step freezes the node along that axis.
    pub fn set_step_size(&mut self, dx: f64, dy: f64) -> Result<(), EngineError> {
        let valid = |step: f64| step.is_finite() && step >= 0.0;
        if !valid(dx) || !valid(dy) {
            return Err(EngineError::InvalidStepSize { dx, dy });
        }
        self.step_x = dx;
        self.step_y = dy;
        Ok(())
    }

    // --- External energy registry ---

    /// Registers a term. Nodes do not see it until the next refresh.
    pub fn add_energy(&mut self, term: impl Into<EnergyTerm>) -> TermId {
        let term = term.into();
        let id = self.terms.insert(term);
        self.term_order.push(id);
        debug!(kind = term.kind(), registered = self.term_order.len(), "Energy term registered.");
        id
    }

    /// Unregisters a term, returning it if it was present.
    pub fn remove_energy(&mut self, id: TermId) -> Option<EnergyTerm> {
        let removed = self.terms.remove(id)?;
        self.term_order.retain(|&other| other != id);
        Some(removed)
    }

    pub fn clear_energies(&mut self) {
        self.terms.clear();
        self.term_order.clear();
    }

    /// Registered terms in registration order.
    pub fn energies(&self) -> impl Iterator<Item = &EnergyTerm> + '_ {
        self.term_order.iter().filter_map(|&id| self.terms.get(id))
    }

    /// Replaces every node's terms with the registered set and recomputes it.
    #[instrument(skip_all, fields(terms = self.term_order.len()))]
    pub fn refresh_external_terms(&mut self) -> Result<(), EngineError> {
        let active = self.active_terms();
        for index in 0..self.chain.len() {
            let node = self.chain.node_mut(index)?;
            node.clear_terms();
            for term in &active {
                node.attach_term(*term);
            }
            self.chain
                .recompute(index, &self.surface, self.interpolator.as_ref())?;
        }
        Ok(())
    }

    fn active_terms(&self) -> Vec<EnergyTerm> {
        self.energies().copied().collect()
    }

    // --- Search ---

    /// Candidate positions the node at `index` would consider.
    ///
    /// Without an interpolator the surface is only known at its samples, so
    /// every candidate is snapped onto the grid. Offsets that land outside the
    /// grid by no more than rounding error are snapped back onto its edge.
    pub fn node_neighbors(&self, index: usize) -> Result<Vec<Point2<f64>>, EngineError> {
        let node = self.chain.node(index)?;
        if self.interpolator.is_some() {
            return Ok(node.local_grid(self.chain.bounds(), self.step_x, self.step_y));
        }

        let bounds = self.chain.bounds().widened(GRID_SNAP_TOLERANCE);
        let mut candidates = Vec::new();
        for candidate in node.local_grid(&bounds, self.step_x, self.step_y) {
            let snapped = self.surface.snap_to_grid(candidate)?;
            if !candidates.contains(&snapped) {
                candidates.push(snapped);
            }
        }
        Ok(candidates)
    }

    /// Best position for one node among its local grid, with every other node held fixed.
    ///
    /// The current position is the incumbent; a candidate replaces it only on a
    /// strictly lower total energy. The node's position and cached energies are
    /// restored before returning, whether or not the search succeeded.
    pub fn find_minimum(&mut self, index: usize) -> Result<Point2<f64>, EngineError> {
        let original = self.chain.node(index)?.position();
        let candidates = self.node_neighbors(index)?;

        let search = self.scan_candidates(index, original, &candidates);

        self.chain.node_mut(index)?.set_position(original);
        let restored = self
            .chain
            .recompute(index, &self.surface, self.interpolator.as_ref());

        let best = search?;
        restored?;
        Ok(best)
    }

    fn scan_candidates(
        &mut self,
        index: usize,
        original: Point2<f64>,
        candidates: &[Point2<f64>],
    ) -> Result<Point2<f64>, EngineError> {
        self.chain
            .recompute(index, &self.surface, self.interpolator.as_ref())?;
        let mut best = original;
        let mut best_energy = self.chain.node(index)?.total_energy();

        for &candidate in candidates {
            self.chain.node_mut(index)?.set_position(candidate);
            self.chain
                .recompute(index, &self.surface, self.interpolator.as_ref())?;
            let energy = self.chain.node(index)?.total_energy();
            trace!(index, x = candidate.x, y = candidate.y, energy, "Candidate evaluated.");

            if energy < best_energy {
                best = candidate;
                best_energy = energy;
            }
        }
        Ok(best)
    }

    /// Moves a mobile node and recomputes its cached energies; static nodes are left alone.
    pub fn move_node(&mut self, index: usize, position: Point2<f64>) -> Result<(), EngineError> {
        let node = self.chain.node(index)?;
        if node.is_static() {
            return Ok(());
        }
        if !self.chain.bounds().contains(position.x, position.y) {
            return Err(EngineError::PositionOutOfBounds {
                index,
                x: position.x,
                y: position.y,
            });
        }
        self.chain.node_mut(index)?.set_position(position);
        self.chain
            .recompute(index, &self.surface, self.interpolator.as_ref())?;
        Ok(())
    }

    // --- Relaxation ---

    pub fn minimize(&mut self, n_steps: usize) -> Result<(), EngineError> {
        self.minimize_with_progress(n_steps, &ProgressReporter::new())
    }

    /// Runs `n_steps` synchronous grid-search iterations.
    ///
    /// Each iteration first proposes a position for every node against the
    /// same snapshot of the path, then commits all proposals, then refreshes
    /// every node's cached energies against the committed positions.
    #[instrument(skip_all, name = "relaxation", fields(n_steps = n_steps, nodes = self.chain.len()))]
    pub fn minimize_with_progress(
        &mut self,
        n_steps: usize,
        reporter: &ProgressReporter,
    ) -> Result<(), EngineError> {
        reporter.report(Progress::RelaxationStart {
            total_steps: n_steps as u64,
        });

        for step in 1..=n_steps {
            let node_count = self.chain.len();
            let proposals = (0..node_count)
                .map(|index| self.find_minimum(index))
                .collect::<Result<Vec<_>, _>>()?;

            let snapshot = self.chain.clone();
            let moved = match self.commit(proposals) {
                Ok(moved) => moved,
                Err(err) => {
                    self.chain = snapshot;
                    return Err(err);
                }
            };

            let total_energy = self.total_energy();
            debug!(step, moved, total_energy, "Relaxation step complete.");
            reporter.report(Progress::StepComplete {
                step: step as u64,
                total_energy,
            });
        }

        self.update_positions();
        reporter.report(Progress::RelaxationFinish);
        Ok(())
    }

    /// Applies one iteration's proposals and resynchronizes every cache.
    ///
    /// On error the chain is left partially updated; the caller restores it.
    fn commit(&mut self, proposals: Vec<Point2<f64>>) -> Result<usize, EngineError> {
        let mut moved = 0;
        for (index, proposal) in proposals.into_iter().enumerate() {
            let node = self.chain.node(index)?;
            if !node.is_static() && node.position() != proposal {
                moved += 1;
            }
            self.move_node(index, proposal)?;
        }
        self.resync()?;
        Ok(moved)
    }

    fn resync(&mut self) -> Result<(), EngineError> {
        for index in 0..self.chain.len() {
            self.chain
                .recompute(index, &self.surface, self.interpolator.as_ref())?;
        }
        Ok(())
    }

    // --- Observation ---

    /// Positions recorded at construction or at the end of the last relaxation.
    pub fn positions(&self) -> &[Point2<f64>] {
        &self.positions
    }

    pub fn update_positions(&mut self) {
        self.positions = self.chain.positions();
    }

    pub fn node_pmf_energy(&self, index: usize) -> Result<f64, EngineError> {
        Ok(self.chain.node(index)?.pmf_energy())
    }

    /// Coupling energy of the registered terms at one node, whether or not they
    /// have been attached yet.
    pub fn node_spring_energy(&self, index: usize) -> Result<f64, EngineError> {
        Ok(self.chain.coupling_energy(index, &self.active_terms())?)
    }

    pub fn total_pmf_energy(&self) -> f64 {
        self.chain.total_pmf_energy()
    }

    pub fn total_external_energy(&self) -> f64 {
        self.chain.total_external_energy()
    }

    pub fn total_energy(&self) -> f64 {
        self.total_pmf_energy() + self.total_external_energy()
    }

    pub fn node_profile(&self) -> impl Iterator<Item = NodeProfile> + '_ {
        self.chain.iter().map(|node| NodeProfile {
            x: node.x(),
            y: node.y(),
            pmf_energy: node.pmf_energy(),
            external_energy: node.external_energy(),
            probability: node.probability(),
        })
    }

    pub fn profile(&self) -> Vec<NodeProfile> {
        self.node_profile().collect()
    }
}
