use crate::core::energy::term::EnergyTerm;
use crate::core::surface::grid::GridBounds;
use itertools::iproduct;
use nalgebra::Point2;

/// One point of a path across the surface.
///
/// Neighbors are referenced by their index in the owning
/// [`Chain`](super::chain::Chain); a node never owns another node.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    index: usize,                // Position in the chain, 0-based
    position: Point2<f64>,       // Current (x, y) on the surface
    pmf_energy: f64,             // Surface energy at `position`
    probability: f64,            // Nearest-sample probability at `position`
    external_energy: f64,        // Sum of attached terms against both neighbors
    terms: Vec<EnergyTerm>,      // Attached external terms, in attachment order
    pub(crate) prev: Option<usize>,
    pub(crate) next: Option<usize>,
    is_static: bool,             // Endpoints never move
}

impl Node {
    pub fn new(index: usize, position: Point2<f64>, is_static: bool) -> Self {
        Self {
            index,
            position,
            pmf_energy: 0.0,
            probability: 0.0,
            external_energy: 0.0,
            terms: Vec::new(),
            prev: None,
            next: None,
            is_static,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn position(&self) -> Point2<f64> {
        self.position
    }

    pub fn pmf_energy(&self) -> f64 {
        self.pmf_energy
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn external_energy(&self) -> f64 {
        self.external_energy
    }

    /// Cached surface energy plus cached external energy.
    #[inline]
    pub fn total_energy(&self) -> f64 {
        self.pmf_energy + self.external_energy
    }

    pub fn terms(&self) -> &[EnergyTerm] {
        &self.terms
    }

    pub fn predecessor(&self) -> Option<usize> {
        self.prev
    }

    pub fn successor(&self) -> Option<usize> {
        self.next
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    /// Appends a term. Cached energies are left untouched until the next recompute.
    pub fn attach_term(&mut self, term: EnergyTerm) {
        self.terms.push(term);
    }

    pub fn clear_terms(&mut self) {
        self.terms.clear();
    }

    pub(crate) fn set_position(&mut self, position: Point2<f64>) {
        self.position = position;
    }

    pub(crate) fn set_energies(&mut self, pmf_energy: f64, probability: f64, external_energy: f64) {
        self.pmf_energy = pmf_energy;
        self.probability = probability;
        self.external_energy = external_energy;
    }

    /// Candidate positions for a local grid search around the node.
    ///
    /// The Cartesian product of `{x - step_x, x, x + step_x}` and
    /// `{y - step_y, y, y + step_y}`, x offsets outermost, with candidates
    /// outside `bounds` dropped. A zero step contributes only the zero offset.
    pub fn local_grid(&self, bounds: &GridBounds, step_x: f64, step_y: f64) -> Vec<Point2<f64>> {
        let x_offsets = Self::offsets(step_x);
        let y_offsets = Self::offsets(step_y);

        iproduct!(x_offsets, y_offsets)
            .map(|(dx, dy)| Point2::new(self.position.x + dx, self.position.y + dy))
            .filter(|candidate| bounds.contains(candidate.x, candidate.y))
            .collect()
    }

    fn offsets(step: f64) -> Vec<f64> {
        if step == 0.0 {
            vec![0.0]
        } else {
            vec![-step, 0.0, step]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::spring::{Axis, Spring};

    fn unit_bounds() -> GridBounds {
        GridBounds {
            x_min: 0.0,
            x_max: 2.0,
            y_min: 0.0,
            y_max: 2.0,
        }
    }

    #[test]
    fn local_grid_of_interior_node_has_nine_candidates_in_order() {
        let node = Node::new(1, Point2::new(1.0, 1.0), false);
        let grid = node.local_grid(&unit_bounds(), 1.0, 1.0);

        assert_eq!(grid.len(), 9);
        assert_eq!(grid[0], Point2::new(0.0, 0.0));
        assert_eq!(grid[1], Point2::new(0.0, 1.0));
        assert_eq!(grid[4], Point2::new(1.0, 1.0));
        assert_eq!(grid[8], Point2::new(2.0, 2.0));
    }

    #[test]
    fn local_grid_drops_out_of_bounds_candidates_at_a_corner() {
        let node = Node::new(0, Point2::new(0.0, 0.0), true);
        let grid = node.local_grid(&unit_bounds(), 1.0, 1.0);

        assert_eq!(
            grid,
            vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 1.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
            ]
        );
    }

    #[test]
    fn local_grid_always_contains_the_current_position() {
        let node = Node::new(2, Point2::new(2.0, 0.5), false);
        let grid = node.local_grid(&unit_bounds(), 5.0, 5.0);
        assert_eq!(grid, vec![Point2::new(2.0, 0.5)]);
    }

    #[test]
    fn local_grid_with_zero_steps_yields_only_the_current_position() {
        let node = Node::new(1, Point2::new(1.0, 1.0), false);
        let grid = node.local_grid(&unit_bounds(), 0.0, 0.0);
        assert_eq!(grid, vec![Point2::new(1.0, 1.0)]);
    }

    #[test]
    fn local_grid_with_one_zero_step_spans_a_single_axis() {
        let node = Node::new(1, Point2::new(1.0, 1.0), false);
        let grid = node.local_grid(&unit_bounds(), 0.0, 0.5);
        assert_eq!(
            grid,
            vec![
                Point2::new(1.0, 0.5),
                Point2::new(1.0, 1.0),
                Point2::new(1.0, 1.5),
            ]
        );
    }

    #[test]
    fn attach_and_clear_terms_do_not_touch_cached_energies() {
        let mut node = Node::new(0, Point2::new(0.0, 0.0), true);
        node.set_energies(1.5, 0.25, 3.0);

        node.attach_term(Spring::new(1.0, 0.0, Axis::X).into());
        assert_eq!(node.terms().len(), 1);
        assert_eq!(node.external_energy(), 3.0);

        node.clear_terms();
        assert!(node.terms().is_empty());
        assert_eq!(node.total_energy(), 4.5);
    }
}
