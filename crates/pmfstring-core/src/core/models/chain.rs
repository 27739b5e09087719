use super::node::Node;
use crate::core::energy::term::EnergyTerm;
use crate::core::surface::grid::{GridBounds, Surface, SurfaceError};
use crate::core::surface::interpolation::Interpolator;
use nalgebra::Point2;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ChainError {
    #[error("Invalid path specification: {reason}")]
    InvalidPathSpecification { reason: String },

    #[error("Node index {index} is out of range for a chain of {len} node(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(
        "Non-finite energy at node {index} ({x}, {y}): pmf = {pmf_energy}, external = {external_energy}"
    )]
    NumericDomain {
        index: usize,
        x: f64,
        y: f64,
        pmf_energy: f64,
        external_energy: f64,
    },

    #[error(transparent)]
    Surface(#[from] SurfaceError),
}

/// The ordered sequence of nodes that makes up a path.
///
/// Nodes live in a flat array where `nodes[i].index() == i`; predecessor and
/// successor links are indices into that array. The first and last nodes are
/// static.
#[derive(Debug, Clone, PartialEq)]
pub struct Chain {
    nodes: Vec<Node>,
    bounds: GridBounds,
}

impl Chain {
    /// Builds and links every node of the path, then fills their cached energies.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidPathSpecification`] when `positions` is empty
    /// or a position is non-finite or outside the surface bounds.
    pub fn build(
        positions: &[Point2<f64>],
        surface: &Surface,
        interpolator: Option<&Interpolator>,
    ) -> Result<Self, ChainError> {
        if positions.is_empty() {
            return Err(ChainError::InvalidPathSpecification {
                reason: "the initial path contains no positions".to_string(),
            });
        }

        let bounds = surface.bounds();
        if let Some((index, p)) = positions
            .iter()
            .enumerate()
            .find(|(_, p)| !(p.x.is_finite() && p.y.is_finite() && bounds.contains(p.x, p.y)))
        {
            return Err(ChainError::InvalidPathSpecification {
                reason: format!(
                    "position {} ({}, {}) lies outside the surface bounds x [{}, {}], y [{}, {}]",
                    index, p.x, p.y, bounds.x_min, bounds.x_max, bounds.y_min, bounds.y_max
                ),
            });
        }

        let last = positions.len() - 1;
        let nodes = positions
            .iter()
            .enumerate()
            .map(|(index, &position)| {
                let mut node = Node::new(index, position, index == 0 || index == last);
                node.prev = index.checked_sub(1);
                node.next = (index < last).then_some(index + 1);
                node
            })
            .collect();

        let mut chain = Self { nodes, bounds };
        for index in 0..chain.len() {
            chain.recompute(index, surface, interpolator)?;
        }
        Ok(chain)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a chain holds at least one node.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn bounds(&self) -> &GridBounds {
        &self.bounds
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn node(&self, index: usize) -> Result<&Node, ChainError> {
        self.nodes.get(index).ok_or(ChainError::IndexOutOfRange {
            index,
            len: self.nodes.len(),
        })
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> Result<&mut Node, ChainError> {
        let len = self.nodes.len();
        self.nodes
            .get_mut(index)
            .ok_or(ChainError::IndexOutOfRange { index, len })
    }

    pub fn first(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn last(&self) -> &Node {
        &self.nodes[self.nodes.len() - 1]
    }

    pub fn predecessor(&self, index: usize) -> Option<&Node> {
        self.nodes
            .get(index)
            .and_then(|node| node.prev)
            .map(|prev| &self.nodes[prev])
    }

    pub fn successor(&self, index: usize) -> Option<&Node> {
        self.nodes
            .get(index)
            .and_then(|node| node.next)
            .map(|next| &self.nodes[next])
    }

    /// Follows successor links from the first node.
    pub fn walk(&self) -> impl Iterator<Item = &Node> {
        std::iter::successors(self.nodes.first(), |node| {
            node.next.map(|next| &self.nodes[next])
        })
    }

    pub fn positions(&self) -> Vec<Point2<f64>> {
        self.nodes.iter().map(Node::position).collect()
    }

    /// Sum of `term(pred, node) + term(node, succ)` over `terms` for the node
    /// at `index`, evaluated against the current positions.
    pub fn coupling_energy(&self, index: usize, terms: &[EnergyTerm]) -> Result<f64, ChainError> {
        let node = self.node(index)?;
        let prev = self.predecessor(index);
        let next = self.successor(index);
        Ok(terms
            .iter()
            .map(|term| term.energy(prev, Some(node)) + term.energy(Some(node), next))
            .sum())
    }

    /// Re-derives the cached surface values and external energy of one node
    /// from its current position and its neighbors' current positions.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::NumericDomain`] when either energy is not finite.
    pub fn recompute(
        &mut self,
        index: usize,
        surface: &Surface,
        interpolator: Option<&Interpolator>,
    ) -> Result<(), ChainError> {
        let node = self.node(index)?;
        let value = surface.value_at(node.x(), node.y(), interpolator)?;
        let external_energy = self.coupling_energy(index, node.terms())?;

        if !value.energy.is_finite() || !external_energy.is_finite() {
            return Err(ChainError::NumericDomain {
                index,
                x: node.x(),
                y: node.y(),
                pmf_energy: value.energy,
                external_energy,
            });
        }

        self.nodes[index].set_energies(value.energy, value.probability, external_energy);
        Ok(())
    }

    pub fn total_pmf_energy(&self) -> f64 {
        self.nodes.iter().map(Node::pmf_energy).sum()
    }

    pub fn total_external_energy(&self) -> f64 {
        self.nodes.iter().map(Node::external_energy).sum()
    }
}
