use crate::core::models::node::Node;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_EXPONENT: f64 = 2.0;

/// Coordinate axis a one-dimensional term measures along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    #[inline]
    pub fn coordinate(&self, node: &Node) -> f64 {
        match self {
            Axis::X => node.x(),
            Axis::Y => node.y(),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid axis '{0}'. Expected 'x', 'y', '0' or '1'")]
pub struct ParseAxisError(pub String);

impl FromStr for Axis {
    type Err = ParseAxisError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "x" | "0" => Ok(Axis::X),
            "y" | "1" => Ok(Axis::Y),
            _ => Err(ParseAxisError(s.to_string())),
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Axis::X => "x",
                Axis::Y => "y",
            }
        )
    }
}

/// Harmonic-like penalty on the separation of two adjacent nodes along one axis.
///
/// `E = ½ · k · (d₀ − |a − b|)^p`, where `a` and `b` are the nodes' coordinates
/// on [`Spring::axis`]. The separation is never a two-dimensional distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub stiffness: f64,
    pub equilibrium_distance: f64,
    pub exponent: f64,
    pub axis: Axis,
}

impl Spring {
    pub fn new(stiffness: f64, equilibrium_distance: f64, axis: Axis) -> Self {
        Self {
            stiffness,
            equilibrium_distance,
            exponent: DEFAULT_EXPONENT,
            axis,
        }
    }

    pub fn with_exponent(mut self, exponent: f64) -> Self {
        self.exponent = exponent;
        self
    }

    /// Energy between an ordered pair of chain neighbors; zero at a chain end.
    pub fn energy(&self, first: Option<&Node>, second: Option<&Node>) -> f64 {
        match (first, second) {
            (Some(a), Some(b)) => {
                let separation = (self.axis.coordinate(a) - self.axis.coordinate(b)).abs();
                self.energy_at(separation)
            }
            _ => 0.0,
        }
    }

    #[inline]
    pub fn energy_at(&self, separation: f64) -> f64 {
        0.5 * self.stiffness * (self.equilibrium_distance - separation).powf(self.exponent)
    }
}
