use super::spring::Spring;
use crate::core::models::node::Node;

/// External energy contributions that couple adjacent nodes of a chain.
///
/// Every variant is evaluated against an ordered pair of neighbors and
/// contributes nothing when either neighbor is absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnergyTerm {
    Spring(Spring),
}

impl EnergyTerm {
    pub fn energy(&self, first: Option<&Node>, second: Option<&Node>) -> f64 {
        match self {
            EnergyTerm::Spring(spring) => spring.energy(first, second),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EnergyTerm::Spring(_) => "spring",
        }
    }
}

impl From<Spring> for EnergyTerm {
    fn from(spring: Spring) -> Self {
        EnergyTerm::Spring(spring)
    }
}
