//! # Profile Module
//!
//! Per-node output of a relaxed path and the post-processing applied to it
//! before it is plotted or tabulated.
//!
//! - [`NodeProfile`] is the raw per-node record produced by the relaxer.
//! - [`normalize_profile`] turns a profile into cumulative arc-length
//!   coordinates, measuring the y axis in degree-equivalent units.
//! - [`resample_profile`] reduces a normalized profile to a fixed number of
//!   waypoints spread evenly along the arc length.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversion from Ångström-scaled y coordinates to degree-equivalent units.
pub const DEFAULT_DEGREE_FACTOR: f64 = 0.9 / 0.14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeProfile {
    pub x: f64,
    pub y: f64,
    pub pmf_energy: f64,
    pub external_energy: f64,
    pub probability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPoint {
    pub distance: f64,
    pub energy: f64,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub energy: f64,
    pub distance: f64,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Cannot resample to {count} waypoint(s); at least 2 are required")]
    TooFewWaypoints { count: usize },

    #[error("Profile and normalized profile lengths differ ({profile} vs {normalized})")]
    LengthMismatch { profile: usize, normalized: usize },
}

#[inline]
pub fn angstroms_to_degrees(angstroms: f64, factor: f64) -> f64 {
    angstroms * factor
}

/// Cumulative arc length along the profile.
///
/// The y coordinate is scaled by `factor` before distances are measured; the
/// returned points keep the raw `x` and `y`. With `flip`, the distance column
/// is reversed so the path is measured from its last node.
pub fn normalize_profile(profile: &[NodeProfile], factor: f64, flip: bool) -> Vec<NormalizedPoint> {
    let mut points = Vec::with_capacity(profile.len());
    let mut distance = 0.0;
    let mut previous: Option<(f64, f64)> = None;

    for node in profile {
        let scaled = (node.x, angstroms_to_degrees(node.y, factor));
        if let Some((px, py)) = previous {
            distance += ((scaled.0 - px).powi(2) + (scaled.1 - py).powi(2)).sqrt();
        }
        previous = Some(scaled);
        points.push(NormalizedPoint {
            distance,
            energy: node.pmf_energy,
            x: node.x,
            y: node.y,
        });
    }

    if flip {
        let reversed: Vec<f64> = points.iter().rev().map(|p| p.distance).collect();
        for (point, distance) in points.iter_mut().zip(reversed) {
            point.distance = distance;
        }
    }
    points
}

/// Picks at most `count` waypoints spread evenly along the arc length.
///
/// The first and last nodes are always kept. Interior targets sit at
/// `j * total / (count - 1)`; each is matched by the first interior node whose
/// distance reaches it, and a node is used for at most one target.
pub fn resample_profile(
    profile: &[NodeProfile],
    normalized: &[NormalizedPoint],
    count: usize,
) -> Result<Vec<Waypoint>, ProfileError> {
    if count < 2 {
        return Err(ProfileError::TooFewWaypoints { count });
    }
    if profile.len() != normalized.len() {
        return Err(ProfileError::LengthMismatch {
            profile: profile.len(),
            normalized: normalized.len(),
        });
    }
    let (Some(first), Some(last)) = (normalized.first(), normalized.last()) else {
        return Ok(Vec::new());
    };

    let waypoint = |i: usize| Waypoint {
        x: profile[i].x,
        y: profile[i].y,
        energy: profile[i].pmf_energy,
        distance: normalized[i].distance,
    };

    let mut waypoints = vec![waypoint(0)];
    if normalized.len() == 1 {
        return Ok(waypoints);
    }

    let total = (last.distance - first.distance).abs();
    let spacing = total / (count - 1) as f64;
    let mut target = 1;

    for i in 1..normalized.len() - 1 {
        if target > count - 2 {
            break;
        }
        let travelled = (normalized[i].distance - first.distance).abs();
        if travelled >= spacing * target as f64 {
            waypoints.push(waypoint(i));
            target += 1;
        }
    }

    waypoints.push(waypoint(normalized.len() - 1));
    Ok(waypoints)
}
