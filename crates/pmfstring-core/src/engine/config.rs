use crate::core::energy::spring::Spring;
use crate::core::profile::DEFAULT_DEGREE_FACTOR;
use crate::core::surface::interpolation::InterpolationMethod;
use nalgebra::Point2;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    pub samples_path: PathBuf,
    /// `None` evaluates the surface at the nearest grid sample.
    pub interpolation: Option<InterpolationMethod>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationConfig {
    pub steps: usize,
    pub step_x: f64,
    pub step_y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileConfig {
    pub degree_factor: f64,
    pub flip: bool,
    pub waypoints: Option<usize>,
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            degree_factor: DEFAULT_DEGREE_FACTOR,
            flip: false,
            waypoints: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RelaxationConfig {
    pub surface: SurfaceConfig,
    pub initial_path: Vec<Point2<f64>>,
    pub optimization: OptimizationConfig,
    pub springs: Vec<Spring>,
    pub profile: ProfileConfig,
}

#[derive(Default)]
pub struct RelaxationConfigBuilder {
    samples_path: Option<PathBuf>,
    interpolation: Option<InterpolationMethod>,
    initial_path: Option<Vec<Point2<f64>>>,
    steps: Option<usize>,
    step_x: Option<f64>,
    step_y: Option<f64>,
    springs: Vec<Spring>,
    degree_factor: Option<f64>,
    flip: bool,
    waypoints: Option<usize>,
}

impl RelaxationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn samples_path(mut self, path: PathBuf) -> Self {
        self.samples_path = Some(path);
        self
    }
    pub fn interpolation(mut self, method: Option<InterpolationMethod>) -> Self {
        self.interpolation = method;
        self
    }
    pub fn initial_path(mut self, positions: Vec<Point2<f64>>) -> Self {
        self.initial_path = Some(positions);
        self
    }
    pub fn steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }
    pub fn step_x(mut self, dx: f64) -> Self {
        self.step_x = Some(dx);
        self
    }
    pub fn step_y(mut self, dy: f64) -> Self {
        self.step_y = Some(dy);
        self
    }
    pub fn step_size(self, dx: f64, dy: f64) -> Self {
        self.step_x(dx).step_y(dy)
    }
    pub fn spring(mut self, spring: Spring) -> Self {
        self.springs.push(spring);
        self
    }
    pub fn springs(mut self, springs: impl IntoIterator<Item = Spring>) -> Self {
        self.springs.extend(springs);
        self
    }
    pub fn degree_factor(mut self, factor: f64) -> Self {
        self.degree_factor = Some(factor);
        self
    }
    pub fn flip(mut self, flip: bool) -> Self {
        self.flip = flip;
        self
    }
    pub fn waypoints(mut self, count: Option<usize>) -> Self {
        self.waypoints = count;
        self
    }

    pub fn build(self) -> Result<RelaxationConfig, ConfigError> {
        let surface = SurfaceConfig {
            samples_path: self
                .samples_path
                .ok_or(ConfigError::MissingParameter("samples_path"))?,
            interpolation: self.interpolation,
        };

        let optimization = OptimizationConfig {
            steps: self.steps.ok_or(ConfigError::MissingParameter("steps"))?,
            step_x: validate_step("step_x", self.step_x)?,
            step_y: validate_step("step_y", self.step_y)?,
        };

        let degree_factor = self.degree_factor.unwrap_or(DEFAULT_DEGREE_FACTOR);
        if !degree_factor.is_finite() {
            return Err(ConfigError::InvalidParameter {
                name: "degree_factor",
                reason: format!("expected a finite number, got {degree_factor}"),
            });
        }
        if let Some(count) = self.waypoints.filter(|&count| count < 2) {
            return Err(ConfigError::InvalidParameter {
                name: "waypoints",
                reason: format!("at least 2 waypoints are required, got {count}"),
            });
        }

        Ok(RelaxationConfig {
            surface,
            initial_path: self
                .initial_path
                .ok_or(ConfigError::MissingParameter("initial_path"))?,
            optimization,
            springs: self.springs,
            profile: ProfileConfig {
                degree_factor,
                flip: self.flip,
                waypoints: self.waypoints,
            },
        })
    }
}

fn validate_step(name: &'static str, step: Option<f64>) -> Result<f64, ConfigError> {
    let step = step.ok_or(ConfigError::MissingParameter(name))?;
    if step.is_finite() && step >= 0.0 {
        Ok(step)
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("expected a finite, non-negative step, got {step}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::spring::Axis;

    fn complete_builder() -> RelaxationConfigBuilder {
        RelaxationConfigBuilder::new()
            .samples_path(PathBuf::from("pmf.csv"))
            .initial_path(vec![Point2::new(0.0, 0.0), Point2::new(1.0, 1.0)])
            .steps(10)
            .step_size(0.5, 0.25)
    }

    #[test]
    fn build_with_required_parameters_applies_defaults() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.surface.interpolation, None);
        assert_eq!(config.optimization.steps, 10);
        assert_eq!(config.optimization.step_x, 0.5);
        assert_eq!(config.optimization.step_y, 0.25);
        assert!(config.springs.is_empty());
        assert_eq!(config.profile, ProfileConfig::default());
    }

    #[test]
    fn build_collects_springs_in_order() {
        let config = complete_builder()
            .spring(Spring::new(1.0, 0.0, Axis::X))
            .springs([Spring::new(2.0, 0.5, Axis::Y)])
            .build()
            .unwrap();

        assert_eq!(config.springs.len(), 2);
        assert_eq!(config.springs[1].axis, Axis::Y);
    }

    #[test]
    fn build_reports_first_missing_parameter() {
        let result = RelaxationConfigBuilder::new().steps(1).build();
        assert_eq!(result, Err(ConfigError::MissingParameter("samples_path")));

        let result = RelaxationConfigBuilder::new()
            .samples_path(PathBuf::from("pmf.csv"))
            .steps(1)
            .step_size(1.0, 1.0)
            .build();
        assert_eq!(result, Err(ConfigError::MissingParameter("initial_path")));
    }

    #[test]
    fn build_rejects_negative_or_non_finite_steps() {
        let result = complete_builder().step_x(-0.1).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "step_x", .. })
        ));

        let result = complete_builder().step_y(f64::NAN).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "step_y", .. })
        ));
    }

    #[test]
    fn build_rejects_fewer_than_two_waypoints() {
        let result = complete_builder().waypoints(Some(1)).build();
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter {
                name: "waypoints",
                ..
            })
        ));
    }
}
