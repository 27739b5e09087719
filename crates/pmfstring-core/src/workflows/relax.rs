use crate::core::io::tables::SampleTable;
use crate::core::io::traits::CsvTable;
use crate::core::profile::{self, NodeProfile, NormalizedPoint, Waypoint};
use crate::core::surface::grid::Surface;
use crate::engine::config::RelaxationConfig;
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::relaxer::PathRelaxer;
use nalgebra::Point2;
use std::path::Path;
use tracing::{info, instrument};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergySummary {
    pub pmf: f64,
    pub external: f64,
}

impl EnergySummary {
    fn of(relaxer: &PathRelaxer) -> Self {
        Self {
            pmf: relaxer.total_pmf_energy(),
            external: relaxer.total_external_energy(),
        }
    }

    pub fn total(&self) -> f64 {
        self.pmf + self.external
    }
}

#[derive(Debug, Clone)]
pub struct RelaxationResult {
    pub initial_profile: Vec<NodeProfile>,
    pub initial_energy: EnergySummary,
    pub final_profile: Vec<NodeProfile>,
    pub final_energy: EnergySummary,
    pub final_positions: Vec<Point2<f64>>,
    pub normalized_profile: Vec<NormalizedPoint>,
    pub waypoints: Option<Vec<Waypoint>>,
}

/// Loads the sample table named in `config` and relaxes the configured path on it.
#[instrument(skip_all, name = "relaxation_workflow")]
pub fn run(
    config: &RelaxationConfig,
    reporter: &ProgressReporter,
) -> Result<RelaxationResult, EngineError> {
    // === Phase 0: Load the surface ===
    reporter.report(Progress::PhaseStart {
        name: "Loading Surface",
    });
    let surface = load_surface(&config.surface.samples_path)?;
    reporter.report(Progress::PhaseFinish);

    run_on_surface(surface, config, reporter)
}

/// Reads a sample table and assembles it into a surface.
pub fn load_surface(path: &Path) -> Result<Surface, EngineError> {
    info!(path = %path.display(), "Loading PMF samples.");
    let samples = SampleTable::read_from_path(path).map_err(|source| EngineError::Input {
        path: path.to_path_buf(),
        source,
    })?;
    let surface = Surface::new(&samples)?;
    info!(
        samples = samples.len(),
        nx = surface.x_axis().len(),
        ny = surface.y_axis().len(),
        "Surface assembled."
    );
    Ok(surface)
}

/// Relaxes the configured path on an already assembled surface.
#[instrument(skip_all, name = "relax_on_surface")]
pub fn run_on_surface(
    surface: Surface,
    config: &RelaxationConfig,
    reporter: &ProgressReporter,
) -> Result<RelaxationResult, EngineError> {
    // === Phase 1: Build the path ===
    reporter.report(Progress::PhaseStart {
        name: "Building Path",
    });
    let mut relaxer = PathRelaxer::new(
        surface,
        &config.initial_path,
        config.surface.interpolation,
    )?;
    relaxer.set_step_size(config.optimization.step_x, config.optimization.step_y)?;
    for spring in &config.springs {
        relaxer.add_energy(*spring);
    }
    relaxer.refresh_external_terms()?;

    let initial_profile = relaxer.profile();
    let initial_energy = EnergySummary::of(&relaxer);
    info!(
        nodes = relaxer.len(),
        springs = config.springs.len(),
        pmf_energy = initial_energy.pmf,
        external_energy = initial_energy.external,
        "Initial path prepared."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Relaxation ===
    reporter.report(Progress::PhaseStart {
        name: "Relaxing Path",
    });
    relaxer.minimize_with_progress(config.optimization.steps, reporter)?;
    let final_profile = relaxer.profile();
    let final_energy = EnergySummary::of(&relaxer);
    info!(
        steps = config.optimization.steps,
        pmf_energy = final_energy.pmf,
        external_energy = final_energy.external,
        "Relaxation finished."
    );
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Post-processing ===
    reporter.report(Progress::PhaseStart {
        name: "Post-processing",
    });
    let normalized_profile = profile::normalize_profile(
        &final_profile,
        config.profile.degree_factor,
        config.profile.flip,
    );
    let waypoints = config
        .profile
        .waypoints
        .map(|count| profile::resample_profile(&final_profile, &normalized_profile, count))
        .transpose()?;
    reporter.report(Progress::PhaseFinish);

    info!(
        path_length = normalized_profile
            .iter()
            .map(|p| p.distance)
            .fold(0.0, f64::max),
        "Workflow complete."
    );

    Ok(RelaxationResult {
        initial_profile,
        initial_energy,
        final_profile,
        final_energy,
        final_positions: relaxer.positions().to_vec(),
        normalized_profile,
        waypoints,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::energy::spring::{Axis, Spring};
    use crate::core::io::traits::IoError;
    use crate::core::surface::grid::Sample;
    use crate::core::surface::interpolation::InterpolationMethod;
    use crate::engine::config::RelaxationConfigBuilder;
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;
    use tracing::span;
    use tracing::subscriber::Subscriber;
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    struct SpanNames(Arc<Mutex<Vec<&'static str>>>);

    impl<S: Subscriber> Layer<S> for SpanNames {
        fn on_new_span(&self, attrs: &span::Attributes<'_>, _: &span::Id, _: Context<'_, S>) {
            self.0.lock().unwrap().push(attrs.metadata().name());
        }
    }

    fn bowl_samples() -> Vec<Sample> {
        let axis: Vec<f64> = (0..=4).map(f64::from).collect();
        axis.iter()
            .flat_map(|&x| axis.iter().map(move |&y| (x, y)))
            .map(|(x, y)| Sample::new(x, y, (x - 2.0).powi(2) + (y - 2.0).powi(2), 0.5))
            .collect()
    }

    fn config_for(samples_path: PathBuf) -> RelaxationConfigBuilder {
        RelaxationConfigBuilder::new()
            .samples_path(samples_path)
            .initial_path(vec![
                Point2::new(0.0, 0.0),
                Point2::new(0.0, 4.0),
                Point2::new(4.0, 4.0),
            ])
            .steps(3)
            .step_size(1.0, 1.0)
    }

    #[test]
    fn run_loads_samples_and_relaxes_the_path() {
        let dir = tempdir().unwrap();
        let samples_path = dir.path().join("pmf.csv");
        SampleTable::write_to_path(&bowl_samples(), &samples_path).unwrap();
        let config = config_for(samples_path).build().unwrap();

        let result = run(&config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.initial_profile[1].pmf_energy, 8.0);
        assert_eq!(result.final_positions[1], Point2::new(2.0, 2.0));
        assert_eq!(result.final_profile[1].pmf_energy, 0.0);
        assert_eq!(result.final_profile[1].probability, 0.5);
        assert!(result.final_energy.total() < result.initial_energy.total());
        assert_eq!(result.normalized_profile.len(), 3);
        assert!(result.waypoints.is_none());
    }

    #[test]
    fn run_reports_unreadable_sample_file() {
        let dir = tempdir().unwrap();
        let config = config_for(dir.path().join("missing.csv")).build().unwrap();

        let error = run(&config, &ProgressReporter::new()).unwrap_err();
        assert!(matches!(
            error,
            EngineError::Input {
                source: IoError::Io(_),
                ..
            }
        ));
    }

    #[test]
    fn run_on_surface_applies_springs_and_waypoints() {
        let surface = Surface::new(&bowl_samples()).unwrap();
        let config = config_for(PathBuf::from("unused.csv"))
            .initial_path(vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(2.0, 2.0),
                Point2::new(3.0, 3.0),
                Point2::new(4.0, 4.0),
            ])
            .spring(Spring::new(1.0, 1.0, Axis::X))
            .interpolation(Some(InterpolationMethod::Linear))
            .degree_factor(1.0)
            .waypoints(Some(3))
            .build()
            .unwrap();

        let result = run_on_surface(surface, &config, &ProgressReporter::new()).unwrap();

        assert_eq!(result.final_positions.first(), Some(&Point2::new(0.0, 0.0)));
        assert_eq!(result.final_positions.last(), Some(&Point2::new(4.0, 4.0)));
        let waypoints = result.waypoints.unwrap();
        assert!(waypoints.len() <= 3);
        assert_eq!(waypoints.first().map(|w| w.x), Some(0.0));
        assert_eq!(waypoints.last().map(|w| w.x), Some(4.0));
    }

    #[test]
    fn run_on_surface_reports_phases_in_order() {
        let surface = Surface::new(&bowl_samples()).unwrap();
        let config = config_for(PathBuf::from("unused.csv")).build().unwrap();
        let phases = Mutex::new(Vec::new());
        let reporter = ProgressReporter::with_callback(Box::new(|event| {
            if let Progress::PhaseStart { name } = event {
                phases.lock().unwrap().push(name);
            }
        }));

        run_on_surface(surface, &config, &reporter).unwrap();
        drop(reporter);

        assert_eq!(
            phases.into_inner().unwrap(),
            vec!["Building Path", "Relaxing Path", "Post-processing"]
        );
    }

    #[test]
    fn run_opens_distinct_workflow_spans() {
        let dir = tempdir().unwrap();
        let samples_path = dir.path().join("pmf.csv");
        SampleTable::write_to_path(&bowl_samples(), &samples_path).unwrap();
        let config = config_for(samples_path).build().unwrap();

        let names = Arc::new(Mutex::new(Vec::new()));
        let subscriber = tracing_subscriber::registry().with(SpanNames(names.clone()));
        tracing::subscriber::with_default(subscriber, || {
            run(&config, &ProgressReporter::new()).unwrap();
        });

        let names = names.lock().unwrap();
        assert_eq!(names.first(), Some(&"relaxation_workflow"));
        assert_eq!(names.iter().filter(|&&n| n == "relaxation_workflow").count(), 1);
        assert_eq!(names.iter().filter(|&&n| n == "relax_on_surface").count(), 1);
    }
}
