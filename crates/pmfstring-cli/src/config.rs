use crate::cli::{InputArgs, InspectArgs, RelaxArgs};
use crate::error::{CliError, Result};
use crate::utils::parser;
use nalgebra::Point2;
use pmfstring::core::energy::spring::{Axis, DEFAULT_EXPONENT, ParseAxisError, Spring};
use pmfstring::core::io::tables::PositionTable;
use pmfstring::core::io::traits::CsvTable;
use pmfstring::core::surface::interpolation::InterpolationMethod;
use pmfstring::engine::config as core_config;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

const DEFAULT_STEPS: usize = 100;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSurfaceConfig {
    samples: Option<PathBuf>,
    interpolation: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialPathConfig {
    nodes: Option<Vec<[f64; 2]>>,
    file: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialOptimizationConfig {
    steps: Option<usize>,
    dx: Option<f64>,
    dy: Option<f64>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialSpringConfig {
    axis: String,
    stiffness: f64,
    #[serde(default)]
    equilibrium_distance: f64,
    exponent: Option<f64>,
}

impl PartialSpringConfig {
    fn into_spring(self) -> Result<Spring> {
        let axis: Axis = self
            .axis
            .parse()
            .map_err(|e: ParseAxisError| {
                CliError::Config(format!("Invalid spring: {}", e))
            })?;
        Ok(Spring::new(self.stiffness, self.equilibrium_distance, axis)
            .with_exponent(self.exponent.unwrap_or(DEFAULT_EXPONENT)))
    }
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialProfileConfig {
    degree_factor: Option<f64>,
    flip: Option<bool>,
    waypoints: Option<usize>,
}

/// The TOML configuration file, with every value optional until merged with the CLI.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRelaxConfig {
    surface: Option<PartialSurfaceConfig>,
    path: Option<PartialPathConfig>,
    optimization: Option<PartialOptimizationConfig>,
    #[serde(default)]
    springs: Vec<PartialSpringConfig>,
    profile: Option<PartialProfileConfig>,

    /// Directory that relative paths inside the file are resolved against.
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl PartialRelaxConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Loads the file when one is given; otherwise every value must come from the CLI.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn merge_with_relax_args(
        mut self,
        args: &RelaxArgs,
    ) -> Result<core_config::RelaxationConfig> {
        let builder = self.merge_inputs(&args.inputs)?;
        let opt_config = self.optimization.take().unwrap_or_default();
        let profile_config = self.profile.take().unwrap_or_default();

        let dx = args.dx.or(opt_config.dx).ok_or_else(|| {
            CliError::Config(
                "`optimization.dx` is required either in the config file or via --dx.".to_string(),
            )
        })?;
        let dy = args.dy.or(opt_config.dy).ok_or_else(|| {
            CliError::Config(
                "`optimization.dy` is required either in the config file or via --dy.".to_string(),
            )
        })?;

        let mut builder = builder
            .steps(args.steps.or(opt_config.steps).unwrap_or(DEFAULT_STEPS))
            .step_size(dx, dy)
            .flip(args.flip || profile_config.flip.unwrap_or(false))
            .waypoints(args.waypoints.or(profile_config.waypoints));
        if let Some(factor) = profile_config.degree_factor {
            builder = builder.degree_factor(factor);
        }

        builder.build().map_err(|e| CliError::Config(e.to_string()))
    }

    /// Builds a configuration that evaluates the initial path without relaxing it.
    pub fn merge_with_inspect_args(
        mut self,
        args: &InspectArgs,
    ) -> Result<core_config::RelaxationConfig> {
        let builder = self.merge_inputs(&args.inputs)?;
        let opt_config = self.optimization.take().unwrap_or_default();

        builder
            .steps(0)
            .step_size(opt_config.dx.unwrap_or(0.0), opt_config.dy.unwrap_or(0.0))
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }

    fn merge_inputs(&mut self, inputs: &InputArgs) -> Result<core_config::RelaxationConfigBuilder> {
        self.apply_set_values(&inputs.set_values)?;

        let surface_config = self.surface.take().unwrap_or_default();
        let path_config = self.path.take().unwrap_or_default();

        let samples_path = match (&inputs.samples, surface_config.samples) {
            (Some(cli_path), _) => cli_path.clone(),
            (None, Some(file_path)) => self.resolve(file_path),
            (None, None) => {
                return Err(CliError::Config(
                    "`surface.samples` is required either in the config file or via --samples."
                        .to_string(),
                ));
            }
        };

        let interpolation = if inputs.no_interpolation {
            None
        } else if inputs.interpolation.is_some() {
            inputs.interpolation
        } else {
            surface_config
                .interpolation
                .as_deref()
                .map(Self::parse_interpolation)
                .transpose()?
                .flatten()
        };

        let initial_path = match &inputs.path_file {
            Some(cli_path) => Self::read_positions(cli_path)?,
            None => self.resolve_path_config(path_config)?,
        };

        let springs = if inputs.springs.is_empty() {
            std::mem::take(&mut self.springs)
                .into_iter()
                .map(PartialSpringConfig::into_spring)
                .collect::<Result<Vec<_>>>()?
        } else {
            inputs.springs.clone()
        };

        Ok(core_config::RelaxationConfigBuilder::new()
            .samples_path(samples_path)
            .interpolation(interpolation)
            .initial_path(initial_path)
            .springs(springs))
    }

    fn parse_interpolation(name: &str) -> Result<Option<InterpolationMethod>> {
        if name.eq_ignore_ascii_case("none") {
            return Ok(None);
        }
        name.parse::<InterpolationMethod>()
            .map(Some)
            .map_err(|e| CliError::Config(format!("Invalid `surface.interpolation`: {}", e)))
    }

    fn resolve_path_config(&self, path_config: PartialPathConfig) -> Result<Vec<Point2<f64>>> {
        match (path_config.nodes, path_config.file) {
            (Some(_), Some(_)) => Err(CliError::Config(
                "`path.nodes` and `path.file` are mutually exclusive.".to_string(),
            )),
            (Some(nodes), None) => Ok(nodes.into_iter().map(|[x, y]| Point2::new(x, y)).collect()),
            (None, Some(file)) => Self::read_positions(&self.resolve(file)),
            (None, None) => Err(CliError::Config(
                "An initial path is required: set `path.nodes` or `path.file`, or pass --path."
                    .to_string(),
            )),
        }
    }

    fn read_positions(path: &Path) -> Result<Vec<Point2<f64>>> {
        debug!("Reading initial path from {:?}", path);
        let records = PositionTable::read_from_path(path).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })?;
        Ok(records.into_iter().map(Point2::from).collect())
    }

    fn resolve(&self, path: PathBuf) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path,
        }
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let (key, value_str) =
                parser::parse_setting(kv_pair).map_err(|e| CliError::Config(e.to_string()))?;

            let float = || {
                value_str.parse::<f64>().map_err(|_| {
                    CliError::Config(format!("Invalid float value for {}: {}", key, value_str))
                })
            };
            let integer = || {
                value_str.parse::<usize>().map_err(|_| {
                    CliError::Config(format!("Invalid integer value for {}: {}", key, value_str))
                })
            };

            // Paths given here are relative to the working directory, not the config file.
            match key {
                "surface.samples" => {
                    self.surface.get_or_insert_with(Default::default).samples =
                        Some(std::path::absolute(value_str)?);
                }
                "surface.interpolation" => {
                    self.surface.get_or_insert_with(Default::default).interpolation =
                        Some(value_str.to_string());
                }
                "path.file" => {
                    let path = self.path.get_or_insert_with(Default::default);
                    path.file = Some(std::path::absolute(value_str)?);
                    path.nodes = None;
                }
                "optimization.steps" => {
                    self.optimization.get_or_insert_with(Default::default).steps = Some(integer()?);
                }
                "optimization.dx" => {
                    self.optimization.get_or_insert_with(Default::default).dx = Some(float()?);
                }
                "optimization.dy" => {
                    self.optimization.get_or_insert_with(Default::default).dy = Some(float()?);
                }
                "profile.degree-factor" => {
                    self.profile.get_or_insert_with(Default::default).degree_factor =
                        Some(float()?);
                }
                "profile.flip" => {
                    self.profile.get_or_insert_with(Default::default).flip =
                        Some(value_str.parse().map_err(|_| {
                            CliError::Config(format!(
                                "Invalid boolean value for {}: {}",
                                key, value_str
                            ))
                        })?);
                }
                "profile.waypoints" => {
                    self.profile.get_or_insert_with(Default::default).waypoints =
                        Some(integer()?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    const BASE_CONFIG: &str = r#"
        [surface]
        samples = "pmf.csv"
        interpolation = "cubic"

        [path]
        nodes = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]

        [optimization]
        steps = 25
        dx = 0.5
        dy = 0.25

        [[springs]]
        axis = "x"
        stiffness = 10.0

        [[springs]]
        axis = "y"
        stiffness = 2.0
        equilibrium-distance = 0.1
        exponent = 4.0

        [profile]
        waypoints = 5
    "#;

    fn write_config(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("relax.toml");
        fs::write(&path, content).unwrap();
        path
    }

    fn relax_args(extra: &[&str]) -> RelaxArgs {
        let mut args = vec!["pmfstring", "relax", "-o", "out.csv"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Relax(args) => args,
            _ => panic!("Expected 'relax' subcommand"),
        }
    }

    fn inspect_args(extra: &[&str]) -> InspectArgs {
        let mut args = vec!["pmfstring", "inspect"];
        args.extend_from_slice(extra);
        match Cli::parse_from(args).command {
            Commands::Inspect(args) => args,
            _ => panic!("Expected 'inspect' subcommand"),
        }
    }

    #[test]
    fn file_values_are_loaded_and_relative_paths_resolved() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&[]))
            .unwrap();

        assert_eq!(config.surface.samples_path, dir.path().join("pmf.csv"));
        assert_eq!(config.surface.interpolation, Some(InterpolationMethod::Cubic));
        assert_eq!(config.initial_path.len(), 3);
        assert_eq!(config.initial_path[2], Point2::new(2.0, 2.0));
        assert_eq!(config.optimization.steps, 25);
        assert_eq!(config.optimization.step_x, 0.5);
        assert_eq!(config.optimization.step_y, 0.25);
        assert_eq!(config.springs.len(), 2);
        assert_eq!(config.springs[0], Spring::new(10.0, 0.0, Axis::X));
        assert_eq!(config.springs[1].exponent, 4.0);
        assert_eq!(config.profile.waypoints, Some(5));
        assert!(!config.profile.flip);
    }

    #[test]
    fn cli_args_override_file_values() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);
        let args = relax_args(&[
            "--samples",
            "other.csv",
            "-m",
            "pchip",
            "-n",
            "7",
            "--dx",
            "0.1",
            "--spring",
            "y:3:0",
            "--flip",
        ]);

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&args)
            .unwrap();

        assert_eq!(config.surface.samples_path, PathBuf::from("other.csv"));
        assert_eq!(config.surface.interpolation, Some(InterpolationMethod::Pchip));
        assert_eq!(config.optimization.steps, 7);
        assert_eq!(config.optimization.step_x, 0.1);
        assert_eq!(config.optimization.step_y, 0.25);
        assert_eq!(config.springs, vec![Spring::new(3.0, 0.0, Axis::Y)]);
        assert!(config.profile.flip);
    }

    #[test]
    fn no_interpolation_flag_ignores_file_method() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&["--no-interpolation"]))
            .unwrap();
        assert_eq!(config.surface.interpolation, None);
    }

    #[test]
    fn set_values_override_file_and_defaults() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);
        let args = relax_args(&[
            "-S",
            "optimization.steps=300",
            "-S",
            "profile.degree-factor=1.5",
            "-S",
            "surface.interpolation=none",
        ]);

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&args)
            .unwrap();

        assert_eq!(config.optimization.steps, 300);
        assert_eq!(config.profile.degree_factor, 1.5);
        assert_eq!(config.surface.interpolation, None);
    }

    #[test]
    fn set_value_paths_resolve_against_the_working_directory() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);
        let args = relax_args(&["-S", "surface.samples=data/other.csv"]);

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&args)
            .unwrap();

        assert_eq!(
            config.surface.samples_path,
            std::env::current_dir().unwrap().join("data/other.csv")
        );
    }

    #[test]
    fn unsupported_or_malformed_set_values_are_rejected() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, BASE_CONFIG);

        for setting in ["optimization.tolerance=1", "optimization.steps=many", "steps"] {
            let result = PartialRelaxConfig::from_file(&config_path)
                .unwrap()
                .merge_with_relax_args(&relax_args(&["-S", setting]));
            assert!(matches!(result, Err(CliError::Config(_))), "{setting}");
        }
    }

    #[test]
    fn path_file_is_read_relative_to_the_config() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("path.csv"), "x,y\n0.0,0.0\n0.5,1.5\n").unwrap();
        let config_path = write_config(
            &dir,
            r#"
            [surface]
            samples = "pmf.csv"
            [path]
            file = "path.csv"
            [optimization]
            dx = 1.0
            dy = 1.0
            "#,
        );

        let config = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&[]))
            .unwrap();

        assert_eq!(
            config.initial_path,
            vec![Point2::new(0.0, 0.0), Point2::new(0.5, 1.5)]
        );
        assert_eq!(config.optimization.steps, DEFAULT_STEPS);
        assert_eq!(config.surface.interpolation, None);
        assert!(config.springs.is_empty());
    }

    #[test]
    fn missing_required_values_return_config_errors() {
        let dir = tempdir().unwrap();
        let config_path = write_config(
            &dir,
            r#"
            [path]
            nodes = [[0.0, 0.0]]
            "#,
        );

        let result = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&["--dx", "1", "--dy", "1"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("surface.samples")));

        let result = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&["--samples", "pmf.csv"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("dx")));
    }

    #[test]
    fn unknown_fields_are_a_parse_error() {
        let dir = tempdir().unwrap();
        let config_path = write_config(&dir, "[optimization]\nsteps = 3\nmomentum = 0.9\n");

        let result = PartialRelaxConfig::from_file(&config_path);
        assert!(matches!(result, Err(CliError::FileParsing { .. })));
    }

    #[test]
    fn invalid_interpolation_name_is_reported() {
        let dir = tempdir().unwrap();
        let config_path = write_config(
            &dir,
            r#"
            [surface]
            samples = "pmf.csv"
            interpolation = "bicubic"
            [path]
            nodes = [[0.0, 0.0]]
            "#,
        );

        let result = PartialRelaxConfig::from_file(&config_path)
            .unwrap()
            .merge_with_relax_args(&relax_args(&["--dx", "1", "--dy", "1"]));
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("bicubic")));
    }

    #[test]
    fn inspect_runs_without_steps_and_defaults_to_zero_step_sizes() {
        let args = inspect_args(&["--samples", "pmf.csv", "--spring", "x:1:0"]);
        let mut partial = PartialRelaxConfig::default();
        partial.path = Some(PartialPathConfig {
            nodes: Some(vec![[0.0, 0.0], [1.0, 0.0]]),
            file: None,
        });

        let config = partial.merge_with_inspect_args(&args).unwrap();

        assert_eq!(config.optimization.steps, 0);
        assert_eq!(config.optimization.step_x, 0.0);
        assert_eq!(config.springs.len(), 1);
    }
}
