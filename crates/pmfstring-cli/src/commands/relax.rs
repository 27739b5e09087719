use crate::cli::RelaxArgs;
use crate::config::PartialRelaxConfig;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use pmfstring::{
    core::io::{
        tables::{NormalizedProfileTable, ProfileTable, WaypointTable},
        traits::CsvTable,
    },
    engine::progress::ProgressReporter,
    workflows,
};
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: RelaxArgs) -> Result<()> {
    let partial_config = PartialRelaxConfig::load(args.inputs.config.as_deref())?;
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_relax_args(&args)?;

    if args.waypoints_output.is_some() && config.profile.waypoints.is_none() {
        return Err(CliError::Argument(
            "--waypoints-output requires a waypoint count (--waypoints or `profile.waypoints`)."
                .to_string(),
        ));
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Relaxing a path of {} node(s) for {} step(s)...",
        config.initial_path.len(),
        config.optimization.steps
    );
    info!("Invoking the core relaxation workflow...");
    let result = workflows::relax::run(&config, &reporter)?;

    write_table::<ProfileTable>(&result.final_profile, &args.output)?;
    info!("Relaxed profile written to {:?}", &args.output);

    if let Some(path) = &args.initial_output {
        write_table::<ProfileTable>(&result.initial_profile, path)?;
        info!("Initial profile written to {:?}", path);
    }
    if let Some(path) = &args.normalized_output {
        write_table::<NormalizedProfileTable>(&result.normalized_profile, path)?;
        info!("Normalized profile written to {:?}", path);
    }
    match (&args.waypoints_output, &result.waypoints) {
        (Some(path), Some(waypoints)) => {
            write_table::<WaypointTable>(waypoints, path)?;
            info!("{} waypoint(s) written to {:?}", waypoints.len(), path);
        }
        (None, Some(waypoints)) => {
            warn!(
                "{} waypoint(s) were computed but no --waypoints-output was given.",
                waypoints.len()
            );
        }
        _ => {}
    }

    println!(
        "Total energy: {:.4} -> {:.4} (PMF {:.4}, external {:.4})",
        result.initial_energy.total(),
        result.final_energy.total(),
        result.final_energy.pmf,
        result.final_energy.external
    );
    println!("✓ Relaxed profile written to: {}", args.output.display());
    Ok(())
}

pub(crate) fn write_table<T: CsvTable>(records: &[T::Record], path: &Path) -> Result<()> {
    T::write_to_path(records, path).map_err(|e| CliError::FileWriting {
        path: path.to_path_buf(),
        source: e.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use pmfstring::core::io::tables::SampleTable;
    use pmfstring::core::profile::NodeProfile;
    use pmfstring::core::surface::grid::Sample;
    use std::fs;
    use tempfile::tempdir;

    fn write_bowl_samples(path: &Path) {
        let axis: Vec<f64> = (0..=4).map(f64::from).collect();
        let samples: Vec<Sample> = axis
            .iter()
            .flat_map(|&x| axis.iter().map(move |&y| (x, y)))
            .map(|(x, y)| Sample::new(x, y, (x - 2.0).powi(2) + (y - 2.0).powi(2), 1.0))
            .collect();
        SampleTable::write_to_path(&samples, path).unwrap();
    }

    fn parse_relax(args: &[&str]) -> RelaxArgs {
        match Cli::parse_from(args).command {
            Commands::Relax(args) => args,
            _ => panic!("Expected 'relax' subcommand"),
        }
    }

    #[test]
    fn relax_writes_final_and_auxiliary_profiles() {
        let dir = tempdir().unwrap();
        write_bowl_samples(&dir.path().join("pmf.csv"));
        let config_path = dir.path().join("relax.toml");
        fs::write(
            &config_path,
            r#"
            [surface]
            samples = "pmf.csv"
            [path]
            nodes = [[0.0, 0.0], [0.0, 4.0], [4.0, 4.0]]
            [optimization]
            steps = 4
            dx = 1.0
            dy = 1.0
            [profile]
            waypoints = 2
            "#,
        )
        .unwrap();

        let output = dir.path().join("final.csv");
        let normalized = dir.path().join("normalized.csv");
        let waypoints = dir.path().join("waypoints.csv");
        let args = parse_relax(&[
            "pmfstring",
            "relax",
            "-c",
            config_path.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--normalized-output",
            normalized.to_str().unwrap(),
            "--waypoints-output",
            waypoints.to_str().unwrap(),
        ]);

        run(args).unwrap();

        let profile = ProfileTable::read_from_path(&output).unwrap();
        assert_eq!(
            profile[1],
            NodeProfile {
                x: 2.0,
                y: 2.0,
                pmf_energy: 0.0,
                external_energy: 0.0,
                probability: 1.0,
            }
        );
        assert_eq!(
            NormalizedProfileTable::read_from_path(&normalized)
                .unwrap()
                .len(),
            3
        );
        assert_eq!(WaypointTable::read_from_path(&waypoints).unwrap().len(), 2);
    }

    #[test]
    fn waypoints_output_without_count_is_an_argument_error() {
        let dir = tempdir().unwrap();
        let path_file = dir.path().join("path.csv");
        fs::write(&path_file, "x,y\n0,0\n1,1\n").unwrap();
        let output = dir.path().join("out.csv");
        let args = parse_relax(&[
            "pmfstring",
            "relax",
            "--samples",
            "missing.csv",
            "--path",
            path_file.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--dx",
            "1",
            "--dy",
            "1",
            "--waypoints-output",
            "w.csv",
        ]);

        assert!(matches!(run(args), Err(CliError::Argument(_))));
        assert!(!output.exists());
    }
}
