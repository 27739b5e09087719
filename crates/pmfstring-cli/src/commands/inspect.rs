use super::relax::write_table;
use crate::cli::InspectArgs;
use crate::config::PartialRelaxConfig;
use crate::error::Result;
use pmfstring::core::io::tables::ProfileTable;
use pmfstring::engine::config::RelaxationConfig;
use pmfstring::engine::relaxer::PathRelaxer;
use pmfstring::workflows::relax::load_surface;
use tracing::info;

/// One printed row of the inspection table.
#[derive(Debug, Clone, PartialEq)]
struct NodeReport {
    index: usize,
    x: f64,
    y: f64,
    pmf_energy: f64,
    spring_energy: f64,
    probability: f64,
    candidates: usize,
}

pub fn run(args: InspectArgs) -> Result<()> {
    let partial_config = PartialRelaxConfig::load(args.inputs.config.as_deref())?;
    let config = partial_config.merge_with_inspect_args(&args)?;

    let relaxer = prepare(&config)?;
    let reports = collect_reports(&relaxer)?;

    println!(
        "{:>5} {:>12} {:>12} {:>14} {:>14} {:>12} {:>5}",
        "node", "x", "y", "pmf", "spring", "probability", "cand"
    );
    for report in &reports {
        println!(
            "{:>5} {:>12.4} {:>12.4} {:>14.6} {:>14.6} {:>12.6} {:>5}",
            report.index,
            report.x,
            report.y,
            report.pmf_energy,
            report.spring_energy,
            report.probability,
            report.candidates
        );
    }
    println!(
        "Total: PMF {:.6}, external {:.6}, combined {:.6}",
        relaxer.total_pmf_energy(),
        relaxer.total_external_energy(),
        relaxer.total_energy()
    );

    if let Some(path) = &args.output {
        write_table::<ProfileTable>(&relaxer.profile(), path)?;
        info!("Profile written to {:?}", path);
    }
    Ok(())
}

fn prepare(config: &RelaxationConfig) -> Result<PathRelaxer> {
    let surface = load_surface(&config.surface.samples_path)?;
    let mut relaxer =
        PathRelaxer::new(surface, &config.initial_path, config.surface.interpolation)?;
    relaxer.set_step_size(config.optimization.step_x, config.optimization.step_y)?;
    for spring in &config.springs {
        relaxer.add_energy(*spring);
    }
    relaxer.refresh_external_terms()?;
    Ok(relaxer)
}

fn collect_reports(relaxer: &PathRelaxer) -> Result<Vec<NodeReport>> {
    relaxer
        .chain()
        .iter()
        .map(|node| -> Result<NodeReport> {
            let index = node.index();
            Ok(NodeReport {
                index,
                x: node.x(),
                y: node.y(),
                pmf_energy: node.pmf_energy(),
                spring_energy: relaxer.node_spring_energy(index)?,
                probability: node.probability(),
                candidates: relaxer.node_neighbors(index)?.len(),
            })
        })
        .collect()
}
