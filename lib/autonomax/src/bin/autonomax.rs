use std::io::Write;
use std::path::PathBuf;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use itertools::Itertools;
use anyhow::{Context, Result};
use tracing::*;

use instances::dataset::{Dataset, IdxNameMap, Subset};
use instances::dataset::autonomax::SWEDEN;
use instances::modify::DSetModify;
use instances::raw::autonomax::CityTable;
use instances::{CityTableFmt, ParseInstance};

use autonomax::*;
use autonomax::model::{self, Config};
use autonomax::report::{summary_record, OutputFormat};
use autonomax::solver::{Backend, MilpSolver};

mod common;
use common::*;

use structopt::StructOpt;

#[derive(Debug, Clone, StructOpt)]
struct ProblemOptions {
    /// City table to read instead of the built-in Swedish cities
    #[structopt(long, parse(from_os_str))]
    data: Option<PathBuf>,
    /// Only keep the first N cities
    #[structopt(long, validator=clap_range_validator(Some(2), None))]
    cities: Option<usize>,
    /// Connect the core cities in a cycle (Z = 1) instead of a path (Z = 0)
    #[structopt(long)]
    cycle: bool,
    /// Core net topology flag: 1 for a cycle, 0 for a path
    #[structopt(short="z", conflicts_with="cycle")]
    z: Option<u32>,
    /// Defaults to highs when built with HiGHS support, microlp otherwise
    #[structopt(long, possible_values=&["microlp", "highs"])]
    solver: Option<Backend>,
    /// Solver time limit in seconds
    #[structopt(long, validator=clap_range_validator(Some(0.0), None))]
    time_limit: Option<f64>,
}

impl ProblemOptions {
    fn config(&self, core_cities: usize) -> Result<Config> {
        match self.z {
            Some(z) => Config::from_z_nc(z, core_cities),
            None => Ok(Config::new(core_cities, self.cycle)),
        }
    }

    fn backend(&self) -> Backend {
        self.solver.unwrap_or_default()
    }

    fn solver(&self, n_cities: usize) -> Result<Box<dyn MilpSolver>> {
        let backend = self.backend();
        if !backend.is_practical(n_cities) {
            warn!(?backend, n_cities, "instance is too large to solve in reasonable time with this backend, consider --solver highs or --cities");
        }
        backend.solver(self.time_limit)
    }
}

#[derive(Debug, StructOpt)]
enum ClArgs {
    /// Build and solve a single scenario
    Solve {
        /// Scenario name or index
        scenario: String,
        /// Number of core cities (NC)
        #[structopt(long="core-cities", short="n", default_value="3")]
        core_cities: usize,
        #[structopt(flatten)]
        problem: ProblemOptions,
        #[structopt(flatten)]
        output: OutputOptions,
    },
    /// Write the model of a single scenario in LP format without solving it
    Lp {
        scenario: String,
        #[structopt(long="core-cities", short="n", default_value="3")]
        core_cities: usize,
        #[structopt(flatten)]
        problem: ProblemOptions,
        #[structopt(flatten)]
        output: OutputOptions,
    },
    /// Solve every scenario for a range of core city counts
    Sweep {
        #[structopt(long, default_value="2")]
        min_core: usize,
        #[structopt(long, default_value="5")]
        max_core: usize,
        /// Restrict to these scenarios (names or indices)
        #[structopt(long, use_delimiter=true)]
        scenarios: Vec<String>,
        #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
        cpus: usize,
        #[structopt(flatten)]
        problem: ProblemOptions,
        #[structopt(flatten)]
        output: OutputOptions,
    },
    /// List the scenarios of a city table
    Scenarios {
        #[structopt(long, parse(from_os_str))]
        data: Option<PathBuf>,
        #[structopt(long)]
        log: Option<PathBuf>,
    },
}

fn load_table(path: Option<&PathBuf>) -> Result<CityTable> {
    match path {
        Some(p) => CityTable::parse(CityTableFmt(p)),
        None => Ok(SWEDEN.clone()),
    }
}

fn load_scenario(table: &CityTable, scenario: &str, cities: Option<usize>) -> Result<AutonomaxInstance> {
    let dataset = table.truncated(cities);
    let idx = dataset.resolve(scenario).with_context(|| format!("unknown scenario `{}`", scenario))?;
    dataset.load_instance(idx)
}

fn solve(problem: &ProblemOptions, scenario: String, core_cities: usize, output: &OutputOptions) -> Result<()> {
    let table = load_table(problem.data.as_ref())?;
    let data = load_scenario(&table, &scenario, problem.cities)?;
    let config = problem.config(core_cities)?;
    let solver = problem.solver(data.n_cities())?;
    let solved = model::build(&data, config).solve(solver.as_ref())?;
    output_report(output, &solved)
}

fn write_lp(problem: &ProblemOptions, scenario: String, core_cities: usize, output: &OutputOptions) -> Result<()> {
    let table = load_table(problem.data.as_ref())?;
    let data = load_scenario(&table, &scenario, problem.cities)?;
    let model = model::build(&data, problem.config(core_cities)?);
    let mut writer = open_output(output)?;
    model.write_lp(&mut writer)?;
    writer.flush()?;
    Ok(())
}

fn sweep(problem: &ProblemOptions, min_core: usize, max_core: usize, scenarios: Vec<String>, cpus: usize, output: &OutputOptions) -> Result<()> {
    ThreadPoolBuilder::new().num_threads(cpus).build_global().context("Failed to construct thread pool")?;
    let table = load_table(problem.data.as_ref())?;
    let dataset = (&table).truncated(problem.cities);
    let indices = if scenarios.is_empty() {
        (0..dataset.len()).collect_vec()
    } else {
        scenarios.iter().map(|s| dataset.resolve(s)).collect::<Result<Vec<_>>>()?
    };
    let dataset = Subset::new(dataset, indices)?;
    let n_cities = problem.cities.map_or(table.city_count(), |n| n.min(table.city_count()));
    let solver = problem.solver(n_cities)?;
    let solver = solver.as_ref();
    problem.config(min_core)?;

    let runs = (0..dataset.len()).cartesian_product(min_core..=max_core).collect_vec();
    info!(runs=runs.len(), cpus, "starting sweep");
    let records: Vec<json::JsonValue> = runs.into_par_iter()
        .map(|(s, nc)| -> Result<json::JsonValue> {
            let data = dataset.load_instance(s)?;
            let solved = model::build(&data, problem.config(nc)?).solve(solver)?;
            Ok(summary_record(&solved))
        })
        .collect::<Result<_>>()?;

    let mut writer = open_output(output)?;
    match output.fmt {
        OutputFormat::Table => {
            writeln!(writer, "{:<16} {:>4} {:>12} {:>14}", "scenario", "NC", "status", "objective")?;
            for r in &records {
                let obj = r["objective"].as_f64().map(|x| format!("{:.3}", x)).unwrap_or_default();
                writeln!(writer, "{:<16} {:>4} {:>12} {:>14}",
                         r["instance"].as_str().unwrap_or(""), r["core_cities"].as_usize().unwrap_or(0),
                         r["status"].as_str().unwrap_or(""), obj)?;
            }
        },
        _ => {
            for r in &records {
                writeln!(writer, "{}", r.dump())?;
            }
        },
    }
    writer.flush()?;
    Ok(())
}

fn list_scenarios(data: Option<&PathBuf>) -> Result<()> {
    let table = load_table(data)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{:>3} {:<16} {:>12}", "#", "scenario", "demand")?;
    for s in 0..table.len() {
        let total: f64 = table.demand[s].iter().sum();
        writeln!(out, "{:>3} {:<16} {:>12.1}", s, table.index_to_name(s)?, total)?;
    }
    writeln!(out, "{} cities", table.city_count())?;
    Ok(())
}

fn main() -> Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let log = match &args {
        ClArgs::Solve { output, .. } | ClArgs::Lp { output, .. } | ClArgs::Sweep { output, .. } => output.log.clone(),
        ClArgs::Scenarios { log, .. } => log.clone(),
    };
    let _g = init_logging(log)?;
    debug!(?args);

    match args {
        ClArgs::Solve { scenario, core_cities, problem, output } =>
            solve(&problem, scenario, core_cities, &output),
        ClArgs::Lp { scenario, core_cities, problem, output } =>
            write_lp(&problem, scenario, core_cities, &output),
        ClArgs::Sweep { min_core, max_core, scenarios, cpus, problem, output } =>
            sweep(&problem, min_core, max_core, scenarios, cpus, &output),
        ClArgs::Scenarios { data, .. } =>
            list_scenarios(data.as_ref()),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn options(args: &[&str]) -> ProblemOptions {
        ProblemOptions::from_iter_safe(std::iter::once("autonomax").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn topology_from_flags() {
        assert_eq!(options(&[]).config(3).unwrap(), Config::new(3, false));
        assert_eq!(options(&["--cycle"]).config(3).unwrap(), Config::new(3, true));
        assert_eq!(options(&["-z", "1"]).config(4).unwrap(), Config::new(4, true));
        assert_eq!(options(&["-z", "0"]).config(2).unwrap(), Config::new(2, false));
        assert!(options(&["-z", "2"]).config(3).is_err());
        assert!(ProblemOptions::from_iter_safe(&["autonomax", "--cycle", "-z", "1"]).is_err());
    }

    #[test]
    fn solver_selection() {
        assert_eq!(options(&[]).backend(), Backend::default());
        assert_eq!(options(&["--solver", "microlp"]).backend(), Backend::Microlp);
        assert_eq!(options(&["--solver", "highs"]).backend(), Backend::Highs);
        assert!(options(&["--solver", "microlp"]).solver(41).is_ok());
    }

    #[test]
    fn truncated_scenario() {
        let data = load_scenario(&SWEDEN, "population", Some(5)).unwrap();
        assert_eq!(data.n_cities(), 5);
        assert_eq!(data.id, "population");
        assert_eq!(load_scenario(&SWEDEN, "2", None).unwrap().n_cities(), 41);
        assert!(load_scenario(&SWEDEN, "rural", None).is_err());
    }
}
