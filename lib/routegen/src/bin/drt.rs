use json;
use rayon::ThreadPoolBuilder;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;
use itertools::Itertools;
use anyhow::Result;
use tracing::*;

use routegen::*;
use routegen::data::DrtInstance;
use routegen::drt::{Stop, StopKind};
use routegen::drt::solution::Solution;
use routegen::drt::solver::Solver;

mod common;
use common::*;

use structopt::StructOpt;

#[derive(Debug, Copy, Clone)]
enum Algorithm {
    Greedy,
    Random,
    Vnd,
    LocalSearch,
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        return match s {
            "greedy" => Ok(Self::Greedy),
            "random" => Ok(Self::Random),
            "vnd" => Ok(Self::Vnd),
            "ls" => Ok(Self::LocalSearch),
            _ => Err(format!("invalid string: {}", s))
        };
    }
}

#[derive(Debug, StructOpt)]
struct ClArgs {
    /// Instance file to solve.
    #[structopt(parse(from_os_str))]
    instance: PathBuf,
    #[structopt(parse(try_from_str), possible_values=&["greedy", "random", "vnd", "ls"])]
    algorithm: Algorithm,
    /// Registry index used by the `ls` algorithm.
    #[structopt(long, short="n", default_value="1", validator=clap_range_validator(Some(1), Some(10)))]
    neighborhood: usize,
    #[structopt(long)]
    seed: Option<u64>,
    #[structopt(long, short="c", default_value="1", validator=clap_range_validator(Some(1), None))]
    cpus: usize,
    #[structopt(flatten)]
    output: OutputOptions,
}

fn stop_record(s: &Stop, data: &DrtInstance) -> json::JsonValue {
    let (kind, request) = match s.kind {
        StopKind::Depot => ("depot", json::JsonValue::Null),
        StopKind::Pickup(id) => ("pickup", id.into()),
        StopKind::Delivery(id) => ("delivery", id.into()),
    };
    return json::object! {
        kind: kind,
        request: request,
        node: s.kind.loc(data).map(json::JsonValue::from).unwrap_or(json::JsonValue::Null),
        time: s.time,
    };
}

struct RunReport<'a> {
    data: &'a DrtInstance,
    solution: &'a Solution,
}

impl<'a> RunOutput for RunReport<'a> {
    fn write_json(&self, mut buf: impl Write) -> Result<()> {
        let routes: json::JsonValue = self.solution.routes.iter()
            .map(|r| json::object! {
                vehicle: r.vehicle.id,
                attended: json::JsonValue::from(r.attended.clone()),
                stops: self.stops_of(r),
                distance: r.distance,
                travel_time: r.travel_time,
                tw_violation: r.tw_violation,
            })
            .collect_vec()
            .into();

        let root = json::object! {
            instance: self.data.id.as_str(),
            evaluation: self.solution.evaluation,
            routes: routes,
            unserved: json::JsonValue::from(self.solution.unserved.clone()),
        };
        root.write_pretty(&mut buf, 2)?;
        return Ok(())
    }

    fn write_json_summary(&self, mut buf: impl Write) -> Result<()> {
        let root = json::object! {
            instance: self.data.id.as_str(),
            routes: self.solution.routes.len(),
            unserved: self.solution.unserved.len(),
            distance: self.solution.total_distance(),
            travel_time: self.solution.total_travel_time(),
            tw_violation: self.solution.total_violation(),
            evaluation: self.solution.evaluation,
        };
        root.write_pretty(&mut buf, 2)?;
        return Ok(())
    }
}

impl<'a> RunReport<'a> {
    fn stops_of(&self, route: &routegen::drt::solution::Route) -> json::JsonValue {
        return route.stops.iter()
            .map(|s| stop_record(s, self.data))
            .collect_vec()
            .into();
    }
}

fn main() -> anyhow::Result<()> {
    let args: ClArgs = StructOpt::from_args();
    let _g = init_logging(args.output.log.clone());
    debug!(?args);
    ThreadPoolBuilder::new().num_threads(args.cpus).build_global().expect("Failed to construct thread pool");

    let data = DrtInstance::load(&args.instance)?;
    let mut solver = match args.seed {
        Some(seed) => Solver::with_seed(&data, seed),
        None => Solver::new(&data),
    };

    match args.algorithm {
        Algorithm::Greedy => {
            solver.build_greedy_solution()?;
        }
        Algorithm::Random => {
            solver.build_random_solution()?;
        }
        Algorithm::Vnd => {
            solver.vnd()?;
        }
        Algorithm::LocalSearch => {
            solver.build_greedy_solution()?;
            let improved = solver.local_search(args.neighborhood)?;
            info!(neighborhood = args.neighborhood, improved, "local search finished");
        }
    }

    let solution = solver.solution().expect("an algorithm just ran");
    output_report(&args.output, RunReport { data: &data, solution })?;
    Ok(())
}
