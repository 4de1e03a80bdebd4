use rand::Rng;
use tracing::*;

use crate::data::*;
use super::SearchError;
use super::search::{MoveResult, Neighborhood};
use super::solution::{ObjectiveWeights, Solution};

/// Variable neighborhood descent over a 1-based registry. Neighborhood
/// 1 is scanned first; any accepted move restarts from 1, a rejection
/// (or an empty registry slot) moves on. Terminates at a solution no
/// registered neighborhood can strictly improve.
pub fn vnd(
    initial: Solution,
    data: &DrtInstance,
    weights: &ObjectiveWeights,
    registry: &[Option<Box<dyn Neighborhood>>],
) -> Result<Solution, SearchError> {
    let mut incumbent = initial;
    incumbent.refresh_evaluation(weights);

    let mut current = 1;
    while current <= registry.len() {
        let outcome = match &registry[current - 1] {
            Some(nb) => nb.apply(&incumbent, data, weights)?,
            None => MoveResult::Rejected,
        };
        match outcome {
            MoveResult::Accepted(s) => {
                debug!(neighborhood = current, evaluation = s.evaluation, "move accepted");
                incumbent = s;
                current = 1;
            }
            MoveResult::Rejected => current += 1,
        }
    }
    debug!(evaluation = incumbent.evaluation, "local optimum");
    return Ok(incumbent);
}

/// The random move families used to escape local optima. Intensity is
/// the number of moves applied; every intermediate solution is kept
/// structurally valid by rescheduling the touched routes.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PerturbationKind {
    RandomIntraSwap,
    RandomInterSwap,
    RandomReallocate,
}

pub fn perturb<R: Rng>(
    solution: &Solution,
    kind: PerturbationKind,
    intensity: usize,
    data: &DrtInstance,
    weights: &ObjectiveWeights,
    rng: &mut R,
) -> Result<Solution, SearchError> {
    // random moves index into routes, so a structurally invalid
    // solution must be refused up front
    if solution.routes.iter().any(|r| r.attended.is_empty()) {
        return Err(SearchError::EmptyRoute);
    }

    let mut sol = solution.clone();
    for _ in 0..intensity {
        match kind {
            PerturbationKind::RandomIntraSwap => random_intra_swap(&mut sol, data, rng)?,
            PerturbationKind::RandomInterSwap => random_inter_swap(&mut sol, data, rng)?,
            PerturbationKind::RandomReallocate => random_reallocate(&mut sol, data, rng)?,
        }
    }
    sol.refresh_evaluation(weights);
    trace!(?kind, intensity, evaluation = sol.evaluation, "perturbed");
    return Ok(sol);
}

// A structurally impossible move (no route long enough, a lone route,
// every target full) is skipped rather than treated as an error.

fn random_intra_swap<R: Rng>(
    sol: &mut Solution,
    data: &DrtInstance,
    rng: &mut R,
) -> Result<(), SearchError> {
    let candidates: Vec<usize> = (0..sol.routes.len())
        .filter(|&r| sol.routes[r].attended.len() >= 2)
        .collect();
    if candidates.is_empty() {
        return Ok(());
    }
    let r = candidates[rng.gen_range(0, candidates.len())];
    let len = sol.routes[r].attended.len();
    let j = rng.gen_range(0, len);
    let mut k = rng.gen_range(0, len - 1);
    if k >= j {
        k += 1;
    }
    sol.routes[r].attended.swap(j, k);
    return sol.routes[r].rebuild(data);
}

fn random_inter_swap<R: Rng>(
    sol: &mut Solution,
    data: &DrtInstance,
    rng: &mut R,
) -> Result<(), SearchError> {
    let n = sol.routes.len();
    if n < 2 {
        return Ok(());
    }
    let a = rng.gen_range(0, n);
    let mut b = rng.gen_range(0, n - 1);
    if b >= a {
        b += 1;
    }
    let i = rng.gen_range(0, sol.routes[a].attended.len());
    let j = rng.gen_range(0, sol.routes[b].attended.len());
    let ra = sol.routes[a].attended[i];
    sol.routes[a].attended[i] = sol.routes[b].attended[j];
    sol.routes[b].attended[j] = ra;
    sol.routes[a].rebuild(data)?;
    return sol.routes[b].rebuild(data);
}

fn random_reallocate<R: Rng>(
    sol: &mut Solution,
    data: &DrtInstance,
    rng: &mut R,
) -> Result<(), SearchError> {
    if sol.routes.len() < 2 {
        return Ok(());
    }
    let from = rng.gen_range(0, sol.routes.len());
    let targets: Vec<usize> = (0..sol.routes.len())
        .filter(|&r| r != from && sol.routes[r].attended.len() < sol.routes[r].vehicle.capacity)
        .collect();
    if targets.is_empty() {
        return Ok(());
    }
    let to = targets[rng.gen_range(0, targets.len())];
    let pos = rng.gen_range(0, sol.routes[from].attended.len());
    let slot = rng.gen_range(0, sol.routes[to].attended.len() + 1);

    let id = sol.routes[from].attended.remove(pos);
    sol.routes[to].attended.insert(slot, id);
    sol.routes[from].rebuild(data)?;
    sol.routes[to].rebuild(data)?;
    sol.drop_empty_routes();
    return Ok(());
}
