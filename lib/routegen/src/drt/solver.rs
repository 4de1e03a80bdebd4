use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::*;

use crate::data::*;
use super::SearchError;
use super::construction::{Picker, RouteBuilder};
use super::ranking::RankWeights;
use super::search::{default_neighborhoods, MoveResult, Neighborhood};
use super::solution::{ObjectiveWeights, Solution};
use super::vnd::{self, PerturbationKind};

/// Owns the incumbent solution and the pieces the metaheuristic cycles
/// through: construction, single-neighborhood descent, full VND and
/// random perturbation. All randomness flows through one seeded rng so
/// a whole run is reproducible from the seed.
pub struct Solver<'a> {
    data: &'a DrtInstance,
    rank_weights: RankWeights,
    weights: ObjectiveWeights,
    neighborhoods: Vec<Option<Box<dyn Neighborhood>>>,
    rng: StdRng,
    incumbent: Option<Solution>,
}

impl<'a> Solver<'a> {
    pub fn new(data: &'a DrtInstance) -> Self {
        return Solver::with_seed(data, rand::random());
    }

    pub fn with_seed(data: &'a DrtInstance, seed: u64) -> Self {
        debug!(id = %data.id, seed, "solver created");
        return Solver {
            data,
            rank_weights: RankWeights::default(),
            weights: ObjectiveWeights::default(),
            neighborhoods: default_neighborhoods(),
            rng: StdRng::seed_from_u64(seed),
            incumbent: None,
        };
    }

    pub fn objective_weights(&mut self, weights: ObjectiveWeights) -> &mut Self {
        self.weights = weights;
        return self;
    }

    pub fn rank_weights(&mut self, weights: RankWeights) -> &mut Self {
        self.rank_weights = weights;
        return self;
    }

    pub fn solution(&self) -> Option<&Solution> {
        return self.incumbent.as_ref();
    }

    pub fn build_greedy_solution(&mut self) -> Result<&Solution, SearchError> {
        return self.construct(Picker::Greedy);
    }

    pub fn build_random_solution(&mut self) -> Result<&Solution, SearchError> {
        return self.construct(Picker::Random);
    }

    fn construct(&mut self, picker: Picker) -> Result<&Solution, SearchError> {
        let builder = RouteBuilder::new(self.data, self.rank_weights, self.weights);
        let solution = builder.build(picker, &mut self.rng)?;
        self.incumbent = Some(solution);
        return Ok(self.incumbent.as_ref().unwrap());
    }

    /// Descend with one registered neighborhood until it rejects.
    /// Returns whether the incumbent improved at least once. `id` is
    /// the 1-based registry index; empty slots are an error.
    pub fn local_search(&mut self, id: usize) -> Result<bool, SearchError> {
        if id < 1 || id > self.neighborhoods.len() {
            return Err(SearchError::UnknownNeighborhood(id));
        }
        let nb = match &self.neighborhoods[id - 1] {
            Some(nb) => nb,
            None => return Err(SearchError::UnknownNeighborhood(id)),
        };
        let incumbent = self.incumbent.as_mut().ok_or(SearchError::NoIncumbent)?;
        incumbent.refresh_evaluation(&self.weights);

        let mut improved = false;
        loop {
            match nb.apply(incumbent, self.data, &self.weights)? {
                MoveResult::Accepted(s) => {
                    debug!(neighborhood = id, evaluation = s.evaluation, "move accepted");
                    *incumbent = s;
                    improved = true;
                }
                MoveResult::Rejected => break,
            }
        }
        return Ok(improved);
    }

    /// Full variable neighborhood descent over the registry. Builds a
    /// greedy incumbent first when none exists yet.
    pub fn vnd(&mut self) -> Result<&Solution, SearchError> {
        if self.incumbent.is_none() {
            self.build_greedy_solution()?;
        }
        let incumbent = self.incumbent.take().ok_or(SearchError::NoIncumbent)?;
        let optimum = vnd::vnd(incumbent, self.data, &self.weights, &self.neighborhoods)?;
        self.incumbent = Some(optimum);
        return Ok(self.incumbent.as_ref().unwrap());
    }

    /// Apply `intensity` random moves of the given kind to the
    /// incumbent, accepting the result unconditionally.
    pub fn perturbation(
        &mut self,
        kind: PerturbationKind,
        intensity: usize,
    ) -> Result<&Solution, SearchError> {
        let incumbent = self.incumbent.as_ref().ok_or(SearchError::NoIncumbent)?;
        let shaken = vnd::perturb(
            incumbent,
            kind,
            intensity,
            self.data,
            &self.weights,
            &mut self.rng,
        )?;
        self.incumbent = Some(shaken);
        return Ok(self.incumbent.as_ref().unwrap());
    }
}
