use std::cmp::max;

use rand::Rng;
use tracing::*;

use crate::data::*;
use super::{feasibility, ranking, SearchError};
use super::ranking::{Candidate, LoadIndices, RankWeights};
use super::solution::{ObjectiveWeights, Route, Solution, Vehicle};

/// Simulation cursors for one route under construction. An explicit
/// context makes the loop restartable and testable.
#[derive(Debug, Clone)]
pub struct ConstructionContext {
    pub time: Time,
    pub node: Loc,
    pub vehicle: Vehicle,
    pub seats_used: usize,
    pub last_boarded: Option<ReqId>,
}

impl ConstructionContext {
    /// Open a route: clock to the epoch start, position to the depot.
    pub fn open(vehicle: Vehicle) -> Self {
        return ConstructionContext {
            time: 0,
            node: DEPOT,
            vehicle,
            seats_used: 0,
            last_boarded: None,
        };
    }

    #[inline]
    pub fn has_free_seat(&self) -> bool {
        return self.seats_used < self.vehicle.capacity;
    }

    /// Advance the simulation over a boarding. The first insertion
    /// jumps straight to the candidate's window-lower bound; later
    /// ones travel from the last boarded drop node and wait for the
    /// window to open if they arrive early.
    fn board(&mut self, req: &Request, data: &DrtInstance) {
        self.time = if self.last_boarded.is_none() {
            req.tw_start
        } else {
            max(self.time + data.travel(self.node, req.destination), req.tw_start)
        };
        self.node = req.destination;
        self.seats_used += 1;
        self.last_boarded = Some(req.id);
    }
}

/// Vehicles move from available to allocated when a route opens and do
/// not come back within one construction run.
#[derive(Debug, Clone)]
pub struct Fleet {
    available: Vec<Vehicle>,
    allocated: Vec<Vehicle>,
}

impl Fleet {
    pub fn new(data: &DrtInstance) -> Self {
        // stored in reverse so vehicles open in id order
        let available = (1..=data.num_vehicles)
            .rev()
            .map(|id| Vehicle { id, capacity: data.vehicle_capacity })
            .collect();
        return Fleet { available, allocated: Vec::new() };
    }

    pub fn take(&mut self) -> Option<Vehicle> {
        let v = self.available.pop()?;
        self.allocated.push(v);
        return Some(v);
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        return self.available.len();
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Picker {
    /// Highest-ranked feasible candidate.
    Greedy,
    /// Uniformly random feasible candidate.
    Random,
}

/// Greedy constructive heuristic: one route per allocated vehicle,
/// feasibility-driven insertion with opportunistic piggybacking.
pub struct RouteBuilder<'a> {
    data: &'a DrtInstance,
    loads: LoadIndices,
    rank_weights: RankWeights,
    obj_weights: ObjectiveWeights,
}

impl<'a> RouteBuilder<'a> {
    pub fn new(data: &'a DrtInstance, rank_weights: RankWeights, obj_weights: ObjectiveWeights) -> Self {
        let loads = LoadIndices::build(data);
        return RouteBuilder { data, loads, rank_weights, obj_weights };
    }

    #[instrument(level = "debug", skip(self, rng))]
    pub fn build<R: Rng>(&self, picker: Picker, rng: &mut R) -> Result<Solution, SearchError> {
        let mut pool: Vec<Candidate> = self.data.requests.iter()
            .map(|r| Candidate::new(r.id))
            .collect();

        // prune permanently infeasible requests before any ranking
        feasibility::evaluate_pool(&mut pool, 0, DEPOT, self.data)?;
        let mut unserved: Vec<ReqId> = pool.iter()
            .filter(|c| !c.feasible)
            .map(|c| c.id)
            .collect();
        if !unserved.is_empty() {
            debug!(pruned = unserved.len(), "permanently infeasible requests");
        }
        pool.retain(|c| c.feasible);

        let mut fleet = Fleet::new(self.data);
        let mut solution = Solution::new();

        while !pool.is_empty() {
            let vehicle = match fleet.take() {
                Some(v) => v,
                None => {
                    warn!(unassigned = pool.len(), "fleet exhausted");
                    break;
                }
            };
            let mut ctx = ConstructionContext::open(vehicle);
            feasibility::evaluate_pool(&mut pool, ctx.time, ctx.node, self.data)?;

            let mut attended: Vec<ReqId> = Vec::new();
            while ctx.has_free_seat() {
                ranking::rank(&mut pool, ctx.node, self.data, &self.loads, &self.rank_weights)?;
                let k = match picker {
                    Picker::Greedy => ranking::best_feasible(&pool),
                    Picker::Random => random_feasible(&pool, rng),
                };
                let k = match k {
                    Some(k) => k,
                    None => {
                        debug!(vehicle = vehicle.id, "no feasible candidate");
                        break;
                    }
                };
                let candidate = pool.swap_remove(k);
                let req = self.data.req(candidate.id)?;
                ctx.board(req, self.data);
                attended.push(req.id);
                trace!(id = req.id, time = ctx.time, node = ctx.node, "inserted");

                self.piggyback(&mut pool, &mut ctx, &mut attended)?;
                feasibility::evaluate_pool(&mut pool, ctx.time, ctx.node, self.data)?;
            }

            if attended.is_empty() {
                trace!(vehicle = vehicle.id, "empty route discarded");
                continue;
            }
            let mut route = Route::new(ctx.vehicle);
            route.attended = attended;
            route.rebuild(self.data)?;
            solution.routes.push(route);
        }

        unserved.extend(pool.iter().map(|c| c.id));
        solution.unserved = unserved;
        solution.refresh_evaluation(&self.obj_weights);
        debug!(
            routes = solution.routes.len(),
            unserved = solution.unserved.len(),
            vehicles_left = fleet.remaining(),
            evaluation = solution.evaluation,
            "construction finished"
        );
        return Ok(solution);
    }

    /// Requests whose destination coincides with the current node and
    /// whose window contains the current time board at zero extra
    /// travel cost, earliest window-lower first, while seats remain.
    fn piggyback(
        &self,
        pool: &mut Vec<Candidate>,
        ctx: &mut ConstructionContext,
        attended: &mut Vec<ReqId>,
    ) -> Result<(), SearchError> {
        if !ctx.has_free_seat() {
            return Ok(());
        }
        let mut hits: Vec<(Time, ReqId)> = Vec::new();
        for c in pool.iter() {
            let r = self.data.req(c.id)?;
            if r.destination == ctx.node && r.tw_start <= ctx.time && ctx.time <= r.tw_end {
                hits.push((r.tw_start, r.id));
            }
        }
        hits.sort();

        for (_, id) in hits {
            if !ctx.has_free_seat() {
                break;
            }
            pool.retain(|c| c.id != id);
            ctx.seats_used += 1;
            ctx.last_boarded = Some(id);
            attended.push(id);
            trace!(id, time = ctx.time, node = ctx.node, "piggyback insertion");
        }
        return Ok(());
    }
}

fn random_feasible<R: Rng>(pool: &[Candidate], rng: &mut R) -> Option<usize> {
    let feasible: Vec<usize> = pool.iter()
        .enumerate()
        .filter(|(_, c)| c.feasible)
        .map(|(k, _)| k)
        .collect();
    if feasible.is_empty() {
        return None;
    }
    return Some(feasible[rng.gen_range(0, feasible.len())]);
}
