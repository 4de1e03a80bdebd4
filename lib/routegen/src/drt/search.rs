use rayon::prelude::*;

use crate::data::*;
use super::SearchError;
use super::solution::{evaluate, ObjectiveWeights, Solution};

/// Outcome of one neighborhood application. `Accepted` carries a fresh
/// solution; the incumbent the operator scanned is never mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveResult {
    Accepted(Solution),
    Rejected,
}

impl MoveResult {
    pub fn accepted(&self) -> bool {
        matches!(self, MoveResult::Accepted(_))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Policy {
    FirstImprovement,
    BestImprovement,
}

/// A deterministic move scan over the incumbent. Acceptance is strict:
/// a trial matching the incumbent's evaluation is rejected, so a chain
/// of accepted moves always terminates.
pub trait Neighborhood: Send + Sync {
    fn name(&self) -> &'static str;

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError>;
}

/// Shared accept-or-keep-scanning logic for both policies.
struct Scan {
    policy: Policy,
    base: f64,
    best: Option<Solution>,
}

impl Scan {
    fn new(policy: Policy, base: f64) -> Self {
        return Scan { policy, base, best: None };
    }

    /// Evaluate one trial; returns true when the scan may stop early.
    fn offer(&mut self, mut trial: Solution, weights: &ObjectiveWeights) -> bool {
        let score = trial.refresh_evaluation(weights);
        if score >= self.base {
            return false;
        }
        // ties within the scan keep the earlier trial
        let better = match &self.best {
            Some(b) => score < b.evaluation,
            None => true,
        };
        if better {
            self.best = Some(trial);
        }
        return self.policy == Policy::FirstImprovement;
    }

    fn finish(self) -> MoveResult {
        return match self.best {
            Some(s) => MoveResult::Accepted(s),
            None => MoveResult::Rejected,
        };
    }
}

/// Swap two requests within one route. Positions are scanned in
/// ascending (j, k) order, j < k, routes in index order.
#[derive(Debug, Clone, Copy)]
pub struct IntraRouteSwap {
    pub policy: Policy,
}

impl Neighborhood for IntraRouteSwap {
    fn name(&self) -> &'static str { "intra-route-swap" }

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError> {
        let mut scan = Scan::new(self.policy, evaluate(incumbent, weights));
        for r in 0..incumbent.routes.len() {
            let len = incumbent.routes[r].attended.len();
            for j in 0..len {
                for k in j + 1..len {
                    let mut trial = incumbent.clone();
                    trial.routes[r].attended.swap(j, k);
                    trial.routes[r].rebuild(data)?;
                    if scan.offer(trial, weights) {
                        return Ok(scan.finish());
                    }
                }
            }
        }
        return Ok(scan.finish());
    }
}

/// Exchange one request of route `a` with one of route `b`. Route
/// sizes are unchanged, so no capacity check is needed.
#[derive(Debug, Clone, Copy)]
pub struct InterRouteSwap {
    pub policy: Policy,
}

impl Neighborhood for InterRouteSwap {
    fn name(&self) -> &'static str { "inter-route-swap" }

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError> {
        let mut scan = Scan::new(self.policy, evaluate(incumbent, weights));
        let n = incumbent.routes.len();
        for a in 0..n {
            for b in a + 1..n {
                for i in 0..incumbent.routes[a].attended.len() {
                    for j in 0..incumbent.routes[b].attended.len() {
                        let mut trial = incumbent.clone();
                        let ra = trial.routes[a].attended[i];
                        let rb = trial.routes[b].attended[j];
                        trial.routes[a].attended[i] = rb;
                        trial.routes[b].attended[j] = ra;
                        trial.routes[a].rebuild(data)?;
                        trial.routes[b].rebuild(data)?;
                        if scan.offer(trial, weights) {
                            return Ok(scan.finish());
                        }
                    }
                }
            }
        }
        return Ok(scan.finish());
    }
}

/// Move one request from its route into another route at any position.
/// The source route may empty out; the trial then drops it, shrinking
/// the fleet term. Each (route, position, target, slot) tuple is tried
/// exactly once per scan; the best-improvement variant evaluates the
/// independent trials in parallel.
#[derive(Debug, Clone, Copy)]
pub struct Reallocate {
    pub policy: Policy,
}

fn reallocate_trial(
    incumbent: &Solution,
    from: usize,
    pos: usize,
    to: usize,
    slot: usize,
    data: &DrtInstance,
    weights: &ObjectiveWeights,
) -> Result<Solution, SearchError> {
    let mut trial = incumbent.clone();
    let id = trial.routes[from].attended.remove(pos);
    trial.routes[to].attended.insert(slot, id);
    trial.routes[from].rebuild(data)?;
    trial.routes[to].rebuild(data)?;
    trial.drop_empty_routes();
    trial.refresh_evaluation(weights);
    return Ok(trial);
}

fn reallocate_moves(incumbent: &Solution) -> Vec<(usize, usize, usize, usize)> {
    let mut moves = Vec::new();
    for from in 0..incumbent.routes.len() {
        for pos in 0..incumbent.routes[from].attended.len() {
            for to in 0..incumbent.routes.len() {
                if to == from {
                    continue;
                }
                let target = &incumbent.routes[to];
                if target.attended.len() >= target.vehicle.capacity {
                    continue;
                }
                for slot in 0..=target.attended.len() {
                    moves.push((from, pos, to, slot));
                }
            }
        }
    }
    return moves;
}

impl Neighborhood for Reallocate {
    fn name(&self) -> &'static str { "reallocation" }

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError> {
        let base = evaluate(incumbent, weights);
        let moves = reallocate_moves(incumbent);

        if self.policy == Policy::BestImprovement {
            let trials: Vec<Solution> = moves
                .into_par_iter()
                .map(|(from, pos, to, slot)| {
                    reallocate_trial(incumbent, from, pos, to, slot, data, weights)
                })
                .collect::<Result<_, _>>()?;

            let mut best: Option<Solution> = None;
            for trial in trials {
                if trial.evaluation >= base {
                    continue;
                }
                let better = match &best {
                    Some(b) => trial.evaluation < b.evaluation,
                    None => true,
                };
                if better {
                    best = Some(trial);
                }
            }
            return Ok(match best {
                Some(s) => MoveResult::Accepted(s),
                None => MoveResult::Rejected,
            });
        }

        for (from, pos, to, slot) in moves {
            let trial = reallocate_trial(incumbent, from, pos, to, slot, data, weights)?;
            if trial.evaluation < base {
                return Ok(MoveResult::Accepted(trial));
            }
        }
        return Ok(MoveResult::Rejected);
    }
}

const MAX_SHIFT: Time = 5;

/// Slide a whole route's schedule by up to `MAX_SHIFT` minutes, adding
/// first and removing as the inverse. Stop order and arcs are
/// untouched, so only the time-window violation can move.
#[derive(Debug, Clone, Copy)]
pub struct ShiftSchedule {
    pub policy: Policy,
}

impl Neighborhood for ShiftSchedule {
    fn name(&self) -> &'static str { "schedule-shift" }

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError> {
        let mut scan = Scan::new(self.policy, evaluate(incumbent, weights));
        for &dir in &[1, -1] {
            for k in 1..=MAX_SHIFT {
                for r in 0..incumbent.routes.len() {
                    let mut trial = incumbent.clone();
                    for s in trial.routes[r].stops.iter_mut() {
                        s.time += dir * k;
                    }
                    trial.routes[r].recompute_aggregates(data)?;
                    if scan.offer(trial, weights) {
                        return Ok(scan.finish());
                    }
                }
            }
        }
        return Ok(scan.finish());
    }
}

/// Append one route's attended order onto another when the combined
/// load fits the absorbing vehicle, retiring the donor route.
/// First-improvement only; the route count drops by one on success so
/// repeated applications compact the fleet.
#[derive(Debug, Clone, Copy)]
pub struct RouteSplice;

impl Neighborhood for RouteSplice {
    fn name(&self) -> &'static str { "route-splice" }

    fn apply(
        &self,
        incumbent: &Solution,
        data: &DrtInstance,
        weights: &ObjectiveWeights,
    ) -> Result<MoveResult, SearchError> {
        let base = evaluate(incumbent, weights);
        let n = incumbent.routes.len();
        for a in 0..n {
            for b in 0..n {
                if a == b || incumbent.routes[b].attended.is_empty() {
                    continue;
                }
                let combined =
                    incumbent.routes[a].attended.len() + incumbent.routes[b].attended.len();
                if combined > incumbent.routes[a].vehicle.capacity {
                    continue;
                }
                let mut trial = incumbent.clone();
                let tail = std::mem::take(&mut trial.routes[b].attended);
                trial.routes[a].attended.extend(tail);
                trial.routes[a].rebuild(data)?;
                trial.drop_empty_routes();
                if trial.refresh_evaluation(weights) < base {
                    return Ok(MoveResult::Accepted(trial));
                }
            }
        }
        return Ok(MoveResult::Rejected);
    }
}

/// The neighborhood registry, indexed 1-based by the callers. The last
/// two slots are reserved and empty.
pub fn default_neighborhoods() -> Vec<Option<Box<dyn Neighborhood>>> {
    return vec![
        Some(Box::new(IntraRouteSwap { policy: Policy::FirstImprovement })),
        Some(Box::new(IntraRouteSwap { policy: Policy::BestImprovement })),
        Some(Box::new(InterRouteSwap { policy: Policy::FirstImprovement })),
        Some(Box::new(InterRouteSwap { policy: Policy::BestImprovement })),
        Some(Box::new(Reallocate { policy: Policy::FirstImprovement })),
        Some(Box::new(Reallocate { policy: Policy::BestImprovement })),
        Some(Box::new(ShiftSchedule { policy: Policy::FirstImprovement })),
        Some(Box::new(RouteSplice)),
        None,
        None,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drt::solution::{Route, Vehicle};
    use crate::drt::test_instances::instance;

    fn solution_of(data: &DrtInstance, routes: &[&[ReqId]]) -> Solution {
        let mut sol = Solution::new();
        for (k, seq) in routes.iter().enumerate() {
            let mut route = Route::new(Vehicle {
                id: k + 1,
                capacity: data.vehicle_capacity,
            });
            route.attended = seq.to_vec();
            route.rebuild(data).unwrap();
            sol.routes.push(route);
        }
        sol.refresh_evaluation(&ObjectiveWeights::default());
        return sol;
    }

    /// Three requests from a shared origin; the swap of positions 0 and
    /// 1 improves the evaluation by 2, the swap of 0 and 2 by 4, and 1
    /// with 2 is a tie.
    fn three_request_star() -> DrtInstance {
        instance(
            5,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000), (3, 1, 4, 0, 1000)],
            &[
                (1, 2, 10), (1, 3, 9), (1, 4, 8),
                (2, 3, 10), (3, 2, 10),
                (2, 4, 10), (4, 2, 10),
                (3, 4, 10), (4, 3, 10),
            ],
            1,
            3,
        )
    }

    #[test]
    fn intra_swap_first_improvement_takes_the_first_gain() {
        let data = three_request_star();
        let sol = solution_of(&data, &[&[1, 2, 3]]);
        let nb = IntraRouteSwap { policy: Policy::FirstImprovement };
        match nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
            MoveResult::Accepted(s) => {
                assert_eq!(s.routes[0].attended, vec![2, 1, 3]);
                assert!(s.evaluation < sol.evaluation);
            }
            MoveResult::Rejected => panic!("expected an improving swap"),
        }
    }

    #[test]
    fn intra_swap_best_improvement_takes_the_largest_gain() {
        let data = three_request_star();
        let sol = solution_of(&data, &[&[1, 2, 3]]);
        let nb = IntraRouteSwap { policy: Policy::BestImprovement };
        match nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
            MoveResult::Accepted(s) => {
                assert_eq!(s.routes[0].attended, vec![3, 2, 1]);
                // both distance and travel time drop by 2
                assert_eq!(s.evaluation, sol.evaluation - 4.0);
            }
            MoveResult::Rejected => panic!("expected an improving swap"),
        }
    }

    #[test]
    fn tied_moves_are_rejected() {
        // every arc is free, so any reordering is a tie
        let data = instance(4, &[(1, 1, 2, 0, 100), (2, 1, 3, 0, 100)], &[], 1, 2);
        let sol = solution_of(&data, &[&[1, 2]]);
        for policy in &[Policy::FirstImprovement, Policy::BestImprovement] {
            let nb = IntraRouteSwap { policy: *policy };
            let outcome = nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap();
            assert_eq!(outcome, MoveResult::Rejected);
        }
    }

    #[test]
    fn inter_swap_preserves_request_membership() {
        let data = instance(
            5,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000), (3, 1, 4, 0, 1000)],
            &[(1, 2, 1), (1, 3, 1), (1, 4, 1), (2, 3, 20), (2, 4, 5)],
            2,
            2,
        );
        let sol = solution_of(&data, &[&[1, 2], &[3]]);
        let nb = InterRouteSwap { policy: Policy::FirstImprovement };
        match nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
            MoveResult::Accepted(s) => {
                assert!(s.evaluation < sol.evaluation);
                let mut served: Vec<ReqId> = s.routes.iter()
                    .flat_map(|r| r.attended.iter().copied())
                    .collect();
                served.sort();
                assert_eq!(served, vec![1, 2, 3]);
                assert_eq!(s.routes.len(), 2);
            }
            MoveResult::Rejected => panic!("expected an improving swap"),
        }
    }

    #[test]
    fn reallocation_can_retire_a_route() {
        let data = instance(
            4,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000)],
            &[],
            2,
            2,
        );
        let sol = solution_of(&data, &[&[1], &[2]]);
        assert_eq!(sol.evaluation, 2.0);
        for policy in &[Policy::FirstImprovement, Policy::BestImprovement] {
            let nb = Reallocate { policy: *policy };
            match nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
                MoveResult::Accepted(s) => {
                    assert_eq!(s.routes.len(), 1);
                    assert_eq!(s.routes[0].attended.len(), 2);
                    assert_eq!(s.evaluation, 1.0);
                }
                MoveResult::Rejected => panic!("expected the merge to improve"),
            }
        }
    }

    #[test]
    fn reallocation_respects_target_capacity() {
        let data = instance(
            4,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000)],
            &[],
            2,
            1,
        );
        let sol = solution_of(&data, &[&[1], &[2]]);
        let nb = Reallocate { policy: Policy::BestImprovement };
        let outcome = nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap();
        assert_eq!(outcome, MoveResult::Rejected);
    }

    #[test]
    fn best_reallocation_is_never_worse_than_first() {
        let data = instance(
            5,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000), (3, 1, 4, 0, 1000)],
            &[(1, 2, 3), (1, 3, 4), (1, 4, 5), (2, 3, 2), (3, 4, 2), (2, 4, 9)],
            2,
            3,
        );
        let sol = solution_of(&data, &[&[1, 2], &[3]]);
        let weights = ObjectiveWeights::default();
        let first = Reallocate { policy: Policy::FirstImprovement }
            .apply(&sol, &data, &weights)
            .unwrap();
        let best = Reallocate { policy: Policy::BestImprovement }
            .apply(&sol, &data, &weights)
            .unwrap();
        if let (MoveResult::Accepted(f), MoveResult::Accepted(b)) = (&first, &best) {
            assert!(b.evaluation <= f.evaluation);
        } else {
            assert_eq!(first.accepted(), best.accepted());
        }
    }

    #[test]
    fn schedule_shift_trades_lateness_for_earliness() {
        // deliveries of R2 and R3 land at t=5 against windows closing
        // at 3; sliding the whole route back pays 1 minute of earliness
        // on R1 to save 2 of lateness
        let data = instance(
            5,
            &[(1, 1, 2, 0, 30), (2, 2, 3, 0, 3), (3, 3, 4, 0, 3)],
            &[(2, 3, 5)],
            1,
            3,
        );
        let sol = solution_of(&data, &[&[1, 2, 3]]);
        assert_eq!(sol.routes[0].tw_violation, 4);
        let nb = ShiftSchedule { policy: Policy::FirstImprovement };
        match nb.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
            MoveResult::Accepted(s) => {
                assert_eq!(s.routes[0].tw_violation, 3);
                // stop order and arcs are untouched
                assert_eq!(s.routes[0].distance, sol.routes[0].distance);
                assert_eq!(
                    s.routes[0].stops[0].time,
                    sol.routes[0].stops[0].time - 1,
                );
            }
            MoveResult::Rejected => panic!("expected a shift to pay off"),
        }
    }

    #[test]
    fn splice_compacts_the_fleet() {
        let data = instance(
            4,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000)],
            &[],
            2,
            2,
        );
        let sol = solution_of(&data, &[&[1], &[2]]);
        match RouteSplice.apply(&sol, &data, &ObjectiveWeights::default()).unwrap() {
            MoveResult::Accepted(s) => {
                assert_eq!(s.routes.len(), 1);
                assert_eq!(s.routes[0].attended, vec![1, 2]);
            }
            MoveResult::Rejected => panic!("expected the splice to improve"),
        }
    }

    #[test]
    fn splice_refuses_overloaded_merges() {
        let data = instance(
            4,
            &[(1, 1, 2, 0, 1000), (2, 1, 3, 0, 1000)],
            &[],
            2,
            1,
        );
        let sol = solution_of(&data, &[&[1], &[2]]);
        let outcome = RouteSplice.apply(&sol, &data, &ObjectiveWeights::default()).unwrap();
        assert_eq!(outcome, MoveResult::Rejected);
    }

    #[test]
    fn operators_never_touch_the_incumbent() {
        let data = three_request_star();
        let sol = solution_of(&data, &[&[1, 2, 3]]);
        let before = sol.clone();
        let weights = ObjectiveWeights::default();
        for nb in default_neighborhoods().into_iter().flatten() {
            let _ = nb.apply(&sol, &data, &weights).unwrap();
            assert_eq!(sol, before, "{} mutated the incumbent", nb.name());
        }
    }

    #[test]
    fn registry_has_ten_slots_with_two_reserved() {
        let registry = default_neighborhoods();
        assert_eq!(registry.len(), 10);
        assert!(registry[8].is_none());
        assert!(registry[9].is_none());
        assert!(registry[..8].iter().all(Option::is_some));
    }
}
