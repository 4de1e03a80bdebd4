use tracing::*;

use crate::data::*;
use super::SearchError;
use super::ranking::Candidate;

/// Can the request's destination still be reached before its window
/// closes, starting from `at` at time `now`? Initial feasibility is
/// this predicate at the depot at time zero; construction-phase
/// feasibility re-applies it from the simulated position.
#[inline]
pub fn attendable(req: &Request, now: Time, at: Loc, data: &DrtInstance) -> bool {
    return now + data.travel(at, req.destination) <= req.tw_end;
}

/// Recompute the feasibility flag for every pooled candidate. The flag
/// is re-derivable state, never sticky: it must be refreshed whenever
/// the simulated time or location advances.
pub fn evaluate_pool(
    pool: &mut [Candidate],
    now: Time,
    at: Loc,
    data: &DrtInstance,
) -> Result<(), SearchError> {
    for c in pool.iter_mut() {
        let req = data.req(c.id)?;
        let feasible = attendable(req, now, at, data);
        if feasible != c.feasible {
            trace!(id = c.id, now, at, feasible, "feasibility changed");
        }
        c.feasible = feasible;
    }
    return Ok(());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drt::test_instances::two_request_line;

    #[test]
    fn initial_feasibility_from_depot() {
        let data = two_request_line(2);
        let r1 = data.req(1).unwrap();
        // duration(0, 2) is zero in the line instance
        assert!(attendable(r1, 0, DEPOT, &data));
        // past the window close nothing helps
        assert!(!attendable(r1, 31, DEPOT, &data));
    }

    #[test]
    fn pool_flags_follow_the_clock() {
        let data = two_request_line(2);
        let mut pool = vec![Candidate::new(1), Candidate::new(2)];
        evaluate_pool(&mut pool, 0, DEPOT, &data).unwrap();
        assert!(pool.iter().all(|c| c.feasible));

        // advance past R1's window from node 1: 35 + travel(1,2)=5 > 30
        evaluate_pool(&mut pool, 35, 1, &data).unwrap();
        assert!(!pool[0].feasible);
        assert!(pool[1].feasible); // 35 + travel(1,3)=0 <= 40

        // re-evaluating at the same time and place must not flip a
        // request back to feasible
        evaluate_pool(&mut pool, 35, 1, &data).unwrap();
        assert!(!pool[0].feasible);

        // nor may a later clock at the same node
        evaluate_pool(&mut pool, 50, 1, &data).unwrap();
        assert!(!pool[0].feasible);
        assert!(!pool[1].feasible);
    }
}
