use crate::data::*;

pub mod construction;
mod error;
pub mod feasibility;
pub mod ranking;
pub mod search;
pub mod solution;
pub mod solver;
pub mod vnd;

pub use error::SearchError;

/// One entry of a timed tour. A typed stop keeps the pickup and
/// delivery phases distinguishable after they are merged into one
/// sequence.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum StopKind {
    Depot,
    Pickup(ReqId),
    Delivery(ReqId),
}

impl StopKind {
    pub fn loc(&self, data: &DrtInstance) -> Result<Loc, SearchError> {
        return match *self {
            StopKind::Depot => Ok(DEPOT),
            StopKind::Pickup(id) => data.req(id).map(|r| r.origin),
            StopKind::Delivery(id) => data.req(id).map(|r| r.destination),
        };
    }

    #[inline]
    pub fn request(&self) -> Option<ReqId> {
        return match *self {
            StopKind::Depot => None,
            StopKind::Pickup(id) | StopKind::Delivery(id) => Some(id),
        };
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Stop {
    pub kind: StopKind,
    pub time: Time,
}

pub mod schedule {
    use super::*;
    use std::cmp::max;
    use itertools::Itertools;
    use tracing::*;

    /// Assign concrete times to a fixed attended-request order.
    ///
    /// Two walks reconcile the merged tour: a forward pass over the
    /// delivery phase anchored at the first request's window-lower
    /// bound (waiting for later windows to open, never rejecting a
    /// late arrival), and a backward pass that times the pickup phase
    /// by subtracting the travel still owed before the anchor. Must be
    /// re-run after any change to the stop order.
    pub fn build(seq: &[ReqId], data: &DrtInstance) -> Result<Vec<Stop>, SearchError> {
        if seq.is_empty() {
            return Ok(Vec::new());
        }
        let reqs: Vec<&Request> = seq.iter()
            .map(|&id| data.req(id))
            .collect::<Result<_, _>>()?;
        let k = reqs.len();

        // Pass 1 (forward, delivery phase)
        let mut delivery: Vec<Time> = Vec::with_capacity(k);
        delivery.push(reqs[0].tw_start);
        for (m, (prev, cur)) in reqs.iter().tuple_windows().enumerate() {
            let arrival = delivery[m] + data.travel(prev.destination, cur.destination);
            delivery.push(max(arrival, cur.tw_start));
        }

        // Pass 2 (backward, pickup phase); the seam arc runs from the
        // last pickup's origin to the first delivery's destination.
        let mut pickup: Vec<Time> = vec![0; k];
        pickup[k - 1] = delivery[0] - data.travel(reqs[k - 1].origin, reqs[0].destination);
        for m in (0..k - 1).rev() {
            pickup[m] = pickup[m + 1] - data.travel(reqs[m].origin, reqs[m + 1].origin);
        }

        let mut stops = Vec::with_capacity(2 * k + 2);
        stops.push(Stop {
            kind: StopKind::Depot,
            time: pickup[0] - data.travel(DEPOT, reqs[0].origin),
        });
        for (m, r) in reqs.iter().enumerate() {
            stops.push(Stop { kind: StopKind::Pickup(r.id), time: pickup[m] });
        }
        for (m, r) in reqs.iter().enumerate() {
            stops.push(Stop { kind: StopKind::Delivery(r.id), time: delivery[m] });
        }
        stops.push(Stop {
            kind: StopKind::Depot,
            time: delivery[k - 1] + data.travel(reqs[k - 1].destination, DEPOT),
        });

        debug_assert!(stops.iter().tuple_windows().all(|(a, b)| a.time <= b.time));
        trace!(?seq, ?stops, "schedule built");
        return Ok(stops);
    }
}

#[cfg(test)]
pub(crate) mod test_instances {
    use super::*;
    use std::borrow::Cow;
    use instances::raw::drt::{RawDrt, RawNode, RawRequest};
    use instances::raw::FromRaw;

    /// Build a small instance from sparse duration arcs; unlisted arcs
    /// have zero duration and distances mirror durations.
    pub fn instance(
        num_nodes: usize,
        requests: &[(ReqId, Loc, Loc, Time, Time)],
        arcs: &[(Loc, Loc, Time)],
        num_vehicles: usize,
        vehicle_capacity: usize,
    ) -> DrtInstance {
        let mut duration = vec![vec![0i64; num_nodes]; num_nodes];
        for &(i, j, t) in arcs {
            duration[i][j] = t;
        }
        let raw = RawDrt {
            num_nodes,
            num_requests: requests.len(),
            num_vehicles,
            vehicle_capacity,
            nodes: (0..num_nodes)
                .map(|k| RawNode { id: k, x: 0.0, y: 0.0, address: format!("node {}", k) })
                .collect(),
            requests: requests.iter()
                .map(|&(id, origin, destination, tw_start, tw_end)| RawRequest {
                    id, origin, destination, tw_start, tw_end,
                })
                .collect(),
            duration: duration.clone(),
            distance: Some(duration),
        };
        return DrtInstance::from_raw(raw, Cow::Borrowed("test")).unwrap();
    }

    /// The two-request, four-node scenario: R1 1->2 in [0,30],
    /// R2 2->3 in [10,40], one vehicle.
    pub fn two_request_line(capacity: usize) -> DrtInstance {
        instance(
            4,
            &[(1, 1, 2, 0, 30), (2, 2, 3, 10, 40)],
            &[(0, 1, 10), (1, 2, 5), (2, 3, 5)],
            1,
            capacity,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_instances::two_request_line;

    #[test]
    fn schedule_two_requests() {
        let data = two_request_line(2);
        let stops = schedule::build(&[1, 2], &data).unwrap();
        assert_eq!(stops.len(), 6);
        // anchor at R1's window-lower
        assert_eq!(stops[3], Stop { kind: StopKind::Delivery(1), time: 0 });
        // R2 is reached at t=5 but waits for its window to open
        assert_eq!(stops[4], Stop { kind: StopKind::Delivery(2), time: 10 });
        // backward pass: pickup of R2 at the seam, then R1, then depot
        assert_eq!(stops[2], Stop { kind: StopKind::Pickup(2), time: 0 });
        assert_eq!(stops[1], Stop { kind: StopKind::Pickup(1), time: -5 });
        assert_eq!(stops[0], Stop { kind: StopKind::Depot, time: -15 });
    }

    #[test]
    fn schedule_is_deterministic() {
        let data = two_request_line(2);
        let a = schedule::build(&[1, 2], &data).unwrap();
        let b = schedule::build(&[1, 2], &data).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn unknown_request_is_fatal() {
        let data = two_request_line(2);
        match schedule::build(&[1, 9], &data) {
            Err(SearchError::RequestNotFound(9)) => {}
            other => panic!("expected RequestNotFound, got {:?}", other),
        }
    }
}
