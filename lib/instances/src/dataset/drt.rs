use std::borrow::Cow;
use std::path::Path;

use anyhow::Context;

use crate::{Error, Map, Result};
use crate::matrix::SquareMatrix;
use crate::parsers::{DrtFmt, ParseInstance};
use crate::raw::drt::RawDrt;
use crate::raw::{
  metrics::{dist_matrix_pp, Euclidean},
  FromRaw,
};

/// Minutes from midnight. Signed: a backward scheduling pass may walk a
/// pickup chain to times before its anchor.
pub type Time = i64;
pub type Dist = i64;
pub type Loc = usize;
pub type ReqId = usize;

pub const DEPOT: Loc = 0;

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
  pub id: Loc,
  pub x: f64,
  pub y: f64,
  pub address: String,
}

/// A pickup-and-delivery request. The time window constrains the
/// delivery; both bounds are minutes from midnight.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Request {
  pub id: ReqId,
  pub origin: Loc,
  pub destination: Loc,
  pub tw_start: Time,
  pub tw_end: Time,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DrtInstance {
  pub id: String,
  pub nodes: Vec<Node>,
  pub requests: Vec<Request>,
  pub duration: SquareMatrix<Time>,
  pub distance: SquareMatrix<Dist>,
  pub num_vehicles: usize,
  pub vehicle_capacity: usize,
  request_index: Map<ReqId, usize>,
}

impl DrtInstance {
  #[inline]
  pub fn num_nodes(&self) -> usize {
    return self.nodes.len();
  }

  #[inline]
  pub fn request(&self, id: ReqId) -> Option<&Request> {
    return self.request_index.get(&id).map(|&k| &self.requests[k]);
  }

  pub fn load(path: impl AsRef<Path>) -> Result<DrtInstance> {
    let path = path.as_ref();
    let raw = RawDrt::parse(DrtFmt(path)).context(format!("failed to load {:?}", path))?;
    let id = path.file_stem()
      .map(|s| s.to_string_lossy())
      .unwrap_or(Cow::Borrowed("unnamed"));
    return DrtInstance::from_raw(raw, id);
  }
}

impl FromRaw<RawDrt> for DrtInstance {
  fn from_raw(raw: RawDrt, id: Cow<str>) -> Result<DrtInstance> {
    let n = raw.num_nodes;

    let nodes: Vec<Node> = raw.nodes.into_iter()
      .map(|r| Node { id: r.id, x: r.x, y: r.y, address: r.address })
      .collect();

    let requests: Vec<Request> = raw.requests.iter()
      .map(|r| Request {
        id: r.id,
        origin: r.origin,
        destination: r.destination,
        tw_start: r.tw_start,
        tw_end: r.tw_end,
      })
      .collect();

    for r in &requests {
      if r.origin >= n { return Err(Error::UnknownNode(r.origin).into()); }
      if r.destination >= n { return Err(Error::UnknownNode(r.destination).into()); }
      if r.tw_start > r.tw_end { return Err(Error::EmptyTimeWindow(r.id).into()); }
    }

    let duration = SquareMatrix::from_rows(raw.duration)?;
    if duration.dim() != n {
      return Err(Error::NotSquare { rows: duration.dim(), width: n }.into());
    }

    // The adjacency data often carries durations only; fall back to
    // Euclidean distances over the node coordinates.
    let distance = match raw.distance {
      Some(rows) => {
        let m = SquareMatrix::from_rows(rows)?;
        if m.dim() != n {
          return Err(Error::NotSquare { rows: m.dim(), width: n }.into());
        }
        m
      }
      None => {
        let coords: Vec<(f64, f64)> = nodes.iter().map(|nd| (nd.x, nd.y)).collect();
        dist_matrix_pp(Euclidean(), &coords, |d| d.round() as Dist)
      }
    };

    let request_index: Map<ReqId, usize> = requests.iter()
      .enumerate()
      .map(|(k, r)| (r.id, k))
      .collect();

    return Ok(DrtInstance {
      id: id.into_owned(),
      nodes,
      requests,
      duration,
      distance,
      num_vehicles: raw.num_vehicles,
      vehicle_capacity: raw.vehicle_capacity,
      request_index,
    });
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::raw::drt::{RawNode, RawRequest};

  fn tiny_raw() -> RawDrt {
    RawDrt {
      num_nodes: 3,
      num_requests: 1,
      num_vehicles: 1,
      vehicle_capacity: 2,
      nodes: (0..3)
        .map(|k| RawNode { id: k, x: k as f64, y: 0.0, address: format!("node {}", k) })
        .collect(),
      requests: vec![RawRequest { id: 1, origin: 1, destination: 2, tw_start: 0, tw_end: 30 }],
      duration: vec![vec![0, 5, 9], vec![5, 0, 4], vec![9, 4, 0]],
      distance: None,
    }
  }

  #[test]
  fn from_raw_derives_distances() {
    let data = DrtInstance::from_raw(tiny_raw(), Cow::Borrowed("tiny")).unwrap();
    assert_eq!(data.num_nodes(), 3);
    assert_eq!(data.distance[(0, 2)], 2);
    assert_eq!(data.request(1).unwrap().destination, 2);
    assert!(data.request(7).is_none());
  }

  #[test]
  fn bad_time_window_rejected() {
    let mut raw = tiny_raw();
    raw.requests[0].tw_start = 40;
    assert!(DrtInstance::from_raw(raw, Cow::Borrowed("bad")).is_err());
  }
}
