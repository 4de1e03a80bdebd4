/// Unvalidated mirror of the instance text format. Field order follows
/// the file layout: header counts, node records, request records, a
/// duration matrix and an optional distance matrix.
pub struct RawDrt {
  pub num_nodes: usize,
  pub num_requests: usize,
  pub num_vehicles: usize,
  pub vehicle_capacity: usize,
  pub nodes: Vec<RawNode>,
  pub requests: Vec<RawRequest>,
  pub duration: Vec<Vec<i64>>,
  pub distance: Option<Vec<Vec<i64>>>,
}

pub struct RawNode {
  pub id: usize,
  pub x: f64,
  pub y: f64,
  pub address: String,
}

pub struct RawRequest {
  pub id: usize,
  pub origin: usize,
  pub destination: usize,
  pub tw_start: i64,
  pub tw_end: i64,
}
