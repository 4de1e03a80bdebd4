use std::path::Path;
use crate::Result;
use crate::raw::drt::*;
use super::{
  ParseInstance,
  nom_prelude::*
};

#[derive(Debug, Copy, Clone)]
pub struct DrtFmt<P>(pub P);

impl<P: AsRef<Path>> ParseInstance<DrtFmt<P>> for RawDrt {
  fn parse(path: DrtFmt<P>) -> Result<RawDrt> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path)?;
    match parsers::drt(&data).finish() {
      Ok((_, instance)) => Ok(instance),
      Err(e) => Err(
        anyhow::Error::msg(e.to_string())
      ),
    }
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  fn matrix<'a>(n: usize, mut input: &'a str) -> IResult<&'a str, Vec<Vec<i64>>, error::VerboseError<&'a str>> {
    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
      let (i, row) = i64_row(input)?;
      input = i;
      rows.push(row);
    }
    Ok((input, rows))
  }

  pub fn drt(input: &str) -> IResult<&str, RawDrt, error::VerboseError<&str>> {
    let usize_space = |i| terminated(usize_, space1)(i);
    let i64_space = |i| terminated(i64_, space1)(i);
    let dbl_space = |i| terminated(double, space1)(i);

    let (input, (num_nodes, num_requests, num_vehicles, vehicle_capacity)) =
      tuple((usize_space, usize_space, usize_space, terminated(usize_, newline)))(input)?;

    //   0  -19.918   -43.938  Av. do Contorno, 340
    let mut parse_node = preceded(space0, tuple((
      usize_space, // id
      dbl_space,   // x
      dbl_space,   // y
      terminated(not_line_ending, newline), // address label
    )));

    let mut input = input;
    let mut nodes = Vec::with_capacity(num_nodes);
    for k in 0..num_nodes {
      let (i, (id, x, y, address)) = parse_node(input)?;
      debug_assert_eq!(id, k);
      input = i;
      nodes.push(RawNode { id, x, y, address: address.trim().to_string() });
    }

    //   1  3  7  420 450
    let mut parse_request = preceded(space0, tuple((
      usize_space, // id
      usize_space, // origin
      usize_space, // destination
      i64_space,   // tw start
      terminated(i64_, newline), // tw end
    )));

    let mut requests = Vec::with_capacity(num_requests);
    for _ in 0..num_requests {
      let (i, (id, origin, destination, tw_start, tw_end)) = parse_request(input)?;
      input = i;
      requests.push(RawRequest { id, origin, destination, tw_start, tw_end });
    }

    let (input, duration) = matrix(num_nodes, input)?;
    let (input, distance) = opt(|i| matrix(num_nodes, i))(input)?;
    let (input, _) = terminated(multispace0, eof)(input)?;

    Ok((input, RawDrt {
      num_nodes,
      num_requests,
      num_vehicles,
      vehicle_capacity,
      nodes,
      requests,
      duration,
      distance,
    }))
  }
}
