use super::nom_prelude::*;

pub fn usize_<'a, E>(input: &'a str) -> IResult<&'a str, usize, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_res(digit1, usize::from_str)(input)
}

pub fn i64_<'a, E>(input: &'a str) -> IResult<&'a str, i64, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  map_res(
    recognize(
      pair(
        opt(char('-')),
        digit1
      )
    ), i64::from_str)(input)
}

/// A line of whitespace-separated integers, e.g. one matrix row.
pub fn i64_row<'a, E>(input: &'a str) -> IResult<&'a str, Vec<i64>, E>
  where
    E: ParseError<&'a str> + FromExternalError<&'a str, ParseIntError>
{
  terminated(
    preceded(space0, separated_list1(space1, i64_)),
    pair(space0, newline),
  )(input)
}
