use crate::{Error, Result};

/// Dense square matrix indexed by node id pairs. Built once at instance
/// load and never mutated afterwards.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SquareMatrix<T> {
  n: usize,
  values: Vec<T>,
}

impl<T: Copy> SquareMatrix<T> {
  pub fn from_rows(rows: Vec<Vec<T>>) -> Result<Self> {
    let n = rows.len();
    let mut values = Vec::with_capacity(n * n);
    for row in rows {
      if row.len() != n {
        return Err(Error::NotSquare { rows: n, width: row.len() }.into());
      }
      values.extend_from_slice(&row);
    }
    return Ok(SquareMatrix { n, values });
  }

  pub fn from_fn(n: usize, f: impl Fn(usize, usize) -> T) -> Self {
    let mut values = Vec::with_capacity(n * n);
    for i in 0..n {
      for j in 0..n {
        values.push(f(i, j));
      }
    }
    return SquareMatrix { n, values };
  }

  #[inline]
  pub fn dim(&self) -> usize { self.n }
}

impl<T> std::ops::Index<(usize, usize)> for SquareMatrix<T> {
  type Output = T;

  #[inline]
  fn index(&self, (i, j): (usize, usize)) -> &T {
    debug_assert!(i < self.n && j < self.n);
    &self.values[i * self.n + j]
  }
}
