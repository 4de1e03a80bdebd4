pub mod drt;
use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> crate::Result<Self>;
}


pub(crate) mod metrics {
  use num_traits::{AsPrimitive, Num};
  use crate::matrix::SquareMatrix;

  pub trait Metric {
    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64;
  }


  pub struct Euclidean();

  impl Metric for Euclidean {
    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let a = p1.0.as_() - p2.0.as_();
      let b = p1.1.as_() - p2.1.as_();
      (a * a + b * b).sqrt()
    }
  }

  /// Compute the distance matrix for the given coordinates, applying a
  /// post-processing function to each entry (typically a rounding cast).
  pub fn dist_matrix_pp<M, T, S>(_metric: M, coords: &[(T, T)], func: impl Fn(f64) -> S) -> SquareMatrix<S>
    where
      M: Metric,
      T: Num + AsPrimitive<f64> + Copy,
      S: Copy,
  {
    SquareMatrix::from_fn(coords.len(), |i, j| func(M::compute(coords[i], coords[j])))
  }
}
