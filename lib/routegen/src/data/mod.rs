pub use instances::dataset::drt::{
  DrtInstance,
  Node,
  Request,
  Time,
  Dist,
  Loc,
  ReqId,
  DEPOT,
};

use crate::drt::SearchError;

pub trait DrtInstanceExt {
  fn req(&self, id: ReqId) -> Result<&Request, SearchError>;
  fn travel(&self, i: Loc, j: Loc) -> Time;
  fn dist(&self, i: Loc, j: Loc) -> Dist;
}

impl DrtInstanceExt for DrtInstance {
    #[inline]
    fn req(&self, id: ReqId) -> Result<&Request, SearchError> {
        return self.request(id).ok_or(SearchError::RequestNotFound(id));
    }

    #[inline]
    fn travel(&self, i: Loc, j: Loc) -> Time {
        return self.duration[(i, j)];
    }

    #[inline]
    fn dist(&self, i: Loc, j: Loc) -> Dist {
        return self.distance[(i, j)];
    }
}
