use std::fmt;

use crate::data::ReqId;

/// Structural failures inside the search. Feasibility and fleet
/// conditions are control-flow outcomes and never reach this type;
/// anything here aborts the enclosing operator trial.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SearchError {
    RequestNotFound(ReqId),
    EmptyRoute,
    UnknownNeighborhood(usize),
    NoIncumbent,
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for SearchError {}
