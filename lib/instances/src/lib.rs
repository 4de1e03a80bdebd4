pub use anyhow::Result;

use std::fmt;
use fnv::FnvHashMap;

pub type Map<K, V> = FnvHashMap<K, V>;

#[derive(Debug, Clone)]
pub enum Error {
    NotSquare { rows: usize, width: usize },
    UnknownNode(usize),
    EmptyTimeWindow(usize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl std::error::Error for Error {}

pub mod dataset;
pub mod matrix;
pub mod raw;

mod parsers;
pub use parsers::{DrtFmt, ParseInstance};
