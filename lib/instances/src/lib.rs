pub use anyhow::Result;

use std::fmt;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
  UnknownInstanceName,
  IndexOutOfRange,
  UnknownCity,
  InvalidTable,
}


impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

impl std::error::Error for Error {}


pub mod dataset;
pub mod modify;
pub mod raw;

mod parsers;
pub use parsers::{ParseInstance, CityTableFmt, CityTableStr};
