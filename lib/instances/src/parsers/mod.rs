mod city_table;
pub use city_table::{CityTableFmt, CityTableStr};


mod nom_prelude {
  pub use nom::{
    IResult,
    error::{
      self,
      ParseError,
      VerboseError,
      context,
      convert_error,
    },
    sequence::*,
    multi::*,
    combinator::*,
    branch::alt,
    character::complete::*,
    bytes::complete::{tag, is_not},
    number::complete::double,
    Finish,
  };
  pub use std::str::FromStr;
  pub use std::num::ParseIntError;
}

mod common;

pub trait ParseInstance<Fmt>: Sized {
  fn parse(inputs: Fmt) -> crate::Result<Self>;
}
