use std::path::Path;
use anyhow::Context;
use crate::Result;
use crate::raw::autonomax::CityTable;
use super::{
  ParseInstance,
  nom_prelude::*
};

/// A city table stored in a file.
#[derive(Debug, Copy, Clone)]
pub struct CityTableFmt<P>(pub P);

/// A city table held in memory.
#[derive(Debug, Copy, Clone)]
pub struct CityTableStr<'a>(pub &'a str);

impl<'a> ParseInstance<CityTableStr<'a>> for CityTable {
  fn parse(input: CityTableStr<'a>) -> Result<CityTable> {
    let data = input.0;
    match parsers::city_table(data).finish() {
      Ok((_, raw)) => CityTable::new(raw.names, raw.coords, raw.scenario_names, raw.demand),
      Err(e) => Err(anyhow::Error::new(crate::Error::InvalidTable).context(convert_error(data, e))),
    }
  }
}

impl<P: AsRef<Path>> ParseInstance<CityTableFmt<P>> for CityTable {
  fn parse(path: CityTableFmt<P>) -> Result<CityTable> {
    let path = path.0.as_ref();
    let data = std::fs::read_to_string(path).context(format!("failed to read {:?}", path))?;
    CityTable::parse(CityTableStr(&data)).context(format!("failed to load {:?}", path))
  }
}


mod parsers {
  use super::*;
  use crate::parsers::common::*;

  type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

  /// Unvalidated table contents.
  pub struct RawTable {
    pub names: Vec<String>,
    pub coords: Vec<(f64, f64)>,
    pub scenario_names: Vec<String>,
    pub demand: Vec<Vec<f64>>,
  }

  fn header(input: &str) -> Res<(usize, usize)> {
    context("header", terminated(
      preceded(space0, separated_pair(usize_, space1, usize_)),
      eol,
    ))(input)
  }

  fn scenario_names(input: &str) -> Res<Vec<&str>> {
    context("scenario names", delimited(
      pair(space0, tag("SCENARIOS")),
      many1(preceded(space1, token)),
      eol,
    ))(input)
  }

  fn city_line(k: usize, input: &str) -> Res<(&str, f64, f64, Vec<f64>)> {
    context("city", terminated(
      tuple((
        preceded(space0, token),      // name
        preceded(space1, double),     // latitude
        preceded(space1, double),     // longitude
        count(preceded(space1, double), k),
      )),
      eol,
    ))(input)
  }

  pub fn city_table(input: &str) -> Res<RawTable> {
    let (input, _) = skip_comments(input)?;
    let (input, (n, k)) = header(input)?;
    let (mut input, scenarios) = scenario_names(input)?;
    if scenarios.len() != k {
      return Err(nom::Err::Failure(VerboseError::from_error_kind(input, error::ErrorKind::Count)));
    }

    let mut names = Vec::with_capacity(n);
    let mut coords = Vec::with_capacity(n);
    let mut demand = vec![Vec::with_capacity(n); k];

    for _ in 0..n {
      let (i, (name, lat, lon, d)) = city_line(k, input)?;
      input = i;
      names.push(name.to_string());
      coords.push((lat, lon));
      for (s, q) in d.into_iter().enumerate() {
        demand[s].push(q);
      }
    }

    let (input, _) = skip_comments(input)?;
    let (input, _) = eof(input)?;

    Ok((input, RawTable {
      names,
      coords,
      scenario_names: scenarios.into_iter().map(String::from).collect(),
      demand,
    }))
  }
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::{Dataset, IdxNameMap};

  const SMALL: &str = "# three cities
3 2
SCENARIOS flat skewed
Göteborg 57.7072326 11.9670171 1 5
Borås    57.7210839 12.9407407 1 0.5
Varberg  57.1057412 12.2502949 1 2
";

  #[test]
  fn parse_small() -> Result<()> {
    let table = CityTable::parse(CityTableStr(SMALL))?;
    assert_eq!(table.city_count(), 3);
    assert_eq!(table.names[0], "Göteborg");
    assert_eq!(table.scenario_names, vec!["flat", "skewed"]);
    assert_eq!(table.demand[1], vec![5.0, 0.5, 2.0]);
    assert_eq!(table.coords[2], (57.1057412, 12.2502949));

    let skewed = table.load_instance(table.name_to_index("skewed")?)?;
    assert_eq!(skewed.total_demand(), 7.5);
    Ok(())
  }

  #[test]
  fn parse_without_trailing_newline() -> Result<()> {
    let table = CityTable::parse(CityTableStr("1 1\nSCENARIOS s\nA 1.0 2.0 3"))?;
    assert_eq!(table.demand, vec![vec![3.0]]);
    Ok(())
  }

  #[test]
  fn reject_missing_demand() {
    let bad = "2 2\nSCENARIOS a b\nA 1 2 3 4\nB 1 2 3\n";
    assert!(CityTable::parse(CityTableStr(bad)).is_err());
  }

  #[test]
  fn reject_scenario_count_mismatch() {
    let bad = "1 2\nSCENARIOS a\nA 1 2 3 4\n";
    assert!(CityTable::parse(CityTableStr(bad)).is_err());
  }

  #[test]
  fn reject_extra_lines() {
    let bad = "1 1\nSCENARIOS a\nA 1 2 3\nB 1 2 3\n";
    assert!(CityTable::parse(CityTableStr(bad)).is_err());
  }

  #[test]
  fn reject_negative_demand() {
    let bad = "1 1\nSCENARIOS a\nA 1 2 -3\n";
    let err = CityTable::parse(CityTableStr(bad)).unwrap_err();
    assert_eq!(err.downcast_ref::<crate::Error>(), Some(&crate::Error::InvalidTable));
  }

  #[test]
  fn missing_file() {
    assert!(CityTable::parse(CityTableFmt("no/such/table.txt")).is_err());
  }
}
