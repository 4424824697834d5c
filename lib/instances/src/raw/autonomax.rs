use anyhow::{Context, Result};
use itertools::Itertools;
use crate::Error;

pub type Demand = f64;
pub type Coord = (f64, f64);

/// A table of cities with coordinates and one demand vector per scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct CityTable {
  pub names: Vec<String>,
  /// `(latitude, longitude)` in degrees
  pub coords: Vec<Coord>,
  pub scenario_names: Vec<String>,
  /// `demand[s][i]` is the demand of city `i` under scenario `s`
  pub demand: Vec<Vec<Demand>>,
}

impl CityTable {
  pub fn new(names: Vec<String>, coords: Vec<Coord>, scenario_names: Vec<String>, demand: Vec<Vec<Demand>>) -> Result<Self> {
    let n = names.len();
    if coords.len() != n {
      return Err(Error::InvalidTable).context(format!("{} names but {} coordinates", n, coords.len()));
    }
    if scenario_names.len() != demand.len() {
      return Err(Error::InvalidTable)
        .context(format!("{} scenario names but {} demand vectors", scenario_names.len(), demand.len()));
    }
    if let Some(dup) = names.iter().duplicates().next() {
      return Err(Error::InvalidTable).context(format!("duplicate city name {:?}", dup));
    }
    if let Some(dup) = scenario_names.iter().duplicates().next() {
      return Err(Error::InvalidTable).context(format!("duplicate scenario name {:?}", dup));
    }
    if let Some(k) = coords.iter().position(|&(lat, lon)| !lat.is_finite() || !lon.is_finite()) {
      return Err(Error::InvalidTable).context(format!("non-finite coordinate for {:?}", names[k]));
    }
    for (s, d) in scenario_names.iter().zip(&demand) {
      if d.len() != n {
        return Err(Error::InvalidTable)
          .context(format!("scenario {:?} has {} demands, expected {}", s, d.len(), n));
      }
      if let Some(k) = d.iter().position(|&q| !q.is_finite() || q < 0.0) {
        return Err(Error::InvalidTable)
          .context(format!("scenario {:?}: demand of {:?} must be finite and non-negative", s, names[k]));
      }
    }
    Ok(CityTable { names, coords, scenario_names, demand })
  }

  pub fn city_count(&self) -> usize { self.names.len() }

  pub fn scenario_count(&self) -> usize { self.scenario_names.len() }

  pub fn city_names(&self) -> &[String] { &self.names }
}
