use super::*;
use crate::raw::{
  autonomax::CityTable,
  metrics::{dist_matrix, Haversine, Metric},
  sweden,
  FromRaw,
};
use itertools::Itertools;
use lazy_static::lazy_static;

pub use crate::raw::autonomax::{Coord, Demand};

pub type City = usize;
pub type Distance = f64;
/// An undirected city pair, normalised so that `e.0 < e.1`.
pub type Edge = (City, City);

#[inline]
pub fn normalize(i: City, j: City) -> Edge {
  debug_assert_ne!(i, j);
  if i < j { (i, j) } else { (j, i) }
}

/// The problem data for a single demand scenario.
#[derive(Default, Debug, Clone, PartialEq)]
pub struct AutonomaxInstance {
  pub id: String,
  pub names: Vec<String>,
  pub coords: Vec<Coord>,
  pub distance: Vec<Vec<Distance>>,
  pub demand: Vec<Demand>,
}

impl AutonomaxInstance {
  #[inline]
  pub fn n_cities(&self) -> usize { self.names.len() }

  pub fn cities(&self) -> std::ops::Range<City> { 0..self.n_cities() }

  #[inline]
  pub fn distance(&self, i: City, j: City) -> Distance { self.distance[i][j] }

  #[inline]
  pub fn demand(&self, i: City) -> Demand { self.demand[i] }

  pub fn total_demand(&self) -> Demand { self.demand.iter().sum() }

  /// All normalised city pairs in lexicographic order.
  pub fn edges(&self) -> impl Iterator<Item=Edge> {
    self.cities().tuple_combinations()
  }

  pub fn city_index(&self, name: &str) -> Result<City> {
    self.names.iter()
      .position(|n| n == name)
      .ok_or_else(|| anyhow::Error::new(Error::UnknownCity).context(format!("no city named {:?}", name)))
  }

  /// Keep only the first `n` cities.
  pub fn truncate(mut self, n: usize) -> Self {
    if n >= self.n_cities() {
      return self;
    }
    self.names.truncate(n);
    self.coords.truncate(n);
    self.demand.truncate(n);
    self.distance.truncate(n);
    for row in &mut self.distance {
      row.truncate(n);
    }
    self
  }
}

/// A [`CityTable`] together with one of its scenarios.
pub struct ScenarioOf<'a>(pub &'a CityTable, pub usize);

impl<'a> FromRaw<ScenarioOf<'a>> for AutonomaxInstance {
  fn from_raw(raw: ScenarioOf<'a>, id: Cow<str>) -> AutonomaxInstance {
    let ScenarioOf(table, scenario) = raw;
    AutonomaxInstance {
      id: id.into_owned(),
      names: table.names.clone(),
      coords: table.coords.clone(),
      distance: dist_matrix(Haversine(), &table.coords),
      demand: table.demand[scenario].clone(),
    }
  }
}

impl IdxNameMap for CityTable {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.check_idx(idx)?;
    Ok(Cow::Borrowed(&self.scenario_names[idx]))
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.scenario_names.iter()
      .position(|s| s == name)
      .ok_or_else(|| Error::UnknownInstanceName.into())
  }

  fn len(&self) -> usize { self.scenario_count() }
}

impl Dataset for CityTable {
  type Instance = AutonomaxInstance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    let name = self.index_to_name(idx)?;
    Ok(AutonomaxInstance::from_raw(ScenarioOf(self, idx), name))
  }
}

/// Problem-data look-ups across every scenario of a table.
pub trait ProblemData {
  fn city_count(&self) -> usize;
  fn city_names(&self) -> &[String];
  fn distance(&self, i: City, j: City) -> Distance;
  fn demand(&self, scenario: usize, city: City) -> Demand;
}

lazy_static!{
  pub static ref SWEDEN: CityTable = sweden::city_table();
}

impl ProblemData for CityTable {
  fn city_count(&self) -> usize { CityTable::city_count(self) }

  fn city_names(&self) -> &[String] { CityTable::city_names(self) }

  fn distance(&self, i: City, j: City) -> Distance {
    let (i, j) = if i <= j { (i, j) } else { (j, i) };
    Haversine::compute(self.coords[i], self.coords[j])
  }

  fn demand(&self, scenario: usize, city: City) -> Demand { self.demand[scenario][city] }
}
