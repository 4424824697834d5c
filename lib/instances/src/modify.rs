use anyhow::Result;
use super::dataset::*;
use super::dataset::autonomax::AutonomaxInstance;
use std::borrow::Cow;

/// Lazy modifiers for datasets of Autonomax instances.
pub trait DSetModify: Dataset<Instance=AutonomaxInstance> + Sized {
  /// Keep only the first `cities` cities of every instance.  `None` leaves instances untouched.
  fn truncated(self, cities: impl Into<Option<usize>>) -> Truncated<Self> {
    Truncated { input: self, cities: cities.into() }
  }
}

impl<D: Dataset<Instance=AutonomaxInstance>> DSetModify for D {}

pub struct Truncated<D> {
  input: D,
  cities: Option<usize>,
}

impl<D> Truncated<D> {
  pub fn city_limit(&self) -> Option<usize> { self.cities }
}

impl<D: IdxNameMap> IdxNameMap for Truncated<D> {
  #[inline]
  fn name_to_index(&self, name: &str) -> Result<usize> {
    self.input.name_to_index(name)
  }

  #[inline]
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.input.index_to_name(idx)
  }

  #[inline]
  fn len(&self) -> usize { self.input.len() }
}

impl<D: Dataset<Instance=AutonomaxInstance>> Dataset for Truncated<D> {
  type Instance = AutonomaxInstance;

  fn load_instance(&self, idx: usize) -> Result<AutonomaxInstance> {
    let data = self.input.load_instance(idx)?;
    Ok(match self.cities {
      Some(n) => data.truncate(n),
      None => data,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::dataset::autonomax::SWEDEN;

  #[test]
  fn truncate_every_scenario() -> Result<()> {
    let small = (&*SWEDEN).truncated(4);
    assert_eq!(small.len(), 3);
    assert_eq!(small.city_limit(), Some(4));
    assert_eq!(small.index_to_name(2)?, "metropolitan");
    assert_eq!(small.name_to_index("population")?, 1);
    for s in 0..small.len() {
      let data = small.load_instance(s)?;
      assert_eq!(data.n_cities(), 4);
      assert_eq!(data.distance.len(), 4);
      assert_eq!(data.demand, SWEDEN.demand[s][..4].to_vec());
    }
    Ok(())
  }

  #[test]
  fn no_limit_keeps_all_cities() -> Result<()> {
    let all = (&*SWEDEN).truncated(None);
    assert_eq!(all.load_instance(0)?.n_cities(), 41);
    let more = (&*SWEDEN).truncated(100);
    assert_eq!(more.load_instance(1)?, SWEDEN.load_instance(1)?);
    Ok(())
  }

  #[test]
  fn truncated_subset() -> Result<()> {
    let subset = Subset::new((&*SWEDEN).truncated(3), vec![2])?;
    let data = subset.load_instance(0)?;
    assert_eq!(data.id, "metropolitan");
    assert_eq!(data.n_cities(), 3);
    assert_eq!(data.edges().count(), 3);
    Ok(())
  }
}
