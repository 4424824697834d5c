use anyhow::Result;
use crate::Error;
use fnv::FnvHashSet;
use std::borrow::Cow;


pub trait IdxNameMap {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>>;

  fn name_to_index(&self, name: &str) -> Result<usize>;

  fn len(&self) -> usize;

  fn check_idx(&self, idx: usize) -> Result<()> {
    if self.len() <= idx {
      Err(Error::IndexOutOfRange.into())
    } else {
      Ok(())
    }
  }

  /// Resolve either a name or a decimal index.
  fn resolve(&self, name_or_idx: &str) -> Result<usize> {
    match self.name_to_index(name_or_idx) {
      Ok(idx) => Ok(idx),
      Err(e) => match name_or_idx.parse::<usize>() {
        Ok(idx) => self.check_idx(idx).map(|_| idx),
        Err(_) => Err(e),
      }
    }
  }
}


impl<'a, D: IdxNameMap> IdxNameMap for &'a D {
  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    D::index_to_name(self, idx)
  }

  fn name_to_index(&self, name: &str) -> Result<usize> {
    D::name_to_index(self, name)
  }

  fn len(&self) -> usize {
    D::len(self)
  }
}

pub trait Dataset: IdxNameMap + Sync {
  type Instance;
  fn load_instance(&self, idx: usize) -> Result<Self::Instance>;
}


impl<'a, D: Dataset> Dataset for &'a D {
  type Instance = D::Instance;

  fn load_instance(&self, idx: usize) -> Result<Self::Instance> {
    D::load_instance(self, idx)
  }
}


pub struct Subset<D> {
  dataset: D,
  indices: Vec<usize>,
}

impl<D: IdxNameMap> Subset<D> {
  pub fn new(dataset: D, indices: Vec<usize>) -> Result<Self> {
    for &i in &indices {
      dataset.check_idx(i)?;
    }
    let index_set: FnvHashSet<_> = indices.iter().cloned().collect();
    if index_set.len() != indices.len() {
      anyhow::bail!("indices must be unique")
    }
    Ok(Subset { dataset, indices })
  }

  fn map_index(&self, idx: usize) -> Result<usize> {
    self.indices.get(idx).copied().ok_or_else(|| Error::IndexOutOfRange.into())
  }
}

impl<D: IdxNameMap> IdxNameMap for Subset<D> {
  fn name_to_index(&self, name: &str) -> Result<usize> {
    let idx = self.dataset.name_to_index(name)?;
    self.indices.iter()
      .position(|&i| i == idx)
      .ok_or_else(|| Error::UnknownInstanceName.into())
  }

  fn index_to_name(&self, idx: usize) -> Result<Cow<str>> {
    self.dataset.index_to_name(self.map_index(idx)?)
  }

  fn len(&self) -> usize { self.indices.len() }
}

impl<I, D: Dataset<Instance=I>> Dataset for Subset<D> {
  type Instance = I;
  fn load_instance(&self, idx: usize) -> Result<I> {
    self.dataset.load_instance(self.map_index(idx)?)
  }
}


pub mod autonomax;
