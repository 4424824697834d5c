pub mod autonomax;
pub mod sweden;
use std::borrow::Cow;

pub trait FromRaw<T> where Self: Sized {
  fn from_raw(raw: T, id: Cow<str>) -> Self;
}


pub mod metrics {
  use num_traits::{AsPrimitive, Num};

  pub const EARTH_RADIUS_KM: f64 = 6371.0;

  pub trait Metric {
    const SYM: bool = false;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64;
  }


  pub struct Euclidean();

  impl Metric for Euclidean {
    const SYM: bool = true;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let a = p1.0.as_() - p2.0.as_();
      let b = p1.1.as_() - p2.1.as_();
      (a*a + b*b).sqrt()
    }
  }

  /// Great-circle distance in kilometres between two `(latitude, longitude)` points given in degrees.
  pub struct Haversine();

  impl Metric for Haversine {
    const SYM: bool = true;

    fn compute<T: Num + AsPrimitive<f64>>(p1: (T, T), p2: (T, T)) -> f64 {
      let (lat1, lon1) = (p1.0.as_().to_radians(), p1.1.as_().to_radians());
      let (lat2, lon2) = (p2.0.as_().to_radians(), p2.1.as_().to_radians());
      let dlat = (lat2 - lat1) * 0.5;
      let dlon = (lon2 - lon1) * 0.5;
      let h = dlat.sin().powi(2) + lat1.cos() * lat2.cos() * dlon.sin().powi(2);
      2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
    }
  }

  /// Compute the distance-matrix for the given coordinates
  #[inline]
  pub fn dist_matrix<M, T>(_metric: M, coords: &[(T, T)]) -> Vec<Vec<f64>>
    where
      M: Metric,
      T: Num + AsPrimitive<f64> + Copy
  {
    dist_matrix_pp(_metric, coords, |x| x)
  }

  /// Like [`dist_matrix`], but allows a post-processing function to be supplied.
  pub fn dist_matrix_pp<M, T, S>(_metric: M, coords: &[(T, T)], func: impl Fn(f64) -> S) -> Vec<Vec<S>>
    where
      M: Metric,
      T: Num + AsPrimitive<f64> + Copy,
      S: Copy + Default
  {
    let n = coords.len();
    let mut matrix = vec![vec![S::default(); n]; n];
    if M::SYM {
      for i in 0..n {
        let p1 = coords[i];
        for j in (i+1)..n {
          let p2 = coords[j];
          let d = func(M::compute(p1, p2));
          matrix[i][j] = d;
          matrix[j][i] = d;
        }
        matrix[i][i] = func(M::compute(p1, p1));
      }
    } else {
      for i in 0..n {
        let p1 = coords[i];
        for j in 0..n {
          matrix[i][j] = func(M::compute(p1, coords[j]));
        }
      }
    }

    matrix
  }

  #[cfg(test)]
  mod tests {
    use super::*;

    #[test]
    fn haversine_known_distance() {
      // Stockholm - Göteborg is roughly 398 km as the crow flies
      let d = Haversine::compute((59.3251172, 18.0710935), (57.7072326, 11.9670171));
      assert!((d - 398.0).abs() < 5.0, "{}", d);
    }

    #[test]
    fn euclidean_matrix() {
      let m = dist_matrix(Euclidean(), &[(0.0, 0.0), (3.0, 4.0)]);
      assert_eq!(m, vec![vec![0.0, 5.0], vec![5.0, 0.0]]);
    }
  }
}
