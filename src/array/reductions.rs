//! Reductions and comparisons
use super::DistributedArray;
use crate::{
    traits::Comm,
    types::{Element, Error, Result},
};
use itertools::izip;
use tracing::trace;

impl<T: Element, C: Comm> DistributedArray<'_, T, C> {
    /// Sum of the owned values of this partition
    ///
    /// Ghost slots are not included, so the partial sums of all partitions add up to the sum of
    /// the global array.
    pub fn local_sum(&self) -> T {
        self.owned_values()
            .iter()
            .fold(T::zero(), |acc, &v| acc.elem_add(v))
    }

    /// Sum of all values of the global array
    ///
    /// The partial sums are combined in a fixed order, but floating point results can still differ
    /// in the last bits between different partition counts. This is a collective operation.
    pub fn global_sum(&self) -> T {
        trace!(rank = self.comm.rank(), "global sum");
        self.comm.all_reduce_sum(self.local_sum())
    }

    /// Dot product with an array of the same shape and ownership map
    ///
    /// This is a collective operation. A layout mismatch is detected locally before any
    /// communication, so it is reported on every partition.
    pub fn dot(&self, other: &Self) -> Result<T> {
        if !self.partition_layout_matches(other) {
            return Err(Error::LayoutMismatch);
        }
        let local = izip!(self.owned_values(), other.owned_values())
            .fold(T::zero(), |acc, (&a, &b)| acc.elem_add(a.elem_mul(b)));
        trace!(rank = self.comm.rank(), "dot product");
        Ok(self.comm.all_reduce_sum(local))
    }

    /// Euclidean norm of the global array, computed in `f64`
    ///
    /// This is a collective operation.
    pub fn norm2(&self) -> f64 {
        let local = self
            .owned_values()
            .iter()
            .map(|v| v.as_f64() * v.as_f64())
            .sum::<f64>();
        self.comm.all_reduce_sum(local).sqrt()
    }

    /// Are the local buffers of both arrays identical?
    ///
    /// Only this partition's values are compared.
    pub fn all_equal(&self, other: &Self) -> bool {
        self.shape() == other.shape() && self.values == other.values
    }

    /// Are the local buffers of both arrays equal within tolerances?
    ///
    /// Checks `|a - b| <= atol + rtol * |b|` for every pair of local values. Two NaN values are
    /// considered close, so every array is close to itself. Only this partition's values are
    /// compared; see [`DistributedArray::global_all_close`].
    pub fn all_close(&self, other: &Self, rtol: f64, atol: f64) -> bool {
        if self.shape() != other.shape() || self.values.len() != other.values.len() {
            return false;
        }
        izip!(&self.values, &other.values).all(|(&a, &b)| {
            let (a, b) = (a.as_f64(), b.as_f64());
            a == b || (a.is_nan() && b.is_nan()) || (a - b).abs() <= atol + rtol * b.abs()
        })
    }

    /// [`DistributedArray::all_close`] combined over all partitions
    ///
    /// This is a collective operation.
    pub fn global_all_close(&self, other: &Self, rtol: f64, atol: f64) -> bool {
        self.comm.all_reduce_and(self.all_close(other, rtol, atol))
    }
}

#[cfg(test)]
mod test {
    use crate::{
        array::DistributedArray,
        comm::{SerialComm, ThreadComm},
        types::Error,
    };
    use approx::assert_relative_eq;

    #[test]
    fn test_global_sum_two_partitions() {
        let sums = ThreadComm::run(2, |comm| {
            let mut a = DistributedArray::<f64, _>::from_dims(comm, &[10]).unwrap();
            assert_eq!(a.owned_count(), 5);
            a.fill(3.0);
            (a.local_sum(), a.global_sum())
        });
        assert_eq!(sums, vec![(15.0, 30.0), (15.0, 30.0)]);
    }

    #[test]
    fn test_global_sum_of_uniform_fill() {
        for partitions in 1..6 {
            let sums = ThreadComm::run(partitions, |comm| {
                let mut a = DistributedArray::<f64, _>::from_dims(comm, &[7, 3]).unwrap();
                a.fill(0.1);
                a.global_sum()
            });
            for s in sums {
                assert_relative_eq!(s, 2.1, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_ghosts_not_summed() {
        let sums = ThreadComm::run(2, |comm| {
            let a = DistributedArray::<i64, _>::from_dims(comm, &[4]).unwrap();
            let mut b = DistributedArray::<i64, _>::with_ghosts(
                comm,
                a.translator().clone(),
                a.ownership_map().clone(),
                &[0, 3],
            )
            .unwrap();
            b.fill(2);
            b.global_sum()
        });
        assert_eq!(sums, vec![8, 8]);
    }

    #[test]
    fn test_dot_and_norm() {
        let results = ThreadComm::run(3, |comm| {
            let values = (0..9).map(|i| i as f64).collect::<Vec<_>>();
            let mut a = DistributedArray::<f64, _>::from_dims(comm, &[9]).unwrap();
            a.set(&(0..9).collect::<Vec<_>>(), &values).unwrap();
            let mut b = a.zeros_like::<f64>();
            b.fill(2.0);
            (a.dot(&b).unwrap(), a.norm2())
        });
        for (dot, norm) in results {
            assert_relative_eq!(dot, 72.0);
            assert_relative_eq!(norm, 204f64.sqrt());
        }
    }

    #[test]
    fn test_dot_layout_mismatch() {
        let a = DistributedArray::<f64, _>::from_dims(&SerialComm, &[4]).unwrap();
        let b = DistributedArray::<f64, _>::from_dims(&SerialComm, &[2, 2]).unwrap();
        assert_eq!(a.dot(&b), Err(Error::LayoutMismatch));
    }

    #[test]
    fn test_all_close_reflexive() {
        let mut a = DistributedArray::<f64, _>::from_dims(&SerialComm, &[3]).unwrap();
        a.set(&[0, 1, 2], &[1.0, -2.5, f64::INFINITY]).unwrap();
        assert!(a.all_close(&a, 0.0, 0.0));
        assert!(a.all_equal(&a));
    }

    #[test]
    fn test_all_close_with_nan() {
        let mut a = DistributedArray::<f64, _>::from_dims(&SerialComm, &[3]).unwrap();
        a.set(&[0, 1, 2], &[-1.0, 1.0, 2.0]).unwrap();
        let l = a.log();
        assert!(l.local_values()[0].is_nan());
        assert!(l.all_close(&l, 0.0, 0.0));
        assert!(!l.all_close(&a, 1.0, 1.0));
        assert!(!a.all_close(&l, 1.0, 1.0));
    }

    #[test]
    fn test_all_close_tolerances() {
        let mut a = DistributedArray::<f64, _>::from_dims(&SerialComm, &[2]).unwrap();
        a.fill(1.0);
        let mut b = a.clone();
        b.set(&[1], &[1.001]).unwrap();
        assert!(!a.all_equal(&b));
        assert!(!a.all_close(&b, 0.0, 1e-4));
        assert!(a.all_close(&b, 0.0, 1e-2));
        assert!(a.all_close(&b, 1e-2, 0.0));

        let c = DistributedArray::<f64, _>::from_dims(&SerialComm, &[1, 2]).unwrap();
        assert!(!a.all_close(&c, 1.0, 1.0));
    }

    #[test]
    fn test_global_all_close() {
        let results = ThreadComm::run(2, |comm| {
            let mut a = DistributedArray::<f64, _>::from_dims(comm, &[4]).unwrap();
            a.fill(1.0);
            let mut b = a.clone();
            b.set(&[3], &[2.0]).unwrap();
            (a.all_close(&b, 0.0, 0.0), a.global_all_close(&b, 0.0, 0.0))
        });
        assert_eq!(results, vec![(true, false), (false, false)]);
    }
}
