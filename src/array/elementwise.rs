//! Element-wise operations
//!
//! All operations act on every local slot, ghosts included, without communication. Results live
//! on the layout of the input. Floating point domain errors produce NaN or infinities.
use super::DistributedArray;
use crate::{
    traits::Comm,
    types::{Element, Error, Result},
};
use itertools::izip;

macro_rules! float_functions {
    ($(($name:ident, $f:ident)),* $(,)?) => {
        impl<'a, T: Element, C: Comm> DistributedArray<'a, T, C> {
            $(
                #[doc = concat!("Element-wise `", stringify!($f), "`, computed in `f64`")]
                pub fn $name(&self) -> DistributedArray<'a, f64, C> {
                    self.map(|v| v.as_f64().$f())
                }
            )*
        }
    };
}

float_functions!(
    (arccos, acos),
    (arccosh, acosh),
    (arcsin, asin),
    (arcsinh, asinh),
    (arctan, atan),
    (arctanh, atanh),
    (cos, cos),
    (cosh, cosh),
    (sin, sin),
    (sinh, sinh),
    (tan, tan),
    (tanh, tanh),
    (exp, exp),
    (log, ln),
    (log10, log10),
    (sqrt, sqrt),
    (floor, floor),
    (ceil, ceil),
);

impl<'a, T: Element, C: Comm> DistributedArray<'a, T, C> {
    /// Apply a function to every local value
    pub fn map<U: Element>(&self, f: impl Fn(T) -> U) -> DistributedArray<'a, U, C> {
        self.derive(self.values.iter().map(|&v| f(v)).collect())
    }

    /// Combine the local values of two arrays with the same layout
    pub fn zip_map<U: Element, V: Element>(
        &self,
        other: &DistributedArray<'a, U, C>,
        f: impl Fn(T, U) -> V,
    ) -> Result<DistributedArray<'a, V, C>> {
        if !self.layout_matches(other) {
            return Err(Error::LayoutMismatch);
        }
        Ok(self.derive(
            izip!(&self.values, &other.values)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    /// Element-wise absolute value
    pub fn abs(&self) -> Self {
        self.map(|v| v.elem_abs())
    }

    /// Element-wise complex conjugate, the identity for real values
    pub fn conjugate(&self) -> Self {
        self.clone()
    }

    /// Element-wise `atan2(self, other)`, computed in `f64`
    pub fn arctan2<U: Element>(
        &self,
        other: &DistributedArray<'a, U, C>,
    ) -> Result<DistributedArray<'a, f64, C>> {
        self.zip_map(other, |y, x| y.as_f64().atan2(x.as_f64()))
    }

    /// Element-wise sum
    pub fn add(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a.elem_add(b))
    }

    /// Element-wise difference
    pub fn sub(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a.elem_sub(b))
    }

    /// Element-wise product
    pub fn mul(&self, other: &Self) -> Result<Self> {
        self.zip_map(other, |a, b| a.elem_mul(b))
    }

    /// Element-wise quotient
    ///
    /// Integer division by zero fails with the global offset of the first zero divisor.
    pub fn div(&self, other: &Self) -> Result<Self> {
        if !self.layout_matches(other) {
            return Err(Error::LayoutMismatch);
        }
        let values = izip!(&self.values, &other.values)
            .enumerate()
            .map(|(slot, (&a, &b))| match a.elem_div(b) {
                Some(q) => Ok(q),
                None => Err(Error::DivisionByZero {
                    offset: self.offset_of_slot(slot)?,
                }),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(self.derive(values))
    }

    /// Multiply every local value by a scalar
    pub fn scale(&self, alpha: T) -> Self {
        self.map(|v| v.elem_mul(alpha))
    }
}
