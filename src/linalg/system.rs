//! Assembled linear systems
use super::DistributedMatrix;
use crate::{
    array::DistributedArray,
    layout::OwnershipMap,
    traits::{Comm, Solver},
    types::{Element, Error, Result},
};
use std::rc::Rc;
use tracing::debug;

/// Summary of a linear solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolveReport {
    /// Number of iterations performed
    pub iterations: usize,
    /// Euclidean norm of `A x - b` for the returned solution
    pub residual_norm: f64,
}

/// Square system `A x = b` with the right hand side distributed like the rows of `A`
#[derive(Debug)]
pub struct LinearSystem<'a, T: Element, C: Comm> {
    matrix: DistributedMatrix<'a, T, C>,
    rhs: DistributedArray<'a, T, C>,
}

impl<'a, T: Element, C: Comm> LinearSystem<'a, T, C> {
    /// Create new
    pub fn new(
        matrix: DistributedMatrix<'a, T, C>,
        rhs: DistributedArray<'a, T, C>,
    ) -> Result<Self> {
        if matrix.row_count() != matrix.column_count() || matrix.row_count() != rhs.total_size() {
            return Err(Error::SystemSizeMismatch {
                rows: matrix.row_count(),
                cols: matrix.column_count(),
                rhs: rhs.total_size(),
            });
        }
        let same_map = |a: &Rc<OwnershipMap>, b: &Rc<OwnershipMap>| Rc::ptr_eq(a, b) || a == b;
        if !same_map(matrix.row_map(), rhs.ownership_map())
            || !same_map(matrix.row_map(), matrix.column_map())
        {
            return Err(Error::LayoutMismatch);
        }
        debug!(
            rank = matrix.comm().rank(),
            size = matrix.row_count(),
            "created linear system"
        );
        Ok(Self { matrix, rhs })
    }

    /// The matrix
    pub fn matrix(&self) -> &DistributedMatrix<'a, T, C> {
        &self.matrix
    }

    /// The right hand side
    pub fn rhs(&self) -> &DistributedArray<'a, T, C> {
        &self.rhs
    }

    /// Mutable right hand side
    pub fn rhs_mut(&mut self) -> &mut DistributedArray<'a, T, C> {
        &mut self.rhs
    }

    /// `A x - b`, on the layout of the right hand side
    ///
    /// This is a collective operation.
    pub fn residual_vector(
        &self,
        x: &DistributedArray<'a, T, C>,
    ) -> Result<DistributedArray<'a, T, C>> {
        let mut r = self.rhs.zeros_like::<T>();
        self.matrix.apply_into(x, r.owned_values_mut())?;
        for (r, &b) in r.owned_values_mut().iter_mut().zip(self.rhs.owned_values()) {
            *r = r.elem_sub(b);
        }
        Ok(r)
    }

    /// Euclidean norm of `A x - b`
    ///
    /// This is a collective operation.
    pub fn residual_norm(&self, x: &DistributedArray<'a, T, C>) -> Result<f64> {
        Ok(self.residual_vector(x)?.norm2())
    }

    /// Euclidean norm of the right hand side
    ///
    /// This is a collective operation.
    pub fn rhs_norm(&self) -> f64 {
        self.rhs.norm2()
    }

    /// Solve with a solver, using `x` as initial guess
    pub fn solve_with<S: Solver<T>>(
        &self,
        solver: &S,
        x: &mut DistributedArray<'a, T, C>,
    ) -> Result<SolveReport> {
        let report = solver.solve(self, x)?;
        debug!(
            rank = self.matrix.comm().rank(),
            iterations = report.iterations,
            residual_norm = report.residual_norm,
            "solved linear system"
        );
        Ok(report)
    }
}
