//! Linear solvers
use crate::{
    array::DistributedArray,
    linalg::{LinearSystem, SolveReport},
    traits::Comm,
    types::{Element, Result},
};

pub trait Solver<T: Element> {
    //! Black box solver for an assembled linear system
    //!
    //! Implementations are free to communicate through `system.matrix().comm()` and the layouts
    //! exposed by the system. `solve` is collective.

    /// Solve the system, using the current contents of `x` as initial guess
    fn solve<'a, C: Comm>(
        &self,
        system: &LinearSystem<'a, T, C>,
        x: &mut DistributedArray<'a, T, C>,
    ) -> Result<SolveReport>;
}
