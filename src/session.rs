//! The solver session boundary
//!
//! A session is an exclusively owned handle on solver state that has finished a
//! solve and loaded its result set. Field extraction only reads through this
//! trait; it never mutates the session.

use nalgebra::{DMatrix, DVector};

use crate::error::SolverError;
use crate::field::{Axis, PrincipalIndex, StressComponent};

/// Nodal array as handed back by a solver.
///
/// Displacement queries may come back either as one row per node with one
/// column per axis, or already collapsed to one scalar per node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodalArray {
    /// One value per node
    Scalar(DVector<f64>),
    /// One row per node
    Table(DMatrix<f64>),
}

impl NodalArray {
    /// Build a table from (x, y, z) rows
    pub fn from_rows(rows: &[[f64; 3]]) -> Self {
        NodalArray::Table(DMatrix::from_fn(rows.len(), 3, |r, c| rows[r][c]))
    }

    pub fn from_scalars(values: Vec<f64>) -> Self {
        NodalArray::Scalar(DVector::from_vec(values))
    }

    /// Number of nodes covered
    pub fn len(&self) -> usize {
        match self {
            NodalArray::Scalar(v) => v.len(),
            NodalArray::Table(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Capabilities a solved session exposes to post-processing
pub trait SolverSession {
    /// Full nodal displacement field
    fn nodal_displacement(&self) -> Result<NodalArray, SolverError>;

    /// Nodal displacement along a single axis
    fn nodal_displacement_component(&self, axis: Axis) -> Result<Vec<f64>, SolverError>;

    /// Nodal principal stress, algebraically ordered
    fn nodal_principal_stress(&self, index: PrincipalIndex) -> Result<Vec<f64>, SolverError>;

    /// Nodal Cauchy stress component
    fn nodal_component_stress(&self, component: StressComponent)
        -> Result<Vec<f64>, SolverError>;

    /// Active job identifier
    fn jobname(&self) -> &str;
}
