//! # beam-sim
//!
//! Pressure-loaded beam simulations driven through CalculiX.
//!
//! A run meshes one of three beam shapes, writes a `.inp` deck, solves it with
//! `ccx`, reads nodal results back from the `.frd` file and reduces five fields
//! (total and axial deformation, both extreme principal stresses, von Mises) to
//! (min, max, mean). Each run appends one row to a CSV report.
//!
//! Post-processing only sees the solver through [`session::SolverSession`], so the
//! extraction code in [`extract`] works the same on a live run or on a result
//! set loaded from disk.

pub mod config;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod extract;
pub mod field;
pub mod frd;
pub mod generator;
pub mod geometry;
pub mod mesh;
pub mod report;
pub mod results;
pub mod runner;
pub mod session;

pub mod prelude {
    pub use crate::config::{Material, SimConfig};
    pub use crate::dataset::{Dataset, FeatureVector, Regressor, FEATURE_ORDER};
    pub use crate::error::{BeamSimError, SimResult, SolverError};
    pub use crate::executor::{CalculixExecutor, CalculixSession};
    pub use crate::extract::{extract, extract_field, reduce, stats, FieldSample, Summary};
    pub use crate::field::{Axis, Component, FieldLabel, FieldSelector};
    pub use crate::geometry::{BeamCase, BeamShape};
    pub use crate::report::{append_row, ReportRow, REPORT_HEADER};
    pub use crate::results::{ResultSet, StressTensor};
    pub use crate::runner::{run_case, RunOutcome};
    pub use crate::session::{NodalArray, SolverSession};
}
