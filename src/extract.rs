//! Field extraction and summary statistics
//!
//! Turns a [`FieldSelector`] into one scalar per node by reading a solved
//! [`SolverSession`], and folds such a sample into a [`Summary`].
//!
//! ```
//! use beam_sim::extract::{reduce, von_mises};
//!
//! let seqv = von_mises(&[100.0], &[0.0], &[0.0], &[0.0], &[0.0], &[0.0]).unwrap();
//! assert!((seqv[0] - 100.0).abs() < 1e-9);
//!
//! let summary = reduce(&[1.0, 2.0, 3.0]).unwrap();
//! assert_eq!((summary.min, summary.max, summary.mean), (1.0, 3.0, 2.0));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{BeamSimError, SimResult};
use crate::field::{Component, FieldLabel, FieldSelector, PrincipalIndex, StressComponent};
use crate::session::{NodalArray, SolverSession};

/// One value per mesh node
pub type FieldSample = Vec<f64>;

/// (min, max, mean) of a field sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
}

impl Summary {
    pub fn as_tuple(&self) -> (f64, f64, f64) {
        (self.min, self.max, self.mean)
    }
}

/// Evaluate a selector against a solved session.
///
/// The session is only read. Solver failures come back unchanged inside
/// [`BeamSimError::Solver`].
pub fn extract<S: SolverSession + ?Sized>(
    session: &S,
    selector: &FieldSelector,
) -> SimResult<FieldSample> {
    match (selector.label(), selector.component()) {
        (FieldLabel::Displacement, Component::Magnitude) => {
            displacement_magnitude(session.nodal_displacement()?)
        }
        (FieldLabel::Displacement, Component::Axis(axis)) => {
            Ok(session.nodal_displacement_component(axis)?)
        }
        (FieldLabel::Stress, Component::Principal1) => {
            Ok(session.nodal_principal_stress(PrincipalIndex::First)?)
        }
        (FieldLabel::Stress, Component::Principal3) => {
            Ok(session.nodal_principal_stress(PrincipalIndex::Third)?)
        }
        (FieldLabel::Stress, Component::Equivalent) => {
            let [sx, sy, sz, sxy, syz, sxz] = stress_components(session)?;
            von_mises(&sx, &sy, &sz, &sxy, &syz, &sxz)
        }
        (label, component) => Err(BeamSimError::UnsupportedComponent {
            label: label.to_string(),
            component: component.to_string(),
        }),
    }
}

/// [`extract`] from string spellings, e.g. `("U", "SUM")` or `("S", "EQV")`
pub fn extract_field<S: SolverSession + ?Sized>(
    session: &S,
    label: &str,
    component: &str,
) -> SimResult<FieldSample> {
    let selector = FieldSelector::parse(label, component)?;
    extract(session, &selector)
}

/// Fold a sample into (min, max, mean)
pub fn reduce(sample: &[f64]) -> SimResult<Summary> {
    if sample.is_empty() {
        return Err(BeamSimError::EmptySample);
    }

    let (min, max, sum) = sample.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), &v| (min.min(v), max.max(v), sum + v),
    );

    Ok(Summary {
        min,
        max,
        mean: sum / sample.len() as f64,
    })
}

pub fn stats<S: SolverSession + ?Sized>(
    session: &S,
    selector: &FieldSelector,
) -> SimResult<Summary> {
    let sample = extract(session, selector)?;
    reduce(&sample)
}

/// Element-wise von Mises equivalent stress.
///
/// `sqrt(0.5 * ((sx-sy)^2 + (sy-sz)^2 + (sz-sx)^2) + 3 * (sxy^2 + syz^2 + sxz^2))`
pub fn von_mises(
    sx: &[f64],
    sy: &[f64],
    sz: &[f64],
    sxy: &[f64],
    syz: &[f64],
    sxz: &[f64],
) -> SimResult<Vec<f64>> {
    let expected = sx.len();
    for other in [sy, sz, sxy, syz, sxz] {
        if other.len() != expected {
            return Err(BeamSimError::LengthMismatch {
                expected,
                found: other.len(),
            });
        }
    }

    Ok((0..expected)
        .map(|i| {
            let normal = (sx[i] - sy[i]).powi(2) + (sy[i] - sz[i]).powi(2) + (sz[i] - sx[i]).powi(2);
            let shear = sxy[i].powi(2) + syz[i].powi(2) + sxz[i].powi(2);
            (0.5 * normal + 3.0 * shear).sqrt()
        })
        .collect())
}

fn displacement_magnitude(field: NodalArray) -> SimResult<FieldSample> {
    match field {
        // Already collapsed to one value per node
        NodalArray::Scalar(values) => Ok(values.iter().map(|v| v.abs()).collect()),
        NodalArray::Table(table) if table.ncols() == 3 => {
            Ok(table.row_iter().map(|row| row.norm()).collect())
        }
        NodalArray::Table(table) => Err(BeamSimError::UnexpectedShape {
            rows: table.nrows(),
            cols: table.ncols(),
        }),
    }
}

fn stress_components<S: SolverSession + ?Sized>(session: &S) -> SimResult<[Vec<f64>; 6]> {
    let mut out: [Vec<f64>; 6] = Default::default();
    for (slot, component) in out.iter_mut().zip(StressComponent::ALL) {
        *slot = session.nodal_component_stress(component)?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolverError;
    use crate::field::Axis;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    /// Session serving fixed arrays
    struct FixedSession {
        displacement: NodalArray,
        stress: [Vec<f64>; 6],
        principal: [Vec<f64>; 3],
    }

    impl FixedSession {
        fn uniaxial(n: usize, sx: f64) -> Self {
            let zeros = vec![0.0; n];
            Self {
                displacement: NodalArray::from_rows(&vec![[3.0, 4.0, 0.0]; n]),
                stress: [
                    vec![sx; n],
                    zeros.clone(),
                    zeros.clone(),
                    zeros.clone(),
                    zeros.clone(),
                    zeros.clone(),
                ],
                principal: [vec![sx; n], zeros.clone(), zeros],
            }
        }
    }

    impl SolverSession for FixedSession {
        fn nodal_displacement(&self) -> Result<NodalArray, SolverError> {
            Ok(self.displacement.clone())
        }

        fn nodal_displacement_component(&self, axis: Axis) -> Result<Vec<f64>, SolverError> {
            match &self.displacement {
                NodalArray::Table(m) => Ok(m.column(axis.index()).iter().copied().collect()),
                NodalArray::Scalar(_) => Err(SolverError::MissingResult("U".to_string())),
            }
        }

        fn nodal_principal_stress(
            &self,
            index: PrincipalIndex,
        ) -> Result<Vec<f64>, SolverError> {
            Ok(self.principal[index.index()].clone())
        }

        fn nodal_component_stress(
            &self,
            component: StressComponent,
        ) -> Result<Vec<f64>, SolverError> {
            let idx = StressComponent::ALL
                .iter()
                .position(|c| *c == component)
                .unwrap();
            Ok(self.stress[idx].clone())
        }

        fn jobname(&self) -> &str {
            "fixed"
        }
    }

    struct FailingSession;

    impl SolverSession for FailingSession {
        fn nodal_displacement(&self) -> Result<NodalArray, SolverError> {
            Err(SolverError::MissingResult("DISP".to_string()))
        }

        fn nodal_displacement_component(&self, _: Axis) -> Result<Vec<f64>, SolverError> {
            Err(SolverError::MissingResult("DISP".to_string()))
        }

        fn nodal_principal_stress(&self, _: PrincipalIndex) -> Result<Vec<f64>, SolverError> {
            Err(SolverError::MissingResult("STRESS".to_string()))
        }

        fn nodal_component_stress(
            &self,
            _: StressComponent,
        ) -> Result<Vec<f64>, SolverError> {
            Err(SolverError::MissingResult("STRESS".to_string()))
        }

        fn jobname(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_von_mises_uniaxial() {
        let session = FixedSession::uniaxial(4, 100.0);
        let seqv = extract(&session, &FieldSelector::von_mises()).unwrap();
        assert_eq!(seqv.len(), 4);
        for v in seqv {
            assert_relative_eq!(v, 100.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_von_mises_pure_shear() {
        let seqv = von_mises(&[0.0], &[0.0], &[0.0], &[10.0], &[0.0], &[0.0]).unwrap();
        assert_relative_eq!(seqv[0], 10.0 * 3f64.sqrt(), epsilon = 1e-9);
    }

    #[test]
    fn test_von_mises_length_mismatch() {
        let err = von_mises(&[1.0, 2.0], &[0.0, 0.0], &[0.0], &[0.0, 0.0], &[0.0, 0.0], &[0.0, 0.0])
            .unwrap_err();
        assert!(matches!(
            err,
            BeamSimError::LengthMismatch {
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_displacement_magnitude_of_table() {
        let session = FixedSession::uniaxial(1, 0.0);
        let tdef = extract_field(&session, "U", "SUM").unwrap();
        assert_eq!(tdef.len(), 1);
        assert_relative_eq!(tdef[0], 5.0);
    }

    #[test]
    fn test_displacement_magnitude_of_scalars() {
        let mut session = FixedSession::uniaxial(3, 0.0);
        session.displacement = NodalArray::from_scalars(vec![-2.0, 0.0, 1.5]);
        let tdef = extract(&session, &FieldSelector::displacement_magnitude()).unwrap();
        assert_eq!(tdef, vec![2.0, 0.0, 1.5]);
    }

    #[test]
    fn test_two_column_table_is_rejected() {
        let mut session = FixedSession::uniaxial(2, 0.0);
        session.displacement = NodalArray::Table(DMatrix::from_element(2, 2, 1.0));
        let err = extract(&session, &FieldSelector::displacement_magnitude()).unwrap_err();
        assert!(matches!(err, BeamSimError::UnexpectedShape { rows: 2, cols: 2 }));
    }

    #[test]
    fn test_axis_and_principal_pass_through() {
        let session = FixedSession::uniaxial(2, -40.0);
        assert_eq!(extract_field(&session, "disp", "y").unwrap(), vec![4.0, 4.0]);
        assert_eq!(extract_field(&session, "S", "1").unwrap(), vec![-40.0, -40.0]);
        assert_eq!(extract_field(&session, "stress", "3").unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_invalid_selectors() {
        let session = FixedSession::uniaxial(1, 0.0);
        assert!(matches!(
            extract_field(&session, "Displacement", "Q"),
            Err(BeamSimError::UnsupportedComponent { .. })
        ));
        assert!(matches!(
            extract_field(&session, "S", "SUM"),
            Err(BeamSimError::UnsupportedComponent { .. })
        ));
        // Label is checked before the component
        assert!(matches!(
            extract_field(&session, "Torque", "Q"),
            Err(BeamSimError::UnsupportedLabel(_))
        ));
    }

    #[test]
    fn test_solver_errors_pass_through() {
        let err = stats(&FailingSession, &FieldSelector::von_mises()).unwrap_err();
        assert!(matches!(
            err,
            BeamSimError::Solver(SolverError::MissingResult(_))
        ));
        assert_eq!(err.to_string(), "Result 'STRESS' not available in the loaded result set");
    }

    #[test]
    fn test_reduce_constant_sample() {
        let s = reduce(&[7.5; 10]).unwrap();
        assert_eq!(s.as_tuple(), (7.5, 7.5, 7.5));
    }

    #[test]
    fn test_reduce_empty_sample() {
        assert!(matches!(reduce(&[]), Err(BeamSimError::EmptySample)));
    }

    #[test]
    fn test_reduce_mixed_sample() {
        let s = reduce(&[-1.0, 4.0, 0.0, 1.0]).unwrap();
        assert_eq!(s.min, -1.0);
        assert_eq!(s.max, 4.0);
        assert_relative_eq!(s.mean, 1.0);
    }

    #[test]
    fn test_stats_is_reduce_of_extract() {
        let session = FixedSession::uniaxial(3, 250.0);
        let s = stats(&session, &FieldSelector::max_principal_stress()).unwrap();
        assert_eq!(s.as_tuple(), (250.0, 250.0, 250.0));
    }
}
