//! In-memory nodal result set for one solution step

use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

use crate::error::SolverError;
use crate::field::{Axis, PrincipalIndex, StressComponent};
use crate::frd::FrdFile;
use crate::session::{NodalArray, SolverSession};

/// Cauchy stress tensor at a node (Voigt order XX, YY, ZZ, XY, YZ, XZ)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StressTensor {
    pub sxx: f64,
    pub syy: f64,
    pub szz: f64,
    pub sxy: f64,
    pub syz: f64,
    pub sxz: f64,
}

impl StressTensor {
    pub fn new(sxx: f64, syy: f64, szz: f64, sxy: f64, syz: f64, sxz: f64) -> Self {
        Self {
            sxx,
            syy,
            szz,
            sxy,
            syz,
            sxz,
        }
    }

    /// Uniaxial state along X
    pub fn uniaxial(sxx: f64) -> Self {
        Self {
            sxx,
            ..Self::default()
        }
    }

    pub fn component(&self, component: StressComponent) -> f64 {
        match component {
            StressComponent::X => self.sxx,
            StressComponent::Y => self.syy,
            StressComponent::Z => self.szz,
            StressComponent::XY => self.sxy,
            StressComponent::YZ => self.syz,
            StressComponent::XZ => self.sxz,
        }
    }

    /// Principal stresses sorted descending (s1 >= s2 >= s3)
    pub fn principal(&self) -> [f64; 3] {
        let m = Matrix3::new(
            self.sxx, self.sxy, self.sxz, //
            self.sxy, self.syy, self.syz, //
            self.sxz, self.syz, self.szz,
        );
        let eig = m.symmetric_eigenvalues();
        let mut values = [eig[0], eig[1], eig[2]];
        values.sort_by(|a, b| b.total_cmp(a));
        values
    }
}

/// Nodal displacements and stresses of one solved step.
///
/// Rows are aligned: index `i` of every array refers to `node_ids[i]`.
#[derive(Debug, Clone)]
pub struct ResultSet {
    jobname: String,
    node_ids: Vec<i32>,
    displacements: Vec<[f64; 3]>,
    stresses: Vec<StressTensor>,
}

impl ResultSet {
    pub fn new(
        jobname: impl Into<String>,
        node_ids: Vec<i32>,
        displacements: Vec<[f64; 3]>,
        stresses: Vec<StressTensor>,
    ) -> Result<Self, SolverError> {
        if displacements.len() != node_ids.len() || stresses.len() != node_ids.len() {
            return Err(SolverError::ParsingError(format!(
                "misaligned result arrays: {} nodes, {} displacements, {} stresses",
                node_ids.len(),
                displacements.len(),
                stresses.len()
            )));
        }
        Ok(Self {
            jobname: jobname.into(),
            node_ids,
            displacements,
            stresses,
        })
    }

    /// Load the first solution step of an FRD file.
    ///
    /// Nodes are taken in ascending id order from the `DISP` dataset; every one of
    /// them must also carry a `STRESS` entry.
    pub fn from_frd(jobname: impl Into<String>, frd: &FrdFile) -> Result<Self, SolverError> {
        let step = frd
            .first_step()
            .ok_or_else(|| SolverError::MissingResult("result step".to_string()))?;

        let disp = frd
            .dataset(step, "DISP")
            .ok_or_else(|| SolverError::MissingResult("DISP".to_string()))?;
        let stress = frd
            .dataset(step, "STRESS")
            .ok_or_else(|| SolverError::MissingResult("STRESS".to_string()))?;

        if disp.components.len() < 3 {
            return Err(SolverError::ParsingError(format!(
                "DISP carries {} components, expected 3",
                disp.components.len()
            )));
        }
        if stress.components.len() < 6 {
            return Err(SolverError::ParsingError(format!(
                "STRESS carries {} components, expected 6",
                stress.components.len()
            )));
        }

        let mut node_ids = Vec::with_capacity(disp.values.len());
        let mut displacements = Vec::with_capacity(disp.values.len());
        let mut stresses = Vec::with_capacity(disp.values.len());

        for (&node_id, d) in &disp.values {
            let s = stress.values.get(&node_id).ok_or_else(|| {
                SolverError::MissingResult(format!("STRESS at node {node_id}"))
            })?;
            if d.len() < 3 || s.len() < 6 {
                return Err(SolverError::ParsingError(format!(
                    "short result record at node {node_id}"
                )));
            }
            node_ids.push(node_id);
            displacements.push([d[0], d[1], d[2]]);
            // FRD order is SXX SYY SZZ SXY SYZ SZX
            stresses.push(StressTensor::new(s[0], s[1], s[2], s[3], s[4], s[5]));
        }

        tracing::debug!(
            "Loaded step {} with {} nodal results",
            step,
            node_ids.len()
        );

        Self::new(jobname, node_ids, displacements, stresses)
    }

    pub fn node_ids(&self) -> &[i32] {
        &self.node_ids
    }

    pub fn node_count(&self) -> usize {
        self.node_ids.len()
    }
}

impl SolverSession for ResultSet {
    fn nodal_displacement(&self) -> Result<NodalArray, SolverError> {
        Ok(NodalArray::from_rows(&self.displacements))
    }

    fn nodal_displacement_component(&self, axis: Axis) -> Result<Vec<f64>, SolverError> {
        Ok(self.displacements.iter().map(|d| d[axis.index()]).collect())
    }

    fn nodal_principal_stress(&self, index: PrincipalIndex) -> Result<Vec<f64>, SolverError> {
        Ok(self
            .stresses
            .iter()
            .map(|s| s.principal()[index.index()])
            .collect())
    }

    fn nodal_component_stress(
        &self,
        component: StressComponent,
    ) -> Result<Vec<f64>, SolverError> {
        Ok(self.stresses.iter().map(|s| s.component(component)).collect())
    }

    fn jobname(&self) -> &str {
        &self.jobname
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_of_diagonal_tensor() {
        let s = StressTensor::new(-20.0, 50.0, 10.0, 0.0, 0.0, 0.0);
        let p = s.principal();
        assert_relative_eq!(p[0], 50.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 10.0, epsilon = 1e-9);
        assert_relative_eq!(p[2], -20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_of_plane_shear() {
        // Pure shear rotates to +/- tau
        let s = StressTensor::new(0.0, 0.0, 0.0, 40.0, 0.0, 0.0);
        let p = s.principal();
        assert_relative_eq!(p[0], 40.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 0.0, epsilon = 1e-9);
        assert_relative_eq!(p[2], -40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_principal_trace_is_invariant() {
        let s = StressTensor::new(100.0, 50.0, 25.0, 10.0, 5.0, 2.0);
        let p = s.principal();
        assert_relative_eq!(p[0] + p[1] + p[2], 175.0, epsilon = 1e-9);
        assert!(p[0] >= p[1] && p[1] >= p[2]);
    }

    #[test]
    fn test_misaligned_arrays_rejected() {
        let err = ResultSet::new("rect", vec![1, 2], vec![[0.0; 3]], vec![StressTensor::default(); 2])
            .unwrap_err();
        assert!(matches!(err, SolverError::ParsingError(_)));
    }

    #[test]
    fn test_session_capabilities() {
        let rs = ResultSet::new(
            "rect",
            vec![1, 2],
            vec![[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]],
            vec![StressTensor::uniaxial(10.0), StressTensor::uniaxial(-5.0)],
        )
        .unwrap();

        assert_eq!(rs.jobname(), "rect");
        assert_eq!(rs.nodal_displacement_component(Axis::Y).unwrap(), vec![2.0, 0.5]);
        assert_eq!(
            rs.nodal_component_stress(StressComponent::X).unwrap(),
            vec![10.0, -5.0]
        );

        let s1 = rs.nodal_principal_stress(PrincipalIndex::First).unwrap();
        let s3 = rs.nodal_principal_stress(PrincipalIndex::Third).unwrap();
        assert_relative_eq!(s1[0], 10.0, epsilon = 1e-9);
        assert_relative_eq!(s3[1], -5.0, epsilon = 1e-9);
        assert_eq!(rs.nodal_displacement().unwrap().len(), 2);
    }
}
