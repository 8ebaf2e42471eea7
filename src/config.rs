//! Runtime configuration, read from the environment

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{BeamSimError, SimResult};

/// Linear elastic material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Young's modulus in Pa
    pub elastic_modulus: f64,
    pub poisson_ratio: f64,
}

impl Material {
    pub fn structural_steel() -> Self {
        Self {
            name: "STEEL".to_string(),
            elastic_modulus: 210e9,
            poisson_ratio: 0.3,
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::structural_steel()
    }
}

/// Settings for one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Solver command (`CALCULIX_PATH`)
    pub ccx_path: String,
    /// Parent directory of per-run directories (`BEAM_SIM_WORK_DIR`)
    pub work_root: PathBuf,
    /// Report file; `None` means `<run dir>/results.csv` (`BEAM_SIM_REPORT`)
    pub report_path: Option<PathBuf>,
    /// Run inside a temporary directory removed when the session ends
    pub scratch: bool,
    /// Copy each run's input deck and result file here (`CALCULIX_DEBUG_EXPORT`)
    pub debug_export: Option<PathBuf>,
    pub material: Material,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ccx_path: "ccx".to_string(),
            work_root: PathBuf::from("."),
            report_path: None,
            scratch: false,
            debug_export: None,
            material: Material::default(),
        }
    }
}

impl SimConfig {
    pub fn from_env() -> Self {
        Self {
            ccx_path: resolve_ccx_path(),
            work_root: env_path("BEAM_SIM_WORK_DIR").unwrap_or_else(|| PathBuf::from(".")),
            report_path: env_path("BEAM_SIM_REPORT"),
            scratch: false,
            debug_export: env_path("CALCULIX_DEBUG_EXPORT"),
            material: Material::default(),
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        if self.ccx_path.trim().is_empty() {
            return Err(BeamSimError::InvalidConfig("solver command is empty".to_string()));
        }
        let m = &self.material;
        if !m.elastic_modulus.is_finite() || m.elastic_modulus <= 0.0 {
            return Err(BeamSimError::InvalidConfig(format!(
                "elastic modulus must be positive, got {}",
                m.elastic_modulus
            )));
        }
        if !(0.0..0.5).contains(&m.poisson_ratio) {
            return Err(BeamSimError::InvalidConfig(format!(
                "Poisson's ratio must lie in [0, 0.5), got {}",
                m.poisson_ratio
            )));
        }
        Ok(())
    }

    /// Directory name of a run started at `started`
    pub fn run_dir_name(started: NaiveDateTime) -> String {
        format!("beam_sim_{}", started.format("%d%m%Y_%H%M%S"))
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

/// Solver command: `CALCULIX_PATH`, else a repo-local `./bin/ccx`, else `ccx` on PATH.
///
/// The solver runs from inside the run directory, so a path that resolves to a
/// file is made absolute.
pub fn resolve_ccx_path() -> String {
    let ccx_path = std::env::var("CALCULIX_PATH").unwrap_or_else(|_| {
        if Path::new("./bin/ccx").exists() {
            "./bin/ccx".to_string()
        } else {
            "ccx".to_string()
        }
    });

    std::fs::canonicalize(&ccx_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or(ccx_path)
}
