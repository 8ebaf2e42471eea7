use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::Local;
use tempfile::TempDir;
use uuid::Uuid;

use crate::config::SimConfig;
use crate::error::SolverError;
use crate::field::{Axis, PrincipalIndex, StressComponent};
use crate::frd::FrdFile;
use crate::results::ResultSet;
use crate::session::{NodalArray, SolverSession};

/// Runs CalculiX on generated decks
pub struct CalculixExecutor {
    ccx_path: String,
    work_root: PathBuf,
    scratch: bool,
    debug_export: Option<PathBuf>,
}

/// Working directory of one run
enum RunDir {
    /// Kept after the run, holds the report by default
    Persistent(PathBuf),
    /// Removed when the session drops
    Scratch(TempDir),
}

impl RunDir {
    fn path(&self) -> &Path {
        match self {
            RunDir::Persistent(path) => path,
            RunDir::Scratch(dir) => dir.path(),
        }
    }
}

impl CalculixExecutor {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            ccx_path: config.ccx_path.clone(),
            work_root: config.work_root.clone(),
            scratch: config.scratch,
            debug_export: config.debug_export.clone(),
        }
    }

    pub fn ccx_path(&self) -> &str {
        &self.ccx_path
    }

    /// Whether the solver command can be started at all
    pub fn check_available(&self) -> bool {
        Command::new(&self.ccx_path).arg("-v").output().is_ok()
    }

    fn create_run_dir(&self) -> Result<RunDir, SolverError> {
        if self.scratch {
            let dir = tempfile::Builder::new()
                .prefix("beam_sim_")
                .tempdir()
                .map_err(|e| SolverError::IoError(e.to_string()))?;
            return Ok(RunDir::Scratch(dir));
        }

        let path = self
            .work_root
            .join(SimConfig::run_dir_name(Local::now().naive_local()));
        fs::create_dir_all(&path).map_err(|e| {
            SolverError::IoError(format!("Failed to create run directory {:?}: {}", path, e))
        })?;
        Ok(RunDir::Persistent(path))
    }

    /// Write the deck, run `ccx <jobname>` to completion and load step 1 of the
    /// result file into a session.
    pub fn execute(&self, jobname: &str, inp_content: &str) -> Result<CalculixSession, SolverError> {
        let run_id = Uuid::new_v4();
        let run_dir = self.create_run_dir()?;
        let work_path = run_dir.path();

        tracing::info!("Starting run {} ({}) in {:?}", run_id, jobname, work_path);

        let inp_path = work_path.join(format!("{jobname}.inp"));
        fs::write(&inp_path, inp_content)
            .map_err(|e| SolverError::IoError(format!("Failed to write .inp file: {}", e)))?;
        self.maybe_export_debug_file(&inp_path, &run_id, "inp");

        // ccx expects the job name without extension
        tracing::info!("Running command: {} {}", self.ccx_path, jobname);

        let output = Command::new(&self.ccx_path)
            .arg(jobname)
            .current_dir(work_path)
            .output()
            .map_err(|e| SolverError::ExecutionError(format!("Failed to execute ccx: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!("CalculiX failed. Stderr: {}\nStdout: {}", stderr, stdout);
            return Err(SolverError::AnalysisFailed(format!(
                "CalculiX exited with status {}. Check logs.",
                output.status
            )));
        }

        // ccx can report input errors and still exit cleanly
        let errors: Vec<&str> = stdout.lines().filter(|l| l.contains("*ERROR")).collect();
        if !errors.is_empty() {
            tracing::error!("CalculiX reported errors:\n{}", errors.join("\n"));
            return Err(SolverError::AnalysisFailed(errors.join("; ")));
        }

        let frd_path = work_path.join(format!("{jobname}.frd"));
        if !frd_path.exists() {
            return Err(SolverError::AnalysisFailed("No .frd file generated".to_string()));
        }
        self.maybe_export_debug_file(&frd_path, &run_id, "frd");

        let frd = FrdFile::from_file(&frd_path)?;
        let results = ResultSet::from_frd(jobname, &frd)?;

        tracing::info!(
            "Run {} solved: {} nodal results loaded",
            run_id,
            results.node_count()
        );

        Ok(CalculixSession {
            run_id,
            run_dir,
            results,
        })
    }

    fn maybe_export_debug_file(&self, path: &Path, run_id: &Uuid, extension: &str) {
        let Some(dest_dir) = &self.debug_export else {
            return;
        };
        if let Err(err) = fs::create_dir_all(dest_dir) {
            tracing::warn!("Failed to create debug export directory {:?}: {}", dest_dir, err);
            return;
        }

        let dest_file = dest_dir.join(format!("run_{}.{}", run_id, extension));
        if let Err(err) = fs::copy(path, &dest_file) {
            tracing::warn!("Failed to export debug file {:?}: {}", dest_file, err);
        } else {
            tracing::info!("Exported debug file to {:?}", dest_file);
        }
    }
}

/// A solved CalculiX run.
///
/// Owns its working directory; a scratch directory is deleted when the session
/// is dropped, whichever way the run ends.
pub struct CalculixSession {
    run_id: Uuid,
    run_dir: RunDir,
    results: ResultSet,
}

impl CalculixSession {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        self.run_dir.path()
    }

    pub fn is_scratch(&self) -> bool {
        matches!(self.run_dir, RunDir::Scratch(_))
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }
}

impl SolverSession for CalculixSession {
    fn nodal_displacement(&self) -> Result<NodalArray, SolverError> {
        self.results.nodal_displacement()
    }

    fn nodal_displacement_component(&self, axis: Axis) -> Result<Vec<f64>, SolverError> {
        self.results.nodal_displacement_component(axis)
    }

    fn nodal_principal_stress(&self, index: PrincipalIndex) -> Result<Vec<f64>, SolverError> {
        self.results.nodal_principal_stress(index)
    }

    fn nodal_component_stress(
        &self,
        component: StressComponent,
    ) -> Result<Vec<f64>, SolverError> {
        self.results.nodal_component_stress(component)
    }

    fn jobname(&self) -> &str {
        self.results.jobname()
    }
}
