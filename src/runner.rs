use std::path::{Path, PathBuf};

use chrono::Local;
use serde::Serialize;

use crate::config::SimConfig;
use crate::error::SimResult;
use crate::executor::CalculixExecutor;
use crate::generator::DeckGenerator;
use crate::geometry::BeamCase;
use crate::mesh::HexMesh;
use crate::report::{append_row, ReportRow, REPORT_FILE_NAME};
use crate::session::SolverSession;

/// What a finished run leaves behind
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub row: ReportRow,
    pub report_path: PathBuf,
    /// `None` for scratch runs, whose directory is already gone
    pub run_dir: Option<PathBuf>,
}

impl RunOutcome {
    /// Peak total deformation (m)
    pub fn peak_deformation(&self) -> f64 {
        self.row.total_deformation.max
    }
}

/// Mesh, solve and report one case.
///
/// Any failure aborts the run before the report is touched.
pub fn run_case(config: &SimConfig, case: &BeamCase) -> SimResult<RunOutcome> {
    config.validate()?;
    case.validate()?;

    let mesh = HexMesh::build(&case.shape.blocks(), case.shape.element_size())?;
    tracing::info!(
        "Meshed {} beam: {} nodes, {} elements",
        case.shape.name(),
        mesh.node_count(),
        mesh.element_count()
    );

    let deck = DeckGenerator::new(config.material.clone()).generate_inp_file(case, &mesh)?;

    let executor = CalculixExecutor::new(config);
    let session = executor.execute(case.shape.name(), &deck)?;

    let report_path = report_path_for(config, session.run_dir(), session.is_scratch());

    let row = report_session(&session, &report_path)?;
    let run_dir = (!session.is_scratch()).then(|| session.run_dir().to_path_buf());

    Ok(RunOutcome {
        row,
        report_path,
        run_dir,
    })
}

/// Where a run's row goes: the configured report, else `results.csv` in the run
/// directory. Scratch directories are deleted with the session, so scratch runs
/// fall back to the work root.
pub fn report_path_for(config: &SimConfig, run_dir: &Path, scratch: bool) -> PathBuf {
    match &config.report_path {
        Some(path) => path.clone(),
        None if scratch => config.work_root.join(REPORT_FILE_NAME),
        None => run_dir.join(REPORT_FILE_NAME),
    }
}

/// Collect the report row from a solved session, log it and append it to `path`
pub fn report_session<S: SolverSession + ?Sized>(session: &S, path: &Path) -> SimResult<ReportRow> {
    let row = ReportRow::collect(session, Local::now().naive_local())?;
    row.log_summary();
    append_row(path, &row)?;
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_path_defaults() {
        let config = SimConfig {
            work_root: PathBuf::from("/data/runs"),
            ..SimConfig::default()
        };
        let run_dir = Path::new("/data/runs/beam_sim_01012025_000000");

        assert_eq!(
            report_path_for(&config, run_dir, false),
            run_dir.join(REPORT_FILE_NAME)
        );
        // Never inside a directory that is about to be removed
        let scratch_dir = Path::new("/tmp/beam_sim_abc123");
        let path = report_path_for(&config, scratch_dir, true);
        assert_eq!(path, PathBuf::from("/data/runs").join(REPORT_FILE_NAME));
        assert!(!path.starts_with(scratch_dir));
    }

    #[test]
    fn test_configured_report_path_wins() {
        let config = SimConfig {
            report_path: Some(PathBuf::from("shared/results.csv")),
            ..SimConfig::default()
        };
        for scratch in [false, true] {
            assert_eq!(
                report_path_for(&config, Path::new("run"), scratch),
                PathBuf::from("shared/results.csv")
            );
        }
    }
}
