//! Full runs against a stand-in `ccx` that copies a prepared result file
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use beam_sim::config::SimConfig;
use beam_sim::executor::CalculixExecutor;
use beam_sim::geometry::{BeamCase, BeamShape};
use beam_sim::report::{REPORT_FILE_NAME, REPORT_HEADER};
use beam_sim::runner::run_case;
use beam_sim::session::SolverSession;

const RESULT_FRD: &str = "\
    2C                             2                                     1
 -1         1 0.00000E+00 0.00000E+00 0.00000E+00
 -1         2 3.00000E-01 0.00000E+00 0.00000E+00
 -3
  100CL  101 1.00000E+00           2                     0    1           1
 -4  DISP        4    1
 -5  D1          1    2    1    0
 -5  D2          1    2    2    0
 -5  D3          1    2    3    0
 -1         1 0.00000E+00 0.00000E+00 0.00000E+00
 -1         2-3.00000E-06 4.00000E-06 0.00000E+00
 -3
  100CL  102 1.00000E+00           2                     0    1           1
 -4  STRESS      6    1
 -5  SXX         1    4    1    1
 -5  SYY         1    4    2    2
 -5  SZZ         1    4    3    3
 -5  SXY         1    4    1    2
 -5  SYZ         1    4    2    3
 -5  SZX         1    4    3    1
 -1         1-5.00000E+06 0.00000E+00 0.00000E+00 0.00000E+00 0.00000E+00 0.00000E+00
 -1         2-5.00000E+06 0.00000E+00 0.00000E+00 0.00000E+00 0.00000E+00 0.00000E+00
 -3
 9999
";

/// Write a `ccx` replacement into `dir` that answers `ccx <job>` with `<job>.frd`
fn install_solver(dir: &Path) -> PathBuf {
    let frd = dir.join("prepared.frd");
    std::fs::write(&frd, RESULT_FRD).unwrap();

    let script = dir.join("ccx");
    std::fs::write(
        &script,
        format!("#!/bin/sh\ncp '{}' \"$1.frd\"\n", frd.display()),
    )
    .unwrap();
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    script
}

fn rect_case() -> BeamCase {
    BeamCase::new(
        BeamShape::Rect {
            length: 0.3,
            width: 0.05,
            height: 0.05,
        },
        5e6,
    )
}

#[test]
fn test_scratch_run_keeps_its_report() {
    let solver_dir = tempfile::tempdir().unwrap();
    let work_root = tempfile::tempdir().unwrap();

    let config = SimConfig {
        ccx_path: install_solver(solver_dir.path()).to_string_lossy().to_string(),
        work_root: work_root.path().to_path_buf(),
        scratch: true,
        ..SimConfig::default()
    };

    let outcome = run_case(&config, &rect_case()).unwrap();

    assert!(outcome.run_dir.is_none());
    assert_eq!(outcome.report_path, work_root.path().join(REPORT_FILE_NAME));
    assert!(outcome.report_path.exists());

    let content = std::fs::read_to_string(&outcome.report_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0], REPORT_HEADER.join(","));
    assert!(lines[1].contains(",rect,"));
}

#[test]
fn test_persistent_run_reports_into_run_dir() {
    let solver_dir = tempfile::tempdir().unwrap();
    let work_root = tempfile::tempdir().unwrap();

    let config = SimConfig {
        ccx_path: install_solver(solver_dir.path()).to_string_lossy().to_string(),
        work_root: work_root.path().to_path_buf(),
        ..SimConfig::default()
    };

    let outcome = run_case(&config, &rect_case()).unwrap();

    let run_dir = outcome.run_dir.clone().unwrap();
    assert!(run_dir.starts_with(work_root.path()));
    assert!(run_dir.join("rect.inp").exists());
    assert_eq!(outcome.report_path, run_dir.join(REPORT_FILE_NAME));
    assert!(outcome.report_path.exists());

    // |(-3e-6, 4e-6, 0)| at node 2
    assert!((outcome.peak_deformation() - 5.0e-6).abs() < 1e-12);
    assert!((outcome.row.min_principal_stress.min + 5.0e6).abs() < 1e-3);
}

#[test]
fn test_scratch_dir_lives_as_long_as_the_session() {
    let solver_dir = tempfile::tempdir().unwrap();
    let config = SimConfig {
        ccx_path: install_solver(solver_dir.path()).to_string_lossy().to_string(),
        scratch: true,
        ..SimConfig::default()
    };

    let session = CalculixExecutor::new(&config)
        .execute("sphere", "*HEADING\n")
        .unwrap();
    let run_dir = session.run_dir().to_path_buf();
    assert!(session.is_scratch());
    assert!(run_dir.join("sphere.frd").exists());
    assert_eq!(session.jobname(), "sphere");
    assert_eq!(session.results().node_count(), 2);

    drop(session);
    assert!(!run_dir.exists());
}
