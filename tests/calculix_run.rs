//! End-to-end runs against a real `ccx`. Run with `cargo test -- --ignored`
//! once CALCULIX_PATH points at a solver.

use beam_sim::config::SimConfig;
use beam_sim::geometry::{BeamCase, BeamShape};
use beam_sim::report::REPORT_HEADER;
use beam_sim::runner::run_case;

fn config_in(dir: &std::path::Path) -> SimConfig {
    let mut config = SimConfig::from_env();
    config.work_root = dir.to_path_buf();
    config.report_path = Some(dir.join("results.csv"));
    config
}

#[test]
#[ignore = "requires the CalculiX solver"]
fn test_rect_run_appends_report() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(dir.path());
    let case = BeamCase::new(
        BeamShape::Rect {
            length: 0.3,
            width: 0.05,
            height: 0.05,
        },
        5e6,
    );

    let outcome = run_case(&config, &case).unwrap();
    assert_eq!(outcome.row.shape, "rect");
    assert!(outcome.peak_deformation() > 0.0);
    // Pressure pushes the free end back along -X
    assert!(outcome.row.axial_deformation.min < 0.0);
    assert!(outcome.row.von_mises_stress.max >= outcome.row.von_mises_stress.mean);

    let run_dir = outcome.run_dir.unwrap();
    assert!(run_dir.join("rect.frd").exists());

    let content = std::fs::read_to_string(&outcome.report_path).unwrap();
    assert_eq!(content.lines().next().unwrap(), REPORT_HEADER.join(","));
}

#[test]
#[ignore = "requires the CalculiX solver"]
fn test_scratch_sphere_run_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = config_in(dir.path());
    config.scratch = true;

    let case = BeamCase::new(BeamShape::Sphere { radius: 0.1 }, 1e6);
    let outcome = run_case(&config, &case).unwrap();

    assert!(outcome.run_dir.is_none());
    assert!(outcome.row.total_deformation.max > 0.0);
    // Only the report is left behind
    let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
    assert_eq!(entries.len(), 1);
}
