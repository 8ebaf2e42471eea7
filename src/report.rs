//! The append-only results report
//!
//! One row per run: local timestamp, shape identifier and the (min, max, mean)
//! of five fields. The header is written only when the file is created.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SimResult;
use crate::extract::{stats, Summary};
use crate::field::{Axis, FieldSelector};
use crate::session::SolverSession;

pub const REPORT_FILE_NAME: &str = "results.csv";

pub const REPORT_HEADER: [&str; 17] = [
    "timestamp",
    "shape",
    "tdef_min",
    "tdef_max",
    "tdef_avg",
    "dx_min",
    "dx_max",
    "dx_avg",
    "s1_min",
    "s1_max",
    "s1_avg",
    "s3_min",
    "s3_max",
    "s3_avg",
    "seqv_min",
    "seqv_max",
    "seqv_avg",
];

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Summary of one solved run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    pub timestamp: NaiveDateTime,
    pub shape: String,
    /// Displacement magnitude (m)
    pub total_deformation: Summary,
    /// X displacement (m)
    pub axial_deformation: Summary,
    /// Principal stress #1 (Pa)
    pub max_principal_stress: Summary,
    /// Principal stress #3 (Pa)
    pub min_principal_stress: Summary,
    /// Von Mises stress (Pa)
    pub von_mises_stress: Summary,
}

impl ReportRow {
    /// Gather the five summaries from a solved session. The session's job name
    /// becomes the shape identifier.
    pub fn collect<S: SolverSession + ?Sized>(
        session: &S,
        timestamp: NaiveDateTime,
    ) -> SimResult<Self> {
        Ok(Self {
            timestamp,
            shape: session.jobname().to_string(),
            total_deformation: stats(session, &FieldSelector::displacement_magnitude())?,
            axial_deformation: stats(session, &FieldSelector::displacement(Axis::X))?,
            max_principal_stress: stats(session, &FieldSelector::max_principal_stress())?,
            min_principal_stress: stats(session, &FieldSelector::min_principal_stress())?,
            von_mises_stress: stats(session, &FieldSelector::von_mises())?,
        })
    }

    fn summaries(&self) -> [&Summary; 5] {
        [
            &self.total_deformation,
            &self.axial_deformation,
            &self.max_principal_stress,
            &self.min_principal_stress,
            &self.von_mises_stress,
        ]
    }

    /// Cell values in header order
    pub fn fields(&self) -> Vec<String> {
        let mut fields = Vec::with_capacity(REPORT_HEADER.len());
        fields.push(self.timestamp.format(TIMESTAMP_FORMAT).to_string());
        fields.push(quote(&self.shape));
        for summary in self.summaries() {
            fields.push(format!("{:?}", summary.min));
            fields.push(format!("{:?}", summary.max));
            fields.push(format!("{:?}", summary.mean));
        }
        fields
    }

    pub fn to_csv_line(&self) -> String {
        format!("{}\n", self.fields().join(","))
    }

    pub fn log_summary(&self) {
        let lines = [
            ("Total Deformation (m)", &self.total_deformation),
            ("X-Dir Deformation (m)", &self.axial_deformation),
            ("Max Principal Stress (Pa)", &self.max_principal_stress),
            ("Min Principal Stress (Pa)", &self.min_principal_stress),
            ("Von Mises Stress (Pa)", &self.von_mises_stress),
        ];
        tracing::info!("Result summary for {}", self.shape);
        for (name, s) in lines {
            tracing::info!(
                "{}: min={:.6e}, max={:.6e}, avg={:.6e}",
                name,
                s.min,
                s.max,
                s.mean
            );
        }
    }
}

/// Quote a cell if it would break the row
fn quote(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

/// Append a row, writing the header first if the file does not exist yet
pub fn append_row(path: &Path, row: &ReportRow) -> SimResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let write_header = !path.exists();
    let mut content = String::new();
    if write_header {
        content.push_str(&REPORT_HEADER.join(","));
        content.push('\n');
    }
    content.push_str(&row.to_csv_line());

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(content.as_bytes())?;

    tracing::info!("Appended {} row to {:?}", row.shape, path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::{ResultSet, StressTensor};
    use chrono::NaiveDate;

    fn timestamp() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 7)
            .unwrap()
            .and_hms_opt(14, 30, 5)
            .unwrap()
    }

    fn session() -> ResultSet {
        ResultSet::new(
            "rect",
            vec![1, 2],
            vec![[3.0, 4.0, 0.0], [-1.0, 0.0, 0.0]],
            vec![StressTensor::uniaxial(100.0), StressTensor::uniaxial(-50.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_collect_row() {
        let row = ReportRow::collect(&session(), timestamp()).unwrap();
        assert_eq!(row.shape, "rect");
        assert_eq!(row.total_deformation.as_tuple(), (1.0, 5.0, 3.0));
        assert_eq!(row.axial_deformation.as_tuple(), (-1.0, 3.0, 1.0));
        assert!((row.von_mises_stress.max - 100.0).abs() < 1e-9);
        assert!((row.min_principal_stress.min + 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_fields_follow_header() {
        let row = ReportRow::collect(&session(), timestamp()).unwrap();
        let fields = row.fields();
        assert_eq!(fields.len(), REPORT_HEADER.len());
        assert_eq!(fields[0], "2025-03-07T14:30:05");
        assert_eq!(fields[1], "rect");
        assert_eq!(fields[3], "5.0");
        assert!(row.to_csv_line().ends_with('\n'));
    }

    #[test]
    fn test_shape_is_quoted_when_needed() {
        assert_eq!(quote("tbeam"), "tbeam");
        assert_eq!(quote("a,b"), "\"a,b\"");
        assert_eq!(quote("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_append_creates_parent_and_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(REPORT_FILE_NAME);
        let row = ReportRow::collect(&session(), timestamp()).unwrap();

        append_row(&path, &row).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], REPORT_HEADER.join(","));
    }
}
