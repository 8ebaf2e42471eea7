//! Training data and the feature contract of the deformation regressor
//!
//! A regressor maps five numbers, always in [`FEATURE_ORDER`], to the predicted
//! peak total deformation. The model itself lives outside this crate; anything
//! implementing [`Regressor`] can be evaluated against a [`Dataset`].

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{BeamSimError, SimResult};
use crate::geometry::{BeamCase, BeamShape};

pub const FEATURE_ORDER: [&str; 5] = ["length", "width", "height", "pressure", "shape_sphere"];

/// Model input
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub pressure: f64,
    /// 1.0 for spheres, 0.0 otherwise
    pub shape_sphere: f64,
}

impl FeatureVector {
    pub fn new(length: f64, width: f64, height: f64, pressure: f64, is_sphere: bool) -> Self {
        Self {
            length,
            width,
            height,
            pressure,
            shape_sphere: if is_sphere { 1.0 } else { 0.0 },
        }
    }

    /// Features of a simulated case. Spheres carry their radius as length with
    /// no width or height; T-beams use the flange width and total depth.
    pub fn from_case(case: &BeamCase) -> Self {
        match case.shape {
            BeamShape::Rect {
                length,
                width,
                height,
            } => Self::new(length, width, height, case.pressure, false),
            BeamShape::Sphere { radius } => Self::new(radius, 0.0, 0.0, case.pressure, true),
            BeamShape::TBeam {
                length,
                web_thk,
                flange_width,
                flange_thk,
            } => Self::new(
                length,
                flange_width,
                flange_thk + web_thk,
                case.pressure,
                false,
            ),
        }
    }

    pub fn to_array(&self) -> [f64; 5] {
        [
            self.length,
            self.width,
            self.height,
            self.pressure,
            self.shape_sphere,
        ]
    }
}

/// Anything that predicts peak deformation from features
pub trait Regressor {
    fn predict(&self, features: &FeatureVector) -> f64;

    fn predict_many(&self, features: &[FeatureVector]) -> Vec<f64> {
        features.iter().map(|f| self.predict(f)).collect()
    }
}

impl<F> Regressor for F
where
    F: Fn(&FeatureVector) -> f64,
{
    fn predict(&self, features: &FeatureVector) -> f64 {
        self(features)
    }
}

/// Goodness of fit on a dataset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub r2: f64,
    pub mse: f64,
}

/// Feature rows with their measured peak deformation
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub features: Vec<FeatureVector>,
    pub targets: Vec<f64>,
    pub shapes: Vec<String>,
}

const TARGET_COLUMNS: [&str; 2] = ["max_deformation", "tot_def_max"];

impl Dataset {
    pub fn load(path: &Path) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let dataset = Self::from_csv_str(&content)?;
        tracing::info!("Loaded {} samples from {:?}", dataset.len(), path);
        Ok(dataset)
    }

    /// Parse a training table.
    ///
    /// `param1..param4` are accepted for `length, width, height, pressure`; the
    /// target column is `max_deformation` or `tot_def_max`. Blank width and
    /// height cells read as 0.
    pub fn from_csv_str(content: &str) -> SimResult<Self> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header_line = lines
            .next()
            .ok_or_else(|| BeamSimError::Dataset("dataset is empty".to_string()))?;

        let columns: HashMap<String, usize> = split_row(header_line)
            .into_iter()
            .enumerate()
            .map(|(i, name)| (canonical_column(&name).to_string(), i))
            .collect();

        let column = |name: &str| {
            columns
                .get(name)
                .copied()
                .ok_or_else(|| BeamSimError::Dataset(format!("missing '{}' column", name)))
        };

        let shape_col = column("shape")?;
        let length_col = column("length")?;
        let width_col = column("width")?;
        let height_col = column("height")?;
        let pressure_col = column("pressure")?;
        let target_col = TARGET_COLUMNS
            .iter()
            .find_map(|name| columns.get(*name).copied())
            .ok_or_else(|| {
                BeamSimError::Dataset(format!(
                    "missing target column, expected one of {:?}",
                    TARGET_COLUMNS
                ))
            })?;

        let mut dataset = Dataset::default();
        for (row_no, line) in lines.enumerate() {
            let cells = split_row(line);
            // header is row 1
            let row = row_no + 2;
            let cell = |idx: usize| cells.get(idx).map(|c| c.trim()).unwrap_or("");

            let shape = cell(shape_col).to_string();
            let features = FeatureVector::new(
                parse_number(cell(length_col), "length", row)?,
                parse_optional(cell(width_col), "width", row)?,
                parse_optional(cell(height_col), "height", row)?,
                parse_number(cell(pressure_col), "pressure", row)?,
                shape.eq_ignore_ascii_case("sphere"),
            );

            dataset.features.push(features);
            dataset.targets.push(parse_number(cell(target_col), "target", row)?);
            dataset.shapes.push(shape);
        }

        Ok(dataset)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Distinct shape names, sorted
    pub fn unique_shapes(&self) -> Vec<String> {
        self.shapes
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Values of one feature, by position in [`FEATURE_ORDER`]
    pub fn feature_column(&self, index: usize) -> Vec<f64> {
        self.features.iter().map(|f| f.to_array()[index]).collect()
    }

    /// Score of always predicting the mean target, the floor any model has to beat
    pub fn mean_baseline(&self) -> SimResult<Evaluation> {
        if self.is_empty() {
            return Err(BeamSimError::EmptySample);
        }
        let mean = self.targets.iter().sum::<f64>() / self.len() as f64;
        self.evaluate(&move |_: &FeatureVector| mean)
    }

    pub fn evaluate<R: Regressor + ?Sized>(&self, model: &R) -> SimResult<Evaluation> {
        let predicted = model.predict_many(&self.features);
        Ok(Evaluation {
            r2: r2_score(&self.targets, &predicted)?,
            mse: mean_squared_error(&self.targets, &predicted)?,
        })
    }
}

fn canonical_column(name: &str) -> &str {
    match name.trim() {
        "param1" => "length",
        "param2" => "width",
        "param3" => "height",
        "param4" => "pressure",
        other => other,
    }
}

/// Split one row on commas, honouring double-quoted cells
fn split_row(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => cells.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    cells.push(current);
    cells
}

fn parse_number(cell: &str, column: &str, row: usize) -> SimResult<f64> {
    cell.parse::<f64>().map_err(|_| {
        BeamSimError::Dataset(format!("row {}: invalid {} value '{}'", row, column, cell))
    })
}

fn parse_optional(cell: &str, column: &str, row: usize) -> SimResult<f64> {
    if cell.is_empty() || cell.eq_ignore_ascii_case("nan") {
        Ok(0.0)
    } else {
        parse_number(cell, column, row)
    }
}

fn check_pair(actual: &[f64], predicted: &[f64]) -> SimResult<()> {
    if actual.len() != predicted.len() {
        return Err(BeamSimError::LengthMismatch {
            expected: actual.len(),
            found: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(BeamSimError::EmptySample);
    }
    Ok(())
}

pub fn mean_squared_error(actual: &[f64], predicted: &[f64]) -> SimResult<f64> {
    check_pair(actual, predicted)?;
    let sum: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    Ok(sum / actual.len() as f64)
}

/// Coefficient of determination. A constant target scores 1.0 when predicted
/// exactly and 0.0 otherwise.
pub fn r2_score(actual: &[f64], predicted: &[f64]) -> SimResult<f64> {
    check_pair(actual, predicted)?;
    let mean = actual.iter().sum::<f64>() / actual.len() as f64;
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
