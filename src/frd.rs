//! CalculiX FRD (result) file reader
//!
//! Reads the ASCII variant of the `.frd` format written by `ccx` for nodal
//! results (`*NODE FILE` / `*EL FILE` output, extrapolated to nodes).
//!
//! Records used here:
//! - `    2C` node block, ` -1` records with node id and coordinates
//! - `  100C` result block header (time, step, id format)
//! - ` -4` dataset name, ` -5` component names (the `ALL` pseudo component is skipped)
//! - ` -1` / ` -2` value records, fixed-width E12.5 fields
//! - ` -3` block end, `9999` file end
//!
//! Node ids are I10 fields unless the block header declares the short format (I5).
//! Numeric fields are fixed width and can touch each other (`1.0E+00-2.0E+00`),
//! so they are sliced by column rather than split on whitespace.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use regex::Regex;

use crate::error::SolverError;

const VALUE_WIDTH: usize = 12;

/// Parsed FRD file
#[derive(Debug, Clone, Default)]
pub struct FrdFile {
    /// Node coordinates (node id → x, y, z)
    pub nodes: BTreeMap<i32, [f64; 3]>,
    /// Result datasets grouped per step, in file order
    pub result_blocks: Vec<ResultBlock>,
}

/// All datasets written for one step
#[derive(Debug, Clone)]
pub struct ResultBlock {
    pub step: i32,
    pub time: f64,
    pub datasets: Vec<ResultDataset>,
}

/// One nodal result variable (e.g. DISP, STRESS)
#[derive(Debug, Clone, Default)]
pub struct ResultDataset {
    pub name: String,
    pub components: Vec<String>,
    /// node id → component values
    pub values: BTreeMap<i32, Vec<f64>>,
}

enum Section {
    Idle,
    Nodes { id_width: usize },
    Elements,
    Results(PendingDataset),
}

struct PendingDataset {
    step: i32,
    time: f64,
    id_width: usize,
    dataset: ResultDataset,
    last_node: Option<i32>,
}

impl FrdFile {
    /// Read FRD file from path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SolverError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            SolverError::IoError(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    /// Parse FRD content held in memory
    pub fn parse(content: &str) -> Result<Self, SolverError> {
        Self::from_reader(content.as_bytes())
    }

    /// Read FRD data from a buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self, SolverError> {
        let dataset_re = Regex::new(r"^\s*-4\s+(\S+)\s+(\d+)")
            .map_err(|e| SolverError::ParsingError(e.to_string()))?;
        let component_re = Regex::new(r"^\s*-5\s+(\S+)")
            .map_err(|e| SolverError::ParsingError(e.to_string()))?;

        let mut frd = FrdFile::default();
        let mut section = Section::Idle;

        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| SolverError::IoError(e.to_string()))?;
            let line = line.trim_end_matches(['\r', '\n']);
            let line_no = idx + 1;
            let head = line.trim_start();

            if head.starts_with("9999") {
                break;
            }
            if head.starts_with("-3") {
                if let Section::Results(pending) = std::mem::replace(&mut section, Section::Idle) {
                    frd.push_dataset(pending);
                }
                continue;
            }

            match &mut section {
                Section::Idle => {
                    if head.starts_with("2C") {
                        section = Section::Nodes {
                            id_width: id_width(line),
                        };
                    } else if head.starts_with("3C") {
                        section = Section::Elements;
                    } else if head.starts_with("100C") {
                        section = Section::Results(PendingDataset {
                            step: header_step(line).unwrap_or(frd.result_blocks.len() as i32 + 1),
                            time: fixed_field(line, 12, 24).unwrap_or(0.0),
                            id_width: id_width(line),
                            dataset: ResultDataset::default(),
                            last_node: None,
                        });
                    }
                    // `1C`, `1U`, `1P` header and parameter records carry nothing we use
                }
                Section::Nodes { id_width } => {
                    if head.starts_with("-1") {
                        let (node_id, values) = parse_record(line, *id_width, line_no)?;
                        let node_id = node_id.ok_or_else(|| {
                            SolverError::ParsingError(format!("line {line_no}: node record without id"))
                        })?;
                        if values.len() < 3 {
                            return Err(SolverError::ParsingError(format!(
                                "line {line_no}: node {node_id} has {} coordinates",
                                values.len()
                            )));
                        }
                        frd.nodes.insert(node_id, [values[0], values[1], values[2]]);
                    }
                }
                Section::Elements => {}
                Section::Results(pending) => {
                    if let Some(caps) = dataset_re.captures(line) {
                        pending.dataset.name = caps[1].to_string();
                    } else if let Some(caps) = component_re.captures(line) {
                        let name = &caps[1];
                        if name != "ALL" {
                            pending.dataset.components.push(name.to_string());
                        }
                    } else if head.starts_with("-1") {
                        let (node_id, mut values) = parse_record(line, pending.id_width, line_no)?;
                        let node_id = node_id.ok_or_else(|| {
                            SolverError::ParsingError(format!("line {line_no}: value record without node id"))
                        })?;
                        if !pending.dataset.components.is_empty() {
                            values.truncate(pending.dataset.components.len());
                        }
                        pending.dataset.values.insert(node_id, values);
                        pending.last_node = Some(node_id);
                    } else if head.starts_with("-2") {
                        // Continuation of the previous node's values
                        let (_, values) = parse_record(line, pending.id_width, line_no)?;
                        if let Some(node_id) = pending.last_node {
                            if let Some(existing) = pending.dataset.values.get_mut(&node_id) {
                                existing.extend(values);
                            }
                        }
                    }
                }
            }
        }

        // A result block cut short by EOF still counts
        if let Section::Results(pending) = section {
            frd.push_dataset(pending);
        }

        tracing::debug!(
            "FRD parsed: {} nodes, {} result steps",
            frd.nodes.len(),
            frd.result_blocks.len()
        );

        Ok(frd)
    }

    fn push_dataset(&mut self, pending: PendingDataset) {
        if pending.dataset.name.is_empty() {
            return;
        }
        match self.result_blocks.iter_mut().find(|b| b.step == pending.step) {
            Some(block) => block.datasets.push(pending.dataset),
            None => self.result_blocks.push(ResultBlock {
                step: pending.step,
                time: pending.time,
                datasets: vec![pending.dataset],
            }),
        }
    }

    /// Lowest step number present
    pub fn first_step(&self) -> Option<i32> {
        self.result_blocks.iter().map(|b| b.step).min()
    }

    /// Look up a dataset by step and name (case-insensitive)
    pub fn dataset(&self, step: i32, name: &str) -> Option<&ResultDataset> {
        self.result_blocks
            .iter()
            .filter(|b| b.step == step)
            .flat_map(|b| b.datasets.iter())
            .find(|d| d.name.eq_ignore_ascii_case(name))
    }
}

/// Node id width from the trailing format flag of a block header (0 = short)
fn id_width(header: &str) -> usize {
    match header.split_whitespace().last() {
        Some("0") => 5,
        _ => 10,
    }
}

/// Step number of a `100C` header (I5 at columns 58..63)
fn header_step(header: &str) -> Option<i32> {
    header.get(58..63)?.trim().parse().ok()
}

fn fixed_field(line: &str, start: usize, end: usize) -> Option<f64> {
    line.get(start..end.min(line.len()))?.trim().parse().ok()
}

/// Split a ` -1` / ` -2` record into node id and fixed-width values
fn parse_record(
    line: &str,
    id_width: usize,
    line_no: usize,
) -> Result<(Option<i32>, Vec<f64>), SolverError> {
    let marker = line
        .find('-')
        .ok_or_else(|| SolverError::ParsingError(format!("line {line_no}: missing record key")))?;
    let id_start = marker + 2;
    let values_start = id_start + id_width;

    let node_id = line
        .get(id_start..values_start.min(line.len()))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i32>().map_err(|_| {
                SolverError::ParsingError(format!("line {line_no}: bad node id '{s}'"))
            })
        })
        .transpose()?;

    let mut values = Vec::new();
    if let Some(rest) = line.get(values_start..) {
        for chunk in rest.as_bytes().chunks(VALUE_WIDTH) {
            let text = std::str::from_utf8(chunk)
                .map_err(|e| SolverError::ParsingError(format!("line {line_no}: {e}")))?
                .trim();
            if text.is_empty() {
                continue;
            }
            let value = text.parse::<f64>().map_err(|_| {
                SolverError::ParsingError(format!("line {line_no}: bad value '{text}'"))
            })?;
            values.push(value);
        }
    }

    Ok((node_id, values))
}
