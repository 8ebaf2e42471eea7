//! Structured hexahedral meshing of axis-aligned block unions

use std::collections::{HashMap, HashSet};

use crate::error::{BeamSimError, SimResult};
use crate::field::Axis;

/// Upper bound on generated cells
const MAX_CELLS: usize = 2_000_000;

/// Axis-aligned box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub min: [f64; 3],
    pub max: [f64; 3],
}

impl Block {
    pub fn new(min: [f64; 3], max: [f64; 3]) -> Self {
        Self { min, max }
    }

    fn contains(&self, p: [f64; 3]) -> bool {
        (0..3).all(|a| p[a] >= self.min[a] && p[a] <= self.max[a])
    }
}

/// Face of an 8-node brick, numbered as in CalculiX/Abaqus C3D8
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Face {
    ZMin,
    ZMax,
    YMin,
    XMax,
    YMax,
    XMin,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::ZMin,
        Face::ZMax,
        Face::YMin,
        Face::XMax,
        Face::YMax,
        Face::XMin,
    ];

    /// Face number used in `*DLOAD` labels (`P1`..`P6`)
    pub fn number(self) -> u8 {
        match self {
            Face::ZMin => 1,
            Face::ZMax => 2,
            Face::YMin => 3,
            Face::XMax => 4,
            Face::YMax => 5,
            Face::XMin => 6,
        }
    }

    /// Local corner indices of the face
    fn corners(self) -> [usize; 4] {
        match self {
            Face::ZMin => [0, 1, 2, 3],
            Face::ZMax => [4, 7, 6, 5],
            Face::YMin => [0, 4, 5, 1],
            Face::XMax => [1, 5, 6, 2],
            Face::YMax => [2, 6, 7, 3],
            Face::XMin => [3, 7, 4, 0],
        }
    }

    fn normal(self) -> (Axis, bool) {
        match self {
            Face::XMin => (Axis::X, false),
            Face::XMax => (Axis::X, true),
            Face::YMin => (Axis::Y, false),
            Face::YMax => (Axis::Y, true),
            Face::ZMin => (Axis::Z, false),
            Face::ZMax => (Axis::Z, true),
        }
    }
}

/// Conformal mesh of C3D8 bricks. Node and element indices are 0-based.
#[derive(Debug, Clone)]
pub struct HexMesh {
    nodes: Vec<[f64; 3]>,
    elements: Vec<[usize; 8]>,
    cells: Vec<[usize; 3]>,
    occupied: HashSet<[usize; 3]>,
    tolerance: f64,
}

impl HexMesh {
    /// Mesh the union of `blocks` with bricks no larger than `element_size`.
    ///
    /// Grid lines are placed at every block bound, so touching blocks share
    /// nodes along their interface.
    pub fn build(blocks: &[Block], element_size: f64) -> SimResult<Self> {
        if blocks.is_empty() {
            return Err(BeamSimError::InvalidGeometry("no blocks to mesh".to_string()));
        }
        if !element_size.is_finite() || element_size <= 0.0 {
            return Err(BeamSimError::InvalidGeometry(format!(
                "element size must be positive, got {element_size}"
            )));
        }
        for block in blocks {
            for a in 0..3 {
                if !(block.min[a].is_finite() && block.max[a].is_finite())
                    || block.max[a] <= block.min[a]
                {
                    return Err(BeamSimError::InvalidGeometry(format!(
                        "degenerate block {:?} .. {:?}",
                        block.min, block.max
                    )));
                }
            }
        }

        let extent = blocks
            .iter()
            .flat_map(|b| (0..3).map(move |a| b.max[a] - b.min[a]))
            .fold(0.0_f64, f64::max);
        let tolerance = (extent * 1e-9).min(element_size * 1e-3);

        let bounds: Vec<Vec<f64>> = (0..3).map(|a| axis_bounds(blocks, a, tolerance)).collect();

        // Cell count from the division counts alone, before any grid is allocated
        let counts: Vec<f64> = bounds
            .iter()
            .map(|b| {
                b.windows(2)
                    .map(|pair| divisions(pair[0], pair[1], element_size))
                    .sum::<f64>()
            })
            .collect();
        if counts.iter().any(|&c| c < 1.0) {
            return Err(BeamSimError::InvalidGeometry(format!(
                "blocks are thinner than the mesh tolerance {tolerance:e}"
            )));
        }
        let total: f64 = counts.iter().product();
        if total > MAX_CELLS as f64 {
            return Err(BeamSimError::InvalidGeometry(format!(
                "mesh would need {total:.3e} cells (limit {MAX_CELLS})"
            )));
        }

        let grid: Vec<Vec<f64>> = bounds
            .iter()
            .map(|b| axis_grid(b, element_size))
            .collect();

        let mut node_index: HashMap<[usize; 3], usize> = HashMap::new();
        let mut nodes = Vec::new();
        let mut elements = Vec::new();
        let mut cells = Vec::new();
        let mut occupied = HashSet::new();

        for k in 0..grid[2].len() - 1 {
            for j in 0..grid[1].len() - 1 {
                for i in 0..grid[0].len() - 1 {
                    let centre = [
                        0.5 * (grid[0][i] + grid[0][i + 1]),
                        0.5 * (grid[1][j] + grid[1][j + 1]),
                        0.5 * (grid[2][k] + grid[2][k + 1]),
                    ];
                    if !blocks.iter().any(|b| b.contains(centre)) {
                        continue;
                    }

                    let corners = [
                        [i, j, k],
                        [i + 1, j, k],
                        [i + 1, j + 1, k],
                        [i, j + 1, k],
                        [i, j, k + 1],
                        [i + 1, j, k + 1],
                        [i + 1, j + 1, k + 1],
                        [i, j + 1, k + 1],
                    ];
                    let mut element = [0usize; 8];
                    for (slot, g) in corners.iter().enumerate() {
                        element[slot] = *node_index.entry(*g).or_insert_with(|| {
                            nodes.push([grid[0][g[0]], grid[1][g[1]], grid[2][g[2]]]);
                            nodes.len() - 1
                        });
                    }
                    elements.push(element);
                    cells.push([i, j, k]);
                    occupied.insert([i, j, k]);
                }
            }
        }

        if elements.is_empty() {
            return Err(BeamSimError::InvalidGeometry("mesh has no elements".to_string()));
        }

        Ok(Self {
            nodes,
            elements,
            cells,
            occupied,
            tolerance,
        })
    }

    pub fn nodes(&self) -> &[[f64; 3]] {
        &self.nodes
    }

    pub fn elements(&self) -> &[[usize; 8]] {
        &self.elements
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Nodes lying on the plane `axis = value`
    pub fn nodes_on_plane(&self, axis: Axis, value: f64) -> Vec<usize> {
        let a = axis.index();
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, p)| (p[a] - value).abs() <= self.tolerance)
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Element faces on the outer surface
    pub fn exterior_faces(&self) -> Vec<(usize, Face)> {
        let mut faces = Vec::new();
        for (elem, cell) in self.cells.iter().enumerate() {
            for face in Face::ALL {
                if !self.has_neighbour(*cell, face) {
                    faces.push((elem, face));
                }
            }
        }
        faces
    }

    /// Exterior element faces lying on the plane `axis = value`
    pub fn faces_on_plane(&self, axis: Axis, value: f64) -> Vec<(usize, Face)> {
        let a = axis.index();
        self.exterior_faces()
            .into_iter()
            .filter(|(elem, face)| {
                face.normal().0 == axis
                    && face.corners().iter().all(|&c| {
                        let node = self.elements[*elem][c];
                        (self.nodes[node][a] - value).abs() <= self.tolerance
                    })
            })
            .collect()
    }

    fn has_neighbour(&self, cell: [usize; 3], face: Face) -> bool {
        let (axis, positive) = face.normal();
        let a = axis.index();
        let mut other = cell;
        if positive {
            other[a] += 1;
        } else if cell[a] == 0 {
            return false;
        } else {
            other[a] -= 1;
        }
        self.occupied.contains(&other)
    }
}

/// Sorted distinct block bounds along one axis
fn axis_bounds(blocks: &[Block], axis: usize, tolerance: f64) -> Vec<f64> {
    let mut bounds: Vec<f64> = blocks
        .iter()
        .flat_map(|b| [b.min[axis], b.max[axis]])
        .collect();
    bounds.sort_by(|a, b| a.total_cmp(b));
    bounds.dedup_by(|a, b| (*a - *b).abs() <= tolerance);
    bounds
}

/// Bricks needed to span `lo..hi` with edges no longer than `size`
fn divisions(lo: f64, hi: f64, size: f64) -> f64 {
    // Slack absorbs round-off in ratios like 0.3 / 0.0125
    ((hi - lo) / size - 1e-6).ceil().max(1.0)
}

/// Grid coordinates along one axis: every bound, with intervals split to `size`
fn axis_grid(bounds: &[f64], size: f64) -> Vec<f64> {
    let mut coords = Vec::new();
    for pair in bounds.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        let n_div = divisions(lo, hi, size) as usize;
        for n in 0..n_div {
            coords.push(lo + (hi - lo) * n as f64 / n_div as f64);
        }
    }
    if let Some(&last) = bounds.last() {
        coords.push(last);
    }
    coords
}
