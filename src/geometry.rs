//! Beam shapes, their block decomposition, supports and loaded surfaces

use serde::{Deserialize, Serialize};

use crate::error::{BeamSimError, SimResult};
use crate::field::Axis;
use crate::mesh::Block;

/// Beam geometry (SI units, metres)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum BeamShape {
    /// Solid rectangular bar along X, centred on the Y/Z axes
    Rect { length: f64, width: f64, height: f64 },
    /// Solid block of half-size `radius` around the origin
    Sphere { radius: f64 },
    /// Web and flange blocks stacked along Z
    TBeam {
        length: f64,
        web_thk: f64,
        flange_width: f64,
        flange_thk: f64,
    },
}

/// Where the pressure goes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LoadRegion {
    /// Exterior faces lying on `axis = value`
    Plane(Axis, f64),
    /// Every exterior face
    Exterior,
}

impl BeamShape {
    /// Shape identifier, also used as the solver job name
    pub fn name(&self) -> &'static str {
        match self {
            BeamShape::Rect { .. } => "rect",
            BeamShape::Sphere { .. } => "sphere",
            BeamShape::TBeam { .. } => "tbeam",
        }
    }

    fn dimensions(&self) -> Vec<(&'static str, f64)> {
        match *self {
            BeamShape::Rect {
                length,
                width,
                height,
            } => vec![("length", length), ("width", width), ("height", height)],
            BeamShape::Sphere { radius } => vec![("radius", radius)],
            BeamShape::TBeam {
                length,
                web_thk,
                flange_width,
                flange_thk,
            } => vec![
                ("length", length),
                ("web_thk", web_thk),
                ("flange_width", flange_width),
                ("flange_thk", flange_thk),
            ],
        }
    }

    pub fn validate(&self) -> SimResult<()> {
        for (name, value) in self.dimensions() {
            if !value.is_finite() || value <= 0.0 {
                return Err(BeamSimError::InvalidGeometry(format!(
                    "{} {} must be positive, got {}",
                    self.name(),
                    name,
                    value
                )));
            }
        }
        Ok(())
    }

    /// Solid blocks making up the shape
    pub fn blocks(&self) -> Vec<Block> {
        match *self {
            BeamShape::Rect {
                length,
                width,
                height,
            } => vec![Block::new(
                [0.0, -width / 2.0, -height / 2.0],
                [length, width / 2.0, height / 2.0],
            )],
            BeamShape::Sphere { radius } => vec![Block::new(
                [-radius, -radius, -radius],
                [radius, radius, radius],
            )],
            BeamShape::TBeam {
                length,
                web_thk,
                flange_width,
                flange_thk,
            } => {
                // Web spans z in [0, flange_thk]; the flange sits on top with depth web_thk
                let web_zmax = flange_thk;
                vec![
                    Block::new(
                        [0.0, -web_thk / 2.0, 0.0],
                        [length, web_thk / 2.0, web_zmax],
                    ),
                    Block::new(
                        [0.0, -flange_width / 2.0, web_zmax],
                        [length, flange_width / 2.0, web_zmax + web_thk],
                    ),
                ]
            }
        }
    }

    /// Target brick edge length: a quarter of the smallest dimension
    pub fn element_size(&self) -> f64 {
        self.dimensions()
            .into_iter()
            .map(|(_, v)| v)
            .fold(f64::INFINITY, f64::min)
            / 4.0
    }

    /// Plane whose nodes are fixed in all translations
    pub fn support_plane(&self) -> (Axis, f64) {
        match *self {
            BeamShape::Sphere { radius } => (Axis::Y, -radius),
            BeamShape::Rect { .. } | BeamShape::TBeam { .. } => (Axis::X, 0.0),
        }
    }

    pub fn load_region(&self) -> LoadRegion {
        match *self {
            BeamShape::Rect { length, .. } | BeamShape::TBeam { length, .. } => {
                LoadRegion::Plane(Axis::X, length)
            }
            BeamShape::Sphere { .. } => LoadRegion::Exterior,
        }
    }
}

/// One simulation run: a shape and the applied surface pressure (Pa)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BeamCase {
    #[serde(flatten)]
    pub shape: BeamShape,
    pub pressure: f64,
}

impl BeamCase {
    pub fn new(shape: BeamShape, pressure: f64) -> Self {
        Self { shape, pressure }
    }

    pub fn validate(&self) -> SimResult<()> {
        self.shape.validate()?;
        if !self.pressure.is_finite() {
            return Err(BeamSimError::InvalidGeometry(format!(
                "pressure must be finite, got {}",
                self.pressure
            )));
        }
        Ok(())
    }
}
