//! Text point-cloud loader.
//!
//! One `x, y, z` triple per line. Each axis is rescaled independently into
//! [-0.5, 0.5] so the cloud sits centred at the origin.

use std::path::Path;

use thiserror::Error;

use crate::geometry::{Point, Shape, Topology};
use crate::mat4::Mat4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PointCloudError {
    #[error("line {line}: expected 3 comma-separated values, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid number {value:?}")]
    BadNumber { line: usize, value: String },

    #[error("point cloud has no points")]
    Empty,

    #[error("failed to read point cloud: {0}")]
    Io(String),
}

/// Parse triples, skipping blank lines and `#` comments.
pub fn parse_triples(text: &str) -> Result<Vec<[f32; 3]>, PointCloudError> {
    let mut out = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 3 {
            return Err(PointCloudError::FieldCount {
                line: i + 1,
                found: fields.len(),
            });
        }
        let mut xyz = [0.0f32; 3];
        for (slot, field) in xyz.iter_mut().zip(&fields) {
            *slot = field.parse().map_err(|_| PointCloudError::BadNumber {
                line: i + 1,
                value: field.to_string(),
            })?;
        }
        out.push(xyz);
    }
    Ok(out)
}

/// Per-axis `(v - min) / range - 0.5`. A flat axis uses a range of 1.
pub fn normalize_centered(points: &[[f32; 3]]) -> Vec<[f32; 3]> {
    let mut min = [f32::INFINITY; 3];
    let mut max = [f32::NEG_INFINITY; 3];
    for p in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(p[axis]);
            max[axis] = max[axis].max(p[axis]);
        }
    }
    let range: [f32; 3] = std::array::from_fn(|axis| {
        let r = max[axis] - min[axis];
        if r == 0.0 {
            1.0
        } else {
            r
        }
    });
    points
        .iter()
        .map(|p| std::array::from_fn(|axis| (p[axis] - min[axis]) / range[axis] - 0.5))
        .collect()
}

/// Parse and normalize into a white line strip.
pub fn load_str(text: &str) -> Result<Shape, PointCloudError> {
    let raw = parse_triples(text)?;
    if raw.is_empty() {
        return Err(PointCloudError::Empty);
    }
    let points = normalize_centered(&raw)
        .into_iter()
        .map(|[x, y, z]| Point::new(x, y, z))
        .collect();
    Ok(Shape::new(Mat4::IDENTITY, Topology::LineStrip, points))
}

pub fn load_file(path: &Path) -> Result<Shape, PointCloudError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| PointCloudError::Io(format!("{}: {e}", path.display())))?;
    let shape = load_str(&text)?;
    tracing::info!("Loaded {} cloud points from {}", shape.len(), path.display());
    Ok(shape)
}
