//! Size reduction of period datasets.
//!
//! Raw boundary files are often several megabytes of coordinates with far
//! more precision than a world map can show. The transform removes redundant
//! vertices with Douglas-Peucker simplification and then rounds every
//! ordinate to a fixed number of decimal digits.
//!
//! Small datasets (estimated size below [`TransformConfig::size_threshold`])
//! are returned untouched. Properties are never modified.
//!
//! # Example
//!
//! ```ignore
//! use histatlas::transform::{GeometryTransform, StandardTransform, TransformConfig};
//!
//! let transform = StandardTransform::new(TransformConfig::default().with_precision(3));
//! let smaller = transform.optimize(dataset);
//! ```

mod simplify;

pub use simplify::{
    optimize_line, perpendicular_distance, round_ordinate, round_position, simplify_line,
};

use rayon::prelude::*;

use crate::geo::{Feature, GeographicDataset, Geometry, Position};

/// Default number of decimal digits kept per ordinate (~11 m at the equator).
pub const DEFAULT_PRECISION_DIGITS: u32 = 4;

/// Digits beyond this carry no information in an `f64` ordinate.
pub const MAX_PRECISION_DIGITS: u32 = 15;

/// Default simplification tolerance in degrees.
pub const DEFAULT_SIMPLIFICATION_TOLERANCE: f64 = 1e-4;

/// Datasets estimated below this many size units are left unchanged.
pub const DEFAULT_SIZE_THRESHOLD: usize = 500_000;

/// Configuration for [`StandardTransform`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformConfig {
    /// Decimal digits kept per ordinate.
    pub precision_digits: u32,
    /// Maximum allowed deviation when removing points, in degrees.
    pub simplification_tolerance: f64,
    /// Estimated size below which the transform is skipped.
    pub size_threshold: usize,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            precision_digits: DEFAULT_PRECISION_DIGITS,
            simplification_tolerance: DEFAULT_SIMPLIFICATION_TOLERANCE,
            size_threshold: DEFAULT_SIZE_THRESHOLD,
        }
    }
}

impl TransformConfig {
    pub fn with_precision(mut self, digits: u32) -> Self {
        self.precision_digits = digits;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.simplification_tolerance = tolerance;
        self
    }

    pub fn with_size_threshold(mut self, threshold: usize) -> Self {
        self.size_threshold = threshold;
        self
    }
}

/// Stateless dataset transform used by the loader after every fetch.
pub trait GeometryTransform: Send + Sync {
    /// Return a size-reduced equivalent of `dataset`.
    fn optimize(&self, dataset: GeographicDataset) -> GeographicDataset;
}

/// Simplify-then-round transform.
#[derive(Debug, Clone, Default)]
pub struct StandardTransform {
    config: TransformConfig,
}

impl StandardTransform {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }
}

impl GeometryTransform for StandardTransform {
    fn optimize(&self, dataset: GeographicDataset) -> GeographicDataset {
        optimize_with(dataset, &self.config)
    }
}

/// Transform that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityTransform;

impl GeometryTransform for IdentityTransform {
    fn optimize(&self, dataset: GeographicDataset) -> GeographicDataset {
        dataset
    }
}

/// Optimize with the default size threshold.
pub fn optimize(
    dataset: GeographicDataset,
    precision_digits: u32,
    simplification_tolerance: f64,
) -> GeographicDataset {
    let config = TransformConfig::default()
        .with_precision(precision_digits)
        .with_tolerance(simplification_tolerance);
    optimize_with(dataset, &config)
}

/// Optimize using an explicit configuration.
pub fn optimize_with(dataset: GeographicDataset, config: &TransformConfig) -> GeographicDataset {
    let estimated = dataset.estimate_size();
    if estimated < config.size_threshold {
        tracing::trace!(
            estimated,
            threshold = config.size_threshold,
            "Dataset below threshold, skipping transform"
        );
        return dataset;
    }

    let before = dataset.position_count();
    let features: Vec<Feature> = dataset
        .features
        .into_par_iter()
        .map(|feature| optimize_feature(feature, config))
        .collect();
    let optimized = GeographicDataset::new(features);

    tracing::debug!(
        positions_before = before,
        positions_after = optimized.position_count(),
        precision = config.precision_digits,
        tolerance = config.simplification_tolerance,
        "Optimized dataset geometry"
    );
    optimized
}

fn optimize_feature(mut feature: Feature, config: &TransformConfig) -> Feature {
    feature.geometry = feature
        .geometry
        .map(|geometry| optimize_geometry(geometry, config));
    feature
}

fn optimize_geometry(geometry: Geometry, config: &TransformConfig) -> Geometry {
    let digits = config.precision_digits;
    let tolerance = config.simplification_tolerance;
    let optimize_lines = |lines: Vec<Vec<Position>>| -> Vec<Vec<Position>> {
        lines
            .iter()
            .map(|line| optimize_line(line, digits, tolerance))
            .collect()
    };

    match geometry {
        Geometry::Point { coordinates } => Geometry::Point {
            coordinates: round_position(coordinates, digits),
        },
        Geometry::MultiPoint { coordinates } => Geometry::MultiPoint {
            coordinates: coordinates
                .into_iter()
                .map(|p| round_position(p, digits))
                .collect(),
        },
        Geometry::LineString { coordinates } => Geometry::LineString {
            coordinates: optimize_line(&coordinates, digits, tolerance),
        },
        Geometry::MultiLineString { coordinates } => Geometry::MultiLineString {
            coordinates: optimize_lines(coordinates),
        },
        Geometry::Polygon { coordinates } => Geometry::Polygon {
            coordinates: optimize_lines(coordinates),
        },
        Geometry::MultiPolygon { coordinates } => Geometry::MultiPolygon {
            coordinates: coordinates.into_iter().map(&optimize_lines).collect(),
        },
        Geometry::GeometryCollection { geometries } => Geometry::GeometryCollection {
            geometries: geometries
                .into_iter()
                .map(|g| optimize_geometry(g, config))
                .collect(),
        },
    }
}
