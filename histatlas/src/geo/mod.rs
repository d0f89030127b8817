//! In-memory model of a period's geographic data.
//!
//! A [`GeographicDataset`] is a GeoJSON-shaped feature collection: a list of
//! named shapes with attached key/value properties. The loader treats a
//! dataset as an immutable value once produced; cached datasets are shared as
//! `Arc<GeographicDataset>` and never mutated in place.
//!
//! The serde representation matches GeoJSON, so a plain `serde_json` round
//! trip reads and writes the interchange format directly.

use std::fmt;

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::ser::{SerializeTuple, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Size units charged per coordinate pair by [`GeographicDataset::estimate_size`].
pub const POSITION_SIZE_UNITS: usize = 16;

/// A single (longitude, latitude) coordinate pair.
///
/// GeoJSON allows a third (altitude) ordinate; it is accepted on input and
/// dropped, since the atlas only draws planar boundaries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.x)?;
        tuple.serialize_element(&self.y)?;
        tuple.end()
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PositionVisitor;

        impl<'de> Visitor<'de> for PositionVisitor {
            type Value = Position;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a coordinate array with at least two numbers")
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Position, A::Error> {
                let x: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(0, &self))?;
                let y: f64 = seq
                    .next_element()?
                    .ok_or_else(|| de::Error::invalid_length(1, &self))?;
                // Altitude and any further ordinates are ignored.
                while seq.next_element::<f64>()?.is_some() {}
                Ok(Position { x, y })
            }
        }

        deserializer.deserialize_seq(PositionVisitor)
    }
}

/// Geometry of a single feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: Position },
    MultiPoint { coordinates: Vec<Position> },
    LineString { coordinates: Vec<Position> },
    MultiLineString { coordinates: Vec<Vec<Position>> },
    Polygon { coordinates: Vec<Vec<Position>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<Position>>> },
    GeometryCollection { geometries: Vec<Geometry> },
}

impl Geometry {
    /// Total number of coordinate pairs in this geometry.
    pub fn position_count(&self) -> usize {
        match self {
            Geometry::Point { .. } => 1,
            Geometry::MultiPoint { coordinates } | Geometry::LineString { coordinates } => {
                coordinates.len()
            }
            Geometry::MultiLineString { coordinates } | Geometry::Polygon { coordinates } => {
                coordinates.iter().map(Vec::len).sum()
            }
            Geometry::MultiPolygon { coordinates } => coordinates
                .iter()
                .flat_map(|polygon| polygon.iter())
                .map(Vec::len)
                .sum(),
            Geometry::GeometryCollection { geometries } => {
                geometries.iter().map(Geometry::position_count).sum()
            }
        }
    }
}

/// A named shape with its properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "Feature")]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Create a feature with the given geometry and no properties.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: None,
            geometry: Some(geometry),
            properties: None,
        }
    }

    /// Attach a property, creating the property map if needed.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// The `name` property, if present and a string.
    pub fn name(&self) -> Option<&str> {
        self.properties.as_ref()?.get("name")?.as_str()
    }
}

/// The unit of data cached per period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "FeatureCollection")]
pub struct GeographicDataset {
    pub features: Vec<Feature>,
}

impl GeographicDataset {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Total coordinate pairs across all features.
    pub fn position_count(&self) -> usize {
        self.features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .map(Geometry::position_count)
            .sum()
    }

    /// Rough in-memory size in byte-equivalent units.
    ///
    /// Each coordinate pair counts [`POSITION_SIZE_UNITS`]; properties count
    /// their key length plus the serialized length of their value. The
    /// transform uses this to skip datasets that are already small.
    pub fn estimate_size(&self) -> usize {
        let properties: usize = self
            .features
            .iter()
            .filter_map(|f| f.properties.as_ref())
            .flat_map(|props| props.iter())
            .map(|(key, value)| key.len() + value.to_string().len())
            .sum();
        self.position_count() * POSITION_SIZE_UNITS + properties
    }
}
