//! The ordered, immutable table of selectable historical periods.
//!
//! Periods are supplied once at startup (in code or from a JSON manifest) and
//! never change afterwards. The table is the only place that maps a slider
//! ordinal to the identifier used as cache key and fetch name.

mod manifest;

pub use manifest::{load_manifest, parse_manifest, ManifestEntry};

use std::collections::HashSet;
use std::fmt;

use thiserror::Error;

/// One selectable historical time-point.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Period {
    /// Chronological position in the table.
    pub ordinal: usize,
    /// Stable name used as cache key and to fetch data.
    pub identifier: String,
    /// Human-readable label shown by the UI.
    pub display_label: String,
}

impl Period {
    pub fn new(
        ordinal: usize,
        identifier: impl Into<String>,
        display_label: impl Into<String>,
    ) -> Self {
        Self {
            ordinal,
            identifier: identifier.into(),
            display_label: display_label.into(),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.display_label, self.identifier)
    }
}

/// Errors building a period table.
#[derive(Debug, Error)]
pub enum PeriodError {
    #[error("period at position {position} has ordinal {ordinal}")]
    OrdinalMismatch { position: usize, ordinal: usize },

    #[error("period at position {position} has an empty identifier")]
    EmptyIdentifier { position: usize },

    #[error("duplicate period identifier: {0}")]
    DuplicateIdentifier(String),

    #[error("failed to read manifest {path}: {source}")]
    ManifestRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse manifest: {0}")]
    ManifestParse(#[from] serde_json::Error),
}

/// Direction of slider travel, used to bias preloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    /// Direction implied by moving from `from` to `to`, if they differ.
    pub fn between(from: usize, to: usize) -> Option<Self> {
        match to.cmp(&from) {
            std::cmp::Ordering::Greater => Some(Direction::Forward),
            std::cmp::Ordering::Less => Some(Direction::Backward),
            std::cmp::Ordering::Equal => None,
        }
    }
}

/// Ordered lookup table of all periods.
#[derive(Debug, Clone, Default)]
pub struct PeriodTable {
    periods: Vec<Period>,
}

impl PeriodTable {
    /// Build a table, checking that ordinals match positions and identifiers
    /// are non-empty and unique.
    pub fn new(periods: Vec<Period>) -> Result<Self, PeriodError> {
        let mut seen = HashSet::with_capacity(periods.len());
        for (position, period) in periods.iter().enumerate() {
            if period.ordinal != position {
                return Err(PeriodError::OrdinalMismatch {
                    position,
                    ordinal: period.ordinal,
                });
            }
            if period.identifier.trim().is_empty() {
                return Err(PeriodError::EmptyIdentifier { position });
            }
            if !seen.insert(period.identifier.as_str()) {
                return Err(PeriodError::DuplicateIdentifier(period.identifier.clone()));
            }
        }
        Ok(Self { periods })
    }

    /// Build a table from identifiers alone, using each identifier as its label.
    pub fn from_identifiers<I, S>(identifiers: I) -> Result<Self, PeriodError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let periods = identifiers
            .into_iter()
            .enumerate()
            .map(|(ordinal, id)| {
                let id = id.into();
                Period::new(ordinal, id.clone(), id)
            })
            .collect();
        Self::new(periods)
    }

    pub fn get(&self, ordinal: usize) -> Option<&Period> {
        self.periods.get(ordinal)
    }

    pub fn len(&self) -> usize {
        self.periods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.periods.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Period> {
        self.periods.iter()
    }

    /// Find a period by identifier.
    pub fn find(&self, identifier: &str) -> Option<&Period> {
        self.periods.iter().find(|p| p.identifier == identifier)
    }

    /// Ordinals worth preloading after landing on `ordinal`.
    ///
    /// Always the immediate neighbors; with a known direction of travel, also
    /// the period two steps ahead. Out-of-range ordinals are skipped.
    pub fn neighbors(&self, ordinal: usize, direction: Option<Direction>) -> Vec<usize> {
        let mut candidates: Vec<Option<usize>> = match direction {
            None => vec![ordinal.checked_sub(1), ordinal.checked_add(1)],
            Some(Direction::Forward) => vec![
                ordinal.checked_add(1),
                ordinal.checked_sub(1),
                ordinal.checked_add(2),
            ],
            Some(Direction::Backward) => vec![
                ordinal.checked_sub(1),
                ordinal.checked_add(1),
                ordinal.checked_sub(2),
            ],
        };
        candidates.retain(|c| matches!(c, Some(o) if *o < self.len()));
        candidates.into_iter().flatten().collect()
    }
}
