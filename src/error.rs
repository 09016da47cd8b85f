/// Error types. Only configuration and construction can fail; the per-tick
/// simulation is infallible by construction.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::entity::BodyRef;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{key} = {value} is out of range ({expected})")]
    OutOfRange {
        key: &'static str,
        value: f64,
        expected: &'static str,
    },
}

/// A required collaborator was missing when the world was assembled.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("physics host has no body {body:?} for the {role}")]
    MissingBody { role: &'static str, body: BodyRef },
    #[error("body {0:?} is registered twice")]
    DuplicateBody(BodyRef),
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("level is empty")]
    Empty,
    #[error("level has no player spawn ('P')")]
    NoSpawn,
    #[error("level has more than one player spawn (row {row}, column {col})")]
    ExtraSpawn { row: usize, col: usize },
    #[error("unknown glyph {glyph:?} at row {row}, column {col}")]
    UnknownGlyph { glyph: char, row: usize, col: usize },
    #[error(transparent)]
    Setup(#[from] SetupError),
}
