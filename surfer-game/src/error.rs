use std::fmt;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attribute {
    Position,
    Normal,
    TexCoord,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Attribute::Position => f.write_str("position"),
            Attribute::Normal => f.write_str("normal"),
            Attribute::TexCoord => f.write_str("texcoord"),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("face {face} references {attribute} {index}, but only {len} exist")]
    IndexOutOfRange {
        face: usize,
        attribute: Attribute,
        index: usize,
        len: usize,
    },

    #[error("face {face} has {corners} corners, at least 3 are required")]
    DegenerateFace { face: usize, corners: usize },

    #[error("index count {0} is not a multiple of 3")]
    IndexCount(usize),

    #[error("mesh has no vertices")]
    EmptyMesh,

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("placed {placed} of {requested} obstacles before giving up after {attempts} attempts")]
    PlacementStarved {
        requested: usize,
        placed: usize,
        attempts: usize,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("OBJ load error: {0}")]
    Obj(#[from] tobj::LoadError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
