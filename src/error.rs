// error.rs
// Error taxonomy shared by every stage of the pipeline.
//
// Structural failures (headers, entity alignment) abort a run. Line noise never
// reaches this type: the parser drops it and keeps going.

use std::path::PathBuf;

/// Errors raised while ingesting, aggregating or rendering a simulator log.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// The log file is missing or unreadable. Nothing has been written yet.
    #[error("cannot open source {}: {source}", path.display())]
    SourceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A `# Timestep` header whose timestep is not a non-negative integer.
    #[error("malformed timestep header at line {line}: {text:?}")]
    MalformedHeader { line: usize, text: String },

    /// A frame with a different entity count than the first frame.
    #[error("frame {frame} has {found} entities, expected {expected}")]
    EntityCountMismatch {
        frame: usize,
        expected: usize,
        found: usize,
    },

    /// A frame with the right count but a different id sequence than the first frame.
    #[error("frame {frame}: slot {slot} holds entity {found}, expected entity {expected}")]
    EntityOrderMismatch {
        frame: usize,
        slot: usize,
        expected: u64,
        found: u64,
    },

    /// The same entity id listed twice in the frame that fixes the id order.
    #[error("frame {frame} lists entity {id} more than once")]
    DuplicateEntity { frame: usize, id: u64 },

    /// Nothing usable was extracted, so nothing can be rendered.
    #[error("no {what} could be extracted from the source")]
    EmptyResult { what: &'static str },

    #[error("frame index {index} is out of range ({frames} frames stored)")]
    FrameOutOfRange { index: usize, frames: usize },

    /// Tabular files are addressed by column name only.
    #[error("unknown column {name:?} (available: {available})")]
    UnknownColumn { name: String, available: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The plotting backend refused to draw or encode.
    #[error("rendering failed: {0}")]
    Render(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl VizError {
    /// Wrap any plotters drawing error.
    pub fn render<E: std::fmt::Display>(err: E) -> Self {
        VizError::Render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VizError>;
