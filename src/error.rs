use std::{
    error::Error,
    fmt::{self, Display},
    io,
    path::PathBuf,
};

use ndarray::ShapeError;
use safetensors::SafeTensorError;

/// The result type used in the entire crate.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// The crate's error type.
#[derive(Debug)]
pub enum TrainErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    UnknownParameter {
        name: String,
    },
    DuplicateParameter {
        name: String,
    },
    NoBackup {
        name: String,
    },
    NoCheckpoint {
        path: PathBuf,
    },
    CorruptCheckpoint(String),
    EmptyDataset {
        what: &'static str,
    },
    InvalidLabel {
        label: usize,
        num_classes: usize,
    },
    InvalidConfig(String),
    Shape(ShapeError),
    Io(io::Error),
    Json(serde_json::Error),
    Checkpoint(SafeTensorError),
}

impl Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            TrainErr::UnknownParameter { name } => {
                write!(f, "There's no parameter named `{name}` in the store")
            }
            TrainErr::DuplicateParameter { name } => {
                write!(f, "A parameter named `{name}` is already registered")
            }
            TrainErr::NoBackup { name } => write!(
                f,
                "Tried to restore parameter `{name}` but it has no backup, attack it first"
            ),
            TrainErr::NoCheckpoint { path } => write!(
                f,
                "There's no checkpoint to reload at {}, validation never improved",
                path.display()
            ),
            TrainErr::CorruptCheckpoint(msg) => write!(f, "corrupt checkpoint: {msg}"),
            TrainErr::EmptyDataset { what } => write!(f, "The {what} dataset yielded no batches"),
            TrainErr::InvalidLabel { label, num_classes } => write!(
                f,
                "Label {label} is out of range for a classifier of {num_classes} classes"
            ),
            TrainErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            TrainErr::Shape(e) => write!(f, "shape error: {e}"),
            TrainErr::Io(e) => write!(f, "io error: {e}"),
            TrainErr::Json(e) => write!(f, "json error: {e}"),
            TrainErr::Checkpoint(e) => write!(f, "checkpoint error: {e}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Shape(e) => Some(e),
            TrainErr::Io(e) => Some(e),
            TrainErr::Json(e) => Some(e),
            TrainErr::Checkpoint(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ShapeError> for TrainErr {
    fn from(value: ShapeError) -> Self {
        Self::Shape(value)
    }
}

impl From<io::Error> for TrainErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<SafeTensorError> for TrainErr {
    fn from(value: SafeTensorError) -> Self {
        Self::Checkpoint(value)
    }
}
