use thiserror::Error;

/// Everything a single user action or the startup sequence can fail with.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("cannot convert ({latitude:?}, {longitude:?}) to coordinates")]
    InvalidCoordinate { latitude: String, longitude: String },

    #[error("pin index {0:?} is not a number")]
    InvalidIndex(String),

    #[error("pin index {index} out of range 1..={count}")]
    IndexOutOfRange { index: i64, count: usize },

    #[error("there are no pins")]
    NoPins,

    #[error("no current location available")]
    NoLocation,

    // Startup cannot continue past this one.
    #[error("unrecognized location permission status: {0}")]
    UnrecognizedPermission(String),
}
