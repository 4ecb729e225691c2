#[non_exhaustive]
#[derive(Debug)]
pub enum Error {
    /// Invalid parameters given when building a neighbor finder: non-positive
    /// cutoff, degenerate periodic cell, ...
    Configuration(String),
    /// A particle index outside of the valid range was given to a query
    IndexOutOfBounds {
        /// the index given by the caller
        index: usize,
        /// number of particles known to the neighbor finder
        count: usize,
    },
    /// Error while serializing/deserializing parameters
    Json(serde_json::Error),
    /// Error coming from an implementation of the `System` trait
    System(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Configuration(e) => write!(f, "invalid configuration: {}", e),
            Error::IndexOutOfBounds { index, count } => write!(
                f, "particle index out of range: got {} but there are {} particles", index, count
            ),
            Error::Json(e) => write!(f, "json error: {}", e),
            Error::System(e) => write!(f, "error from system: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Configuration(_) |
            Error::IndexOutOfBounds { .. } |
            Error::System(_) => None,
            Error::Json(e) => Some(e),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Error {
        Error::Json(error)
    }
}
