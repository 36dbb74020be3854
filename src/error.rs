use std::path::PathBuf;
use thiserror::Error;

/// Failures of the fetch/enrich pipeline and the cache reader.
///
/// `Network`, `FileIo`, `MalformedCache` and `InvalidBoundingBox` abort a
/// run. `Geocode` and `Parse` are per-feature and are folded into sentinel
/// values before they can leave the pipeline. `UnsupportedCrs` is logged and
/// leaves the source features unplaced.
#[derive(Debug, Error)]
pub enum Error {
    #[error("source query failed: {0}")]
    Network(String),

    #[error("reverse geocoding failed at ({lat}, {lon}): {message}")]
    Geocode { lat: f64, lon: f64, message: String },

    #[error("field `{field}` is not numeric")]
    Parse { field: String },

    #[error("cache file {}: {source}", .path.display())]
    FileIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed cache file {}: {reason}", .path.display())]
    MalformedCache { path: PathBuf, reason: String },

    #[error("unsupported coordinate reference system: {0}")]
    UnsupportedCrs(String),

    #[error("invalid bounding box: {0}")]
    InvalidBoundingBox(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn file_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::FileIo {
            path: path.into(),
            source,
        }
    }
}
